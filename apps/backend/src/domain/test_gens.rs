// Proptest generators for rounds: decks, rosters and complete vote grids.

use proptest::prelude::*;

use crate::domain::{Ballot, VoteDirection};

pub fn direction() -> impl Strategy<Value = VoteDirection> {
    prop_oneof![Just(VoteDirection::Accept), Just(VoteDirection::Reject)]
}

/// Distinct candidate ids `c0..cN`.
pub fn deck(max: usize) -> impl Strategy<Value = Vec<String>> {
    (1..=max).prop_map(|n| (0..n).map(|i| format!("c{i}")).collect())
}

/// Distinct participant ids `p0..pN`.
pub fn roster(max: usize) -> impl Strategy<Value = Vec<String>> {
    (1..=max).prop_map(|n| (0..n).map(|i| format!("p{i}")).collect())
}

/// A round where each (participant, candidate) cell is either a vote or missing.
pub fn round_with_gaps() -> impl Strategy<Value = (Vec<String>, Vec<String>, Vec<Option<VoteDirection>>)>
{
    (deck(6), roster(5)).prop_flat_map(|(deck, roster)| {
        let cells = deck.len() * roster.len();
        (
            Just(deck),
            Just(roster),
            prop::collection::vec(prop::option::weighted(0.9, direction()), cells),
        )
    })
}

/// A round where every participant voted on every candidate.
pub fn complete_round() -> impl Strategy<Value = (Vec<String>, Vec<String>, Vec<Ballot>)> {
    (deck(6), roster(5)).prop_flat_map(|(deck, roster)| {
        let cells = deck.len() * roster.len();
        (
            Just(deck.clone()),
            Just(roster.clone()),
            prop::collection::vec(direction(), cells).prop_map(move |dirs| {
                grid_ballots(&deck, &roster, dirs.into_iter().map(Some).collect())
            }),
        )
    })
}

/// Lay out `cells` row-major as participant x candidate ballots.
pub fn grid_ballots(
    deck: &[String],
    roster: &[String],
    cells: Vec<Option<VoteDirection>>,
) -> Vec<Ballot> {
    let mut ballots = Vec::new();
    for (i, cell) in cells.into_iter().enumerate() {
        let participant = &roster[i / deck.len()];
        let candidate = &deck[i % deck.len()];
        if let Some(direction) = cell {
            ballots.push(Ballot::new(participant.clone(), candidate.clone(), direction));
        }
    }
    ballots
}
