use crate::domain::{
    classify_next_action, evaluate_round, finished_participants, AdvancingCandidate, Ballot,
    NextAction, RoundPolicy,
};

fn ids(xs: &[&str]) -> Vec<String> {
    xs.iter().map(|s| s.to_string()).collect()
}

/// Every participant votes on every candidate; `accepts[c]` lists who accepts c.
fn ballots_for(deck: &[&str], roster: &[&str], accepts: &[(&str, &[&str])]) -> Vec<Ballot> {
    let mut out = Vec::new();
    for p in roster {
        for c in deck {
            let accepted = accepts
                .iter()
                .any(|(cand, who)| cand == c && who.contains(p));
            out.push(if accepted {
                Ballot::accept(*p, *c)
            } else {
                Ballot::reject(*p, *c)
            });
        }
    }
    out
}

fn adv(candidate: &str, n: u32) -> AdvancingCandidate {
    AdvancingCandidate {
        candidate_id: candidate.to_string(),
        accept_count: n,
    }
}

#[test]
fn test_one_unanimous_two_advancing_goes_to_vote() {
    let deck = ["A", "B", "C", "D"];
    let roster = ["p1", "p2", "p3"];
    let ballots = ballots_for(
        &deck,
        &roster,
        &[
            ("A", &["p1", "p2", "p3"]),
            ("B", &["p1", "p2"]),
            ("C", &["p3"]),
        ],
    );

    let result = evaluate_round(1, &ids(&deck), &ids(&roster), &ballots, &RoundPolicy::default());

    assert!(result.completed);
    assert_eq!(result.participant_count, 3);
    assert_eq!(result.unanimous, ids(&["A"]));
    assert_eq!(result.advancing, vec![adv("B", 2), adv("C", 1)]);
    assert_eq!(result.next_action, Some(NextAction::Vote));
}

#[test]
fn test_three_advancing_goes_to_next_round() {
    let deck = ["A", "B", "C", "D"];
    let roster = ["p1", "p2", "p3"];
    let ballots = ballots_for(
        &deck,
        &roster,
        &[
            ("A", &["p1", "p2", "p3"]),
            ("B", &["p1", "p2"]),
            ("C", &["p2", "p3"]),
            ("D", &["p1"]),
        ],
    );

    let result = evaluate_round(1, &ids(&deck), &ids(&roster), &ballots, &RoundPolicy::default());

    assert_eq!(result.unanimous, ids(&["A"]));
    assert_eq!(result.advancing, vec![adv("B", 2), adv("C", 2), adv("D", 1)]);
    assert_eq!(result.next_action, Some(NextAction::NextRound));
}

#[test]
fn test_everyone_rejects_everything_ends_without_winner() {
    let deck = ["A", "B"];
    let roster = ["p1", "p2"];
    let ballots = ballots_for(&deck, &roster, &[]);

    let result = evaluate_round(1, &ids(&deck), &ids(&roster), &ballots, &RoundPolicy::default());

    assert!(result.completed);
    assert!(result.unanimous.is_empty());
    assert!(result.advancing.is_empty());
    assert_eq!(result.next_action, Some(NextAction::End));
}

#[test]
fn test_only_unanimous_ends() {
    let deck = ["A", "B"];
    let roster = ["p1", "p2"];
    let ballots = ballots_for(&deck, &roster, &[("A", &["p1", "p2"])]);

    let result = evaluate_round(1, &ids(&deck), &ids(&roster), &ballots, &RoundPolicy::default());

    assert_eq!(result.unanimous, ids(&["A"]));
    assert!(result.advancing.is_empty());
    assert_eq!(result.next_action, Some(NextAction::End));
}

#[test]
fn test_missing_vote_reports_nothing() {
    let deck = ["A", "B"];
    let roster = ["p1", "p2"];
    let mut ballots = ballots_for(&deck, &roster, &[("A", &["p1", "p2"])]);
    ballots.retain(|b| !(b.participant_id == "p2" && b.candidate_id == "B"));

    let result = evaluate_round(4, &ids(&deck), &ids(&roster), &ballots, &RoundPolicy::default());

    assert!(!result.completed);
    assert_eq!(result.round_number, 4);
    assert_eq!(result.participant_count, 2);
    assert!(result.unanimous.is_empty());
    assert!(result.advancing.is_empty());
    assert_eq!(result.next_action, None);
}

#[test]
fn test_participant_with_no_votes_blocks_quorum() {
    let deck = ["A"];
    let ballots = vec![Ballot::accept("p1", "A")];
    let result = evaluate_round(
        1,
        &ids(&deck),
        &ids(&["p1", "late-joiner"]),
        &ballots,
        &RoundPolicy::default(),
    );
    assert!(!result.completed);
}

#[test]
fn test_votes_outside_deck_or_roster_are_ignored() {
    let deck = ["A"];
    let roster = ["p1"];
    let ballots = vec![
        Ballot::accept("p1", "A"),
        Ballot::accept("p1", "not-in-deck"),
        Ballot::reject("stranger", "A"),
    ];

    let result = evaluate_round(1, &ids(&deck), &ids(&roster), &ballots, &RoundPolicy::default());

    assert!(result.completed);
    assert_eq!(result.participant_count, 1);
    assert_eq!(result.unanimous, ids(&["A"]));
}

#[test]
fn test_duplicate_roster_and_deck_entries_collapse() {
    let ballots = vec![Ballot::accept("host", "A"), Ballot::reject("guest", "A")];
    let result = evaluate_round(
        1,
        &ids(&["A", "A"]),
        &ids(&["host", "guest", "host"]),
        &ballots,
        &RoundPolicy::default(),
    );

    assert!(result.completed);
    assert_eq!(result.participant_count, 2);
    assert_eq!(result.advancing, vec![adv("A", 1)]);
}

#[test]
fn test_empty_deck_or_roster_never_completes() {
    let policy = RoundPolicy::default();
    assert!(!evaluate_round(1, &[], &ids(&["p1"]), &[], &policy).completed);
    assert!(!evaluate_round(1, &ids(&["A"]), &[], &[], &policy).completed);
}

#[test]
fn test_advancing_ties_keep_deck_order() {
    let deck = ["D", "C", "B", "A"];
    let roster = ["p1", "p2", "p3"];
    let ballots = ballots_for(
        &deck,
        &roster,
        &[("D", &["p1"]), ("C", &["p1", "p2"]), ("B", &["p2"]), ("A", &["p3", "p1"])],
    );

    let result = evaluate_round(1, &ids(&deck), &ids(&roster), &ballots, &RoundPolicy::default());

    assert_eq!(
        result.advancing,
        vec![adv("C", 2), adv("A", 2), adv("D", 1), adv("B", 1)]
    );
}

#[test]
fn test_finalist_threshold_is_configurable() {
    let deck = ["A", "B", "C"];
    let roster = ["p1", "p2"];
    let ballots = ballots_for(&deck, &roster, &[("A", &["p1"]), ("B", &["p2"]), ("C", &["p1"])]);

    let two = evaluate_round(1, &ids(&deck), &ids(&roster), &ballots, &RoundPolicy::default());
    assert_eq!(two.next_action, Some(NextAction::NextRound));

    let three = evaluate_round(
        1,
        &ids(&deck),
        &ids(&roster),
        &ballots,
        &RoundPolicy {
            max_vote_finalists: 3,
        },
    );
    assert_eq!(three.next_action, Some(NextAction::Vote));
}

#[test]
fn test_next_action_classification_table() {
    assert_eq!(classify_next_action(0, 0, 2), NextAction::End);
    assert_eq!(classify_next_action(0, 1, 2), NextAction::Vote);
    assert_eq!(classify_next_action(3, 2, 2), NextAction::Vote);
    assert_eq!(classify_next_action(0, 3, 2), NextAction::NextRound);
    assert_eq!(classify_next_action(1, 7, 2), NextAction::NextRound);
    assert_eq!(classify_next_action(1, 0, 2), NextAction::End);
    assert_eq!(classify_next_action(4, 0, 2), NextAction::End);
}

#[test]
fn test_finished_participants_only_counts_full_decks() {
    let deck = ids(&["A", "B"]);
    let roster = ids(&["host", "fast", "slow"]);
    let ballots = vec![
        Ballot::accept("host", "A"),
        Ballot::reject("host", "B"),
        Ballot::accept("fast", "A"),
        Ballot::accept("fast", "B"),
        Ballot::accept("slow", "A"),
    ];

    assert_eq!(
        finished_participants(&deck, &roster, &ballots),
        ids(&["host", "fast"])
    );
}

#[test]
fn test_result_serializes_with_contract_field_names() {
    let deck = ["A", "B"];
    let roster = ["p1", "p2"];
    let ballots = ballots_for(&deck, &roster, &[("A", &["p1", "p2"]), ("B", &["p1"])]);
    let result = evaluate_round(2, &ids(&deck), &ids(&roster), &ballots, &RoundPolicy::default());

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["completed"], true);
    assert_eq!(json["participant_count"], 2);
    assert_eq!(json["unanimous_matches"], serde_json::json!(["A"]));
    assert_eq!(
        json["advancing_places"],
        serde_json::json!([{ "candidate_id": "B", "like_count": 1 }])
    );
    assert_eq!(json["next_action"], "vote");
}
