use huddle::domain::{break_tie, TallyOutcome, VoteDirection};
use huddle::entities::sessions::SessionStatus;
use huddle::errors::domain::{DomainError, ValidationKind};
use huddle::infra::db_errors::is_unique_violation;
use huddle::repos::matches::{self, Finalized};
use huddle::repos::votes;
use huddle::SyncEvent;
use sea_orm::ConnectionTrait;

use crate::support::{test_state, Table};

/// Three participants with finalists `a` and `b` in round 2.
async fn voting_table() -> Table {
    let table = Table::started(test_state().await, 2, &["a", "b", "c"]).await;
    let (g1, g2) = (table.guests[0].clone(), table.guests[1].clone());
    table.swipe(&table.host, 1, &[("a", true), ("b", true), ("c", false)]).await;
    table.swipe(&g1, 1, &[("a", true), ("b", false), ("c", false)]).await;
    table.swipe(&g2, 1, &[("a", false), ("b", true), ("c", false)]).await;

    let outcome = table
        .coordinator
        .advance_round(table.db(), table.id(), &table.host, 1, false)
        .await
        .unwrap();
    assert_eq!(outcome.session.status, SessionStatus::Voting);
    table
}

async fn cast(table: &Table, participant: &str, candidate: &str) {
    table
        .swipes
        .cast_final_vote(table.db(), table.id(), participant, candidate)
        .await
        .unwrap();
}

#[tokio::test]
async fn finalists_are_the_advancing_candidates() {
    let table = voting_table().await;
    let view = table
        .coordinator
        .snapshot(table.db(), table.id(), &table.guests[0])
        .await
        .unwrap();
    assert_eq!(view.current_round, 2);
    assert_eq!(view.deck, ["a", "b"]);
}

#[tokio::test]
async fn tally_waits_for_every_participant() {
    let table = voting_table().await;
    cast(&table, &table.host, "a").await;

    let outcome = table.tally.tally(table.db(), table.id(), &table.host).await.unwrap();
    assert_eq!(
        outcome,
        TallyOutcome::Pending {
            voted: 1,
            participant_count: 3
        }
    );
    assert!(matches::final_choice(table.db(), table.id()).await.unwrap().is_none());
}

#[tokio::test]
async fn majority_wins_and_is_stored_once() {
    let table = voting_table().await;
    let mut events = table.state.hub.subscribe(table.id());
    cast(&table, &table.host, "a").await;
    cast(&table, &table.guests[0], "a").await;
    cast(&table, &table.guests[1], "b").await;

    let first = table.tally.tally(table.db(), table.id(), &table.guests[1]).await.unwrap();
    let second = table.tally.tally(table.db(), table.id(), &table.host).await.unwrap();
    assert_eq!(
        first,
        TallyOutcome::Winner {
            candidate_id: "a".into(),
            accept_votes: 2,
            tie_broken: false
        }
    );
    assert_eq!(first, second);

    let view = table
        .coordinator
        .snapshot(table.db(), table.id(), &table.host)
        .await
        .unwrap();
    assert_eq!(view.final_choice.as_deref(), Some("a"));

    let finals: Vec<_> = std::iter::from_fn(|| events.try_recv().ok())
        .filter(|e| e.is_final())
        .collect();
    assert_eq!(finals.len(), 1);
    assert!(matches!(
        &finals[0],
        SyncEvent::MatchUpserted { candidate_id, is_final_choice: true, .. } if candidate_id == "a"
    ));
}

#[tokio::test]
async fn tie_is_broken_by_session_hash() {
    let table = Table::started(test_state().await, 1, &["a", "b"]).await;
    let guest = table.guests[0].clone();
    table.swipe(&table.host, 1, &[("a", true), ("b", false)]).await;
    table.swipe(&guest, 1, &[("a", false), ("b", true)]).await;
    table
        .coordinator
        .advance_round(table.db(), table.id(), &table.host, 1, false)
        .await
        .unwrap();

    cast(&table, &table.host, "a").await;
    cast(&table, &guest, "b").await;

    let outcome = table.tally.tally(table.db(), table.id(), &guest).await.unwrap();
    let expected = break_tie(table.id(), &["a".to_string(), "b".to_string()]).unwrap();
    assert_eq!(
        outcome,
        TallyOutcome::Winner {
            candidate_id: expected.clone(),
            accept_votes: 1,
            tie_broken: true
        }
    );
    let stored = matches::final_choice(table.db(), table.id()).await.unwrap().unwrap();
    assert_eq!(stored.candidate_id, expected);

    // A later caller is told the same story, tie included.
    let replay = table.tally.tally(table.db(), table.id(), &table.host).await.unwrap();
    assert_eq!(replay, outcome);
}

#[tokio::test]
async fn everyone_abstaining_is_no_agreement() {
    let table = voting_table().await;
    for participant in table.everyone() {
        let rejected = table
            .swipes
            .abstain_final_vote(table.db(), table.id(), &participant)
            .await
            .unwrap();
        assert_eq!(rejected.len(), 2);
        assert!(rejected.iter().all(|v| v.direction == VoteDirection::Reject));
    }

    let outcome = table.tally.tally(table.db(), table.id(), &table.host).await.unwrap();
    assert_eq!(outcome, TallyOutcome::NoAgreement);
    assert!(matches::final_choice(table.db(), table.id()).await.unwrap().is_none());
}

#[tokio::test]
async fn one_final_vote_per_participant() {
    let table = voting_table().await;
    let guest = table.guests[0].clone();

    let first = table
        .swipes
        .cast_final_vote(table.db(), table.id(), &guest, "b")
        .await
        .unwrap();
    assert!(first.created);

    let changed_mind = table
        .swipes
        .cast_final_vote(table.db(), table.id(), &guest, "a")
        .await
        .unwrap();
    assert!(!changed_mind.created);
    assert_eq!(changed_mind.vote.candidate_id, "b");

    // Abstaining after accepting keeps the accept.
    let after = table
        .swipes
        .abstain_final_vote(table.db(), table.id(), &guest)
        .await
        .unwrap();
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].direction, VoteDirection::Accept);
}

#[tokio::test]
async fn final_vote_rules() {
    let swiping = Table::started(test_state().await, 0, &["a"]).await;
    let err = swiping
        .swipes
        .cast_final_vote(swiping.db(), swiping.id(), &swiping.host, "a")
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(ValidationKind::NotVoting, _)));
    let err = swiping
        .tally
        .tally(swiping.db(), swiping.id(), &swiping.host)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(ValidationKind::NotVoting, _)));

    let table = voting_table().await;
    let err = table
        .swipes
        .cast_final_vote(table.db(), table.id(), &table.host, "c")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation(ValidationKind::CandidateNotInDeck, _)
    ));
}

#[tokio::test]
async fn swipes_are_refused_in_the_voting_round() {
    let table = voting_table().await;
    let (g1, g2) = (table.guests[0].clone(), table.guests[1].clone());

    for candidate in ["a", "b"] {
        let err = table
            .swipes
            .record_vote(table.db(), table.id(), &table.host, candidate, 2, VoteDirection::Accept)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(ValidationKind::VotingRound, _)));
    }
    assert!(votes::for_participant(table.db(), table.id(), &table.host, 2)
        .await
        .unwrap()
        .is_empty());

    cast(&table, &table.host, "a").await;
    cast(&table, &g1, "a").await;
    cast(&table, &g2, "b").await;
    let outcome = table.tally.tally(table.db(), table.id(), &g2).await.unwrap();
    assert_eq!(
        outcome,
        TallyOutcome::Winner {
            candidate_id: "a".into(),
            accept_votes: 2,
            tie_broken: false
        }
    );
}

#[tokio::test]
async fn storage_holds_one_final_accept_per_participant() {
    let table = voting_table().await;
    let guest = table.guests[0].clone();
    cast(&table, &guest, "a").await;

    let (stored, created) = votes::record_final_if_absent(
        table.db(),
        votes::Vote {
            session_id: table.id().to_string(),
            participant_id: guest.clone(),
            candidate_id: "b".into(),
            round_number: 2,
            direction: VoteDirection::Accept,
        },
    )
    .await
    .unwrap();
    assert!(!created);
    assert_eq!(stored.candidate_id, "a");

    let accepts: Vec<_> = votes::for_participant(table.db(), table.id(), &guest, 2)
        .await
        .unwrap()
        .into_iter()
        .filter(|v| v.direction == VoteDirection::Accept)
        .collect();
    assert_eq!(accepts.len(), 1);
}

#[tokio::test]
async fn final_choice_never_changes_once_set() {
    let table = voting_table().await;

    let first = matches::finalize_if_absent(table.db(), table.id(), "a", 2)
        .await
        .unwrap();
    assert!(matches!(first, Finalized::Set(ref m) if m.candidate_id == "a"));

    let second = matches::finalize_if_absent(table.db(), table.id(), "b", 2)
        .await
        .unwrap();
    assert!(matches!(
        second,
        Finalized::AlreadyFinal(ref m) if m.candidate_id == "a" && m.is_final_choice
    ));

    let all = matches::for_session(table.db(), table.id()).await.unwrap();
    let finals: Vec<_> = all.iter().filter(|m| m.is_final_choice).collect();
    assert_eq!(finals.len(), 1);
    assert_eq!(finals[0].candidate_id, "a");
    assert!(all.iter().any(|m| m.candidate_id == "b" && !m.is_final_choice));

    // The partial unique index stops a writer that skips the guard.
    let err = table
        .db()
        .execute_unprepared(&format!(
            "UPDATE session_matches SET is_final_choice = TRUE \
             WHERE session_id = '{}' AND candidate_id = 'b'",
            table.id()
        ))
        .await
        .unwrap_err();
    assert!(is_unique_violation(&err), "unexpected error: {err}");
    let stored = matches::final_choice(table.db(), table.id()).await.unwrap().unwrap();
    assert_eq!(stored.candidate_id, "a");
}
