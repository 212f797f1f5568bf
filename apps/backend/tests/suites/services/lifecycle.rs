use huddle::domain::NextAction;
use huddle::entities::sessions::SessionStatus;
use huddle::errors::domain::{ConflictKind, DomainError, ValidationKind};
use huddle::repos::{matches, participants};
use huddle::EngineConfig;

use crate::support::{candidates, test_state, test_state_with, Table};

#[tokio::test]
async fn create_seeds_host_pool_and_first_deck() {
    let table = Table::lobby(test_state().await, 0, &["a", "b", "c"]).await;

    let view = table
        .coordinator
        .snapshot(table.db(), table.id(), &table.host)
        .await
        .unwrap();
    assert_eq!(view.current_round, 1);
    assert_eq!(view.status, SessionStatus::Lobby);
    assert!(!view.started);
    assert_eq!(view.deck, ["a", "b", "c"]);
    assert_eq!(view.participant_count, 1);
    assert_eq!(view.host_id, table.host);
    assert_eq!(view.code.len(), 10);
    assert!(view.my_votes.is_empty());
    assert!(view.final_choice.is_none());
}

#[tokio::test]
async fn create_rejects_empty_pool_and_dedups() {
    let table = Table::lobby(test_state().await, 0, &["a"]).await;

    let err = table
        .coordinator
        .create(table.db(), "host-x", Vec::new())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation(ValidationKind::EmptyCandidatePool, _)
    ));

    let mut pool = candidates(&["a", "b"]);
    pool.extend(candidates(&["a"]));
    let session = table
        .coordinator
        .create(table.db(), "host-y", pool)
        .await
        .unwrap();
    let view = table
        .coordinator
        .snapshot(table.db(), &session.id, "host-y")
        .await
        .unwrap();
    assert_eq!(view.deck, ["a", "b"]);
}

#[tokio::test]
async fn join_is_idempotent_and_join_code_is_forgiving() {
    let table = Table::lobby(test_state().await, 1, &["a"]).await;
    let guest = &table.guests[0];

    let again = table
        .coordinator
        .join(table.db(), table.id(), guest)
        .await
        .unwrap();
    assert!(!again.joined);

    let by_code = table
        .coordinator
        .join_by_code(table.db(), &format!(" {} ", table.session.code.to_lowercase()), "late")
        .await
        .unwrap();
    assert!(by_code.joined);
    assert_eq!(by_code.session.id, table.id());

    let roster = table.coordinator.roster(table.db(), table.id()).await.unwrap();
    assert_eq!(roster.len(), 3);
    assert_eq!(roster[0], table.host);
    assert_eq!(participants::count(table.db(), table.id()).await.unwrap(), 3);
}

#[tokio::test]
async fn join_respects_participant_cap() {
    let engine = EngineConfig {
        max_participants: 2,
        ..EngineConfig::default()
    };
    let table = Table::lobby(test_state_with(engine).await, 1, &["a"]).await;

    let err = table
        .coordinator
        .join(table.db(), table.id(), "third")
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(ConflictKind::SessionFull, _)));

    // Existing members are not turned away.
    let member = table
        .coordinator
        .join(table.db(), table.id(), &table.guests[0])
        .await
        .unwrap();
    assert!(!member.joined);
}

#[tokio::test]
async fn start_is_host_only_and_written_once() {
    let table = Table::lobby(test_state().await, 1, &["a"]).await;

    let err = table
        .coordinator
        .start(table.db(), table.id(), &table.guests[0])
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(ValidationKind::NotHost, _)));

    let first = table
        .coordinator
        .start(table.db(), table.id(), &table.host)
        .await
        .unwrap();
    let second = table
        .coordinator
        .start(table.db(), table.id(), &table.host)
        .await
        .unwrap();
    assert_eq!(first.status, SessionStatus::Swiping);
    assert!(first.started_at.is_some());
    assert_eq!(first.started_at, second.started_at);
}

#[tokio::test]
async fn advance_requires_host_and_complete_round() {
    let table = Table::started(test_state().await, 1, &["a", "b"]).await;
    table.swipe(&table.host, 1, &[("a", true), ("b", true)]).await;

    let err = table
        .coordinator
        .advance_round(table.db(), table.id(), &table.guests[0], 1, false)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(ValidationKind::NotHost, _)));

    let err = table
        .coordinator
        .advance_round(table.db(), table.id(), &table.host, 1, false)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation(ValidationKind::RoundNotComplete, _)
    ));

    let err = table
        .coordinator
        .advance_round(table.db(), table.id(), &table.host, 2, false)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(ValidationKind::RoundMismatch, _)));
}

#[tokio::test]
async fn advance_before_start_is_rejected() {
    let table = Table::lobby(test_state().await, 0, &["a"]).await;
    let err = table
        .coordinator
        .advance_round(table.db(), table.id(), &table.host, 1, false)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation(ValidationKind::SessionNotStarted, _)
    ));
}

#[tokio::test]
async fn wide_split_plays_another_round_with_advancing_deck() {
    let mut table = Table::started(test_state().await, 2, &["a", "b", "c", "d"]).await;
    let (g1, g2) = (table.guests[0].clone(), table.guests[1].clone());
    table
        .swipe(&table.host, 1, &[("a", true), ("b", true), ("c", false), ("d", false)])
        .await;
    table
        .swipe(&g1, 1, &[("a", true), ("b", false), ("c", true), ("d", false)])
        .await;
    table
        .swipe(&g2, 1, &[("a", false), ("b", false), ("c", false), ("d", false)])
        .await;

    let outcome = table
        .coordinator
        .advance_round(table.db(), table.id(), &table.host, 1, false)
        .await
        .unwrap();
    assert!(outcome.advanced);
    assert_eq!(outcome.result.next_action, Some(NextAction::NextRound));
    assert_eq!(outcome.session.current_round, 2);
    assert_eq!(outcome.session.status, SessionStatus::Swiping);

    let view = table
        .coordinator
        .snapshot(table.db(), table.id(), &g1)
        .await
        .unwrap();
    assert_eq!(view.deck, ["a", "b", "c"]);
    assert!(view.my_votes.is_empty());

    // A replayed advance changes nothing.
    let replay = table
        .coordinator
        .advance_round(table.db(), table.id(), &table.host, 1, false)
        .await
        .unwrap();
    assert!(!replay.advanced);
    assert_eq!(table.refresh().await.current_round, 2);
}

#[tokio::test]
async fn narrow_split_goes_to_final_vote_and_keeps_unanimous_matches() {
    let table = Table::started(test_state().await, 1, &["a", "b", "c"]).await;
    let guest = table.guests[0].clone();
    table
        .swipe(&table.host, 1, &[("a", true), ("b", true), ("c", false)])
        .await;
    table
        .swipe(&guest, 1, &[("a", true), ("b", false), ("c", false)])
        .await;

    let outcome = table
        .coordinator
        .advance_round(table.db(), table.id(), &table.host, 1, false)
        .await
        .unwrap();
    assert_eq!(outcome.result.unanimous, ["a"]);
    assert_eq!(outcome.result.next_action, Some(NextAction::Vote));
    assert_eq!(outcome.session.status, SessionStatus::Voting);

    let view = table
        .coordinator
        .snapshot(table.db(), table.id(), &guest)
        .await
        .unwrap();
    assert_eq!(view.deck, ["b"]);
    assert_eq!(view.matches.len(), 1);
    assert_eq!(view.matches[0].candidate_id, "a");
    assert!(!view.matches[0].is_final_choice);

    let err = table
        .coordinator
        .advance_round(table.db(), table.id(), &table.host, 2, false)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation(ValidationKind::VotingRound, _)
    ));
}

#[tokio::test]
async fn nobody_likes_anything_ends_the_session() {
    let table = Table::started(test_state().await, 1, &["a", "b"]).await;
    table.swipe_all(1, &[("a", false), ("b", false)]).await;

    let outcome = table
        .coordinator
        .advance_round(table.db(), table.id(), &table.host, 1, false)
        .await
        .unwrap();
    assert_eq!(outcome.result.next_action, Some(NextAction::End));
    assert!(outcome.advanced);
    assert!(outcome.session.is_ended());
    assert_eq!(outcome.session.status, SessionStatus::Completed);
    assert!(matches::final_choice(table.db(), table.id()).await.unwrap().is_none());
}

#[tokio::test]
async fn only_unanimous_ends_without_final_choice() {
    let table = Table::started(test_state().await, 1, &["a", "b"]).await;
    table.swipe_all(1, &[("a", true), ("b", false)]).await;

    let outcome = table
        .coordinator
        .advance_round(table.db(), table.id(), &table.host, 1, false)
        .await
        .unwrap();
    assert_eq!(outcome.result.unanimous, ["a"]);
    assert_eq!(outcome.result.next_action, Some(NextAction::End));
    assert!(outcome.session.is_ended());

    let all = matches::for_session(table.db(), table.id()).await.unwrap();
    assert_eq!(all.len(), 1);
    assert!(!all[0].is_final_choice);
}

#[tokio::test]
async fn end_is_host_only_and_idempotent() {
    let table = Table::started(test_state().await, 1, &["a"]).await;

    let err = table
        .coordinator
        .end(table.db(), table.id(), &table.guests[0])
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(ValidationKind::NotHost, _)));

    let first = table.coordinator.end(table.db(), table.id(), &table.host).await.unwrap();
    let second = table.coordinator.end(table.db(), table.id(), &table.host).await.unwrap();
    assert!(first.is_ended());
    assert_eq!(first.ended_at, second.ended_at);

    let err = table
        .coordinator
        .join(table.db(), table.id(), "newcomer")
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(ConflictKind::SessionEnded, _)));
}
