use crate::domain::game_state::reduce;
use crate::domain::{
    AdvancingCandidate, Effect, FinalVote, GameInput, GameState, MatchView, NextAction, OwnVote,
    ReducerContext, RoundResult, SessionView, TallyOutcome, VoteDirection,
};
use crate::entities::sessions::SessionStatus;

const HOST: ReducerContext = ReducerContext { is_host: true };
const GUEST: ReducerContext = ReducerContext { is_host: false };

fn ids(xs: &[&str]) -> Vec<String> {
    xs.iter().map(|s| s.to_string()).collect()
}

fn view(round: i32, status: SessionStatus, deck: &[&str]) -> SessionView {
    SessionView {
        session_id: "s-1".to_string(),
        code: "ABCDEFGHJK".to_string(),
        host_id: "host".to_string(),
        current_round: round,
        status,
        started: status != SessionStatus::Lobby,
        deck: ids(deck),
        participant_count: 2,
        my_votes: Vec::new(),
        matches: Vec::new(),
        final_choice: None,
    }
}

fn swiping(round: i32, deck: &[&str], position: usize) -> GameState {
    GameState::Swiping {
        round,
        deck: ids(deck),
        position,
    }
}

fn completed(round: i32, unanimous: &[&str], advancing: &[(&str, u32)], next: NextAction) -> RoundResult {
    RoundResult {
        round_number: round,
        completed: true,
        participant_count: 2,
        unanimous: ids(unanimous),
        advancing: advancing
            .iter()
            .map(|(c, n)| AdvancingCandidate {
                candidate_id: c.to_string(),
                accept_count: *n,
            })
            .collect(),
        next_action: Some(next),
    }
}

fn summary(round: i32, next_action: NextAction) -> GameState {
    GameState::RoundSummary {
        round,
        unanimous: Vec::new(),
        advancing: Vec::new(),
        next_action,
        forced: false,
    }
}

#[test]
fn test_initial_state_from_fresh_round() {
    let t = GameState::initial(view(1, SessionStatus::Swiping, &["A", "B"]), &GUEST);
    assert_eq!(t.state, swiping(1, &["A", "B"], 0));
    assert!(t.effects.is_empty());
}

#[test]
fn test_initial_state_resumes_mid_deck() {
    let mut v = view(1, SessionStatus::Swiping, &["A", "B", "C"]);
    v.my_votes = vec![OwnVote {
        candidate_id: "A".to_string(),
        direction: VoteDirection::Accept,
    }];
    let t = GameState::initial(v, &GUEST);
    assert_eq!(t.state, swiping(1, &["A", "B", "C"], 1));
}

#[test]
fn test_initial_state_with_full_deck_waits_and_checks() {
    let mut v = view(2, SessionStatus::Swiping, &["A"]);
    v.my_votes = vec![OwnVote {
        candidate_id: "A".to_string(),
        direction: VoteDirection::Reject,
    }];
    let t = GameState::initial(v, &GUEST);
    assert_eq!(
        t.state,
        GameState::WaitingForQuorum {
            round: 2,
            deck: ids(&["A"])
        }
    );
    assert_eq!(
        t.effects,
        vec![Effect::CheckCompletion {
            round: 2,
            deck: ids(&["A"])
        }]
    );
}

#[test]
fn test_initial_state_of_finished_session() {
    let mut v = view(3, SessionStatus::Completed, &["A", "B"]);
    v.final_choice = Some("B".to_string());
    let t = GameState::initial(v, &HOST);
    assert_eq!(
        t.state,
        GameState::Ended {
            winner: Some("B".to_string())
        }
    );
    // Already closed: nothing for the host to do.
    assert!(t.effects.is_empty());
}

#[test]
fn test_swipes_walk_the_deck_then_wait() {
    let s0 = swiping(1, &["A", "B"], 0);

    let t1 = reduce(&s0, &GUEST, GameInput::Swipe(VoteDirection::Accept));
    assert_eq!(t1.state, swiping(1, &["A", "B"], 1));
    assert_eq!(
        t1.effects,
        vec![Effect::RecordVote {
            round: 1,
            candidate_id: "A".to_string(),
            direction: VoteDirection::Accept
        }]
    );

    let t2 = reduce(&t1.state, &GUEST, GameInput::Swipe(VoteDirection::Reject));
    assert_eq!(
        t2.state,
        GameState::WaitingForQuorum {
            round: 1,
            deck: ids(&["A", "B"])
        }
    );
    assert_eq!(t2.effects.len(), 2);
    assert!(matches!(t2.effects[1], Effect::CheckCompletion { round: 1, .. }));

    // Nothing left to swipe
    let t3 = reduce(&t2.state, &GUEST, GameInput::Swipe(VoteDirection::Accept));
    assert_eq!(t3.state, t2.state);
    assert!(t3.effects.is_empty());
}

#[test]
fn test_completed_result_moves_to_summary() {
    let waiting = GameState::WaitingForQuorum {
        round: 1,
        deck: ids(&["A", "B", "C"]),
    };
    let result = completed(1, &["A"], &[("B", 1)], NextAction::Vote);

    let t = reduce(
        &waiting,
        &GUEST,
        GameInput::RoundEvaluated {
            result,
            forced: false,
        },
    );

    match t.state {
        GameState::RoundSummary {
            round,
            unanimous,
            next_action,
            ..
        } => {
            assert_eq!(round, 1);
            assert_eq!(unanimous, ids(&["A"]));
            assert_eq!(next_action, NextAction::Vote);
        }
        other => panic!("expected summary, got {other:?}"),
    }
}

#[test]
fn test_completion_can_arrive_while_still_swiping() {
    let s = swiping(1, &["A", "B"], 1);
    let t = reduce(
        &s,
        &GUEST,
        GameInput::RoundEvaluated {
            result: completed(1, &[], &[("A", 1), ("B", 1), ("C", 1)], NextAction::NextRound),
            forced: true,
        },
    );
    assert!(matches!(
        t.state,
        GameState::RoundSummary { forced: true, .. }
    ));
}

#[test]
fn test_incomplete_or_stale_results_are_ignored() {
    let waiting = GameState::WaitingForQuorum {
        round: 2,
        deck: ids(&["A"]),
    };

    let incomplete = RoundResult::incomplete(2, 3);
    let t = reduce(
        &waiting,
        &GUEST,
        GameInput::RoundEvaluated {
            result: incomplete,
            forced: false,
        },
    );
    assert_eq!(t.state, waiting);

    let stale = completed(1, &["A"], &[], NextAction::End);
    let t = reduce(
        &waiting,
        &GUEST,
        GameInput::RoundEvaluated {
            result: stale,
            forced: false,
        },
    );
    assert_eq!(t.state, waiting);

    let mut malformed = completed(2, &["A"], &[], NextAction::End);
    malformed.next_action = None;
    let t = reduce(
        &waiting,
        &GUEST,
        GameInput::RoundEvaluated {
            result: malformed,
            forced: false,
        },
    );
    assert_eq!(t.state, waiting);
}

#[test]
fn test_host_proceed_requests_advance_guest_waits() {
    let s = summary(1, NextAction::NextRound);

    let host = reduce(&s, &HOST, GameInput::Proceed);
    assert_eq!(host.state, s);
    assert_eq!(
        host.effects,
        vec![Effect::AdvanceRound {
            from_round: 1,
            forced: false
        }]
    );

    let guest = reduce(&s, &GUEST, GameInput::Proceed);
    assert_eq!(guest.state, s);
    assert!(guest.effects.is_empty());
}

#[test]
fn test_observed_advance_starts_next_round() {
    let s = summary(1, NextAction::NextRound);
    let t = reduce(
        &s,
        &GUEST,
        GameInput::SnapshotObserved(view(2, SessionStatus::Swiping, &["B", "C", "D"])),
    );
    assert_eq!(t.state, swiping(2, &["B", "C", "D"], 0));
}

#[test]
fn test_observed_vote_round_enters_voting() {
    let s = summary(1, NextAction::Vote);
    let t = reduce(
        &s,
        &GUEST,
        GameInput::SnapshotObserved(view(2, SessionStatus::Voting, &["B", "C"])),
    );
    assert_eq!(
        t.state,
        GameState::Voting {
            round: 2,
            candidates: ids(&["B", "C"]),
            voted: None
        }
    );
}

#[test]
fn test_summary_end_proceeds_to_ended() {
    let s = summary(1, NextAction::End);

    let guest = reduce(&s, &GUEST, GameInput::Proceed);
    assert_eq!(guest.state, GameState::Ended { winner: None });
    assert!(guest.effects.is_empty());

    let host = reduce(&s, &HOST, GameInput::Proceed);
    assert_eq!(host.state, GameState::Ended { winner: None });
    assert_eq!(host.effects, vec![Effect::EndSession]);
}

#[test]
fn test_final_vote_once() {
    let s = GameState::Voting {
        round: 2,
        candidates: ids(&["B", "C"]),
        voted: None,
    };

    let t = reduce(&s, &GUEST, GameInput::CastFinalVote("C".to_string()));
    assert_eq!(
        t.state,
        GameState::Voting {
            round: 2,
            candidates: ids(&["B", "C"]),
            voted: Some(FinalVote::Accepted("C".to_string()))
        }
    );
    assert_eq!(
        t.effects,
        vec![
            Effect::CastFinalVote {
                round: 2,
                candidate_id: "C".to_string()
            },
            Effect::RequestTally { round: 2 }
        ]
    );

    let again = reduce(&t.state, &GUEST, GameInput::CastFinalVote("B".to_string()));
    assert_eq!(again.state, t.state);
    assert!(again.effects.is_empty());

    // Not a finalist
    let other = reduce(&s, &GUEST, GameInput::CastFinalVote("Z".to_string()));
    assert_eq!(other.state, s);
}

#[test]
fn test_abstain_counts_as_voted() {
    let s = GameState::Voting {
        round: 2,
        candidates: ids(&["B", "C"]),
        voted: None,
    };
    let t = reduce(&s, &GUEST, GameInput::Abstain);
    assert!(matches!(
        t.state,
        GameState::Voting {
            voted: Some(FinalVote::Abstained),
            ..
        }
    ));
    assert_eq!(
        t.effects,
        vec![Effect::Abstain { round: 2 }, Effect::RequestTally { round: 2 }]
    );
}

#[test]
fn test_tally_outcomes() {
    let s = GameState::Voting {
        round: 2,
        candidates: ids(&["B", "C"]),
        voted: Some(FinalVote::Accepted("B".to_string())),
    };

    let pending = reduce(
        &s,
        &HOST,
        GameInput::TallyResolved(TallyOutcome::Pending {
            voted: 1,
            participant_count: 2,
        }),
    );
    assert_eq!(pending.state, s);

    let won = reduce(
        &s,
        &HOST,
        GameInput::TallyResolved(TallyOutcome::Winner {
            candidate_id: "B".to_string(),
            accept_votes: 2,
            tie_broken: false,
        }),
    );
    assert_eq!(
        won.state,
        GameState::Ended {
            winner: Some("B".to_string())
        }
    );
    assert_eq!(won.effects, vec![Effect::EndSession]);

    let none = reduce(&s, &GUEST, GameInput::TallyResolved(TallyOutcome::NoAgreement));
    assert_eq!(none.state, GameState::Ended { winner: None });
}

#[test]
fn test_final_choice_ends_from_any_state() {
    let mut v = view(1, SessionStatus::Voting, &["A"]);
    v.final_choice = Some("A".to_string());
    v.matches = vec![MatchView {
        candidate_id: "A".to_string(),
        round_number: 2,
        is_final_choice: true,
    }];

    for state in [
        swiping(1, &["A", "B"], 0),
        GameState::WaitingForQuorum {
            round: 1,
            deck: ids(&["A"]),
        },
        summary(1, NextAction::Vote),
        GameState::Voting {
            round: 2,
            candidates: ids(&["A", "B"]),
            voted: None,
        },
    ] {
        let t = reduce(&state, &GUEST, GameInput::SnapshotObserved(v.clone()));
        assert_eq!(
            t.state,
            GameState::Ended {
                winner: Some("A".to_string())
            }
        );
    }
}

#[test]
fn test_ended_is_terminal() {
    let ended = GameState::Ended {
        winner: Some("A".to_string()),
    };
    for input in [
        GameInput::Swipe(VoteDirection::Accept),
        GameInput::Proceed,
        GameInput::CastFinalVote("A".to_string()),
        GameInput::SnapshotObserved(view(5, SessionStatus::Swiping, &["X"])),
        GameInput::TallyResolved(TallyOutcome::NoAgreement),
    ] {
        let t = reduce(&ended, &HOST, input);
        assert_eq!(t.state, ended);
        assert!(t.effects.is_empty());
    }
}

#[test]
fn test_same_round_snapshot_rechecks_when_waiting() {
    let waiting = GameState::WaitingForQuorum {
        round: 1,
        deck: ids(&["A"]),
    };
    let t = reduce(
        &waiting,
        &GUEST,
        GameInput::SnapshotObserved(view(1, SessionStatus::Swiping, &["A"])),
    );
    assert_eq!(t.state, waiting);
    assert_eq!(
        t.effects,
        vec![Effect::CheckCompletion {
            round: 1,
            deck: ids(&["A"])
        }]
    );

    let swiping_state = swiping(1, &["A", "B"], 1);
    let t = reduce(
        &swiping_state,
        &GUEST,
        GameInput::SnapshotObserved(view(1, SessionStatus::Swiping, &["A", "B"])),
    );
    assert!(t.effects.is_empty());
}

#[test]
fn test_older_snapshot_is_ignored() {
    let s = swiping(3, &["A"], 0);
    let t = reduce(
        &s,
        &GUEST,
        GameInput::SnapshotObserved(view(2, SessionStatus::Swiping, &["A", "B"])),
    );
    assert_eq!(t.state, s);
}

#[test]
fn test_force_advance_is_host_only() {
    let waiting = GameState::WaitingForQuorum {
        round: 1,
        deck: ids(&["A"]),
    };
    assert_eq!(
        reduce(&waiting, &HOST, GameInput::ForceAdvance).effects,
        vec![Effect::ForceCheck { round: 1 }]
    );
    assert!(reduce(&waiting, &GUEST, GameInput::ForceAdvance)
        .effects
        .is_empty());
}

#[test]
fn test_rejected_vote_rewinds_to_that_card() {
    let waiting = GameState::WaitingForQuorum {
        round: 1,
        deck: ids(&["A", "B"]),
    };
    let t = reduce(
        &waiting,
        &GUEST,
        GameInput::VoteRejected {
            round: 1,
            candidate_id: "A".to_string(),
        },
    );
    assert_eq!(t.state, swiping(1, &["A", "B"], 0));
}

#[test]
fn test_forced_summary_advances_forced() {
    let s = GameState::RoundSummary {
        round: 1,
        unanimous: Vec::new(),
        advancing: Vec::new(),
        next_action: NextAction::Vote,
        forced: true,
    };
    assert_eq!(
        reduce(&s, &HOST, GameInput::Proceed).effects,
        vec![Effect::AdvanceRound {
            from_round: 1,
            forced: true
        }]
    );
}
