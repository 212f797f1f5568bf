//! Builders for sessions in known states.

use std::sync::Arc;

use backend_test_support::unique_helpers::{unique_participant, unique_participants};
use huddle::config::db::DbKind;
use huddle::domain::{RoundResult, VoteDirection};
use huddle::infra::state::build_state;
use huddle::repos::candidates::Candidate;
use huddle::repos::sessions::Session;
use huddle::services::{
    RoundCompletionService, SessionCoordinator, SwipeRecorder, VoteTallyService,
};
use huddle::{AppState, EngineConfig};
use sea_orm::DatabaseConnection;

pub async fn test_state() -> AppState {
    test_state_with(EngineConfig::default()).await
}

/// Fresh in-memory database, migrated.
pub async fn test_state_with(engine: EngineConfig) -> AppState {
    build_state()
        .with_db(DbKind::SqliteMemory)
        .with_engine(engine)
        .build()
        .await
        .expect("build sqlite test state")
}

pub fn candidates(ids: &[&str]) -> Vec<Candidate> {
    ids.iter()
        .map(|id| Candidate {
            candidate_id: id.to_string(),
            name: format!("Place {id}"),
            category: Some("restaurant".to_string()),
            rating: Some(4.5),
            address: None,
        })
        .collect()
}

/// A session with its services, host and guests.
pub struct Table {
    pub state: AppState,
    pub coordinator: SessionCoordinator,
    pub swipes: SwipeRecorder,
    pub completion: Arc<RoundCompletionService>,
    pub tally: VoteTallyService,
    pub session: Session,
    pub host: String,
    pub guests: Vec<String>,
}

impl Table {
    /// Created and joined, not started.
    pub async fn lobby(state: AppState, guests: usize, pool: &[&str]) -> Self {
        let hub = state.hub.clone();
        let coordinator = SessionCoordinator::new(hub.clone(), state.engine.clone());
        let completion = Arc::new(RoundCompletionService::new(
            hub.clone(),
            state.engine.round_policy(),
        ));
        let host = unique_participant("host");
        let guests = unique_participants(guests);

        let db = state.db().expect("db").clone();
        let session = coordinator
            .create(&db, &host, candidates(pool))
            .await
            .expect("create session");
        for guest in &guests {
            coordinator
                .join(&db, &session.id, guest)
                .await
                .expect("guest joins");
        }

        Self {
            swipes: SwipeRecorder::new(hub.clone()),
            tally: VoteTallyService::new(hub),
            coordinator,
            completion,
            session,
            host,
            guests,
            state,
        }
    }

    /// Created, joined and started.
    pub async fn started(state: AppState, guests: usize, pool: &[&str]) -> Self {
        let mut table = Self::lobby(state, guests, pool).await;
        table.session = table
            .coordinator
            .start(table.db(), &table.session.id, &table.host)
            .await
            .expect("start session");
        table
    }

    pub fn db(&self) -> &DatabaseConnection {
        self.state.db().expect("db")
    }

    pub fn id(&self) -> &str {
        &self.session.id
    }

    /// Host first, then guests in join order.
    pub fn everyone(&self) -> Vec<String> {
        std::iter::once(self.host.clone())
            .chain(self.guests.iter().cloned())
            .collect()
    }

    /// Record `votes` as `(candidate, accept?)` for one participant.
    pub async fn swipe(&self, participant: &str, round: i32, votes: &[(&str, bool)]) {
        for (candidate, accept) in votes {
            let direction = if *accept {
                VoteDirection::Accept
            } else {
                VoteDirection::Reject
            };
            self.swipes
                .record_vote(self.db(), self.id(), participant, candidate, round, direction)
                .await
                .expect("record vote");
        }
    }

    /// Everyone casts the same votes.
    pub async fn swipe_all(&self, round: i32, votes: &[(&str, bool)]) {
        for participant in self.everyone() {
            self.swipe(&participant, round, votes).await;
        }
    }

    pub async fn check(&self, round: i32) -> RoundResult {
        self.completion
            .check_round(self.db(), self.id(), &self.host, round, &[])
            .await
            .expect("check round")
    }

    pub async fn refresh(&mut self) -> &Session {
        self.session = huddle::repos::sessions::require_session(self.db(), self.id())
            .await
            .expect("reload session");
        &self.session
    }
}
