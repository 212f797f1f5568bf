//! The seam between a participant driver and the authoritative store.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use tokio::sync::broadcast;

use crate::db::require_db;
use crate::domain::{CandidateId, RoundResult, SessionView, TallyOutcome, VoteDirection};
use crate::error::AppError;
use crate::errors::domain::DomainError;
use crate::repos::votes::Vote;
use crate::services::{
    AdvanceOutcome, RecordedVote, RoundCompletionService, SessionCoordinator, SwipeRecorder,
    VoteTallyService,
};
use crate::state::AppState;
use crate::sync::{SyncEvent, SyncHub};

/// Operations a participant can ask of the session store, plus its change feed.
#[async_trait]
pub trait SessionBackend: Send + Sync + 'static {
    async fn snapshot(
        &self,
        session_id: &str,
        participant_id: &str,
    ) -> Result<SessionView, DomainError>;

    async fn record_vote(
        &self,
        session_id: &str,
        participant_id: &str,
        candidate_id: &str,
        round_number: i32,
        direction: VoteDirection,
    ) -> Result<RecordedVote, DomainError>;

    async fn check_round(
        &self,
        session_id: &str,
        participant_id: &str,
        round_number: i32,
        deck: &[CandidateId],
    ) -> Result<RoundResult, DomainError>;

    async fn force_check_round(
        &self,
        session_id: &str,
        participant_id: &str,
        round_number: i32,
    ) -> Result<RoundResult, DomainError>;

    async fn advance_round(
        &self,
        session_id: &str,
        participant_id: &str,
        from_round: i32,
        forced: bool,
    ) -> Result<AdvanceOutcome, DomainError>;

    async fn cast_final_vote(
        &self,
        session_id: &str,
        participant_id: &str,
        candidate_id: &str,
    ) -> Result<RecordedVote, DomainError>;

    async fn abstain(&self, session_id: &str, participant_id: &str)
        -> Result<Vec<Vote>, DomainError>;

    async fn tally(&self, session_id: &str, participant_id: &str)
        -> Result<TallyOutcome, DomainError>;

    async fn end_session(&self, session_id: &str, participant_id: &str)
        -> Result<(), DomainError>;

    /// Change notifications for one session. Delivery is best effort.
    fn subscribe(&self, session_id: &str) -> broadcast::Receiver<SyncEvent>;
}

/// In-process backend calling the services directly against a database.
#[derive(Clone)]
pub struct LocalBackend {
    db: DatabaseConnection,
    hub: Arc<SyncHub>,
    coordinator: Arc<SessionCoordinator>,
    swipes: Arc<SwipeRecorder>,
    completion: Arc<RoundCompletionService>,
    tally: Arc<VoteTallyService>,
}

impl LocalBackend {
    pub fn from_state(state: &AppState) -> Result<Self, AppError> {
        let db = require_db(state)?.clone();
        let hub = state.hub.clone();
        Ok(Self {
            db,
            coordinator: Arc::new(SessionCoordinator::new(hub.clone(), state.engine.clone())),
            swipes: Arc::new(SwipeRecorder::new(hub.clone())),
            completion: Arc::new(RoundCompletionService::new(
                hub.clone(),
                state.engine.round_policy(),
            )),
            tally: Arc::new(VoteTallyService::new(hub.clone())),
            hub,
        })
    }

    pub fn coordinator(&self) -> &SessionCoordinator {
        &self.coordinator
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[async_trait]
impl SessionBackend for LocalBackend {
    async fn snapshot(
        &self,
        session_id: &str,
        participant_id: &str,
    ) -> Result<SessionView, DomainError> {
        self.coordinator
            .snapshot(&self.db, session_id, participant_id)
            .await
    }

    async fn record_vote(
        &self,
        session_id: &str,
        participant_id: &str,
        candidate_id: &str,
        round_number: i32,
        direction: VoteDirection,
    ) -> Result<RecordedVote, DomainError> {
        self.swipes
            .record_vote(
                &self.db,
                session_id,
                participant_id,
                candidate_id,
                round_number,
                direction,
            )
            .await
    }

    async fn check_round(
        &self,
        session_id: &str,
        participant_id: &str,
        round_number: i32,
        deck: &[CandidateId],
    ) -> Result<RoundResult, DomainError> {
        self.completion
            .check_round(&self.db, session_id, participant_id, round_number, deck)
            .await
    }

    async fn force_check_round(
        &self,
        session_id: &str,
        participant_id: &str,
        round_number: i32,
    ) -> Result<RoundResult, DomainError> {
        self.completion
            .force_check_round(&self.db, session_id, participant_id, round_number)
            .await
    }

    async fn advance_round(
        &self,
        session_id: &str,
        participant_id: &str,
        from_round: i32,
        forced: bool,
    ) -> Result<AdvanceOutcome, DomainError> {
        self.coordinator
            .advance_round(&self.db, session_id, participant_id, from_round, forced)
            .await
    }

    async fn cast_final_vote(
        &self,
        session_id: &str,
        participant_id: &str,
        candidate_id: &str,
    ) -> Result<RecordedVote, DomainError> {
        self.swipes
            .cast_final_vote(&self.db, session_id, participant_id, candidate_id)
            .await
    }

    async fn abstain(
        &self,
        session_id: &str,
        participant_id: &str,
    ) -> Result<Vec<Vote>, DomainError> {
        self.swipes
            .abstain_final_vote(&self.db, session_id, participant_id)
            .await
    }

    async fn tally(
        &self,
        session_id: &str,
        participant_id: &str,
    ) -> Result<TallyOutcome, DomainError> {
        self.tally.tally(&self.db, session_id, participant_id).await
    }

    async fn end_session(&self, session_id: &str, participant_id: &str) -> Result<(), DomainError> {
        self.coordinator
            .end(&self.db, session_id, participant_id)
            .await
            .map(|_| ())
    }

    fn subscribe(&self, session_id: &str) -> broadcast::Receiver<SyncEvent> {
        self.hub.subscribe(session_id)
    }
}
