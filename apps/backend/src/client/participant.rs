//! Per-participant driver: runs the reducer against a live backend.
//!
//! One tokio task per participant owns the `GameState`. It reacts to local
//! actions, to change notifications from the session hub, and to a polling
//! tick that covers missed notifications. Completion checks and tallies run
//! as separate tasks behind a `CheckGate`, so a slow answer never blocks the
//! loop and a superseded answer is dropped.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::backend::SessionBackend;
use crate::client::check_gate::{CheckGate, CheckKind, CheckTicket};
use crate::config::engine::EngineConfig;
use crate::domain::game_state::reduce;
use crate::domain::{
    CandidateId, Effect, GameInput, GameState, ReducerContext, RoundResult, TallyOutcome,
    VoteDirection,
};
use crate::errors::domain::DomainError;
use crate::sync::SyncEvent;

const ACTION_BUFFER: usize = 32;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("participant driver has stopped")]
    Closed,
    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Something the participant does on their own device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalAction {
    Swipe(VoteDirection),
    CastFinalVote(CandidateId),
    Abstain,
    Proceed,
    ForceAdvance,
}

impl From<LocalAction> for GameInput {
    fn from(action: LocalAction) -> Self {
        match action {
            LocalAction::Swipe(direction) => GameInput::Swipe(direction),
            LocalAction::CastFinalVote(candidate_id) => GameInput::CastFinalVote(candidate_id),
            LocalAction::Abstain => GameInput::Abstain,
            LocalAction::Proceed => GameInput::Proceed,
            LocalAction::ForceAdvance => GameInput::ForceAdvance,
        }
    }
}

/// Answer from a background check, tagged with the gate generation it ran under.
#[derive(Debug)]
enum CheckAnswer {
    Round {
        generation: u64,
        forced: bool,
        result: Result<RoundResult, DomainError>,
    },
    Tally {
        generation: u64,
        result: Result<TallyOutcome, DomainError>,
    },
}

/// Handle to a running participant driver.
pub struct ParticipantHandle {
    participant_id: String,
    actions: mpsc::Sender<LocalAction>,
    state: watch::Receiver<GameState>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl ParticipantHandle {
    pub fn participant_id(&self) -> &str {
        &self.participant_id
    }

    pub async fn send(&self, action: LocalAction) -> Result<(), ClientError> {
        self.actions
            .send(action)
            .await
            .map_err(|_| ClientError::Closed)
    }

    /// Latest published state.
    pub fn state(&self) -> GameState {
        self.state.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<GameState> {
        self.state.clone()
    }

    /// Wait until the published state satisfies `pred`.
    pub async fn wait_for<F>(&self, pred: F) -> Result<GameState, ClientError>
    where
        F: FnMut(&GameState) -> bool,
    {
        let mut rx = self.state.clone();
        let state = rx.wait_for(pred).await.map_err(|_| ClientError::Closed)?;
        Ok(state.clone())
    }

    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            if e.is_panic() {
                warn!(participant_id = %self.participant_id, "participant driver panicked");
            }
        }
    }
}

pub struct ParticipantDriver {
    backend: Arc<dyn SessionBackend>,
    session_id: String,
    participant_id: String,
    ctx: ReducerContext,
    state: GameState,
    gate: CheckGate,
    in_flight: Option<JoinHandle<()>>,
    answers_tx: mpsc::UnboundedSender<CheckAnswer>,
    state_tx: watch::Sender<GameState>,
}

impl ParticipantDriver {
    /// Load the participant's snapshot and start driving it.
    ///
    /// The change feed is subscribed before the first snapshot is read so no
    /// update between the two is lost.
    pub async fn spawn(
        backend: Arc<dyn SessionBackend>,
        session_id: impl Into<String>,
        participant_id: impl Into<String>,
        engine: &EngineConfig,
    ) -> Result<ParticipantHandle, ClientError> {
        let session_id = session_id.into();
        let participant_id = participant_id.into();

        let events = backend.subscribe(&session_id);
        let view = backend.snapshot(&session_id, &participant_id).await?;
        let ctx = ReducerContext {
            is_host: view.is_host(&participant_id),
        };
        let initial = GameState::initial(view, &ctx);

        let (state_tx, state_rx) = watch::channel(initial.state.clone());
        let (actions_tx, actions_rx) = mpsc::channel(ACTION_BUFFER);
        let (answers_tx, answers_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let driver = ParticipantDriver {
            backend,
            session_id,
            participant_id: participant_id.clone(),
            ctx,
            state: initial.state,
            gate: CheckGate::new(engine.check_debounce),
            in_flight: None,
            answers_tx,
            state_tx,
        };

        info!(
            session_id = %driver.session_id,
            participant_id = %driver.participant_id,
            is_host = ctx.is_host,
            "participant driver started"
        );

        let task = tokio::spawn(driver.run(
            initial.effects,
            actions_rx,
            answers_rx,
            events,
            engine.poll_interval,
            cancel.clone(),
        ));

        Ok(ParticipantHandle {
            participant_id,
            actions: actions_tx,
            state: state_rx,
            cancel,
            task,
        })
    }

    async fn run(
        mut self,
        initial_effects: Vec<Effect>,
        mut actions: mpsc::Receiver<LocalAction>,
        mut answers: mpsc::UnboundedReceiver<CheckAnswer>,
        mut events: broadcast::Receiver<SyncEvent>,
        poll_interval: Duration,
        cancel: CancellationToken,
    ) {
        self.run_effects(initial_effects).await;

        let mut poll = time::interval(poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately; the snapshot was just read.
        poll.tick().await;

        while !self.state.is_ended() {
            let deadline = self.gate.deadline();
            let sleep_target = deadline.unwrap_or_else(|| Instant::now() + poll_interval);

            tokio::select! {
                _ = cancel.cancelled() => break,
                action = actions.recv() => match action {
                    Some(action) => self.apply(action.into()).await,
                    None => break,
                },
                event = events.recv() => match event {
                    Ok(event) => {
                        debug!(participant_id = %self.participant_id, ?event, "sync event");
                        if let SyncEvent::RoundCompleted { forced, result, .. } = event {
                            self.apply(GameInput::RoundEvaluated { result, forced }).await;
                        }
                        self.resync().await;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(participant_id = %self.participant_id, skipped, "sync feed lagged");
                        self.resync().await;
                    }
                    Err(RecvError::Closed) => {
                        events = self.backend.subscribe(&self.session_id);
                        self.resync().await;
                    }
                },
                Some(answer) = answers.recv() => self.on_answer(answer).await,
                _ = poll.tick() => self.resync().await,
                _ = time::sleep_until(sleep_target), if deadline.is_some() => self.fire_due_check(),
            }
        }

        if let Some(task) = self.in_flight.take() {
            task.abort();
        }
        info!(
            session_id = %self.session_id,
            participant_id = %self.participant_id,
            ended = self.state.is_ended(),
            "participant driver stopped"
        );
    }

    /// Feed an input through the reducer and carry out the resulting effects.
    /// Effects may produce follow-up inputs; those are processed in order.
    async fn apply(&mut self, input: GameInput) {
        let mut queue = VecDeque::from([input]);
        while let Some(input) = queue.pop_front() {
            let transition = reduce(&self.state, &self.ctx, input);
            self.publish_state(transition.state);
            for effect in transition.effects {
                if let Some(next) = self.run_effect(effect).await {
                    queue.push_back(next);
                }
            }
        }
    }

    async fn run_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            if let Some(next) = self.run_effect(effect).await {
                self.apply(next).await;
            }
        }
    }

    fn publish_state(&mut self, state: GameState) {
        if state != self.state {
            debug!(participant_id = %self.participant_id, ?state, "state changed");
            self.state = state.clone();
            self.state_tx.send_replace(state);
        }
        if self.state.is_ended() {
            self.gate.invalidate();
        }
    }

    async fn run_effect(&mut self, effect: Effect) -> Option<GameInput> {
        let backend = self.backend.clone();
        let (session_id, participant_id) = (self.session_id.as_str(), self.participant_id.as_str());

        match effect {
            Effect::RecordVote {
                round,
                candidate_id,
                direction,
            } => match backend
                .record_vote(session_id, participant_id, &candidate_id, round, direction)
                .await
            {
                Ok(_) => None,
                Err(e) => {
                    warn!(participant_id, round, candidate_id = %candidate_id, error = %e, "vote rejected");
                    Some(GameInput::VoteRejected {
                        round,
                        candidate_id,
                    })
                }
            },
            Effect::CheckCompletion { round, deck } => {
                self.gate
                    .trigger(CheckKind::Completion { round, deck }, Instant::now());
                None
            }
            Effect::RequestTally { round } => {
                self.gate.trigger(CheckKind::Tally { round }, Instant::now());
                None
            }
            Effect::ForceCheck { round } => {
                let ticket = self.gate.issue_now(CheckKind::Completion {
                    round,
                    deck: Vec::new(),
                });
                self.dispatch(ticket, true);
                None
            }
            Effect::AdvanceRound { from_round, forced } => {
                match backend
                    .advance_round(session_id, participant_id, from_round, forced)
                    .await
                {
                    Ok(outcome) => {
                        debug!(participant_id, from_round, advanced = outcome.advanced, "advance requested");
                    }
                    Err(e) => warn!(participant_id, from_round, error = %e, "advance failed"),
                }
                self.fetch_snapshot().await
            }
            Effect::CastFinalVote {
                round,
                candidate_id,
            } => {
                if let Err(e) = backend
                    .cast_final_vote(session_id, participant_id, &candidate_id)
                    .await
                {
                    warn!(participant_id, round, error = %e, "final vote failed");
                }
                None
            }
            Effect::Abstain { round } => {
                if let Err(e) = backend.abstain(session_id, participant_id).await {
                    warn!(participant_id, round, error = %e, "abstain failed");
                }
                None
            }
            Effect::EndSession => {
                if let Err(e) = backend.end_session(session_id, participant_id).await {
                    warn!(participant_id, error = %e, "end session failed");
                }
                None
            }
        }
    }

    fn fire_due_check(&mut self) {
        if let Some(ticket) = self.gate.take_due(Instant::now()) {
            self.dispatch(ticket, false);
        }
    }

    /// Run a check in the background. A newer dispatch aborts the older task.
    fn dispatch(&mut self, ticket: CheckTicket, forced: bool) {
        if let Some(previous) = self.in_flight.take() {
            previous.abort();
        }

        let backend = self.backend.clone();
        let answers = self.answers_tx.clone();
        let session_id = self.session_id.clone();
        let participant_id = self.participant_id.clone();
        let CheckTicket { generation, kind } = ticket;

        self.in_flight = Some(tokio::spawn(async move {
            let answer = match kind {
                CheckKind::Completion { round, .. } if forced => CheckAnswer::Round {
                    generation,
                    forced,
                    result: backend
                        .force_check_round(&session_id, &participant_id, round)
                        .await,
                },
                CheckKind::Completion { round, deck } => CheckAnswer::Round {
                    generation,
                    forced,
                    result: backend
                        .check_round(&session_id, &participant_id, round, &deck)
                        .await,
                },
                CheckKind::Tally { .. } => CheckAnswer::Tally {
                    generation,
                    result: backend.tally(&session_id, &participant_id).await,
                },
            };
            // Receiver gone means the driver stopped.
            let _ = answers.send(answer);
        }));
    }

    async fn on_answer(&mut self, answer: CheckAnswer) {
        let generation = match &answer {
            CheckAnswer::Round { generation, .. } | CheckAnswer::Tally { generation, .. } => {
                *generation
            }
        };
        if !self.gate.is_current(generation) {
            debug!(participant_id = %self.participant_id, generation, "stale check answer dropped");
            return;
        }
        self.in_flight = None;

        match answer {
            CheckAnswer::Round {
                forced, result: Ok(result), ..
            } => self.apply(GameInput::RoundEvaluated { result, forced }).await,
            CheckAnswer::Tally {
                result: Ok(outcome),
                ..
            } => self.apply(GameInput::TallyResolved(outcome)).await,
            CheckAnswer::Round { result: Err(e), .. } | CheckAnswer::Tally { result: Err(e), .. } => {
                warn!(participant_id = %self.participant_id, error = %e, "check failed");
            }
        }
    }

    async fn fetch_snapshot(&self) -> Option<GameInput> {
        match self
            .backend
            .snapshot(&self.session_id, &self.participant_id)
            .await
        {
            Ok(view) => Some(GameInput::SnapshotObserved(view)),
            Err(e) => {
                warn!(participant_id = %self.participant_id, error = %e, "snapshot failed");
                None
            }
        }
    }

    async fn resync(&mut self) {
        if let Some(input) = self.fetch_snapshot().await {
            self.apply(input).await;
        }
    }
}
