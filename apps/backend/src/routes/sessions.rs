//! Session HTTP routes.
//!
//! Every mutating endpoint is safe to retry: the services behind them are
//! idempotent, so a replayed request returns the state the first one made.

use std::convert::Infallible;

use actix_web::http::StatusCode;
use actix_web::web::Bytes;
use actix_web::{web, HttpResponse, Result};
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::{debug, info};

use crate::db::require_db;
use crate::domain::{CandidateId, RoundResult, VoteDirection};
use crate::entities::sessions::SessionStatus;
use crate::error::AppError;
use crate::extractors::{JsonBody, Participant, SessionId};
use crate::repos::candidates::Candidate;
use crate::repos::sessions::Session;
use crate::services::access::require_member;
use crate::services::{
    RoundCompletionService, SessionCoordinator, SwipeRecorder, VoteTallyService,
};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub id: String,
    pub code: String,
    pub host_id: String,
    pub current_round: i32,
    pub status: SessionStatus,
    pub started: bool,
    pub ended: bool,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            started: session.is_started(),
            ended: session.is_ended(),
            id: session.id,
            code: session.code,
            host_id: session.host_id,
            current_round: session.current_round,
            status: session.status,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreateSessionRequest {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct JoinByCodeRequest {
    code: String,
}

#[derive(Debug, Serialize)]
struct JoinResponse {
    session: SessionResponse,
    joined: bool,
}

#[derive(Debug, Serialize)]
struct RosterResponse {
    participants: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct VoteRequest {
    candidate_id: CandidateId,
    round_number: i32,
    direction: VoteDirection,
}

#[derive(Debug, Deserialize)]
struct FinalVoteRequest {
    candidate_id: CandidateId,
}

#[derive(Debug, Serialize)]
struct VoteResponse<T: Serialize> {
    vote: T,
    created: bool,
}

#[derive(Debug, Deserialize)]
struct CheckRoundRequest {
    round_number: i32,
    #[serde(default)]
    deck_candidate_ids: Vec<CandidateId>,
}

#[derive(Debug, Deserialize)]
struct ForceCheckRequest {
    round_number: i32,
}

#[derive(Debug, Deserialize)]
struct AdvanceRequest {
    from_round: i32,
    #[serde(default)]
    forced: bool,
}

#[derive(Debug, Serialize)]
struct AdvanceResponse {
    session: SessionResponse,
    result: RoundResult,
    advanced: bool,
}

fn coordinator(state: &AppState) -> SessionCoordinator {
    SessionCoordinator::new(state.hub.clone(), state.engine.clone())
}

/// POST /api/sessions
async fn create_session(
    participant: Participant,
    body: JsonBody<CreateSessionRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let db = require_db(&app_state)?;
    let body = body.into_inner();
    let session = coordinator(&app_state)
        .create(db, participant.as_str(), body.candidates)
        .await?;

    info!(session_id = %session.id, host_id = %session.host_id, "session created via HTTP");
    Ok(HttpResponse::Created().json(SessionResponse::from(session)))
}

/// POST /api/sessions/join
async fn join_by_code(
    participant: Participant,
    body: JsonBody<JoinByCodeRequest>,
    app_state: web::Data<AppState>,
) -> Result<web::Json<JoinResponse>, AppError> {
    let db = require_db(&app_state)?;
    let outcome = coordinator(&app_state)
        .join_by_code(db, &body.code, participant.as_str())
        .await?;
    Ok(web::Json(JoinResponse {
        session: outcome.session.into(),
        joined: outcome.joined,
    }))
}

/// POST /api/sessions/{session_id}/join
async fn join_session(
    session_id: SessionId,
    participant: Participant,
    app_state: web::Data<AppState>,
) -> Result<web::Json<JoinResponse>, AppError> {
    let db = require_db(&app_state)?;
    let outcome = coordinator(&app_state)
        .join(db, session_id.as_str(), participant.as_str())
        .await?;
    Ok(web::Json(JoinResponse {
        session: outcome.session.into(),
        joined: outcome.joined,
    }))
}

/// GET /api/sessions/{session_id}
///
/// The caller's view: current deck, own votes, matches and final choice.
async fn get_session(
    session_id: SessionId,
    participant: Participant,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let db = require_db(&app_state)?;
    let view = coordinator(&app_state)
        .snapshot(db, session_id.as_str(), participant.as_str())
        .await?;
    Ok(HttpResponse::Ok().json(view))
}

/// GET /api/sessions/{session_id}/participants
async fn get_roster(
    session_id: SessionId,
    participant: Participant,
    app_state: web::Data<AppState>,
) -> Result<web::Json<RosterResponse>, AppError> {
    let db = require_db(&app_state)?;
    require_member(db, session_id.as_str(), participant.as_str()).await?;
    let participants = coordinator(&app_state)
        .roster(db, session_id.as_str())
        .await?;
    Ok(web::Json(RosterResponse { participants }))
}

/// POST /api/sessions/{session_id}/start
async fn start_session(
    session_id: SessionId,
    participant: Participant,
    app_state: web::Data<AppState>,
) -> Result<web::Json<SessionResponse>, AppError> {
    let db = require_db(&app_state)?;
    let session = coordinator(&app_state)
        .start(db, session_id.as_str(), participant.as_str())
        .await?;
    Ok(web::Json(session.into()))
}

/// POST /api/sessions/{session_id}/advance
async fn advance_round(
    session_id: SessionId,
    participant: Participant,
    body: JsonBody<AdvanceRequest>,
    app_state: web::Data<AppState>,
) -> Result<web::Json<AdvanceResponse>, AppError> {
    let db = require_db(&app_state)?;
    let outcome = coordinator(&app_state)
        .advance_round(
            db,
            session_id.as_str(),
            participant.as_str(),
            body.from_round,
            body.forced,
        )
        .await?;
    Ok(web::Json(AdvanceResponse {
        session: outcome.session.into(),
        result: outcome.result,
        advanced: outcome.advanced,
    }))
}

/// POST /api/sessions/{session_id}/end
async fn end_session(
    session_id: SessionId,
    participant: Participant,
    app_state: web::Data<AppState>,
) -> Result<web::Json<SessionResponse>, AppError> {
    let db = require_db(&app_state)?;
    let session = coordinator(&app_state)
        .end(db, session_id.as_str(), participant.as_str())
        .await?;
    Ok(web::Json(session.into()))
}

/// POST /api/sessions/{session_id}/votes
///
/// 201 when this request stored the vote, 200 when it already existed.
async fn record_vote(
    session_id: SessionId,
    participant: Participant,
    body: JsonBody<VoteRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let db = require_db(&app_state)?;
    let recorded = SwipeRecorder::new(app_state.hub.clone())
        .record_vote(
            db,
            session_id.as_str(),
            participant.as_str(),
            &body.candidate_id,
            body.round_number,
            body.direction,
        )
        .await?;

    let status = if recorded.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok(HttpResponse::build(status).json(VoteResponse {
        vote: recorded.vote,
        created: recorded.created,
    }))
}

/// POST /api/sessions/{session_id}/final-vote
async fn cast_final_vote(
    session_id: SessionId,
    participant: Participant,
    body: JsonBody<FinalVoteRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let db = require_db(&app_state)?;
    let recorded = SwipeRecorder::new(app_state.hub.clone())
        .cast_final_vote(db, session_id.as_str(), participant.as_str(), &body.candidate_id)
        .await?;
    Ok(HttpResponse::Ok().json(VoteResponse {
        vote: recorded.vote,
        created: recorded.created,
    }))
}

/// POST /api/sessions/{session_id}/abstain
async fn abstain(
    session_id: SessionId,
    participant: Participant,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let db = require_db(&app_state)?;
    let votes = SwipeRecorder::new(app_state.hub.clone())
        .abstain_final_vote(db, session_id.as_str(), participant.as_str())
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "votes": votes })))
}

/// POST /api/sessions/{session_id}/rounds/check
async fn check_round(
    session_id: SessionId,
    participant: Participant,
    body: JsonBody<CheckRoundRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let db = require_db(&app_state)?;
    let result = RoundCompletionService::new(app_state.hub.clone(), app_state.engine.round_policy())
        .check_round(
            db,
            session_id.as_str(),
            participant.as_str(),
            body.round_number,
            &body.deck_candidate_ids,
        )
        .await?;
    Ok(HttpResponse::Ok().json(result))
}

/// POST /api/sessions/{session_id}/rounds/force-check
async fn force_check_round(
    session_id: SessionId,
    participant: Participant,
    body: JsonBody<ForceCheckRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let db = require_db(&app_state)?;
    let result = RoundCompletionService::new(app_state.hub.clone(), app_state.engine.round_policy())
        .force_check_round(db, session_id.as_str(), participant.as_str(), body.round_number)
        .await?;
    Ok(HttpResponse::Ok().json(result))
}

/// POST /api/sessions/{session_id}/tally
async fn tally(
    session_id: SessionId,
    participant: Participant,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let db = require_db(&app_state)?;
    let outcome = VoteTallyService::new(app_state.hub.clone())
        .tally(db, session_id.as_str(), participant.as_str())
        .await?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// GET /api/sessions/{session_id}/events
///
/// Server-sent change notifications. Payloads say what changed, not the new
/// state; clients re-read the session on every event. A `resync` event means
/// notifications were dropped.
async fn session_events(
    session_id: SessionId,
    participant: Participant,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let db = require_db(&app_state)?;
    require_member(db, session_id.as_str(), participant.as_str()).await?;

    let receiver = app_state.hub.subscribe(session_id.as_str());
    debug!(session_id = %session_id.as_str(), participant_id = %participant.as_str(), "event stream opened");

    let events = BroadcastStream::new(receiver).filter_map(|item| match item {
        Ok(event) => serde_json::to_string(&event)
            .ok()
            .map(|json| Ok::<_, Infallible>(Bytes::from(format!("data: {json}\n\n")))),
        Err(BroadcastStreamRecvError::Lagged(skipped)) => Some(Ok(Bytes::from(format!(
            "event: resync\ndata: {{\"skipped\":{skipped}}}\n\n"
        )))),
    });
    let stream =
        tokio_stream::once(Ok::<_, Infallible>(Bytes::from_static(b": connected\n\n"))).chain(events);

    Ok(HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .streaming(stream))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("").route(web::post().to(create_session)))
        .service(web::resource("/join").route(web::post().to(join_by_code)))
        .service(web::resource("/{session_id}").route(web::get().to(get_session)))
        .service(web::resource("/{session_id}/join").route(web::post().to(join_session)))
        .service(web::resource("/{session_id}/participants").route(web::get().to(get_roster)))
        .service(web::resource("/{session_id}/start").route(web::post().to(start_session)))
        .service(web::resource("/{session_id}/advance").route(web::post().to(advance_round)))
        .service(web::resource("/{session_id}/end").route(web::post().to(end_session)))
        .service(web::resource("/{session_id}/votes").route(web::post().to(record_vote)))
        .service(web::resource("/{session_id}/final-vote").route(web::post().to(cast_final_vote)))
        .service(web::resource("/{session_id}/abstain").route(web::post().to(abstain)))
        .service(web::resource("/{session_id}/rounds/check").route(web::post().to(check_round)))
        .service(
            web::resource("/{session_id}/rounds/force-check")
                .route(web::post().to(force_check_round)),
        )
        .service(web::resource("/{session_id}/tally").route(web::post().to(tally)))
        .service(web::resource("/{session_id}/events").route(web::get().to(session_events)));
}
