use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::errors::ErrorCode;

/// Session id from the `{session_id}` path segment.
///
/// Only the shape is checked here; existence is the service layer's call so
/// the same lookup serves authorization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn parse_session_id(req: &HttpRequest) -> Result<SessionId, AppError> {
    let raw = req.match_info().get("session_id").ok_or_else(|| {
        AppError::bad_request(ErrorCode::InvalidSessionId, "Missing session_id parameter")
    })?;

    let id = Uuid::parse_str(raw).map_err(|_| {
        AppError::bad_request(
            ErrorCode::InvalidSessionId,
            format!("Invalid session id: {raw}"),
        )
    })?;

    Ok(SessionId(id.hyphenated().to_string()))
}

impl FromRequest for SessionId {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(parse_session_id(req))
    }
}
