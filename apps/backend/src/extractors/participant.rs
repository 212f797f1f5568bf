use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use serde::Serialize;

use crate::error::AppError;
use crate::errors::ErrorCode;

/// Header naming the calling participant. Identity is an opaque string
/// issued by the client; there is no account system behind it.
pub const PARTICIPANT_HEADER: &str = "x-participant-id";

const MAX_PARTICIPANT_ID_LEN: usize = 128;

/// The participant making the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Participant(pub String);

impl Participant {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn parse_participant(req: &HttpRequest) -> Result<Participant, AppError> {
    let raw = req.headers().get(PARTICIPANT_HEADER).ok_or_else(|| {
        AppError::bad_request(
            ErrorCode::MissingParticipant,
            format!("Missing {PARTICIPANT_HEADER} header"),
        )
    })?;

    let value = raw
        .to_str()
        .map_err(|_| {
            AppError::bad_request(
                ErrorCode::InvalidHeader,
                format!("{PARTICIPANT_HEADER} must be visible ASCII"),
            )
        })?
        .trim();

    if value.is_empty() || value.len() > MAX_PARTICIPANT_ID_LEN {
        return Err(AppError::bad_request(
            ErrorCode::InvalidHeader,
            format!("{PARTICIPANT_HEADER} must be 1..={MAX_PARTICIPANT_ID_LEN} characters"),
        ));
    }

    Ok(Participant(value.to_string()))
}

impl FromRequest for Participant {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(parse_participant(req))
    }
}
