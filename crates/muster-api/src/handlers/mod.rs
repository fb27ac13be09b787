pub mod admin;
pub mod events;

use axum::{Json, http::StatusCode};
use muster_core::{ErrorKind, Outcome};

/// Status code for a mutation reply; the body is always the [`Outcome`].
pub(crate) fn outcome_status(outcome: &Outcome, on_success: StatusCode) -> StatusCode {
  match outcome.error {
    None => on_success,
    Some(ErrorKind::Validation) => StatusCode::BAD_REQUEST,
    Some(ErrorKind::Conflict) => StatusCode::CONFLICT,
    Some(ErrorKind::DeadlineExceeded | ErrorKind::CapacityExceeded) => {
      StatusCode::UNPROCESSABLE_ENTITY
    }
    Some(ErrorKind::NotFound) => StatusCode::NOT_FOUND,
    Some(ErrorKind::Store) => StatusCode::INTERNAL_SERVER_ERROR,
  }
}

/// Reply for a mutation whose path or body could not be decoded.
pub(crate) fn unreadable(message: String) -> (StatusCode, Json<Outcome>) {
  tracing::warn!(error = %message, "rejected undecodable request");
  (
    StatusCode::BAD_REQUEST,
    Json(Outcome::failure(ErrorKind::Validation, message)),
  )
}
