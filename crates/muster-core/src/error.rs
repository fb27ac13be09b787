//! Error types for `muster-core`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid input: {0}")]
  Validation(String),

  #[error("user {user_id} is already registered for event {event_id}")]
  AlreadyRegistered { user_id: Uuid, event_id: Uuid },

  #[error("registration for event {event_id} closed at {deadline}")]
  DeadlineExceeded {
    event_id: Uuid,
    deadline: DateTime<Utc>,
  },

  #[error("event {event_id} is full ({capacity} participants)")]
  CapacityExceeded { event_id: Uuid, capacity: u32 },

  #[error("event not found: {0}")]
  EventNotFound(Uuid),

  #[error("user not found: {0}")]
  UserNotFound(Uuid),
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Error::Validation(_) => ErrorKind::Validation,
      Error::AlreadyRegistered { .. } => ErrorKind::Conflict,
      Error::DeadlineExceeded { .. } => ErrorKind::DeadlineExceeded,
      Error::CapacityExceeded { .. } => ErrorKind::CapacityExceeded,
      Error::EventNotFound(_) | Error::UserNotFound(_) => ErrorKind::NotFound,
    }
  }
}

/// Coarse classification of a failed operation, reported to callers so they
/// can branch without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
  Validation,
  Conflict,
  DeadlineExceeded,
  CapacityExceeded,
  NotFound,
  /// Any persistence failure not covered by the other kinds.
  Store,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
