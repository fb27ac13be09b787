//! Registrations and the roster read model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user's place in an event. At most one exists per `(user_id, event_id)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
  pub id:         Uuid,
  pub user_id:    Uuid,
  pub event_id:   Uuid,
  pub attended:   bool,
  pub created_at: DateTime<Utc>,
}

/// A registered user's public profile, as listed on an event roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registrant {
  pub id:    Uuid,
  pub name:  Option<String>,
  pub email: String,
  pub image: Option<String>,
}
