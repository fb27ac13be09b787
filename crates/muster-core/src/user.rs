//! Users, roles, and the per-request principal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Authorization role carried by a user and by the principal resolved from
/// their session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
  #[default]
  Participant,
  Admin,
}

impl Role {
  pub fn as_str(self) -> &'static str {
    match self {
      Role::Participant => "PARTICIPANT",
      Role::Admin => "ADMIN",
    }
  }
}

/// A registered account. Created on first sign-in; only the role is ever
/// mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub id:         Uuid,
  pub email:      String,
  pub name:       Option<String>,
  pub image:      Option<String>,
  pub role:       Role,
  pub created_at: DateTime<Utc>,
}

impl User {
  pub fn principal(&self) -> Principal {
    Principal {
      user_id: self.id,
      email:   self.email.clone(),
      role:    self.role,
    }
  }
}

/// Profile supplied by the identity provider on sign-in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignIn {
  pub email: String,
  pub name:  Option<String>,
  pub image: Option<String>,
}

impl SignIn {
  pub fn email(email: impl Into<String>) -> Self {
    Self { email: email.into(), ..Self::default() }
  }
}

/// The authenticated identity resolved for the current request.
///
/// Built from session claims alone; never refreshed from the store while a
/// request is in flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
  pub user_id: Uuid,
  pub email:   String,
  pub role:    Role,
}

impl Principal {
  pub fn is_admin(&self) -> bool { self.role == Role::Admin }
}
