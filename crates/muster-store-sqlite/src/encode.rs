//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. UUIDs are stored as
//! hyphenated lowercase strings. Enums are stored by their upper-case name.

use chrono::{DateTime, Utc};
use muster_core::{
  event::{Event, EventType},
  registration::Registrant,
  user::{Role, User},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Role ─────────────────────────────────────────────────────────────────────

pub fn encode_role(role: Role) -> &'static str { role.as_str() }

pub fn decode_role(s: &str) -> Result<Role> {
  match s {
    "PARTICIPANT" => Ok(Role::Participant),
    "ADMIN" => Ok(Role::Admin),
    other => Err(Error::UnknownValue { column: "role", value: other.to_owned() }),
  }
}

// ─── EventType ────────────────────────────────────────────────────────────────

pub fn encode_event_type(t: EventType) -> &'static str { t.as_str() }

pub fn decode_event_type(s: &str) -> Result<EventType> {
  match s {
    "SOLO" => Ok(EventType::Solo),
    "TEAM" => Ok(EventType::Team),
    other => Err(Error::UnknownValue { column: "event_type", value: other.to_owned() }),
  }
}

fn decode_count(column: &'static str, n: i64) -> Result<u32> {
  u32::try_from(n).map_err(|_| Error::UnknownValue { column, value: n.to_string() })
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub user_id:    String,
  pub email:      String,
  pub name:       Option<String>,
  pub image:      Option<String>,
  pub role:       String,
  pub created_at: String,
}

impl RawUser {
  pub fn into_user(self) -> Result<User> {
    Ok(User {
      id:         decode_uuid(&self.user_id)?,
      email:      self.email,
      name:       self.name,
      image:      self.image,
      role:       decode_role(&self.role)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from an `events` row.
pub struct RawEvent {
  pub event_id:                  String,
  pub name:                      String,
  pub description:               String,
  pub location:                  Option<String>,
  pub date:                      String,
  pub registration_deadline:     String,
  pub coordinator_email:         String,
  pub event_type:                String,
  pub is_team_event:             bool,
  pub min_participants_per_team: i64,
  pub max_participants_per_team: i64,
  pub created_at:                String,
}

impl RawEvent {
  pub fn into_event(self) -> Result<Event> {
    Ok(Event {
      id:                        decode_uuid(&self.event_id)?,
      name:                      self.name,
      description:               self.description,
      location:                  self.location,
      date:                      decode_dt(&self.date)?,
      registration_deadline:     decode_dt(&self.registration_deadline)?,
      coordinator_email:         self.coordinator_email,
      event_type:                decode_event_type(&self.event_type)?,
      is_team_event:             self.is_team_event,
      min_participants_per_team: decode_count(
        "min_participants_per_team",
        self.min_participants_per_team,
      )?,
      max_participants_per_team: decode_count(
        "max_participants_per_team",
        self.max_participants_per_team,
      )?,
      created_at:                decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read from a `registrations` row joined with `users`.
pub struct RawRegistrant {
  pub user_id: String,
  pub name:    Option<String>,
  pub email:   String,
  pub image:   Option<String>,
}

impl RawRegistrant {
  pub fn into_registrant(self) -> Result<Registrant> {
    Ok(Registrant {
      id:    decode_uuid(&self.user_id)?,
      name:  self.name,
      email: self.email,
      image: self.image,
    })
  }
}
