//! Events and the typed creation form.
//!
//! An event is created once by a coordinator and never edited afterwards.
//! Wall-clock input (date, time, deadline date) is interpreted as UTC.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Registration for an event closes at this hour and minute on the deadline
/// date.
pub const DEADLINE_HOUR_MINUTE: (u32, u32) = (23, 59);

// ─── Types ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventType {
  Solo,
  Team,
}

impl EventType {
  pub fn as_str(self) -> &'static str {
    match self {
      EventType::Solo => "SOLO",
      EventType::Team => "TEAM",
    }
  }
}

impl FromStr for EventType {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_uppercase().as_str() {
      "SOLO" => Ok(EventType::Solo),
      "TEAM" => Ok(EventType::Team),
      other => Err(Error::Validation(format!("unknown event type: {other:?}"))),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
  pub id:                        Uuid,
  pub name:                      String,
  pub description:               String,
  pub location:                  Option<String>,
  /// Start instant.
  pub date:                      DateTime<Utc>,
  /// Registration is accepted up to and including this instant.
  pub registration_deadline:     DateTime<Utc>,
  /// Owning coordinator. A denormalised attribute, not a reference.
  pub coordinator_email:         String,
  pub event_type:                EventType,
  pub is_team_event:             bool,
  pub min_participants_per_team: u32,
  pub max_participants_per_team: u32,
  pub created_at:                DateTime<Utc>,
}

impl Event {
  /// Maximum number of registrations the event admits, if it is bounded.
  ///
  /// Only team events are bounded; their cap is `max_participants_per_team`.
  pub fn capacity(&self) -> Option<u32> {
    self.is_team_event.then_some(self.max_participants_per_team)
  }
}

/// A validated event, ready to be persisted. The store assigns `id` and
/// `created_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
  pub name:                      String,
  pub description:               String,
  pub location:                  Option<String>,
  pub date:                      DateTime<Utc>,
  pub registration_deadline:     DateTime<Utc>,
  pub coordinator_email:         String,
  pub event_type:                EventType,
  pub is_team_event:             bool,
  pub min_participants_per_team: u32,
  pub max_participants_per_team: u32,
}

/// Read model for a single event page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDetail {
  #[serde(flatten)]
  pub event:            Event,
  /// Point-in-time count of registrations.
  pub registrant_count: u64,
}

// ─── Form ────────────────────────────────────────────────────────────────────

/// Raw event-creation input as submitted by a coordinator.
///
/// Every field is checked for presence and shape by [`EventForm::validate`]
/// before anything is composed from it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventForm {
  pub name:                      Option<String>,
  pub description:               Option<String>,
  pub location:                  Option<String>,
  /// `YYYY-MM-DD`.
  pub date:                      Option<String>,
  /// `HH:MM` or `HH:MM:SS`.
  pub time:                      Option<String>,
  #[serde(alias = "email")]
  pub coordinator_email:         Option<String>,
  pub event_type:                Option<String>,
  /// `YYYY-MM-DD`; defaults to the event date.
  pub registration_deadline:     Option<String>,
  pub min_participants_per_team: Option<u32>,
  pub max_participants_per_team: Option<u32>,
}

impl EventForm {
  pub fn validate(self) -> Result<NewEvent> {
    let name = required("name", self.name)?;
    let description = required("description", self.description)?;
    let coordinator_email = required("coordinator email", self.coordinator_email)?;
    let location = self.location.map(|l| l.trim().to_owned()).filter(|l| !l.is_empty());

    let day = parse_date("date", &required("date", self.date)?)?;
    let time = parse_time(&required("time", self.time)?)?;
    let date = day.and_time(time).and_utc();

    let deadline_day = match self.registration_deadline.filter(|d| !d.trim().is_empty()) {
      Some(d) => parse_date("registration deadline", &d)?,
      None => day,
    };
    if deadline_day > day {
      return Err(Error::Validation(format!(
        "registration deadline {deadline_day} is after the event date {day}"
      )));
    }
    let (hour, minute) = DEADLINE_HOUR_MINUTE;
    let registration_deadline = deadline_day
      .and_hms_opt(hour, minute, 0)
      .ok_or_else(|| Error::Validation("invalid deadline time".into()))?
      .and_utc();

    let event_type: EventType = required("event type", self.event_type)?.parse()?;
    let is_team_event = event_type == EventType::Team;

    let (min, max) = match (self.min_participants_per_team, self.max_participants_per_team) {
      (Some(min), Some(max)) => (min, max),
      (None, None) if !is_team_event => (1, 1),
      _ => {
        return Err(Error::Validation(
          "team size requires both a minimum and a maximum".into(),
        ));
      }
    };
    if is_team_event && min == 0 {
      return Err(Error::Validation("team events need at least one participant per team".into()));
    }
    if min > max {
      return Err(Error::Validation(format!(
        "minimum participants ({min}) exceeds maximum ({max})"
      )));
    }

    Ok(NewEvent {
      name,
      description,
      location,
      date,
      registration_deadline,
      coordinator_email,
      event_type,
      is_team_event,
      min_participants_per_team: min,
      max_participants_per_team: max,
    })
  }
}

fn required(field: &str, value: Option<String>) -> Result<String> {
  value
    .map(|v| v.trim().to_owned())
    .filter(|v| !v.is_empty())
    .ok_or_else(|| Error::Validation(format!("{field} is required")))
}

fn parse_date(field: &str, s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
    .map_err(|e| Error::Validation(format!("malformed {field} {s:?}: {e}")))
}

fn parse_time(s: &str) -> Result<NaiveTime> {
  let s = s.trim();
  NaiveTime::parse_from_str(s, "%H:%M")
    .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
    .map_err(|e| Error::Validation(format!("malformed time {s:?}: {e}")))
}
