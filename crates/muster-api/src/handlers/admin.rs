//! Admin-area endpoints. Reachable only by callers whose session carries the
//! admin role; the gate redirects everyone else before these run.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/admin/events` | All events |
//! | `POST` | `/admin/events` | Body: [`EventForm`]; 201 + [`Outcome`] |
//! | `GET`  | `/admin/users` | All users |
//! | `PUT`  | `/admin/users/{id}/role` | Body: `{"role":"ADMIN"}`; replies user or `null` |
//!
//! Undecodable bodies and ids never fall through to axum's plain-text
//! rejections: event creation answers a failed [`Outcome`], role changes
//! answer `null`.

use axum::{
  Json,
  extract::{
    Path, State,
    rejection::{JsonRejection, PathRejection},
  },
  http::StatusCode,
};
use muster_core::{
  Outcome,
  event::{Event, EventForm},
  registry::Registry,
  roles::RoleAssignment,
  store::EventStore,
  user::{Role, User},
};
use serde::Deserialize;
use uuid::Uuid;

use super::{outcome_status, unreadable};
use crate::{AppState, error::ApiError};

/// `GET /admin/events`
pub async fn list_events<S>(State(state): State<AppState<S>>) -> Result<Json<Vec<Event>>, ApiError>
where
  S: EventStore + Clone + Send + Sync + 'static,
{
  let events = Registry::new(&*state.store, &*state.invalidator)
    .list_events()
    .await
    .map_err(ApiError::store)?;
  Ok(Json(events))
}

/// `POST /admin/events`
pub async fn create_event<S>(
  State(state): State<AppState<S>>,
  form: Result<Json<EventForm>, JsonRejection>,
) -> (StatusCode, Json<Outcome>)
where
  S: EventStore + Clone + Send + Sync + 'static,
{
  let Json(form) = match form {
    Ok(form) => form,
    Err(rejection) => return unreadable(rejection.body_text()),
  };
  let outcome = Registry::new(&*state.store, &*state.invalidator)
    .create_event(form)
    .await;
  (outcome_status(&outcome, StatusCode::CREATED), Json(outcome))
}

/// `GET /admin/users`
pub async fn list_users<S>(State(state): State<AppState<S>>) -> Result<Json<Vec<User>>, ApiError>
where
  S: EventStore + Clone + Send + Sync + 'static,
{
  let users = RoleAssignment::new(&*state.store, &*state.invalidator)
    .list_users()
    .await
    .map_err(ApiError::store)?;
  Ok(Json(users))
}

#[derive(Debug, Deserialize)]
pub struct SetRoleBody {
  pub role: Role,
}

/// `PUT /admin/users/{id}/role`
pub async fn set_role<S>(
  State(state): State<AppState<S>>,
  id: Result<Path<Uuid>, PathRejection>,
  body: Result<Json<SetRoleBody>, JsonRejection>,
) -> (StatusCode, Json<Option<User>>)
where
  S: EventStore + Clone + Send + Sync + 'static,
{
  let (id, role) = match (id, body) {
    (Ok(Path(id)), Ok(Json(body))) => (id, body.role),
    (Err(rejection), _) => {
      tracing::warn!(error = %rejection.body_text(), "set_role: bad user id");
      return (StatusCode::BAD_REQUEST, Json(None));
    }
    (_, Err(rejection)) => {
      tracing::warn!(error = %rejection.body_text(), "set_role: bad body");
      return (StatusCode::BAD_REQUEST, Json(None));
    }
  };
  let updated = RoleAssignment::new(&*state.store, &*state.invalidator)
    .set_role(id, role)
    .await;
  (StatusCode::OK, Json(updated))
}
