//! Public event endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/events` | Optional `?coordinator=<email>` |
//! | `GET`  | `/coordinator/events` | Events owned by the caller |
//! | `GET`  | `/events/{id}` | Event with registrant count; 404 if missing |
//! | `GET`  | `/events/{id}/registrants` | Roster with profiles |
//! | `POST` | `/events/{id}/register` | Registers the caller |

use axum::{
  Json,
  extract::{Path, Query, State, rejection::PathRejection},
  http::StatusCode,
};
use muster_core::{
  Outcome,
  event::{Event, EventDetail},
  ledger::Ledger,
  registration::Registrant,
  registry::Registry,
  store::EventStore,
};
use serde::Deserialize;
use uuid::Uuid;

use super::{outcome_status, unreadable};
use crate::{AppState, error::ApiError, gate::Session};

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub coordinator: Option<String>,
}

/// `GET /events[?coordinator=<email>]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Event>>, ApiError>
where
  S: EventStore + Clone + Send + Sync + 'static,
{
  let registry = Registry::new(&*state.store, &*state.invalidator);
  let events = match params.coordinator {
    Some(email) => registry.list_events_by_coordinator(&email).await,
    None => registry.list_events().await,
  }
  .map_err(ApiError::store)?;
  Ok(Json(events))
}

/// `GET /coordinator/events`
pub async fn mine<S>(
  State(state): State<AppState<S>>,
  session: Session,
) -> Result<Json<Vec<Event>>, ApiError>
where
  S: EventStore + Clone + Send + Sync + 'static,
{
  let principal = session.require()?;
  let events = Registry::new(&*state.store, &*state.invalidator)
    .list_events_by_coordinator(&principal.email)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(events))
}

/// `GET /events/{id}`
pub async fn detail<S>(
  State(state): State<AppState<S>>,
  id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<EventDetail>, ApiError>
where
  S: EventStore + Clone + Send + Sync + 'static,
{
  let Path(id) = id?;
  let detail = Registry::new(&*state.store, &*state.invalidator)
    .event_detail(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("event {id} not found")))?;
  Ok(Json(detail))
}

/// `GET /events/{id}/registrants`
pub async fn registrants<S>(
  State(state): State<AppState<S>>,
  id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Vec<Registrant>>, ApiError>
where
  S: EventStore + Clone + Send + Sync + 'static,
{
  let Path(id) = id?;
  let roster = Registry::new(&*state.store, &*state.invalidator)
    .registrants(id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(roster))
}

/// `POST /events/{id}/register`: 201 + [`Outcome`] on success.
pub async fn register<S>(
  State(state): State<AppState<S>>,
  id: Result<Path<Uuid>, PathRejection>,
  session: Session,
) -> Result<(StatusCode, Json<Outcome>), ApiError>
where
  S: EventStore + Clone + Send + Sync + 'static,
{
  let principal = session.require()?;
  let Path(id) = match id {
    Ok(id) => id,
    Err(rejection) => return Ok(unreadable(rejection.body_text())),
  };
  let outcome = Ledger::new(&*state.store).register(id, principal.user_id).await;
  Ok((outcome_status(&outcome, StatusCode::CREATED), Json(outcome)))
}
