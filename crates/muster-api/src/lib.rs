//! HTTP surface for Muster.
//!
//! Exposes an axum [`Router`] backed by any [`EventStore`]. Every request
//! passes through the [`gate::gate`] middleware, which resolves the session
//! token and hides the admin area from non-admins. TLS and transport are the
//! caller's responsibility.

pub mod error;
pub mod gate;
pub mod handlers;
pub mod session;

use std::sync::Arc;

use axum::{
  Router,
  http::StatusCode,
  middleware,
  response::IntoResponse,
  routing::{get, post, put},
};
use muster_core::{invalidate::Invalidator, store::EventStore};
use tower_http::trace::TraceLayer;

pub use error::ApiError;
pub use session::SessionKey;

use handlers::{admin, events};

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: EventStore> {
  pub store:       Arc<S>,
  pub sessions:    Arc<SessionKey>,
  pub invalidator: Arc<dyn Invalidator>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router for `state`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: EventStore + Clone + Send + Sync + 'static,
{
  Router::new()
    // Events
    .route("/events", get(events::list::<S>))
    .route("/events/{id}", get(events::detail::<S>))
    .route("/events/{id}/registrants", get(events::registrants::<S>))
    .route("/events/{id}/register", post(events::register::<S>))
    .route("/coordinator/events", get(events::mine::<S>))
    // Admin area
    .route("/admin/events", get(admin::list_events::<S>).post(admin::create_event::<S>))
    .route("/admin/users", get(admin::list_users::<S>))
    .route("/admin/users/{id}/role", put(admin::set_role::<S>))
    .route("/404", get(not_found))
    .fallback(not_found)
    .layer(middleware::from_fn_with_state(state.clone(), gate::gate::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

async fn not_found() -> impl IntoResponse { (StatusCode::NOT_FOUND, "Not Found") }

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, header},
  };
  use chrono::{Duration, Utc};
  use muster_core::{
    ErrorKind, Outcome,
    event::EventDetail,
    invalidate::TracingInvalidator,
    roles::RoleAssignment,
    user::{Principal, Role, SignIn, User},
  };
  use muster_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;
  use uuid::Uuid;

  async fn make_state() -> AppState<SqliteStore> {
    AppState {
      store:       Arc::new(SqliteStore::open_in_memory().await.unwrap()),
      sessions:    Arc::new(SessionKey::new(&[42u8; 32]).unwrap()),
      invalidator: Arc::new(TracingInvalidator),
    }
  }

  async fn signed_in(state: &AppState<SqliteStore>, email: &str) -> User {
    state.store.sign_in(SignIn::email(email)).await.unwrap()
  }

  fn token(state: &AppState<SqliteStore>, principal: &Principal) -> String {
    state.sessions.issue(principal, Duration::hours(1)).unwrap()
  }

  async fn send(
    state: &AppState<SqliteStore>,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
  ) -> axum::response::Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
      builder = builder.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    let body = match body {
      Some(v) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(v.to_string())
      }
      None => Body::empty(),
    };
    router(state.clone()).oneshot(builder.body(body).unwrap()).await.unwrap()
  }

  async fn json_body<T: serde::de::DeserializeOwned>(resp: axum::response::Response) -> T {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  fn upcoming_event() -> Value {
    let day = (Utc::now() + Duration::days(30)).format("%Y-%m-%d").to_string();
    json!({
      "name": "Hack Day",
      "description": "A day of hacking",
      "date": day,
      "time": "09:00",
      "coordinator_email": "coord@example.com",
      "event_type": "TEAM",
      "min_participants_per_team": 1,
      "max_participants_per_team": 2
    })
  }

  fn assert_hidden(resp: &axum::response::Response) {
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/404");
  }

  // ── Gate ────────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn anonymous_admin_request_redirects_to_404() {
    let state = make_state().await;
    assert_hidden(&send(&state, "GET", "/admin/users", None, None).await);
    assert_hidden(&send(&state, "POST", "/admin/events", None, Some(upcoming_event())).await);
    assert!(state.store.list_events().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn participant_admin_request_redirects_to_404() {
    let state = make_state().await;
    let user = signed_in(&state, "p@example.com").await;
    let t = token(&state, &user.principal());
    assert_hidden(&send(&state, "GET", "/admin/users", Some(&t), None).await);
    assert_hidden(&send(&state, "GET", "/admin", Some(&t), None).await);
  }

  #[tokio::test]
  async fn forged_token_is_treated_as_anonymous() {
    let state = make_state().await;
    let resp = send(&state, "GET", "/admin/users", Some("garbage.token"), None).await;
    assert_hidden(&resp);

    let resp = send(&state, "GET", "/events", Some("garbage.token"), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn admin_reaches_admin_area() {
    let state = make_state().await;
    let admin = signed_in(&state, "admin@example.com").await;
    let admin = state.store.set_role(admin.id, Role::Admin).await.unwrap();
    let t = token(&state, &admin.principal());

    let resp = send(&state, "GET", "/admin/users", Some(&t), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let users: Vec<User> = json_body(resp).await;
    assert_eq!(users.len(), 1);
  }

  #[tokio::test]
  async fn role_change_applies_to_next_token_only() {
    let state = make_state().await;
    let u2 = signed_in(&state, "u2@example.com").await;
    let old_token = token(&state, &u2.principal());

    let promoted = RoleAssignment::new(&*state.store, &TracingInvalidator)
      .make_admin(u2.id)
      .await
      .unwrap();

    assert_hidden(&send(&state, "GET", "/admin/users", Some(&old_token), None).await);

    let new_token = token(&state, &promoted.principal());
    let resp = send(&state, "GET", "/admin/users", Some(&new_token), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
  }

  // ── Events and registration ─────────────────────────────────────────────────

  #[tokio::test]
  async fn create_register_and_inspect_event() {
    let state = make_state().await;
    let admin = signed_in(&state, "admin@example.com").await;
    let admin = state.store.set_role(admin.id, Role::Admin).await.unwrap();
    let admin_token = token(&state, &admin.principal());

    let resp = send(&state, "POST", "/admin/events", Some(&admin_token), Some(upcoming_event())).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Outcome = json_body(resp).await;
    assert!(created.success);
    let event_id = created.id.unwrap();

    let participant = signed_in(&state, "p@example.com").await;
    let t = token(&state, &participant.principal());
    let uri = format!("/events/{event_id}/register");

    let resp = send(&state, "POST", &uri, Some(&t), None).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = send(&state, "POST", &uri, Some(&t), None).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let dup: Outcome = json_body(resp).await;
    assert!(!dup.success);

    let resp = send(&state, "GET", &format!("/events/{event_id}"), None, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let detail: EventDetail = json_body(resp).await;
    assert_eq!(detail.registrant_count, 1);

    let resp = send(&state, "GET", &format!("/events/{event_id}/registrants"), None, None).await;
    let roster: Vec<Value> = json_body(resp).await;
    assert_eq!(roster.len(), 1);
    assert_eq!(roster[0]["email"], "p@example.com");

    let resp = send(&state, "GET", "/events?coordinator=coord@example.com", None, None).await;
    let events: Vec<Value> = json_body(resp).await;
    assert_eq!(events.len(), 1);
  }

  #[tokio::test]
  async fn invalid_event_form_is_bad_request() {
    let state = make_state().await;
    let admin = signed_in(&state, "admin@example.com").await;
    let admin = state.store.set_role(admin.id, Role::Admin).await.unwrap();
    let t = token(&state, &admin.principal());

    let mut form = upcoming_event();
    form["name"] = json!("");
    let resp = send(&state, "POST", "/admin/events", Some(&t), Some(form)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let outcome: Outcome = json_body(resp).await;
    assert!(!outcome.success);
  }

  #[tokio::test]
  async fn mistyped_event_field_answers_failed_outcome() {
    let state = make_state().await;
    let admin = signed_in(&state, "admin@example.com").await;
    let admin = state.store.set_role(admin.id, Role::Admin).await.unwrap();
    let t = token(&state, &admin.principal());

    let mut form = upcoming_event();
    form["min_participants_per_team"] = json!("two");
    let resp = send(&state, "POST", "/admin/events", Some(&t), Some(form)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let outcome: Outcome = json_body(resp).await;
    assert!(!outcome.success);
    assert_eq!(outcome.error, Some(ErrorKind::Validation));
    assert!(state.store.list_events().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn undecodable_role_change_answers_null() {
    let state = make_state().await;
    let admin = signed_in(&state, "admin@example.com").await;
    let admin = state.store.set_role(admin.id, Role::Admin).await.unwrap();
    let t = token(&state, &admin.principal());
    let target = signed_in(&state, "u2@example.com").await;

    let uri = format!("/admin/users/{}/role", target.id);
    let resp = send(&state, "PUT", &uri, Some(&t), Some(json!({ "role": "ROOT" }))).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let updated: Option<User> = json_body(resp).await;
    assert!(updated.is_none());

    let resp = send(
      &state,
      "PUT",
      "/admin/users/not-a-uuid/role",
      Some(&t),
      Some(json!({ "role": "ADMIN" })),
    )
    .await;
    let updated: Option<User> = json_body(resp).await;
    assert!(updated.is_none());

    let target = state.store.get_user(target.id).await.unwrap().unwrap();
    assert_eq!(target.role, Role::Participant);
  }

  #[tokio::test]
  async fn malformed_event_id_answers_failed_outcome() {
    let state = make_state().await;
    let user = signed_in(&state, "p@example.com").await;
    let t = token(&state, &user.principal());

    let resp = send(&state, "POST", "/events/not-a-uuid/register", Some(&t), None).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let outcome: Outcome = json_body(resp).await;
    assert!(!outcome.success);
    assert_eq!(outcome.error, Some(ErrorKind::Validation));

    let resp = send(&state, "GET", "/events/not-a-uuid", None, None).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = json_body(resp).await;
    assert!(body["error"].is_string());
  }

  #[tokio::test]
  async fn register_requires_session() {
    let state = make_state().await;
    let resp = send(&state, "POST", &format!("/events/{}/register", Uuid::new_v4()), None, None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn unknown_event_is_404() {
    let state = make_state().await;
    let resp = send(&state, "GET", &format!("/events/{}", Uuid::new_v4()), None, None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn coordinator_sees_own_events() {
    let state = make_state().await;
    let admin = signed_in(&state, "coord@example.com").await;
    let admin = state.store.set_role(admin.id, Role::Admin).await.unwrap();
    let t = token(&state, &admin.principal());
    send(&state, "POST", "/admin/events", Some(&t), Some(upcoming_event())).await;

    let resp = send(&state, "GET", "/coordinator/events", Some(&t), None).await;
    let mine: Vec<Value> = json_body(resp).await;
    assert_eq!(mine.len(), 1);

    let resp = send(&state, "GET", "/coordinator/events", None, None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn set_role_endpoint_returns_user_or_null() {
    let state = make_state().await;
    let admin = signed_in(&state, "admin@example.com").await;
    let admin = state.store.set_role(admin.id, Role::Admin).await.unwrap();
    let t = token(&state, &admin.principal());
    let target = signed_in(&state, "u2@example.com").await;

    let resp = send(
      &state,
      "PUT",
      &format!("/admin/users/{}/role", target.id),
      Some(&t),
      Some(json!({ "role": "ADMIN" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Option<User> = json_body(resp).await;
    assert_eq!(updated.unwrap().role, Role::Admin);

    let resp = send(
      &state,
      "PUT",
      &format!("/admin/users/{}/role", Uuid::new_v4()),
      Some(&t),
      Some(json!({ "role": "PARTICIPANT" })),
    )
    .await;
    let missing: Option<User> = json_body(resp).await;
    assert!(missing.is_none());
  }

  #[tokio::test]
  async fn not_found_route_is_plain_404() {
    let state = make_state().await;
    let resp = send(&state, "GET", "/404", None, None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let resp = send(&state, "GET", "/no/such/page", None, None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }
}
