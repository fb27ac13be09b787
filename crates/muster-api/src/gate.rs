//! Gate middleware: resolves the caller's session and applies
//! [`muster_core::gate::authorize`] before any handler runs.

use axum::{
  extract::{FromRequestParts, Request, State},
  http::request::Parts,
  middleware::Next,
  response::{IntoResponse, Redirect, Response},
};
use muster_core::{
  gate::{Decision, authorize},
  store::EventStore,
  user::Principal,
};

use crate::{AppState, error::ApiError};

/// The principal resolved for this request, if any. Inserted by [`gate`].
#[derive(Debug, Clone, Default)]
pub struct Session(pub Option<Principal>);

impl Session {
  /// The principal, or `401` for anonymous callers.
  pub fn require(self) -> Result<Principal, ApiError> { self.0.ok_or(ApiError::Unauthorized) }
}

impl<St: Send + Sync> FromRequestParts<St> for Session {
  type Rejection = std::convert::Infallible;

  async fn from_request_parts(parts: &mut Parts, _state: &St) -> Result<Self, Self::Rejection> {
    Ok(parts.extensions.get::<Session>().cloned().unwrap_or_default())
  }
}

pub async fn gate<S>(State(state): State<AppState<S>>, mut req: Request, next: Next) -> Response
where
  S: EventStore + Clone + Send + Sync + 'static,
{
  let principal = state.sessions.resolve(req.headers());

  match authorize(req.uri().path(), principal.as_ref()) {
    Decision::Allow => {
      req.extensions_mut().insert(Session(principal));
      next.run(req).await
    }
    Decision::Redirect(target) => {
      tracing::info!(path = req.uri().path(), "admin area hidden from caller");
      Redirect::temporary(target).into_response()
    }
  }
}
