//! The access-control decision applied to every inbound request.

use crate::user::Principal;

/// Path prefix reserved for administrators.
pub const ADMIN_PREFIX: &str = "/admin";

/// Where denied callers are sent.
pub const NOT_FOUND_ROUTE: &str = "/404";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
  Allow,
  Redirect(&'static str),
}

/// Decide whether `principal` may reach `path`.
///
/// `path` is expected to be normalised (leading slash, no query string). The
/// prefix match is a plain string prefix, so `/administrators` is guarded too.
pub fn authorize(path: &str, principal: Option<&Principal>) -> Decision {
  let is_admin = principal.is_some_and(Principal::is_admin);
  if path.starts_with(ADMIN_PREFIX) && !is_admin {
    Decision::Redirect(NOT_FOUND_ROUTE)
  } else {
    Decision::Allow
  }
}
