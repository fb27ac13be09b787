//! The cache-invalidation boundary.
//!
//! Rendered listings are cached outside this crate. After a successful
//! mutation the services ask for the affected view to be refreshed. The call
//! is fire-and-forget: it cannot fail the mutation that triggered it.

/// View key of the admin event listing.
pub const ADMIN_EVENTS_VIEW: &str = "/admin/events";

/// View key of the admin user listing.
pub const ADMIN_USERS_VIEW: &str = "/admin/users";

pub trait Invalidator: Send + Sync {
  fn invalidate(&self, view: &str);
}

/// Default hook for deployments without an external page cache: records the
/// request in the trace log and does nothing else.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingInvalidator;

impl Invalidator for TracingInvalidator {
  fn invalidate(&self, view: &str) {
    tracing::debug!(view, "invalidating cached view");
  }
}
