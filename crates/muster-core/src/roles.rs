//! The Role Assignment Service.
//!
//! Callers must already have passed the access-control gate for the admin
//! area; this service trusts them.

use uuid::Uuid;

use crate::{
  invalidate::{ADMIN_USERS_VIEW, Invalidator},
  store::EventStore,
  user::{Role, User},
};

pub struct RoleAssignment<'a, S> {
  store:       &'a S,
  invalidator: &'a dyn Invalidator,
}

impl<'a, S: EventStore> RoleAssignment<'a, S> {
  pub fn new(store: &'a S, invalidator: &'a dyn Invalidator) -> Self {
    Self { store, invalidator }
  }

  /// Overwrite the role of `user_id`.
  ///
  /// Returns the updated user, or `None` if the user does not exist or the
  /// write failed; the cause is logged. Sessions already issued keep the role
  /// they were issued with.
  pub async fn set_role(&self, user_id: Uuid, role: Role) -> Option<User> {
    match self.store.set_role(user_id, role).await {
      Ok(user) => {
        tracing::info!(%user_id, role = role.as_str(), "role updated");
        self.invalidator.invalidate(ADMIN_USERS_VIEW);
        Some(user)
      }
      Err(e) => {
        tracing::error!(%user_id, role = role.as_str(), error = %e, "error updating user role");
        None
      }
    }
  }

  pub async fn make_admin(&self, user_id: Uuid) -> Option<User> {
    self.set_role(user_id, Role::Admin).await
  }

  pub async fn make_participant(&self, user_id: Uuid) -> Option<User> {
    self.set_role(user_id, Role::Participant).await
  }

  pub async fn list_users(&self) -> Result<Vec<User>, S::Error> { self.store.list_users().await }
}
