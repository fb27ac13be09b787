//! The `EventStore` trait, the persistent-store boundary.
//!
//! The trait is implemented by storage backends (e.g. `muster-store-sqlite`).
//! The services in this crate and the HTTP layer depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  event::{Event, NewEvent},
  registration::{Registrant, Registration},
  user::{Role, SignIn, User},
};

/// Error type of a store backend.
///
/// Backends surface domain rejections (duplicate registration, unknown event,
/// closed registration, ...) as a wrapped [`crate::Error`] so callers can tell
/// them apart from storage faults.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  /// The domain error carried by this error, or `None` for a storage fault.
  fn domain(&self) -> Option<&crate::Error>;
}

/// Abstraction over a Muster store backend.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait EventStore: Send + Sync {
  type Error: StoreError;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Return the user with `profile.email`, creating it with
  /// [`Role::Participant`] on first sign-in. An existing user's role is left
  /// untouched; supplied name and image replace the stored ones.
  fn sign_in(
    &self,
    profile: SignIn,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Retrieve a user by id. Returns `None` if not found.
  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Retrieve a user by email. Returns `None` if not found.
  fn find_user_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  fn list_users(&self) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + '_;

  /// Overwrite a user's role. Fails with
  /// [`crate::Error::UserNotFound`] if the user does not exist.
  fn set_role(
    &self,
    id: Uuid,
    role: Role,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  // ── Events ────────────────────────────────────────────────────────────

  /// Persist a validated event. The store assigns `id` and `created_at`.
  fn create_event(
    &self,
    event: NewEvent,
  ) -> impl Future<Output = Result<Event, Self::Error>> + Send + '_;

  fn get_event(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Event>, Self::Error>> + Send + '_;

  fn list_events(&self) -> impl Future<Output = Result<Vec<Event>, Self::Error>> + Send + '_;

  /// Events whose coordinator email equals `email` exactly. Unordered.
  fn list_events_by_coordinator<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Vec<Event>, Self::Error>> + Send + 'a;

  // ── Registrations ─────────────────────────────────────────────────────

  fn count_registrations(
    &self,
    event_id: Uuid,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Profiles of every user registered for `event_id`.
  fn list_registrants(
    &self,
    event_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Registrant>, Self::Error>> + Send + '_;

  /// Atomically admit `user_id` to `event_id` as of `now`.
  ///
  /// The existence checks, [`crate::ledger::admit`] and the insert must form
  /// one unit: two concurrent calls for the same pair can never both succeed,
  /// and concurrent calls for different users cannot overfill a bounded
  /// event.
  fn admit_registration(
    &self,
    event_id: Uuid,
    user_id: Uuid,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Registration, Self::Error>> + Send + '_;
}
