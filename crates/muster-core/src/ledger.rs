//! The Registration Ledger: admission rules and the `register` operation.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  Error, ErrorKind, Outcome, Result,
  event::Event,
  store::{EventStore, StoreError},
};

/// Decide whether one more registration may be admitted to `event` at `now`,
/// given `registered` existing registrations.
///
/// Registration is open up to and including the deadline instant. Bounded
/// events admit at most [`Event::capacity`] registrations. Uniqueness of the
/// `(user, event)` pair is not checked here; the store enforces it.
pub fn admit(event: &Event, now: DateTime<Utc>, registered: u64) -> Result<()> {
  if now > event.registration_deadline {
    return Err(Error::DeadlineExceeded {
      event_id: event.id,
      deadline: event.registration_deadline,
    });
  }
  if let Some(capacity) = event.capacity()
    && registered >= u64::from(capacity)
  {
    return Err(Error::CapacityExceeded { event_id: event.id, capacity });
  }
  Ok(())
}

/// Front-end for registration writes and roster reads.
pub struct Ledger<'a, S> {
  store: &'a S,
}

impl<'a, S: EventStore> Ledger<'a, S> {
  pub fn new(store: &'a S) -> Self { Self { store } }

  /// Register `user_id` for `event_id` now.
  pub async fn register(&self, event_id: Uuid, user_id: Uuid) -> Outcome {
    self.register_at(event_id, user_id, Utc::now()).await
  }

  /// Register `user_id` for `event_id` as of `now`. Never fails; rejections
  /// are reported in the returned [`Outcome`].
  pub async fn register_at(&self, event_id: Uuid, user_id: Uuid, now: DateTime<Utc>) -> Outcome {
    match self.store.admit_registration(event_id, user_id, now).await {
      Ok(registration) => {
        tracing::info!(%event_id, %user_id, registration_id = %registration.id, "registered");
        Outcome::success("Registered successfully", registration.id)
      }
      Err(e) => rejection(&e, "registration failed", |d| {
        tracing::warn!(%event_id, %user_id, error = %d, "registration rejected");
      }),
    }
  }

  /// Point-in-time count of registrations for `event_id`.
  pub async fn registrant_count(&self, event_id: Uuid) -> Result<u64, S::Error> {
    self.store.count_registrations(event_id).await
  }
}

/// Convert a store error into a failed [`Outcome`]: domain rejections keep
/// their message and kind, storage faults are logged and reported generically.
pub(crate) fn rejection<E: StoreError>(
  err: &E,
  fault_message: &str,
  on_domain: impl FnOnce(&Error),
) -> Outcome {
  match err.domain() {
    Some(d) => {
      on_domain(d);
      Outcome::failure(d.kind(), d.to_string())
    }
    None => {
      tracing::error!(error = %err, "{fault_message}");
      Outcome::failure(ErrorKind::Store, fault_message.to_owned())
    }
  }
}
