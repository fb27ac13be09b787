//! The Event Registry: event creation and event read models.

use uuid::Uuid;

use crate::{
  Outcome,
  event::{Event, EventDetail, EventForm},
  invalidate::{ADMIN_EVENTS_VIEW, Invalidator},
  ledger::rejection,
  registration::Registrant,
  store::EventStore,
};

pub struct Registry<'a, S> {
  store:       &'a S,
  invalidator: &'a dyn Invalidator,
}

impl<'a, S: EventStore> Registry<'a, S> {
  pub fn new(store: &'a S, invalidator: &'a dyn Invalidator) -> Self {
    Self { store, invalidator }
  }

  /// Validate `form` and persist it as a new event.
  ///
  /// Creation is all-or-nothing: a rejected form writes nothing. On success
  /// the admin event listing is invalidated and the outcome carries the new
  /// event id.
  pub async fn create_event(&self, form: EventForm) -> Outcome {
    let new_event = match form.validate() {
      Ok(e) => e,
      Err(e) => {
        tracing::warn!(error = %e, "event form rejected");
        return Outcome::failure(e.kind(), e.to_string());
      }
    };

    match self.store.create_event(new_event).await {
      Ok(event) => {
        tracing::info!(event_id = %event.id, coordinator = %event.coordinator_email, "event created");
        self.invalidator.invalidate(ADMIN_EVENTS_VIEW);
        Outcome::success("Event added successfully", event.id)
      }
      Err(e) => rejection(&e, "Failed to create event", |d| {
        tracing::warn!(error = %d, "event creation rejected");
      }),
    }
  }

  pub async fn list_events(&self) -> Result<Vec<Event>, S::Error> {
    self.store.list_events().await
  }

  /// Events owned by the coordinator with `email`, matched exactly.
  pub async fn list_events_by_coordinator(&self, email: &str) -> Result<Vec<Event>, S::Error> {
    self.store.list_events_by_coordinator(email).await
  }

  /// The event with its current registrant count, or `None` if it does not
  /// exist.
  pub async fn event_detail(&self, event_id: Uuid) -> Result<Option<EventDetail>, S::Error> {
    let Some(event) = self.store.get_event(event_id).await? else {
      return Ok(None);
    };
    let registrant_count = self.store.count_registrations(event_id).await?;
    Ok(Some(EventDetail { event, registrant_count }))
  }

  pub async fn registrants(&self, event_id: Uuid) -> Result<Vec<Registrant>, S::Error> {
    let registrants = self.store.list_registrants(event_id).await?;
    let mut seen = std::collections::HashSet::with_capacity(registrants.len());
    if registrants.iter().any(|r| !seen.insert(r.id)) {
      tracing::error!(%event_id, "duplicate registrations found on roster");
    }
    Ok(registrants)
  }
}
