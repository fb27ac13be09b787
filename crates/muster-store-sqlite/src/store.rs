//! [`SqliteStore`]: the SQLite implementation of [`EventStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use muster_core::{
  event::{Event, NewEvent},
  ledger,
  registration::{Registrant, Registration},
  store::EventStore,
  user::{Role, SignIn, User},
};
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    RawEvent, RawRegistrant, RawUser, encode_dt, encode_event_type, encode_role, encode_uuid,
  },
  schema::SCHEMA,
};

const USER_COLUMNS: &str = "user_id, email, name, image, role, created_at";

const EVENT_COLUMNS: &str = "event_id, name, description, location, date, \
   registration_deadline, coordinator_email, event_type, is_team_event, \
   min_participants_per_team, max_participants_per_team, created_at";

fn user_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawUser> {
  Ok(RawUser {
    user_id:    row.get(0)?,
    email:      row.get(1)?,
    name:       row.get(2)?,
    image:      row.get(3)?,
    role:       row.get(4)?,
    created_at: row.get(5)?,
  })
}

fn event_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawEvent> {
  Ok(RawEvent {
    event_id:                  row.get(0)?,
    name:                      row.get(1)?,
    description:               row.get(2)?,
    location:                  row.get(3)?,
    date:                      row.get(4)?,
    registration_deadline:     row.get(5)?,
    coordinator_email:         row.get(6)?,
    event_type:                row.get(7)?,
    is_team_event:             row.get(8)?,
    min_participants_per_team: row.get(9)?,
    max_participants_per_team: row.get(10)?,
    created_at:                row.get(11)?,
  })
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(f, _)
      if f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
  )
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Muster store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. All calls are
/// executed in order on the connection's own thread.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    tracing::debug!(?path, "opening sqlite store");
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn query_events(
    &self,
    filter: &'static str,
    param: Option<String>,
  ) -> Result<Vec<Event>> {
    let raws: Vec<RawEvent> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events {filter} ORDER BY date");
        let mut stmt = conn.prepare(&sql)?;
        let rows = match param {
          Some(p) => stmt.query_map(rusqlite::params![p], event_row)?,
          None => stmt.query_map([], event_row)?,
        };
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
      })
      .await?;

    raws.into_iter().map(RawEvent::into_event).collect()
  }
}

// ─── EventStore impl ─────────────────────────────────────────────────────────

impl EventStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn sign_in(&self, profile: SignIn) -> Result<User> {
    let id_str   = encode_uuid(Uuid::new_v4());
    let at_str   = encode_dt(Utc::now());
    let role_str = encode_role(Role::default());
    let SignIn { email, name, image } = profile;

    let raw: RawUser = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (user_id, email, name, image, role, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)
           ON CONFLICT (email) DO UPDATE SET
             name  = COALESCE(excluded.name,  users.name),
             image = COALESCE(excluded.image, users.image)",
          rusqlite::params![id_str, email, name, image, role_str, at_str],
        )?;
        Ok(conn.query_row(
          &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
          rusqlite::params![email],
          user_row,
        )?)
      })
      .await?;

    raw.into_user()
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
            rusqlite::params![id_str],
            user_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
    let email = email.to_owned();

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
            rusqlite::params![email],
            user_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn list_users(&self) -> Result<Vec<User>> {
    let raws: Vec<RawUser> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at"))?;
        let rows = stmt
          .query_map([], user_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawUser::into_user).collect()
  }

  async fn set_role(&self, id: Uuid, role: Role) -> Result<User> {
    let id_str   = encode_uuid(id);
    let role_str = encode_role(role);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE users SET role = ?2 WHERE user_id = ?1",
          rusqlite::params![id_str, role_str],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(Some(conn.query_row(
          &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
          rusqlite::params![id_str],
          user_row,
        )?))
      })
      .await?;

    raw
      .ok_or(muster_core::Error::UserNotFound(id))?
      .into_user()
  }

  // ── Events ────────────────────────────────────────────────────────────────

  async fn create_event(&self, new: NewEvent) -> Result<Event> {
    let event = Event {
      id:                        Uuid::new_v4(),
      name:                      new.name,
      description:               new.description,
      location:                  new.location,
      date:                      new.date,
      registration_deadline:     new.registration_deadline,
      coordinator_email:         new.coordinator_email,
      event_type:                new.event_type,
      is_team_event:             new.is_team_event,
      min_participants_per_team: new.min_participants_per_team,
      max_participants_per_team: new.max_participants_per_team,
      created_at:                Utc::now(),
    };

    let id_str       = encode_uuid(event.id);
    let name         = event.name.clone();
    let description  = event.description.clone();
    let location     = event.location.clone();
    let date_str     = encode_dt(event.date);
    let deadline_str = encode_dt(event.registration_deadline);
    let coordinator  = event.coordinator_email.clone();
    let type_str     = encode_event_type(event.event_type);
    let is_team      = event.is_team_event;
    let min          = event.min_participants_per_team;
    let max          = event.max_participants_per_team;
    let at_str       = encode_dt(event.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO events ({EVENT_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
          ),
          rusqlite::params![
            id_str,
            name,
            description,
            location,
            date_str,
            deadline_str,
            coordinator,
            type_str,
            is_team,
            min,
            max,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(event)
  }

  async fn get_event(&self, id: Uuid) -> Result<Option<Event>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawEvent> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {EVENT_COLUMNS} FROM events WHERE event_id = ?1"),
            rusqlite::params![id_str],
            event_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawEvent::into_event).transpose()
  }

  async fn list_events(&self) -> Result<Vec<Event>> { self.query_events("", None).await }

  async fn list_events_by_coordinator(&self, email: &str) -> Result<Vec<Event>> {
    self
      .query_events("WHERE coordinator_email = ?1", Some(email.to_owned()))
      .await
  }

  // ── Registrations ─────────────────────────────────────────────────────────

  async fn count_registrations(&self, event_id: Uuid) -> Result<u64> {
    let id_str = encode_uuid(event_id);

    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM registrations WHERE event_id = ?1",
          rusqlite::params![id_str],
          |r| r.get(0),
        )?)
      })
      .await?;

    Ok(u64::try_from(count).unwrap_or_default())
  }

  async fn list_registrants(&self, event_id: Uuid) -> Result<Vec<Registrant>> {
    let id_str = encode_uuid(event_id);

    let raws: Vec<RawRegistrant> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT u.user_id, u.name, u.email, u.image
           FROM registrations r
           JOIN users u ON u.user_id = r.user_id
           WHERE r.event_id = ?1
           ORDER BY r.created_at",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok(RawRegistrant {
              user_id: row.get(0)?,
              name:    row.get(1)?,
              email:   row.get(2)?,
              image:   row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRegistrant::into_registrant).collect()
  }

  async fn admit_registration(
    &self,
    event_id: Uuid,
    user_id:  Uuid,
    now:      DateTime<Utc>,
  ) -> Result<Registration> {
    let registration = Registration {
      id: Uuid::new_v4(),
      user_id,
      event_id,
      attended: false,
      created_at: now,
    };

    let reg_id_str   = encode_uuid(registration.id);
    let event_id_str = encode_uuid(event_id);
    let user_id_str  = encode_uuid(user_id);
    let at_str       = encode_dt(now);

    // Every check and the insert share one IMMEDIATE transaction, so the
    // write lock is held from the first read. An early return drops `tx`,
    // which rolls it back.
    let admitted: std::result::Result<(), muster_core::Error> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let raw_event = tx
          .query_row(
            &format!("SELECT {EVENT_COLUMNS} FROM events WHERE event_id = ?1"),
            rusqlite::params![event_id_str],
            event_row,
          )
          .optional()?;
        let Some(raw_event) = raw_event else {
          return Ok(Err(muster_core::Error::EventNotFound(event_id)));
        };
        let event = raw_event
          .into_event()
          .map_err(|e| tokio_rusqlite::Error::Other(Box::new(e)))?;

        let user_exists = tx
          .query_row(
            "SELECT 1 FROM users WHERE user_id = ?1",
            rusqlite::params![user_id_str],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if !user_exists {
          return Ok(Err(muster_core::Error::UserNotFound(user_id)));
        }

        let already = tx
          .query_row(
            "SELECT 1 FROM registrations WHERE user_id = ?1 AND event_id = ?2",
            rusqlite::params![user_id_str, event_id_str],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if already {
          return Ok(Err(muster_core::Error::AlreadyRegistered { user_id, event_id }));
        }

        let registered: i64 = tx.query_row(
          "SELECT COUNT(*) FROM registrations WHERE event_id = ?1",
          rusqlite::params![event_id_str],
          |r| r.get(0),
        )?;
        if let Err(e) = ledger::admit(&event, now, u64::try_from(registered).unwrap_or_default()) {
          return Ok(Err(e));
        }

        let inserted = tx.execute(
          "INSERT INTO registrations (registration_id, user_id, event_id, attended, created_at)
           VALUES (?1, ?2, ?3, 0, ?4)",
          rusqlite::params![reg_id_str, user_id_str, event_id_str, at_str],
        );
        match inserted {
          Ok(_) => {}
          Err(e) if is_unique_violation(&e) => {
            return Ok(Err(muster_core::Error::AlreadyRegistered { user_id, event_id }));
          }
          Err(e) => return Err(e.into()),
        }

        tx.commit()?;
        Ok(Ok(()))
      })
      .await?;

    admitted?;
    Ok(registration)
  }
}
