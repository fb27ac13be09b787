//! SQL schema for the Muster SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id     TEXT PRIMARY KEY,
    email       TEXT NOT NULL UNIQUE,
    name        TEXT,
    image       TEXT,
    role        TEXT NOT NULL DEFAULT 'PARTICIPANT'
                CHECK (role IN ('PARTICIPANT', 'ADMIN')),
    created_at  TEXT NOT NULL
);

-- Events are never updated or deleted.
CREATE TABLE IF NOT EXISTS events (
    event_id                  TEXT PRIMARY KEY,
    name                      TEXT NOT NULL,
    description               TEXT NOT NULL,
    location                  TEXT,
    date                      TEXT NOT NULL,   -- RFC 3339 UTC
    registration_deadline     TEXT NOT NULL,   -- RFC 3339 UTC
    coordinator_email         TEXT NOT NULL,   -- denormalised, not a reference
    event_type                TEXT NOT NULL CHECK (event_type IN ('SOLO', 'TEAM')),
    is_team_event             INTEGER NOT NULL,
    min_participants_per_team INTEGER NOT NULL,
    max_participants_per_team INTEGER NOT NULL,
    created_at                TEXT NOT NULL,
    CHECK (min_participants_per_team <= max_participants_per_team)
);

-- One row per (user, event); the UNIQUE constraint backs the ledger's
-- duplicate check under concurrent writers.
CREATE TABLE IF NOT EXISTS registrations (
    registration_id TEXT PRIMARY KEY,
    user_id         TEXT NOT NULL REFERENCES users(user_id),
    event_id        TEXT NOT NULL REFERENCES events(event_id),
    attended        INTEGER NOT NULL DEFAULT 0,
    created_at      TEXT NOT NULL,
    UNIQUE (user_id, event_id)
);

CREATE INDEX IF NOT EXISTS events_coordinator_idx   ON events(coordinator_email);
CREATE INDEX IF NOT EXISTS registrations_event_idx  ON registrations(event_id);

PRAGMA user_version = 1;
";
