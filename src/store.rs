// 🗄️ Store - External mirror of creations and deletions
//
// The registry calls the store BEFORE changing its own catalog, so a store
// failure leaves the registry untouched. Two implementations:
// - NullStore: accepts everything (tests, pure in-memory use)
// - SqliteStore: SQLite tables + append-only audit trail

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Capability the registry needs from the outside data store
pub trait Store: fmt::Debug {
    fn add_competition(
        &mut self,
        name: &str,
        closing_date: Option<NaiveDate>,
        team_only: bool,
    ) -> Result<()>;

    fn add_individual(&mut self, name: &str, first_name: &str, email: &str) -> Result<()>;

    fn add_team(&mut self, name: &str) -> Result<()>;

    fn remove_competition(&mut self, name: &str) -> Result<()>;

    fn remove_candidate(&mut self, name: &str) -> Result<()>;
}

// ============================================================================
// NULL STORE
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct NullStore;

impl Store for NullStore {
    fn add_competition(&mut self, _: &str, _: Option<NaiveDate>, _: bool) -> Result<()> {
        Ok(())
    }

    fn add_individual(&mut self, _: &str, _: &str, _: &str) -> Result<()> {
        Ok(())
    }

    fn add_team(&mut self, _: &str) -> Result<()> {
        Ok(())
    }

    fn remove_competition(&mut self, _: &str) -> Result<()> {
        Ok(())
    }

    fn remove_candidate(&mut self, _: &str) -> Result<()> {
        Ok(())
    }
}

// ============================================================================
// AUDIT EVENTS
// ============================================================================

/// Event for audit trail: every mirrored change is recorded
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Event {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub entity_type: String,
    pub entity_id: String,
    pub data: serde_json::Value,
    pub actor: String,
}

impl Event {
    pub fn new(
        event_type: &str,
        entity_type: &str,
        entity_id: &str,
        data: serde_json::Value,
        actor: &str,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type: event_type.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            data,
            actor: actor.to_string(),
        }
    }
}

// ============================================================================
// SQLITE STORE
// ============================================================================

const ACTOR: &str = "registry";

#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open store at {}", path.display()))?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    pub fn from_connection(conn: Connection) -> Result<Self> {
        setup_database(&conn)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn competition_count(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM competitions", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn candidate_count(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM candidates", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Audit trail of one entity, newest first
    pub fn events_for(&self, entity_type: &str, entity_id: &str) -> Result<Vec<Event>> {
        get_events_for_entity(&self.conn, entity_type, entity_id)
    }

    /// Apply one row change and its audit event atomically
    fn apply<F>(&mut self, change: F, event: Event) -> Result<()>
    where
        F: FnOnce(&Connection) -> Result<()>,
    {
        let tx = self.conn.transaction()?;
        change(&tx)?;
        insert_event(&tx, &event)?;
        tx.commit()?;
        Ok(())
    }
}

// Inserts are upserts: the registry rejects duplicate names before calling
// the store, so a row that already exists is a leftover from a session whose
// snapshot was never saved. Overwriting it keeps both sides usable.
impl Store for SqliteStore {
    fn add_competition(
        &mut self,
        name: &str,
        closing_date: Option<NaiveDate>,
        team_only: bool,
    ) -> Result<()> {
        let closing_date_str = closing_date.map(|d| d.to_string());
        let event = Event::new(
            "competition_added",
            "competition",
            name,
            serde_json::json!({
                "closing_date": closing_date_str,
                "team_only": team_only,
            }),
            ACTOR,
        );

        self.apply(
            |conn| {
                conn.execute(
                    "INSERT INTO competitions (name, closing_date, team_only) VALUES (?1, ?2, ?3)
                     ON CONFLICT(name) DO UPDATE SET
                        closing_date = excluded.closing_date,
                        team_only = excluded.team_only",
                    params![name, closing_date_str, team_only],
                )
                .with_context(|| format!("Failed to insert competition {}", name))?;
                Ok(())
            },
            event,
        )
    }

    fn add_individual(&mut self, name: &str, first_name: &str, email: &str) -> Result<()> {
        let event = Event::new(
            "candidate_added",
            "candidate",
            name,
            serde_json::json!({
                "kind": "individual",
                "first_name": first_name,
                "email": email,
            }),
            ACTOR,
        );

        self.apply(
            |conn| {
                conn.execute(
                    "INSERT INTO candidates (name, kind, first_name, email) VALUES (?1, 'individual', ?2, ?3)
                     ON CONFLICT(name) DO UPDATE SET
                        kind = excluded.kind,
                        first_name = excluded.first_name,
                        email = excluded.email",
                    params![name, first_name, email],
                )
                .with_context(|| format!("Failed to insert individual {}", name))?;
                Ok(())
            },
            event,
        )
    }

    fn add_team(&mut self, name: &str) -> Result<()> {
        let event = Event::new(
            "candidate_added",
            "candidate",
            name,
            serde_json::json!({ "kind": "team" }),
            ACTOR,
        );

        self.apply(
            |conn| {
                conn.execute(
                    "INSERT INTO candidates (name, kind) VALUES (?1, 'team')
                     ON CONFLICT(name) DO UPDATE SET
                        kind = excluded.kind,
                        first_name = NULL,
                        email = NULL",
                    params![name],
                )
                .with_context(|| format!("Failed to insert team {}", name))?;
                Ok(())
            },
            event,
        )
    }

    fn remove_competition(&mut self, name: &str) -> Result<()> {
        let event = Event::new("competition_removed", "competition", name, serde_json::json!({}), ACTOR);

        self.apply(
            |conn| {
                conn.execute("DELETE FROM competitions WHERE name = ?1", params![name])
                    .with_context(|| format!("Failed to delete competition {}", name))?;
                Ok(())
            },
            event,
        )
    }

    fn remove_candidate(&mut self, name: &str) -> Result<()> {
        let event = Event::new("candidate_removed", "candidate", name, serde_json::json!({}), ACTOR);

        self.apply(
            |conn| {
                conn.execute("DELETE FROM candidates WHERE name = ?1", params![name])
                    .with_context(|| format!("Failed to delete candidate {}", name))?;
                Ok(())
            },
            event,
        )
    }
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // WAL for crash recovery (in-memory databases stay in "memory" mode)
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS competitions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT UNIQUE NOT NULL,
            closing_date TEXT,
            team_only INTEGER NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS candidates (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT UNIQUE NOT NULL,
            kind TEXT NOT NULL,
            first_name TEXT,
            email TEXT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT UNIQUE NOT NULL,
            timestamp TEXT NOT NULL,
            event_type TEXT NOT NULL,
            entity_type TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            data TEXT NOT NULL,
            actor TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_entity ON events(entity_type, entity_id)",
        [],
    )?;

    Ok(())
}

/// Insert event into audit trail
pub fn insert_event(conn: &Connection, event: &Event) -> Result<()> {
    let data_json = serde_json::to_string(&event.data)?;

    conn.execute(
        "INSERT INTO events (
            event_id, timestamp, event_type, entity_type, entity_id, data, actor
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            event.event_id,
            event.timestamp.to_rfc3339(),
            event.event_type,
            event.entity_type,
            event.entity_id,
            data_json,
            event.actor,
        ],
    )?;

    Ok(())
}

/// Get events for a specific entity
pub fn get_events_for_entity(
    conn: &Connection,
    entity_type: &str,
    entity_id: &str,
) -> Result<Vec<Event>> {
    let mut stmt = conn.prepare(
        "SELECT event_id, timestamp, event_type, entity_type, entity_id, data, actor
         FROM events
         WHERE entity_type = ?1 AND entity_id = ?2
         ORDER BY id DESC",
    )?;

    let events = stmt
        .query_map(params![entity_type, entity_id], |row| {
            let timestamp_str: String = row.get(1)?;
            let data_json: String = row.get(5)?;

            Ok(Event {
                event_id: row.get(0)?,
                timestamp: DateTime::parse_from_rfc3339(&timestamp_str)
                    .map_err(|_| rusqlite::Error::InvalidQuery)?
                    .with_timezone(&Utc),
                event_type: row.get(2)?,
                entity_type: row.get(3)?,
                entity_id: row.get(4)?,
                data: serde_json::from_str(&data_json)
                    .map_err(|_| rusqlite::Error::InvalidQuery)?,
                actor: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(events)
}
