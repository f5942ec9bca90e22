//! Event log - what the shopper did, kept in DuckDB
//!
//! One row per storefront action (login, cart edits, checkout, ...) in
//! `logs.duckdb` inside the shop directory. A row names the action, the
//! command that ran it, the view it led to and, for failures, the message
//! the shopper saw. Emails, passwords, tokens and cart contents are never
//! recorded, and routes are stored without their ids.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, Result};
use chrono::Utc;
use duckdb::{params_from_iter, Connection};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{Outcome, Route};
use crate::log_migrations::LOG_MIGRATIONS;

const SCHEMA_TABLE: &str = "event_log_schema";

/// Current unix timestamp in milliseconds
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Stable name of a view for the log
pub fn route_name(route: Route) -> &'static str {
    match route {
        Route::Home => "home",
        Route::Login => "login",
        Route::Signup => "signup",
        Route::Products => "products",
        Route::ProductDetail(_) => "product_detail",
        Route::Cart => "cart",
        Route::Orders => "orders",
        Route::OrderDetail(_) => "order_detail",
    }
}

/// An action about to be recorded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    pub event: String,
    pub command: Option<String>,
    pub route: Option<&'static str>,
    pub failure: Option<String>,
}

impl LogEvent {
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            command: None,
            route: None,
            failure: None,
        }
    }

    /// Event for what `action` led to
    ///
    /// A failed action is logged as `<action>_failed` with the message the
    /// shopper saw. A redirect to login from anything but signup means the
    /// session was rejected and is logged as `<action>_unauthorized`.
    pub fn from_outcome(action: &str, outcome: &Outcome) -> Self {
        match outcome {
            Outcome::Updated => Self::new(action),
            Outcome::Navigate(Route::Login) if action != "signup" => {
                Self::new(format!("{}_unauthorized", action))
                    .with_route(Route::Login)
                    .with_failure("Session rejected by the server")
            }
            Outcome::Navigate(route) => Self::new(action).with_route(*route),
            Outcome::Failed(message) => {
                Self::new(format!("{}_failed", action)).with_failure(message.clone())
            }
        }
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    pub fn with_route(mut self, route: Route) -> Self {
        self.route = Some(route_name(route));
        self
    }

    pub fn with_failure(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }
}

/// A recorded action
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub id: String,
    pub recorded_at: i64,
    pub app_version: String,
    pub event: String,
    pub command: Option<String>,
    pub route: Option<String>,
    pub failure: Option<String>,
}

/// Which entries to list; unset fields match everything
#[derive(Debug, Clone, Default)]
pub struct LogQuery {
    pub event: Option<String>,
    pub route: Option<String>,
    pub failures_only: bool,
    pub limit: usize,
}

/// How often one event was recorded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventCount {
    pub event: String,
    pub total: u64,
    pub last_recorded_at: i64,
}

pub struct LoggingService {
    conn: Mutex<Connection>,
    db_path: PathBuf,
    app_version: String,
}

impl LoggingService {
    /// Open `logs.duckdb` in the shop directory, creating the schema if needed
    pub fn new(shop_dir: &Path, app_version: impl Into<String>) -> Result<Self> {
        let db_path = shop_dir.join("logs.duckdb");
        let conn = Connection::open(&db_path)?;
        migrate(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
            app_version: app_version.into(),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| anyhow!("Event log lock poisoned: {}", e))
    }

    pub fn record(&self, event: LogEvent) -> Result<()> {
        self.conn()?.execute(
            "INSERT INTO events (id, recorded_at, app_version, event, command, route, failure) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            duckdb::params![
                Uuid::new_v4().to_string(),
                now_ms(),
                &self.app_version,
                &event.event,
                &event.command,
                event.route,
                &event.failure,
            ],
        )?;
        Ok(())
    }

    /// Entries matching `query`, newest first
    pub fn entries(&self, query: &LogQuery) -> Result<Vec<LogEntry>> {
        let mut conditions = Vec::new();
        let mut values = Vec::new();
        if let Some(event) = &query.event {
            conditions.push("event = ?");
            values.push(event.clone());
        }
        if let Some(route) = &query.route {
            conditions.push("route = ?");
            values.push(route.clone());
        }
        if query.failures_only {
            conditions.push("failure IS NOT NULL");
        }

        let mut sql = String::from(
            "SELECT id, recorded_at, app_version, event, command, route, failure FROM events",
        );
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(&format!(" ORDER BY recorded_at DESC, id LIMIT {}", query.limit));

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), |row| {
            Ok(LogEntry {
                id: row.get(0)?,
                recorded_at: row.get(1)?,
                app_version: row.get(2)?,
                event: row.get(3)?,
                command: row.get(4)?,
                route: row.get(5)?,
                failure: row.get(6)?,
            })
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    /// Per-event totals, most frequent first
    pub fn event_counts(&self) -> Result<Vec<EventCount>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT event, COUNT(*), MAX(recorded_at) FROM events \
             GROUP BY event ORDER BY COUNT(*) DESC, event",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(EventCount {
                event: row.get(0)?,
                total: row.get(1)?,
                last_recorded_at: row.get(2)?,
            })
        })?;

        let mut counts = Vec::new();
        for row in rows {
            counts.push(row?);
        }
        Ok(counts)
    }

    pub fn total(&self) -> Result<u64> {
        let total = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))?;
        Ok(total)
    }

    /// Failed and unauthorized actions
    pub fn failure_count(&self) -> Result<u64> {
        let count = self.conn()?.query_row(
            "SELECT COUNT(*) FROM events WHERE failure IS NOT NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Drop entries recorded before `cutoff_ms`
    pub fn prune_before(&self, cutoff_ms: i64) -> Result<u64> {
        let deleted = self
            .conn()?
            .execute("DELETE FROM events WHERE recorded_at < ?", [cutoff_ms])?;
        Ok(deleted as u64)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {} (name VARCHAR PRIMARY KEY, applied_at BIGINT NOT NULL)",
        SCHEMA_TABLE
    ))?;

    for (name, sql) in LOG_MIGRATIONS {
        let applied: bool = conn.query_row(
            &format!("SELECT COUNT(*) > 0 FROM {} WHERE name = ?", SCHEMA_TABLE),
            [*name],
            |row| row.get(0),
        )?;
        if applied {
            continue;
        }

        tracing::debug!(migration = *name, "applying event log migration");
        conn.execute_batch(sql)?;
        conn.execute(
            &format!("INSERT INTO {} (name, applied_at) VALUES (?, ?)", SCHEMA_TABLE),
            duckdb::params![*name, now_ms()],
        )?;
    }
    Ok(())
}
