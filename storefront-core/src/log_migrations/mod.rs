//! Event log schema, embedded at compile time
//!
//! Each entry is `(name, sql)`. Applied names are recorded in
//! `event_log_schema`, so a migration runs once per database.

/// When changing the schema, add `NNN_description.sql` and append it here
pub const LOG_MIGRATIONS: &[(&str, &str)] = &[("001_events.sql", include_str!("001_events.sql"))];
