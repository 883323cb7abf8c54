//! Column conversions shared by the repositories. SQLite stores counters as
//! signed integers and timestamps as RFC 3339 text.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::Row;

use crate::models::SessionStatus;

pub fn to_sql_int(value: u64) -> Result<i64> {
    i64::try_from(value).map_err(|_| anyhow!("{value} does not fit in an SQLite INTEGER"))
}

pub fn read_u64(row: &Row, column: &str) -> Result<u64> {
    let raw: i64 = row.get(column)?;
    u64::try_from(raw).map_err(|_| anyhow!("column {column} holds negative value {raw}"))
}

pub fn read_u32(row: &Row, column: &str) -> Result<u32> {
    let raw: i64 = row.get(column)?;
    u32::try_from(raw).map_err(|_| anyhow!("column {column} is out of range: {raw}"))
}

fn parse_timestamp(raw: &str, column: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("column {column} holds an invalid timestamp"))
}

pub fn read_datetime(row: &Row, column: &str) -> Result<DateTime<Utc>> {
    let raw: String = row.get(column)?;
    parse_timestamp(&raw, column)
}

pub fn read_optional_datetime(row: &Row, column: &str) -> Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(column)?;
    raw.map(|value| parse_timestamp(&value, column)).transpose()
}

pub fn read_status(row: &Row, column: &str) -> Result<SessionStatus> {
    let raw: String = row.get(column)?;
    [
        SessionStatus::Running,
        SessionStatus::Completed,
        SessionStatus::Interrupted,
    ]
    .into_iter()
    .find(|status| status.as_str() == raw)
    .ok_or_else(|| anyhow!("unknown session status {raw}"))
}
