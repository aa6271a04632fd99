// src/db/values.rs
//
// Column encoding shared by the SQLite repositories.
//
// Timestamps are stored as fixed-width RFC 3339 (UTC, milliseconds, `Z`)
// so that text ordering in SQL equals chronological ordering.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::Row;
use std::str::FromStr;

pub fn encode_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn encode_optional_timestamp(dt: &Option<DateTime<Utc>>) -> Option<String> {
    dt.as_ref().map(encode_timestamp)
}

fn parse_timestamp(idx: usize, raw: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub fn get_timestamp(row: &Row, column: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
    let idx = row.as_ref().column_index(column)?;
    let raw: String = row.get(idx)?;
    parse_timestamp(idx, &raw)
}

pub fn get_optional_timestamp(
    row: &Row,
    column: &str,
) -> Result<Option<DateTime<Utc>>, rusqlite::Error> {
    let idx = row.as_ref().column_index(column)?;
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| parse_timestamp(idx, &s)).transpose()
}

/// Decode a text column through the type's `FromStr`
pub fn get_parsed<T>(row: &Row, column: &str) -> Result<T, rusqlite::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let idx = row.as_ref().column_index(column)?;
    let raw: String = row.get(idx)?;
    raw.parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Escape `%`, `_` and `\` for a `LIKE ... ESCAPE '\'` pattern
pub fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}
