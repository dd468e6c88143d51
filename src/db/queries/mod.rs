//! Row mapping and versioned writes for workflow records.

pub mod appeals;
pub mod attendance;
pub mod audit;
pub mod notifications;
pub mod tasks;
pub mod verifications;

use crate::errors::AppError;
use crate::models::position::{LatLng, Position};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::Row;
use rusqlite::types::Type;

pub(crate) fn conversion_error(idx: usize, err: AppError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

pub(crate) fn ts_to_db(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn opt_ts_to_db(ts: &Option<DateTime<Utc>>) -> Option<String> {
    ts.as_ref().map(ts_to_db)
}

pub(crate) fn parse_ts(raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| conversion_error(0, AppError::InvalidDate(raw.to_string())))
}

pub(crate) fn get_ts(row: &Row, col: &str) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(col)?;
    parse_ts(&raw)
}

pub(crate) fn get_opt_ts(row: &Row, col: &str) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(col)?;
    raw.as_deref().map(parse_ts).transpose()
}

pub(crate) fn get_date(row: &Row, col: &str) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(col)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .map_err(|_| conversion_error(0, AppError::InvalidDate(raw.clone())))
}

/// Read a position stored as `<prefix>_lat`, `<prefix>_lng`, `<prefix>_accuracy`.
pub(crate) fn get_position(row: &Row, prefix: &str) -> rusqlite::Result<Option<Position>> {
    let lat: Option<f64> = row.get(format!("{prefix}_lat").as_str())?;
    let lng: Option<f64> = row.get(format!("{prefix}_lng").as_str())?;
    let acc: Option<f64> = row.get(format!("{prefix}_accuracy").as_str())?;

    Ok(match (lat, lng, acc) {
        (Some(lat), Some(lng), Some(accuracy)) => Some(Position::new(lat, lng, accuracy)),
        _ => None,
    })
}

pub(crate) fn get_latlng(row: &Row, prefix: &str) -> rusqlite::Result<Option<LatLng>> {
    let lat: Option<f64> = row.get(format!("{prefix}_lat").as_str())?;
    let lng: Option<f64> = row.get(format!("{prefix}_lng").as_str())?;

    Ok(match (lat, lng) {
        (Some(lat), Some(lng)) => Some(LatLng::new(lat, lng)),
        _ => None,
    })
}

/// Turn the affected-row count of a versioned UPDATE into a result.
pub(crate) fn expect_one(changed: usize, what: String) -> Result<(), AppError> {
    if changed == 1 {
        Ok(())
    } else {
        Err(AppError::ConcurrentModification(what))
    }
}
