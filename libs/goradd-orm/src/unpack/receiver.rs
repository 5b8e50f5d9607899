// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Coercion of driver cells to the logical type of a column.
//!
//! Drivers disagree on how they hand back values: an integer may arrive as an integer, a string
//! or raw bytes, a boolean as an integer, and a date-time as a string in one of several formats.
//! All of that variance is absorbed here.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

use crate::{ColumnType, DatabaseError, SQL_DATE_TIME_FORMAT, Value};

/// The string the receiver returns for a `CURRENT_TIMESTAMP` date-time default.
pub const NOW: &str = "now";

const CURRENT_TIMESTAMP: &str = "CURRENT_TIMESTAMP";

/// A single cell as returned by a driver.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlReceiver(pub Value);

impl SqlReceiver {
    /// Decode the cell as `column_type`. NULL stays NULL; substituting a default is up to the
    /// caller.
    pub fn unpack(self, column_type: ColumnType) -> Result<Value, DatabaseError> {
        if self.0.is_null() {
            return Ok(Value::Null);
        }

        match column_type {
            ColumnType::Bytes => self.bytes(),
            ColumnType::String => self.string(),
            ColumnType::Int => {
                let v = self.int64()?;
                i32::try_from(v)
                    .map(|_| Value::Int(v))
                    .map_err(|_| DatabaseError::coercion("int", v))
            }
            ColumnType::Int64 => self.int64().map(Value::Int),
            ColumnType::Uint => {
                let v = self.uint64()?;
                u32::try_from(v)
                    .map(|_| Value::Uint(v))
                    .map_err(|_| DatabaseError::coercion("uint", v))
            }
            ColumnType::Uint64 => self.uint64().map(Value::Uint),
            ColumnType::Float32 => self.float64().map(|f| Value::Float32(f as f32)),
            ColumnType::Float64 => self.float64().map(Value::Float),
            ColumnType::Bool => self.bool().map(Value::Bool),
            ColumnType::DateTime => self.date_time(),
        }
    }

    fn bytes(self) -> Result<Value, DatabaseError> {
        match self.0 {
            Value::Bytes(b) => Ok(Value::Bytes(b)),
            Value::String(s) => Ok(Value::Bytes(s.into_bytes())),
            other => Err(DatabaseError::coercion("bytes", other)),
        }
    }

    fn string(self) -> Result<Value, DatabaseError> {
        match self.0 {
            Value::String(s) => Ok(Value::String(s)),
            Value::Bytes(b) => String::from_utf8(b)
                .map(Value::String)
                .map_err(|e| DatabaseError::coercion("string", e.into_bytes())),
            v @ (Value::Int(_) | Value::Uint(_) | Value::Float(_) | Value::Float32(_)) => {
                Ok(Value::String(v.to_string()))
            }
            Value::Time(t) => Ok(Value::String(t.format(SQL_DATE_TIME_FORMAT).to_string())),
            other => Err(DatabaseError::coercion("string", other)),
        }
    }

    fn int64(&self) -> Result<i64, DatabaseError> {
        let err = || DatabaseError::coercion("int64", &self.0);
        match &self.0 {
            Value::Int(i) => Ok(*i),
            Value::Uint(u) => i64::try_from(*u).map_err(|_| err()),
            Value::Bool(b) => Ok(*b as i64),
            Value::Float(f) if f.fract() == 0.0 => Ok(*f as i64),
            Value::String(s) => s.trim().parse().map_err(|_| err()),
            Value::Bytes(b) => std::str::from_utf8(b)
                .ok()
                .and_then(|s| s.trim().parse().ok())
                .ok_or_else(err),
            _ => Err(err()),
        }
    }

    fn uint64(&self) -> Result<u64, DatabaseError> {
        let err = || DatabaseError::coercion("uint64", &self.0);
        match &self.0 {
            Value::Uint(u) => Ok(*u),
            Value::Int(i) => u64::try_from(*i).map_err(|_| err()),
            Value::Bool(b) => Ok(*b as u64),
            Value::Float(f) if f.fract() == 0.0 && *f >= 0.0 => Ok(*f as u64),
            Value::String(s) => s.trim().parse().map_err(|_| err()),
            Value::Bytes(b) => std::str::from_utf8(b)
                .ok()
                .and_then(|s| s.trim().parse().ok())
                .ok_or_else(err),
            _ => Err(err()),
        }
    }

    fn float64(&self) -> Result<f64, DatabaseError> {
        let err = || DatabaseError::coercion("float64", &self.0);
        match &self.0 {
            Value::Float(f) => Ok(*f),
            Value::Float32(f) => Ok(*f as f64),
            Value::Int(i) => Ok(*i as f64),
            Value::Uint(u) => Ok(*u as f64),
            Value::String(s) => s.trim().parse().map_err(|_| err()),
            Value::Bytes(b) => std::str::from_utf8(b)
                .ok()
                .and_then(|s| s.trim().parse().ok())
                .ok_or_else(err),
            _ => Err(err()),
        }
    }

    fn bool(&self) -> Result<bool, DatabaseError> {
        let from_str = |s: &str| match s.trim().to_lowercase().as_str() {
            "1" | "t" | "true" | "y" | "yes" => Some(true),
            "0" | "f" | "false" | "n" | "no" => Some(false),
            _ => None,
        };
        let err = || DatabaseError::coercion("bool", &self.0);

        match &self.0 {
            Value::Bool(b) => Ok(*b),
            Value::Int(i) => Ok(*i != 0),
            Value::Uint(u) => Ok(*u != 0),
            Value::String(s) => from_str(s).ok_or_else(err),
            Value::Bytes(b) => std::str::from_utf8(b)
                .ok()
                .and_then(from_str)
                .ok_or_else(err),
            _ => Err(err()),
        }
    }

    fn date_time(self) -> Result<Value, DatabaseError> {
        match self.0 {
            Value::Time(t) => Ok(Value::Time(t)),
            Value::String(s) => parse_date_time(&s),
            Value::Bytes(b) => match String::from_utf8(b) {
                Ok(s) => parse_date_time(&s),
                Err(e) => Err(DatabaseError::coercion("date_time", e.into_bytes())),
            },
            Value::Int(secs) => DateTime::from_timestamp(secs, 0)
                .map(|t| Value::Time(t.naive_utc()))
                .ok_or_else(|| DatabaseError::coercion("date_time", secs)),
            other => Err(DatabaseError::coercion("date_time", other)),
        }
    }
}

/// Parses the canonical `YYYY-MM-DD HH:MM:SS[.fraction][timezone]` format, its ISO-8601 form, and
/// date-only or time-only values. Values with a timezone are converted to UTC.
fn parse_date_time(s: &str) -> Result<Value, DatabaseError> {
    let s = s.trim();
    if s.eq_ignore_ascii_case(CURRENT_TIMESTAMP) {
        return Ok(Value::String(NOW.to_string()));
    }

    if let Ok(t) = DateTime::parse_from_rfc3339(&s.replacen(' ', "T", 1)) {
        return Ok(Value::Time(t.naive_utc()));
    }
    if let Ok(t) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Ok(Value::Time(t.naive_utc()));
    }
    for format in [SQL_DATE_TIME_FORMAT, "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(t) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(Value::Time(t));
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(Value::Time(d.and_time(NaiveTime::MIN)));
    }
    if let Ok(t) = NaiveTime::parse_from_str(s, "%H:%M:%S%.f") {
        return Ok(Value::Time(NaiveDateTime::default().date().and_time(t)));
    }

    Err(DatabaseError::coercion("date_time", s))
}
