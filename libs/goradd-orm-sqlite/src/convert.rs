// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use goradd_orm::{DatabaseError, SQL_DATE_TIME_FORMAT, Value};
use rusqlite::types::{Value as SqliteValue, ValueRef};

/// SQLite has no boolean or date-time storage class. Booleans are stored as integers and
/// date-times as text in [`SQL_DATE_TIME_FORMAT`], which is also what `datetime()` produces.
pub(crate) fn to_sqlite(value: &Value) -> Result<SqliteValue, DatabaseError> {
    Ok(match value {
        Value::Null => SqliteValue::Null,
        Value::String(v) => SqliteValue::Text(v.clone()),
        Value::Int(v) => SqliteValue::Integer(*v),
        Value::Uint(v) => SqliteValue::Integer(i64::try_from(*v).map_err(|_| {
            DatabaseError::Validation(format!("{v} does not fit in a SQLite integer"))
        })?),
        Value::Float(v) => SqliteValue::Real(*v),
        Value::Float32(v) => SqliteValue::Real(*v as f64),
        Value::Bool(v) => SqliteValue::Integer(*v as i64),
        Value::Time(v) => SqliteValue::Text(v.format(SQL_DATE_TIME_FORMAT).to_string()),
        Value::Bytes(v) => SqliteValue::Blob(v.clone()),
    })
}

pub(crate) fn from_sqlite(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => Value::Int(v),
        ValueRef::Real(v) => Value::Float(v),
        ValueRef::Text(v) => Value::String(String::from_utf8_lossy(v).into_owned()),
        ValueRef::Blob(v) => Value::Bytes(v.to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn values_are_stored_in_sqlite_classes() {
        let time = NaiveDate::from_ymd_opt(2024, 5, 6)
            .unwrap()
            .and_hms_opt(7, 8, 9)
            .unwrap();

        assert_eq!(
            to_sqlite(&Value::Time(time)).unwrap(),
            SqliteValue::Text("2024-05-06 07:08:09".to_string())
        );
        assert_eq!(
            to_sqlite(&Value::Bool(true)).unwrap(),
            SqliteValue::Integer(1)
        );
        assert_eq!(to_sqlite(&Value::Uint(3)).unwrap(), SqliteValue::Integer(3));
        assert!(to_sqlite(&Value::Uint(u64::MAX)).is_err());
    }

    #[test]
    fn cells_are_read_back_as_values() {
        assert_eq!(from_sqlite(ValueRef::Integer(4)), Value::Int(4));
        assert_eq!(from_sqlite(ValueRef::Text(b"abc")), Value::from("abc"));
        assert_eq!(from_sqlite(ValueRef::Null), Value::Null);
    }
}
