// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::Value;

/// The logical type of a column, independent of the database that stores it.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Bytes,
    #[default]
    String,
    /// 32-bit signed integer
    Int,
    /// 32-bit unsigned integer
    Uint,
    Int64,
    Uint64,
    Float32,
    Float64,
    Bool,
    DateTime,
}

impl ColumnType {
    /// The value a non-nullable column of this type takes when the database hands back NULL.
    pub fn default_value(&self) -> Value {
        match self {
            ColumnType::Bytes => Value::Bytes(vec![]),
            ColumnType::String => Value::String(String::new()),
            ColumnType::Int | ColumnType::Int64 => Value::Int(0),
            ColumnType::Uint | ColumnType::Uint64 => Value::Uint(0),
            ColumnType::Float32 => Value::Float32(0.0),
            ColumnType::Float64 => Value::Float(0.0),
            ColumnType::Bool => Value::Bool(false),
            ColumnType::DateTime => Value::Time(NaiveDateTime::default()),
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            ColumnType::Int | ColumnType::Uint | ColumnType::Int64 | ColumnType::Uint64
        )
    }

    pub fn is_float(&self) -> bool {
        matches!(self, ColumnType::Float32 | ColumnType::Float64)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ColumnType::Bytes => "bytes",
            ColumnType::String => "string",
            ColumnType::Int => "int",
            ColumnType::Uint => "uint",
            ColumnType::Int64 => "int64",
            ColumnType::Uint64 => "uint64",
            ColumnType::Float32 => "float32",
            ColumnType::Float64 => "float64",
            ColumnType::Bool => "bool",
            ColumnType::DateTime => "date_time",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        assert_eq!(ColumnType::String.default_value(), Value::String("".into()));
        assert_eq!(ColumnType::Int64.default_value(), Value::Int(0));
        assert_eq!(ColumnType::Uint.default_value(), Value::Uint(0));
        assert_eq!(ColumnType::Bool.default_value(), Value::Bool(false));
        assert!(matches!(
            ColumnType::DateTime.default_value(),
            Value::Time(t) if t == NaiveDateTime::default()
        ));
    }

    #[test]
    fn deserializes_snake_case() {
        let t: ColumnType = serde_json::from_str("\"date_time\"").unwrap();
        assert_eq!(t, ColumnType::DateTime);
        let t: ColumnType = serde_json::from_str("\"uint64\"").unwrap();
        assert_eq!(t, ColumnType::Uint64);
    }
}
