// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use super::ColumnType;
use crate::Value;

/// What the database does to a referencing row when the referenced row changes.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FkAction {
    #[default]
    None,
    SetNull,
    SetDefault,
    Cascade,
    Restrict,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKeyInfo {
    pub referenced_table: String,
    pub referenced_column: String,
    pub update_action: FkAction,
    pub delete_action: FkAction,
    /// Name of the reference (`Manager` for a `manager_id` column)
    pub identifier: String,
    /// Key under which the referenced record is placed (`manager`)
    pub field_name: String,
    /// Type name of the referenced table
    pub referenced_type: String,
    pub is_enum: bool,
    /// Field name of the reverse reference created on the referenced table
    pub reverse_reference: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub db_name: String,
    pub identifier: String,
    pub column_type: ColumnType,
    pub native_type: String,
    pub max_char_length: u64,
    pub default_value: Option<Value>,
    pub min_value: Option<Value>,
    pub max_value: Option<Value>,
    /// Auto-generated identifier. Always typed as a string so ids look the same across databases.
    pub is_id: bool,
    pub is_pk: bool,
    pub is_nullable: bool,
    pub is_unique: bool,
    pub is_timestamp: bool,
    pub is_date_only: bool,
    pub is_time_only: bool,
    pub should_auto_update: bool,
    pub foreign_key: Option<ForeignKeyInfo>,
    pub comment: String,
    pub options: Map<String, JsonValue>,
}

impl Column {
    pub fn is_reference(&self) -> bool {
        self.foreign_key.is_some()
    }

    /// The value stored when a row is read with NULL in a non-nullable column.
    pub fn default_or_zero(&self) -> Value {
        match &self.default_value {
            Some(v) if !v.is_null() => v.clone(),
            _ => self.column_type.default_value(),
        }
    }
}
