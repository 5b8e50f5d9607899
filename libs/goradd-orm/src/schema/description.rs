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

use crate::model::{ColumnType, FkAction};

/// Everything the importer needs to know about a database.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct DatabaseDescription {
    pub tables: Vec<TableDescription>,
    pub enum_tables: Vec<EnumTableDescription>,
    /// Association tables (or embedded arrays) that link two tables
    pub many_many: Vec<ManyManyDescription>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct TableDescription {
    /// The name of the table in the database, possibly qualified with a schema (`public.person`)
    pub name: String,
    pub columns: Vec<ColumnDescription>,
    pub indexes: Vec<IndexDescription>,
    /// The table comment. A JSON object embedded anywhere in it is read as options.
    pub comment: String,
    pub options: Map<String, JsonValue>,
}

/// An integer-keyed lookup table whose rows are known when the model is built.
///
/// The first column is the id and the second column is the name. Any other columns are extra
/// fields carried along with each row.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct EnumTableDescription {
    pub name: String,
    pub columns: Vec<ColumnDescription>,
    /// Rows, with values in the same order as `columns`
    pub values: Vec<Vec<JsonValue>>,
    pub comment: String,
    pub options: Map<String, JsonValue>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct ColumnDescription {
    pub name: String,
    pub column_type: ColumnType,
    /// The type as reported by the database (`VARCHAR(100)`, `bigint`, etc.)
    pub native_type: String,
    pub max_char_length: u64,
    pub default_value: Option<JsonValue>,
    pub min_value: Option<JsonValue>,
    pub max_value: Option<JsonValue>,
    /// An auto-generated identifier (auto-increment or similar)
    pub is_id: bool,
    pub is_pk: bool,
    pub is_nullable: bool,
    pub is_unique: bool,
    pub is_timestamp: bool,
    pub is_date_only: bool,
    pub is_time_only: bool,
    pub foreign_key: Option<ForeignKeyDescription>,
    pub comment: String,
    pub options: Map<String, JsonValue>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct ForeignKeyDescription {
    pub referenced_table: String,
    pub referenced_column: String,
    pub update_action: FkAction,
    pub delete_action: FkAction,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct IndexDescription {
    pub is_unique: bool,
    pub columns: Vec<String>,
}

/// A many-to-many link between `table1` and `table2`.
///
/// For SQL databases, the link is an association table with `column1` pointing to `table1` and
/// `column2` pointing to `table2`.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct ManyManyDescription {
    pub assn_table: String,
    pub table1: String,
    pub column1: String,
    pub table2: String,
    pub column2: String,
    /// Name of the reference on `table2` pointing back to `table1`
    pub name1: Option<String>,
    pub plural1: Option<String>,
    /// Name of the reference on `table1` pointing to `table2`
    pub name2: Option<String>,
    pub plural2: Option<String>,
    pub supports_foreign_keys: bool,
}
