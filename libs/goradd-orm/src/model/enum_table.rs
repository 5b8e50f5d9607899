// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use indexmap::IndexMap;

use super::ColumnType;
use crate::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct EnumField {
    pub name: String,
    pub column_type: ColumnType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumRow {
    pub id: i64,
    pub name: String,
    /// Identifier generated from the name (`PersonTypeContractor`)
    pub constant: String,
    /// All fields of the row, including the id and name
    pub values: IndexMap<String, Value>,
}

/// An integer-keyed lookup table whose rows are materialized when the model is imported.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumTable {
    pub db_name: String,
    pub literal_name: String,
    pub literal_plural: String,
    pub type_name: String,
    pub type_plural: String,
    /// The first field is the id and the second the name
    pub fields: Vec<EnumField>,
    pub rows: Vec<EnumRow>,
}

impl EnumTable {
    pub fn pk_field(&self) -> &str {
        &self.fields[0].name
    }

    pub fn row(&self, id: i64) -> Option<&EnumRow> {
        self.rows.iter().find(|r| r.id == id)
    }

    pub fn constants(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|r| r.constant.as_str())
    }
}
