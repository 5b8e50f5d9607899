// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use indexmap::IndexMap;

use crate::Value;

/// Rows as returned by a driver, before they are decoded
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    /// Column names (the aliases of the statement)
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl ResultSet {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: vec![],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// The first cell of the first row, as returned by aggregate queries
    pub fn scalar(&self) -> Option<&Value> {
        self.rows.first()?.first()
    }

    /// A row as a map from column name to value
    pub fn row_map(&self, row: usize) -> Option<IndexMap<String, Value>> {
        let row = self.rows.get(row)?;
        Some(self.columns.iter().cloned().zip(row.iter().cloned()).collect())
    }
}
