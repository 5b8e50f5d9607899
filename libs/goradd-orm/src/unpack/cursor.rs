// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use indexmap::IndexMap;
use tracing::debug;

use super::{Field, Record, ResultSet, Unpacker};
use crate::{DatabaseError, Value, sql::join_tree::JoinTree};

/// Hands out the rows of a result one at a time.
///
/// A cursor created by a query builder yields unpacked [`Record`]s through its [`Iterator`]
/// implementation. [`Cursor::next_row`] yields the raw cells of the next row by column name.
/// The rows are released by [`Cursor::close`], or when the cursor is dropped.
#[derive(Debug)]
pub struct Cursor {
    columns: Vec<String>,
    rows: std::vec::IntoIter<Vec<Value>>,
    tree: Option<JoinTree>,
    closed: bool,
}

impl Cursor {
    pub fn new(result: ResultSet) -> Self {
        Self {
            columns: result.columns,
            rows: result.rows.into_iter(),
            tree: None,
            closed: false,
        }
    }

    pub(crate) fn with_tree(result: ResultSet, tree: JoinTree) -> Self {
        let mut cursor = Self::new(result);
        cursor.tree = Some(tree);
        cursor
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn next_row(&mut self) -> Option<IndexMap<String, Value>> {
        let row = self.rows.next()?;
        Some(self.columns.iter().cloned().zip(row).collect())
    }

    fn unpack_row(&self, row: Vec<Value>) -> Result<Record, DatabaseError> {
        let Some(tree) = &self.tree else {
            return Ok(self
                .columns
                .iter()
                .cloned()
                .zip(row.into_iter().map(Field::Value))
                .collect());
        };

        let result = ResultSet {
            columns: self.columns.clone(),
            rows: vec![row],
        };
        let mut records = Unpacker::new(tree, &result)?.unpack(&result.rows, || false)?;
        if records.len() > 1 {
            return Err(DatabaseError::Validation(
                "a cursor row unpacked into several records".to_string(),
            ));
        }
        records
            .pop()
            .ok_or_else(|| DatabaseError::Validation("a cursor row unpacked into nothing".to_string()))
    }

    /// Release the remaining rows. Calling it again does nothing.
    pub fn close(&mut self) {
        if !self.closed {
            debug!(remaining = self.rows.len(), "Closing cursor");
            self.rows = Vec::new().into_iter();
            self.closed = true;
        }
    }
}

impl Iterator for Cursor {
    type Item = Result<Record, DatabaseError>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.rows.next()?;
        Some(self.unpack_row(row))
    }
}

impl Drop for Cursor {
    fn drop(&mut self) {
        self.close();
    }
}
