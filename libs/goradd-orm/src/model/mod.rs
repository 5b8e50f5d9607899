// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The in-memory description of a database that queries are built against.
//!
//! A [`Model`] is imported once from a [`DatabaseDescription`](crate::schema::description::DatabaseDescription)
//! and is immutable afterwards. Relationships that form cycles (a foreign key and the reverse
//! reference it produces, the two sides of a many-to-many reference) refer to each other by name
//! rather than by pointer.

mod column;
mod column_type;
mod enum_table;
mod import;
mod mapped_arena;
pub(crate) mod naming;
mod table;

pub use column::{Column, FkAction, ForeignKeyInfo};
pub use column_type::ColumnType;
pub use enum_table::{EnumField, EnumRow, EnumTable};
pub use mapped_arena::{MappedArena, SerializableSlab, SerializableSlabIndex};
pub use table::{Index, ManyManyReference, ReverseReference, Table};

#[derive(Debug, Clone)]
pub struct Model {
    key: String,
    foreign_key_suffix: String,
    enum_table_suffix: String,
    tables: MappedArena<Table>,
    enum_tables: MappedArena<EnumTable>,
}

impl Model {
    /// The key of the database this model describes
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn foreign_key_suffix(&self) -> &str {
        &self.foreign_key_suffix
    }

    pub fn enum_table_suffix(&self) -> &str {
        &self.enum_table_suffix
    }

    pub fn table(&self, db_name: &str) -> Option<&Table> {
        self.tables.get_by_key(db_name)
    }

    pub fn enum_table(&self, db_name: &str) -> Option<&EnumTable> {
        self.enum_tables.get_by_key(db_name)
    }

    /// Tables in the order they were described
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    pub fn enum_tables(&self) -> impl Iterator<Item = &EnumTable> {
        self.enum_tables.values()
    }

    /// Like [`Model::table`], for callers that have already validated the name.
    pub(crate) fn expect_table(&self, db_name: &str) -> &Table {
        self.table(db_name)
            .unwrap_or_else(|| panic!("table {db_name} is not in database {}", self.key))
    }
}
