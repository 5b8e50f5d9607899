// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use serde_json::{Map, Value as JsonValue};

use super::Column;

#[derive(Debug, Clone, PartialEq)]
pub struct Index {
    pub is_unique: bool,
    pub columns: Vec<String>,
}

/// The "one" side of a foreign key, materialized on the referenced table.
///
/// A `project.manager_id -> person.id` foreign key produces a reverse reference on `person`
/// named `ProjectsAsManager`, through which a person's managed projects are reached.
#[derive(Debug, Clone, PartialEq)]
pub struct ReverseReference {
    pub identifier: String,
    pub identifier_plural: String,
    pub field_name: String,
    /// The column on this table the foreign key points to
    pub column: String,
    /// The table holding the foreign key
    pub associated_table: String,
    /// The foreign key column
    pub associated_column: String,
    /// The foreign key is unique, so at most one associated row exists
    pub is_unique: bool,
}

/// One side of a many-to-many relationship through an association table.
#[derive(Debug, Clone, PartialEq)]
pub struct ManyManyReference {
    pub assn_table: String,
    /// The association column pointing to this table
    pub assn_column: String,
    /// The table (or enum table) on the other side
    pub associated_table: String,
    /// The association column pointing to the other side
    pub associated_column: String,
    /// The primary key of the other side
    pub associated_pk: String,
    pub identifier: String,
    pub identifier_plural: String,
    pub field_name: String,
    pub is_enum: bool,
    pub supports_foreign_keys: bool,
    /// Field name of the reference on the other side pointing back here. `None` for enums.
    pub counterpart: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub db_name: String,
    pub literal_name: String,
    pub literal_plural: String,
    pub type_name: String,
    pub type_plural: String,
    pub columns: Vec<Column>,
    pub indexes: Vec<Index>,
    pub reverse_references: Vec<ReverseReference>,
    pub many_many_references: Vec<ManyManyReference>,
    pub comment: String,
    pub options: Map<String, JsonValue>,
    pub no_codegen: bool,
}

impl Table {
    pub fn column(&self, db_name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.db_name == db_name)
    }

    pub fn pk_column(&self) -> &Column {
        // Import rejects tables without exactly one primary key
        self.columns
            .iter()
            .find(|c| c.is_pk)
            .unwrap_or_else(|| panic!("table {} has no primary key", self.db_name))
    }

    /// The foreign key column whose reference is named `field_name`
    pub fn reference_column(&self, field_name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| {
            c.foreign_key
                .as_ref()
                .is_some_and(|fk| fk.field_name == field_name)
        })
    }

    pub fn reverse_reference(&self, field_name: &str) -> Option<&ReverseReference> {
        self.reverse_references
            .iter()
            .find(|r| r.field_name == field_name)
    }

    pub fn many_many_reference(&self, field_name: &str) -> Option<&ManyManyReference> {
        self.many_many_references
            .iter()
            .find(|r| r.field_name == field_name)
    }

    /// Whether a field name is already used by a column or a relationship on this table
    pub(crate) fn has_field(&self, field_name: &str) -> bool {
        self.columns.iter().any(|c| c.db_name == field_name)
            || self.reference_column(field_name).is_some()
            || self.reverse_reference(field_name).is_some()
            || self.many_many_reference(field_name).is_some()
    }
}
