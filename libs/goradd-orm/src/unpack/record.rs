// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use indexmap::IndexMap;
use serde::Serialize;

use crate::Value;

/// The key under which the values of a builder's aliases are stored in a record
pub const ALIASES_KEY: &str = "aliases_";

/// One loaded row, with the records joined to it nested inside. Columns are keyed by their
/// database name, joined records by the field name of the join (or its alias).
pub type Record = IndexMap<String, Field>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Field {
    Value(Value),
    /// A record reached through a reference, or through an expanded reverse or many-many join
    Record(Record),
    /// The records of a reverse or many-many join
    Records(Vec<Record>),
    /// The ids of a many-many join to an enum table
    Values(Vec<Value>),
}

/// Typed access to the fields of a [`Record`]
pub trait RecordExt {
    fn value(&self, key: &str) -> Option<&Value>;
    fn record(&self, key: &str) -> Option<&Record>;
    fn records(&self, key: &str) -> Option<&[Record]>;
    fn values(&self, key: &str) -> Option<&[Value]>;
    /// The value of a builder alias
    fn alias(&self, name: &str) -> Option<&Value>;
}

impl RecordExt for Record {
    fn value(&self, key: &str) -> Option<&Value> {
        match self.get(key)? {
            Field::Value(v) => Some(v),
            _ => None,
        }
    }

    fn record(&self, key: &str) -> Option<&Record> {
        match self.get(key)? {
            Field::Record(r) => Some(r),
            _ => None,
        }
    }

    fn records(&self, key: &str) -> Option<&[Record]> {
        match self.get(key)? {
            Field::Records(r) => Some(r),
            _ => None,
        }
    }

    fn values(&self, key: &str) -> Option<&[Value]> {
        match self.get(key)? {
            Field::Values(v) => Some(v),
            _ => None,
        }
    }

    fn alias(&self, name: &str) -> Option<&Value> {
        self.record(ALIASES_KEY)?.value(name)
    }
}
