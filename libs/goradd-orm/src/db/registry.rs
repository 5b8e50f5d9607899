// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The databases of the application, by key.
//!
//! Databases are added while the application starts and looked up afterwards.

use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use indexmap::IndexMap;
use tracing::info;

use super::Database;

static DATABASES: LazyLock<RwLock<IndexMap<String, Arc<dyn Database>>>> =
    LazyLock::new(|| RwLock::new(IndexMap::new()));

/// Register `db` under its key. Panics if the key is taken or is not made of letters only.
pub fn add_database(db: Arc<dyn Database>) {
    let key = db.key().to_string();
    if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphabetic()) {
        panic!("database key {key:?} must consist of letters only");
    }

    let mut databases = DATABASES.write().unwrap_or_else(PoisonError::into_inner);
    if databases.contains_key(&key) {
        panic!("a database with key {key} has already been added");
    }
    info!(key, "Adding database");
    databases.insert(key, db);
}

pub fn get_database(key: &str) -> Option<Arc<dyn Database>> {
    DATABASES
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(key)
        .cloned()
}

/// Keys of the registered databases, in the order they were added
pub fn database_keys() -> Vec<String> {
    DATABASES
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .keys()
        .cloned()
        .collect()
}
