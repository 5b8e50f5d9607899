// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::{
    collections::HashMap,
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;

use super::DriverTransaction;
use crate::config::OrmConfig;

/// Returned by [`Database::begin`](super::Database::begin) and passed back to commit or roll
/// back. It is the nesting depth of the transaction.
pub type TransactionId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    Query,
    Exec,
}

/// One statement run while profiling is enabled
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileEntry {
    pub key: String,
    pub kind: StatementKind,
    pub sql: String,
    pub args: String,
    pub started: DateTime<Utc>,
    pub duration: Duration,
}

/// What a context holds for one database
#[derive(Default)]
pub(crate) struct DatabaseContext {
    pub transaction: Option<Box<dyn DriverTransaction>>,
    pub tx_count: TransactionId,
}

/// The state of one logical request: its open transactions, its profile log and whether it has
/// been cancelled.
///
/// A context is created per request and must not be shared between concurrent requests. The
/// statements of one context run one after the other.
#[derive(Default)]
pub struct Context {
    pub(crate) databases: Mutex<HashMap<String, DatabaseContext>>,
    profiles: Mutex<Vec<ProfileEntry>>,
    profiling: bool,
    cancelled: AtomicBool,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// A context recording every statement it runs
    pub fn with_profiling(profiling: bool) -> Self {
        Self {
            profiling,
            ..Self::default()
        }
    }

    /// A context following the profiling setting of `config`
    pub fn for_config(config: &OrmConfig) -> Self {
        Self::with_profiling(config.profiling)
    }

    pub fn is_profiling(&self) -> bool {
        self.profiling
    }

    /// Make the statements that have not started yet fail with
    /// [`DatabaseError::Cancelled`](crate::DatabaseError::Cancelled)
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// The number of open transactions on database `key`
    pub async fn transaction_count(&self, key: &str) -> TransactionId {
        self.databases
            .lock()
            .await
            .get(key)
            .map(|c| c.tx_count)
            .unwrap_or_default()
    }

    pub(crate) async fn record(&self, entry: ProfileEntry) {
        if self.profiling {
            self.profiles.lock().await.push(entry);
        }
    }

    pub async fn profiles(&self) -> Vec<ProfileEntry> {
        self.profiles.lock().await.clone()
    }
}
