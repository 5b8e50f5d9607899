// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! What a SQL backend has to provide. Everything above this level (statements, transactions
//! bookkeeping, unpacking) is shared by all backends.

use async_trait::async_trait;

use crate::{DatabaseError, Value, sql::Dialect, unpack::ResultSet};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    pub rows_affected: u64,
    /// The row id generated by an insert, for drivers that report one
    pub last_insert_id: Option<i64>,
}

#[async_trait]
pub trait SqlConnection: Send + Sync {
    async fn query(&self, sql: &str, params: &[Value]) -> Result<ResultSet, DatabaseError>;

    async fn exec(&self, sql: &str, params: &[Value]) -> Result<ExecResult, DatabaseError>;
}

#[async_trait]
pub trait SqlDriver: SqlConnection {
    fn dialect(&self) -> &dyn Dialect;

    async fn begin(&self) -> Result<Box<dyn DriverTransaction>, DatabaseError>;
}

/// A transaction open on a backend. The façade calls `rollback` after a failed `commit`, so a
/// commit that fails must leave the transaction able to roll back.
#[async_trait]
pub trait DriverTransaction: SqlConnection {
    async fn commit(&mut self) -> Result<(), DatabaseError>;

    async fn rollback(&mut self) -> Result<(), DatabaseError>;
}
