// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Databases, the drivers behind them and the per-request context they run in.

mod context;
mod database;
mod driver;
mod registry;
mod sql_database;
#[cfg(test)]
mod test_driver;

pub use context::{Context, ProfileEntry, StatementKind, TransactionId};
pub(crate) use context::DatabaseContext;
pub use database::{Database, with_transaction};
pub use driver::{DriverTransaction, ExecResult, SqlConnection, SqlDriver};
pub use registry::{add_database, database_keys, get_database};
pub use sql_database::SqlDatabase;
