// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! A [`SqlDriver`](goradd_orm::SqlDriver) over an embedded SQLite database.
//!
//! rusqlite is synchronous, so every statement runs on tokio's blocking pool. All statements
//! share one connection. An open transaction keeps it to itself, and statements from other
//! contexts wait until the transaction commits or rolls back.

mod convert;
mod driver;

pub use driver::SqliteDriver;
