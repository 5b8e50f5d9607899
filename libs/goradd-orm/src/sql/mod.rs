// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Turning builder state into SQL.

#[macro_use]
mod test_util;

mod dialect;
mod generator;
pub(crate) mod join_tree;
mod sql_builder;

pub use dialect::{DatePiece, Dialect, MySql, Postgres, SqlServer, Sqlite};
pub use generator::{count_statement, delete_statement, select_statement};
pub(crate) use generator::SqlGenerator;
pub use sql_builder::SQLBuilder;
