// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! An object-relational query engine.
//!
//! A database is described by a [`DatabaseDescription`](schema::description::DatabaseDescription),
//! which [`Model::import`] analyzes into tables, references between them, reverse references and
//! many-many references, and enum tables. Queries are built from [`Node`]s that walk those
//! relationships (`project.manager.last_name`) with the fluent [`Builder`] interface:
//!
//! ```no_run
//! # use goradd_orm::{Builder, Context, Database, op};
//! # async fn run(db: &dyn Database) -> Result<(), goradd_orm::DatabaseError> {
//! let ctx = Context::new();
//! let model = db.model();
//! let projects = db
//!     .query(&ctx, "project")
//!     .join(model.node("project.manager"))
//!     .condition(op::eq(model.node("project.manager.last_name"), "Wolfe"))
//!     .load()
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! The builder's nodes are merged into a join tree, which drives both the generated SQL and the
//! unpacking of the flat result rows into nested [`Record`]s. Backends implement [`SqlDriver`] and
//! are wrapped in a [`SqlDatabase`].

pub mod config;
#[macro_use]
pub mod sql;
pub mod database_error;
pub mod db;
pub mod model;
pub mod node;
pub mod query;
pub mod schema;
pub mod unpack;
mod value;

pub use config::OrmConfig;
pub use database_error::{DatabaseError, WithContext};
pub use db::{
    Context, Database, DriverTransaction, ExecResult, ProfileEntry, SqlConnection, SqlDatabase,
    SqlDriver, StatementKind, TransactionId, add_database, database_keys, get_database,
    with_transaction,
};
pub use model::{ColumnType, Model};
pub use node::{Node, op};
pub use query::{Builder, BuilderState, Limit, QueryBuilder};
pub use unpack::{Cursor, Field, Record, RecordExt, ResultSet};
pub use value::{SQL_DATE_TIME_FORMAT, Value};
