// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::{future::Future, panic::AssertUnwindSafe};

use async_trait::async_trait;
use futures::FutureExt;
use indexmap::IndexMap;
use tracing::error;

use super::{Context, TransactionId};
use crate::{
    DatabaseError, Model, Value,
    node::Node,
    query::{BuilderState, QueryBuilder},
    unpack::{Cursor, Record},
};

/// A database as seen by the rest of the application: its model, the basic row operations,
/// transactions, and the execution of builder queries.
#[async_trait]
pub trait Database: Send + Sync {
    /// The key the database is registered under
    fn key(&self) -> &str;

    fn model(&self) -> &Model;

    /// Insert a row and return its primary key
    async fn insert(
        &self,
        ctx: &Context,
        table: &str,
        fields: &IndexMap<String, Value>,
    ) -> Result<String, DatabaseError>;

    async fn update(
        &self,
        ctx: &Context,
        table: &str,
        fields: &IndexMap<String, Value>,
        pk_name: &str,
        pk_value: Value,
    ) -> Result<(), DatabaseError>;

    async fn delete(
        &self,
        ctx: &Context,
        table: &str,
        pk_name: &str,
        pk_value: Value,
    ) -> Result<(), DatabaseError>;

    /// Replace the rows of association table `table` whose `column` is `pk` with one row per
    /// value of `related_pks`
    async fn associate(
        &self,
        ctx: &Context,
        table: &str,
        column: &str,
        pk: Value,
        related_column: &str,
        related_pks: &[Value],
    ) -> Result<(), DatabaseError>;

    /// Begin a transaction, or a nested one if a transaction is already open in `ctx`
    async fn begin(&self, ctx: &Context) -> Result<TransactionId, DatabaseError>;

    /// Commit the transaction `txid`. The outermost commit commits the database transaction.
    ///
    /// Panics unless `txid` is the innermost open transaction.
    async fn commit(&self, ctx: &Context, txid: TransactionId) -> Result<(), DatabaseError>;

    /// Roll back every open transaction if `txid` is the innermost one. Does nothing otherwise,
    /// so calling it after a commit is harmless.
    async fn rollback(&self, ctx: &Context, txid: TransactionId) -> Result<(), DatabaseError>;

    /// Prepare `ctx` for use with this database
    async fn put_blank_context(&self, ctx: &Context);

    async fn load(&self, ctx: &Context, state: &BuilderState)
    -> Result<Vec<Record>, DatabaseError>;

    async fn load_cursor(&self, ctx: &Context, state: &BuilderState)
    -> Result<Cursor, DatabaseError>;

    async fn count(
        &self,
        ctx: &Context,
        state: &BuilderState,
        distinct: bool,
        nodes: &[Node],
    ) -> Result<u64, DatabaseError>;

    async fn delete_query(&self, ctx: &Context, state: &BuilderState)
    -> Result<(), DatabaseError>;
}

impl<'d> dyn Database + 'd {
    pub fn new_builder<'a>(&'a self, ctx: &'a Context) -> QueryBuilder<'a> {
        QueryBuilder::new(self, ctx)
    }

    pub fn query<'a>(&'a self, ctx: &'a Context, table: &str) -> QueryBuilder<'a> {
        QueryBuilder::for_table(self, ctx, table)
    }
}

/// Run `work` in a transaction. The transaction is committed if `work` succeeds and rolled back
/// if it fails or panics; a panic is resumed after the rollback.
pub async fn with_transaction<T, F>(
    db: &dyn Database,
    ctx: &Context,
    work: F,
) -> Result<T, DatabaseError>
where
    F: Future<Output = Result<T, DatabaseError>>,
{
    let txid = db.begin(ctx).await?;

    match AssertUnwindSafe(work).catch_unwind().await {
        Ok(Ok(value)) => {
            db.commit(ctx, txid).await?;
            Ok(value)
        }
        Ok(Err(err)) => {
            db.rollback(ctx, txid).await?;
            Err(err)
        }
        Err(panic) => {
            if let Err(err) = db.rollback(ctx, txid).await {
                error!(%err, "Rollback after a panic failed");
            }
            std::panic::resume_unwind(panic)
        }
    }
}
