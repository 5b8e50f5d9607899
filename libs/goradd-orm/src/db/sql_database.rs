// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tracing::{debug, instrument, warn};

use super::{
    Context, Database, DatabaseContext, DriverTransaction, ExecResult, ProfileEntry,
    SqlConnection, SqlDriver, StatementKind, TransactionId, with_transaction,
};
use crate::{
    ColumnType, DatabaseError, Model, Value,
    database_error::WithContext,
    node::Node,
    query::{BuilderState, QueryBuilder},
    sql::{SQLBuilder, SqlGenerator},
    unpack::{Cursor, Record, ResultSet, SqlReceiver, Unpacker},
};

/// A [`Database`] over any SQL driver. Statements run in the transaction open in the context,
/// if there is one.
pub struct SqlDatabase<D> {
    key: String,
    model: Model,
    driver: D,
}

impl<D: SqlDriver + 'static> SqlDatabase<D> {
    pub fn new(key: &str, model: Model, driver: D) -> Self {
        Self {
            key: key.to_string(),
            model,
            driver,
        }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn new_builder<'a>(&'a self, ctx: &'a Context) -> QueryBuilder<'a> {
        QueryBuilder::new(self, ctx)
    }

    /// A builder rooted at `table`
    pub fn query<'a>(&'a self, ctx: &'a Context, table: &str) -> QueryBuilder<'a> {
        QueryBuilder::for_table(self, ctx, table)
    }

    /// Run a statement returning rows
    #[instrument(name = "SqlDatabase::query", skip(self, ctx, params), fields(db = %self.key))]
    pub async fn query_raw(
        &self,
        ctx: &Context,
        sql: &str,
        params: &[Value],
    ) -> Result<ResultSet, DatabaseError> {
        self.check_cancelled(ctx, sql, params)?;
        let (started, timer) = (Utc::now(), Instant::now());

        let result = {
            let databases = ctx.databases.lock().await;
            match databases.get(&self.key).and_then(|c| c.transaction.as_ref()) {
                Some(transaction) => transaction.query(sql, params).await,
                None => self.driver.query(sql, params).await,
            }
        };

        self.profile(ctx, StatementKind::Query, sql, params, started, timer)
            .await;
        result.with_context(format!("While running `{sql}`:"))
    }

    /// Run a statement that returns no rows
    #[instrument(name = "SqlDatabase::exec", skip(self, ctx, params), fields(db = %self.key))]
    pub async fn exec_raw(
        &self,
        ctx: &Context,
        sql: &str,
        params: &[Value],
    ) -> Result<ExecResult, DatabaseError> {
        self.check_cancelled(ctx, sql, params)?;
        let (started, timer) = (Utc::now(), Instant::now());

        let result = {
            let databases = ctx.databases.lock().await;
            match databases.get(&self.key).and_then(|c| c.transaction.as_ref()) {
                Some(transaction) => transaction.exec(sql, params).await,
                None => self.driver.exec(sql, params).await,
            }
        };

        self.profile(ctx, StatementKind::Exec, sql, params, started, timer)
            .await;
        result.with_context(format!("While running `{sql}`:"))
    }

    fn check_cancelled(
        &self,
        ctx: &Context,
        sql: &str,
        params: &[Value],
    ) -> Result<(), DatabaseError> {
        if ctx.is_cancelled() {
            return Err(DatabaseError::Cancelled);
        }
        debug!(sql, ?params, "Running statement");
        Ok(())
    }

    async fn profile(
        &self,
        ctx: &Context,
        kind: StatementKind,
        sql: &str,
        params: &[Value],
        started: DateTime<Utc>,
        timer: Instant,
    ) {
        if !ctx.is_profiling() {
            return;
        }
        ctx.record(ProfileEntry {
            key: self.key.clone(),
            kind,
            sql: sql.to_string(),
            args: format!("{params:#?}"),
            started,
            duration: timer.elapsed(),
        })
        .await;
    }

    fn builder(&self) -> SQLBuilder<'_> {
        SQLBuilder::new(self.driver.dialect())
    }

    fn generator(&self) -> SqlGenerator<'_> {
        SqlGenerator::new(&self.model, self.driver.dialect())
    }

    fn check_table(&self, table: &str) -> Result<(), DatabaseError> {
        if self.model.table(table).is_none() {
            return Err(DatabaseError::Validation(format!(
                "database {} has no table {table}",
                self.key
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl<D: SqlDriver + 'static> Database for SqlDatabase<D> {
    fn key(&self) -> &str {
        &self.key
    }

    fn model(&self) -> &Model {
        &self.model
    }

    #[instrument(name = "SqlDatabase::insert", skip(self, ctx, fields), fields(db = %self.key))]
    async fn insert(
        &self,
        ctx: &Context,
        table: &str,
        fields: &IndexMap<String, Value>,
    ) -> Result<String, DatabaseError> {
        self.check_table(table)?;
        let pk = self.model.expect_table(table).pk_column().db_name.clone();

        let mut builder = self.builder();
        builder.push_str("INSERT INTO ");
        builder.push_identifier(table);
        if fields.is_empty() {
            builder.push_str(" DEFAULT VALUES");
        } else {
            builder.push_str(" (");
            builder.push_iter(fields.keys(), ", ", |b, name| b.push_identifier(name));
            builder.push_str(") VALUES (");
            builder.push_iter(fields.values(), ", ", |b, value| b.push_param(value.clone()));
            builder.push(')');
        }

        if self.driver.dialect().supports_returning() {
            builder.push_str(" RETURNING ");
            builder.push_identifier(&pk);
            let (sql, params) = builder.into_sql();
            let result = self.query_raw(ctx, &sql, &params).await?;
            let id = result.scalar().cloned().unwrap_or(Value::Null);
            return SqlReceiver(id).unpack(ColumnType::String).map(|id| id.to_string());
        }

        let (sql, params) = builder.into_sql();
        let result = self.exec_raw(ctx, &sql, &params).await?;
        match (fields.get(&pk), result.last_insert_id) {
            (Some(id), _) if !id.is_null() => Ok(id.to_string()),
            (_, Some(id)) => Ok(id.to_string()),
            _ => Err(DatabaseError::Validation(format!(
                "the driver did not report the id of the row inserted into {table}"
            ))),
        }
    }

    #[instrument(name = "SqlDatabase::update", skip(self, ctx, fields), fields(db = %self.key))]
    async fn update(
        &self,
        ctx: &Context,
        table: &str,
        fields: &IndexMap<String, Value>,
        pk_name: &str,
        pk_value: Value,
    ) -> Result<(), DatabaseError> {
        self.check_table(table)?;
        if fields.is_empty() {
            return Ok(());
        }

        let mut builder = self.builder();
        builder.push_str("UPDATE ");
        builder.push_identifier(table);
        builder.push_str(" SET ");
        builder.push_iter(fields.iter(), ", ", |b, (name, value)| {
            b.push_identifier(name);
            b.push_str(" = ");
            b.push_param(value.clone());
        });
        builder.push_str(" WHERE ");
        builder.push_identifier(pk_name);
        builder.push_str(" = ");
        builder.push_param(pk_value);

        let (sql, params) = builder.into_sql();
        self.exec_raw(ctx, &sql, &params).await?;
        Ok(())
    }

    #[instrument(name = "SqlDatabase::delete", skip(self, ctx), fields(db = %self.key))]
    async fn delete(
        &self,
        ctx: &Context,
        table: &str,
        pk_name: &str,
        pk_value: Value,
    ) -> Result<(), DatabaseError> {
        self.check_table(table)?;

        let mut builder = self.builder();
        builder.push_str("DELETE FROM ");
        builder.push_identifier(table);
        builder.push_str(" WHERE ");
        builder.push_identifier(pk_name);
        builder.push_str(" = ");
        builder.push_param(pk_value);

        let (sql, params) = builder.into_sql();
        self.exec_raw(ctx, &sql, &params).await?;
        Ok(())
    }

    #[instrument(name = "SqlDatabase::associate", skip(self, ctx, related_pks), fields(db = %self.key))]
    async fn associate(
        &self,
        ctx: &Context,
        table: &str,
        column: &str,
        pk: Value,
        related_column: &str,
        related_pks: &[Value],
    ) -> Result<(), DatabaseError> {
        with_transaction(self, ctx, async {
            let mut builder = self.builder();
            builder.push_str("DELETE FROM ");
            builder.push_identifier(table);
            builder.push_str(" WHERE ");
            builder.push_identifier(column);
            builder.push_str(" = ");
            builder.push_param(pk.clone());
            let (sql, params) = builder.into_sql();
            self.exec_raw(ctx, &sql, &params).await?;

            for related_pk in related_pks {
                let mut builder = self.builder();
                builder.push_str("INSERT INTO ");
                builder.push_identifier(table);
                builder.push_str(" (");
                builder.push_identifier(column);
                builder.push_str(", ");
                builder.push_identifier(related_column);
                builder.push_str(") VALUES (");
                builder.push_param(pk.clone());
                builder.push_str(", ");
                builder.push_param(related_pk.clone());
                builder.push(')');
                let (sql, params) = builder.into_sql();
                self.exec_raw(ctx, &sql, &params).await?;
            }
            Ok(())
        })
        .await
    }

    async fn begin(&self, ctx: &Context) -> Result<TransactionId, DatabaseError> {
        let mut databases = ctx.databases.lock().await;
        let db_ctx = databases.entry(self.key.clone()).or_default();

        db_ctx.tx_count += 1;
        if db_ctx.tx_count == 1 {
            match self.driver.begin().await {
                Ok(transaction) => db_ctx.transaction = Some(transaction),
                Err(err) => {
                    db_ctx.tx_count = 0;
                    return Err(err);
                }
            }
            debug!(db = %self.key, "Began transaction");
        }
        Ok(db_ctx.tx_count)
    }

    async fn commit(&self, ctx: &Context, txid: TransactionId) -> Result<(), DatabaseError> {
        let mut databases = ctx.databases.lock().await;
        let db_ctx = databases.entry(self.key.clone()).or_default();

        if db_ctx.tx_count == 0 {
            panic!(
                "cannot commit transaction {txid} of {}: no transaction is open",
                self.key
            );
        }
        if db_ctx.tx_count != txid {
            panic!(
                "cannot commit transaction {txid} of {} while {} transactions are open; a nested transaction was not committed, or was rolled back",
                self.key, db_ctx.tx_count
            );
        }

        db_ctx.tx_count -= 1;
        if db_ctx.tx_count > 0 {
            return Ok(());
        }
        let Some(mut transaction) = db_ctx.transaction.take() else {
            return Ok(());
        };
        if let Err(err) = transaction.commit().await {
            // The count is already zero, so a deferred rollback would not reach the driver
            if let Err(rollback_err) = transaction.rollback().await {
                warn!(db = %self.key, %rollback_err, "Failed to roll back after a failed commit");
            }
            return Err(err.with_context(format!("While committing transaction {txid}:")));
        }
        debug!(db = %self.key, "Committed transaction");
        Ok(())
    }

    async fn rollback(&self, ctx: &Context, txid: TransactionId) -> Result<(), DatabaseError> {
        let mut databases = ctx.databases.lock().await;
        let Some(db_ctx) = databases.get_mut(&self.key) else {
            return Ok(());
        };
        if db_ctx.tx_count != txid {
            return Ok(());
        }

        db_ctx.tx_count = 0;
        if let Some(mut transaction) = db_ctx.transaction.take() {
            transaction.rollback().await?;
            debug!(db = %self.key, "Rolled back transaction");
        }
        Ok(())
    }

    async fn put_blank_context(&self, ctx: &Context) {
        ctx.databases
            .lock()
            .await
            .insert(self.key.clone(), DatabaseContext::default());
    }

    async fn load(
        &self,
        ctx: &Context,
        state: &BuilderState,
    ) -> Result<Vec<Record>, DatabaseError> {
        let (tree, sql, params) = self.generator().select(state);
        let result = self.query_raw(ctx, &sql, &params).await?;
        Unpacker::new(&tree, &result)?
            .unpack(&result.rows, || ctx.is_cancelled())
            .with_context(format!("While unpacking the result of `{sql}`:"))
    }

    async fn load_cursor(
        &self,
        ctx: &Context,
        state: &BuilderState,
    ) -> Result<Cursor, DatabaseError> {
        let (tree, sql, params) = self.generator().select(state);
        if let Some(item) = tree.has_loaded_array() {
            panic!(
                "a cursor cannot collect arrays of child records, but {} loads one; expand it or use load",
                item.node
            );
        }
        let result = self.query_raw(ctx, &sql, &params).await?;
        Ok(Cursor::with_tree(result, tree))
    }

    async fn count(
        &self,
        ctx: &Context,
        state: &BuilderState,
        distinct: bool,
        nodes: &[Node],
    ) -> Result<u64, DatabaseError> {
        let (sql, params) = self.generator().count(state, distinct, nodes);
        let result = self.query_raw(ctx, &sql, &params).await?;
        let count = result.scalar().cloned().unwrap_or(Value::Int(0));

        match SqlReceiver(count).unpack(ColumnType::Uint64)? {
            Value::Uint(n) => Ok(n),
            Value::Null => Ok(0),
            other => Err(DatabaseError::Coercion {
                expected: "count".to_string(),
                found: other.to_string(),
            }),
        }
    }

    async fn delete_query(
        &self,
        ctx: &Context,
        state: &BuilderState,
    ) -> Result<(), DatabaseError> {
        let (sql, params) = self.generator().delete(state);
        self.exec_raw(ctx, &sql, &params).await?;
        Ok(())
    }
}
