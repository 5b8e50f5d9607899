// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::str::FromStr;

use async_trait::async_trait;
use deadpool_postgres::{ClientWrapper, Manager, ManagerConfig, Pool, RecyclingMethod};
use goradd_orm::{
    DatabaseError, DriverTransaction, ExecResult, ResultSet, SqlConnection, SqlDriver, Value,
    config::Environment,
    sql::{Dialect, Postgres},
};
use tokio_postgres::{Config, NoTls, types::ToSql};
use tracing::{debug, error, instrument};

use crate::{
    PgConfig,
    param::{PgParam, column_value},
};

pub struct PgDriver {
    pool: Pool,
}

impl PgDriver {
    /// Create a connection pool. Connections are opened on first use.
    pub fn new(config: &PgConfig) -> Result<Self, DatabaseError> {
        let pg_config = Config::from_str(&config.url).map_err(|e| {
            DatabaseError::delegate(e)
                .with_context("Failed to parse PostgreSQL connection string".into())
        })?;

        let manager_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };
        let manager = Manager::from_config(pg_config, NoTls, manager_config);

        let pool = Pool::builder(manager)
            .max_size(config.pool_size)
            .build()
            .map_err(|e| DatabaseError::Config(format!("Failed to create the pool: {e}")))?;

        Ok(Self { pool })
    }

    pub fn from_env(env: &dyn Environment) -> Result<Self, DatabaseError> {
        Self::new(&PgConfig::from_env(env)?)
    }

    async fn get_client(&self) -> Result<deadpool_postgres::Client, DatabaseError> {
        self.pool.get().await.map_err(|e| {
            error!(%e, "Failed to get a Postgres connection");
            DatabaseError::delegate(e)
        })
    }
}

async fn query(
    client: &ClientWrapper,
    sql: &str,
    params: &[Value],
) -> Result<ResultSet, DatabaseError> {
    let statement = client
        .prepare_cached(sql)
        .await
        .map_err(DatabaseError::delegate)?;
    let columns = statement
        .columns()
        .iter()
        .map(|c| c.name().to_string())
        .collect();

    let params = params.iter().map(PgParam).collect::<Vec<_>>();
    let refs = params
        .iter()
        .map(|p| p as &(dyn ToSql + Sync))
        .collect::<Vec<_>>();
    let rows = client
        .query(&statement, &refs)
        .await
        .map_err(DatabaseError::delegate)?;

    let mut result = ResultSet::new(columns);
    for row in rows {
        let cells = (0..row.len())
            .map(|index| column_value(&row, index))
            .collect::<Result<Vec<_>, _>>()?;
        result.rows.push(cells);
    }
    Ok(result)
}

async fn exec(
    client: &ClientWrapper,
    sql: &str,
    params: &[Value],
) -> Result<ExecResult, DatabaseError> {
    let statement = client
        .prepare_cached(sql)
        .await
        .map_err(DatabaseError::delegate)?;

    let params = params.iter().map(PgParam).collect::<Vec<_>>();
    let refs = params
        .iter()
        .map(|p| p as &(dyn ToSql + Sync))
        .collect::<Vec<_>>();
    let rows_affected = client
        .execute(&statement, &refs)
        .await
        .map_err(DatabaseError::delegate)?;

    Ok(ExecResult {
        rows_affected,
        last_insert_id: None,
    })
}

#[async_trait]
impl SqlConnection for PgDriver {
    #[instrument(name = "PgDriver::query", skip(self, params))]
    async fn query(&self, sql: &str, params: &[Value]) -> Result<ResultSet, DatabaseError> {
        let client = self.get_client().await?;
        query(&client, sql, params).await
    }

    #[instrument(name = "PgDriver::exec", skip(self, params))]
    async fn exec(&self, sql: &str, params: &[Value]) -> Result<ExecResult, DatabaseError> {
        let client = self.get_client().await?;
        exec(&client, sql, params).await
    }
}

#[async_trait]
impl SqlDriver for PgDriver {
    fn dialect(&self) -> &dyn Dialect {
        &Postgres
    }

    async fn begin(&self) -> Result<Box<dyn DriverTransaction>, DatabaseError> {
        let client = self.get_client().await?;
        client
            .batch_execute("BEGIN")
            .await
            .map_err(DatabaseError::delegate)?;
        debug!("Began Postgres transaction");
        Ok(Box::new(PgTransaction { client }))
    }
}

/// A transaction holding on to one pooled connection until it ends
struct PgTransaction {
    client: deadpool_postgres::Client,
}

impl PgTransaction {
    async fn finish(&self, statement: &str) -> Result<(), DatabaseError> {
        self.client
            .batch_execute(statement)
            .await
            .map_err(|e| DatabaseError::Transaction(e.to_string()))
    }
}

#[async_trait]
impl SqlConnection for PgTransaction {
    async fn query(&self, sql: &str, params: &[Value]) -> Result<ResultSet, DatabaseError> {
        query(&self.client, sql, params).await
    }

    async fn exec(&self, sql: &str, params: &[Value]) -> Result<ExecResult, DatabaseError> {
        exec(&self.client, sql, params).await
    }
}

#[async_trait]
impl DriverTransaction for PgTransaction {
    async fn commit(&mut self) -> Result<(), DatabaseError> {
        self.finish("COMMIT").await
    }

    async fn rollback(&mut self) -> Result<(), DatabaseError> {
        self.finish("ROLLBACK").await
    }
}
