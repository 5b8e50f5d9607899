// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;

use async_trait::async_trait;
use goradd_orm::{
    DatabaseError, DriverTransaction, ExecResult, ResultSet, SqlConnection, SqlDriver, Value,
    config::{Environment, env_const::GORADD_SQLITE_PATH},
    sql::{Dialect, Sqlite},
};
use rusqlite::{Connection, params_from_iter, types::Value as SqliteValue};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, error, instrument, warn};

use crate::convert::{from_sqlite, to_sqlite};

const IN_MEMORY: &str = ":memory:";

type ConnectionGuard = OwnedMutexGuard<Connection>;

/// A driver over one SQLite connection. A transaction holds the connection from `BEGIN` until
/// it ends, so statements from other contexts wait for it instead of running inside it.
#[derive(Clone)]
pub struct SqliteDriver {
    path: String,
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDriver {
    /// Open (or create) the database at `path`. `:memory:` opens a private in-memory database.
    pub fn open(path: &str) -> Result<Self, DatabaseError> {
        let conn = if path == IN_MEMORY {
            Connection::open_in_memory()
        } else {
            Connection::open(path)
        }
        .map_err(|e| {
            error!(path, %e, "Failed to open SQLite database");
            DatabaseError::delegate(e).with_context(format!("Failed to open {path}"))
        })?;

        Ok(Self {
            path: path.to_string(),
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Self::open(IN_MEMORY)
    }

    /// Open the database named by `GORADD_SQLITE_PATH`, or an in-memory one if it is not set
    pub fn from_env(env: &dyn Environment) -> Result<Self, DatabaseError> {
        Self::open(&env.get_or_else(GORADD_SQLITE_PATH, IN_MEMORY))
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Run a script of statements separated by semicolons, such as a schema
    pub async fn execute_batch(&self, sql: &str) -> Result<(), DatabaseError> {
        let sql = sql.to_string();
        self.with_connection(move |conn| conn.execute_batch(&sql))
            .await
    }

    async fn with_connection<T, F>(&self, work: F) -> Result<T, DatabaseError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let conn = self.conn.clone().lock_owned().await;
        let (_, result) = run_blocking(conn, work).await?;
        result.map_err(DatabaseError::delegate)
    }
}

/// Run `work` on a blocking thread, handing the connection back along with the result
async fn run_blocking<T, F>(
    conn: ConnectionGuard,
    work: F,
) -> Result<(ConnectionGuard, rusqlite::Result<T>), DatabaseError>
where
    T: Send + 'static,
    F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let result = work(&*conn);
        (conn, result)
    })
    .await
    .map_err(DatabaseError::delegate)
}

fn to_params(params: &[Value]) -> Result<Vec<SqliteValue>, DatabaseError> {
    params.iter().map(to_sqlite).collect()
}

fn query(conn: &Connection, sql: &str, params: Vec<SqliteValue>) -> rusqlite::Result<ResultSet> {
    let mut stmt = conn.prepare(sql)?;
    let columns = stmt
        .column_names()
        .into_iter()
        .map(String::from)
        .collect::<Vec<_>>();
    let width = columns.len();
    let mut result = ResultSet::new(columns);

    let mut rows = stmt.query(params_from_iter(params))?;
    while let Some(row) = rows.next()? {
        let cells = (0..width)
            .map(|index| row.get_ref(index).map(from_sqlite))
            .collect::<rusqlite::Result<Vec<_>>>()?;
        result.rows.push(cells);
    }
    Ok(result)
}

fn exec(conn: &Connection, sql: &str, params: Vec<SqliteValue>) -> rusqlite::Result<ExecResult> {
    let rows_affected = conn.execute(sql, params_from_iter(params))?;
    Ok(ExecResult {
        rows_affected: rows_affected as u64,
        last_insert_id: Some(conn.last_insert_rowid()),
    })
}

#[async_trait]
impl SqlConnection for SqliteDriver {
    #[instrument(name = "SqliteDriver::query", skip(self, params))]
    async fn query(&self, sql: &str, params: &[Value]) -> Result<ResultSet, DatabaseError> {
        let params = to_params(params)?;
        let sql = sql.to_string();
        self.with_connection(move |conn| query(conn, &sql, params))
            .await
    }

    #[instrument(name = "SqliteDriver::exec", skip(self, params))]
    async fn exec(&self, sql: &str, params: &[Value]) -> Result<ExecResult, DatabaseError> {
        let params = to_params(params)?;
        let sql = sql.to_string();
        self.with_connection(move |conn| exec(conn, &sql, params))
            .await
    }
}

#[async_trait]
impl SqlDriver for SqliteDriver {
    fn dialect(&self) -> &dyn Dialect {
        &Sqlite
    }

    async fn begin(&self) -> Result<Box<dyn DriverTransaction>, DatabaseError> {
        let conn = self.conn.clone().lock_owned().await;
        let (conn, result) = run_blocking(conn, |conn| conn.execute_batch("BEGIN")).await?;
        result.map_err(DatabaseError::delegate)?;

        debug!(path = %self.path, "Began SQLite transaction");
        Ok(Box::new(SqliteTransaction {
            path: self.path.clone(),
            conn: Mutex::new(Some(conn)),
        }))
    }
}

/// A transaction that owns the driver's connection until it commits or rolls back
struct SqliteTransaction {
    path: String,
    /// Empty once the transaction has ended
    conn: Mutex<Option<ConnectionGuard>>,
}

impl SqliteTransaction {
    async fn run<T, F>(&self, work: F) -> Result<T, DatabaseError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let mut slot = self.conn.lock().await;
        let conn = slot.take().ok_or_else(|| {
            DatabaseError::Transaction(format!("the transaction on {} has ended", self.path))
        })?;
        let (conn, result) = run_blocking(conn, work).await?;
        *slot = Some(conn);
        result.map_err(DatabaseError::delegate)
    }

    fn release(&mut self) {
        self.conn.get_mut().take();
    }
}

#[async_trait]
impl SqlConnection for SqliteTransaction {
    async fn query(&self, sql: &str, params: &[Value]) -> Result<ResultSet, DatabaseError> {
        let params = to_params(params)?;
        let sql = sql.to_string();
        self.run(move |conn| query(conn, &sql, params)).await
    }

    async fn exec(&self, sql: &str, params: &[Value]) -> Result<ExecResult, DatabaseError> {
        let params = to_params(params)?;
        let sql = sql.to_string();
        self.run(move |conn| exec(conn, &sql, params)).await
    }
}

#[async_trait]
impl DriverTransaction for SqliteTransaction {
    /// A failed commit keeps the connection so the transaction can still be rolled back
    async fn commit(&mut self) -> Result<(), DatabaseError> {
        self.run(|conn| conn.execute_batch("COMMIT")).await?;
        self.release();
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), DatabaseError> {
        let result = self.run(|conn| conn.execute_batch("ROLLBACK")).await;
        self.release();
        result
    }
}

impl Drop for SqliteTransaction {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.get_mut().take() {
            warn!(path = %self.path, "SQLite transaction dropped while open, rolling back");
            if let Err(e) = conn.execute_batch("ROLLBACK") {
                error!(path = %self.path, %e, "Failed to roll back a dropped transaction");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use goradd_orm::config::MapEnvironment;

    use super::*;

    #[test]
    fn path_comes_from_the_environment() {
        let driver = SqliteDriver::from_env(&MapEnvironment::new()).unwrap();
        assert_eq!(driver.path(), IN_MEMORY);
    }

    #[tokio::test]
    async fn statements_round_trip() {
        let driver = SqliteDriver::open_in_memory().unwrap();
        driver
            .execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT, flag INTEGER)")
            .await
            .unwrap();

        let result = driver
            .exec(
                "INSERT INTO t (name, flag) VALUES (?, ?)",
                &[Value::from("a"), Value::from(true)],
            )
            .await
            .unwrap();
        assert_eq!(result.rows_affected, 1);
        assert_eq!(result.last_insert_id, Some(1));

        let rows = driver
            .query(r#"SELECT "id", "name", "flag" FROM t"#, &[])
            .await
            .unwrap();
        assert_eq!(rows.columns, ["id", "name", "flag"]);
        assert_eq!(
            rows.rows,
            [vec![Value::Int(1), Value::from("a"), Value::Int(1)]]
        );
    }

    #[tokio::test]
    async fn rolled_back_statements_are_discarded() {
        let driver = SqliteDriver::open_in_memory().unwrap();
        driver
            .execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY)")
            .await
            .unwrap();

        let mut transaction = driver.begin().await.unwrap();
        transaction
            .exec("INSERT INTO t DEFAULT VALUES", &[])
            .await
            .unwrap();
        transaction.rollback().await.unwrap();

        let rows = driver.query("SELECT COUNT(*) FROM t", &[]).await.unwrap();
        assert_eq!(rows.scalar(), Some(&Value::Int(0)));
    }

    #[tokio::test]
    async fn transactions_hold_the_connection() {
        let driver = SqliteDriver::open_in_memory().unwrap();
        driver
            .execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY)")
            .await
            .unwrap();

        let mut transaction = driver.begin().await.unwrap();
        transaction
            .exec("INSERT INTO t DEFAULT VALUES", &[])
            .await
            .unwrap();

        let outside = driver.clone();
        let count = tokio::spawn(async move { outside.query("SELECT COUNT(*) FROM t", &[]).await });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!count.is_finished());

        transaction.rollback().await.unwrap();
        let rows = count.await.unwrap().unwrap();
        assert_eq!(rows.scalar(), Some(&Value::Int(0)));
    }

    #[tokio::test]
    async fn dropped_transactions_roll_back() {
        let driver = SqliteDriver::open_in_memory().unwrap();
        driver
            .execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY)")
            .await
            .unwrap();

        let transaction = driver.begin().await.unwrap();
        transaction
            .exec("INSERT INTO t DEFAULT VALUES", &[])
            .await
            .unwrap();
        drop(transaction);

        let rows = driver.query("SELECT COUNT(*) FROM t", &[]).await.unwrap();
        assert_eq!(rows.scalar(), Some(&Value::Int(0)));
        let mut transaction = driver.begin().await.unwrap();
        transaction.commit().await.unwrap();
    }

    #[tokio::test]
    async fn errors_are_reported() {
        let driver = SqliteDriver::open_in_memory().unwrap();
        assert!(driver.query("SELECT * FROM missing", &[]).await.is_err());
    }
}
