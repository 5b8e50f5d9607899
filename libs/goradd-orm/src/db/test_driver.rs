// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

#![cfg(test)]

//! A driver that records statements and replays canned results.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;

use super::{DriverTransaction, ExecResult, SqlConnection, SqlDriver};
use crate::{
    DatabaseError, Value,
    sql::{Dialect, Sqlite},
    unpack::ResultSet,
};

#[derive(Debug, Default)]
pub(crate) struct MockState {
    /// Statements in the order they ran, with `BEGIN`, `COMMIT` and `ROLLBACK` for transactions
    pub statements: Vec<(String, Vec<Value>)>,
    pub results: VecDeque<ResultSet>,
    pub last_insert_id: i64,
    pub fail_commits: bool,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct MockDriver {
    pub state: Arc<Mutex<MockState>>,
}

impl MockDriver {
    pub fn push_result(&self, result: ResultSet) {
        self.state.lock().unwrap().results.push_back(result);
    }

    pub fn fail_commits(&self) {
        self.state.lock().unwrap().fail_commits = true;
    }

    pub fn statements(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.statements.iter().map(|(s, _)| s.clone()).collect()
    }

    pub fn params(&self, index: usize) -> Vec<Value> {
        self.state.lock().unwrap().statements[index].1.clone()
    }

    fn log(&self, sql: &str, params: &[Value]) {
        let mut state = self.state.lock().unwrap();
        state.statements.push((sql.to_string(), params.to_vec()));
    }
}

#[async_trait]
impl SqlConnection for MockDriver {
    async fn query(&self, sql: &str, params: &[Value]) -> Result<ResultSet, DatabaseError> {
        self.log(sql, params);
        let mut state = self.state.lock().unwrap();
        Ok(state.results.pop_front().unwrap_or_default())
    }

    async fn exec(&self, sql: &str, params: &[Value]) -> Result<ExecResult, DatabaseError> {
        self.log(sql, params);
        let mut state = self.state.lock().unwrap();
        state.last_insert_id += 1;
        Ok(ExecResult {
            rows_affected: 1,
            last_insert_id: Some(state.last_insert_id),
        })
    }
}

#[async_trait]
impl SqlDriver for MockDriver {
    fn dialect(&self) -> &dyn Dialect {
        &Sqlite
    }

    async fn begin(&self) -> Result<Box<dyn DriverTransaction>, DatabaseError> {
        self.log("BEGIN", &[]);
        Ok(Box::new(MockTransaction {
            driver: self.clone(),
        }))
    }
}

struct MockTransaction {
    driver: MockDriver,
}

#[async_trait]
impl SqlConnection for MockTransaction {
    async fn query(&self, sql: &str, params: &[Value]) -> Result<ResultSet, DatabaseError> {
        self.driver.query(sql, params).await
    }

    async fn exec(&self, sql: &str, params: &[Value]) -> Result<ExecResult, DatabaseError> {
        self.driver.exec(sql, params).await
    }
}

#[async_trait]
impl DriverTransaction for MockTransaction {
    async fn commit(&mut self) -> Result<(), DatabaseError> {
        self.driver.log("COMMIT", &[]);
        if self.driver.state.lock().unwrap().fail_commits {
            return Err(DatabaseError::Transaction("commit refused".to_string()));
        }
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), DatabaseError> {
        self.driver.log("ROLLBACK", &[]);
        Ok(())
    }
}
