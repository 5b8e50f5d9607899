// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use goradd_orm::{
    DatabaseError,
    config::{
        Environment,
        env_const::{GORADD_CONNECTION_POOL_SIZE, GORADD_POSTGRES_URL},
    },
};

const DEFAULT_POOL_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgConfig {
    pub url: String,
    pub pool_size: usize,
}

impl PgConfig {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            pool_size: DEFAULT_POOL_SIZE,
        }
    }

    pub fn from_env(env: &dyn Environment) -> Result<Self, DatabaseError> {
        let url = env.get(GORADD_POSTGRES_URL).ok_or_else(|| {
            DatabaseError::Config(format!("Env {GORADD_POSTGRES_URL} must be provided"))
        })?;
        let pool_size = env
            .get_usize(GORADD_CONNECTION_POOL_SIZE, DEFAULT_POOL_SIZE)
            .map_err(|e| DatabaseError::Config(e.to_string()))?;

        Ok(Self { url, pool_size })
    }
}
