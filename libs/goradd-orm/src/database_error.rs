// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Failed to execute transaction {0}")]
    Transaction(String),

    #[error("Validation: {0}")]
    Validation(String),

    /// The driver returned a value that cannot be read as the column's type. This indicates a
    /// mismatch between the model and the database.
    #[error("Cannot read {found} as {expected}")]
    Coercion { expected: String, found: String },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Delegate: {0}")]
    Delegate(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),

    #[error("{0} {1}")]
    WithContext(String, #[source] Box<DatabaseError>),
}

impl DatabaseError {
    pub fn with_context(self, context: String) -> DatabaseError {
        DatabaseError::WithContext(context, Box::new(self))
    }

    pub fn delegate(error: impl std::error::Error + Send + Sync + 'static) -> DatabaseError {
        DatabaseError::Delegate(Box::new(error))
    }

    pub(crate) fn coercion(expected: impl Into<String>, found: impl std::fmt::Debug) -> Self {
        DatabaseError::Coercion {
            expected: expected.into(),
            found: format!("{found:?}"),
        }
    }
}

pub trait WithContext {
    fn with_context(self, context: String) -> Self;
}

impl<T> WithContext for Result<T, DatabaseError> {
    fn with_context(self, context: String) -> Result<T, DatabaseError> {
        self.map_err(|e| e.with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_is_prepended() {
        let result: Result<(), DatabaseError> =
            Err(DatabaseError::Validation("bad input".to_string()));
        let err = result
            .with_context("SELECT 1".to_string())
            .expect_err("error expected");

        assert_eq!(err.to_string(), "SELECT 1 Validation: bad input");
    }
}
