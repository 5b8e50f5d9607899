// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

#![cfg(test)]

//! Test assertion to check SQL statements and parameters.

/// Assert that a `(statement, parameters)` pair matches the expected statement and parameters.
///
/// # Usage:
/// ```no_run
/// assert_binding!(generated, r#"SELECT ... WHERE "t_0"."name" = ?"#, "Alice");
/// ```
///
/// Each expected parameter is converted with `Value::from`, so plain literals can be used.
macro_rules! assert_binding {
    ($actual:expr, $expected_stmt:expr) => {{
        let (actual_stmt, actual_params) = $actual;
        assert_eq!(actual_stmt, $expected_stmt);
        assert!(actual_params.is_empty(), "Extra actual parameters");
    }};
    ($actual:expr, $expected_stmt:expr, $($param:expr),+) => {{
        let (actual_stmt, actual_params) = $actual;
        assert_eq!(actual_stmt, $expected_stmt);
        let expected_params: Vec<$crate::Value> = vec![$($crate::Value::from($param)),+];
        assert_eq!(actual_params, expected_params, "Parameter mismatch");
    }};
}
