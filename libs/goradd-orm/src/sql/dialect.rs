// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The differences between SQL databases that matter to the generator.

/// A piece of a date arithmetic expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePiece {
    Sql(&'static str),
    Date,
    Seconds,
}

pub trait Dialect: Send + Sync {
    fn name(&self) -> &'static str;

    /// Opening and closing quote characters for identifiers
    fn identifier_quotes(&self) -> (char, char) {
        ('"', '"')
    }

    /// The placeholder of the parameter at `position` (starting at 1)
    fn placeholder(&self, _position: usize) -> String {
        "?".to_string()
    }

    fn supports_xor(&self) -> bool {
        false
    }

    /// Whether an insert can return the generated primary key with `RETURNING`. Otherwise the
    /// driver reports the id of the inserted row.
    fn supports_returning(&self) -> bool {
        false
    }

    /// Whether a delete through joins names the table to delete from (`DELETE t_0 FROM ...`).
    /// Dialects that don't delete the primary keys selected by a nested query instead.
    fn delete_uses_alias(&self) -> bool {
        false
    }

    /// How to add seconds to a date-time, or `None` if unsupported
    fn date_add_seconds(&self) -> Option<&'static [DatePiece]> {
        None
    }

    fn limit_clause(&self, max: u64, offset: u64) -> String {
        if offset == 0 {
            format!("LIMIT {max}")
        } else {
            format!("LIMIT {max} OFFSET {offset}")
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

impl Dialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn placeholder(&self, position: usize) -> String {
        format!("${position}")
    }

    fn supports_returning(&self) -> bool {
        true
    }

    fn date_add_seconds(&self) -> Option<&'static [DatePiece]> {
        Some(&[
            DatePiece::Sql("("),
            DatePiece::Date,
            DatePiece::Sql(" + ("),
            DatePiece::Seconds,
            DatePiece::Sql(") * INTERVAL '1 second')"),
        ])
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MySql;

impl Dialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn identifier_quotes(&self) -> (char, char) {
        ('`', '`')
    }

    fn supports_xor(&self) -> bool {
        true
    }

    fn delete_uses_alias(&self) -> bool {
        true
    }

    fn date_add_seconds(&self) -> Option<&'static [DatePiece]> {
        Some(&[
            DatePiece::Sql("DATE_ADD("),
            DatePiece::Date,
            DatePiece::Sql(", INTERVAL ("),
            DatePiece::Seconds,
            DatePiece::Sql(") SECOND)"),
        ])
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Sqlite;

impl Dialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn date_add_seconds(&self) -> Option<&'static [DatePiece]> {
        Some(&[
            DatePiece::Sql("datetime("),
            DatePiece::Date,
            DatePiece::Sql(", '+' || ("),
            DatePiece::Seconds,
            DatePiece::Sql(") || ' seconds')"),
        ])
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServer;

impl Dialect for SqlServer {
    fn name(&self) -> &'static str {
        "sqlserver"
    }

    fn identifier_quotes(&self) -> (char, char) {
        ('[', ']')
    }

    fn delete_uses_alias(&self) -> bool {
        true
    }

    fn date_add_seconds(&self) -> Option<&'static [DatePiece]> {
        Some(&[
            DatePiece::Sql("DATEADD(second, "),
            DatePiece::Seconds,
            DatePiece::Sql(", "),
            DatePiece::Date,
            DatePiece::Sql(")"),
        ])
    }

    fn limit_clause(&self, max: u64, offset: u64) -> String {
        format!("OFFSET {offset} ROWS FETCH NEXT {max} ROWS ONLY")
    }
}
