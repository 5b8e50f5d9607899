// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use super::Dialect;
use crate::Value;

pub struct SQLBuilder<'d> {
    /// The SQL being built with placeholders for each parameter
    sql: String,
    /// The list of parameters
    params: Vec<Value>,
    dialect: &'d dyn Dialect,
}

impl<'d> SQLBuilder<'d> {
    pub fn new(dialect: &'d dyn Dialect) -> Self {
        Self {
            sql: String::new(),
            params: Vec::new(),
            dialect,
        }
    }

    pub fn dialect(&self) -> &'d dyn Dialect {
        self.dialect
    }

    /// Push a string
    pub fn push_str<T: AsRef<str>>(&mut self, s: T) {
        self.sql.push_str(s.as_ref());
    }

    /// Push a character
    pub fn push(&mut self, c: char) {
        self.sql.push(c);
    }

    /// Push an identifier (table name, column name or alias), quoted the way the dialect
    /// requires.
    pub fn push_identifier<T: AsRef<str>>(&mut self, s: T) {
        let (open, close) = self.dialect.identifier_quotes();
        self.sql.push(open);
        self.sql.push_str(s.as_ref());
        self.sql.push(close);
    }

    /// Push `<table_alias>.<column_name>`
    pub fn push_column(&mut self, table_alias: &str, column_name: &str) {
        self.push_identifier(table_alias);
        self.push('.');
        self.push_identifier(column_name);
    }

    pub fn push_space(&mut self) {
        self.sql.push(' ');
    }

    /// Push a parameter, which will be replaced with a placeholder in the SQL string and added to
    /// the list of parameters.
    pub fn push_param(&mut self, param: Value) {
        self.params.push(param);
        let placeholder = self.dialect.placeholder(self.params.len());
        self.push_str(placeholder);
    }

    /// Push elements of an iterator, separated by `sep`.
    pub fn push_iter<T>(
        &mut self,
        iter: impl ExactSizeIterator<Item = T>,
        sep: &str,
        mut push_elem: impl FnMut(&mut Self, T),
    ) {
        let len = iter.len();
        for (i, item) in iter.enumerate() {
            push_elem(self, item);

            if i < len - 1 {
                self.sql.push_str(sep);
            }
        }
    }

    /// Get the SQL string and the list of parameters. Calling this method should be the final step
    /// in building an SQL expression, and thus this builder consumes the `self`.
    pub fn into_sql(self) -> (String, Vec<Value>) {
        (self.sql, self.params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::dialect::{MySql, Postgres};

    #[test]
    fn placeholders_follow_dialect() {
        let mut builder = SQLBuilder::new(&Postgres);
        builder.push_column("t_0", "id");
        builder.push_str(" IN (");
        builder.push_iter([1, 2].into_iter(), ", ", |b, v| b.push_param(Value::from(v)));
        builder.push(')');
        assert_binding!(builder.into_sql(), r#""t_0"."id" IN ($1, $2)"#, 1, 2);

        let mut builder = SQLBuilder::new(&MySql);
        builder.push_column("t_0", "id");
        builder.push_str(" = ");
        builder.push_param(Value::from("x"));
        assert_binding!(builder.into_sql(), "`t_0`.`id` = ?", "x");
    }
}
