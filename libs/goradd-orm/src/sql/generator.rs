// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use super::{
    DatePiece, Dialect, SQLBuilder,
    join_tree::{ItemId, JoinItem, JoinKind, JoinTree, Purpose},
};
use crate::{
    Model, Value,
    node::{Node, OperationNode, Operator, ValueNode, op, operation::Notation},
    query::BuilderState,
};

const COUNT_ALIAS: &str = "count_";

/// Writes the statements for one builder. Subqueries are written by the same generator, so they
/// share its parameter list and number their aliases after the enclosing query's.
pub(crate) struct SqlGenerator<'a> {
    model: &'a Model,
    builder: SQLBuilder<'a>,
    /// The tree of the query being written, preceded by the trees of the queries enclosing it
    trees: Vec<JoinTree>,
    subquery_count: usize,
}

/// The `SELECT` statement loading the records described by `state`
pub fn select_statement(
    model: &Model,
    dialect: &dyn Dialect,
    state: &BuilderState,
) -> (String, Vec<Value>) {
    let (_, sql, params) = SqlGenerator::new(model, dialect).select(state);
    (sql, params)
}

pub fn count_statement(
    model: &Model,
    dialect: &dyn Dialect,
    state: &BuilderState,
    distinct: bool,
    nodes: &[Node],
) -> (String, Vec<Value>) {
    SqlGenerator::new(model, dialect).count(state, distinct, nodes)
}

pub fn delete_statement(
    model: &Model,
    dialect: &dyn Dialect,
    state: &BuilderState,
) -> (String, Vec<Value>) {
    SqlGenerator::new(model, dialect).delete(state)
}

impl<'a> SqlGenerator<'a> {
    pub fn new(model: &'a Model, dialect: &'a dyn Dialect) -> Self {
        Self {
            model,
            builder: SQLBuilder::new(dialect),
            trees: vec![],
            subquery_count: 0,
        }
    }

    /// Returns the join tree along with the statement, for unpacking the rows it produces
    pub fn select(mut self, state: &BuilderState) -> (JoinTree, String, Vec<Value>) {
        let tree = JoinTree::new(self.model, state, Purpose::Select, "", &[]);
        if state.limit.is_some() {
            if let Some(item) = tree.has_loaded_array() {
                panic!(
                    "{} loads an array of records and cannot be combined with a limit; expand it or use a subquery",
                    item.node
                );
            }
        }

        self.trees.push(tree);
        self.push_select(state, true);
        let tree = self.trees.pop().unwrap_or_else(|| unreachable!());
        let (sql, params) = self.builder.into_sql();
        (tree, sql, params)
    }

    /// A grouped or distinct query counts the rows of the query itself. Otherwise the matching
    /// rows of the root table are counted, restricted to those where `nodes` are not null.
    pub fn count(mut self, state: &BuilderState, distinct: bool, nodes: &[Node]) -> (String, Vec<Value>) {
        let mut state = state.clone();
        state.order_bys.clear();
        state.limit = None;

        if !state.group_bys.is_empty() || state.distinct {
            let tree = JoinTree::new(self.model, &state, Purpose::Select, "", &[]);
            self.trees.push(tree);
            self.builder.push_str("SELECT COUNT(*) FROM (");
            self.push_select(&state, false);
            self.builder.push_str(") AS ");
            self.builder.push_identifier("q");
        } else {
            state.aliases.clear();
            state
                .aliases
                .insert(COUNT_ALIAS.to_string(), op::count(distinct, nodes.to_vec()));
            let tree = JoinTree::new(self.model, &state, Purpose::Count, "", &[]);
            self.trees.push(tree);
            self.push_select(&state, false);
        }

        self.builder.into_sql()
    }

    pub fn delete(mut self, state: &BuilderState) -> (String, Vec<Value>) {
        let tree = JoinTree::new(self.model, state, Purpose::Delete, "", &[]);
        let root = tree.root().clone();
        self.trees.push(tree);

        if self.builder.dialect().delete_uses_alias() {
            self.builder.push_str("DELETE ");
            self.builder.push_identifier(&root.alias);
            self.push_from();
            self.push_clauses(state, true);
        } else {
            self.builder.push_str("DELETE FROM ");
            self.builder.push_identifier(&root.table);
            self.builder.push_str(" WHERE ");
            self.builder.push_identifier(&root.pk);
            self.builder.push_str(" IN (SELECT ");
            self.builder.push_column(&root.alias, &root.pk);
            self.push_from();
            self.push_clauses(state, true);
            self.builder.push(')');
        }

        self.builder.into_sql()
    }

    fn tree(&self) -> &JoinTree {
        // Every statement pushes its tree before writing
        &self.trees[self.trees.len() - 1]
    }

    fn push_select(&mut self, state: &BuilderState, order_and_limit: bool) {
        self.builder.push_str("SELECT ");
        if state.distinct {
            self.builder.push_str("DISTINCT ");
        }

        let columns: Vec<(String, String, String)> = self
            .tree()
            .selected_leaves()
            .map(|(item, leaf)| (item.alias.clone(), leaf.column.clone(), leaf.alias.clone()))
            .collect();
        let has_columns = !columns.is_empty();
        self.builder
            .push_iter(columns.into_iter(), ", ", |builder, (table, column, alias)| {
                builder.push_column(&table, &column);
                builder.push_str(" AS ");
                builder.push_identifier(alias);
            });

        for (i, (name, node)) in state.aliases.iter().enumerate() {
            if has_columns || i > 0 {
                self.builder.push_str(", ");
            }
            self.push_node(node);
            self.builder.push_str(" AS ");
            self.builder.push_identifier(name);
        }

        self.push_from();
        self.push_clauses(state, order_and_limit);
    }

    fn push_from(&mut self) {
        let root = self.tree().root();
        let (table, alias) = (root.table.clone(), root.alias.clone());
        self.builder.push_str(" FROM ");
        self.builder.push_identifier(table);
        self.builder.push_str(" AS ");
        self.builder.push_identifier(alias);
        self.push_joins(0);
    }

    fn push_joins(&mut self, parent: ItemId) {
        let children = self.tree().items[parent].children.clone();
        for child in children {
            let parent_item = self.tree().items[parent].clone();
            let item = self.tree().items[child].clone();
            self.push_join(&parent_item, &item);
            self.push_joins(child);
        }
    }

    fn push_join(&mut self, parent: &JoinItem, item: &JoinItem) {
        match &item.kind {
            JoinKind::Root => unreachable!("the root is not joined"),
            JoinKind::Reference {
                column,
                referenced_column,
            } => {
                self.push_left_join(&item.table, &item.alias);
                self.builder.push_column(&parent.alias, column);
                self.builder.push_str(" = ");
                self.builder.push_column(&item.alias, referenced_column);
            }
            JoinKind::Reverse {
                column,
                foreign_key,
                ..
            } => {
                self.push_left_join(&item.table, &item.alias);
                self.builder.push_column(&parent.alias, column);
                self.builder.push_str(" = ");
                self.builder.push_column(&item.alias, foreign_key);
            }
            JoinKind::ManyMany {
                assn_table,
                assn_column,
                is_enum: true,
                ..
            } => {
                self.push_left_join(assn_table, &item.alias);
                self.builder.push_column(&parent.alias, &parent.pk);
                self.builder.push_str(" = ");
                self.builder.push_column(&item.alias, assn_column);
            }
            JoinKind::ManyMany {
                assn_table,
                assn_column,
                associated_column,
                associated_pk,
                is_enum: false,
            } => {
                let assn_alias = item.assn_alias();
                self.push_left_join(assn_table, &assn_alias);
                self.builder.push_column(&parent.alias, &parent.pk);
                self.builder.push_str(" = ");
                self.builder.push_column(&assn_alias, assn_column);

                self.push_left_join(&item.table, &item.alias);
                self.builder.push_column(&assn_alias, associated_column);
                self.builder.push_str(" = ");
                self.builder.push_column(&item.alias, associated_pk);
            }
        }

        if let Some(condition) = &item.condition {
            self.builder.push_str(" AND ");
            self.push_node(condition);
        }
    }

    fn push_left_join(&mut self, table: &str, alias: &str) {
        self.builder.push_str(" LEFT JOIN ");
        self.builder.push_identifier(table);
        self.builder.push_str(" AS ");
        self.builder.push_identifier(alias);
        self.builder.push_str(" ON ");
    }

    fn push_clauses(&mut self, state: &BuilderState, order_and_limit: bool) {
        if let Some(condition) = &state.condition {
            self.builder.push_str(" WHERE ");
            self.push_node(condition);
        }
        if !state.group_bys.is_empty() {
            self.builder.push_str(" GROUP BY ");
            self.push_nodes(&state.group_bys, ", ");
        }
        if let Some(having) = &state.having {
            self.builder.push_str(" HAVING ");
            self.push_node(having);
        }
        if !order_and_limit {
            return;
        }
        if !state.order_bys.is_empty() {
            self.builder.push_str(" ORDER BY ");
            for (i, node) in state.order_bys.iter().enumerate() {
                if i > 0 {
                    self.builder.push_str(", ");
                }
                self.push_node(node);
                if node.is_descending() {
                    self.builder.push_str(" DESC");
                }
            }
        }
        if let Some(limit) = state.limit {
            let clause = self.builder.dialect().limit_clause(limit.max, limit.offset);
            self.builder.push(' ');
            self.builder.push_str(clause);
        }
    }

    fn push_nodes(&mut self, nodes: &[Node], sep: &str) {
        for (i, node) in nodes.iter().enumerate() {
            if i > 0 {
                self.builder.push_str(sep);
            }
            self.push_node(node);
        }
    }

    /// The join item a table-family node leads to, searching enclosing queries last
    fn locate(&self, node: &Node) -> &JoinItem {
        self.trees
            .iter()
            .rev()
            .find_map(|tree| tree.find(node).map(|id| &tree.items[id]))
            .unwrap_or_else(|| panic!("{node} is not part of the query"))
    }

    fn push_node(&mut self, node: &Node) {
        match node {
            Node::Column(column) => {
                let alias = self.locate(&column.parent).alias.clone();
                self.builder.push_column(&alias, &column.column);
            }
            Node::Reference(reference) => {
                let alias = self.locate(&reference.parent).alias.clone();
                self.builder.push_column(&alias, &reference.column);
            }
            Node::Table(_) | Node::ReverseReference(_) | Node::ManyMany(_) => {
                let item = self.locate(node);
                let (alias, pk) = (item.alias.clone(), item.pk.clone());
                self.builder.push_column(&alias, &pk);
            }
            Node::Value(ValueNode::Scalar(value)) => self.builder.push_param(value.clone()),
            Node::Value(ValueNode::List(nodes)) => {
                self.builder.push('(');
                self.push_nodes(nodes, ", ");
                self.builder.push(')');
            }
            Node::Operation(operation) => self.push_operation(operation),
            Node::Alias(alias) => {
                if !self.tree().alias_names.contains(&alias.name) {
                    panic!("the query has no alias {}", alias.name);
                }
                self.builder.push_identifier(&alias.name);
            }
            Node::Subquery(subquery) => {
                self.builder.push('(');
                self.push_subquery(&subquery.state);
                self.builder.push(')');
            }
        }
    }

    fn push_subquery(&mut self, state: &BuilderState) {
        self.subquery_count += 1;
        let prefix = format!("{}_", self.subquery_count);
        let tree = {
            let outer_roots: Vec<&Node> = self.trees.iter().map(|t| &t.root().node).collect();
            JoinTree::new(self.model, state, Purpose::Select, &prefix, &outer_roots)
        };

        self.trees.push(tree);
        self.push_select(state, true);
        self.trees.pop();
    }

    fn push_operation(&mut self, operation: &OperationNode) {
        let operands = &operation.operands;
        match operation.op.notation() {
            Notation::Infix("XOR") if !self.builder.dialect().supports_xor() => {
                let [a, b] = operands.as_slice() else {
                    panic!("XOR takes two operands, not {}", operands.len())
                };
                self.builder.push_str("((");
                self.push_node(a);
                self.builder.push_str(" AND NOT ");
                self.push_node(b);
                self.builder.push_str(") OR (NOT ");
                self.push_node(a);
                self.builder.push_str(" AND ");
                self.push_node(b);
                self.builder.push_str("))");
            }
            Notation::Infix(op) => {
                self.builder.push('(');
                self.push_nodes(operands, &format!(" {op} "));
                self.builder.push(')');
            }
            Notation::Prefix(op) => {
                self.builder.push('(');
                self.builder.push_str(op);
                self.push_nodes(operands, ", ");
                self.builder.push(')');
            }
            Notation::Postfix(op) => {
                self.builder.push('(');
                self.push_nodes(operands, ", ");
                self.builder.push(' ');
                self.builder.push_str(op);
                self.builder.push(')');
            }
            Notation::Membership(op) => match &operands[1] {
                Node::Value(ValueNode::List(items)) if items.is_empty() => {
                    // Nothing is in an empty list
                    let constant = if operation.op == Operator::In {
                        "(1=0)"
                    } else {
                        "(1=1)"
                    };
                    self.builder.push_str(constant);
                }
                list @ (Node::Value(ValueNode::List(_)) | Node::Subquery(_)) => {
                    self.builder.push('(');
                    self.push_node(&operands[0]);
                    self.builder.push_str(&format!(" {op} "));
                    self.push_node(list);
                    self.builder.push(')');
                }
                other => {
                    self.builder.push('(');
                    self.push_node(&operands[0]);
                    self.builder.push_str(&format!(" {op} ("));
                    self.push_node(other);
                    self.builder.push_str("))");
                }
            },
            Notation::Like => {
                let Node::Value(ValueNode::Scalar(Value::String(text))) = &operands[1] else {
                    panic!("a pattern must be a string, not {}", operands[1])
                };
                let pattern = match operation.op {
                    Operator::StartsWith => format!("{text}%"),
                    Operator::EndsWith => format!("%{text}"),
                    _ => format!("%{text}%"),
                };
                self.builder.push('(');
                self.push_node(&operands[0]);
                self.builder.push_str(" LIKE ");
                self.builder.push_param(Value::String(pattern));
                self.builder.push(')');
            }
            Notation::Constant(constant) => {
                self.builder.push('(');
                self.builder.push_str(constant);
                self.builder.push(')');
            }
            Notation::Function => {
                self.builder
                    .push_str(operation.function.as_deref().unwrap_or_default());
                self.builder.push('(');
                if operation.distinct {
                    self.builder.push_str("DISTINCT ");
                }
                if operands.is_empty() && operation.is_aggregate() {
                    self.builder.push('*');
                } else {
                    self.push_nodes(operands, ", ");
                }
                self.builder.push(')');
            }
            Notation::DateAdd => {
                let dialect = self.builder.dialect();
                let Some(pieces) = dialect.date_add_seconds() else {
                    panic!("{} cannot add seconds to a date", dialect.name())
                };
                for piece in pieces {
                    match piece {
                        DatePiece::Sql(sql) => self.builder.push_str(sql),
                        DatePiece::Date => self.push_node(&operands[0]),
                        DatePiece::Seconds => self.push_node(&operands[1]),
                    }
                }
            }
        }
    }
}
