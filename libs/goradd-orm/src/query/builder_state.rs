// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use indexmap::IndexMap;

use crate::node::{Node, SubqueryNode, op};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit {
    pub max: u64,
    pub offset: u64,
}

/// Everything a query has been told so far. The state carries no SQL; the join tree and the
/// generator turn it into a statement when a terminal method is called.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BuilderState {
    pub(crate) root: Option<Node>,
    pub(crate) joins: Vec<Node>,
    pub(crate) order_bys: Vec<Node>,
    pub(crate) condition: Option<Node>,
    pub(crate) distinct: bool,
    pub(crate) aliases: IndexMap<String, Node>,
    pub(crate) group_bys: Vec<Node>,
    pub(crate) selects: Vec<Node>,
    pub(crate) limit: Option<Limit>,
    pub(crate) having: Option<Node>,
    pub(crate) is_subquery: bool,
}

impl BuilderState {
    pub fn new() -> Self {
        Self::default()
    }

    /// A builder rooted at `table`
    pub fn with_root(table: Node) -> Self {
        assert!(
            matches!(table, Node::Table(_)),
            "a query must be rooted at a table, not {table}"
        );
        Self {
            root: Some(table),
            ..Self::default()
        }
    }

    /// Wrap this builder in a node that is emitted as a nested `SELECT`
    pub fn subquery(mut self) -> Node {
        self.is_subquery = true;
        Node::Subquery(SubqueryNode {
            state: Box::new(self),
        })
    }

    /// The table the query is rooted at: the explicit root, or else the root of the first node
    /// that has one.
    pub fn root(&self) -> Option<&Node> {
        if let Some(root) = &self.root {
            return Some(root);
        }

        let mut nodes = vec![];
        for node in self.nodes() {
            node.atomic_nodes(&mut nodes);
        }
        nodes.into_iter().find_map(Node::root)
    }

    /// Every node held directly by the builder
    pub(crate) fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.joins
            .iter()
            .chain(&self.selects)
            .chain(&self.group_bys)
            .chain(&self.order_bys)
            .chain(self.condition.iter())
            .chain(self.having.iter())
            .chain(self.aliases.values())
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    pub fn limit_info(&self) -> Option<Limit> {
        self.limit
    }

    /// Nodes used in conditions, ordering and aliases may refer to an enclosing query when the
    /// builder is a subquery, so only joined, selected and grouped nodes are checked here.
    fn check_root(&mut self, node: &Node) {
        let mut atomic = vec![];
        node.atomic_nodes(&mut atomic);

        for node_root in atomic.into_iter().filter_map(Node::root) {
            match self.root() {
                Some(root) if root != node_root => {
                    panic!("cannot use {node} in a query of {root}; use a subquery to query another table")
                }
                Some(_) => {}
                None => self.root = Some(node_root.clone()),
            }
        }
    }

    pub(crate) fn add_join(&mut self, node: Node, condition: Option<Node>) {
        if !node.is_table_family() {
            panic!("only table nodes can be joined, not {node}");
        }
        self.check_root(&node);
        if matches!(node, Node::Table(_)) {
            return;
        }

        let node = match condition {
            None => node,
            Some(condition) => {
                let combined = match node.join_options().and_then(|j| j.condition.as_deref()) {
                    Some(existing) => op::and([existing.clone(), condition]),
                    None => condition,
                };
                node.with_condition(combined)
            }
        };
        self.joins.push(node);
    }
}

/// The fluent interface shared by [`BuilderState`] and [`QueryBuilder`](super::QueryBuilder).
///
/// Misuse (for example selecting a non-column node, or grouping a query that already has a
/// select list) is a programming error and panics.
pub trait Builder: Sized {
    fn state_mut(&mut self) -> &mut BuilderState;

    /// Join the table `node` leads to, so its columns are loaded
    fn join(mut self, node: Node) -> Self {
        self.state_mut().add_join(node, None);
        self
    }

    /// Join with an extra condition, ANDed with any condition already on the node
    fn join_on(mut self, node: Node, condition: Node) -> Self {
        self.state_mut().add_join(node, Some(condition));
        self
    }

    /// Join a reverse or many-many reference and produce one result per child
    fn expand(mut self, node: Node) -> Self {
        self.state_mut().add_join(node.expand(), None);
        self
    }

    /// Add a condition, ANDed with the existing conditions
    fn condition(mut self, condition: Node) -> Self {
        let state = self.state_mut();
        state.condition = Some(match state.condition.take() {
            Some(existing) => op::and([existing, condition]),
            None => condition,
        });
        self
    }

    fn having(mut self, condition: Node) -> Self {
        self.state_mut().having = Some(condition);
        self
    }

    fn order_by(mut self, nodes: impl IntoIterator<Item = Node>) -> Self {
        let state = self.state_mut();
        state.order_bys.extend(nodes);
        self
    }

    fn group_by(mut self, nodes: impl IntoIterator<Item = Node>) -> Self {
        let state = self.state_mut();
        if !state.selects.is_empty() {
            panic!("a query cannot both select and group by");
        }
        for node in nodes {
            state.check_root(&node);
            state.group_bys.push(node);
        }
        self
    }

    /// Load only these columns (plus the primary keys needed to assemble the results)
    fn select(mut self, nodes: impl IntoIterator<Item = Node>) -> Self {
        let state = self.state_mut();
        if !state.group_bys.is_empty() {
            panic!("a query cannot both select and group by");
        }
        for node in nodes {
            if !matches!(node, Node::Column(_)) {
                panic!("only columns can be selected, not {node}; use an alias for computed values");
            }
            state.check_root(&node);
            state.selects.push(node);
        }
        self
    }

    fn limit(mut self, max: u64, offset: u64) -> Self {
        let state = self.state_mut();
        if state.limit.is_some() {
            panic!("the limit of a query can only be set once");
        }
        state.limit = Some(Limit { max, offset });
        self
    }

    /// Compute `node` for every result and return it under `name` in the aliases of the record
    fn alias(mut self, name: &str, node: Node) -> Self {
        let state = self.state_mut();
        state.aliases.insert(name.to_string(), node);
        self
    }

    fn distinct(mut self) -> Self {
        self.state_mut().distinct = true;
        self
    }
}

impl Builder for BuilderState {
    fn state_mut(&mut self) -> &mut BuilderState {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::test_helper::sample_model;

    #[test]
    fn root_comes_from_first_node() {
        let model = sample_model();
        let state = BuilderState::new().join(model.node("project.manager"));
        assert_eq!(state.root(), Some(&model.node("project")));
    }

    #[test]
    fn join_conditions_are_combined() {
        let model = sample_model();
        let a = op::eq(model.node("project.manager.first_name"), "A");
        let b = op::eq(model.node("project.manager.last_name"), "B");
        let state = BuilderState::new().join_on(
            model.node("project.manager").with_condition(a.clone()),
            b.clone(),
        );

        let condition = state.joins[0]
            .join_options()
            .and_then(|j| j.condition.as_deref())
            .cloned();
        assert_eq!(condition, Some(op::and([a, b])));
    }

    #[test]
    fn conditions_are_anded() {
        let model = sample_model();
        let a = op::eq(model.node("person.first_name"), "A");
        let b = op::eq(model.node("person.last_name"), "B");
        let state = BuilderState::new().condition(a.clone()).condition(b.clone());
        assert_eq!(state.condition, Some(op::and([a, b])));
    }

    #[test]
    #[should_panic(expected = "use a subquery")]
    fn different_roots_are_rejected() {
        let model = sample_model();
        let _ = BuilderState::new()
            .join(model.node("project.manager"))
            .select([model.node("person.first_name")]);
    }

    #[test]
    #[should_panic(expected = "both select and group by")]
    fn select_after_group_by() {
        let model = sample_model();
        let _ = BuilderState::new()
            .group_by([model.node("project.status_id")])
            .select([model.node("project.name")]);
    }

    #[test]
    #[should_panic(expected = "only columns can be selected")]
    fn select_requires_columns() {
        let model = sample_model();
        let _ = BuilderState::new().select([model.node("project.manager")]);
    }

    #[test]
    #[should_panic(expected = "only be set once")]
    fn limit_once() {
        let _ = BuilderState::new().limit(10, 0).limit(5, 0);
    }

    #[test]
    #[should_panic(expected = "only table nodes can be joined")]
    fn join_requires_table_node() {
        let model = sample_model();
        let _ = BuilderState::new().join(model.node("project.name"));
    }
}
