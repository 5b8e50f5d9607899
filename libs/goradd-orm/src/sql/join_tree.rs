// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The per-query tree of joined tables.
//!
//! Every table-family node a builder mentions is merged into one tree rooted at the query's
//! table. Equal nodes share one item, so mentioning `project.manager` twice joins `person` once.
//! The tree hands out the table and column aliases used by the generator, and tells the
//! unpacker how to fold result rows back into records.

use crate::{
    ColumnType, Model, Value,
    node::{ManyManyNode, Node, ReferenceNode, ReverseNode},
    query::BuilderState,
};

pub(crate) type ItemId = usize;

/// What a statement built from the tree is for. Counts and deletes never select every column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Purpose {
    Select,
    Count,
    Delete,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum JoinKind {
    Root,
    Reference {
        column: String,
        referenced_column: String,
    },
    Reverse {
        column: String,
        foreign_key: String,
        is_unique: bool,
    },
    ManyMany {
        assn_table: String,
        assn_column: String,
        associated_column: String,
        associated_pk: String,
        is_enum: bool,
    },
}

#[derive(Debug, Clone)]
pub(crate) struct Leaf {
    pub column: String,
    pub alias: String,
    pub column_type: ColumnType,
    pub is_pk: bool,
    pub nullable: bool,
    /// Stored in place of NULL for non-nullable columns
    pub zero: Value,
    position: usize,
}

#[derive(Debug, Clone)]
pub(crate) struct JoinItem {
    pub node: Node,
    pub kind: JoinKind,
    pub table: String,
    pub parent: Option<ItemId>,
    pub children: Vec<ItemId>,
    pub leaves: Vec<Leaf>,
    pub condition: Option<Node>,
    pub alias: String,
    pub expanded: bool,
    /// Explicitly joined or selected from, as opposed to only mentioned in a condition
    pub loaded: bool,
    /// The column identifying a row of this item
    pub pk: String,
    /// The key of this item's records inside the parent record
    pub key: String,
}

impl JoinItem {
    /// The alias of the association table of a many-many join
    pub fn assn_alias(&self) -> String {
        format!("{}a", self.alias)
    }

    pub fn is_array(&self) -> bool {
        match &self.kind {
            JoinKind::Reverse { is_unique, .. } => !is_unique && !self.expanded,
            JoinKind::ManyMany { .. } => !self.expanded,
            _ => false,
        }
    }

    pub fn is_enum(&self) -> bool {
        matches!(self.kind, JoinKind::ManyMany { is_enum: true, .. })
    }

    pub fn leaf(&self, column: &str) -> Option<&Leaf> {
        self.leaves.iter().find(|l| l.column == column)
    }

    pub fn pk_leaf(&self) -> Option<&Leaf> {
        self.leaf(&self.pk)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct JoinTree {
    pub items: Vec<JoinItem>,
    /// Names of the builder's aliases, in the order they are selected
    pub alias_names: Vec<String>,
    /// Rows cannot be told apart by primary key and each gets its own record
    pub fake_ids: bool,
    prefix: String,
}

impl JoinTree {
    /// Build the tree for `state`. `outer_roots` are the roots of the queries enclosing a
    /// subquery; nodes rooted there are left to the enclosing tree.
    pub fn new(
        model: &Model,
        state: &BuilderState,
        purpose: Purpose,
        prefix: &str,
        outer_roots: &[&Node],
    ) -> Self {
        let root = state
            .root()
            .unwrap_or_else(|| panic!("a query needs a table to select from"))
            .clone();
        let table = root
            .table_name()
            .unwrap_or_else(|| panic!("{root} is not a table"))
            .to_string();
        let pk = model.expect_table(&table).pk_column().db_name.clone();

        let mut tree = JoinTree {
            items: vec![JoinItem {
                key: table.clone(),
                node: root,
                kind: JoinKind::Root,
                table,
                parent: None,
                children: vec![],
                leaves: vec![],
                condition: None,
                alias: String::new(),
                expanded: false,
                loaded: true,
                pk,
            }],
            alias_names: state.aliases.keys().cloned().collect(),
            fake_ids: state.distinct || !state.group_bys.is_empty(),
            prefix: prefix.to_string(),
        };

        tree.merge_state(model, state, outer_roots);
        tree.select_leaves(model, state, purpose);
        tree.assign_aliases();
        tree
    }

    fn merge_state(&mut self, model: &Model, state: &BuilderState, outer_roots: &[&Node]) {
        let loaded = state.joins.iter().chain(&state.selects);
        let mentioned = state
            .group_bys
            .iter()
            .chain(&state.order_bys)
            .chain(state.condition.iter())
            .chain(state.having.iter())
            .chain(state.aliases.values());

        let mut join_conditions = vec![];
        for (node, is_loaded) in loaded.map(|n| (n, true)).chain(mentioned.map(|n| (n, false))) {
            let mut atomic = vec![];
            node.atomic_nodes(&mut atomic);
            for atomic in atomic {
                if self.merge(model, atomic, is_loaded).is_none() {
                    let belongs_outside = atomic
                        .root()
                        .is_some_and(|root| outer_roots.iter().any(|outer| *outer == root));
                    if !belongs_outside {
                        panic!(
                            "cannot use {atomic} in a query of {}; use a subquery to query another table",
                            self.items[0].node
                        );
                    }
                }
                join_conditions.extend(
                    atomic
                        .path()
                        .into_iter()
                        .filter_map(|n| n.join_options()?.condition.as_deref()),
                );
            }

            let mut subqueries = vec![];
            node.subqueries(&mut subqueries);
            for subquery in subqueries {
                self.merge_correlated(model, subquery);
            }
        }

        for condition in join_conditions {
            let mut atomic = vec![];
            condition.atomic_nodes(&mut atomic);
            for atomic in atomic {
                // Conditions on a join of a subquery may refer to the enclosing query
                self.merge(model, atomic, false);
            }
        }
    }

    /// Nodes of a nested builder rooted at this tree's root are joined here, where the nested
    /// statement can refer to them.
    fn merge_correlated(&mut self, model: &Model, state: &BuilderState) {
        for node in state.nodes() {
            let mut atomic = vec![];
            node.atomic_nodes(&mut atomic);
            for atomic in atomic {
                self.merge(model, atomic, false);
            }

            let mut subqueries = vec![];
            node.subqueries(&mut subqueries);
            for subquery in subqueries {
                self.merge_correlated(model, subquery);
            }
        }
    }

    /// Merge the path from the root to `node` into the tree. Returns the item the node leads to
    /// (the parent item for a column), or `None` if the node has a different root.
    fn merge(&mut self, model: &Model, node: &Node, loaded: bool) -> Option<ItemId> {
        let path = node.path();
        if *path[0] != self.items[0].node {
            return None;
        }

        let mut current = 0;
        for element in path.into_iter().skip(1) {
            if !element.is_table_family() {
                break;
            }
            let existing = self.items[current]
                .children
                .iter()
                .copied()
                .find(|&child| self.items[child].node == *element);

            current = match existing {
                Some(child) => {
                    self.merge_join_options(child, element);
                    child
                }
                None => self.add_item(model, current, element),
            };
            if loaded {
                self.items[current].loaded = true;
            }
        }
        Some(current)
    }

    fn merge_join_options(&mut self, id: ItemId, node: &Node) {
        let item = &mut self.items[id];
        if let Some(condition) = node.join_options().and_then(|j| j.condition.as_deref()) {
            match &item.condition {
                None => item.condition = Some(condition.clone()),
                Some(existing) if existing == condition => {}
                Some(existing) => panic!(
                    "the join of {node} already has the condition {existing}; it cannot also have {condition}"
                ),
            }
        }
        if node.is_expanded() {
            item.expanded = true;
        }
    }

    fn add_item(&mut self, model: &Model, parent: ItemId, node: &Node) -> ItemId {
        let kind = match node {
            Node::Reference(ReferenceNode {
                column,
                referenced_column,
                ..
            }) => JoinKind::Reference {
                column: column.clone(),
                referenced_column: referenced_column.clone(),
            },
            Node::ReverseReference(ReverseNode {
                column,
                foreign_key,
                is_unique,
                ..
            }) => JoinKind::Reverse {
                column: column.clone(),
                foreign_key: foreign_key.clone(),
                is_unique: *is_unique,
            },
            Node::ManyMany(ManyManyNode {
                assn_table,
                assn_column,
                associated_column,
                associated_pk,
                is_enum,
                ..
            }) => JoinKind::ManyMany {
                assn_table: assn_table.clone(),
                assn_column: assn_column.clone(),
                associated_column: associated_column.clone(),
                associated_pk: associated_pk.clone(),
                is_enum: *is_enum,
            },
            _ => unreachable!("only joined table nodes are added below the root"),
        };

        let table = node.table_name().unwrap_or_default().to_string();
        let pk = match &kind {
            JoinKind::ManyMany {
                is_enum: true,
                associated_column,
                ..
            } => associated_column.clone(),
            _ => model.expect_table(&table).pk_column().db_name.clone(),
        };
        let key = node
            .alias()
            .or(node.field_name())
            .unwrap_or_default()
            .to_string();

        let join = node.join_options().cloned().unwrap_or_default();
        let id = self.items.len();
        self.items.push(JoinItem {
            node: node.clone(),
            kind,
            table,
            parent: Some(parent),
            children: vec![],
            leaves: vec![],
            condition: join.condition.map(|c| *c),
            alias: String::new(),
            expanded: join.expanded,
            loaded: false,
            pk,
            key,
        });
        self.items[parent].children.push(id);
        id
    }

    fn select_leaves(&mut self, model: &Model, state: &BuilderState, purpose: Purpose) {
        if !state.group_bys.is_empty() {
            for node in &state.group_bys {
                self.select_column_node(model, node);
            }
        } else if !state.selects.is_empty() {
            for node in state.selects.iter().chain(&state.order_bys) {
                self.select_column_node(model, node);
            }
            let adds_pks = !(state.distinct || purpose != Purpose::Select || state.is_subquery);
            if adds_pks {
                for id in 0..self.items.len() {
                    if self.items[id].loaded {
                        let pk = self.items[id].pk.clone();
                        self.select_column(model, id, &pk);
                    }
                }
            }
        } else if purpose == Purpose::Select {
            for id in 0..self.items.len() {
                if !self.items[id].loaded {
                    continue;
                }
                if self.items[id].is_enum() {
                    let pk = self.items[id].pk.clone();
                    self.select_column(model, id, &pk);
                } else {
                    let table = model.expect_table(&self.items[id].table);
                    for column in &table.columns {
                        self.select_column(model, id, &column.db_name);
                    }
                }
            }
        }

        for item in &mut self.items {
            item.leaves.sort_by_key(|l| l.position);
        }
    }

    /// Only columns are selected; other nodes in a group-by or order-by are emitted as
    /// expressions.
    fn select_column_node(&mut self, model: &Model, node: &Node) {
        let Node::Column(column) = node else {
            return;
        };
        if let Some(id) = self.find(&column.parent) {
            self.select_column(model, id, &column.column);
        }
    }

    fn select_column(&mut self, model: &Model, id: ItemId, column: &str) {
        let item = &mut self.items[id];
        if item.leaf(column).is_some() {
            return;
        }

        let leaf = if item.is_enum() {
            Leaf {
                column: column.to_string(),
                alias: String::new(),
                column_type: ColumnType::Int64,
                is_pk: true,
                nullable: true,
                zero: Value::Null,
                position: 0,
            }
        } else {
            let table = model.expect_table(&item.table);
            let Some(position) = table.columns.iter().position(|c| c.db_name == column) else {
                panic!("table {} has no column {column}", table.db_name)
            };
            let model_column = &table.columns[position];
            Leaf {
                column: column.to_string(),
                alias: String::new(),
                column_type: model_column.column_type,
                is_pk: model_column.is_pk,
                nullable: model_column.is_nullable,
                zero: model_column.default_or_zero(),
                position,
            }
        };
        item.leaves.push(leaf);
    }

    /// Tables are numbered depth-first, then their selected columns in the same order
    fn assign_aliases(&mut self) {
        let order = self.depth_first();

        for (n, &id) in order.iter().enumerate() {
            self.items[id].alias = format!("t_{}{n}", self.prefix);
        }

        let mut n = 0;
        for &id in &order {
            for leaf in &mut self.items[id].leaves {
                leaf.alias = format!("c_{}{n}", self.prefix);
                n += 1;
            }
        }
    }

    /// Item ids, parents before their children
    pub fn depth_first(&self) -> Vec<ItemId> {
        fn visit(tree: &JoinTree, id: ItemId, out: &mut Vec<ItemId>) {
            out.push(id);
            for &child in &tree.items[id].children {
                visit(tree, child, out);
            }
        }

        let mut out = Vec::with_capacity(self.items.len());
        visit(self, 0, &mut out);
        out
    }

    pub fn root(&self) -> &JoinItem {
        &self.items[0]
    }

    /// The item a table-family node leads to
    pub fn find(&self, node: &Node) -> Option<ItemId> {
        let path = node.path();
        if *path[0] != self.items[0].node {
            return None;
        }

        path.into_iter().skip(1).try_fold(0, |current, element| {
            self.items[current]
                .children
                .iter()
                .copied()
                .find(|&child| self.items[child].node == *element)
        })
    }

    pub fn selected_leaves(&self) -> impl Iterator<Item = (&JoinItem, &Leaf)> {
        self.depth_first()
            .into_iter()
            .flat_map(move |id| self.items[id].leaves.iter().map(move |l| (&self.items[id], l)))
    }

    pub fn has_loaded_array(&self) -> Option<&JoinItem> {
        self.items.iter().find(|i| i.loaded && i.is_array())
    }
}
