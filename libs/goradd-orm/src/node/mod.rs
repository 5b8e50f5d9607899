// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Nodes describe what a query refers to: tables, the columns of those tables, the relationships
//! leading from one table to another, and the values and operations that combine them.
//!
//! Table-family nodes (tables, references, reverse references and many-many references) form
//! chains rooted at a table node. A column node hangs off the end of such a chain. For example,
//! the chain `project -> manager -> first_name` reads "the first name of the project's manager".

pub(crate) mod operation;
pub mod op;
mod value;

use std::{
    fmt::{Display, Formatter},
    sync::Arc,
};

pub use operation::{OperationNode, Operator};
pub use value::ValueNode;

use crate::{ColumnType, Model, query::BuilderState};

#[derive(Debug, Clone)]
pub enum Node {
    Table(TableNode),
    Column(ColumnNode),
    Reference(ReferenceNode),
    ReverseReference(ReverseNode),
    ManyMany(ManyManyNode),
    Value(ValueNode),
    Operation(OperationNode),
    /// Refers to a node registered with [`Builder::alias`](crate::Builder::alias)
    Alias(AliasNode),
    Subquery(SubqueryNode),
}

/// Join settings of a table-family node. The alias takes part in node equality; the condition
/// and the expansion flag do not.
#[derive(Debug, Clone, Default)]
pub struct JoinOptions {
    pub alias: Option<String>,
    pub condition: Option<Box<Node>>,
    pub expanded: bool,
}

#[derive(Debug, Clone)]
pub struct TableNode {
    pub table: String,
    pub join: JoinOptions,
}

#[derive(Debug, Clone)]
pub struct ColumnNode {
    pub parent: Arc<Node>,
    pub column: String,
    pub column_type: ColumnType,
    pub is_pk: bool,
    pub descending: bool,
}

/// A forward reference through a foreign key column of the parent table.
#[derive(Debug, Clone)]
pub struct ReferenceNode {
    pub parent: Arc<Node>,
    /// The foreign key column in the parent table
    pub column: String,
    pub table: String,
    pub referenced_column: String,
    pub field_name: String,
    pub join: JoinOptions,
}

/// The rows of another table whose foreign key points to the parent.
#[derive(Debug, Clone)]
pub struct ReverseNode {
    pub parent: Arc<Node>,
    pub table: String,
    /// The column of the parent the foreign key points to
    pub column: String,
    pub foreign_key: String,
    pub field_name: String,
    pub is_unique: bool,
    pub join: JoinOptions,
}

#[derive(Debug, Clone)]
pub struct ManyManyNode {
    pub parent: Arc<Node>,
    pub assn_table: String,
    pub assn_column: String,
    pub table: String,
    pub associated_column: String,
    pub associated_pk: String,
    pub field_name: String,
    pub is_enum: bool,
    pub join: JoinOptions,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AliasNode {
    pub name: String,
    pub descending: bool,
}

#[derive(Debug, Clone)]
pub struct SubqueryNode {
    pub state: Box<BuilderState>,
}

impl Node {
    /// The root of a chain. Panics if the table is not part of the model.
    pub fn table(model: &Model, name: &str) -> Node {
        model.expect_table(name);
        Node::Table(TableNode {
            table: name.to_string(),
            join: JoinOptions::default(),
        })
    }

    /// A column of the table this node leads to
    pub fn column(&self, model: &Model, name: &str) -> Node {
        let table = model.expect_table(self.expect_table_name());
        let column = table
            .column(name)
            .unwrap_or_else(|| panic!("table {} has no column {name}", table.db_name));

        Node::Column(ColumnNode {
            parent: Arc::new(self.clone()),
            column: column.db_name.clone(),
            column_type: column.column_type,
            is_pk: column.is_pk,
            descending: false,
        })
    }

    /// Follow the foreign key whose reference is named `field_name`
    pub fn reference(&self, model: &Model, field_name: &str) -> Node {
        let table = model.expect_table(self.expect_table_name());
        let column = table
            .reference_column(field_name)
            .unwrap_or_else(|| panic!("table {} has no reference {field_name}", table.db_name));
        // reference_column only finds columns with a foreign key
        let Some(fk) = &column.foreign_key else {
            unreachable!()
        };
        if fk.is_enum {
            panic!(
                "{field_name} refers to the enum table {}; use the column {} instead",
                fk.referenced_table, column.db_name
            );
        }

        Node::Reference(ReferenceNode {
            parent: Arc::new(self.clone()),
            column: column.db_name.clone(),
            table: fk.referenced_table.clone(),
            referenced_column: fk.referenced_column.clone(),
            field_name: fk.field_name.clone(),
            join: JoinOptions::default(),
        })
    }

    pub fn reverse(&self, model: &Model, field_name: &str) -> Node {
        let table = model.expect_table(self.expect_table_name());
        let reverse = table.reverse_reference(field_name).unwrap_or_else(|| {
            panic!("table {} has no reverse reference {field_name}", table.db_name)
        });

        Node::ReverseReference(ReverseNode {
            parent: Arc::new(self.clone()),
            table: reverse.associated_table.clone(),
            column: reverse.column.clone(),
            foreign_key: reverse.associated_column.clone(),
            field_name: reverse.field_name.clone(),
            is_unique: reverse.is_unique,
            join: JoinOptions::default(),
        })
    }

    pub fn many_many(&self, model: &Model, field_name: &str) -> Node {
        let table = model.expect_table(self.expect_table_name());
        let reference = table.many_many_reference(field_name).unwrap_or_else(|| {
            panic!("table {} has no many-many reference {field_name}", table.db_name)
        });

        Node::ManyMany(ManyManyNode {
            parent: Arc::new(self.clone()),
            assn_table: reference.assn_table.clone(),
            assn_column: reference.assn_column.clone(),
            table: reference.associated_table.clone(),
            associated_column: reference.associated_column.clone(),
            associated_pk: reference.associated_pk.clone(),
            field_name: reference.field_name.clone(),
            is_enum: reference.is_enum,
            join: JoinOptions::default(),
        })
    }

    /// Resolve `name` as a column, reference, reverse reference or many-many reference, in that
    /// order.
    pub fn field(&self, model: &Model, name: &str) -> Node {
        let table = model.expect_table(self.expect_table_name());
        if table.column(name).is_some() {
            self.column(model, name)
        } else if table.reference_column(name).is_some() {
            self.reference(model, name)
        } else if table.reverse_reference(name).is_some() {
            self.reverse(model, name)
        } else if table.many_many_reference(name).is_some() {
            self.many_many(model, name)
        } else {
            panic!("table {} has no field {name}", table.db_name)
        }
    }

    /// Give a table-family node an alias. Two otherwise equal nodes with different aliases are
    /// joined separately, which allows joining the same table more than once.
    pub fn with_alias(mut self, alias: &str) -> Node {
        assert!(!alias.is_empty(), "an alias cannot be empty");
        if !self.is_table_family() {
            panic!("only table nodes can be aliased, not {self}");
        }
        if let Some(join) = self.join_options_mut() {
            join.alias = Some(alias.to_string());
        }
        self
    }

    /// Add a condition to the join that leads to this node
    pub fn with_condition(mut self, condition: Node) -> Node {
        if matches!(self, Node::Table(_)) {
            panic!("a join condition needs a joined table, not the root table {self}");
        }
        if !self.is_table_family() {
            panic!("a join condition can only be set on a table node, not {self}");
        }
        if let Some(join) = self.join_options_mut() {
            join.condition = Some(Box::new(condition));
        }
        self
    }

    /// Produce one copy of the parent record per child, instead of an array of children
    pub fn expand(mut self) -> Node {
        if !matches!(self, Node::ReverseReference(_) | Node::ManyMany(_)) {
            panic!("only reverse references and many-many references can be expanded, not {self}");
        }
        if let Some(join) = self.join_options_mut() {
            join.expanded = true;
        }
        self
    }

    /// Sort by this node in descending order
    pub fn descending(mut self) -> Node {
        match &mut self {
            Node::Column(c) => c.descending = true,
            Node::Alias(a) => a.descending = true,
            Node::Operation(o) => o.descending = true,
            other => panic!("{other} cannot be sorted"),
        }
        self
    }

    pub fn is_descending(&self) -> bool {
        match self {
            Node::Column(c) => c.descending,
            Node::Alias(a) => a.descending,
            Node::Operation(o) => o.descending,
            _ => false,
        }
    }

    pub fn parent(&self) -> Option<&Node> {
        match self {
            Node::Column(ColumnNode { parent, .. })
            | Node::Reference(ReferenceNode { parent, .. })
            | Node::ReverseReference(ReverseNode { parent, .. })
            | Node::ManyMany(ManyManyNode { parent, .. }) => Some(parent),
            _ => None,
        }
    }

    /// The table node a chain starts from. Values, operations, aliases and subqueries have no root.
    pub fn root(&self) -> Option<&Node> {
        match self {
            Node::Table(_) => Some(self),
            _ => self.parent().and_then(Node::root),
        }
    }

    /// The nodes from the root to this node, the root first
    pub fn path(&self) -> Vec<&Node> {
        let mut path = vec![self];
        let mut current = self;
        while let Some(parent) = current.parent() {
            path.push(parent);
            current = parent;
        }
        path.reverse();
        path
    }

    pub fn is_table_family(&self) -> bool {
        matches!(
            self,
            Node::Table(_) | Node::Reference(_) | Node::ReverseReference(_) | Node::ManyMany(_)
        )
    }

    /// The table this node leads to
    pub fn table_name(&self) -> Option<&str> {
        match self {
            Node::Table(TableNode { table, .. })
            | Node::Reference(ReferenceNode { table, .. })
            | Node::ReverseReference(ReverseNode { table, .. })
            | Node::ManyMany(ManyManyNode { table, .. }) => Some(table),
            _ => None,
        }
    }

    fn expect_table_name(&self) -> &str {
        match self {
            Node::ManyMany(ManyManyNode { is_enum: true, .. }) => {
                panic!("{self} leads to an enum table, whose fields cannot be queried")
            }
            _ => self
                .table_name()
                .unwrap_or_else(|| panic!("{self} does not lead to a table")),
        }
    }

    pub fn join_options(&self) -> Option<&JoinOptions> {
        match self {
            Node::Table(TableNode { join, .. })
            | Node::Reference(ReferenceNode { join, .. })
            | Node::ReverseReference(ReverseNode { join, .. })
            | Node::ManyMany(ManyManyNode { join, .. }) => Some(join),
            _ => None,
        }
    }

    pub(crate) fn join_options_mut(&mut self) -> Option<&mut JoinOptions> {
        match self {
            Node::Table(TableNode { join, .. })
            | Node::Reference(ReferenceNode { join, .. })
            | Node::ReverseReference(ReverseNode { join, .. })
            | Node::ManyMany(ManyManyNode { join, .. }) => Some(join),
            _ => None,
        }
    }

    pub fn alias(&self) -> Option<&str> {
        self.join_options().and_then(|j| j.alias.as_deref())
    }

    pub fn is_expanded(&self) -> bool {
        self.join_options().is_some_and(|j| j.expanded)
    }

    /// Whether joining this node collects several child records into an array on the parent
    pub fn is_array_join(&self) -> bool {
        match self {
            Node::ReverseReference(r) => !r.is_unique && !r.join.expanded,
            Node::ManyMany(m) => !m.join.expanded,
            _ => false,
        }
    }

    /// The key under which records reached through this node are stored in the parent record
    pub fn field_name(&self) -> Option<&str> {
        match self {
            Node::Reference(ReferenceNode { field_name, .. })
            | Node::ReverseReference(ReverseNode { field_name, .. })
            | Node::ManyMany(ManyManyNode { field_name, .. }) => Some(field_name),
            _ => None,
        }
    }

    /// Collect the column and table-family nodes this node is built from. Subqueries are not
    /// entered; see [`Node::subqueries`].
    pub(crate) fn atomic_nodes<'a>(&'a self, out: &mut Vec<&'a Node>) {
        match self {
            Node::Table(_)
            | Node::Column(_)
            | Node::Reference(_)
            | Node::ReverseReference(_)
            | Node::ManyMany(_) => out.push(self),
            Node::Value(ValueNode::List(nodes)) => {
                nodes.iter().for_each(|n| n.atomic_nodes(out));
            }
            Node::Operation(operation) => {
                operation.operands.iter().for_each(|n| n.atomic_nodes(out));
            }
            Node::Value(ValueNode::Scalar(_)) | Node::Alias(_) | Node::Subquery(_) => {}
        }
    }

    /// Collect the subqueries nested in this node
    pub(crate) fn subqueries<'a>(&'a self, out: &mut Vec<&'a BuilderState>) {
        match self {
            Node::Subquery(s) => out.push(&s.state),
            Node::Value(ValueNode::List(nodes)) => nodes.iter().for_each(|n| n.subqueries(out)),
            Node::Operation(operation) => {
                operation.operands.iter().for_each(|n| n.subqueries(out));
            }
            _ => {}
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Node::Table(a), Node::Table(b)) => a.table == b.table && a.join.alias == b.join.alias,
            (Node::Column(a), Node::Column(b)) => a.column == b.column && a.parent == b.parent,
            (Node::Reference(a), Node::Reference(b)) => {
                a.column == b.column && a.join.alias == b.join.alias && a.parent == b.parent
            }
            (Node::ReverseReference(a), Node::ReverseReference(b)) => {
                a.field_name == b.field_name
                    && a.join.alias == b.join.alias
                    && a.parent == b.parent
            }
            (Node::ManyMany(a), Node::ManyMany(b)) => {
                a.field_name == b.field_name
                    && a.join.alias == b.join.alias
                    && a.parent == b.parent
            }
            (Node::Value(a), Node::Value(b)) => a == b,
            (Node::Operation(a), Node::Operation(b)) => {
                a.op == b.op
                    && a.function == b.function
                    && a.distinct == b.distinct
                    && a.operands == b.operands
            }
            (Node::Alias(a), Node::Alias(b)) => a.name == b.name,
            (Node::Subquery(a), Node::Subquery(b)) => a.state == b.state,
            _ => false,
        }
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        fn with_alias(f: &mut Formatter<'_>, join: &JoinOptions) -> std::fmt::Result {
            match &join.alias {
                Some(alias) => write!(f, " as {alias}"),
                None => Ok(()),
            }
        }

        match self {
            Node::Table(t) => {
                write!(f, "{}", t.table)?;
                with_alias(f, &t.join)
            }
            Node::Column(c) => write!(f, "{}.{}", c.parent, c.column),
            Node::Reference(ReferenceNode {
                parent,
                field_name,
                join,
                ..
            })
            | Node::ReverseReference(ReverseNode {
                parent,
                field_name,
                join,
                ..
            })
            | Node::ManyMany(ManyManyNode {
                parent,
                field_name,
                join,
                ..
            }) => {
                write!(f, "{parent}.{field_name}")?;
                with_alias(f, join)
            }
            Node::Value(v) => write!(f, "{v}"),
            Node::Operation(o) => write!(f, "{o}"),
            Node::Alias(a) => write!(f, "alias {}", a.name),
            Node::Subquery(_) => write!(f, "subquery"),
        }
    }
}

impl Model {
    /// Resolve a dotted path such as `project.manager.first_name` into a node
    pub fn node(&self, path: &str) -> Node {
        let mut parts = path.split('.');
        let root = Node::table(self, parts.next().unwrap_or_default());
        parts.fold(root, |node, part| node.field(self, part))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::test_helper::sample_model;

    #[test]
    fn copies_are_equal() {
        let model = sample_model();
        let nodes = [
            model.node("person"),
            model.node("project.manager.first_name"),
            model.node("person.projects_as_manager"),
            model.node("person.projects.team_members"),
            op::eq(model.node("person.last_name"), "Smith"),
            Node::from(5),
        ];

        for node in nodes {
            assert_eq!(node, node.clone(), "{node}");
        }
    }

    #[test]
    fn alias_distinguishes_nodes() {
        let model = sample_model();
        let manager = model.node("project.manager");

        assert_ne!(manager.clone().with_alias("boss"), manager);
        assert_ne!(
            manager.clone().with_alias("boss"),
            manager.clone().with_alias("lead")
        );
        assert_eq!(
            manager.clone().with_alias("boss"),
            manager.clone().with_alias("boss")
        );
        // Conditions and expansion do not matter
        let condition = op::eq(model.node("project.manager.last_name"), "Wolfe");
        assert_eq!(manager.clone().with_condition(condition), manager);
        let projects = model.node("person.projects_as_manager");
        assert_eq!(projects.clone().expand(), projects);
    }

    #[test]
    fn paths_and_roots() {
        let model = sample_model();
        let name = model.node("project.manager.first_name");

        assert_eq!(name.to_string(), "project.manager.first_name");
        assert_eq!(name.root(), Some(&model.node("project")));
        assert_eq!(name.path().len(), 3);
        assert!(matches!(name, Node::Column(ColumnNode { ref column, .. }) if column == "first_name"));
        assert!(model.node("person.person_types").is_array_join());
        assert!(!model.node("person.login").is_array_join());
    }

    #[test]
    #[should_panic(expected = "can be expanded")]
    fn references_cannot_be_expanded() {
        let model = sample_model();
        model.node("project.manager").expand();
    }

    #[test]
    #[should_panic(expected = "no field")]
    fn unknown_field_panics() {
        sample_model().node("project.nope");
    }

    #[test]
    #[should_panic(expected = "enum table")]
    fn enum_references_are_columns() {
        let model = sample_model();
        model.node("project").reference(&model, "status");
    }
}
