// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Functions that build operation nodes.
//!
//! ```ignore
//! use goradd_orm::node::op;
//!
//! let condition = op::and([
//!     op::eq(model.node("project.status_id"), 1),
//!     op::starts_with(model.node("project.manager.last_name"), "Wo"),
//! ]);
//! ```

use super::{Node, OperationNode, Operator, SubqueryNode, ValueNode};

fn operation(op: Operator, operands: Vec<Node>) -> Node {
    Node::Operation(OperationNode::new(op, operands))
}

fn binary(op: Operator, lhs: impl Into<Node>, rhs: impl Into<Node>) -> Node {
    operation(op, vec![lhs.into(), rhs.into()])
}

pub fn eq(lhs: impl Into<Node>, rhs: impl Into<Node>) -> Node {
    binary(Operator::Equal, lhs, rhs)
}

pub fn ne(lhs: impl Into<Node>, rhs: impl Into<Node>) -> Node {
    binary(Operator::NotEqual, lhs, rhs)
}

pub fn gt(lhs: impl Into<Node>, rhs: impl Into<Node>) -> Node {
    binary(Operator::GreaterThan, lhs, rhs)
}

pub fn ge(lhs: impl Into<Node>, rhs: impl Into<Node>) -> Node {
    binary(Operator::GreaterOrEqual, lhs, rhs)
}

pub fn lt(lhs: impl Into<Node>, rhs: impl Into<Node>) -> Node {
    binary(Operator::LessThan, lhs, rhs)
}

pub fn le(lhs: impl Into<Node>, rhs: impl Into<Node>) -> Node {
    binary(Operator::LessOrEqual, lhs, rhs)
}

/// Logical AND of all the conditions, reduced to a simpler node where possible: nested ANDs are
/// flattened, [`all`] operands are dropped, and any [`none`] operand makes the whole node [`none`].
pub fn and(conditions: impl IntoIterator<Item = Node>) -> Node {
    connective(Operator::And, Operator::All, Operator::None, conditions)
}

/// Logical OR of all the conditions, reduced like [`and`]
pub fn or(conditions: impl IntoIterator<Item = Node>) -> Node {
    connective(Operator::Or, Operator::None, Operator::All, conditions)
}

fn connective(
    op: Operator,
    identity: Operator,
    absorbing: Operator,
    conditions: impl IntoIterator<Item = Node>,
) -> Node {
    let mut operands: Vec<Node> = vec![];
    for condition in conditions {
        match condition {
            Node::Operation(o) if o.op == identity => {}
            Node::Operation(o) if o.op == absorbing => return operation(absorbing, vec![]),
            Node::Operation(o) if o.op == op => operands.extend(o.operands),
            other => {
                if !operands.contains(&other) {
                    operands.push(other);
                }
            }
        }
    }

    match operands.len() {
        0 => operation(identity, vec![]),
        1 => operands.remove(0),
        _ => operation(op, operands),
    }
}

pub fn xor(lhs: impl Into<Node>, rhs: impl Into<Node>) -> Node {
    binary(Operator::Xor, lhs, rhs)
}

pub fn not(condition: impl Into<Node>) -> Node {
    match condition.into() {
        Node::Operation(o) if o.op == Operator::All => none(),
        Node::Operation(o) if o.op == Operator::None => all(),
        other => operation(Operator::Not, vec![other]),
    }
}

pub fn add(lhs: impl Into<Node>, rhs: impl Into<Node>) -> Node {
    binary(Operator::Add, lhs, rhs)
}

pub fn subtract(lhs: impl Into<Node>, rhs: impl Into<Node>) -> Node {
    binary(Operator::Subtract, lhs, rhs)
}

pub fn multiply(lhs: impl Into<Node>, rhs: impl Into<Node>) -> Node {
    binary(Operator::Multiply, lhs, rhs)
}

pub fn divide(lhs: impl Into<Node>, rhs: impl Into<Node>) -> Node {
    binary(Operator::Divide, lhs, rhs)
}

pub fn modulo(lhs: impl Into<Node>, rhs: impl Into<Node>) -> Node {
    binary(Operator::Modulo, lhs, rhs)
}

pub fn negate(operand: impl Into<Node>) -> Node {
    operation(Operator::Negate, vec![operand.into()])
}

pub fn bit_and(lhs: impl Into<Node>, rhs: impl Into<Node>) -> Node {
    binary(Operator::BitAnd, lhs, rhs)
}

pub fn bit_or(lhs: impl Into<Node>, rhs: impl Into<Node>) -> Node {
    binary(Operator::BitOr, lhs, rhs)
}

pub fn bit_xor(lhs: impl Into<Node>, rhs: impl Into<Node>) -> Node {
    binary(Operator::BitXor, lhs, rhs)
}

pub fn shift_left(lhs: impl Into<Node>, rhs: impl Into<Node>) -> Node {
    binary(Operator::ShiftLeft, lhs, rhs)
}

pub fn shift_right(lhs: impl Into<Node>, rhs: impl Into<Node>) -> Node {
    binary(Operator::ShiftRight, lhs, rhs)
}

pub fn bit_invert(operand: impl Into<Node>) -> Node {
    operation(Operator::BitInvert, vec![operand.into()])
}

pub fn is_null(operand: impl Into<Node>) -> Node {
    operation(Operator::IsNull, vec![operand.into()])
}

pub fn is_not_null(operand: impl Into<Node>) -> Node {
    operation(Operator::IsNotNull, vec![operand.into()])
}

pub fn in_list<T: Into<Node>>(operand: impl Into<Node>, values: impl IntoIterator<Item = T>) -> Node {
    let list: ValueNode = values.into_iter().collect();
    binary(Operator::In, operand, Node::Value(list))
}

pub fn not_in_list<T: Into<Node>>(
    operand: impl Into<Node>,
    values: impl IntoIterator<Item = T>,
) -> Node {
    let list: ValueNode = values.into_iter().collect();
    binary(Operator::NotIn, operand, Node::Value(list))
}

/// `operand IN (subquery)`
pub fn in_subquery(operand: impl Into<Node>, subquery: Node) -> Node {
    assert!(
        matches!(subquery, Node::Subquery(SubqueryNode { .. })),
        "in_subquery expects a subquery, not {subquery}"
    );
    binary(Operator::In, operand, subquery)
}

pub fn starts_with(operand: impl Into<Node>, prefix: &str) -> Node {
    binary(Operator::StartsWith, operand, prefix)
}

pub fn ends_with(operand: impl Into<Node>, suffix: &str) -> Node {
    binary(Operator::EndsWith, operand, suffix)
}

pub fn contains(operand: impl Into<Node>, fragment: &str) -> Node {
    binary(Operator::Contains, operand, fragment)
}

/// A condition that is always true
pub fn all() -> Node {
    operation(Operator::All, vec![])
}

/// A condition that is always false
pub fn none() -> Node {
    operation(Operator::None, vec![])
}

/// Call an arbitrary SQL function
pub fn func(name: &str, operands: impl IntoIterator<Item = Node>) -> Node {
    Node::Operation(OperationNode {
        function: Some(name.to_string()),
        ..OperationNode::new(Operator::Function, operands.into_iter().collect())
    })
}

fn aggregate(name: &str, distinct: bool, operands: Vec<Node>) -> Node {
    Node::Operation(OperationNode {
        function: Some(name.to_string()),
        distinct,
        ..OperationNode::new(Operator::Function, operands)
    })
}

/// `COUNT(*)` when `nodes` is empty, otherwise `COUNT([DISTINCT] nodes...)`
pub fn count(distinct: bool, nodes: impl IntoIterator<Item = Node>) -> Node {
    aggregate("COUNT", distinct, nodes.into_iter().collect())
}

pub fn sum(distinct: bool, node: impl Into<Node>) -> Node {
    aggregate("SUM", distinct, vec![node.into()])
}

pub fn min(node: impl Into<Node>) -> Node {
    aggregate("MIN", false, vec![node.into()])
}

pub fn max(node: impl Into<Node>) -> Node {
    aggregate("MAX", false, vec![node.into()])
}

pub fn avg(distinct: bool, node: impl Into<Node>) -> Node {
    aggregate("AVG", distinct, vec![node.into()])
}

/// Add a number of seconds to a date-time. Not every dialect supports it.
pub fn date_add_seconds(operand: impl Into<Node>, seconds: impl Into<Node>) -> Node {
    binary(Operator::DateAddSeconds, operand, seconds)
}
