// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::fmt::{Display, Formatter};

use chrono::NaiveDateTime;

use super::Node;
use crate::Value;

/// A constant in a query.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueNode {
    Scalar(Value),
    /// The right-hand side of `IN`
    List(Vec<Node>),
}

impl Display for ValueNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueNode::Scalar(Value::String(s)) => write!(f, "{s:?}"),
            ValueNode::Scalar(v) => write!(f, "{v}"),
            ValueNode::List(nodes) => {
                let items: Vec<String> = nodes.iter().map(|n| n.to_string()).collect();
                write!(f, "[{}]", items.join(", "))
            }
        }
    }
}

/// Null is rejected: comparisons with NULL are never true in SQL, so use
/// [`op::is_null`](super::op::is_null) instead.
impl From<Value> for Node {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => panic!("null cannot be used as a value; use is_null or is_not_null"),
            Value::Bytes(b) => Node::Value(ValueNode::Scalar(Value::String(
                String::from_utf8_lossy(&b).into_owned(),
            ))),
            v => Node::Value(ValueNode::Scalar(v)),
        }
    }
}

macro_rules! node_from {
    ($($t:ty),+) => {
        $(
            impl From<$t> for Node {
                fn from(v: $t) -> Self {
                    Node::from(Value::from(v))
                }
            }
        )+
    };
}

node_from!(
    i8,
    i16,
    i32,
    i64,
    isize,
    u8,
    u16,
    u32,
    u64,
    usize,
    f32,
    f64,
    bool,
    &str,
    String,
    NaiveDateTime,
    Vec<u8>,
    &[u8]
);

impl From<&Node> for Node {
    fn from(node: &Node) -> Self {
        node.clone()
    }
}

impl<T: Into<Node>> FromIterator<T> for ValueNode {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        ValueNode::List(iter.into_iter().map(Into::into).collect())
    }
}
