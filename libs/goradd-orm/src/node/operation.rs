// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::fmt::{Display, Formatter};

use super::Node;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterOrEqual,
    LessThan,
    LessOrEqual,

    And,
    Or,
    Xor,
    Not,

    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Negate,

    BitAnd,
    BitOr,
    BitXor,
    ShiftLeft,
    ShiftRight,
    BitInvert,

    IsNull,
    IsNotNull,

    In,
    NotIn,

    StartsWith,
    EndsWith,
    Contains,

    /// Always true
    All,
    /// Always false
    None,

    Function,
    DateAddSeconds,
}

/// How an operator is written out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Notation {
    /// `a OP b`, or `a OP b OP c` for connectives
    Infix(&'static str),
    /// `OP a`
    Prefix(&'static str),
    /// `a OP`
    Postfix(&'static str),
    /// `a [NOT] IN (...)`
    Membership(&'static str),
    /// `a LIKE pattern`
    Like,
    Constant(&'static str),
    Function,
    DateAdd,
}

impl Operator {
    pub(crate) fn notation(&self) -> Notation {
        match self {
            Operator::Equal => Notation::Infix("="),
            Operator::NotEqual => Notation::Infix("<>"),
            Operator::GreaterThan => Notation::Infix(">"),
            Operator::GreaterOrEqual => Notation::Infix(">="),
            Operator::LessThan => Notation::Infix("<"),
            Operator::LessOrEqual => Notation::Infix("<="),
            Operator::And => Notation::Infix("AND"),
            Operator::Or => Notation::Infix("OR"),
            Operator::Xor => Notation::Infix("XOR"),
            Operator::Not => Notation::Prefix("NOT "),
            Operator::Add => Notation::Infix("+"),
            Operator::Subtract => Notation::Infix("-"),
            Operator::Multiply => Notation::Infix("*"),
            Operator::Divide => Notation::Infix("/"),
            Operator::Modulo => Notation::Infix("%"),
            Operator::Negate => Notation::Prefix("-"),
            Operator::BitAnd => Notation::Infix("&"),
            Operator::BitOr => Notation::Infix("|"),
            Operator::BitXor => Notation::Infix("^"),
            Operator::ShiftLeft => Notation::Infix("<<"),
            Operator::ShiftRight => Notation::Infix(">>"),
            Operator::BitInvert => Notation::Prefix("~"),
            Operator::IsNull => Notation::Postfix("IS NULL"),
            Operator::IsNotNull => Notation::Postfix("IS NOT NULL"),
            Operator::In => Notation::Membership("IN"),
            Operator::NotIn => Notation::Membership("NOT IN"),
            Operator::StartsWith | Operator::EndsWith | Operator::Contains => Notation::Like,
            Operator::All => Notation::Constant("1=1"),
            Operator::None => Notation::Constant("1=0"),
            Operator::Function => Notation::Function,
            Operator::DateAddSeconds => Notation::DateAdd,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OperationNode {
    pub op: Operator,
    pub operands: Vec<Node>,
    /// Name of the function for [`Operator::Function`]
    pub function: Option<String>,
    /// Apply the function to distinct values only (`COUNT(DISTINCT ...)`)
    pub distinct: bool,
    pub descending: bool,
}

impl OperationNode {
    pub(crate) fn new(op: Operator, operands: Vec<Node>) -> Self {
        Self {
            op,
            operands,
            function: None,
            distinct: false,
            descending: false,
        }
    }

    /// Whether this is an aggregate function call
    pub fn is_aggregate(&self) -> bool {
        self.op == Operator::Function
            && self.function.as_deref().is_some_and(|f| {
                ["COUNT", "SUM", "MIN", "MAX", "AVG"].contains(&f.to_uppercase().as_str())
            })
    }
}

impl Display for OperationNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let operands: Vec<String> = self.operands.iter().map(|n| n.to_string()).collect();
        match self.op {
            Operator::Function => write!(
                f,
                "{}({}{})",
                self.function.as_deref().unwrap_or_default(),
                if self.distinct { "DISTINCT " } else { "" },
                operands.join(", ")
            ),
            op => write!(f, "{op:?}({})", operands.join(", ")),
        }
    }
}
