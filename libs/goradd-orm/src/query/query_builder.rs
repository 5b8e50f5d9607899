// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use tracing::instrument;

use super::{Builder, BuilderState};
use crate::{
    DatabaseError, Model,
    db::{Context, Database},
    node::Node,
    unpack::{Cursor, Record},
};

/// A [`BuilderState`] bound to a database and a request context, with the terminal methods
/// that run the query.
pub struct QueryBuilder<'a> {
    db: &'a dyn Database,
    ctx: &'a Context,
    state: BuilderState,
}

impl<'a> QueryBuilder<'a> {
    /// A builder whose root is determined by the first node it is given
    pub fn new(db: &'a dyn Database, ctx: &'a Context) -> Self {
        Self {
            db,
            ctx,
            state: BuilderState::new(),
        }
    }

    /// A builder rooted at `table`
    pub fn for_table(db: &'a dyn Database, ctx: &'a Context, table: &str) -> Self {
        let root = Node::table(db.model(), table);
        Self {
            db,
            ctx,
            state: BuilderState::with_root(root),
        }
    }

    pub fn model(&self) -> &'a Model {
        self.db.model()
    }

    pub fn state(&self) -> &BuilderState {
        &self.state
    }

    /// Load all matching records
    #[instrument(name = "QueryBuilder::load", skip(self), fields(db = self.db.key()))]
    pub async fn load(self) -> Result<Vec<Record>, DatabaseError> {
        self.db.load(self.ctx, &self.state).await
    }

    /// Load matching records one at a time. Joins or selects that collect arrays of child records
    /// cannot be streamed and panic.
    #[instrument(name = "QueryBuilder::load_cursor", skip(self), fields(db = self.db.key()))]
    pub async fn load_cursor(self) -> Result<Cursor, DatabaseError> {
        self.db.load_cursor(self.ctx, &self.state).await
    }

    /// Count the matching rows. With `nodes`, counts the rows where they are not null (optionally
    /// only distinct combinations). A grouped query counts its groups.
    #[instrument(name = "QueryBuilder::count", skip(self, nodes), fields(db = self.db.key()))]
    pub async fn count(self, distinct: bool, nodes: Vec<Node>) -> Result<u64, DatabaseError> {
        self.db.count(self.ctx, &self.state, distinct, &nodes).await
    }

    /// Delete the matching rows of the root table
    #[instrument(name = "QueryBuilder::delete", skip(self), fields(db = self.db.key()))]
    pub async fn delete(self) -> Result<(), DatabaseError> {
        self.db.delete_query(self.ctx, &self.state).await
    }

    pub fn subquery(self) -> Node {
        self.state.subquery()
    }
}

impl Builder for QueryBuilder<'_> {
    fn state_mut(&mut self) -> &mut BuilderState {
        &mut self.state
    }
}
