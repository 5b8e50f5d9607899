// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

mod builder_state;
mod query_builder;

pub use builder_state::{Builder, BuilderState, Limit};
pub use query_builder::QueryBuilder;
