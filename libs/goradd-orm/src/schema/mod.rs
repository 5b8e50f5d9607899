// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The raw description of a database, as produced by an introspection of a live database or an
//! external source (such as a JSON document). The description is imported into a [`Model`](crate::Model),
//! which normalizes names and materializes derived relationships.

pub mod description;
pub mod issue;
pub(crate) mod options;

#[cfg(test)]
pub(crate) mod test_helper;
