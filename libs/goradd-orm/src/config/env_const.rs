// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

pub const GORADD_FOREIGN_KEY_SUFFIX: &str = "GORADD_FOREIGN_KEY_SUFFIX";
pub const GORADD_ENUM_TABLE_SUFFIX: &str = "GORADD_ENUM_TABLE_SUFFIX";
pub const GORADD_IGNORE_SCHEMAS: &str = "GORADD_IGNORE_SCHEMAS";
pub const GORADD_PROFILE: &str = "GORADD_PROFILE";

pub const GORADD_POSTGRES_URL: &str = "GORADD_POSTGRES_URL";
pub const GORADD_CONNECTION_POOL_SIZE: &str = "GORADD_CONNECTION_POOL_SIZE";
pub const GORADD_SQLITE_PATH: &str = "GORADD_SQLITE_PATH";
