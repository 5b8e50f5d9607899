// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! From driver rows to records.

mod cursor;
mod receiver;
mod record;
mod result_set;
mod unpacker;

pub use cursor::Cursor;
pub use receiver::{NOW, SqlReceiver};
pub use record::{ALIASES_KEY, Field, Record, RecordExt};
pub use result_set::ResultSet;
pub(crate) use unpacker::Unpacker;
