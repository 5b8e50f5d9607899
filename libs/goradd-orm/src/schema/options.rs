// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Options embedded in table and column comments.
//!
//! A comment may carry a JSON object anywhere in its text (`The manager {"goName": "Boss"}`). The
//! substring from the first `{` to the last `}` is parsed and merged over the options supplied
//! directly in the description.

use serde_json::{Map, Value as JsonValue};

use super::issue::Issue;

pub(crate) const LITERAL_NAME: &str = "literalName";
pub(crate) const LITERAL_PLURAL: &str = "literalPlural";
pub(crate) const GO_NAME: &str = "goName";
pub(crate) const GO_PLURAL: &str = "goPlural";
pub(crate) const REVERSE_NAME: &str = "reverseName";
pub(crate) const REVERSE_PLURAL: &str = "reversePlural";
pub(crate) const MIN: &str = "min";
pub(crate) const MAX: &str = "max";
pub(crate) const NO_CODEGEN: &str = "NoCodegen";
pub(crate) const SHOULD_AUTO_UPDATE: &str = "shouldAutoUpdate";

/// Options of a table or column, with the issues found while reading them.
#[derive(Debug, Clone, Default)]
pub(crate) struct Options {
    owner: String,
    values: Map<String, JsonValue>,
}

impl Options {
    pub(crate) fn new(
        owner: impl Into<String>,
        explicit: &Map<String, JsonValue>,
        comment: &str,
        issues: &mut Vec<Issue>,
    ) -> Self {
        let owner = owner.into();
        let mut values = explicit.clone();

        if let Some(embedded) = extract_comment_options(comment) {
            match serde_json::from_str::<Map<String, JsonValue>>(embedded) {
                Ok(parsed) => values.extend(parsed),
                Err(e) => issues.push(Issue::Warning(format!(
                    "options in the comment of {owner} are not a JSON object: {e}"
                ))),
            }
        }

        Self { owner, values }
    }

    pub(crate) fn string(&self, key: &str, issues: &mut Vec<Issue>) -> Option<String> {
        match self.values.get(key)? {
            JsonValue::String(s) => Some(s.clone()),
            other => {
                self.mismatch(key, "a string", other, issues);
                None
            }
        }
    }

    pub(crate) fn bool(&self, key: &str, issues: &mut Vec<Issue>) -> bool {
        match self.values.get(key) {
            None => false,
            Some(JsonValue::Bool(b)) => *b,
            Some(other) => {
                self.mismatch(key, "a boolean", other, issues);
                false
            }
        }
    }

    pub(crate) fn number(&self, key: &str, issues: &mut Vec<Issue>) -> Option<JsonValue> {
        match self.values.get(key)? {
            v @ JsonValue::Number(_) => Some(v.clone()),
            other => {
                self.mismatch(key, "a number", other, issues);
                None
            }
        }
    }

    pub(crate) fn into_map(self) -> Map<String, JsonValue> {
        self.values
    }

    fn mismatch(&self, key: &str, expected: &str, found: &JsonValue, issues: &mut Vec<Issue>) {
        issues.push(Issue::Warning(format!(
            "option {key} of {} should be {expected}, found {found}; using the default",
            self.owner
        )));
    }
}

fn extract_comment_options(comment: &str) -> Option<&str> {
    let start = comment.find('{')?;
    let end = comment.rfind('}')?;
    (start < end).then(|| &comment[start..=end])
}
