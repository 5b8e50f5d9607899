// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::LazyLock;

use heck::{ToSnakeCase, ToUpperCamelCase};
use regex::Regex;

static ENUM_TOKEN_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[^A-Za-z0-9_]+").unwrap());

/// A name with singular and plural forms.
pub trait ToPlural {
    fn to_plural(&self) -> String;
}

impl ToPlural for str {
    fn to_plural(&self) -> String {
        pluralizer::pluralize(self, 2, false)
    }
}

/// `public.person` -> `person`
pub(crate) fn strip_schema(name: &str) -> &str {
    name.rsplit_once('.').map(|(_, n)| n).unwrap_or(name)
}

pub(crate) fn strip_suffix<'a>(name: &'a str, suffix: &str) -> &'a str {
    if suffix.is_empty() {
        name
    } else {
        name.strip_suffix(suffix).unwrap_or(name)
    }
}

/// `person_type` -> `Person Type`
pub(crate) fn literal_name(name: &str) -> String {
    name.split(['_', ' '])
        .filter(|w| !w.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn type_name(name: &str) -> String {
    name.to_upper_camel_case()
}

pub(crate) fn field_name(identifier: &str) -> String {
    identifier.to_snake_case()
}

/// The identifier of an enum constant: the type name followed by each token of the value's name,
/// lowercased and then capitalized (`"In Progress"` -> `ProjectStatusInProgress`).
pub(crate) fn enum_constant(type_name: &str, value_name: &str) -> String {
    ENUM_TOKEN_SEPARATOR
        .split(value_name)
        .filter(|token| !token.is_empty())
        .fold(type_name.to_string(), |mut acc, token| {
            acc.push_str(&capitalize(&token.to_lowercase()));
            acc
        })
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
