// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

pub mod env_const;
mod environment;

pub use environment::{EnvError, Environment, MapEnvironment, SystemEnvironment};

use env_const::{
    GORADD_ENUM_TABLE_SUFFIX, GORADD_FOREIGN_KEY_SUFFIX, GORADD_IGNORE_SCHEMAS, GORADD_PROFILE,
};

pub const DEFAULT_FOREIGN_KEY_SUFFIX: &str = "_id";
pub const DEFAULT_ENUM_TABLE_SUFFIX: &str = "_enum";

/// Settings that shape how a database description is imported and how a database behaves at
/// runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrmConfig {
    /// Suffix stripped from foreign key column names to derive reference names (`manager_id` ->
    /// `manager`)
    pub foreign_key_suffix: String,
    /// Suffix stripped from enum table names to derive type names
    pub enum_table_suffix: String,
    /// Strip the schema prefix (`public.person` -> `person`) from table names
    pub ignore_schemas: bool,
    /// Record a profile entry for every statement executed
    pub profiling: bool,
}

impl Default for OrmConfig {
    fn default() -> Self {
        Self {
            foreign_key_suffix: DEFAULT_FOREIGN_KEY_SUFFIX.to_string(),
            enum_table_suffix: DEFAULT_ENUM_TABLE_SUFFIX.to_string(),
            ignore_schemas: false,
            profiling: false,
        }
    }
}

impl OrmConfig {
    pub fn from_env(env: &dyn Environment) -> Result<Self, EnvError> {
        Ok(Self {
            foreign_key_suffix: env
                .get_or_else(GORADD_FOREIGN_KEY_SUFFIX, DEFAULT_FOREIGN_KEY_SUFFIX),
            enum_table_suffix: env.get_or_else(GORADD_ENUM_TABLE_SUFFIX, DEFAULT_ENUM_TABLE_SUFFIX),
            ignore_schemas: env.enabled(GORADD_IGNORE_SCHEMAS, false)?,
            profiling: env.enabled(GORADD_PROFILE, false)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_env() {
        let env = MapEnvironment::new();
        assert_eq!(OrmConfig::from_env(&env).unwrap(), OrmConfig::default());
    }

    #[test]
    fn reads_overrides() {
        let env = MapEnvironment::from([
            (GORADD_FOREIGN_KEY_SUFFIX, "_fk"),
            (GORADD_PROFILE, "yes"),
            (GORADD_IGNORE_SCHEMAS, "1"),
        ]);
        let config = OrmConfig::from_env(&env).unwrap();

        assert_eq!(config.foreign_key_suffix, "_fk");
        assert_eq!(config.enum_table_suffix, DEFAULT_ENUM_TABLE_SUFFIX);
        assert!(config.profiling);
        assert!(config.ignore_schemas);
    }

    #[test]
    fn rejects_bad_boolean() {
        let env = MapEnvironment::from([(GORADD_PROFILE, "sometimes")]);
        assert!(matches!(
            OrmConfig::from_env(&env),
            Err(EnvError::InvalidBoolean { .. })
        ));
    }
}
