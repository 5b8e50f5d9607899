// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use tracing::{instrument, warn};

use super::{
    Column, ColumnType, EnumField, EnumRow, EnumTable, ForeignKeyInfo, Index, ManyManyReference,
    MappedArena, Model, ReverseReference, Table, FkAction,
    naming::{
        ToPlural, enum_constant, field_name, literal_name, strip_schema, strip_suffix, type_name,
    },
};
use crate::{
    DatabaseError, Value,
    config::OrmConfig,
    schema::{
        description::{
            ColumnDescription, DatabaseDescription, EnumTableDescription, ManyManyDescription,
            TableDescription,
        },
        issue::{Issue, WithIssues},
        options::{self, Options},
    },
    unpack::SqlReceiver,
};

impl Model {
    pub fn from_config(
        key: &str,
        config: &OrmConfig,
        description: &DatabaseDescription,
    ) -> Result<WithIssues<Model>, DatabaseError> {
        Self::import(
            key,
            &config.foreign_key_suffix,
            &config.enum_table_suffix,
            config.ignore_schemas,
            description,
        )
    }

    /// Build a model from a raw description.
    ///
    /// Enum tables are imported first so that foreign keys can recognize them, then tables,
    /// then foreign keys, reverse references and many-many references, each in its own pass.
    /// Problems that only affect one table are returned as issues (and the table is left out);
    /// problems that make the description inconsistent abort the import.
    #[instrument(skip(description))]
    pub fn import(
        key: &str,
        foreign_key_suffix: &str,
        enum_table_suffix: &str,
        ignore_schemas: bool,
        description: &DatabaseDescription,
    ) -> Result<WithIssues<Model>, DatabaseError> {
        let mut importer = Importer {
            model: Model {
                key: key.to_string(),
                foreign_key_suffix: foreign_key_suffix.to_string(),
                enum_table_suffix: enum_table_suffix.to_string(),
                tables: MappedArena::default(),
                enum_tables: MappedArena::default(),
            },
            ignore_schemas,
            issues: vec![],
            skipped: HashSet::new(),
        };

        for enum_table in &description.enum_tables {
            importer.import_enum_table(enum_table)?;
        }
        for table in &description.tables {
            importer.import_table(table)?;
        }

        let mut linked = HashSet::new();
        for table in &description.tables {
            let name = importer.table_name(&table.name);
            if importer.model.tables.contains_key(&name) && linked.insert(name.clone()) {
                importer.import_foreign_keys(&name, table)?;
            }
        }

        importer.build_reverse_references();

        for many_many in &description.many_many {
            importer.import_many_many(many_many)?;
        }

        for issue in &importer.issues {
            warn!("{issue}");
        }

        Ok(WithIssues {
            value: importer.model,
            issues: importer.issues,
        })
    }
}

struct Importer {
    model: Model,
    ignore_schemas: bool,
    issues: Vec<Issue>,
    /// Tables left out because of an issue. References to them are dropped rather than
    /// rejected.
    skipped: HashSet<String>,
}

/// Either side of a relationship
enum Target {
    Table { type_name: String, pk: String },
    Enum { type_name: String, pk: String },
}

impl Importer {
    fn table_name(&self, name: &str) -> String {
        if self.ignore_schemas {
            strip_schema(name).to_string()
        } else {
            name.to_string()
        }
    }

    fn import_enum_table(&mut self, desc: &EnumTableDescription) -> Result<(), DatabaseError> {
        let name = self.table_name(&desc.name);
        if self.model.enum_tables.contains_key(&name) {
            self.issues.push(Issue::Warning(format!(
                "enum table {name} is described more than once; using the first description"
            )));
            return Ok(());
        }
        if desc.columns.len() < 2 {
            return Err(DatabaseError::Schema(format!(
                "enum table {name} must have an id and a name column"
            )));
        }

        let options = Options::new(&name, &desc.options, &desc.comment, &mut self.issues);
        let base = strip_suffix(&name, &self.model.enum_table_suffix).to_string();
        let names = self.names(&base, &options);

        let fields: Vec<EnumField> = desc
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| EnumField {
                name: c.name.clone(),
                column_type: match i {
                    0 if !c.column_type.is_integer() => ColumnType::Int,
                    1 => ColumnType::String,
                    _ => c.column_type,
                },
            })
            .collect();

        let mut rows: Vec<EnumRow> = vec![];
        for (i, row) in desc.values.iter().enumerate() {
            if row.len() != fields.len() {
                return Err(DatabaseError::Schema(format!(
                    "row {i} of enum table {name} has {} values, expected {}",
                    row.len(),
                    fields.len()
                )));
            }

            let values = fields
                .iter()
                .zip(row)
                .map(|(field, json)| {
                    SqlReceiver(json_to_value(json))
                        .unpack(field.column_type)
                        .map(|v| (field.name.clone(), v))
                        .map_err(|e| {
                            DatabaseError::Schema(format!(
                                "field {} of enum table {name}: {e}",
                                field.name
                            ))
                        })
                })
                .collect::<Result<IndexMap<_, _>, _>>()?;

            let id = values[0].as_i64().ok_or_else(|| {
                DatabaseError::Schema(format!("row {i} of enum table {name} has no id"))
            })?;
            let row_name = values[1].as_str().unwrap_or_default().to_string();
            let constant = enum_constant(&names.type_name, &row_name);

            if rows.iter().any(|r| r.id == id || r.constant == constant) {
                self.issues.push(Issue::Warning(format!(
                    "enum table {name} has a duplicate row {row_name}; skipping it"
                )));
                continue;
            }

            rows.push(EnumRow {
                id,
                name: row_name,
                constant,
                values,
            });
        }

        self.model.enum_tables.add(
            &name,
            EnumTable {
                db_name: name.clone(),
                literal_name: names.literal_name,
                literal_plural: names.literal_plural,
                type_name: names.type_name,
                type_plural: names.type_plural,
                fields,
                rows,
            },
        );
        Ok(())
    }

    fn import_table(&mut self, desc: &TableDescription) -> Result<(), DatabaseError> {
        let name = self.table_name(&desc.name);
        if self.model.enum_tables.contains_key(&name) {
            return Ok(());
        }
        if self.model.tables.contains_key(&name) || self.skipped.contains(&name) {
            self.issues.push(Issue::Warning(format!(
                "table {name} is described more than once; using the first description"
            )));
            return Ok(());
        }

        let options = Options::new(&name, &desc.options, &desc.comment, &mut self.issues);
        let names = self.names(&name, &options);
        if names.type_name == names.type_plural {
            self.issues.push(Issue::Warning(format!(
                "table {name} appears to be plural ({} = {}); table names must be singular. Skipping it",
                names.type_name, names.type_plural
            )));
            self.skipped.insert(name);
            return Ok(());
        }

        match desc.columns.iter().filter(|c| c.is_pk).count() {
            0 => {
                self.issues.push(Issue::Warning(format!(
                    "table {name} has no primary key; skipping it"
                )));
                self.skipped.insert(name);
                return Ok(());
            }
            1 => {}
            _ => {
                return Err(DatabaseError::Schema(format!(
                    "table {name} has more than one primary key"
                )));
            }
        }

        let mut columns: Vec<Column> = vec![];
        for column in &desc.columns {
            if columns.iter().any(|c| c.db_name == column.name) {
                return Err(DatabaseError::Schema(format!(
                    "table {name} has more than one column named {}",
                    column.name
                )));
            }
            columns.push(self.import_column(&name, column));
        }

        let indexes = desc
            .indexes
            .iter()
            .map(|index| {
                if let ([column_name], true) = (index.columns.as_slice(), index.is_unique) {
                    if let Some(column) = columns.iter_mut().find(|c| &c.db_name == column_name) {
                        column.is_unique = true;
                    }
                }
                Index {
                    is_unique: index.is_unique,
                    columns: index.columns.clone(),
                }
            })
            .collect();

        let no_codegen = options.bool(options::NO_CODEGEN, &mut self.issues);

        self.model.tables.add(
            &name,
            Table {
                db_name: name.clone(),
                literal_name: names.literal_name,
                literal_plural: names.literal_plural,
                type_name: names.type_name,
                type_plural: names.type_plural,
                columns,
                indexes,
                reverse_references: vec![],
                many_many_references: vec![],
                comment: desc.comment.clone(),
                options: options.into_map(),
                no_codegen,
            },
        );
        Ok(())
    }

    fn import_column(&mut self, table: &str, desc: &ColumnDescription) -> Column {
        let owner = format!("{table}.{}", desc.name);
        let options = Options::new(&owner, &desc.options, &desc.comment, &mut self.issues);

        let column_type = if desc.is_id {
            ColumnType::String
        } else {
            desc.column_type
        };

        let default_value = desc.default_value.as_ref().and_then(|json| {
            match SqlReceiver(json_to_value(json)).unpack(column_type) {
                Ok(v) => Some(v),
                Err(e) => {
                    self.issues.push(Issue::Warning(format!(
                        "default value of {owner} is not usable: {e}"
                    )));
                    None
                }
            }
        });

        let min_value = options
            .number(options::MIN, &mut self.issues)
            .or_else(|| desc.min_value.clone())
            .map(|j| json_to_value(&j));
        let max_value = options
            .number(options::MAX, &mut self.issues)
            .or_else(|| desc.max_value.clone())
            .map(|j| json_to_value(&j));

        let identifier = options
            .string(options::GO_NAME, &mut self.issues)
            .unwrap_or_else(|| type_name(&desc.name));
        let should_auto_update = options.bool(options::SHOULD_AUTO_UPDATE, &mut self.issues);

        Column {
            db_name: desc.name.clone(),
            identifier,
            column_type,
            native_type: desc.native_type.clone(),
            max_char_length: desc.max_char_length,
            default_value,
            min_value,
            max_value,
            is_id: desc.is_id,
            is_pk: desc.is_pk,
            is_nullable: desc.is_nullable,
            is_unique: desc.is_unique || desc.is_pk,
            is_timestamp: desc.is_timestamp,
            is_date_only: desc.is_date_only,
            is_time_only: desc.is_time_only,
            should_auto_update,
            foreign_key: None,
            comment: desc.comment.clone(),
            options: options.into_map(),
        }
    }

    fn import_foreign_keys(
        &mut self,
        table_name: &str,
        desc: &TableDescription,
    ) -> Result<(), DatabaseError> {
        for column in &desc.columns {
            let Some(fk) = &column.foreign_key else {
                continue;
            };

            let referenced_table = self.table_name(&fk.referenced_table);
            let Some(target) = self.target(&referenced_table)? else {
                self.issues.push(Issue::Warning(format!(
                    "foreign key {table_name}.{} refers to the skipped table {referenced_table}; ignoring it",
                    column.name
                )));
                continue;
            };

            if (fk.update_action == FkAction::SetNull || fk.delete_action == FkAction::SetNull)
                && !column.is_nullable
            {
                return Err(DatabaseError::Schema(format!(
                    "foreign key {table_name}.{} sets null on a non-nullable column",
                    column.name
                )));
            }

            let (referenced_type, referenced_pk, is_enum) = match target {
                Target::Table { type_name, pk } => (type_name, pk, false),
                Target::Enum { type_name, pk } => (type_name, pk, true),
            };

            let stripped = strip_suffix(&column.name, &self.model.foreign_key_suffix);
            let identifier = if stripped.is_empty() || column.is_pk {
                referenced_type.clone()
            } else {
                type_name(stripped)
            };
            let reference_field = field_name(&identifier);
            if reference_field == column.name {
                self.issues.push(Issue::Hint(format!(
                    "foreign key column {table_name}.{} does not end in {}; its reference shares the column's name",
                    column.name, self.model.foreign_key_suffix
                )));
            }

            let referenced_column = if fk.referenced_column.is_empty() {
                referenced_pk
            } else {
                fk.referenced_column.clone()
            };

            let info = ForeignKeyInfo {
                referenced_table,
                referenced_column,
                update_action: fk.update_action,
                delete_action: fk.delete_action,
                identifier,
                field_name: reference_field,
                referenced_type,
                is_enum,
                reverse_reference: None,
            };

            if let Some(c) = self
                .model
                .tables
                .get_by_key_mut(table_name)
                .and_then(|t| t.columns.iter_mut().find(|c| c.db_name == column.name))
            {
                c.foreign_key = Some(info);
            }
        }
        Ok(())
    }

    fn build_reverse_references(&mut self) {
        struct Pending {
            owner: String,
            owner_type: String,
            owner_plural: String,
            column: String,
            referenced_table: String,
            referenced_column: String,
            is_unique: bool,
            name: Option<String>,
            plural: Option<String>,
        }

        let pending: Vec<Pending> = self
            .model
            .tables
            .values()
            .flat_map(|table| {
                table.columns.iter().filter_map(move |column| {
                    let fk = column.foreign_key.as_ref().filter(|fk| !fk.is_enum)?;
                    let option = |key: &str| {
                        column
                            .options
                            .get(key)
                            .and_then(JsonValue::as_str)
                            .map(str::to_string)
                    };
                    Some(Pending {
                        owner: table.db_name.clone(),
                        owner_type: table.type_name.clone(),
                        owner_plural: table.type_plural.clone(),
                        column: column.db_name.clone(),
                        referenced_table: fk.referenced_table.clone(),
                        referenced_column: fk.referenced_column.clone(),
                        is_unique: column.is_unique,
                        name: option(options::REVERSE_NAME),
                        plural: option(options::REVERSE_PLURAL),
                    })
                })
            })
            .collect();

        for p in pending {
            let stripped = strip_suffix(&p.column, &self.model.foreign_key_suffix);
            let role = stripped.replacen(p.referenced_table.as_str(), "", 1);
            let role = role.trim_matches('_');

            let (identifier, identifier_plural) = if role.is_empty() {
                (p.owner_type.clone(), p.owner_plural.clone())
            } else {
                let role = type_name(role);
                (
                    format!("{}As{role}", p.owner_type),
                    format!("{}As{role}", p.owner_plural),
                )
            };
            let identifier = p.name.unwrap_or(identifier);
            let identifier_plural = p.plural.unwrap_or(identifier_plural);
            let reverse_field = if p.is_unique {
                field_name(&identifier)
            } else {
                field_name(&identifier_plural)
            };

            let Some(target) = self.model.tables.get_by_key_mut(&p.referenced_table) else {
                continue;
            };
            if target.has_field(&reverse_field) {
                self.issues.push(Issue::Warning(format!(
                    "reverse reference {reverse_field} for {}.{} conflicts with an existing field of {}; set reverseName on the column to resolve it",
                    p.owner, p.column, target.db_name
                )));
                continue;
            }

            target.reverse_references.push(ReverseReference {
                identifier,
                identifier_plural,
                field_name: reverse_field.clone(),
                column: p.referenced_column,
                associated_table: p.owner.clone(),
                associated_column: p.column.clone(),
                is_unique: p.is_unique,
            });

            if let Some(fk) = self
                .model
                .tables
                .get_by_key_mut(&p.owner)
                .and_then(|t| t.columns.iter_mut().find(|c| c.db_name == p.column))
                .and_then(|c| c.foreign_key.as_mut())
            {
                fk.reverse_reference = Some(reverse_field);
            }
        }
    }

    fn import_many_many(&mut self, desc: &ManyManyDescription) -> Result<(), DatabaseError> {
        let assn_table = self.table_name(&desc.assn_table);
        let table1 = self.table_name(&desc.table1);
        let table2 = self.table_name(&desc.table2);

        let (Some(target1), Some(target2)) = (self.target(&table1)?, self.target(&table2)?) else {
            self.issues.push(Issue::Warning(format!(
                "association {assn_table} refers to a skipped table; ignoring it"
            )));
            return Ok(());
        };

        // The reference on table1 points to table2 and is named after column2, and vice versa
        let side1 = Side {
            table: table1,
            column: desc.column1.clone(),
            name: desc.name1.clone(),
            plural: desc.plural1.clone(),
            target: target1,
        };
        let side2 = Side {
            table: table2,
            column: desc.column2.clone(),
            name: desc.name2.clone(),
            plural: desc.plural2.clone(),
            target: target2,
        };

        match (&side1.target, &side2.target) {
            (Target::Enum { .. }, Target::Enum { .. }) => Err(DatabaseError::Schema(format!(
                "association {assn_table} links two enum tables"
            ))),
            (Target::Table { .. }, Target::Enum { .. }) => {
                self.add_many_many(&assn_table, &side1, &side2, desc, None);
                Ok(())
            }
            (Target::Enum { .. }, Target::Table { .. }) => {
                self.add_many_many(&assn_table, &side2, &side1, desc, None);
                Ok(())
            }
            (Target::Table { .. }, Target::Table { .. }) => {
                let field1 = self.many_many_names(&side2).2;
                let field2 = self.many_many_names(&side1).2;
                let added = self.add_many_many(&assn_table, &side1, &side2, desc, Some(field2));
                if added {
                    self.add_many_many(&assn_table, &side2, &side1, desc, Some(field1));
                }
                Ok(())
            }
        }
    }

    /// Adds the reference on `from` that leads to `to`
    fn add_many_many(
        &mut self,
        assn_table: &str,
        from: &Side,
        to: &Side,
        desc: &ManyManyDescription,
        counterpart: Option<String>,
    ) -> bool {
        let (identifier, identifier_plural, reference_field) = self.many_many_names(to);
        let (associated_pk, is_enum) = match &to.target {
            Target::Table { pk, .. } => (pk.clone(), false),
            Target::Enum { pk, .. } => (pk.clone(), true),
        };

        let Some(table) = self.model.tables.get_by_key_mut(&from.table) else {
            return false;
        };
        if table.has_field(&reference_field) {
            self.issues.push(Issue::Warning(format!(
                "many-many reference {reference_field} through {assn_table} conflicts with an existing field of {}; ignoring it",
                from.table
            )));
            return false;
        }

        table.many_many_references.push(ManyManyReference {
            assn_table: assn_table.to_string(),
            assn_column: from.column.clone(),
            associated_table: to.table.clone(),
            associated_column: to.column.clone(),
            associated_pk,
            identifier,
            identifier_plural,
            field_name: reference_field,
            is_enum,
            supports_foreign_keys: desc.supports_foreign_keys,
            counterpart,
        });
        true
    }

    /// Names of a reference leading to `to`: identifier, plural identifier and field name
    fn many_many_names(&self, to: &Side) -> (String, String, String) {
        let stripped = strip_suffix(&to.column, &self.model.foreign_key_suffix);
        let base = if stripped.is_empty() {
            match &to.target {
                Target::Table { type_name, .. } | Target::Enum { type_name, .. } => {
                    type_name.clone()
                }
            }
        } else {
            type_name(stripped)
        };

        let identifier = to.name.clone().unwrap_or_else(|| base.clone());
        let identifier_plural = to
            .plural
            .clone()
            .unwrap_or_else(|| type_name(&field_name(&identifier).to_plural()));
        let reference_field = field_name(&identifier_plural);
        (identifier, identifier_plural, reference_field)
    }

    /// Resolve a referenced table. `Ok(None)` means the table was skipped because of an issue.
    fn target(&self, name: &str) -> Result<Option<Target>, DatabaseError> {
        if let Some(e) = self.model.enum_tables.get_by_key(name) {
            Ok(Some(Target::Enum {
                type_name: e.type_name.clone(),
                pk: e.pk_field().to_string(),
            }))
        } else if let Some(t) = self.model.tables.get_by_key(name) {
            Ok(Some(Target::Table {
                type_name: t.type_name.clone(),
                pk: t.pk_column().db_name.clone(),
            }))
        } else if self.skipped.contains(name) {
            Ok(None)
        } else {
            Err(DatabaseError::Schema(format!("unknown table {name}")))
        }
    }

    fn names(&mut self, base: &str, options: &Options) -> Names {
        let plural = base.to_plural();
        Names {
            literal_name: options
                .string(options::LITERAL_NAME, &mut self.issues)
                .unwrap_or_else(|| literal_name(base)),
            literal_plural: options
                .string(options::LITERAL_PLURAL, &mut self.issues)
                .unwrap_or_else(|| literal_name(&plural)),
            type_name: options
                .string(options::GO_NAME, &mut self.issues)
                .unwrap_or_else(|| type_name(base)),
            type_plural: options
                .string(options::GO_PLURAL, &mut self.issues)
                .unwrap_or_else(|| type_name(&plural)),
        }
    }
}

struct Names {
    literal_name: String,
    literal_plural: String,
    type_name: String,
    type_plural: String,
}

struct Side {
    table: String,
    column: String,
    name: Option<String>,
    plural: Option<String>,
    target: Target,
}

fn json_to_value(json: &JsonValue) -> Value {
    match json {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Number(n) => n
            .as_i64()
            .map(Value::Int)
            .or_else(|| n.as_u64().map(Value::Uint))
            .or_else(|| n.as_f64().map(Value::Float))
            .unwrap_or(Value::Null),
        JsonValue::String(s) => Value::String(s.clone()),
        other => Value::String(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::schema::test_helper::{sample_description, sample_model};

    fn import(description: serde_json::Value) -> Result<WithIssues<Model>, DatabaseError> {
        let description: DatabaseDescription = serde_json::from_value(description).unwrap();
        Model::import("goradd", "_id", "_enum", true, &description)
    }

    #[test]
    fn imports_sample() {
        let WithIssues { value: model, issues } =
            Model::import("goradd", "_id", "_enum", false, &sample_description()).unwrap();
        assert!(issues.is_empty(), "{issues:?}");

        assert_eq!(
            model.tables().map(|t| t.db_name.as_str()).collect::<Vec<_>>(),
            vec!["person", "project", "address", "login"]
        );

        let person = model.table("person").unwrap();
        assert_eq!(person.type_name, "Person");
        assert_eq!(person.type_plural, "People");
        assert_eq!(person.literal_plural, "People");

        let id = person.pk_column();
        assert!(id.is_id);
        assert_eq!(id.column_type, ColumnType::String);
    }

    #[test]
    fn foreign_keys_and_reverse_references() {
        let model = sample_model();
        let project = model.table("project").unwrap();

        let manager = project.column("manager_id").unwrap().foreign_key.as_ref().unwrap();
        assert_eq!(manager.identifier, "Manager");
        assert_eq!(manager.field_name, "manager");
        assert_eq!(manager.referenced_type, "Person");
        assert_eq!(manager.reverse_reference.as_deref(), Some("projects_as_manager"));
        assert!(!manager.is_enum);

        let status = project.column("status_id").unwrap().foreign_key.as_ref().unwrap();
        assert!(status.is_enum);
        assert_eq!(status.field_name, "status");
        assert_eq!(status.reverse_reference, None);

        let person = model.table("person").unwrap();
        let managed = person.reverse_reference("projects_as_manager").unwrap();
        assert_eq!(managed.identifier, "ProjectAsManager");
        assert_eq!(managed.identifier_plural, "ProjectsAsManager");
        assert_eq!(managed.associated_table, "project");
        assert_eq!(managed.associated_column, "manager_id");
        assert!(!managed.is_unique);

        // The FK column is named after the referenced table, so no role is added
        assert!(person.reverse_reference("addresses").is_some());

        let login = person.reverse_reference("login").unwrap();
        assert!(login.is_unique);
    }

    #[test]
    fn many_many_references() {
        let model = sample_model();
        let person = model.table("person").unwrap();
        let project = model.table("project").unwrap();

        let projects = person.many_many_reference("projects").unwrap();
        assert_eq!(projects.assn_table, "team_member_project_assn");
        assert_eq!(projects.assn_column, "team_member_id");
        assert_eq!(projects.associated_column, "project_id");
        assert_eq!(projects.counterpart.as_deref(), Some("team_members"));

        let members = project.many_many_reference("team_members").unwrap();
        assert_eq!(members.associated_table, "person");
        assert_eq!(members.counterpart.as_deref(), Some("projects"));

        let types = person.many_many_reference("person_types").unwrap();
        assert!(types.is_enum);
        assert_eq!(types.associated_pk, "id");
        assert_eq!(types.counterpart, None);
    }

    #[test]
    fn enum_tables() {
        let model = sample_model();
        let status = model.enum_table("project_status_enum").unwrap();

        assert_eq!(status.type_name, "ProjectStatus");
        assert_eq!(status.constants().count(), status.rows.len());
        assert_eq!(
            status.constants().collect::<Vec<_>>(),
            vec![
                "ProjectStatusOpen",
                "ProjectStatusCancelled",
                "ProjectStatusCompleted",
                "ProjectStatusInProgress"
            ]
        );
        let open = status.row(1).unwrap();
        assert_eq!(open.values["is_active"], Value::Bool(true));
    }

    #[test]
    fn plural_table_is_skipped() {
        let result = import(json!({
            "tables": [{
                "name": "people",
                "columns": [{"name": "id", "column_type": "int", "is_pk": true}]
            }]
        }))
        .unwrap();

        assert!(result.value.table("people").is_none());
        assert_eq!(result.issues.len(), 1);
    }

    #[test]
    fn missing_primary_key_is_skipped_along_with_references_to_it() {
        let result = import(json!({
            "tables": [
                {"name": "tag", "columns": [{"name": "label", "column_type": "string"}]},
                {"name": "post", "columns": [
                    {"name": "id", "column_type": "int", "is_pk": true},
                    {"name": "tag_id", "column_type": "int",
                     "foreign_key": {"referenced_table": "tag", "referenced_column": "label"}}
                ]}
            ]
        }))
        .unwrap();

        assert!(result.value.table("tag").is_none());
        let post = result.value.table("post").unwrap();
        assert!(post.column("tag_id").unwrap().foreign_key.is_none());
        assert_eq!(result.issues.len(), 2);
    }

    #[test]
    fn multiple_primary_keys_abort() {
        let result = import(json!({
            "tables": [{
                "name": "pair",
                "columns": [
                    {"name": "a", "column_type": "int", "is_pk": true},
                    {"name": "b", "column_type": "int", "is_pk": true}
                ]
            }]
        }));
        assert!(matches!(result, Err(DatabaseError::Schema(_))));
    }

    #[test]
    fn set_null_requires_nullable_column() {
        let result = import(json!({
            "tables": [
                {"name": "person", "columns": [{"name": "id", "column_type": "int", "is_pk": true}]},
                {"name": "project", "columns": [
                    {"name": "id", "column_type": "int", "is_pk": true},
                    {"name": "manager_id", "column_type": "int",
                     "foreign_key": {"referenced_table": "person", "referenced_column": "id",
                                     "delete_action": "set_null"}}
                ]}
            ]
        }));
        assert!(matches!(result, Err(DatabaseError::Schema(_))));
    }

    #[test]
    fn unknown_reference_aborts() {
        let result = import(json!({
            "tables": [{"name": "project", "columns": [
                {"name": "id", "column_type": "int", "is_pk": true},
                {"name": "owner_id", "column_type": "int",
                 "foreign_key": {"referenced_table": "nobody", "referenced_column": "id"}}
            ]}]
        }));
        assert!(matches!(result, Err(DatabaseError::Schema(_))));
    }

    #[test]
    fn comment_options_and_schemas() {
        let model = import(json!({
            "tables": [{
                "name": "public.person",
                "comment": r#"Humans {"goName": "Human", "goPlural": "Humans", "literalName": "Being"}"#,
                "columns": [
                    {"name": "id", "column_type": "int", "is_pk": true},
                    {"name": "age", "column_type": "int", "comment": r#"{"min": 0, "max": "lots"}"#},
                    {"name": "created", "column_type": "date_time", "default_value": "CURRENT_TIMESTAMP"}
                ]
            }]
        }))
        .unwrap();

        let person = model.value.table("person").unwrap();
        assert_eq!(person.type_name, "Human");
        assert_eq!(person.type_plural, "Humans");
        assert_eq!(person.literal_name, "Being");

        let age = person.column("age").unwrap();
        assert_eq!(age.min_value, Some(Value::Int(0)));
        assert_eq!(age.max_value, None);
        // The mistyped max option
        assert_eq!(model.issues.len(), 1);

        let created = person.column("created").unwrap();
        assert_eq!(created.default_value, Some(Value::String("now".into())));
    }

    #[test]
    fn reverse_reference_conflict_is_reported() {
        let result = import(json!({
            "tables": [
                {"name": "person", "columns": [
                    {"name": "id", "column_type": "int", "is_pk": true},
                    {"name": "projects", "column_type": "string"}
                ]},
                {"name": "project", "columns": [
                    {"name": "id", "column_type": "int", "is_pk": true},
                    {"name": "person_id", "column_type": "int",
                     "foreign_key": {"referenced_table": "person", "referenced_column": "id"}}
                ]}
            ]
        }))
        .unwrap();

        let person = result.value.table("person").unwrap();
        assert!(person.reverse_references.is_empty());
        assert_eq!(result.issues.len(), 1);
    }
}
