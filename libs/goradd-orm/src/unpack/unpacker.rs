// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Folding flat result rows back into nested records.
//!
//! Rows are first grouped by identity: the alias of each joined table plus the primary key read
//! from the row, so that a person joined to three projects, which arrives as three rows, becomes
//! one person holding three projects. The grouped objects are then turned into records,
//! producing one copy of the parent per child for expanded joins.

use std::collections::HashMap;

use indexmap::IndexMap;

use super::{ALIASES_KEY, Field, Record, ResultSet, SqlReceiver};
use crate::{
    DatabaseError, Value,
    sql::join_tree::{ItemId, JoinKind, JoinTree},
};

#[derive(Debug, Default)]
struct Object {
    values: IndexMap<String, Value>,
    aliases: IndexMap<String, Value>,
    children: IndexMap<ItemId, IndexMap<String, Object>>,
}

pub(crate) struct Unpacker<'t> {
    tree: &'t JoinTree,
    positions: HashMap<&'t str, usize>,
    /// Items whose subtree selects at least one column
    loaded: Vec<bool>,
    fake_id: usize,
}

impl<'t> Unpacker<'t> {
    pub fn new(tree: &'t JoinTree, result: &ResultSet) -> Result<Self, DatabaseError> {
        let mut positions = HashMap::new();
        for (_, leaf) in tree.selected_leaves() {
            let position = result.column_index(&leaf.alias).ok_or_else(|| {
                DatabaseError::Validation(format!("the result has no column {}", leaf.alias))
            })?;
            positions.insert(leaf.alias.as_str(), position);
        }
        for name in &tree.alias_names {
            let position = result.column_index(name).ok_or_else(|| {
                DatabaseError::Validation(format!("the result has no alias {name}"))
            })?;
            positions.insert(name.as_str(), position);
        }

        let mut loaded = vec![false; tree.items.len()];
        for id in tree.depth_first().into_iter().rev() {
            let item = &tree.items[id];
            loaded[id] = !item.leaves.is_empty() || item.children.iter().any(|&c| loaded[c]);
        }

        Ok(Self {
            tree,
            positions,
            loaded,
            fake_id: 0,
        })
    }

    /// Unpack `rows`, checking `is_cancelled` between rows
    pub fn unpack(
        &mut self,
        rows: &[Vec<Value>],
        is_cancelled: impl Fn() -> bool,
    ) -> Result<Vec<Record>, DatabaseError> {
        let mut objects: IndexMap<String, Object> = IndexMap::new();
        for row in rows {
            if is_cancelled() {
                return Err(DatabaseError::Cancelled);
            }
            self.key_row(0, row, &mut objects)?;
        }

        let mut records = vec![];
        for object in objects.into_values() {
            records.extend(self.expand(0, object)?);
        }
        Ok(records)
    }

    fn cell(&self, row: &[Value], alias: &str) -> Value {
        self.positions
            .get(alias)
            .and_then(|&p| row.get(p))
            .cloned()
            .unwrap_or(Value::Null)
    }

    fn identity(&mut self, id: ItemId, row: &[Value]) -> Option<String> {
        let item = &self.tree.items[id];
        let pk = item
            .pk_leaf()
            .filter(|_| !self.tree.fake_ids)
            .map(|leaf| self.cell(row, &leaf.alias));

        match pk {
            // The left join found nothing
            Some(Value::Null) if id != 0 => None,
            Some(pk) if !pk.is_null() => Some(format!("{}.{pk}", item.alias)),
            _ => {
                let all_null = item.leaves.iter().all(|l| self.cell(row, &l.alias).is_null());
                if id != 0 && !item.leaves.is_empty() && all_null {
                    return None;
                }
                self.fake_id += 1;
                Some(format!("{}.#{}", item.alias, self.fake_id))
            }
        }
    }

    fn key_row(
        &mut self,
        id: ItemId,
        row: &[Value],
        objects: &mut IndexMap<String, Object>,
    ) -> Result<(), DatabaseError> {
        if !self.loaded[id] {
            return Ok(());
        }
        let Some(identity) = self.identity(id, row) else {
            return Ok(());
        };

        let tree = self.tree;
        let item = &tree.items[id];
        // Updated in place so records keep the order their first row arrived in
        let object = objects.entry(identity).or_default();
        let is_new = object.values.is_empty() && object.aliases.is_empty();

        if is_new {
            for leaf in &item.leaves {
                let value = SqlReceiver(self.cell(row, &leaf.alias)).unpack(leaf.column_type)?;
                let value = if value.is_null() && !leaf.nullable {
                    leaf.zero.clone()
                } else {
                    value
                };
                object.values.insert(leaf.column.clone(), value);
            }
            if id == 0 {
                for name in &tree.alias_names {
                    object.aliases.insert(name.clone(), self.cell(row, name));
                }
            }
        }

        for &child in &item.children {
            let children = object.children.entry(child).or_default();
            self.key_row(child, row, children)?;
        }
        Ok(())
    }

    fn expand(&self, id: ItemId, object: Object) -> Result<Vec<Record>, DatabaseError> {
        let mut base: Record = object
            .values
            .into_iter()
            .map(|(column, value)| (column, Field::Value(value)))
            .collect();
        if !object.aliases.is_empty() {
            let aliases = object
                .aliases
                .into_iter()
                .map(|(name, value)| (name, Field::Value(value)))
                .collect();
            base.insert(ALIASES_KEY.to_string(), Field::Record(aliases));
        }

        let mut records = vec![base];
        for (child, objects) in object.children {
            if !self.loaded[child] {
                continue;
            }
            let item = &self.tree.items[child];
            let key = item.key.as_str();

            if item.is_enum() {
                let ids: Vec<Value> = objects
                    .into_values()
                    .filter_map(|mut o| o.values.swap_remove(&item.pk))
                    .collect();
                records = if item.expanded {
                    cross(records, key, ids.into_iter().map(Field::Value).collect())
                } else {
                    set(records, key, Field::Values(ids))
                };
                continue;
            }

            let to_one = match &item.kind {
                JoinKind::Reference { .. } => true,
                JoinKind::Reverse { is_unique, .. } => *is_unique,
                _ => false,
            };
            if to_one && objects.len() > 1 {
                return Err(DatabaseError::Validation(format!(
                    "{} leads to a single record but {} were found",
                    item.node,
                    objects.len()
                )));
            }

            let mut children = vec![];
            for object in objects.into_values() {
                children.extend(self.expand(child, object)?);
            }

            records = if to_one || item.expanded {
                cross(records, key, children.into_iter().map(Field::Record).collect())
            } else {
                set(records, key, Field::Records(children))
            };
        }

        Ok(records)
    }
}

fn set(records: Vec<Record>, key: &str, field: Field) -> Vec<Record> {
    records
        .into_iter()
        .map(|mut r| {
            r.insert(key.to_string(), field.clone());
            r
        })
        .collect()
}

/// One copy of each record per field. Records are kept unchanged when there are no fields.
fn cross(records: Vec<Record>, key: &str, fields: Vec<Field>) -> Vec<Record> {
    if fields.is_empty() {
        return records;
    }
    records
        .into_iter()
        .flat_map(|record| {
            fields.iter().map(move |field| {
                let mut record = record.clone();
                record.insert(key.to_string(), field.clone());
                record
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Builder, BuilderState, Model,
        schema::test_helper::sample_model,
        sql::join_tree::Purpose,
        unpack::RecordExt,
    };

    fn unpack(model: &Model, state: &BuilderState, rows: Vec<Vec<Value>>) -> Vec<Record> {
        let tree = JoinTree::new(model, state, Purpose::Select, "", &[]);
        let columns = tree
            .selected_leaves()
            .map(|(_, l)| l.alias.clone())
            .chain(tree.alias_names.iter().cloned())
            .collect();
        let result = ResultSet { columns, rows };
        Unpacker::new(&tree, &result)
            .unwrap()
            .unpack(&result.rows, || false)
            .unwrap()
    }

    fn v(s: &str) -> Value {
        Value::from(s)
    }

    /// Rows of person(id, first_name, last_name) left joined with project(id, name)
    fn person_project_rows() -> Vec<Vec<Value>> {
        vec![
            vec![v("1"), v("Ann"), v("Smith"), v("10"), v("Alpha")],
            vec![v("1"), v("Ann"), v("Smith"), v("11"), v("Beta")],
            vec![v("2"), v("Bob"), v("Jones"), Value::Null, Value::Null],
        ]
    }

    fn person_projects(model: &Model) -> BuilderState {
        let projects = model.node("person.projects_as_manager");
        BuilderState::new()
            .select([
                model.node("person.first_name"),
                model.node("person.last_name"),
                projects.column(model, "name"),
            ])
            .join(projects)
    }

    #[test]
    fn array_joins_collect_children() {
        let model = sample_model();
        let records = unpack(&model, &person_projects(&model), person_project_rows());

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].value("first_name"), Some(&v("Ann")));
        let projects = records[0].records("projects_as_manager").unwrap();
        assert_eq!(projects.len(), 2);
        assert_eq!(projects[1].value("name"), Some(&v("Beta")));
        assert_eq!(records[1].records("projects_as_manager").unwrap().len(), 0);
    }

    #[test]
    fn records_keep_the_order_of_their_first_row() {
        let model = sample_model();
        let rows = vec![
            vec![v("1"), v("Ann"), v("Smith"), v("10"), v("Alpha")],
            vec![v("2"), v("Bob"), v("Jones"), v("11"), v("Beta")],
            vec![v("3"), v("Cy"), v("Brown"), v("13"), v("Delta")],
            vec![v("1"), v("Ann"), v("Smith"), v("12"), v("Gamma")],
            vec![v("2"), v("Bob"), v("Jones"), v("14"), v("Epsilon")],
        ];
        let records = unpack(&model, &person_projects(&model), rows);

        let names: Vec<_> = records.iter().map(|r| r.value("first_name")).collect();
        assert_eq!(names, [Some(&v("Ann")), Some(&v("Bob")), Some(&v("Cy"))]);

        let projects: Vec<_> = records[0]
            .records("projects_as_manager")
            .unwrap()
            .iter()
            .map(|p| p.value("name").cloned())
            .collect();
        assert_eq!(projects, [Some(v("Alpha")), Some(v("Gamma"))]);
        let projects: Vec<_> = records[1]
            .records("projects_as_manager")
            .unwrap()
            .iter()
            .map(|p| p.value("name").cloned())
            .collect();
        assert_eq!(projects, [Some(v("Beta")), Some(v("Epsilon"))]);
    }

    #[test]
    fn expanded_joins_copy_the_parent() {
        let model = sample_model();
        let state = person_projects(&model).expand(model.node("person.projects_as_manager"));
        let records = unpack(&model, &state, person_project_rows());

        assert_eq!(records.len(), 3);
        assert_eq!(
            records[0].record("projects_as_manager").unwrap().value("name"),
            Some(&v("Alpha"))
        );
        assert_eq!(
            records[1].record("projects_as_manager").unwrap().value("name"),
            Some(&v("Beta"))
        );
        assert_eq!(records[1].value("id"), Some(&v("1")));
        assert!(records[2].record("projects_as_manager").is_none());
    }

    #[test]
    fn enum_ids_are_collected() {
        let model = sample_model();
        let state = BuilderState::new()
            .select([model.node("person.last_name")])
            .join(model.node("person.person_types"));
        let rows = vec![
            vec![v("1"), v("Smith"), Value::Int(1)],
            vec![v("1"), v("Smith"), Value::Int(2)],
            vec![v("2"), v("Jones"), Value::Null],
        ];

        let records = unpack(&model, &state, rows.clone());
        assert_eq!(records.len(), 2);
        assert_eq!(
            RecordExt::values(&records[0], "person_types"),
            Some([Value::Int(1), Value::Int(2)].as_slice())
        );
        assert_eq!(RecordExt::values(&records[1], "person_types"), Some([].as_slice()));

        let state = state.expand(model.node("person.person_types"));
        let records = unpack(&model, &state, rows);
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].value("person_types"), Some(&Value::Int(2)));
    }

    #[test]
    fn references_are_folded_in() {
        let model = sample_model();
        let state = BuilderState::new()
            .join(model.node("project.manager"))
            .select([
                model.node("project.name"),
                model.node("project.manager.last_name"),
            ]);
        let rows = vec![
            vec![v("10"), v("Alpha"), v("1"), v("Smith")],
            vec![v("11"), v("Beta"), Value::Null, Value::Null],
        ];

        let records = unpack(&model, &state, rows);
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].record("manager").unwrap().value("last_name"),
            Some(&v("Smith"))
        );
        assert!(records[1].record("manager").is_none());
    }

    #[test]
    fn distinct_rows_are_not_merged() {
        let model = sample_model();
        let state = BuilderState::new()
            .select([model.node("person.last_name")])
            .distinct();
        let records = unpack(&model, &state, vec![vec![v("Smith")], vec![v("Jones")]]);

        assert_eq!(records.len(), 2);
        assert_eq!(records[1].value("last_name"), Some(&v("Jones")));
    }

    #[test]
    fn aliases_and_zero_values() {
        let model = sample_model();
        let state = BuilderState::new()
            .group_by([model.node("project.num")])
            .alias("total", crate::op::count(false, []));
        let records = unpack(
            &model,
            &state,
            vec![vec![Value::Null, Value::Int(4)], vec![Value::Int(2), Value::Int(1)]],
        );

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].value("num"), Some(&Value::Int(0)));
        assert_eq!(records[0].alias("total"), Some(&Value::Int(4)));
        assert_eq!(records[1].value("num"), Some(&Value::Int(2)));
    }

    #[test]
    fn cancellation_stops_unpacking() {
        let model = sample_model();
        let state = person_projects(&model);
        let tree = JoinTree::new(&model, &state, Purpose::Select, "", &[]);
        let columns = tree.selected_leaves().map(|(_, l)| l.alias.clone()).collect();
        let result = ResultSet {
            columns,
            rows: person_project_rows(),
        };

        let err = Unpacker::new(&tree, &result)
            .unwrap()
            .unpack(&result.rows, || true)
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Cancelled));
    }

    #[test]
    fn missing_columns_are_reported() {
        let model = sample_model();
        let state = person_projects(&model);
        let tree = JoinTree::new(&model, &state, Purpose::Select, "", &[]);

        assert!(Unpacker::new(&tree, &ResultSet::new(vec!["c_0".to_string()])).is_err());
    }
}
