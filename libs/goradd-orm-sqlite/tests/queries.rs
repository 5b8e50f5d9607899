// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

mod common;

use common::database;
use goradd_orm::{Builder, Context, Database, DatabaseError, Record, RecordExt, Value, op};
use test_log::test;

fn names(records: &[Record], field: &str) -> Vec<String> {
    records
        .iter()
        .map(|r| r.value(field).map(|v| v.to_string()).unwrap_or_default())
        .collect()
}

#[test(tokio::test)]
async fn simple_select() {
    let db = database().await;
    let ctx = Context::with_profiling(true);
    let model = db.model();

    let people = db
        .query(&ctx, "person")
        .condition(op::eq(model.node("person.first_name"), "Ben"))
        .load()
        .await
        .unwrap();

    assert_eq!(people.len(), 1);
    assert_eq!(people[0].value("id"), Some(&Value::from("3")));
    assert_eq!(people[0].value("last_name"), Some(&Value::from("Wolfe")));

    let profiles = ctx.profiles().await;
    assert_eq!(
        profiles[0].sql,
        r#"SELECT "t_0"."id" AS "c_0", "t_0"."first_name" AS "c_1", "t_0"."last_name" AS "c_2" FROM "person" AS "t_0" WHERE ("t_0"."first_name" = ?)"#
    );
}

#[test(tokio::test)]
async fn forward_reference() {
    let db = database().await;
    let ctx = Context::with_profiling(true);
    let model = db.model();

    let projects = db
        .query(&ctx, "project")
        .join(model.node("project.manager"))
        .order_by([model.node("project.num")])
        .load()
        .await
        .unwrap();

    assert_eq!(projects.len(), 4);
    let manager = projects[0].record("manager").unwrap();
    assert_eq!(manager.value("first_name"), Some(&Value::from("Wendy")));
    assert_eq!(projects[0].value("budget"), Some(&Value::Float(9560.25)));
    assert!(projects[3].record("manager").is_none());
    assert_eq!(projects[3].value("budget"), Some(&Value::Null));

    let sql = &ctx.profiles().await[0].sql;
    assert!(sql.contains(r#"LEFT JOIN "person" AS "t_1" ON "t_0"."manager_id" = "t_1"."id""#));
    assert!(sql.contains(r#""t_1"."last_name" AS"#));
}

#[test(tokio::test)]
async fn reverse_reference_collects_or_expands() {
    let db = database().await;
    let ctx = Context::new();
    let model = db.model();

    let people = db
        .query(&ctx, "person")
        .join(model.node("person.projects_as_manager"))
        .order_by([model.node("person.id")])
        .load()
        .await
        .unwrap();

    assert_eq!(people.len(), 5);
    assert_eq!(people[2].records("projects_as_manager").unwrap().len(), 0);
    assert_eq!(people[3].records("projects_as_manager").unwrap().len(), 1);
    let mut managed = names(people[4].records("projects_as_manager").unwrap(), "name");
    managed.sort();
    assert_eq!(managed, ["ACME Website Redesign", "Blueroomers"]);

    let people = db
        .query(&ctx, "person")
        .join(model.node("person.projects_as_manager"))
        .expand(model.node("person.projects_as_manager"))
        .order_by([model.node("person.id")])
        .load()
        .await
        .unwrap();

    assert_eq!(people.len(), 6);
    let wendy = people
        .iter()
        .filter(|p| p.value("first_name") == Some(&Value::from("Wendy")))
        .collect::<Vec<_>>();
    assert_eq!(wendy.len(), 2);
    assert!(wendy.iter().all(|p| p.record("projects_as_manager").is_some()));
    assert!(people[0].record("projects_as_manager").is_none());
}

#[test(tokio::test)]
async fn ordering_by_a_child_column_keeps_parent_order() {
    let db = database().await;
    let ctx = Context::new();
    let model = db.model();

    // Rows arrive as Wendy (3), Alex (2), Wendy (1), then people managing nothing
    let people = db
        .query(&ctx, "person")
        .join(model.node("person.projects_as_manager"))
        .order_by([model.node("person.projects_as_manager.num").descending()])
        .load()
        .await
        .unwrap();

    assert_eq!(people.len(), 5);
    assert_eq!(names(&people[..2], "first_name"), ["Wendy", "Alex"]);
    assert_eq!(
        names(people[0].records("projects_as_manager").unwrap(), "name"),
        ["Blueroomers", "ACME Website Redesign"]
    );
}

#[test(tokio::test)]
async fn unique_reverse_reference_is_a_single_record() {
    let db = database().await;
    let ctx = Context::new();
    let model = db.model();

    let people = db
        .query(&ctx, "person")
        .join(model.node("person.login"))
        .order_by([model.node("person.id")])
        .load()
        .await
        .unwrap();

    assert_eq!(people.len(), 5);
    assert_eq!(
        people[0].record("login").unwrap().value("username"),
        Some(&Value::from("jdoe"))
    );
    assert!(people[1].record("login").is_none());
}

#[test(tokio::test)]
async fn many_many_with_an_enum() {
    let db = database().await;
    let ctx = Context::new();
    let model = db.model();

    let people = db
        .query(&ctx, "person")
        .join(model.node("person.person_types"))
        .order_by([model.node("person.id")])
        .load()
        .await
        .unwrap();

    assert_eq!(people.len(), 5);
    let types = RecordExt::values(&people[0], "person_types").unwrap();
    assert_eq!(types.len(), 2);
    assert!(types.contains(&Value::Int(1)) && types.contains(&Value::Int(2)));
    assert_eq!(RecordExt::values(&people[1], "person_types").unwrap().len(), 0);

    let people = db
        .query(&ctx, "person")
        .join(model.node("person.person_types"))
        .expand(model.node("person.person_types"))
        .order_by([model.node("person.id")])
        .load()
        .await
        .unwrap();
    assert_eq!(people.len(), 6);
}

#[test(tokio::test)]
async fn many_many_between_tables() {
    let db = database().await;
    let ctx = Context::new();
    let model = db.model();

    let projects = db
        .query(&ctx, "project")
        .join(model.node("project.team_members"))
        .condition(op::eq(model.node("project.num"), 1))
        .load()
        .await
        .unwrap();

    assert_eq!(projects.len(), 1);
    let mut members = names(projects[0].records("team_members").unwrap(), "last_name");
    members.sort();
    assert_eq!(members, ["Doe", "Public"]);
}

#[test(tokio::test)]
async fn distinct_without_primary_keys() {
    let db = database().await;
    let ctx = Context::with_profiling(true);
    let model = db.model();

    let people = db
        .query(&ctx, "person")
        .select([model.node("person.last_name")])
        .distinct()
        .load()
        .await
        .unwrap();

    assert_eq!(people.len(), 4);
    assert_eq!(
        ctx.profiles().await[0].sql,
        r#"SELECT DISTINCT "t_0"."last_name" AS "c_0" FROM "person" AS "t_0""#
    );
}

#[test(tokio::test)]
async fn grouping_with_aliases() {
    let db = database().await;
    let ctx = Context::new();
    let model = db.model();

    let groups = db
        .query(&ctx, "project")
        .group_by([model.node("project.status_id")])
        .alias("projects", op::count(false, []))
        .order_by([model.node("project.status_id")])
        .load()
        .await
        .unwrap();

    assert_eq!(groups.len(), 3);
    assert_eq!(groups[2].value("status_id"), Some(&Value::Int(3)));
    assert_eq!(groups[2].alias("projects"), Some(&Value::Int(2)));
}

#[test(tokio::test)]
async fn subquery_condition() {
    let db = database().await;
    let ctx = Context::new();
    let model = db.model();

    let managers = db
        .query(&ctx, "project")
        .select([model.node("project.manager_id")])
        .condition(op::ge(model.node("project.budget"), 20000))
        .subquery();
    let people = db
        .query(&ctx, "person")
        .condition(op::in_subquery(model.node("person.id"), managers))
        .order_by([model.node("person.id")])
        .load()
        .await
        .unwrap();

    assert_eq!(names(&people, "first_name"), ["Alex", "Wendy"]);
}

#[test(tokio::test)]
async fn limits_and_offsets() {
    let db = database().await;
    let ctx = Context::new();
    let model = db.model();

    let people = db
        .query(&ctx, "person")
        .order_by([model.node("person.id")])
        .limit(2, 1)
        .load()
        .await
        .unwrap();

    assert_eq!(names(&people, "first_name"), ["Kendall", "Ben"]);
}

#[test(tokio::test)]
async fn cursor_yields_records_in_order() {
    let db = database().await;
    let ctx = Context::new();
    let model = db.model();

    let cursor = db
        .query(&ctx, "person")
        .order_by([model.node("person.id").descending()])
        .load_cursor()
        .await
        .unwrap();

    let people = cursor.collect::<Result<Vec<_>, _>>().unwrap();
    assert_eq!(people.len(), 5);
    assert_eq!(people[0].value("first_name"), Some(&Value::from("Wendy")));
}

#[test(tokio::test)]
async fn counts() {
    let db = database().await;
    let ctx = Context::new();
    let model = db.model();

    let all = db.query(&ctx, "project").count(false, vec![]).await.unwrap();
    assert_eq!(all, 4);

    let managers = db
        .query(&ctx, "project")
        .count(true, vec![model.node("project.manager_id")])
        .await
        .unwrap();
    assert_eq!(managers, 2);

    let smiths = db
        .query(&ctx, "project")
        .condition(op::eq(model.node("project.manager.last_name"), "Smith"))
        .count(false, vec![])
        .await
        .unwrap();
    assert_eq!(smiths, 3);

    let statuses = db
        .query(&ctx, "project")
        .group_by([model.node("project.status_id")])
        .count(false, vec![])
        .await
        .unwrap();
    assert_eq!(statuses, 3);
}

#[test(tokio::test)]
async fn delete_through_a_join() {
    let db = database().await;
    let ctx = Context::new();
    let model = db.model();

    db.query(&ctx, "project")
        .condition(op::eq(model.node("project.manager.first_name"), "Wendy"))
        .delete()
        .await
        .unwrap();

    let left = db
        .query(&ctx, "project")
        .order_by([model.node("project.num")])
        .load()
        .await
        .unwrap();
    assert_eq!(names(&left, "name"), ["State College HR System", "Payment App"]);
}

#[test(tokio::test)]
async fn row_operations_round_trip() {
    let db = database().await;
    let ctx = Context::new();
    let model = db.model();

    let fields = indexmap::IndexMap::from([
        ("first_name".to_string(), Value::from("Grace")),
        ("last_name".to_string(), Value::from("Hopper")),
    ]);
    let id = db.insert(&ctx, "person", &fields).await.unwrap();
    assert_eq!(id, "6");

    let by_id = || op::eq(model.node("person.id"), id.as_str());
    let people = db
        .query(&ctx, "person")
        .select([model.node("person.first_name"), model.node("person.last_name")])
        .condition(by_id())
        .load()
        .await
        .unwrap();
    assert_eq!(people[0].value("first_name"), fields.get("first_name"));
    assert_eq!(people[0].value("last_name"), fields.get("last_name"));

    let changes = indexmap::IndexMap::from([("last_name".to_string(), Value::from("Murray"))]);
    db.update(&ctx, "person", &changes, "id", Value::from(6))
        .await
        .unwrap();
    let people = db
        .query(&ctx, "person")
        .condition(by_id())
        .load()
        .await
        .unwrap();
    assert_eq!(people[0].value("last_name"), Some(&Value::from("Murray")));

    db.associate(
        &ctx,
        "person_persontype_assn",
        "person_id",
        Value::from(6),
        "person_type_id",
        &[Value::from(2), Value::from(3)],
    )
    .await
    .unwrap();
    let people = db
        .query(&ctx, "person")
        .join(model.node("person.person_types"))
        .condition(by_id())
        .load()
        .await
        .unwrap();
    assert_eq!(RecordExt::values(&people[0], "person_types").unwrap().len(), 2);

    db.delete(&ctx, "person", "id", Value::from(6)).await.unwrap();
    let people = db
        .query(&ctx, "person")
        .condition(by_id())
        .load()
        .await
        .unwrap();
    assert!(people.is_empty());
}

#[test(tokio::test)]
async fn cancelled_contexts_fail() {
    let db = database().await;
    let ctx = Context::new();
    ctx.cancel();

    let err = db.query(&ctx, "person").load().await.unwrap_err();
    assert!(matches!(err, DatabaseError::Cancelled));
}
