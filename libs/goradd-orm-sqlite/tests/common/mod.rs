// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use goradd_orm::{Model, SqlDatabase, schema::description::DatabaseDescription};
use goradd_orm_sqlite::SqliteDriver;
use serde_json::json;

pub const KEY: &str = "goradd";

const SCHEMA: &str = r#"
CREATE TABLE person_type_enum (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
CREATE TABLE project_status_enum (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
CREATE TABLE person (
    id INTEGER PRIMARY KEY,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL
);
CREATE TABLE project (
    id INTEGER PRIMARY KEY,
    num INTEGER NOT NULL,
    status_id INTEGER NOT NULL REFERENCES project_status_enum (id),
    manager_id INTEGER REFERENCES person (id) ON DELETE SET NULL,
    name TEXT NOT NULL,
    budget REAL
);
CREATE TABLE login (
    id INTEGER PRIMARY KEY,
    person_id INTEGER UNIQUE REFERENCES person (id),
    username TEXT NOT NULL
);
CREATE TABLE team_member_project_assn (
    team_member_id INTEGER NOT NULL REFERENCES person (id),
    project_id INTEGER NOT NULL REFERENCES project (id),
    PRIMARY KEY (team_member_id, project_id)
);
CREATE TABLE person_persontype_assn (
    person_id INTEGER NOT NULL REFERENCES person (id),
    person_type_id INTEGER NOT NULL REFERENCES person_type_enum (id),
    PRIMARY KEY (person_id, person_type_id)
);

INSERT INTO person_type_enum VALUES (1, 'Contractor'), (2, 'Manager'), (3, 'Inactive');
INSERT INTO project_status_enum VALUES (1, 'Open'), (2, 'Cancelled'), (3, 'Completed');
INSERT INTO person VALUES
    (1, 'John', 'Doe'),
    (2, 'Kendall', 'Public'),
    (3, 'Ben', 'Wolfe'),
    (4, 'Alex', 'Smith'),
    (5, 'Wendy', 'Smith');
INSERT INTO project VALUES
    (1, 1, 3, 5, 'ACME Website Redesign', 9560.25),
    (2, 2, 3, 4, 'State College HR System', 40200),
    (3, 3, 1, 5, 'Blueroomers', 20000),
    (4, 4, 2, NULL, 'Payment App', NULL);
INSERT INTO login VALUES (1, 1, 'jdoe'), (2, 3, 'bwolfe');
INSERT INTO team_member_project_assn VALUES (1, 1), (2, 1), (3, 2);
INSERT INTO person_persontype_assn VALUES (1, 1), (1, 2), (3, 2);
"#;

fn description() -> DatabaseDescription {
    let id = json!({"name": "id", "column_type": "int64", "is_id": true, "is_pk": true});

    serde_json::from_value(json!({
        "enum_tables": [
            {
                "name": "person_type_enum",
                "columns": [
                    {"name": "id", "column_type": "int", "is_pk": true},
                    {"name": "name", "column_type": "string"}
                ],
                "values": [[1, "Contractor"], [2, "Manager"], [3, "Inactive"]]
            },
            {
                "name": "project_status_enum",
                "columns": [
                    {"name": "id", "column_type": "int", "is_pk": true},
                    {"name": "name", "column_type": "string"}
                ],
                "values": [[1, "Open"], [2, "Cancelled"], [3, "Completed"]]
            }
        ],
        "tables": [
            {
                "name": "person",
                "columns": [
                    id,
                    {"name": "first_name", "column_type": "string"},
                    {"name": "last_name", "column_type": "string"}
                ]
            },
            {
                "name": "project",
                "columns": [
                    id,
                    {"name": "num", "column_type": "int"},
                    {"name": "status_id", "column_type": "int",
                     "foreign_key": {"referenced_table": "project_status_enum", "referenced_column": "id"}},
                    {"name": "manager_id", "column_type": "int64", "is_nullable": true,
                     "foreign_key": {"referenced_table": "person", "referenced_column": "id",
                                     "delete_action": "set_null"}},
                    {"name": "name", "column_type": "string"},
                    {"name": "budget", "column_type": "float64", "is_nullable": true}
                ]
            },
            {
                "name": "login",
                "columns": [
                    id,
                    {"name": "person_id", "column_type": "int64", "is_nullable": true, "is_unique": true,
                     "foreign_key": {"referenced_table": "person", "referenced_column": "id"}},
                    {"name": "username", "column_type": "string"}
                ]
            }
        ],
        "many_many": [
            {
                "assn_table": "team_member_project_assn",
                "table1": "person", "column1": "team_member_id",
                "table2": "project", "column2": "project_id",
                "name1": "TeamMember", "plural1": "TeamMembers",
                "name2": "Project", "plural2": "Projects",
                "supports_foreign_keys": true
            },
            {
                "assn_table": "person_persontype_assn",
                "table1": "person", "column1": "person_id",
                "table2": "person_type_enum", "column2": "person_type_id",
                "supports_foreign_keys": true
            }
        ]
    }))
    .unwrap()
}

pub fn model() -> Model {
    Model::import(KEY, "_id", "_enum", false, &description())
        .unwrap()
        .value
}

/// A seeded in-memory database
pub async fn database() -> SqlDatabase<SqliteDriver> {
    let driver = SqliteDriver::open_in_memory().unwrap();
    driver.execute_batch(SCHEMA).await.unwrap();
    SqlDatabase::new(KEY, model(), driver)
}
