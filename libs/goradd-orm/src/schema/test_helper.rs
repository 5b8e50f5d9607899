// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use serde_json::json;

use super::description::DatabaseDescription;
use crate::Model;

/// A small project-tracking schema: people manage projects, work on them as team members, have
/// addresses, an optional login and a set of person types.
pub(crate) fn sample_description() -> DatabaseDescription {
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
                    {"name": "name", "column_type": "string"},
                    {"name": "description", "column_type": "string"},
                    {"name": "is_active", "column_type": "bool"}
                ],
                "values": [
                    [1, "Open", "The project is open", true],
                    [2, "Cancelled", "The project has been canned", false],
                    [3, "Completed", "The project is done", false],
                    [4, "In Progress", "The project is under way", 1]
                ]
            }
        ],
        "tables": [
            {
                "name": "person",
                "columns": [
                    id,
                    {"name": "first_name", "column_type": "string", "max_char_length": 50},
                    {"name": "last_name", "column_type": "string", "max_char_length": 50}
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
                    {"name": "name", "column_type": "string", "max_char_length": 100},
                    {"name": "start_date", "column_type": "date_time", "is_nullable": true, "is_date_only": true},
                    {"name": "budget", "column_type": "float64", "is_nullable": true}
                ]
            },
            {
                "name": "address",
                "columns": [
                    id,
                    {"name": "person_id", "column_type": "int64",
                     "foreign_key": {"referenced_table": "person", "referenced_column": "id",
                                     "delete_action": "cascade"}},
                    {"name": "street", "column_type": "string"},
                    {"name": "city", "column_type": "string", "is_nullable": true}
                ]
            },
            {
                "name": "login",
                "columns": [
                    id,
                    {"name": "person_id", "column_type": "int64", "is_nullable": true,
                     "foreign_key": {"referenced_table": "person", "referenced_column": "id"}},
                    {"name": "username", "column_type": "string"},
                    {"name": "is_enabled", "column_type": "bool", "default_value": 1}
                ],
                "indexes": [{"is_unique": true, "columns": ["person_id"]}]
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

pub(crate) fn sample_model() -> Model {
    Model::import("goradd", "_id", "_enum", false, &sample_description())
        .unwrap()
        .value
}
