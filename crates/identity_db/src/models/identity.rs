//! Users, groups and group membership

use super::{ModelModule, TableModel};

pub static MODULE: ModelModule = ModelModule {
    name: "identity",
    tables: &[
        TableModel {
            name: "user",
            create_sql: r#"
                CREATE TABLE IF NOT EXISTS user (
                    id VARCHAR(64) NOT NULL PRIMARY KEY,
                    name VARCHAR(255) NOT NULL,
                    domain_id VARCHAR(64) NOT NULL,
                    password VARCHAR(128),
                    enabled BOOLEAN,
                    default_project_id VARCHAR(64),
                    extra TEXT,
                    UNIQUE (domain_id, name)
                )
            "#,
        },
        TableModel {
            name: "group",
            create_sql: r#"
                CREATE TABLE IF NOT EXISTS "group" (
                    id VARCHAR(64) NOT NULL PRIMARY KEY,
                    domain_id VARCHAR(64) NOT NULL,
                    name VARCHAR(64) NOT NULL,
                    description TEXT,
                    extra TEXT,
                    UNIQUE (domain_id, name)
                )
            "#,
        },
        TableModel {
            name: "user_group_membership",
            create_sql: r#"
                CREATE TABLE IF NOT EXISTS user_group_membership (
                    user_id VARCHAR(64) NOT NULL REFERENCES user(id),
                    group_id VARCHAR(64) NOT NULL REFERENCES "group"(id),
                    PRIMARY KEY (user_id, group_id)
                )
            "#,
        },
    ],
};
