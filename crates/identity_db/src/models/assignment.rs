//! Domains, projects, roles and role assignments

use super::{ModelModule, TableModel};

pub static MODULE: ModelModule = ModelModule {
    name: "assignment",
    tables: &[
        TableModel {
            name: "domain",
            create_sql: r#"
                CREATE TABLE IF NOT EXISTS domain (
                    id VARCHAR(64) NOT NULL PRIMARY KEY,
                    name VARCHAR(64) NOT NULL UNIQUE,
                    enabled BOOLEAN NOT NULL DEFAULT 1,
                    extra TEXT
                )
            "#,
        },
        TableModel {
            name: "project",
            create_sql: r#"
                CREATE TABLE IF NOT EXISTS project (
                    id VARCHAR(64) NOT NULL PRIMARY KEY,
                    name VARCHAR(64) NOT NULL,
                    domain_id VARCHAR(64) NOT NULL REFERENCES domain(id),
                    description TEXT,
                    enabled BOOLEAN,
                    extra TEXT,
                    UNIQUE (domain_id, name)
                )
            "#,
        },
        TableModel {
            name: "role",
            create_sql: r#"
                CREATE TABLE IF NOT EXISTS role (
                    id VARCHAR(64) NOT NULL PRIMARY KEY,
                    name VARCHAR(255) NOT NULL UNIQUE,
                    extra TEXT
                )
            "#,
        },
        // One row per (actor, target, role); the type says which of user or
        // group the actor is and which of project or domain the target is.
        TableModel {
            name: "assignment",
            create_sql: r#"
                CREATE TABLE IF NOT EXISTS assignment (
                    type VARCHAR(64) NOT NULL
                        CHECK (type IN ('UserProject', 'GroupProject', 'UserDomain', 'GroupDomain')),
                    actor_id VARCHAR(64) NOT NULL,
                    target_id VARCHAR(64) NOT NULL,
                    role_id VARCHAR(64) NOT NULL REFERENCES role(id),
                    inherited BOOLEAN NOT NULL DEFAULT 0,
                    PRIMARY KEY (type, actor_id, target_id, role_id)
                )
            "#,
        },
    ],
};
