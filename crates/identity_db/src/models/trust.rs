//! Trusts delegate a subset of a trustor's roles to a trustee

use super::{ModelModule, TableModel};

pub static MODULE: ModelModule = ModelModule {
    name: "trust",
    tables: &[
        TableModel {
            name: "trust",
            create_sql: r#"
                CREATE TABLE IF NOT EXISTS trust (
                    id VARCHAR(64) NOT NULL PRIMARY KEY,
                    trustor_user_id VARCHAR(64) NOT NULL,
                    trustee_user_id VARCHAR(64) NOT NULL,
                    project_id VARCHAR(64),
                    impersonation BOOLEAN NOT NULL,
                    deleted_at DATETIME,
                    expires_at DATETIME,
                    remaining_uses INTEGER,
                    extra TEXT
                )
            "#,
        },
        TableModel {
            name: "trust_role",
            create_sql: r#"
                CREATE TABLE IF NOT EXISTS trust_role (
                    trust_id VARCHAR(64) NOT NULL REFERENCES trust(id),
                    role_id VARCHAR(64) NOT NULL,
                    PRIMARY KEY (trust_id, role_id)
                )
            "#,
        },
    ],
};
