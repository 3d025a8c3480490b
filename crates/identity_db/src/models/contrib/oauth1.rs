//! OAuth 1.0a consumers and their request/access tokens

use crate::models::{ModelModule, TableModel};

pub static MODULE: ModelModule = ModelModule {
    name: "contrib.oauth1",
    tables: &[
        TableModel {
            name: "consumer",
            create_sql: r#"
                CREATE TABLE IF NOT EXISTS consumer (
                    id VARCHAR(64) NOT NULL PRIMARY KEY,
                    description VARCHAR(64),
                    secret VARCHAR(64) NOT NULL,
                    extra TEXT NOT NULL
                )
            "#,
        },
        TableModel {
            name: "request_token",
            create_sql: r#"
                CREATE TABLE IF NOT EXISTS request_token (
                    id VARCHAR(64) NOT NULL PRIMARY KEY,
                    request_secret VARCHAR(64) NOT NULL,
                    verifier VARCHAR(64),
                    authorizing_user_id VARCHAR(64),
                    requested_project_id VARCHAR(64) NOT NULL,
                    role_ids TEXT,
                    consumer_id VARCHAR(64) NOT NULL REFERENCES consumer(id),
                    expires_at VARCHAR(64)
                )
            "#,
        },
        TableModel {
            name: "access_token",
            create_sql: r#"
                CREATE TABLE IF NOT EXISTS access_token (
                    id VARCHAR(64) NOT NULL PRIMARY KEY,
                    access_secret VARCHAR(64) NOT NULL,
                    authorizing_user_id VARCHAR(64) NOT NULL,
                    project_id VARCHAR(64) NOT NULL,
                    role_ids TEXT NOT NULL,
                    consumer_id VARCHAR(64) NOT NULL REFERENCES consumer(id),
                    expires_at VARCHAR(64)
                )
            "#,
        },
    ],
};
