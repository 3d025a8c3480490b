use crate::models::{ModelModule, TableModel};

pub static MODULE: ModelModule = ModelModule {
    name: "contrib.revoke",
    tables: &[TableModel {
        name: "revocation_event",
        create_sql: r#"
            CREATE TABLE IF NOT EXISTS revocation_event (
                id VARCHAR(64) NOT NULL PRIMARY KEY,
                domain_id VARCHAR(64),
                project_id VARCHAR(64),
                user_id VARCHAR(64),
                role_id VARCHAR(64),
                trust_id VARCHAR(64),
                consumer_id VARCHAR(64),
                access_token_id VARCHAR(64),
                issued_before DATETIME NOT NULL,
                expires_at DATETIME,
                revoked_at DATETIME NOT NULL
            );
            CREATE INDEX IF NOT EXISTS ix_revocation_event_revoked_at
                ON revocation_event (revoked_at);
        "#,
    }],
};
