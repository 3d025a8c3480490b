//! Persistent tokens
//!
//! Expiry lookups and the periodic flush both filter on `expires`, hence the
//! two indexes.

use super::{ModelModule, TableModel};

pub static MODULE: ModelModule = ModelModule {
    name: "token",
    tables: &[TableModel {
        name: "token",
        create_sql: r#"
            CREATE TABLE IF NOT EXISTS token (
                id VARCHAR(64) NOT NULL PRIMARY KEY,
                expires DATETIME,
                extra TEXT,
                valid BOOLEAN NOT NULL DEFAULT 1,
                trust_id VARCHAR(64),
                user_id VARCHAR(64)
            );
            CREATE INDEX IF NOT EXISTS ix_token_expires ON token (expires);
            CREATE INDEX IF NOT EXISTS ix_token_expires_valid ON token (expires, valid);
        "#,
    }],
};
