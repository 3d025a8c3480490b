//! Identity providers, the protocols they speak, and attribute mappings

use crate::models::{ModelModule, TableModel};

pub static MODULE: ModelModule = ModelModule {
    name: "contrib.federation",
    tables: &[
        TableModel {
            name: "identity_provider",
            create_sql: r#"
                CREATE TABLE IF NOT EXISTS identity_provider (
                    id VARCHAR(64) NOT NULL PRIMARY KEY,
                    enabled BOOLEAN NOT NULL,
                    description TEXT
                )
            "#,
        },
        TableModel {
            name: "federation_protocol",
            create_sql: r#"
                CREATE TABLE IF NOT EXISTS federation_protocol (
                    id VARCHAR(64) NOT NULL,
                    idp_id VARCHAR(64) NOT NULL
                        REFERENCES identity_provider(id) ON DELETE CASCADE,
                    mapping_id VARCHAR(64),
                    PRIMARY KEY (id, idp_id)
                )
            "#,
        },
        TableModel {
            name: "mapping",
            create_sql: r#"
                CREATE TABLE IF NOT EXISTS mapping (
                    id VARCHAR(64) NOT NULL PRIMARY KEY,
                    rules TEXT NOT NULL
                )
            "#,
        },
    ],
};
