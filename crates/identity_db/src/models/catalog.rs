//! Service catalog: regions, services and their endpoints

use super::{ModelModule, TableModel};

pub static MODULE: ModelModule = ModelModule {
    name: "catalog",
    tables: &[
        TableModel {
            name: "region",
            create_sql: r#"
                CREATE TABLE IF NOT EXISTS region (
                    id VARCHAR(64) NOT NULL PRIMARY KEY,
                    description VARCHAR(255) NOT NULL,
                    parent_region_id VARCHAR(64),
                    extra TEXT
                )
            "#,
        },
        TableModel {
            name: "service",
            create_sql: r#"
                CREATE TABLE IF NOT EXISTS service (
                    id VARCHAR(64) NOT NULL PRIMARY KEY,
                    type VARCHAR(255),
                    enabled BOOLEAN NOT NULL DEFAULT 1,
                    extra TEXT
                )
            "#,
        },
        TableModel {
            name: "endpoint",
            create_sql: r#"
                CREATE TABLE IF NOT EXISTS endpoint (
                    id VARCHAR(64) NOT NULL PRIMARY KEY,
                    legacy_endpoint_id VARCHAR(64),
                    interface VARCHAR(8) NOT NULL,
                    region VARCHAR(255),
                    service_id VARCHAR(64) NOT NULL REFERENCES service(id),
                    url TEXT NOT NULL,
                    enabled BOOLEAN NOT NULL DEFAULT 1,
                    extra TEXT
                )
            "#,
        },
    ],
};
