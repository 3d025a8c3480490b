use super::{ModelModule, TableModel};

pub static MODULE: ModelModule = ModelModule {
    name: "policy",
    tables: &[TableModel {
        name: "policy",
        create_sql: r#"
            CREATE TABLE IF NOT EXISTS policy (
                id VARCHAR(64) NOT NULL PRIMARY KEY,
                type VARCHAR(255) NOT NULL,
                blob TEXT NOT NULL,
                extra TEXT
            )
        "#,
    }],
};
