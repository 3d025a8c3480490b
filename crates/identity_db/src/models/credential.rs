use super::{ModelModule, TableModel};

pub static MODULE: ModelModule = ModelModule {
    name: "credential",
    tables: &[TableModel {
        name: "credential",
        create_sql: r#"
            CREATE TABLE IF NOT EXISTS credential (
                id VARCHAR(64) NOT NULL PRIMARY KEY,
                user_id VARCHAR(64) NOT NULL,
                project_id VARCHAR(64),
                blob TEXT NOT NULL,
                type VARCHAR(255) NOT NULL,
                extra TEXT
            )
        "#,
    }],
};
