use crate::models::{ModelModule, TableModel};

pub static MODULE: ModelModule = ModelModule {
    name: "contrib.endpoint_filter",
    tables: &[TableModel {
        name: "project_endpoint",
        create_sql: r#"
            CREATE TABLE IF NOT EXISTS project_endpoint (
                endpoint_id VARCHAR(64) NOT NULL,
                project_id VARCHAR(64) NOT NULL,
                PRIMARY KEY (endpoint_id, project_id)
            )
        "#,
    }],
};
