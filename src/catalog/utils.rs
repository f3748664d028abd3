/// Helper to check if a schema name belongs to the cluster rather than to users.
/// Used to keep system objects out of collection output and lineage reports.
pub fn is_system_schema(schema: &str) -> bool {
    matches!(
        schema,
        "pg_catalog"
            | "information_schema"
            | "pg_toast"
            | "pg_internal"
            | "pg_automv"
            | "catalog_history"
    ) || schema.starts_with("pg_temp_")
}
