// Configuration file name
pub const CONFIG_FILENAME: &str = "rsmeta.yaml";

// Environment variables consulted for the cluster URL, in order
pub const DATABASE_URL_ENV_VARS: &[&str] = &["REDSHIFT_DATABASE_URL", "DATABASE_URL"];

/// Schema that unqualified table references resolve to
pub const DEFAULT_SCHEMA: &str = "public";

// Metadata extension schema identifiers, appended to the configured prefix
pub const DEFAULT_SCHEMA_URL_PREFIX: &str =
    "https://rsmeta.dev/schemas/redshift-metadata.json#/definitions";
pub const SCHEMA_BASE_DEFINITION: &str = "SchemaBase";
pub const SCHEMA_REDSHIFT_DEFINITION: &str = "SchemaRedshift";
pub const SCHEMA_EXTERNAL_DEFINITION: &str = "SchemaExternal";
pub const TABLE_BASE_DEFINITION: &str = "TableBase";
pub const TABLE_ALL_DEFINITION: &str = "TableAll";
pub const TABLE_REDSHIFT_DEFINITION: &str = "TableRedshift";
pub const TABLE_EXTERNAL_DEFINITION: &str = "TableExternal";
pub const TABLE_INFO_DEFINITION: &str = "TableInfo";
pub const COLUMN_BASE_DEFINITION: &str = "ColumnBase";
pub const COLUMN_REDSHIFT_DEFINITION: &str = "ColumnRedshift";
pub const COLUMN_EXTERNAL_DEFINITION: &str = "ColumnExternal";

/// Schema base fields already carried by the entity itself
pub const SCHEMA_EXCLUDED_KEYS: &[&str] = &["database_name", "schema_name"];

/// Table `all` fields left out of the projection; the view body surfaces as `upstream`
pub const TABLE_ALL_EXCLUDED_KEYS: &[&str] = &["view_ddl"];
