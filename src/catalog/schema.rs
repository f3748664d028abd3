//! Schemas merged from svv_all_schemas, svv_redshift_schemas and svv_external_schemas
use super::align::{Cursor, decode_base};
use super::id::{RowTuple, SchemaKey, SourceRecord};
use crate::db::rows::fetch_tuples;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgConnection;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaBase {
    pub database_name: String,
    pub schema_name: String,
    pub schema_owner: Option<i64>,
    pub schema_type: Option<String>,
    pub schema_acl: Option<String>,
    pub source_database: Option<String>,
    pub schema_option: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaRedshift {
    pub database_name: String,
    pub schema_name: String,
    pub schema_owner: Option<i64>,
    pub schema_type: Option<String>,
    pub schema_acl: Option<String>,
    pub schema_option: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaExternal {
    pub esoid: Option<i64>,
    pub eskind: Option<i64>,
    pub schemaname: String,
    pub esowner: Option<i64>,
    pub databasename: String,
    pub esoptions: Option<String>,
}

impl SourceRecord for SchemaBase {
    type Key = SchemaKey;
    const SOURCE: &'static str = "svv_all_schemas";

    fn key(&self) -> SchemaKey {
        SchemaKey::new(&self.database_name, &self.schema_name)
    }
}

impl SourceRecord for SchemaRedshift {
    type Key = SchemaKey;
    const SOURCE: &'static str = "svv_redshift_schemas";

    fn key(&self) -> SchemaKey {
        SchemaKey::new(&self.database_name, &self.schema_name)
    }
}

impl SourceRecord for SchemaExternal {
    type Key = SchemaKey;
    const SOURCE: &'static str = "svv_external_schemas";

    fn key(&self) -> SchemaKey {
        SchemaKey::new(&self.databasename, &self.schemaname)
    }
}

/// A schema with every source that describes it.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataSchema {
    pub database_name: String,
    pub schema_name: String,
    pub base: SchemaBase,
    pub redshift: Option<SchemaRedshift>,
    pub external: Option<SchemaExternal>,
}

impl MetadataSchema {
    pub fn new(base: SchemaBase) -> Self {
        Self {
            database_name: base.database_name.clone(),
            schema_name: base.schema_name.clone(),
            base,
            redshift: None,
            external: None,
        }
    }

    pub fn key(&self) -> SchemaKey {
        SchemaKey::new(&self.database_name, &self.schema_name)
    }
}

/// Ordered row lists for every schema source, as returned by the cluster.
#[derive(Debug, Clone, Default)]
pub struct SchemaRows {
    pub base: Vec<RowTuple>,
    pub redshift: Vec<RowTuple>,
    pub external: Vec<RowTuple>,
}

/// Merge the schema sources into one object per base row.
pub fn align(rows: &SchemaRows) -> Result<Vec<MetadataSchema>> {
    let mut redshift = Cursor::<SchemaRedshift>::new(&rows.redshift);
    let mut external = Cursor::<SchemaExternal>::new(&rows.external);

    let mut schemas = Vec::with_capacity(rows.base.len());
    for base in decode_base::<SchemaBase>(&rows.base) {
        let mut schema = MetadataSchema::new(base?);
        let key = schema.key();

        schema.redshift = redshift.take_if_key(&key)?;
        schema.external = external.take_if_key(&key)?;

        schemas.push(schema);
    }

    Ok(schemas)
}

pub async fn fetch(conn: &mut PgConnection) -> Result<SchemaRows> {
    info!("Fetching schemas...");

    let base = fetch_tuples(
        conn,
        SchemaBase::SOURCE,
        r#"
        SELECT
            database_name,
            schema_name,
            schema_owner,
            schema_type,
            schema_acl,
            source_database,
            schema_option
        FROM svv_all_schemas
        WHERE database_name = current_database()
          AND schema_name NOT IN ('information_schema', 'pg_catalog', 'pg_toast', 'pg_internal', 'pg_automv', 'catalog_history')
          AND schema_name NOT LIKE 'pg_temp_%'
        ORDER BY database_name, schema_name
        "#,
    )
    .await?;

    let redshift = fetch_tuples(
        conn,
        SchemaRedshift::SOURCE,
        r#"
        SELECT
            database_name,
            schema_name,
            schema_owner,
            schema_type,
            schema_acl,
            schema_option
        FROM svv_redshift_schemas
        WHERE database_name = current_database()
          AND schema_name NOT IN ('information_schema', 'pg_catalog', 'pg_toast', 'pg_internal', 'pg_automv', 'catalog_history')
          AND schema_name NOT LIKE 'pg_temp_%'
        ORDER BY database_name, schema_name
        "#,
    )
    .await?;

    let external = fetch_tuples(
        conn,
        SchemaExternal::SOURCE,
        r#"
        SELECT
            esoid,
            eskind,
            schemaname,
            esowner,
            databasename,
            esoptions
        FROM svv_external_schemas
        WHERE databasename = current_database()
        ORDER BY databasename, schemaname
        "#,
    )
    .await?;

    Ok(SchemaRows {
        base,
        redshift,
        external,
    })
}
