//! Columns merged from svv_columns, svv_redshift_columns and svv_external_columns
use super::align::{Cursor, decode_base};
use super::id::{ColumnKey, RowTuple, SourceRecord, TableKey};
use crate::db::rows::fetch_tuples;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgConnection;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnBase {
    pub database_name: String,
    pub schema_name: String,
    pub table_name: String,
    pub column_name: String,
    pub ordinal_position: i64,
    pub column_default: Option<String>,
    pub is_nullable: Option<String>,
    pub data_type: Option<String>,
    pub character_maximum_length: Option<i64>,
    pub numeric_precision: Option<i64>,
    pub numeric_scale: Option<i64>,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnRedshift {
    pub database_name: String,
    pub schema_name: String,
    pub table_name: String,
    pub column_name: String,
    pub ordinal_position: i64,
    pub data_type: Option<String>,
    pub column_default: Option<String>,
    pub is_nullable: Option<String>,
    pub encoding: Option<String>,
    pub distkey: Option<bool>,
    pub sortkey: Option<i64>,
    pub column_acl: Option<String>,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnExternal {
    pub databasename: String,
    pub schemaname: String,
    pub tablename: String,
    pub columnname: String,
    pub external_type: Option<String>,
    pub columnnum: i64,
    pub part_key: Option<i64>,
    pub is_nullable: Option<String>,
}

impl SourceRecord for ColumnBase {
    type Key = ColumnKey;
    const SOURCE: &'static str = "svv_columns";

    fn key(&self) -> ColumnKey {
        ColumnKey::new(
            &self.database_name,
            &self.schema_name,
            &self.table_name,
            self.ordinal_position,
        )
    }
}

impl SourceRecord for ColumnRedshift {
    type Key = ColumnKey;
    const SOURCE: &'static str = "svv_redshift_columns";

    fn key(&self) -> ColumnKey {
        ColumnKey::new(
            &self.database_name,
            &self.schema_name,
            &self.table_name,
            self.ordinal_position,
        )
    }
}

impl SourceRecord for ColumnExternal {
    type Key = ColumnKey;
    const SOURCE: &'static str = "svv_external_columns";

    fn key(&self) -> ColumnKey {
        ColumnKey::new(
            &self.databasename,
            &self.schemaname,
            &self.tablename,
            self.columnnum,
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetadataColumn {
    pub database_name: String,
    pub schema_name: String,
    pub table_name: String,
    pub column_name: String,
    pub ordinal_position: i64,
    pub base: ColumnBase,
    pub redshift: Option<ColumnRedshift>,
    pub external: Option<ColumnExternal>,
}

impl MetadataColumn {
    pub fn new(base: ColumnBase) -> Self {
        Self {
            database_name: base.database_name.clone(),
            schema_name: base.schema_name.clone(),
            table_name: base.table_name.clone(),
            column_name: base.column_name.clone(),
            ordinal_position: base.ordinal_position,
            base,
            redshift: None,
            external: None,
        }
    }

    pub fn key(&self) -> ColumnKey {
        ColumnKey::new(
            &self.database_name,
            &self.schema_name,
            &self.table_name,
            self.ordinal_position,
        )
    }

    pub fn table_key(&self) -> TableKey {
        TableKey::new(&self.database_name, &self.schema_name, &self.table_name)
    }

    /// Type as reported by the cluster, falling back to the external type
    pub fn data_type(&self) -> Option<&str> {
        self.base
            .data_type
            .as_deref()
            .or_else(|| self.external.as_ref()?.external_type.as_deref())
    }

    pub fn is_nullable(&self) -> bool {
        !matches!(self.base.is_nullable.as_deref(), Some("NO") | Some("false"))
    }
}

#[derive(Debug, Clone, Default)]
pub struct ColumnRows {
    pub base: Vec<RowTuple>,
    pub redshift: Vec<RowTuple>,
    pub external: Vec<RowTuple>,
}

pub fn align(rows: &ColumnRows) -> Result<Vec<MetadataColumn>> {
    let mut redshift = Cursor::<ColumnRedshift>::new(&rows.redshift);
    let mut external = Cursor::<ColumnExternal>::new(&rows.external);

    let mut columns = Vec::with_capacity(rows.base.len());
    for base in decode_base::<ColumnBase>(&rows.base) {
        let mut column = MetadataColumn::new(base?);
        let key = column.key();

        column.redshift = redshift.take_if_key(&key)?;
        column.external = external.take_if_key(&key)?;

        columns.push(column);
    }

    Ok(columns)
}

pub async fn fetch(conn: &mut PgConnection) -> Result<ColumnRows> {
    info!("Fetching columns...");

    let base = fetch_tuples(
        conn,
        ColumnBase::SOURCE,
        r#"
        SELECT
            table_catalog AS database_name,
            table_schema AS schema_name,
            table_name,
            column_name,
            ordinal_position::int8,
            column_default,
            is_nullable,
            data_type,
            character_maximum_length::int8,
            numeric_precision::int8,
            numeric_scale::int8,
            remarks
        FROM svv_columns
        WHERE table_catalog = current_database()
          AND table_schema NOT IN ('information_schema', 'pg_catalog', 'pg_toast', 'pg_internal', 'pg_automv', 'catalog_history')
          AND table_schema NOT LIKE 'pg_temp_%'
        ORDER BY table_catalog, table_schema, table_name, ordinal_position
        "#,
    )
    .await?;

    let redshift = fetch_tuples(
        conn,
        ColumnRedshift::SOURCE,
        r#"
        SELECT
            database_name,
            schema_name,
            table_name,
            column_name,
            ordinal_position::int8,
            data_type,
            column_default,
            is_nullable,
            encoding,
            distkey,
            sortkey::int8,
            column_acl,
            remarks
        FROM svv_redshift_columns
        WHERE database_name = current_database()
          AND schema_name NOT IN ('information_schema', 'pg_catalog', 'pg_toast', 'pg_internal', 'pg_automv', 'catalog_history')
          AND schema_name NOT LIKE 'pg_temp_%'
        ORDER BY database_name, schema_name, table_name, ordinal_position
        "#,
    )
    .await?;

    let external = fetch_tuples(
        conn,
        ColumnExternal::SOURCE,
        r#"
        SELECT
            redshift_database_name AS databasename,
            schemaname,
            tablename,
            columnname,
            external_type,
            columnnum::int8,
            part_key::int8,
            is_nullable
        FROM svv_external_columns
        WHERE redshift_database_name = current_database()
        ORDER BY redshift_database_name, schemaname, tablename, columnnum
        "#,
    )
    .await?;

    Ok(ColumnRows {
        base,
        redshift,
        external,
    })
}
