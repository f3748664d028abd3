//! Tables and views merged from svv_tables, svv_all_tables, svv_redshift_tables,
//! svv_external_tables and svv_table_info, plus their columns and primary keys
use super::align::{Cursor, decode_base};
use super::column::MetadataColumn;
use super::dependency::{Dependency, extract_dependencies};
use super::id::{RowTuple, SourceRecord, TableKey};
use crate::db::rows::fetch_tuples;
use anyhow::Result;
use chrono::NaiveDateTime;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgConnection;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableBase {
    pub table_catalog: String,
    pub table_schema: String,
    pub table_name: String,
    pub table_type: Option<String>,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableAll {
    pub database_name: String,
    pub schema_name: String,
    pub table_name: String,
    pub table_type: Option<String>,
    pub table_acl: Option<String>,
    pub remarks: Option<String>,
    pub view_ddl: Option<String>,
    pub create_time: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRedshift {
    pub database_name: String,
    pub schema_name: String,
    pub table_name: String,
    pub table_type: Option<String>,
    pub table_acl: Option<String>,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableExternal {
    pub databasename: String,
    pub schemaname: String,
    pub tablename: String,
    pub location: Option<String>,
    pub input_format: Option<String>,
    pub output_format: Option<String>,
    pub serialization_lib: Option<String>,
    pub serde_parameters: Option<String>,
    pub compressed: Option<i64>,
    pub parameters: Option<String>,
    pub tabletype: Option<String>,
}

/// Storage statistics from svv_table_info; only populated for tables with data blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableInfo {
    pub database: String,
    pub schema: String,
    pub table_id: Option<i64>,
    pub table: String,
    pub encoded: Option<String>,
    pub diststyle: Option<String>,
    pub sortkey1: Option<String>,
    pub max_varchar: Option<i64>,
    pub sortkey1_enc: Option<String>,
    pub sortkey_num: Option<i64>,
    pub size: Option<i64>,
    pub pct_used: Option<f64>,
    pub empty: Option<i64>,
    pub unsorted: Option<f64>,
    pub stats_off: Option<f64>,
    pub tbl_rows: Option<i64>,
    pub skew_sortkey1: Option<f64>,
    pub skew_rows: Option<f64>,
    pub estimated_visible_rows: Option<i64>,
    pub vacuum_sort_benefit: Option<f64>,
}

/// One column of a table's primary key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimaryKeyColumn {
    pub database_name: String,
    pub schema_name: String,
    pub table_name: String,
    pub column_name: String,
}

impl SourceRecord for TableBase {
    type Key = TableKey;
    const SOURCE: &'static str = "svv_tables";

    fn key(&self) -> TableKey {
        TableKey::new(&self.table_catalog, &self.table_schema, &self.table_name)
    }
}

impl SourceRecord for TableAll {
    type Key = TableKey;
    const SOURCE: &'static str = "svv_all_tables";

    fn key(&self) -> TableKey {
        TableKey::new(&self.database_name, &self.schema_name, &self.table_name)
    }
}

impl SourceRecord for TableRedshift {
    type Key = TableKey;
    const SOURCE: &'static str = "svv_redshift_tables";

    fn key(&self) -> TableKey {
        TableKey::new(&self.database_name, &self.schema_name, &self.table_name)
    }
}

impl SourceRecord for TableExternal {
    type Key = TableKey;
    const SOURCE: &'static str = "svv_external_tables";

    fn key(&self) -> TableKey {
        TableKey::new(&self.databasename, &self.schemaname, &self.tablename)
    }
}

impl SourceRecord for TableInfo {
    type Key = TableKey;
    const SOURCE: &'static str = "svv_table_info";

    fn key(&self) -> TableKey {
        TableKey::new(&self.database, &self.schema, &self.table)
    }
}

impl SourceRecord for PrimaryKeyColumn {
    type Key = TableKey;
    const SOURCE: &'static str = "information_schema.key_column_usage";

    fn key(&self) -> TableKey {
        TableKey::new(&self.database_name, &self.schema_name, &self.table_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Table,
    View,
    ExternalTable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetadataTable {
    pub database_name: String,
    pub schema_name: String,
    pub table_name: String,
    pub base: TableBase,
    pub all: Option<TableAll>,
    pub redshift: Option<TableRedshift>,
    pub external: Option<TableExternal>,
    pub info: Option<TableInfo>,
    pub columns: Vec<MetadataColumn>,
    pub primary_keys: Vec<String>,
}

impl MetadataTable {
    pub fn new(base: TableBase) -> Self {
        Self {
            database_name: base.table_catalog.clone(),
            schema_name: base.table_schema.clone(),
            table_name: base.table_name.clone(),
            base,
            all: None,
            redshift: None,
            external: None,
            info: None,
            columns: Vec::new(),
            primary_keys: Vec::new(),
        }
    }

    pub fn key(&self) -> TableKey {
        TableKey::new(&self.database_name, &self.schema_name, &self.table_name)
    }

    /// This table as other views would reference it
    pub fn as_dependency(&self) -> Dependency {
        Dependency::new(&self.table_name, &self.schema_name)
    }

    pub fn view_definition(&self) -> Option<&str> {
        self.all.as_ref()?.view_ddl.as_deref()
    }

    /// Tables referenced by the view definition, parsed on every call.
    ///
    /// Pure given the object's state: the same table always yields the same list.
    pub fn dependencies(&self) -> Vec<Dependency> {
        extract_dependencies(self.view_definition())
    }

    pub fn kind(&self) -> TableKind {
        let table_type = self.base.table_type.as_deref().unwrap_or_default();
        if self.external.is_some() || table_type.contains("EXTERNAL") {
            TableKind::ExternalTable
        } else if table_type.contains("VIEW") {
            TableKind::View
        } else {
            TableKind::Table
        }
    }

    pub fn description(&self) -> Option<&str> {
        self.base
            .remarks
            .as_deref()
            .or_else(|| self.redshift.as_ref()?.remarks.as_deref())
    }

    pub fn is_primary_key(&self, column_name: &str) -> bool {
        self.primary_keys.iter().any(|pk| pk == column_name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TableRows {
    pub base: Vec<RowTuple>,
    pub all: Vec<RowTuple>,
    pub redshift: Vec<RowTuple>,
    pub external: Vec<RowTuple>,
    pub info: Vec<RowTuple>,
    pub primary_keys: Vec<RowTuple>,
}

pub fn align(rows: &TableRows) -> Result<Vec<MetadataTable>> {
    let mut all = Cursor::<TableAll>::new(&rows.all);
    let mut redshift = Cursor::<TableRedshift>::new(&rows.redshift);
    let mut external = Cursor::<TableExternal>::new(&rows.external);
    let mut info = Cursor::<TableInfo>::new(&rows.info);
    let mut primary_keys = Cursor::<PrimaryKeyColumn>::new(&rows.primary_keys);

    let mut tables = Vec::with_capacity(rows.base.len());
    for base in decode_base::<TableBase>(&rows.base) {
        let mut table = MetadataTable::new(base?);
        let key = table.key();

        table.all = all.take_if_key(&key)?;
        table.redshift = redshift.take_if_key(&key)?;
        table.external = external.take_if_key(&key)?;
        table.info = info.take_if_key(&key)?;
        table.primary_keys = primary_keys
            .take_run(&key)?
            .into_iter()
            .map(|pk| pk.column_name)
            .collect();

        tables.push(table);
    }

    Ok(tables)
}

/// Hand each table the run of columns that belongs to it.
///
/// Columns arrive in the same (database, schema, table) order as the tables,
/// so grouping walks both lists once and never looks back.
pub fn attach_columns(tables: &mut [MetadataTable], columns: Vec<MetadataColumn>) {
    let mut columns = columns.into_iter().peekable();
    for table in tables.iter_mut() {
        let key = table.key();
        table
            .columns
            .extend(columns.peeking_take_while(|c| c.table_key() == key));
    }
}

pub async fn fetch(conn: &mut PgConnection) -> Result<TableRows> {
    info!("Fetching tables...");

    let base = fetch_tuples(
        conn,
        TableBase::SOURCE,
        r#"
        SELECT
            table_catalog,
            table_schema,
            table_name,
            table_type,
            remarks
        FROM svv_tables
        WHERE table_catalog = current_database()
          AND table_schema NOT IN ('information_schema', 'pg_catalog', 'pg_toast', 'pg_internal', 'pg_automv', 'catalog_history')
          AND table_schema NOT LIKE 'pg_temp_%'
        ORDER BY table_catalog, table_schema, table_name
        "#,
    )
    .await?;

    let all = fetch_tuples(
        conn,
        TableAll::SOURCE,
        r#"
        SELECT
            t.database_name,
            t.schema_name,
            t.table_name,
            t.table_type,
            t.table_acl,
            t.remarks,
            v.definition AS view_ddl,
            ci.relcreationtime AS create_time
        FROM svv_all_tables t
        LEFT JOIN pg_views v
          ON v.schemaname = t.schema_name AND v.viewname = t.table_name
        LEFT JOIN pg_namespace n
          ON n.nspname = t.schema_name
        LEFT JOIN pg_class_info ci
          ON ci.relnamespace = n.oid AND ci.relname = t.table_name
        WHERE t.database_name = current_database()
          AND t.schema_name NOT IN ('information_schema', 'pg_catalog', 'pg_toast', 'pg_internal', 'pg_automv', 'catalog_history')
          AND t.schema_name NOT LIKE 'pg_temp_%'
        ORDER BY t.database_name, t.schema_name, t.table_name
        "#,
    )
    .await?;

    let redshift = fetch_tuples(
        conn,
        TableRedshift::SOURCE,
        r#"
        SELECT
            database_name,
            schema_name,
            table_name,
            table_type,
            table_acl,
            remarks
        FROM svv_redshift_tables
        WHERE database_name = current_database()
          AND schema_name NOT IN ('information_schema', 'pg_catalog', 'pg_toast', 'pg_internal', 'pg_automv', 'catalog_history')
          AND schema_name NOT LIKE 'pg_temp_%'
        ORDER BY database_name, schema_name, table_name
        "#,
    )
    .await?;

    let external = fetch_tuples(
        conn,
        TableExternal::SOURCE,
        r#"
        SELECT
            redshift_database_name AS databasename,
            schemaname,
            tablename,
            location,
            input_format,
            output_format,
            serialization_lib,
            serde_parameters,
            compressed::int8,
            parameters,
            tabletype
        FROM svv_external_tables
        WHERE redshift_database_name = current_database()
        ORDER BY redshift_database_name, schemaname, tablename
        "#,
    )
    .await?;

    let info = fetch_tuples(
        conn,
        TableInfo::SOURCE,
        r#"
        SELECT
            "database",
            "schema",
            table_id::int8,
            "table",
            encoded,
            diststyle,
            sortkey1,
            max_varchar::int8,
            sortkey1_enc,
            sortkey_num::int8,
            size::int8,
            pct_used::float8,
            empty::int8,
            unsorted::float8,
            stats_off::float8,
            tbl_rows::int8,
            skew_sortkey1::float8,
            skew_rows::float8,
            estimated_visible_rows::int8,
            vacuum_sort_benefit::float8
        FROM svv_table_info
        WHERE "database" = current_database()
        ORDER BY "database", "schema", "table"
        "#,
    )
    .await?;

    let primary_keys = fetch_tuples(
        conn,
        PrimaryKeyColumn::SOURCE,
        r#"
        SELECT
            kcu.table_catalog AS database_name,
            kcu.table_schema AS schema_name,
            kcu.table_name,
            kcu.column_name
        FROM information_schema.table_constraints tc
        JOIN information_schema.key_column_usage kcu
          ON kcu.constraint_name = tc.constraint_name
         AND kcu.table_schema = tc.table_schema
         AND kcu.table_name = tc.table_name
        WHERE tc.constraint_type = 'PRIMARY KEY'
          AND kcu.table_catalog = current_database()
        ORDER BY kcu.table_catalog, kcu.table_schema, kcu.table_name, kcu.ordinal_position
        "#,
    )
    .await?;

    Ok(TableRows {
        base,
        all,
        redshift,
        external,
        info,
        primary_keys,
    })
}
