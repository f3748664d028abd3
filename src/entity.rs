//! Publishable entities built from the merged catalog
use crate::catalog::Catalog;
use crate::catalog::column::MetadataColumn;
use crate::catalog::schema::MetadataSchema;
use crate::catalog::table::{MetadataTable, TableKind};
use crate::config::{Output, OutputFormat};
use crate::constants::*;
use crate::metadata::{MetadataExtension, append_metadata_extension};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct CollectionDocument {
    pub database: String,
    pub generated_at: DateTime<Utc>,
    pub schemas: Vec<SchemaEntity>,
    pub tables: Vec<TableEntity>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SchemaEntity {
    pub uid: String,
    pub name: String,
    pub owner: Option<i64>,
    pub metadata: Vec<MetadataExtension>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableEntity {
    pub uid: String,
    pub schema: String,
    pub name: String,
    pub kind: TableKind,
    pub description: Option<String>,
    pub columns: Vec<ColumnEntity>,
    pub primary_keys: Vec<String>,
    /// Uids of the tables a view reads from
    pub upstream: Vec<String>,
    pub metadata: Vec<MetadataExtension>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnEntity {
    pub name: String,
    pub ordinal_position: i64,
    pub data_type: Option<String>,
    pub nullable: bool,
    pub default: Option<String>,
    pub description: Option<String>,
    pub primary_key: bool,
    pub metadata: Vec<MetadataExtension>,
}

pub struct EntityBuilder<'a> {
    output: &'a Output,
}

impl<'a> EntityBuilder<'a> {
    pub fn new(output: &'a Output) -> Self {
        Self { output }
    }

    pub fn build(&self, catalog: &Catalog) -> Result<CollectionDocument> {
        let database = catalog
            .schemas
            .first()
            .map(|s| s.database_name.clone())
            .or_else(|| catalog.tables.first().map(|t| t.database_name.clone()))
            .unwrap_or_default();

        let schemas = catalog
            .schemas
            .iter()
            .map(|s| self.schema_entity(s))
            .collect::<Result<Vec<_>>>()?;

        let tables = catalog
            .tables
            .iter()
            .map(|t| self.table_entity(t))
            .collect::<Result<Vec<_>>>()?;

        Ok(CollectionDocument {
            database,
            generated_at: Utc::now(),
            schemas,
            tables,
        })
    }

    pub fn schema_entity(&self, schema: &MetadataSchema) -> Result<SchemaEntity> {
        let mut metadata = Vec::new();
        append_metadata_extension(
            &mut metadata,
            &self.output.schema_url(SCHEMA_BASE_DEFINITION),
            Some(&schema.base),
            Some(SCHEMA_EXCLUDED_KEYS),
        )?;

        if self.output.extended_metadata {
            append_metadata_extension(
                &mut metadata,
                &self.output.schema_url(SCHEMA_REDSHIFT_DEFINITION),
                schema.redshift.as_ref(),
                Some(SCHEMA_EXCLUDED_KEYS),
            )?;
            append_metadata_extension(
                &mut metadata,
                &self.output.schema_url(SCHEMA_EXTERNAL_DEFINITION),
                schema.external.as_ref(),
                None,
            )?;
        }

        Ok(SchemaEntity {
            uid: schema.schema_name.clone(),
            name: schema.schema_name.clone(),
            owner: schema.base.schema_owner,
            metadata,
        })
    }

    pub fn table_entity(&self, table: &MetadataTable) -> Result<TableEntity> {
        let mut metadata = Vec::new();
        append_metadata_extension(
            &mut metadata,
            &self.output.schema_url(TABLE_BASE_DEFINITION),
            Some(&table.base),
            None,
        )?;

        if self.output.extended_metadata {
            append_metadata_extension(
                &mut metadata,
                &self.output.schema_url(TABLE_ALL_DEFINITION),
                table.all.as_ref(),
                Some(TABLE_ALL_EXCLUDED_KEYS),
            )?;
            append_metadata_extension(
                &mut metadata,
                &self.output.schema_url(TABLE_REDSHIFT_DEFINITION),
                table.redshift.as_ref(),
                None,
            )?;
            append_metadata_extension(
                &mut metadata,
                &self.output.schema_url(TABLE_EXTERNAL_DEFINITION),
                table.external.as_ref(),
                None,
            )?;
            append_metadata_extension(
                &mut metadata,
                &self.output.schema_url(TABLE_INFO_DEFINITION),
                table.info.as_ref(),
                None,
            )?;
        }

        let kind = table.kind();
        let upstream = match kind {
            TableKind::View => table.dependencies().iter().map(|d| d.uid()).collect(),
            _ => Vec::new(),
        };

        let columns = table
            .columns
            .iter()
            .map(|c| self.column_entity(table, c))
            .collect::<Result<Vec<_>>>()
            .with_context(|| format!("Failed to build columns of {}", table.key()))?;

        Ok(TableEntity {
            uid: table.as_dependency().uid(),
            schema: table.schema_name.clone(),
            name: table.table_name.clone(),
            kind,
            description: table.description().map(str::to_string),
            columns,
            primary_keys: table.primary_keys.clone(),
            upstream,
            metadata,
        })
    }

    fn column_entity(
        &self,
        table: &MetadataTable,
        column: &MetadataColumn,
    ) -> Result<ColumnEntity> {
        let mut metadata = Vec::new();
        append_metadata_extension(
            &mut metadata,
            &self.output.schema_url(COLUMN_BASE_DEFINITION),
            Some(&column.base),
            None,
        )?;

        if self.output.extended_metadata {
            append_metadata_extension(
                &mut metadata,
                &self.output.schema_url(COLUMN_REDSHIFT_DEFINITION),
                column.redshift.as_ref(),
                None,
            )?;
            append_metadata_extension(
                &mut metadata,
                &self.output.schema_url(COLUMN_EXTERNAL_DEFINITION),
                column.external.as_ref(),
                None,
            )?;
        }

        Ok(ColumnEntity {
            name: column.column_name.clone(),
            ordinal_position: column.ordinal_position,
            data_type: column.data_type().map(str::to_string),
            nullable: column.is_nullable(),
            default: column.base.column_default.clone(),
            description: column.base.remarks.clone(),
            primary_key: table.is_primary_key(&column.column_name),
            metadata,
        })
    }
}

/// Serialize the document in the configured format
pub fn render(document: &CollectionDocument, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(document).context("Failed to serialize document as JSON")
        }
        OutputFormat::Yaml => {
            serde_yaml::to_string(document).context("Failed to serialize document as YAML")
        }
    }
}
