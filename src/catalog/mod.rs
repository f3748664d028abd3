use anyhow::Result;
use sqlx::PgPool;
use tracing::debug;

pub mod align;
pub mod column;
pub mod dependency;
pub mod id;
pub mod schema;
pub mod table;
pub mod utils;

pub use column::align as align_columns;
pub use schema::align as align_schemas;
pub use table::align as align_tables;

/// Every ordered row list a collection run needs, grouped by object kind.
#[derive(Debug, Clone, Default)]
pub struct CatalogRows {
    pub schemas: schema::SchemaRows,
    pub tables: table::TableRows,
    pub columns: column::ColumnRows,
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub schemas: Vec<schema::MetadataSchema>,
    pub tables: Vec<table::MetadataTable>,
}

impl Catalog {
    #[allow(clippy::explicit_auto_deref)] // Required for PoolConnection -> PgConnection deref
    pub async fn load(pool: &PgPool) -> Result<Self> {
        // One connection for every fetch so all lists come from the same session
        let mut conn = pool.acquire().await?;

        let rows = CatalogRows {
            schemas: schema::fetch(&mut *conn).await?,
            tables: table::fetch(&mut *conn).await?,
            columns: column::fetch(&mut *conn).await?,
        };

        Self::assemble(&rows)
    }

    /// Merge the fetched lists into schemas and tables, columns grouped under their tables.
    pub fn assemble(rows: &CatalogRows) -> Result<Self> {
        let schemas = align_schemas(&rows.schemas)?;
        let mut tables = align_tables(&rows.tables)?;
        let columns = align_columns(&rows.columns)?;

        debug!(
            "Aligned {} schemas, {} tables, {} columns",
            schemas.len(),
            tables.len(),
            columns.len()
        );

        table::attach_columns(&mut tables, columns);

        Ok(Self { schemas, tables })
    }
}
