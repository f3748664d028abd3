use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::config::{Config, ObjectFilter};
use crate::db::connection::{ConnectionConfig, connect_to_cluster};
use crate::entity::{EntityBuilder, render};

/// Collect the catalog and write the entity document
pub async fn cmd_collect(config: &Config) -> Result<()> {
    let catalog = load_filtered_catalog(config).await?;

    let document = EntityBuilder::new(&config.output).build(&catalog)?;
    let rendered = render(&document, config.output.format)?;

    match &config.output.path {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("Failed to write output to {}", path))?;
            info!(
                "Wrote {} schemas and {} tables to {}",
                document.schemas.len(),
                document.tables.len(),
                path
            );
        }
        None => println!("{}", rendered),
    }

    Ok(())
}

/// Connect, fetch every source, align, then apply the object filter.
pub async fn load_filtered_catalog(config: &Config) -> Result<Catalog> {
    let url = config.database.require_url()?;
    let pool = connect_to_cluster(url, "cluster", &ConnectionConfig::default()).await?;

    let catalog = Catalog::load(&pool).await;
    pool.close().await;
    let catalog = catalog?;

    let filtered = ObjectFilter::new(&config.objects).filter_catalog(catalog);
    debug!(
        "{} schemas and {} tables left after filtering",
        filtered.schemas.len(),
        filtered.tables.len()
    );

    Ok(filtered)
}
