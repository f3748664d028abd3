//! Inspect the lineage recovered from view definitions
//!
//! Useful when a view's upstream list looks wrong: the report shows what each
//! definition resolved to and which references point outside the collection.

use anyhow::Result;
use serde::Serialize;

use super::collect::load_filtered_catalog;
use crate::catalog::Catalog;
use crate::catalog::table::TableKind;
use crate::config::Config;
use crate::lineage::DependencyGraph;

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum DependencyFormat {
    /// Human-readable text format
    Text,
    /// JSON output for piping to jq
    Json,
}

/// Lineage of one collected object
#[derive(Debug, Serialize)]
pub struct ObjectLineage {
    pub uid: String,
    pub kind: TableKind,
    pub upstream: Vec<String>,
    pub downstream: Vec<String>,
}

/// Complete lineage report
#[derive(Debug, Serialize)]
pub struct DependencyReport {
    pub objects: Vec<ObjectLineage>,
    pub unresolved: Vec<String>,
    /// Upstream objects first
    pub order: Vec<String>,
}

pub async fn cmd_dependencies(
    config: &Config,
    format: DependencyFormat,
    object_filter: Option<&str>,
) -> Result<()> {
    let catalog = load_filtered_catalog(config).await?;
    let report = build_report(&catalog, object_filter)?;

    match format {
        DependencyFormat::Json => {
            let json = serde_json::to_string_pretty(&report)?;
            println!("{}", json);
        }
        DependencyFormat::Text => print_text_report(&report),
    }

    Ok(())
}

/// Build the report for every object, or those whose uid contains `object_filter`
pub fn build_report(catalog: &Catalog, object_filter: Option<&str>) -> Result<DependencyReport> {
    let graph = DependencyGraph::build(&catalog.tables);

    let objects = catalog
        .tables
        .iter()
        .map(|table| (table, table.as_dependency().uid()))
        .filter(|(_, uid)| object_filter.is_none_or(|filter| object_matches_filter(uid, filter)))
        .map(|(table, uid)| ObjectLineage {
            upstream: graph.upstream_of(&uid),
            downstream: graph.downstream_of(&uid),
            kind: table.kind(),
            uid,
        })
        .collect();

    Ok(DependencyReport {
        objects,
        unresolved: graph.unresolved(),
        order: graph.ordered()?,
    })
}

fn object_matches_filter(uid: &str, filter: &str) -> bool {
    uid.to_lowercase().contains(&filter.to_lowercase())
}

fn print_text_report(report: &DependencyReport) {
    println!("=== Lineage Report ===\n");

    println!("🔗 Object Dependencies");
    println!("{}", "─".repeat(50));
    for object in &report.objects {
        println!("  {} ({:?})", object.uid, object.kind);
        for upstream in &object.upstream {
            println!("    ← {}", upstream);
        }
        for downstream in &object.downstream {
            println!("    → {}", downstream);
        }
        if object.upstream.is_empty() && object.downstream.is_empty() {
            println!("    (no dependencies)");
        }
    }
    println!();

    if !report.unresolved.is_empty() {
        println!("⚠️  Referenced but not collected");
        println!("{}", "─".repeat(50));
        for uid in &report.unresolved {
            println!("  {}", uid);
        }
        println!();
    }
}
