//! View lineage assembled from the dependencies of every collected table
use crate::catalog::table::MetadataTable;
use crate::catalog::utils::is_system_schema;
use anyhow::{Result, anyhow};
use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Directed graph of `schema.name` uids with an edge from each upstream
/// table to every view that reads it.
pub struct DependencyGraph {
    graph: DiGraph<String, ()>,
    nodes: BTreeMap<String, NodeIndex>,
    collected: BTreeSet<String>,
}

impl DependencyGraph {
    pub fn build(tables: &[MetadataTable]) -> Self {
        let mut lineage = Self {
            graph: DiGraph::new(),
            nodes: BTreeMap::new(),
            collected: BTreeSet::new(),
        };

        for table in tables {
            let uid = table.as_dependency().uid();
            lineage.node(&uid);
            lineage.collected.insert(uid);
        }

        for table in tables {
            let to = lineage.node(&table.as_dependency().uid());
            for dependency in table.dependencies() {
                let from = lineage.node(&dependency.uid());
                lineage.graph.update_edge(from, to, ());
            }
        }

        debug!(
            "Built lineage graph with {} nodes and {} edges",
            lineage.graph.node_count(),
            lineage.graph.edge_count()
        );

        lineage
    }

    fn node(&mut self, uid: &str) -> NodeIndex {
        if let Some(&index) = self.nodes.get(uid) {
            return index;
        }
        let index = self.graph.add_node(uid.to_string());
        self.nodes.insert(uid.to_string(), index);
        index
    }

    fn neighbors(&self, uid: &str, direction: Direction) -> Vec<String> {
        let Some(&index) = self.nodes.get(uid) else {
            return Vec::new();
        };
        let mut uids: Vec<String> = self
            .graph
            .neighbors_directed(index, direction)
            .map(|n| self.graph[n].clone())
            .collect();
        uids.sort();
        uids
    }

    /// Tables the given object reads from directly
    pub fn upstream_of(&self, uid: &str) -> Vec<String> {
        self.neighbors(uid, Direction::Incoming)
    }

    /// Views that read the given object directly
    pub fn downstream_of(&self, uid: &str) -> Vec<String> {
        self.neighbors(uid, Direction::Outgoing)
    }

    /// Referenced uids that were not collected, system schemas aside
    pub fn unresolved(&self) -> Vec<String> {
        self.nodes
            .keys()
            .filter(|uid| !self.collected.contains(*uid))
            .filter(|uid| {
                let schema = uid.split_once('.').map(|(s, _)| s).unwrap_or_default();
                !is_system_schema(schema)
            })
            .cloned()
            .collect()
    }

    /// Every uid, upstream objects before the views that read them
    pub fn ordered(&self) -> Result<Vec<String>> {
        let sorted = toposort(&self.graph, None).map_err(|cycle| {
            anyhow!(
                "Dependency cycle detected involving {}. Check the view definitions for circular references.",
                self.graph[cycle.node_id()]
            )
        })?;

        Ok(sorted.into_iter().map(|n| self.graph[n].clone()).collect())
    }
}
