use crate::catalog::{self, utils::is_system_schema};
use crate::config::types::{ObjectExclude, ObjectInclude, Objects};
use glob::Pattern;

/// Object filter for determining which collected objects end up in the output
pub struct ObjectFilter {
    include: ObjectInclude,
    exclude: ObjectExclude,
}

impl ObjectFilter {
    /// Create a new object filter from configuration
    pub fn new(config: &Objects) -> Self {
        Self {
            include: config.include.clone(),
            exclude: config.exclude.clone(),
        }
    }

    /// Check if a schema should be included
    pub fn should_include_schema(&self, schema_name: &str) -> bool {
        if is_system_schema(schema_name) {
            return false;
        }

        // Check exclude patterns first
        if self.matches_patterns(&self.exclude.schemas, schema_name) {
            return false;
        }

        // If include patterns are specified, schema must match one of them
        if !self.include.schemas.is_empty() {
            return self.matches_patterns(&self.include.schemas, schema_name);
        }

        true
    }

    /// Check if a table should be included
    pub fn should_include_table(&self, schema_name: &str, table_name: &str) -> bool {
        if !self.should_include_schema(schema_name) {
            return false;
        }

        if self.matches_patterns(&self.exclude.tables, table_name) {
            return false;
        }

        if !self.include.tables.is_empty() {
            return self.matches_patterns(&self.include.tables, table_name);
        }

        true
    }

    /// Apply filter to an aligned catalog.
    ///
    /// Runs after alignment: the cursors need the complete ordered lists, and
    /// dropping base rows first would strand the auxiliary rows that match them.
    pub fn filter_catalog(&self, mut catalog: catalog::Catalog) -> catalog::Catalog {
        catalog
            .schemas
            .retain(|schema| self.should_include_schema(&schema.schema_name));

        catalog
            .tables
            .retain(|table| self.should_include_table(&table.schema_name, &table.table_name));

        catalog
    }

    /// Check if a name matches any of the glob patterns
    fn matches_patterns(&self, patterns: &[String], name: &str) -> bool {
        patterns.iter().any(|pattern| {
            Pattern::new(pattern)
                .map(|p| p.matches(name))
                .unwrap_or(false)
        })
    }
}
