use crate::config::types::*;
use crate::constants::DEFAULT_SCHEMA_URL_PREFIX;

impl Default for Output {
    fn default() -> Self {
        Self {
            format: OutputFormat::Json,
            path: None,
            extended_metadata: false,
            schema_url_prefix: DEFAULT_SCHEMA_URL_PREFIX.to_string(),
        }
    }
}

impl Output {
    /// Full schema URL for one metadata definition
    pub fn schema_url(&self, definition: &str) -> String {
        format!(
            "{}/{}",
            self.schema_url_prefix.trim_end_matches('/'),
            definition
        )
    }
}
