use crate::config::{merge::Merge, types::*};
use crate::constants::DATABASE_URL_ENV_VARS;
use anyhow::{Result, anyhow};

pub struct ConfigBuilder {
    config_input: ConfigInput,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config_input: ConfigInput::default(),
        }
    }

    pub fn with_file(mut self, file_input: ConfigInput) -> Self {
        self.config_input = self.config_input.merge(file_input);
        self
    }

    pub fn with_cli_args(mut self, cli_input: ConfigInput) -> Self {
        self.config_input = self.config_input.merge(cli_input);
        self
    }

    pub fn resolve(self) -> Result<Config> {
        let defaults = Config::default();

        Ok(Config {
            database: self.resolve_database(),
            objects: self.resolve_objects(&defaults.objects),
            output: self.resolve_output(&defaults.output),
        })
    }

    fn resolve_database(&self) -> Database {
        let url = self
            .config_input
            .database
            .as_ref()
            .and_then(|d| d.url.as_ref())
            .cloned()
            .or_else(|| {
                DATABASE_URL_ENV_VARS
                    .iter()
                    .find_map(|var| std::env::var(var).ok())
            })
            .filter(|url| !url.trim().is_empty());

        Database { url }
    }

    fn resolve_objects(&self, defaults: &Objects) -> Objects {
        let obj_input = self.config_input.objects.as_ref();

        let include = obj_input
            .and_then(|o| o.include.as_ref())
            .map(|i| ObjectInclude {
                schemas: i.schemas.as_ref().cloned().unwrap_or_default(),
                tables: i.tables.as_ref().cloned().unwrap_or_default(),
            })
            .unwrap_or_else(|| defaults.include.clone());

        let exclude = obj_input
            .and_then(|o| o.exclude.as_ref())
            .map(|e| ObjectExclude {
                schemas: e
                    .exclude_schemas
                    .as_ref()
                    .cloned()
                    .unwrap_or_else(|| defaults.exclude.schemas.clone()),
                tables: e
                    .exclude_tables
                    .as_ref()
                    .cloned()
                    .unwrap_or_else(|| defaults.exclude.tables.clone()),
            })
            .unwrap_or_else(|| defaults.exclude.clone());

        Objects { include, exclude }
    }

    fn resolve_output(&self, defaults: &Output) -> Output {
        let out_input = self.config_input.output.as_ref();

        Output {
            format: out_input
                .and_then(|o| o.format)
                .unwrap_or(defaults.format),
            path: out_input
                .and_then(|o| o.path.as_ref())
                .cloned()
                .or_else(|| defaults.path.clone()),
            extended_metadata: out_input
                .and_then(|o| o.extended_metadata)
                .unwrap_or(defaults.extended_metadata),
            schema_url_prefix: out_input
                .and_then(|o| o.schema_url_prefix.as_ref())
                .cloned()
                .unwrap_or_else(|| defaults.schema_url_prefix.clone()),
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Database {
    /// The cluster URL, required by every command that connects
    pub fn require_url(&self) -> Result<&str> {
        self.url.as_deref().ok_or_else(|| {
            anyhow!(
                "No database URL configured. Pass --database-url, set {}, or add database.url to the config file",
                DATABASE_URL_ENV_VARS.join(" or ")
            )
        })
    }
}
