use config::{Config, Environment, File};
use failure::ResultExt;
use serde::Deserialize;
use slog_scope::info;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct PropertiesSettings {
    pub default_limit: usize,
    pub max_limit: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub bind: String,
    /// Directory the data pipeline writes into.
    pub data_dir: PathBuf,
    pub dataset_filename: String,
    pub archive_filename: String,
    /// Cap on the number of features one filter query may return.
    pub filter_limit: u64,
    pub archive_cache_secs: u64,
    pub tiles_max_zoom: i64,
    pub properties: PropertiesSettings,
}

impl Default for Settings {
    fn default() -> Settings {
        Settings {
            bind: "127.0.0.1:3000".to_string(),
            data_dir: PathBuf::from("data-pipeline/processed_data"),
            dataset_filename: "real_estate_1M.parquet".to_string(),
            archive_filename: "real_estate_1M.pmtiles".to_string(),
            filter_limit: 1_000_000,
            archive_cache_secs: 3600,
            tiles_max_zoom: 22,
            properties: PropertiesSettings {
                default_limit: 20,
                max_limit: 100,
            },
        }
    }
}

impl Settings {
    /// Defaults, overlaid with an optional `default.toml` from `config_dir`,
    /// overlaid with `HEIMSKRA_*` environment variables.
    pub fn new(config_dir: &Option<PathBuf>) -> Result<Settings, failure::Error> {
        let defaults = Settings::default();
        let mut config = Config::new();
        config.set_default("bind", defaults.bind.clone())?;
        config.set_default(
            "data_dir",
            defaults.data_dir.to_string_lossy().to_string(),
        )?;
        config.set_default("dataset_filename", defaults.dataset_filename.clone())?;
        config.set_default("archive_filename", defaults.archive_filename.clone())?;
        config.set_default("filter_limit", defaults.filter_limit as i64)?;
        config.set_default("archive_cache_secs", defaults.archive_cache_secs as i64)?;
        config.set_default("tiles_max_zoom", defaults.tiles_max_zoom)?;
        config.set_default(
            "properties.default_limit",
            defaults.properties.default_limit as i64,
        )?;
        config.set_default(
            "properties.max_limit",
            defaults.properties.max_limit as i64,
        )?;

        if let Some(dir) = config_dir {
            let path = dir.join("default");
            let path = path.to_str().ok_or_else(|| {
                failure::err_msg(format!(
                    "Could not read settings in '{}'",
                    dir.display()
                ))
            })?;
            info!("using configuration from {}", path);
            config
                .merge(File::with_name(path))
                .with_context(|e| format!("Could not merge configuration from {}: {}", path, e))?;
        }

        config.merge(Environment::with_prefix("HEIMSKRA").separator("__"))?;

        config
            .try_into()
            .with_context(|e| format!("Invalid configuration: {}", e))
            .map_err(failure::Error::from)
    }
}
