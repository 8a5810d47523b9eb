use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub input: InputConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    /// Point features with a death count per location (.shp or .geojson).
    pub deaths: PathBuf,
    /// Point features with a pump identifier (.shp or .geojson).
    pub pumps: PathBuf,
    /// Attribute column carrying the death count. Case-sensitive.
    #[serde(default = "default_count_column")]
    pub count_column: String,
    /// Attribute column carrying the pump identifier. Case-sensitive.
    #[serde(default = "default_pump_id_column")]
    pub pump_id_column: String,
    /// CRS both input files are expressed in. Selects the reprojection
    /// policy; "EPSG:27700" and "EPSG:4326" are supported.
    #[serde(default = "default_source_crs")]
    pub source_crs: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory of dashboard assets to serve at "/". Optional; the JSON
    /// API works without it.
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            port: default_port(),
            static_dir: None,
        }
    }
}

fn default_count_column() -> String {
    "Count".to_string()
}

fn default_pump_id_column() -> String {
    "Id".to_string()
}

fn default_source_crs() -> String {
    "EPSG:27700".to_string()
}

fn default_port() -> u16 {
    3000
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }
}
