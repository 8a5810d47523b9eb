use crate::config::AppConfig;
use crate::error::PipelineError;
use crate::processing;
use crate::types::Dataset;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Identity of a pipeline run: the input files plus the CRS policy applied
/// to them. Two configs with the same key would build the same dataset.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatasetKey {
    deaths: PathBuf,
    pumps: PathBuf,
    source_crs: String,
}

impl DatasetKey {
    pub fn from_config(config: &AppConfig) -> Self {
        DatasetKey {
            deaths: config.input.deaths.clone(),
            pumps: config.input.pumps.clone(),
            source_crs: config.input.source_crs.clone(),
        }
    }
}

/// Explicit memoization of pipeline results. Loading and reprojecting are
/// the only real costs here, so repeated loads (UI-triggered, typically)
/// reuse the finished dataset. Invalidation is `force_refresh` or a
/// process restart; input files are not watched.
#[derive(Default)]
pub struct DatasetCache {
    entries: Mutex<HashMap<DatasetKey, Arc<Dataset>>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(
        &self,
        config: &AppConfig,
        force_refresh: bool,
    ) -> Result<Arc<Dataset>, PipelineError> {
        let key = DatasetKey::from_config(config);

        if !force_refresh {
            let entries = self.entries.lock().unwrap();
            if let Some(dataset) = entries.get(&key) {
                debug!(?key, "dataset cache hit");
                return Ok(Arc::clone(dataset));
            }
        }

        info!(?key, force_refresh, "building dataset");
        let dataset = Arc::new(processing::build_dataset(config)?);

        let mut entries = self.entries.lock().unwrap();
        entries.insert(key, Arc::clone(&dataset));
        Ok(dataset)
    }
}
