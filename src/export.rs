use crate::types::Dataset;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

/// Writes the joined death records as CSV: one row per death location with
/// its geographic position and nearest-pump assignment.
pub fn write_joined_csv(dataset: &Dataset, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV output: {:?}", path))?;

    writer.write_record(["lon", "lat", "count", "nearest_pump_id", "distance_m"])?;
    for death in &dataset.deaths {
        writer.write_record([
            death.lon.to_string(),
            death.lat.to_string(),
            death.count.to_string(),
            death.nearest_pump_id.clone(),
            format!("{:.1}", death.distance_m),
        ])?;
    }
    writer.flush()?;

    info!(file = ?path, rows = dataset.deaths.len(), "joined dataset exported");
    Ok(())
}
