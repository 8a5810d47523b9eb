use crate::config::AppConfig;
use crate::data;
use crate::error::PipelineError;
use crate::reproject::{CrsPolicy, Reprojector};
use crate::types::{Dataset, DeathRecord, PumpRecord};
use geo::Point;
use tracing::info;

/// Runs the full load → reproject → join pipeline and assembles the
/// immutable dataset the presentation layer consumes.
pub fn build_dataset(config: &AppConfig) -> Result<Dataset, PipelineError> {
    let raw_deaths = data::load_deaths(&config.input.deaths, &config.input.count_column)?;
    let raw_pumps = data::load_pumps(&config.input.pumps, &config.input.pump_id_column)?;

    let policy = CrsPolicy::from_crs(&config.input.source_crs)?;
    let reprojector = Reprojector::new(policy)?;

    let death_points: Vec<Point<f64>> = raw_deaths.iter().map(|d| d.point).collect();
    let pump_points: Vec<Point<f64>> = raw_pumps.iter().map(|p| p.point).collect();

    // Join on source-CRS coordinates, where the unit scale is exact under
    // the grid policy and a calibrated constant under the degree policy.
    let assignments = nearest_pumps(&death_points, &pump_points, reprojector.meters_per_unit())?;

    let death_geo = reprojector.to_geographic(&death_points)?;
    let pump_geo = reprojector.to_geographic(&pump_points)?;

    let deaths: Vec<DeathRecord> = raw_deaths
        .iter()
        .zip(death_geo)
        .zip(assignments)
        .map(|((raw, location), (pump_index, distance_m))| DeathRecord {
            lon: location.x(),
            lat: location.y(),
            count: raw.count,
            nearest_pump_id: raw_pumps[pump_index].id.clone(),
            distance_m,
        })
        .collect();

    let pumps: Vec<PumpRecord> = raw_pumps
        .iter()
        .zip(pump_geo)
        .map(|(raw, location)| PumpRecord {
            id: raw.id.clone(),
            lon: location.x(),
            lat: location.y(),
        })
        .collect();

    let total_deaths = deaths.iter().map(|d| u64::from(d.count)).sum();

    info!(
        deaths = deaths.len(),
        pumps = pumps.len(),
        total_deaths,
        "dataset built"
    );

    Ok(Dataset {
        deaths,
        pumps,
        total_deaths,
    })
}

/// Brute-force nearest-neighbor join: for every death point, the index of
/// the closest pump and the distance to it in meters, rounded to one
/// decimal. O(n·m), which is fine at tens to low hundreds of points.
///
/// Equidistant pumps resolve to the first one in pump order: the scan
/// compares with strict `<`, so a later pump never displaces an equal
/// earlier one.
pub fn nearest_pumps(
    deaths: &[Point<f64>],
    pumps: &[Point<f64>],
    meters_per_unit: f64,
) -> Result<Vec<(usize, f64)>, PipelineError> {
    if deaths.is_empty() {
        return Ok(Vec::new());
    }
    if pumps.is_empty() {
        return Err(PipelineError::EmptyPumpSet);
    }

    let mut assignments = Vec::with_capacity(deaths.len());

    for death in deaths {
        let mut best_index = 0;
        let mut best_sq = f64::INFINITY;
        for (i, pump) in pumps.iter().enumerate() {
            let dx = death.x() - pump.x();
            let dy = death.y() - pump.y();
            let sq = dx * dx + dy * dy;
            if sq < best_sq {
                best_sq = sq;
                best_index = i;
            }
        }
        let distance_m = round_tenth(best_sq.sqrt() * meters_per_unit);
        assignments.push((best_index, distance_m));
    }

    Ok(assignments)
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
