use crate::types::Dataset;
use serde::Serialize;
use std::collections::HashMap;

/// Per-pump rollup over the death records assigned to it. Pumps that never
/// win a nearest-pump assignment do not appear.
#[derive(Debug, Clone, Serialize)]
pub struct PumpGroup {
    pub pump_id: String,
    pub total_deaths: u64,
    /// Mean distance of the assigned death locations, meters, one decimal.
    pub mean_distance_m: f64,
}

/// Scalar and grouped statistics over a finished dataset. Pure function of
/// the dataset; computed once and served as-is.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub total_deaths: u64,
    pub death_locations: usize,
    pub mean_deaths_per_location: f64,
    pub max_deaths_at_location: u32,
    pub pump_count: usize,
    pub mean_distance_m: f64,
    pub max_distance_m: f64,
    pub min_distance_m: f64,
    /// 75th percentile of distance to the nearest pump.
    pub distance_p75_m: f64,
    /// Sorted descending by total deaths.
    pub deaths_by_pump: Vec<PumpGroup>,
}

pub fn summarize(dataset: &Dataset) -> Summary {
    let counts: Vec<f64> = dataset.deaths.iter().map(|d| f64::from(d.count)).collect();
    let distances: Vec<f64> = dataset.deaths.iter().map(|d| d.distance_m).collect();

    Summary {
        total_deaths: dataset.total_deaths,
        death_locations: dataset.deaths.len(),
        mean_deaths_per_location: mean(&counts),
        max_deaths_at_location: dataset.deaths.iter().map(|d| d.count).max().unwrap_or(0),
        pump_count: dataset.pumps.len(),
        mean_distance_m: mean(&distances),
        max_distance_m: distances.iter().copied().fold(0.0, f64::max),
        min_distance_m: if distances.is_empty() {
            0.0
        } else {
            distances.iter().copied().fold(f64::INFINITY, f64::min)
        },
        distance_p75_m: quantile(&distances, 0.75),
        deaths_by_pump: group_by_pump(dataset),
    }
}

fn group_by_pump(dataset: &Dataset) -> Vec<PumpGroup> {
    let mut groups: HashMap<&str, (u64, f64, usize)> = HashMap::new();

    for death in &dataset.deaths {
        let entry = groups
            .entry(death.nearest_pump_id.as_str())
            .or_insert((0, 0.0, 0));
        entry.0 += u64::from(death.count);
        entry.1 += death.distance_m;
        entry.2 += 1;
    }

    let mut result: Vec<PumpGroup> = groups
        .into_iter()
        .map(|(pump_id, (total, dist_sum, n))| PumpGroup {
            pump_id: pump_id.to_string(),
            total_deaths: total,
            mean_distance_m: round_tenth(dist_sum / n as f64),
        })
        .collect();

    // Descending by deaths, pump id as a deterministic tie-break.
    result.sort_by(|a, b| {
        b.total_deaths
            .cmp(&a.total_deaths)
            .then_with(|| a.pump_id.cmp(&b.pump_id))
    });
    result
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Linear-interpolation quantile over unsorted values. `q` in [0, 1].
pub fn quantile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());

    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    let fraction = position - lower as f64;
    sorted[lower] + fraction * (sorted[upper] - sorted[lower])
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
