use serde::Serialize;

/// A death location after reprojection and the nearest-pump join.
///
/// Only the joiner constructs these, and it always fills both derived
/// fields (`nearest_pump_id`, `distance_m`) at once; there is no
/// half-joined record.
#[derive(Debug, Clone, Serialize)]
pub struct DeathRecord {
    pub lon: f64,
    pub lat: f64,
    /// Deaths recorded at this location.
    pub count: u32,
    pub nearest_pump_id: String,
    /// Distance to the nearest pump, in meters, rounded to one decimal.
    pub distance_m: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PumpRecord {
    /// Pump identifier. Uniqueness across the pump file is assumed, not
    /// enforced.
    pub id: String,
    pub lon: f64,
    pub lat: f64,
}

/// The fully joined outbreak dataset. Built once per load, read-only
/// afterwards; the server shares it as `Arc<Dataset>`.
#[derive(Debug)]
pub struct Dataset {
    pub deaths: Vec<DeathRecord>,
    pub pumps: Vec<PumpRecord>,
    pub total_deaths: u64,
}
