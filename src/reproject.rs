use crate::error::PipelineError;
use geo::Point;
use proj4rs::proj::Proj;
use proj4rs::transform::transform;
use tracing::info;

/// British National Grid (EPSG:27700): transverse Mercator on the Airy
/// ellipsoid with the OSGB36→WGS84 Helmert shift.
const BNG_PROJ: &str = "+proj=tmerc +lat_0=49 +lon_0=-2 +k=0.9996012717 \
     +x_0=400000 +y_0=-100000 +ellps=airy \
     +towgs84=446.448,-125.157,542.06,0.15,0.247,0.842,-20.489 \
     +units=m +no_defs";

const WGS84_PROJ: &str = "+proj=longlat +datum=WGS84 +no_defs";

/// Meters per degree of the local degree grid, calibrated around 51.5°N
/// (Soho). Used only by the pass-through policy; the error grows with
/// distance from that latitude, which is acceptable for a dataset a few
/// hundred meters across.
pub const METERS_PER_DEGREE: f64 = 111_320.0;

/// How source coordinates become geographic lon/lat and how join-space
/// distances become meters. Selected once per dataset from the configured
/// source CRS; the two policies are never mixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrsPolicy {
    /// Full geodetic reprojection from EPSG:27700. Join distances are
    /// taken on the native grid coordinates, which are true meters.
    BritishNationalGrid,
    /// Input is already decimal degrees; coordinates pass through and
    /// join distances are degree distances scaled by [`METERS_PER_DEGREE`].
    GeographicDegrees,
}

impl CrsPolicy {
    pub fn from_crs(crs: &str) -> Result<Self, PipelineError> {
        match crs {
            "EPSG:27700" => Ok(CrsPolicy::BritishNationalGrid),
            "EPSG:4326" => Ok(CrsPolicy::GeographicDegrees),
            other => Err(PipelineError::Reprojection {
                crs: other.to_string(),
                detail: "unsupported source CRS, expected EPSG:27700 or EPSG:4326".to_string(),
            }),
        }
    }
}

pub struct Reprojector {
    policy: CrsPolicy,
    /// (source, target) projections; only built for the full-reprojection
    /// policy.
    transform: Option<(Proj, Proj)>,
}

impl Reprojector {
    pub fn new(policy: CrsPolicy) -> Result<Self, PipelineError> {
        let transform = match policy {
            CrsPolicy::BritishNationalGrid => {
                let build_err = |e: proj4rs::errors::Error| PipelineError::Reprojection {
                    crs: "EPSG:27700".to_string(),
                    detail: e.to_string(),
                };
                let source = Proj::from_proj_string(BNG_PROJ).map_err(build_err)?;
                let target = Proj::from_proj_string(WGS84_PROJ).map_err(build_err)?;
                Some((source, target))
            }
            CrsPolicy::GeographicDegrees => None,
        };
        info!(?policy, "reprojection policy selected");
        Ok(Reprojector { policy, transform })
    }

    pub fn policy(&self) -> CrsPolicy {
        self.policy
    }

    /// Meters per unit of join-space (source CRS) distance.
    pub fn meters_per_unit(&self) -> f64 {
        match self.policy {
            CrsPolicy::BritishNationalGrid => 1.0,
            CrsPolicy::GeographicDegrees => METERS_PER_DEGREE,
        }
    }

    /// Transforms source-CRS points to geographic lon/lat, preserving
    /// order and cardinality.
    pub fn to_geographic(&self, points: &[Point<f64>]) -> Result<Vec<Point<f64>>, PipelineError> {
        match &self.transform {
            None => Ok(points.to_vec()),
            Some((source, target)) => points
                .iter()
                .map(|p| {
                    let mut coord = (p.x(), p.y(), 0.0);
                    transform(source, target, &mut coord).map_err(|e| {
                        PipelineError::Reprojection {
                            crs: "EPSG:27700".to_string(),
                            detail: e.to_string(),
                        }
                    })?;
                    // proj4rs expresses angular coordinates in radians.
                    Ok(Point::new(coord.0.to_degrees(), coord.1.to_degrees()))
                })
                .collect(),
        }
    }

    #[cfg(test)]
    fn from_geographic(&self, point: Point<f64>) -> Result<Point<f64>, PipelineError> {
        match &self.transform {
            None => Ok(point),
            Some((source, target)) => {
                let mut coord = (point.x().to_radians(), point.y().to_radians(), 0.0);
                transform(target, source, &mut coord).map_err(|e| {
                    PipelineError::Reprojection {
                        crs: "EPSG:27700".to_string(),
                        detail: e.to_string(),
                    }
                })?;
                Ok(Point::new(coord.0, coord.1))
            }
        }
    }
}
