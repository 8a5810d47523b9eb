use crate::error::PipelineError;
use geo::Point;
use geojson::GeoJson;
use shapefile::dbase::FieldValue;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

/// A death location as loaded, before reprojection and joining.
#[derive(Debug, Clone)]
pub struct RawDeath {
    /// Coordinates in the source CRS.
    pub point: Point<f64>,
    pub count: u32,
}

/// A pump location as loaded, before reprojection.
#[derive(Debug, Clone)]
pub struct RawPump {
    pub point: Point<f64>,
    pub id: String,
}

/// Attribute value attached to a point feature. Shapefile dbase fields and
/// GeoJSON properties both collapse into this.
#[derive(Debug, Clone)]
enum AttrValue {
    Text(String),
    Number(f64),
}

pub fn load_deaths(path: &Path, count_column: &str) -> Result<Vec<RawDeath>, PipelineError> {
    let features = load_point_features(path, count_column)?;
    let mut deaths = Vec::with_capacity(features.len());

    for (point, value) in features {
        let count = parse_count(&value).map_err(|detail| PipelineError::InvalidAttribute {
            column: count_column.to_string(),
            path: path.to_path_buf(),
            detail,
        })?;
        deaths.push(RawDeath { point, count });
    }

    info!(file = ?path, records = deaths.len(), "loaded death locations");
    Ok(deaths)
}

pub fn load_pumps(path: &Path, id_column: &str) -> Result<Vec<RawPump>, PipelineError> {
    let features = load_point_features(path, id_column)?;
    let pumps: Vec<RawPump> = features
        .into_iter()
        .map(|(point, value)| RawPump {
            point,
            id: format_id(&value),
        })
        .collect();

    info!(file = ?path, records = pumps.len(), "loaded pump locations");
    Ok(pumps)
}

/// Reads an ordered sequence of point features, each with the value of the
/// one required attribute column. Dispatches on the file extension like
/// the deaths/pumps files ship (.shp with a dbase table, or GeoJSON).
/// A feature without the column fails the load; the column name is
/// case-sensitive.
fn load_point_features(
    path: &Path,
    column: &str,
) -> Result<Vec<(Point<f64>, AttrValue)>, PipelineError> {
    if !path.exists() {
        return Err(PipelineError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "shp" => load_shapefile_points(path, column),
        "json" | "geojson" => load_geojson_points(path, column),
        other => Err(PipelineError::UnsupportedFormat(other.to_string())),
    }
}

fn load_shapefile_points(
    path: &Path,
    column: &str,
) -> Result<Vec<(Point<f64>, AttrValue)>, PipelineError> {
    let read_err = |e: shapefile::Error| PipelineError::Read {
        path: path.to_path_buf(),
        detail: e.to_string(),
    };

    let mut reader = shapefile::Reader::from_path(path).map_err(read_err)?;
    let mut features = Vec::new();

    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result.map_err(read_err)?;

        let point = match shape {
            shapefile::Shape::Point(p) => Point::new(p.x, p.y),
            shapefile::Shape::PointM(p) => Point::new(p.x, p.y),
            shapefile::Shape::PointZ(p) => Point::new(p.x, p.y),
            _ => continue, // Skip non-point shapes
        };

        let field = record
            .get(column)
            .ok_or_else(|| PipelineError::MissingColumn {
                column: column.to_string(),
                path: path.to_path_buf(),
            })?;

        let value = field_to_attr(field).map_err(|detail| PipelineError::InvalidAttribute {
            column: column.to_string(),
            path: path.to_path_buf(),
            detail,
        })?;

        features.push((point, value));
    }

    Ok(features)
}

fn field_to_attr(field: &FieldValue) -> Result<AttrValue, String> {
    match field {
        FieldValue::Character(Some(s)) => Ok(AttrValue::Text(s.trim().to_string())),
        FieldValue::Numeric(Some(n)) => Ok(AttrValue::Number(*n)),
        FieldValue::Integer(i) => Ok(AttrValue::Number(f64::from(*i))),
        FieldValue::Float(Some(f)) => Ok(AttrValue::Number(f64::from(*f))),
        FieldValue::Double(d) => Ok(AttrValue::Number(*d)),
        FieldValue::Character(None) | FieldValue::Numeric(None) | FieldValue::Float(None) => {
            Err("null value".to_string())
        }
        other => Err(format!("unsupported field type: {:?}", other)),
    }
}

fn load_geojson_points(
    path: &Path,
    column: &str,
) -> Result<Vec<(Point<f64>, AttrValue)>, PipelineError> {
    let file = File::open(path).map_err(|e| PipelineError::Read {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    let reader = BufReader::new(file);

    let geojson = GeoJson::from_reader(reader).map_err(|e| PipelineError::Read {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;

    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => {
            return Err(PipelineError::Read {
                path: path.to_path_buf(),
                detail: "GeoJSON must be a FeatureCollection".to_string(),
            })
        }
    };

    let mut features = Vec::new();

    for feature in collection.features {
        let point = match feature.geometry {
            Some(ref geom) => match &geom.value {
                geojson::Value::Point(pos) if pos.len() >= 2 => Point::new(pos[0], pos[1]),
                _ => continue, // Skip non-point geometries
            },
            None => continue,
        };

        let prop = feature
            .properties
            .as_ref()
            .and_then(|props| props.get(column))
            .ok_or_else(|| PipelineError::MissingColumn {
                column: column.to_string(),
                path: path.to_path_buf(),
            })?;

        let value = match prop {
            serde_json::Value::String(s) => AttrValue::Text(s.clone()),
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(f) => AttrValue::Number(f),
                None => {
                    return Err(PipelineError::InvalidAttribute {
                        column: column.to_string(),
                        path: path.to_path_buf(),
                        detail: format!("non-finite number: {}", n),
                    })
                }
            },
            other => {
                return Err(PipelineError::InvalidAttribute {
                    column: column.to_string(),
                    path: path.to_path_buf(),
                    detail: format!("expected string or number, got {}", other),
                })
            }
        };

        features.push((point, value));
    }

    Ok(features)
}

fn parse_count(value: &AttrValue) -> Result<u32, String> {
    match value {
        AttrValue::Number(n) => {
            if *n < 0.0 || n.fract() != 0.0 {
                Err(format!("expected a non-negative integer, got {}", n))
            } else {
                Ok(*n as u32)
            }
        }
        AttrValue::Text(s) => s
            .parse::<u32>()
            .map_err(|_| format!("expected a non-negative integer, got '{}'", s)),
    }
}

fn format_id(value: &AttrValue) -> String {
    match value {
        AttrValue::Text(s) => s.clone(),
        // Dbase numeric columns hold integral ids as f64; keep them
        // readable ("7", not "7.0").
        AttrValue::Number(n) if n.fract() == 0.0 => format!("{}", *n as i64),
        AttrValue::Number(n) => n.to_string(),
    }
}
