use broadstreet::cache::DatasetCache;
use broadstreet::config::{AppConfig, InputConfig, ServerConfig};
use broadstreet::error::PipelineError;
use broadstreet::{export, processing, stats};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn write_geojson(dir: &Path, name: &str, features: &[String]) -> std::path::PathBuf {
    let path = dir.join(name);
    let body = format!(
        r#"{{"type":"FeatureCollection","features":[{}]}}"#,
        features.join(",")
    );
    fs::write(&path, body).unwrap();
    path
}

fn death_feature(lon: f64, lat: f64, count: u32) -> String {
    format!(
        r#"{{"type":"Feature","geometry":{{"type":"Point","coordinates":[{},{}]}},"properties":{{"Count":{}}}}}"#,
        lon, lat, count
    )
}

fn pump_feature(lon: f64, lat: f64, id: &str) -> String {
    format!(
        r#"{{"type":"Feature","geometry":{{"type":"Point","coordinates":[{},{}]}},"properties":{{"Id":"{}"}}}}"#,
        lon, lat, id
    )
}

fn config_for(deaths: &Path, pumps: &Path, source_crs: &str) -> AppConfig {
    AppConfig {
        input: InputConfig {
            deaths: deaths.to_path_buf(),
            pumps: pumps.to_path_buf(),
            count_column: "Count".to_string(),
            pump_id_column: "Id".to_string(),
            source_crs: source_crs.to_string(),
        },
        server: ServerConfig::default(),
    }
}

#[test]
fn degree_pipeline_joins_and_summarizes() {
    let dir = TempDir::new().unwrap();
    let deaths = write_geojson(
        dir.path(),
        "deaths.geojson",
        &[
            death_feature(0.0, 0.0, 5),
            death_feature(0.01, 0.0, 3),
            death_feature(0.0, 0.001, 0),
        ],
    );
    let pumps = write_geojson(
        dir.path(),
        "pumps.geojson",
        &[
            pump_feature(0.0, 0.001, "A"),
            pump_feature(0.009, 0.0, "B"),
            pump_feature(5.0, 5.0, "unused"),
        ],
    );

    let config = config_for(&deaths, &pumps, "EPSG:4326");
    let dataset = processing::build_dataset(&config).unwrap();

    assert_eq!(dataset.total_deaths, 8);
    assert_eq!(dataset.deaths.len(), 3);
    assert_eq!(dataset.pumps.len(), 3);

    // 0.001 degrees at the calibrated scale is 111.3 m.
    assert_eq!(dataset.deaths[0].nearest_pump_id, "A");
    assert_eq!(dataset.deaths[0].distance_m, 111.3);
    assert_eq!(dataset.deaths[1].nearest_pump_id, "B");
    assert_eq!(dataset.deaths[1].distance_m, 111.3);
    // Zero-count record sits exactly on pump A.
    assert_eq!(dataset.deaths[2].nearest_pump_id, "A");
    assert_eq!(dataset.deaths[2].distance_m, 0.0);

    // Degree policy passes coordinates through untouched.
    assert_eq!(dataset.deaths[1].lon, 0.01);
    assert_eq!(dataset.deaths[1].lat, 0.0);

    let summary = stats::summarize(&dataset);
    assert_eq!(summary.total_deaths, 8);
    assert_eq!(summary.death_locations, 3);
    assert_eq!(summary.pump_count, 3);
    assert_eq!(summary.max_deaths_at_location, 5);
    assert_eq!(summary.min_distance_m, 0.0);

    let grouped: u64 = summary.deaths_by_pump.iter().map(|g| g.total_deaths).sum();
    assert_eq!(grouped, summary.total_deaths);
    // The pump nothing was assigned to is absent from the grouping.
    assert!(summary.deaths_by_pump.iter().all(|g| g.pump_id != "unused"));
    assert_eq!(summary.deaths_by_pump[0].pump_id, "A");
    assert_eq!(summary.deaths_by_pump[0].total_deaths, 5);
}

#[test]
fn grid_pipeline_reprojects_to_soho() {
    let dir = TempDir::new().unwrap();
    // Easting/northing around Broad Street, EPSG:27700.
    let deaths = write_geojson(
        dir.path(),
        "deaths.geojson",
        &[death_feature(529_300.0, 180_900.0, 2)],
    );
    let pumps = write_geojson(
        dir.path(),
        "pumps.geojson",
        &[pump_feature(529_310.0, 180_900.0, "7")],
    );

    let config = config_for(&deaths, &pumps, "EPSG:27700");
    let dataset = processing::build_dataset(&config).unwrap();

    // Grid units are meters, so the join distance needs no rescale.
    assert_eq!(dataset.deaths[0].distance_m, 10.0);
    assert_eq!(dataset.deaths[0].nearest_pump_id, "7");

    // Both record sets come out in geographic lon/lat near Soho.
    for (lon, lat) in dataset
        .deaths
        .iter()
        .map(|d| (d.lon, d.lat))
        .chain(dataset.pumps.iter().map(|p| (p.lon, p.lat)))
    {
        assert!((-0.25..-0.05).contains(&lon), "lon out of range: {}", lon);
        assert!((51.40..51.60).contains(&lat), "lat out of range: {}", lat);
    }
}

#[test]
fn empty_pump_file_fails_the_pipeline() {
    let dir = TempDir::new().unwrap();
    let deaths = write_geojson(dir.path(), "deaths.geojson", &[death_feature(0.0, 0.0, 1)]);
    let pumps = write_geojson(dir.path(), "pumps.geojson", &[]);

    let config = config_for(&deaths, &pumps, "EPSG:4326");
    let err = processing::build_dataset(&config).unwrap_err();
    assert!(matches!(err, PipelineError::EmptyPumpSet));
}

#[test]
fn unknown_source_crs_fails_before_joining() {
    let dir = TempDir::new().unwrap();
    let deaths = write_geojson(dir.path(), "deaths.geojson", &[death_feature(0.0, 0.0, 1)]);
    let pumps = write_geojson(dir.path(), "pumps.geojson", &[pump_feature(0.0, 1.0, "A")]);

    let config = config_for(&deaths, &pumps, "EPSG:3857");
    let err = processing::build_dataset(&config).unwrap_err();
    match err {
        PipelineError::Reprojection { crs, .. } => assert_eq!(crs, "EPSG:3857"),
        other => panic!("expected Reprojection, got {:?}", other),
    }
}

#[test]
fn pump_file_missing_id_column_names_it() {
    let dir = TempDir::new().unwrap();
    let deaths = write_geojson(dir.path(), "deaths.geojson", &[death_feature(0.0, 0.0, 1)]);
    let pumps = write_geojson(
        dir.path(),
        "pumps.geojson",
        &[death_feature(0.0, 1.0, 1)], // has Count, lacks Id
    );

    let config = config_for(&deaths, &pumps, "EPSG:4326");
    let err = processing::build_dataset(&config).unwrap_err();
    match err {
        PipelineError::MissingColumn { column, path } => {
            assert_eq!(column, "Id");
            assert_eq!(path, pumps);
        }
        other => panic!("expected MissingColumn, got {:?}", other),
    }
}

#[test]
fn cache_reuses_the_dataset_until_refreshed() {
    let dir = TempDir::new().unwrap();
    let deaths = write_geojson(dir.path(), "deaths.geojson", &[death_feature(0.0, 0.0, 1)]);
    let pumps = write_geojson(dir.path(), "pumps.geojson", &[pump_feature(0.0, 1.0, "A")]);
    let config = config_for(&deaths, &pumps, "EPSG:4326");

    let cache = DatasetCache::new();
    let first = cache.load(&config, false).unwrap();
    let second = cache.load(&config, false).unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    let rebuilt = cache.load(&config, true).unwrap();
    assert!(!Arc::ptr_eq(&first, &rebuilt));
    assert_eq!(rebuilt.total_deaths, first.total_deaths);
}

#[test]
fn csv_export_writes_one_row_per_death() {
    let dir = TempDir::new().unwrap();
    let deaths = write_geojson(
        dir.path(),
        "deaths.geojson",
        &[death_feature(0.0, 0.0, 5), death_feature(0.01, 0.0, 3)],
    );
    let pumps = write_geojson(dir.path(), "pumps.geojson", &[pump_feature(0.0, 0.001, "A")]);

    let config = config_for(&deaths, &pumps, "EPSG:4326");
    let dataset = processing::build_dataset(&config).unwrap();

    let out = dir.path().join("joined.csv");
    export::write_joined_csv(&dataset, &out).unwrap();

    let contents = fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines[0], "lon,lat,count,nearest_pump_id,distance_m");
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("0,0,5,A,"));
}
