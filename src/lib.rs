//! Analysis pipeline for John Snow's 1854 Broad Street cholera map.
//!
//! Loads two point-feature files (death counts, water pumps), reprojects
//! them from British National Grid to geographic lon/lat, assigns each
//! death location its nearest pump with the distance in meters, and
//! exposes the joined dataset plus summary statistics over HTTP for an
//! external dashboard.

pub mod cache;
pub mod config;
pub mod data;
pub mod error;
pub mod export;
pub mod processing;
pub mod reproject;
pub mod server;
pub mod stats;
pub mod types;
