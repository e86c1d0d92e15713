//! # LifeFlight Metrics
//!
//! Aggregation service behind the LifeFlight EMS operations dashboard.
//!
//! The crate reads a mission log (CSV) and a city coordinate table (JSON) into
//! an immutable snapshot and computes dashboard views from it on demand.
//!
//! ## Features
//!
//! - **Indicators**: mission totals, cities covered, response-time statistics
//! - **Fleet mix**: missions per vehicle type
//! - **Hourly density**: departures per hour of day
//! - **Heatmap**: per-city mission weights joined to coordinates, as JSON or HTML
//! - **Trends**: monthly mission series and event impact replay
//! - **HTTP API**: JSON endpoints for the dashboard frontend
//!
//! ## Architecture
//!
//! - [`config`]: TOML configuration and environment overrides
//! - [`data`]: schema, file loading and the process-wide [`data::SnapshotStore`]
//! - [`api`]: result types for every view
//! - [`services`]: pure aggregations over mission records
//! - [`http`]: Axum-based HTTP server and request handlers

pub mod api;
pub mod config;
pub mod data;
pub mod models;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
