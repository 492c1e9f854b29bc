//! ---
//! ems_section: "05-networking-external-interfaces"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "HTTP client for the DECODER API contract."
//! ems_version: "v0.1.0"
//! ems_owner: "tbd"
//! ---
//! Client side of the DECODER energy-monitoring API.
//!
//! Only the request/response contract is modelled here: ingest, last
//! readings, forecast and the actuator health probe. Authorization, storage
//! and forecasting all happen on the server.

pub mod client;
pub mod credential;
pub mod errors;
pub mod models;

pub use client::ApiClient;
pub use credential::{Credential, Role};
pub use errors::{ApiError, ErrorKind};
pub use reqwest::StatusCode;
pub use models::{
    display_value, ForecastPoint, ForecastResponse, ReadingRecord, SensorReading, TIMESTAMP_FORMAT,
};
