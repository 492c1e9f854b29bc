//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "01-bootstrap"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Synthetic reading engine exports."
//! ems_version: "v0.1.0"
//! ems_owner: "tbd"
//! ---
//! Synthetic sensor readings for exercising the DECODER ingest endpoint.

pub mod generator;

pub use generator::{clamp_reading, ReadingGenerator, ValueModel};
