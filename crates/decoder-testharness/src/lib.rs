//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "01-bootstrap"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Manual test harness exports."
//! ems_version: "v0.1.0"
//! ems_owner: "tbd"
//! ---
//! The manual test harness exercises ingest, authentication, RBAC and
//! forecasting endpoints of a running DECODER API through seven checks and a
//! menu loop.

pub mod checks;
pub mod fixtures;
pub mod forecast;
pub mod menu;
pub mod session;

pub use checks::{Check, CheckContext};
pub use fixtures::{Principal, SeedReading, ADMIN, OWNER1, OWNER2, PRINCIPALS, SEED_READINGS};
pub use forecast::{assess_average, Assessment, LEADING_POINTS};
pub use menu::{CheckOutcome, Harness, MenuChoice};
pub use session::SessionResults;
