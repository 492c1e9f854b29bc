//! ---
//! ems_section: "03-persistence-logging"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Structured logging context and lifecycle events."
//! ems_version: "v0.1.0"
//! ems_owner: "tbd"
//! ---
#![warn(missing_docs)]
//! Structured logging helpers shared by the generator and the harness.

use tracing::Level;

pub mod macros;

/// Structured logging context propagated by the convenience macros.
#[derive(Debug, Default, Clone)]
pub struct LogContext<'a> {
    /// Building identifier the event relates to.
    pub building: Option<i64>,
    /// Sensor identifier the event relates to.
    pub sensor: Option<&'a str>,
    /// Harness check currently executing.
    pub check: Option<&'a str>,
    /// Synthetic principal (`username:role`) used for the call.
    pub principal: Option<&'a str>,
}

impl<'a> LogContext<'a> {
    /// Create an empty logging context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a building identifier.
    pub fn with_building(mut self, building: i64) -> Self {
        self.building = Some(building);
        self
    }

    /// Attach a sensor identifier.
    pub fn with_sensor(mut self, sensor: &'a str) -> Self {
        self.sensor = Some(sensor);
        self
    }

    /// Attach the running check name.
    pub fn with_check(mut self, check: &'a str) -> Self {
        self.check = Some(check);
        self
    }

    /// Attach the principal issuing the request.
    pub fn with_principal(mut self, principal: &'a str) -> Self {
        self.principal = Some(principal);
        self
    }
}

/// High-level outcome used when emitting lifecycle log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemEventOutcome {
    /// The operation completed successfully.
    Success,
    /// The operation failed or was aborted.
    Fault,
}

impl SystemEventOutcome {
    /// Map a pass/fail flag onto an outcome.
    pub fn from_passed(passed: bool) -> Self {
        if passed {
            SystemEventOutcome::Success
        } else {
            SystemEventOutcome::Fault
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            SystemEventOutcome::Success => "success",
            SystemEventOutcome::Fault => "fault",
        }
    }
}

/// Emit a standardized lifecycle event with a success/fault outcome.
pub fn log_system_event(
    context: Option<&LogContext>,
    event: &str,
    message: &str,
    outcome: SystemEventOutcome,
) {
    let ctx = context.cloned().unwrap_or_default();
    // `tracing::event!` needs a const level, hence the duplicated arms.
    match outcome {
        SystemEventOutcome::Success => tracing::event!(
            Level::INFO,
            event,
            outcome = outcome.as_str(),
            building = ctx.building.unwrap_or_default(),
            sensor = ctx.sensor.unwrap_or(""),
            check = ctx.check.unwrap_or(""),
            principal = ctx.principal.unwrap_or(""),
            message = %message
        ),
        SystemEventOutcome::Fault => tracing::event!(
            Level::WARN,
            event,
            outcome = outcome.as_str(),
            building = ctx.building.unwrap_or_default(),
            sensor = ctx.sensor.unwrap_or(""),
            check = ctx.check.unwrap_or(""),
            principal = ctx.principal.unwrap_or(""),
            message = %message
        ),
    }
}
