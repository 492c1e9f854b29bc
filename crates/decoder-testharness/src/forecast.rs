//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Classification of forecast recommendations."
//! ems_version: "v0.1.0"
//! ems_owner: "tbd"
//! ---
//! The API does not return a machine-readable alert flag, so the harness
//! classifies forecasts by the wording of the recommendation.

/// Number of leading forecast points averaged for reporting.
pub const LEADING_POINTS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assessment {
    Normal,
    High,
}

impl Assessment {
    /// Whether `recommendation` carries the wording expected for this assessment.
    pub fn is_signalled_by(self, recommendation: &str) -> bool {
        let lowered = recommendation.to_lowercase();
        match self {
            Assessment::Normal => {
                recommendation.contains("No action required") || lowered.contains("normal range")
            }
            Assessment::High => {
                lowered.contains("energy-saving") || lowered.contains("exceeds threshold")
            }
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Assessment::Normal => "normal consumption",
            Assessment::High => "high consumption",
        }
    }
}

/// Classification implied by a forecast average against the alert threshold.
pub fn assess_average(average: f64, threshold: f64) -> Assessment {
    if average >= threshold {
        Assessment::High
    } else {
        Assessment::Normal
    }
}
