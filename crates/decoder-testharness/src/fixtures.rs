//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Seed readings and synthetic principals used by the harness checks."
//! ems_version: "v0.1.0"
//! ems_owner: "tbd"
//! ---
use chrono::{Duration, NaiveDateTime};
use decoder_client::{Credential, Role, SensorReading};

/// Literal reading seeded by the data generation check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeedReading {
    pub building_id: i64,
    pub sensor_id: &'static str,
    pub minutes_ago: i64,
    pub value: f64,
}

impl SeedReading {
    const fn new(building_id: i64, sensor_id: &'static str, minutes_ago: i64, value: f64) -> Self {
        Self {
            building_id,
            sensor_id,
            minutes_ago,
            value,
        }
    }

    pub fn at(&self, now: NaiveDateTime) -> SensorReading {
        SensorReading::new(
            self.building_id,
            self.sensor_id,
            now - Duration::minutes(self.minutes_ago),
            self.value,
        )
    }
}

/// Building 1 gets normal readings on sensor-001 and a high burst on
/// sensor-002, building 2 stays low, building 3 belongs to owner2.
pub const SEED_READINGS: [SeedReading; 16] = [
    SeedReading::new(1, "sensor-001", 30, 50.5),
    SeedReading::new(1, "sensor-001", 25, 55.0),
    SeedReading::new(1, "sensor-001", 20, 60.0),
    SeedReading::new(1, "sensor-001", 15, 58.0),
    SeedReading::new(1, "sensor-001", 10, 62.0),
    SeedReading::new(1, "sensor-002", 5, 120.0),
    SeedReading::new(1, "sensor-002", 4, 125.0),
    SeedReading::new(1, "sensor-002", 3, 130.0),
    SeedReading::new(1, "sensor-002", 2, 128.0),
    SeedReading::new(1, "sensor-002", 1, 132.0),
    SeedReading::new(2, "sensor-003", 25, 45.0),
    SeedReading::new(2, "sensor-003", 20, 48.0),
    SeedReading::new(2, "sensor-003", 15, 50.0),
    SeedReading::new(3, "sensor-004", 20, 70.0),
    SeedReading::new(3, "sensor-004", 15, 72.0),
    SeedReading::new(3, "sensor-004", 10, 75.0),
];

/// Synthetic user known to the API, with the buildings it owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    /// Name used in operator messages.
    pub label: &'static str,
    pub username: &'static str,
    pub role: Role,
    pub owns: &'static [i64],
}

pub const ADMIN: Principal = Principal {
    label: "Admin",
    username: "admin",
    role: Role::Admin,
    owns: &[],
};

pub const OWNER1: Principal = Principal {
    label: "Owner1",
    username: "owner1",
    role: Role::Owner,
    owns: &[1, 2],
};

pub const OWNER2: Principal = Principal {
    label: "Owner2",
    username: "owner2",
    role: Role::Owner,
    owns: &[3],
};

pub const PRINCIPALS: [Principal; 3] = [ADMIN, OWNER1, OWNER2];

impl Principal {
    pub fn credential(&self) -> Credential {
        Credential::new(self.username, self.role)
    }

    /// Whether the API is expected to grant this principal access to `building_id`.
    pub fn may_access(&self, building_id: i64) -> bool {
        self.role == Role::Admin || self.owns.contains(&building_id)
    }

    /// Look up the principal matching a bearer token body (`username:ROLE`).
    pub fn from_token(token: &str) -> Option<Principal> {
        PRINCIPALS
            .iter()
            .find(|principal| principal.credential().token() == token)
            .copied()
    }
}
