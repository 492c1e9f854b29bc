//! ---
//! ems_section: "05-networking-external-interfaces"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Wire payloads exchanged with the DECODER API."
//! ems_version: "v0.1.0"
//! ems_owner: "tbd"
//! ---
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// ISO local date-time with microseconds; the API parses timestamps without a zone.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Reading posted to `POST /ingest`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorReading {
    pub building_id: i64,
    pub sensor_id: String,
    #[serde(with = "local_timestamp")]
    pub timestamp: NaiveDateTime,
    pub value: f64,
}

impl SensorReading {
    pub fn new(
        building_id: i64,
        sensor_id: impl Into<String>,
        timestamp: NaiveDateTime,
        value: f64,
    ) -> Self {
        Self {
            building_id,
            sensor_id: sensor_id.into(),
            timestamp,
            value,
        }
    }
}

/// Render a reading value the way operators expect (`62.0`, not `62`).
pub fn display_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

mod local_timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::TIMESTAMP_FORMAT;

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f").map_err(serde::de::Error::custom)
    }
}

/// Element of the `last-readings` list body. Fields are optional because the
/// harness only counts entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReadingRecord {
    pub building_id: Option<i64>,
    pub sensor_id: Option<String>,
    pub timestamp: Option<String>,
    pub value: Option<f64>,
}

/// Body of `GET /buildings/{id}/forecast`. `forecast` and `recommendation` are required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastResponse {
    #[serde(default)]
    pub building_id: Option<i64>,
    pub forecast: Vec<ForecastPoint>,
    pub recommendation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastPoint {
    pub timestamp: Option<String>,
    pub value: Option<f64>,
}

impl ForecastResponse {
    /// Mean of the first `window` points; missing values count as zero.
    pub fn leading_average(&self, window: usize) -> Option<f64> {
        let count = window.min(self.forecast.len());
        if count == 0 {
            return None;
        }
        let sum: f64 = self.forecast[..count]
            .iter()
            .map(|point| point.value.unwrap_or(0.0))
            .sum();
        Some(sum / count as f64)
    }
}
