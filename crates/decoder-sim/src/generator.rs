//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Synthetic reading value model and per-sensor series."
//! ems_version: "v0.1.0"
//! ems_owner: "tbd"
//! ---
use chrono::{Duration, NaiveDateTime};
use decoder_client::SensorReading;
use decoder_common::config::GeneratorConfig;
use rand::prelude::*;
use tracing::trace;

/// Parameters of the `base + uniform(-variance, variance) + trend` model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueModel {
    pub base_min: f64,
    pub base_max: f64,
    pub variance: f64,
    /// Trend is drawn from `[-trend, trend]` for each reading.
    pub trend: f64,
}

impl Default for ValueModel {
    fn default() -> Self {
        Self {
            base_min: 40.0,
            base_max: 80.0,
            variance: 15.0,
            trend: 1.0,
        }
    }
}

impl From<&GeneratorConfig> for ValueModel {
    fn from(config: &GeneratorConfig) -> Self {
        Self {
            base_min: config.base_min,
            base_max: config.base_max,
            variance: config.variance,
            trend: config.trend,
        }
    }
}

/// Round to two decimals and floor at zero.
pub fn clamp_reading(raw: f64) -> f64 {
    let rounded = (raw * 100.0).round() / 100.0;
    if rounded > 0.0 {
        rounded
    } else {
        0.0
    }
}

/// Produces reading series following a [`ValueModel`].
#[derive(Debug)]
pub struct ReadingGenerator {
    model: ValueModel,
    rng: StdRng,
}

impl ReadingGenerator {
    /// A `seed` makes runs reproducible; `None` seeds from the OS.
    pub fn new(model: ValueModel, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { model, rng }
    }

    pub fn model(&self) -> &ValueModel {
        &self.model
    }

    /// Base consumption for one sensor, drawn once per series.
    pub fn draw_base(&mut self) -> f64 {
        self.rng.gen_range(self.model.base_min..=self.model.base_max)
    }

    /// One reading value around `base`.
    pub fn next_value(&mut self, base: f64) -> f64 {
        let variance = self.model.variance;
        let noise = self.rng.gen_range(-variance..=variance);
        let trend = self.rng.gen_range(-self.model.trend..=self.model.trend);
        clamp_reading(base + noise + trend)
    }

    /// `count` readings one minute apart; reading `i` is stamped `end - (count - i)` minutes.
    pub fn series(
        &mut self,
        building_id: i64,
        sensor_id: &str,
        count: usize,
        end: NaiveDateTime,
    ) -> Vec<SensorReading> {
        let base = self.draw_base();
        trace!(building_id, sensor_id, base, count, "generating sensor series");
        (0..count)
            .map(|i| {
                let offset = Duration::minutes((count - i) as i64);
                SensorReading::new(building_id, sensor_id, end - offset, self.next_value(base))
            })
            .collect()
    }
}
