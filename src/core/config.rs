/*!
 * Scheduler Configuration
 *
 * Every tunable in this module is spec-enumerated; nothing reads a bare
 * constant from inside the scheduler, simulator, or room store. This lets
 * tests run with compressed wait slices / narrow bands without touching the
 * production defaults.
 */

use crate::core::types::FanSpeed;
use rust_decimal::Decimal;
use std::time::Duration;

/// Per-fan-speed rate table (°C/min or units/min, depending on use).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FanTable {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
}

impl FanTable {
    pub const fn new(low: f64, medium: f64, high: f64) -> Self {
        Self { low, medium, high }
    }

    #[inline]
    pub fn get(&self, fan: FanSpeed) -> f64 {
        match fan {
            FanSpeed::Low => self.low,
            FanSpeed::Medium => self.medium,
            FanSpeed::High => self.high,
        }
    }
}

/// Scheduler-wide configuration. Construct with [`Config::default`] and
/// override fields, then call [`Config::validate`] before use — invalid
/// temperature bands are rejected at construction time, not silently
/// tolerated by the request-handling clamp path (which always succeeds).
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of rooms concurrently SERVING.
    pub max_service_slots: usize,
    /// Wait-time quantum after which a waiter becomes eligible to preempt.
    pub wait_time_slice: Duration,
    /// Simulation/scheduling tick period.
    pub tick_interval: Duration,
    /// Default target temperature for newly checked-in rooms.
    pub default_temp: f64,
    /// Ambient temperature assumed at check-in and drifted toward when idle.
    pub initial_room_temp: f64,
    /// (min, max) legal target temperature band while COOLING.
    pub cooling_band: (f64, f64),
    /// (min, max) legal target temperature band while HEATING.
    pub heating_band: (f64, f64),
    /// Drift, in degrees, past which a STANDBY room auto-restarts.
    pub temp_threshold: f64,
    /// Energy/cost accrual rate per fan speed, units/min.
    pub fan_speed_power: FanTable,
    /// Temperature change rate per fan speed, °C/min.
    pub temp_change_rate: FanTable,
    /// Passive drift-toward-ambient rate when OFF/STANDBY, °C/min.
    pub temp_restore_rate: f64,
    /// Cost per accrued energy unit.
    pub price_per_degree: Decimal,
    /// Debounce window for coalescing non-CHANGE_TEMP requests.
    pub debounce_window: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_service_slots: 3,
            wait_time_slice: Duration::from_secs(120),
            tick_interval: Duration::from_secs(1),
            default_temp: 25.0,
            initial_room_temp: 28.0,
            cooling_band: (18.0, 25.0),
            heating_band: (25.0, 30.0),
            temp_threshold: 1.0,
            fan_speed_power: FanTable::new(1.0 / 3.0, 0.5, 1.0),
            temp_change_rate: FanTable::new(1.0 / 3.0, 0.5, 1.0),
            temp_restore_rate: 0.5,
            price_per_degree: Decimal::ONE,
            debounce_window: Duration::from_secs(1),
        }
    }
}

impl Config {
    /// Construct the default configuration and validate it.
    ///
    /// # Panics
    /// Panics if the built-in defaults are internally inconsistent — this
    /// would be a programming error in this module, not a runtime condition.
    pub fn new() -> Self {
        let config = Self::default();
        config.validate().expect("default config must be valid");
        config
    }

    /// Reject a configuration with an inverted or empty temperature band,
    /// or a zero/negative slot count. Per-request target temperatures are
    /// still clamped rather than rejected (§4.4); this only guards the
    /// bands themselves.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_service_slots == 0 {
            return Err("max_service_slots must be at least 1".into());
        }
        let (c_min, c_max) = self.cooling_band;
        if !(c_min < c_max) {
            return Err(format!(
                "cooling_band must be (min < max), got ({c_min}, {c_max})"
            ));
        }
        let (h_min, h_max) = self.heating_band;
        if !(h_min < h_max) {
            return Err(format!(
                "heating_band must be (min < max), got ({h_min}, {h_max})"
            ));
        }
        if self.temp_threshold <= 0.0 {
            return Err("temp_threshold must be positive".into());
        }
        Ok(())
    }

    /// Clamp `target` into the legal band for `mode`.
    pub fn clamp_target(&self, target: f64, mode: crate::core::types::Mode) -> f64 {
        let (min, max) = match mode {
            crate::core::types::Mode::Cooling => self.cooling_band,
            crate::core::types::Mode::Heating => self.heating_band,
        };
        target.clamp(min, max)
    }
}
