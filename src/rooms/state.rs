/*!
 * Room State
 * The live AC state of a single room.
 */

use crate::core::types::{FanSpeed, Mode, Phase};
use rust_decimal::Decimal;
use std::time::Instant;
use uuid::Uuid;

/// Live AC state for one room. `RoomStore` owns the map of these; only the
/// scheduler loop ever mutates a value once it is inserted (§5).
#[derive(Debug, Clone)]
pub struct RoomState {
    pub phase: Phase,
    pub mode: Mode,
    pub fan: FanSpeed,
    pub current_temp: f64,
    pub target_temp: f64,
    pub accrued_energy: f64,
    pub accrued_cost: Decimal,
    /// Instant the phase last changed.
    pub phase_entered_at: Instant,
    /// Meaningful only while WAITING: the instant a full wait-slice elapses.
    pub wait_slice_deadline: Option<Instant>,
    /// Handle to the currently open detail record, if any.
    pub open_record_id: Option<Uuid>,
}

impl RoomState {
    /// The state established at check-in: OFF, ambient temperature, default
    /// target, MEDIUM fan, COOLING, zero accruals (§4.1).
    pub fn checked_in(now: Instant, initial_temp: f64, default_target: f64) -> Self {
        Self {
            phase: Phase::Off,
            mode: Mode::Cooling,
            fan: FanSpeed::Medium,
            current_temp: initial_temp,
            target_temp: default_target,
            accrued_energy: 0.0,
            accrued_cost: Decimal::ZERO,
            phase_entered_at: now,
            wait_slice_deadline: None,
            open_record_id: None,
        }
    }

    /// Remaining wait time, if currently WAITING and the deadline is in the
    /// future; `None` once the slice has already elapsed (the tick loop
    /// resolves those before a caller can observe them).
    pub fn remaining_wait(&self, now: Instant) -> Option<std::time::Duration> {
        match (self.phase, self.wait_slice_deadline) {
            (Phase::Waiting, Some(deadline)) if deadline > now => Some(deadline - now),
            _ => None,
        }
    }

    /// Wall-clock duration since the phase last changed. Used as the
    /// `service_duration` tiebreak in §4.4/§4.5.
    pub fn phase_duration(&self, now: Instant) -> std::time::Duration {
        now.saturating_duration_since(self.phase_entered_at)
    }
}
