/*!
 * Room State View
 * The read-only projection returned by `state`/`snapshot_all` (§6).
 */

use crate::core::types::{FanSpeed, Mode, Phase, RoomId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomStateView {
    pub room_id: RoomId,
    pub is_on: bool,
    pub phase: Phase,
    pub current_temp: f64,
    pub target_temp: f64,
    pub fan: FanSpeed,
    pub mode: Mode,
    pub energy: f64,
    pub cost: Decimal,
    /// Only present while WAITING.
    pub remaining_wait_secs: Option<f64>,
}

impl RoomStateView {
    pub fn from_room(room_id: RoomId, room: &crate::rooms::RoomState, now: std::time::Instant) -> Self {
        Self {
            room_id,
            is_on: room.phase == Phase::Serving || room.phase == Phase::Waiting,
            phase: room.phase,
            current_temp: room.current_temp,
            target_temp: room.target_temp,
            fan: room.fan,
            mode: room.mode,
            energy: room.accrued_energy,
            cost: room.accrued_cost,
            remaining_wait_secs: room.remaining_wait(now).map(|d| d.as_secs_f64()),
        }
    }
}
