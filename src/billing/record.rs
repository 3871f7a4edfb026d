/*!
 * Detail Record
 * A billable segment of service for one room under one (fan, mode) regime.
 */

use crate::core::types::{FanSpeed, Mode, RoomId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// One segment of SERVING time, opened when a room begins service under a
/// specific (fan, mode) regime and closed on transition to WAITING,
/// STANDBY, OFF, or a fan change (§3, §4.6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailRecord {
    pub record_id: Uuid,
    pub room_id: RoomId,
    pub order_id: Option<String>,
    pub start_time: OffsetDateTime,
    pub end_time: Option<OffsetDateTime>,
    pub start_temp: f64,
    pub end_temp: Option<f64>,
    pub target_temp: f64,
    pub fan: FanSpeed,
    pub mode: Mode,
    pub energy_consumed: f64,
    pub cost: Decimal,
}

impl DetailRecord {
    pub fn open(
        room_id: RoomId,
        order_id: Option<String>,
        start_temp: f64,
        target_temp: f64,
        fan: FanSpeed,
        mode: Mode,
    ) -> Self {
        Self {
            record_id: Uuid::new_v4(),
            room_id,
            order_id,
            start_time: OffsetDateTime::now_utc(),
            end_time: None,
            start_temp,
            end_temp: None,
            target_temp,
            fan,
            mode,
            energy_consumed: 0.0,
            cost: Decimal::ZERO,
        }
    }

    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }

    /// Stamp terminal values and close the record. A no-op if already
    /// closed (§4.6 double-close idempotence).
    pub fn close(&mut self, end_temp: f64, energy: f64, cost: Decimal) {
        if !self.is_open() {
            return;
        }
        self.end_time = Some(OffsetDateTime::now_utc());
        self.end_temp = Some(end_temp);
        self.energy_consumed = energy;
        self.cost = cost;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_record_has_no_end() {
        let record = DetailRecord::open(RoomId::new("301"), None, 28.0, 25.0, FanSpeed::Medium, Mode::Cooling);
        assert!(record.is_open());
        assert!(record.end_time.is_none());
    }

    #[test]
    fn close_is_idempotent() {
        let mut record =
            DetailRecord::open(RoomId::new("301"), None, 28.0, 25.0, FanSpeed::Medium, Mode::Cooling);
        record.close(26.0, 1.5, Decimal::new(15, 1));
        let first_close_end = record.end_time;
        record.close(99.0, 999.0, Decimal::new(999, 0));
        assert_eq!(record.end_time, first_close_end);
        assert_eq!(record.end_temp, Some(26.0));
    }
}
