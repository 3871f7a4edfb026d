/*!
 * Detail Recorder
 * Opens, updates, and closes billable detail records against an external
 * persistence interface. At most one open record per room at a time (§4.6).
 */

use crate::billing::record::DetailRecord;
use crate::core::errors::Result;
use crate::core::types::{FanSpeed, Mode, RoomId};
use dashmap::DashMap;
use log::warn;
use rust_decimal::Decimal;
use uuid::Uuid;

/// External persistence boundary for detail records. Implementations may
/// fail (storage outage); the scheduler loop logs and degrades to
/// "no detail record written" rather than stalling other rooms (§4.7).
pub trait DetailRecorder: Send + Sync {
    fn open(
        &self,
        room_id: RoomId,
        order_id: Option<String>,
        start_temp: f64,
        target_temp: f64,
        fan: FanSpeed,
        mode: Mode,
    ) -> Result<Uuid>;

    /// Periodic progress update; optional, terminal values suffice (§4.6).
    fn update(&self, record_id: Uuid, energy: f64, cost: Decimal, current_temp: f64) -> Result<()>;

    /// Closing a non-existent or already-closed record is a no-op and is
    /// logged, not an error (§4.6).
    fn close(&self, record_id: Uuid, end_temp: f64, energy: f64, cost: Decimal) -> Result<()>;

    /// Read-only lookup, used by reporting and by tests.
    fn get(&self, record_id: Uuid) -> Option<DetailRecord>;
}

/// In-process, in-memory `DetailRecorder`. Grounded in the teacher's
/// DashMap-backed audit trail: an unbounded map keyed by record id, since
/// detail records here are finalized billing rows rather than a ring
/// buffer of transient events.
#[derive(Default)]
pub struct InMemoryDetailRecorder {
    records: DashMap<Uuid, DetailRecord>,
}

impl InMemoryDetailRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// All records for a room, most recently opened first. Used by
    /// reporting consumers (§5's "shared resources").
    pub fn records_for_room(&self, room_id: &RoomId) -> Vec<DetailRecord> {
        let mut records: Vec<DetailRecord> = self
            .records
            .iter()
            .filter(|entry| &entry.value().room_id == room_id)
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by_key(|r| std::cmp::Reverse(r.start_time));
        records
    }
}

impl DetailRecorder for InMemoryDetailRecorder {
    fn open(
        &self,
        room_id: RoomId,
        order_id: Option<String>,
        start_temp: f64,
        target_temp: f64,
        fan: FanSpeed,
        mode: Mode,
    ) -> Result<Uuid> {
        let record = DetailRecord::open(room_id, order_id, start_temp, target_temp, fan, mode);
        let record_id = record.record_id;
        self.records.insert(record_id, record);
        Ok(record_id)
    }

    fn update(&self, record_id: Uuid, energy: f64, cost: Decimal, current_temp: f64) -> Result<()> {
        match self.records.get_mut(&record_id) {
            Some(mut entry) => {
                entry.energy_consumed = energy;
                entry.cost = cost;
                let _ = current_temp;
                Ok(())
            }
            None => {
                warn!("update on unknown detail record {record_id}");
                Ok(())
            }
        }
    }

    fn close(&self, record_id: Uuid, end_temp: f64, energy: f64, cost: Decimal) -> Result<()> {
        match self.records.get_mut(&record_id) {
            Some(mut entry) => {
                entry.close(end_temp, energy, cost);
                Ok(())
            }
            None => {
                warn!("close on unknown or already-removed detail record {record_id}");
                Ok(())
            }
        }
    }

    fn get(&self, record_id: Uuid) -> Option<DetailRecord> {
        self.records.get(&record_id).map(|e| e.value().clone())
    }
}
