/*!
 * Scheduler Module
 *
 * The scheduler core (service/wait set bookkeeping plus request handling),
 * the per-tick policy pipeline, the pending-request debounce map, and the
 * background task that drives it all.
 */

pub mod operations;
pub mod pending;
pub mod task;
pub mod tick;

pub use pending::{PendingRequest, PendingStore};
pub use task::{SchedulerHandle, SchedulerTask};

use crate::billing::DetailRecorder;
use crate::core::clock::Clock;
use crate::core::config::Config;
use crate::core::types::RoomId;
use crate::rooms::RoomStore;
use std::sync::Arc;

/// The single logical writer for all scheduling state (§5): the service
/// set, the wait set, and — via its collaborators — every room's live
/// state and detail records. Owned exclusively by the task that runs the
/// tick loop; external callers only ever touch the `RoomStore` (for reads)
/// and the `PendingStore` (for submissions), both `Arc`-shared and safe for
/// concurrent access on their own.
pub struct SchedulerCore {
    pub config: Arc<Config>,
    pub clock: Arc<dyn Clock>,
    pub rooms: Arc<RoomStore>,
    pub recorder: Arc<dyn DetailRecorder>,
    pub pending: Arc<PendingStore>,
    /// Rooms currently SERVING. `|service_set| <= config.max_service_slots`.
    pub service_set: Vec<RoomId>,
    /// Rooms currently WAITING.
    pub wait_set: Vec<RoomId>,
}

impl SchedulerCore {
    pub fn new(
        config: Arc<Config>,
        clock: Arc<dyn Clock>,
        rooms: Arc<RoomStore>,
        recorder: Arc<dyn DetailRecorder>,
        pending: Arc<PendingStore>,
    ) -> Self {
        Self {
            config,
            clock,
            rooms,
            recorder,
            pending,
            service_set: Vec::new(),
            wait_set: Vec::new(),
        }
    }

    /// Check a room in (§4.1). A room checked in while still SERVING/WAITING
    /// from a prior occupancy (no intervening `clear`, e.g. a buggy or
    /// retried caller) would otherwise leave `service_set`/`wait_set`
    /// pointing at a room the store has just reset to OFF — a
    /// store/scheduler disagreement `check_invariants` doesn't look for, since
    /// it only checks set-size and set-overlap. Clear any stale membership
    /// first so a freshly-initialized room is always actually unscheduled.
    pub fn init_room(&mut self, room_id: RoomId) {
        if self.service_set.contains(&room_id) || self.wait_set.contains(&room_id) {
            log::warn!("room {room_id} re-initialized while still scheduled; clearing stale membership");
            self.clear_room(&room_id);
            self.admission_from_wait();
        }
        self.rooms.init(room_id);
    }

    /// Check a room out: finalize any open record, drop it from whichever
    /// set it's in, and remove it from the store (§4.1).
    pub fn clear_room(&mut self, room_id: &RoomId) -> Option<crate::rooms::RoomState> {
        self.service_set.retain(|id| id != room_id);
        self.wait_set.retain(|id| id != room_id);
        if let Some(room) = self.rooms.get(room_id) {
            if let Some(record_id) = room.open_record_id {
                if let Err(err) = self.recorder.close(
                    record_id,
                    room.current_temp,
                    room.accrued_energy,
                    room.accrued_cost,
                ) {
                    log::warn!("failed to close detail record for room {room_id} on checkout: {err}");
                }
            }
        }
        self.rooms.clear(room_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::InMemoryDetailRecorder;
    use crate::core::clock::ManualClock;
    use crate::core::types::{FanSpeed, Mode};

    fn core() -> SchedulerCore {
        let config = Arc::new(Config::default());
        let clock = Arc::new(ManualClock::new());
        let rooms = Arc::new(RoomStore::new(config.clone(), clock.clone() as Arc<dyn Clock>));
        let recorder = Arc::new(InMemoryDetailRecorder::new());
        let pending = Arc::new(PendingStore::new());
        SchedulerCore::new(config, clock, rooms, recorder, pending)
    }

    #[test]
    fn init_room_clears_stale_service_set_membership() {
        let mut core = core();
        let room_id = RoomId::new("301");
        core.rooms.init(room_id.clone());
        core.power_on(&room_id, 22.0, FanSpeed::Low, Mode::Cooling, None);
        assert!(core.service_set.contains(&room_id));

        core.init_room(room_id.clone());

        assert!(!core.service_set.contains(&room_id));
        assert!(!core.wait_set.contains(&room_id));
        let room = core.rooms.get(&room_id).unwrap();
        assert_eq!(room.phase, crate::core::types::Phase::Off);
        assert!(room.open_record_id.is_none());
    }

    #[test]
    fn init_room_on_a_fresh_room_is_a_plain_check_in() {
        let mut core = core();
        let room_id = RoomId::new("301");
        core.init_room(room_id.clone());
        assert!(core.rooms.contains(&room_id));
        assert!(!core.service_set.contains(&room_id));
        assert!(!core.wait_set.contains(&room_id));
    }
}
