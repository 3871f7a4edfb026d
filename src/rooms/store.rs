/*!
 * Room State Store
 * Process-wide mapping from room identifier to its live AC state.
 */

use crate::core::clock::Clock;
use crate::core::config::Config;
use crate::core::types::RoomId;
use crate::rooms::state::RoomState;
use dashmap::DashMap;
use std::sync::Arc;

/// Single source of truth for per-room AC state.
///
/// All mutation is expected to come from the scheduler tick loop (§5); this
/// type only encapsulates the map and hands out clones for reads. `init` and
/// `clear` are lifecycle hooks driven by check-in/check-out — `clear` does
/// not itself close the room's detail record, since the store has no
/// knowledge of the `DetailRecorder`; callers (the gateway) must close the
/// open record before or after removing the entry.
pub struct RoomStore {
    rooms: DashMap<RoomId, RoomState>,
    config: Arc<Config>,
    clock: Arc<dyn Clock>,
}

impl RoomStore {
    pub fn new(config: Arc<Config>, clock: Arc<dyn Clock>) -> Self {
        Self {
            rooms: DashMap::new(),
            config,
            clock,
        }
    }

    /// Check a room in: OFF phase, ambient `current_temp`, default target,
    /// MEDIUM fan, COOLING mode, zero accruals. Overwrites any existing
    /// entry for `room_id`.
    pub fn init(&self, room_id: RoomId) {
        let now = self.clock.now();
        let room = RoomState::checked_in(
            now,
            self.config.initial_room_temp,
            self.config.default_temp,
        );
        self.rooms.insert(room_id, room);
    }

    /// Check a room out, returning its final state if it was known.
    pub fn clear(&self, room_id: &RoomId) -> Option<RoomState> {
        self.rooms.remove(room_id).map(|(_, state)| state)
    }

    pub fn get(&self, room_id: &RoomId) -> Option<RoomState> {
        self.rooms.get(room_id).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, room_id: &RoomId) -> bool {
        self.rooms.contains_key(room_id)
    }

    /// Snapshot of every known room, sorted by room id for deterministic
    /// output.
    pub fn snapshot_all(&self) -> Vec<(RoomId, RoomState)> {
        let mut all: Vec<(RoomId, RoomState)> = self
            .rooms
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }

    /// Mutate a room in place via `f`, if known. Returns `false` if the room
    /// is unknown.
    pub fn mutate(&self, room_id: &RoomId, f: impl FnOnce(&mut RoomState)) -> bool {
        match self.rooms.get_mut(room_id) {
            Some(mut entry) => {
                f(entry.value_mut());
                true
            }
            None => false,
        }
    }

    pub fn room_ids(&self) -> Vec<RoomId> {
        let mut ids: Vec<RoomId> = self.rooms.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;

    fn store() -> RoomStore {
        RoomStore::new(Arc::new(Config::default()), Arc::new(ManualClock::new()))
    }

    #[test]
    fn init_then_get_returns_off_room() {
        let store = store();
        let room_id = RoomId::new("301");
        store.init(room_id.clone());
        let room = store.get(&room_id).expect("room must exist after init");
        assert_eq!(room.phase, crate::core::types::Phase::Off);
    }

    #[test]
    fn clear_removes_and_returns_final_state() {
        let store = store();
        let room_id = RoomId::new("301");
        store.init(room_id.clone());
        let final_state = store.clear(&room_id);
        assert!(final_state.is_some());
        assert!(store.get(&room_id).is_none());
    }

    #[test]
    fn snapshot_all_is_sorted_by_room_id() {
        let store = store();
        store.init(RoomId::new("302"));
        store.init(RoomId::new("101"));
        let snapshot = store.snapshot_all();
        assert_eq!(snapshot[0].0, RoomId::new("101"));
        assert_eq!(snapshot[1].0, RoomId::new("302"));
    }

    #[test]
    fn mutate_unknown_room_returns_false() {
        let store = store();
        assert!(!store.mutate(&RoomId::new("999"), |_| {}));
    }
}
