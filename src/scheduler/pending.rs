/*!
 * Pending Requests
 *
 * The debounce boundary between external callers and the scheduler loop
 * (§4.3, §5). Guarded only by the map itself — no coupling to the room
 * state store or the service/wait sets, which remain single-writer.
 */

use crate::core::types::{Action, FanSpeed, Mode, RoomId};
use dashmap::DashMap;
use std::time::Instant;

/// A coalesced, not-yet-applied request for one room. `CHANGE_TEMP` never
/// appears here — it bypasses the pending map entirely (§4.3).
#[derive(Debug, Clone)]
pub struct PendingRequest {
    pub action: Action,
    pub target_temp: Option<f64>,
    pub fan: Option<FanSpeed>,
    pub mode: Option<Mode>,
    pub submitted_at: Instant,
    pub due_at: Instant,
}

/// Per-room debounce map. A new submission for a room that already has an
/// unresolved pending entry overwrites it and reports `Coalesced`; the
/// first submission in a quiet period reports `Handled`.
#[derive(Default)]
pub struct PendingStore {
    entries: DashMap<RoomId, PendingRequest>,
}

impl PendingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submit(&self, room_id: RoomId, request: PendingRequest) -> crate::core::types::RequestOutcome {
        use crate::core::types::RequestOutcome;
        let outcome = if self.entries.contains_key(&room_id) {
            RequestOutcome::Coalesced
        } else {
            RequestOutcome::Handled
        };
        self.entries.insert(room_id, request);
        outcome
    }

    /// Remove and return every entry whose debounce window has elapsed as
    /// of `now`, ordered by due time then room id (§5's ordering guarantee).
    pub fn drain_due(&self, now: Instant) -> Vec<(RoomId, PendingRequest)> {
        let mut due = Vec::new();
        self.entries.retain(|room_id, request| {
            if request.due_at <= now {
                due.push((room_id.clone(), request.clone()));
                false
            } else {
                true
            }
        });
        due.sort_by(|a, b| a.1.due_at.cmp(&b.1.due_at).then_with(|| a.0.cmp(&b.0)));
        due
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
