/*!
 * Request Gateway
 *
 * The external-facing façade (§4.3, §6): submit requests, read state, and
 * drive room check-in/check-out. Everything here either writes to a
 * lock-free concurrent map (`RoomStore`, `PendingStore`) or forwards to
 * the scheduler loop through a `SchedulerHandle` — callers never block on
 * a full tick.
 */

pub mod view;

pub use view::RoomStateView;

use crate::core::clock::Clock;
use crate::core::config::Config;
use crate::core::errors::{HvacError, Result};
use crate::core::types::{Action, FanSpeed, Mode, RequestOutcome, RoomId};
use crate::rooms::RoomStore;
use crate::scheduler::{operations, PendingRequest, PendingStore, SchedulerHandle};
use std::sync::Arc;

/// The action and parameters a caller submits for one room (§3's Pending
/// Request).
#[derive(Debug, Clone)]
pub struct ActionRequest {
    pub action: Action,
    pub target_temp: Option<f64>,
    pub fan: Option<FanSpeed>,
    pub mode: Option<Mode>,
    pub order_id: Option<String>,
}

pub struct RequestGateway {
    config: Arc<Config>,
    clock: Arc<dyn Clock>,
    rooms: Arc<RoomStore>,
    pending: Arc<PendingStore>,
    scheduler: SchedulerHandle,
}

impl RequestGateway {
    pub fn new(
        config: Arc<Config>,
        clock: Arc<dyn Clock>,
        rooms: Arc<RoomStore>,
        pending: Arc<PendingStore>,
        scheduler: SchedulerHandle,
    ) -> Self {
        Self {
            config,
            clock,
            rooms,
            pending,
            scheduler,
        }
    }

    /// Check a room in (§4.1). Idempotent: re-checking in an occupied room
    /// resets it. Routed through the scheduler loop (rather than writing
    /// `RoomStore` directly) so a room still SERVING/WAITING from a prior
    /// occupancy has that stale membership cleared in the same step that
    /// resets its state to OFF, instead of leaving the service/wait sets
    /// pointing at a room the store says is idle.
    pub async fn init(&self, room_id: RoomId) {
        self.scheduler.init(room_id).await;
    }

    /// Check a room out and return its final state (§4.1, §6).
    pub async fn clear(&self, room_id: RoomId) -> Option<RoomStateView> {
        let now = self.clock.now();
        self.scheduler
            .clear(room_id.clone())
            .await
            .map(|room| RoomStateView::from_room(room_id, &room, now))
    }

    pub fn state(&self, room_id: &RoomId) -> Result<RoomStateView> {
        let room = self
            .rooms
            .get(room_id)
            .ok_or_else(|| HvacError::UnknownRoom(room_id.clone()))?;
        Ok(RoomStateView::from_room(room_id.clone(), &room, self.clock.now()))
    }

    pub fn snapshot_all(&self) -> Vec<RoomStateView> {
        let now = self.clock.now();
        self.rooms
            .snapshot_all()
            .into_iter()
            .map(|(room_id, room)| RoomStateView::from_room(room_id, &room, now))
            .collect()
    }

    /// Submit a request for a room (§4.3).
    ///
    /// `CHANGE_TEMP` is applied immediately against the room store and
    /// never debounced. Every other action is coalesced: a still-pending
    /// request for the same room is overwritten and `Coalesced` is
    /// reported; otherwise the request is queued and `Handled` is reported,
    /// to be applied by the scheduler loop once the debounce window
    /// elapses.
    pub fn submit(&self, room_id: RoomId, request: ActionRequest) -> Result<RequestOutcome> {
        if !self.rooms.contains(&room_id) {
            return Err(HvacError::UnknownRoom(room_id));
        }

        if request.action == Action::ChangeTemp {
            let target = request
                .target_temp
                .ok_or_else(|| HvacError::InvalidRequest("CHANGE_TEMP requires target_temp".into()))?;
            let mode = request
                .mode
                .ok_or_else(|| HvacError::InvalidRequest("CHANGE_TEMP requires mode".into()))?;
            operations::change_temp(&self.rooms, &self.config, &room_id, target, mode);
            return Ok(RequestOutcome::Handled);
        }

        let now = self.clock.now();
        let pending = PendingRequest {
            action: request.action,
            target_temp: request.target_temp,
            fan: request.fan,
            mode: request.mode,
            submitted_at: now,
            due_at: now + self.config.debounce_window,
        };
        Ok(self.pending.submit(room_id, pending))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::InMemoryDetailRecorder;
    use crate::core::clock::ManualClock;
    use crate::scheduler::SchedulerCore;

    fn gateway() -> (RequestGateway, Arc<ManualClock>, crate::scheduler::SchedulerTask) {
        let config = Arc::new(Config::default());
        let clock = Arc::new(ManualClock::new());
        let rooms = Arc::new(RoomStore::new(config.clone(), clock.clone() as Arc<dyn Clock>));
        let recorder = Arc::new(InMemoryDetailRecorder::new());
        let pending = Arc::new(PendingStore::new());
        let core = SchedulerCore::new(
            config.clone(),
            clock.clone() as Arc<dyn Clock>,
            rooms.clone(),
            recorder,
            pending.clone(),
        );
        let (task, handle) = crate::scheduler::SchedulerTask::spawn(core);
        let gateway = RequestGateway::new(config, clock.clone() as Arc<dyn Clock>, rooms, pending, handle);
        (gateway, clock, task)
    }

    #[tokio::test]
    async fn submit_on_unknown_room_is_an_error() {
        let (gateway, _clock, _task) = gateway();
        let result = gateway.submit(
            RoomId::new("999"),
            ActionRequest {
                action: Action::PowerOn,
                target_temp: Some(24.0),
                fan: Some(FanSpeed::Medium),
                mode: Some(Mode::Cooling),
                order_id: None,
            },
        );
        assert!(matches!(result, Err(HvacError::UnknownRoom(_))));
    }

    #[tokio::test]
    async fn change_temp_applies_immediately() {
        let (gateway, _clock, _task) = gateway();
        gateway.init(RoomId::new("301")).await;
        let outcome = gateway
            .submit(
                RoomId::new("301"),
                ActionRequest {
                    action: Action::ChangeTemp,
                    target_temp: Some(20.0),
                    fan: None,
                    mode: Some(Mode::Cooling),
                    order_id: None,
                },
            )
            .unwrap();
        assert_eq!(outcome, RequestOutcome::Handled);
        let state = gateway.state(&RoomId::new("301")).unwrap();
        assert_eq!(state.target_temp, 20.0);
    }

    #[tokio::test]
    async fn second_submission_within_window_is_coalesced() {
        let (gateway, _clock, _task) = gateway();
        gateway.init(RoomId::new("301")).await;
        let request = ActionRequest {
            action: Action::PowerOn,
            target_temp: Some(20.0),
            fan: Some(FanSpeed::Medium),
            mode: Some(Mode::Cooling),
            order_id: None,
        };
        let first = gateway.submit(RoomId::new("301"), request.clone()).unwrap();
        let second = gateway.submit(RoomId::new("301"), request).unwrap();
        assert_eq!(first, RequestOutcome::Handled);
        assert_eq!(second, RequestOutcome::Coalesced);
    }
}
