/*!
 * Scheduler Task
 *
 * Drives the tick loop on a `tokio::time::interval`, grounded in the
 * teacher's autonomous scheduler task: a background task owns the mutable
 * state exclusively and communicates with the outside world only through
 * an mpsc command channel.
 */

use crate::core::types::RoomId;
use crate::rooms::RoomState;
use crate::scheduler::SchedulerCore;
use log::{info, warn};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// Control messages accepted by the running scheduler loop. Room
/// check-in and check-out both need the loop's cooperation (either can
/// leave the service/wait sets inconsistent with the store if handled
/// outside it), so they're the two gateway operations that cross the
/// command channel rather than touching shared state directly.
enum Command {
    Init(RoomId, oneshot::Sender<()>),
    Clear(RoomId, oneshot::Sender<Option<RoomState>>),
    Shutdown,
}

/// A cheap, cloneable handle the gateway holds to ask the running
/// scheduler loop to check a room in or out.
#[derive(Clone)]
pub struct SchedulerHandle {
    command_tx: mpsc::UnboundedSender<Command>,
}

impl SchedulerHandle {
    /// Check a room in through the scheduler loop, clearing any stale
    /// service/wait-set membership left over from a prior occupancy before
    /// the store resets the room to OFF. Resolves once applied, or
    /// immediately if the loop has already shut down.
    pub async fn init(&self, room_id: RoomId) {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.command_tx.send(Command::Init(room_id, reply_tx)).is_err() {
            return;
        }
        let _ = reply_rx.await;
    }

    /// Check a room out through the scheduler loop and return its final
    /// state. Returns `None` if the loop has already shut down or the room
    /// was unknown.
    pub async fn clear(&self, room_id: RoomId) -> Option<RoomState> {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.command_tx.send(Command::Clear(room_id, reply_tx)).is_err() {
            return None;
        }
        reply_rx.await.ok().flatten()
    }
}

/// Handle to the background scheduler task.
pub struct SchedulerTask {
    command_tx: mpsc::UnboundedSender<Command>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl SchedulerTask {
    /// Spawn the tick loop. `core` becomes exclusively owned by the
    /// spawned task; all other access to scheduling state goes through the
    /// `RoomStore`/`PendingStore` it holds, or through the returned
    /// `SchedulerHandle`.
    pub fn spawn(core: SchedulerCore) -> (Self, SchedulerHandle) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let tick_interval = core.config.tick_interval;

        let handle = tokio::spawn(run_loop(core, tick_interval, command_rx));
        info!("scheduler task spawned, tick interval {tick_interval:?}");

        let task = Self {
            command_tx: command_tx.clone(),
            handle: Some(handle),
        };
        let scheduler_handle = SchedulerHandle { command_tx };
        (task, scheduler_handle)
    }

    /// Ask the loop to finish its in-flight tick and exit, then wait for it.
    pub async fn shutdown(mut self) {
        let _ = self.command_tx.send(Command::Shutdown);
        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                warn!("scheduler task shutdown error: {err}");
            } else {
                info!("scheduler task shutdown complete");
            }
        }
    }
}

impl Drop for SchedulerTask {
    fn drop(&mut self) {
        if self.handle.is_some() {
            let _ = self.command_tx.send(Command::Shutdown);
        }
    }
}

async fn run_loop(
    mut core: SchedulerCore,
    tick_interval: Duration,
    mut command_rx: mpsc::UnboundedReceiver<Command>,
) {
    let mut interval = tokio::time::interval(tick_interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let now = core.clock.now();
                core.run_tick(now, tick_interval);
            }
            Some(cmd) = command_rx.recv() => {
                match cmd {
                    Command::Init(room_id, reply_tx) => {
                        core.init_room(room_id);
                        let _ = reply_tx.send(());
                    }
                    Command::Clear(room_id, reply_tx) => {
                        let final_state = core.clear_room(&room_id);
                        core.admission_from_wait();
                        let _ = reply_tx.send(final_state);
                    }
                    Command::Shutdown => {
                        info!("scheduler task shutting down");
                        break;
                    }
                }
            }
        }
    }
}
