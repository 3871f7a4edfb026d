/*!
 * HVAC Scheduler - Main Entry Point
 *
 * Boots the scheduler loop for a fixed set of demo rooms, wires up the
 * in-memory detail recorder, and serves the gateway until Ctrl+C.
 */

use hvac_scheduler::{
    ActionRequest, Action, Config, FanSpeed, Mode, RequestGateway, RoomId, SchedulerCore,
    SchedulerTask, SystemClock,
};
use hvac_scheduler::billing::InMemoryDetailRecorder;
use hvac_scheduler::rooms::RoomStore;
use hvac_scheduler::scheduler::PendingStore;
use log::info;
use std::error::Error;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("hvac-scheduler starting...");

    let config = Arc::new(Config::new());
    let clock = Arc::new(SystemClock);
    let rooms = Arc::new(RoomStore::new(config.clone(), clock.clone()));
    let recorder = Arc::new(InMemoryDetailRecorder::new());
    let pending = Arc::new(PendingStore::new());

    let core = SchedulerCore::new(
        config.clone(),
        clock.clone(),
        rooms.clone(),
        recorder,
        pending.clone(),
    );
    let (task, handle) = SchedulerTask::spawn(core);
    let gateway = RequestGateway::new(config, clock, rooms, pending, handle);

    for room_id in ["101", "102", "103", "104", "105"] {
        gateway.init(RoomId::new(room_id)).await;
    }
    info!("checked in 5 demo rooms");

    gateway
        .submit(
            RoomId::new("101"),
            ActionRequest {
                action: Action::PowerOn,
                target_temp: Some(22.0),
                fan: Some(FanSpeed::High),
                mode: Some(Mode::Cooling),
                order_id: None,
            },
        )
        .expect("room 101 is known");

    info!("hvac-scheduler ready, press Ctrl+C to exit");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    for view in gateway.snapshot_all() {
        info!(
            "room {}: phase={:?} current={:.2} target={:.2} cost={}",
            view.room_id, view.phase, view.current_temp, view.target_temp, view.cost
        );
    }

    task.shutdown().await;
    info!("hvac-scheduler stopped");
    Ok(())
}
