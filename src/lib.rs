/*!
 * HVAC Scheduler Library
 *
 * Priority/time-slice scheduler and billing simulation for a hotel's
 * central air-conditioning plant.
 */

pub mod billing;
pub mod core;
pub mod gateway;
pub mod rooms;
pub mod scheduler;
pub mod simulator;

pub use core::{Clock, Config, FanTable, HvacError, ManualClock, Result, SystemClock};
pub use core::{Action, FanSpeed, Mode, Phase, RequestOutcome, RoomId};
pub use gateway::{ActionRequest, RequestGateway, RoomStateView};
pub use rooms::{RoomState, RoomStore};
pub use scheduler::{SchedulerCore, SchedulerHandle, SchedulerTask};
