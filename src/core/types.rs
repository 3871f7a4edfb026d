/*!
 * Core Types
 * Common types used across the scheduler
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque room identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoomId(pub String);

impl RoomId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RoomId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RoomId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Operational phase of a room's AC state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Off,
    Serving,
    Waiting,
    Standby,
}

/// Conditioning mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Cooling,
    Heating,
}

/// Fan speed, ordered by priority (Low < Medium < High)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FanSpeed {
    Low,
    Medium,
    High,
}

impl FanSpeed {
    /// FAN_SPEED_PRIORITY: Low=1, Medium=2, High=3
    #[inline]
    pub const fn priority(self) -> u8 {
        match self {
            FanSpeed::Low => 1,
            FanSpeed::Medium => 2,
            FanSpeed::High => 3,
        }
    }
}

/// Action requested for a room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    PowerOn,
    PowerOff,
    ChangeTemp,
    ChangeSpeed,
}

/// Outcome returned synchronously from `RequestGateway::submit`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestOutcome {
    /// Applied immediately (or the debounce window had already elapsed).
    Handled,
    /// Coalesced with a still-pending request for the same room.
    Coalesced,
}
