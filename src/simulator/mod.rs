/*!
 * Simulator
 *
 * Per-tick temperature and cost advancement (§4.2). Pure functions over a
 * `RoomState` plus the tick's `Config` and elapsed duration — no locking, no
 * I/O, so the tick loop can call this once per room per tick without
 * worrying about reentrancy.
 */

use crate::core::config::Config;
use crate::core::types::{Mode, Phase};
use crate::rooms::state::RoomState;
use rust_decimal::Decimal;
use std::time::Duration;

/// Advance one room by `dt`. SERVING rooms move toward their target and
/// accrue energy/cost while short of it; WAITING rooms are frozen; OFF and
/// STANDBY rooms drift passively toward ambient.
///
/// All rooms processed within the same tick must be passed the same `dt`
/// snapshot (§4.2's "same Δt snapshot" requirement) — this function takes
/// it as a parameter rather than computing it itself so the tick loop is
/// the single source of "now."
pub fn advance(room: &mut RoomState, config: &Config, dt: Duration) {
    match room.phase {
        Phase::Serving => advance_serving(room, config, dt),
        Phase::Waiting => {}
        Phase::Off | Phase::Standby => advance_drift(room, config, dt),
    }
}

fn advance_serving(room: &mut RoomState, config: &Config, dt: Duration) {
    let dt_minutes = dt.as_secs_f64() / 60.0;
    let rate = config.temp_change_rate.get(room.fan);
    let power = config.fan_speed_power.get(room.fan);
    let delta = rate * dt_minutes;

    let moved = match room.mode {
        Mode::Cooling if room.current_temp > room.target_temp => {
            room.current_temp = (room.current_temp - delta).max(room.target_temp);
            true
        }
        Mode::Heating if room.current_temp < room.target_temp => {
            room.current_temp = (room.current_temp + delta).min(room.target_temp);
            true
        }
        _ => false,
    };

    if moved {
        let energy_delta = power * dt_minutes;
        room.accrued_energy += energy_delta;
        let energy_delta_decimal = Decimal::from_f64_retain(energy_delta).unwrap_or(Decimal::ZERO);
        room.accrued_cost += energy_delta_decimal * config.price_per_degree;
    }
}

fn advance_drift(room: &mut RoomState, config: &Config, dt: Duration) {
    let ambient = config.initial_room_temp;
    if (room.current_temp - ambient).abs() < f64::EPSILON {
        return;
    }
    let dt_minutes = dt.as_secs_f64() / 60.0;
    let delta = config.temp_restore_rate * dt_minutes;
    if room.current_temp > ambient {
        room.current_temp = (room.current_temp - delta).max(ambient);
    } else {
        room.current_temp = (room.current_temp + delta).min(ambient);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::FanSpeed;
    use std::time::Instant;

    fn serving_room(mode: Mode, current: f64, target: f64) -> RoomState {
        let mut room = RoomState::checked_in(Instant::now(), current, target);
        room.phase = Phase::Serving;
        room.mode = mode;
        room.current_temp = current;
        room.target_temp = target;
        room.fan = FanSpeed::Medium;
        room
    }

    #[test]
    fn serving_cooling_room_moves_toward_target_and_accrues() {
        let config = Config::default();
        let mut room = serving_room(Mode::Cooling, 28.0, 25.0);
        advance(&mut room, &config, Duration::from_secs(60));
        assert!(room.current_temp < 28.0);
        assert!(room.current_temp >= 25.0);
        assert!(room.accrued_energy > 0.0);
        assert!(room.accrued_cost > Decimal::ZERO);
    }

    #[test]
    fn cost_accrual_stays_exact_with_a_non_integral_price() {
        // price_per_degree = 0.1 has no exact f64 representation; if the
        // computation ever converts it down to f64 before multiplying, the
        // accrued cost drifts off the exact decimal product over many ticks.
        // Target is kept far below current so every tick still accrues
        // (medium fan: 0.5 energy units/min, so 10 ticks of 60s stay short
        // of the 8-degree gap to target).
        let mut config = Config::default();
        config.price_per_degree = Decimal::new(1, 1); // 0.1
        let mut room = serving_room(Mode::Cooling, 28.0, 20.0);
        for _ in 0..10 {
            advance(&mut room, &config, Duration::from_secs(60));
        }
        assert_eq!(room.accrued_energy, 5.0);
        assert_eq!(room.accrued_cost, Decimal::new(5, 1)); // 0.5, not a float-rounded approximation
    }

    #[test]
    fn serving_room_at_target_does_not_overshoot_or_accrue() {
        let config = Config::default();
        let mut room = serving_room(Mode::Cooling, 25.0, 25.0);
        advance(&mut room, &config, Duration::from_secs(60));
        assert_eq!(room.current_temp, 25.0);
        assert_eq!(room.accrued_energy, 0.0);
        assert_eq!(room.accrued_cost, Decimal::ZERO);
    }

    #[test]
    fn waiting_room_is_frozen() {
        let config = Config::default();
        let mut room = serving_room(Mode::Cooling, 28.0, 25.0);
        room.phase = Phase::Waiting;
        advance(&mut room, &config, Duration::from_secs(60));
        assert_eq!(room.current_temp, 28.0);
        assert_eq!(room.accrued_energy, 0.0);
    }

    #[test]
    fn off_room_drifts_toward_ambient_and_clamps() {
        let config = Config::default();
        let mut room = serving_room(Mode::Cooling, 20.0, 25.0);
        room.phase = Phase::Off;
        for _ in 0..1000 {
            advance(&mut room, &config, Duration::from_secs(60));
        }
        assert_eq!(room.current_temp, config.initial_room_temp);
    }
}
