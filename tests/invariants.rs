//! Universal invariants (§8) checked against both literal scenarios and
//! randomized request sequences.

use hvac_scheduler::billing::InMemoryDetailRecorder;
use hvac_scheduler::core::clock::{Clock, ManualClock};
use hvac_scheduler::core::config::Config;
use hvac_scheduler::rooms::RoomStore;
use hvac_scheduler::scheduler::{PendingStore, SchedulerCore};
use hvac_scheduler::{FanSpeed, Mode, Phase, RoomId};
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

fn harness(room_ids: &[&str]) -> (SchedulerCore, Arc<ManualClock>) {
    let config = Arc::new(Config::default());
    let clock = Arc::new(ManualClock::new());
    let rooms = Arc::new(RoomStore::new(config.clone(), clock.clone() as Arc<dyn Clock>));
    let recorder = Arc::new(InMemoryDetailRecorder::new());
    let pending = Arc::new(PendingStore::new());
    for id in room_ids {
        rooms.init(RoomId::new(*id));
    }
    let core = SchedulerCore::new(config, clock.clone() as Arc<dyn Clock>, rooms, recorder, pending);
    (core, clock)
}

fn assert_universal_invariants(core: &SchedulerCore) {
    // 1. |service set| <= MAX_SERVICE_SLOTS.
    assert!(core.service_set.len() <= core.config.max_service_slots);

    // 2. No room is in both sets.
    for id in &core.service_set {
        assert!(!core.wait_set.contains(id), "{id} in both sets");
    }

    // 3. Every SERVING room has an open record; every other phase has none.
    for room_id in core.rooms.room_ids() {
        let room = core.rooms.get(&room_id).unwrap();
        match room.phase {
            Phase::Serving => assert!(
                room.open_record_id.is_some(),
                "SERVING room {room_id} has no open record"
            ),
            _ => assert!(
                room.open_record_id.is_none(),
                "non-SERVING room {room_id} has an open record"
            ),
        }
    }
}

#[test]
fn preempt_and_rotate_preserve_invariants() {
    let (mut core, clock) = harness(&["R1", "R2", "R3", "R4", "R5"]);
    let rooms = ["R1", "R2", "R3", "R4", "R5"];
    let fans = [FanSpeed::Low, FanSpeed::Low, FanSpeed::Low, FanSpeed::High, FanSpeed::Medium];

    for (id, fan) in rooms.iter().zip(fans.iter()) {
        core.power_on(&RoomId::new(*id), 22.0, *fan, Mode::Cooling, None);
        assert_universal_invariants(&core);
        let now = clock.advance(Duration::from_secs(1));
        core.run_tick(now, Duration::from_secs(1));
        assert_universal_invariants(&core);
    }

    for _ in 0..130 {
        let now = clock.advance(Duration::from_secs(1));
        core.run_tick(now, Duration::from_secs(1));
        assert_universal_invariants(&core);
    }
}

#[test]
fn clear_leaves_no_open_record_for_the_occupancy() {
    let (mut core, clock) = harness(&["R1"]);
    core.power_on(&RoomId::new("R1"), 22.0, FanSpeed::Low, Mode::Cooling, None);
    let now = clock.advance(Duration::from_secs(1));
    core.run_tick(now, Duration::from_secs(1));

    let final_state = core.clear_room(&RoomId::new("R1")).unwrap();
    assert!(final_state.open_record_id.is_none());
    assert!(core.rooms.get(&RoomId::new("R1")).is_none());
}

#[test]
fn change_temp_never_touches_membership_or_fan() {
    let (mut core, clock) = harness(&["R1", "R2"]);
    core.power_on(&RoomId::new("R1"), 22.0, FanSpeed::Low, Mode::Cooling, None);
    let now = clock.advance(Duration::from_secs(1));
    core.run_tick(now, Duration::from_secs(1));

    let before_service = core.service_set.clone();
    let before_wait = core.wait_set.clone();
    let before_fan = core.rooms.get(&RoomId::new("R1")).unwrap().fan;

    hvac_scheduler::scheduler::operations::change_temp(
        &core.rooms,
        &core.config,
        &RoomId::new("R1"),
        18.0,
        Mode::Cooling,
    );

    assert_eq!(core.service_set, before_service);
    assert_eq!(core.wait_set, before_wait);
    assert_eq!(core.rooms.get(&RoomId::new("R1")).unwrap().fan, before_fan);
}

#[test]
fn target_below_band_clamps_instead_of_erroring() {
    let (mut core, _clock) = harness(&["R1"]);
    core.power_on(&RoomId::new("R1"), -40.0, FanSpeed::Low, Mode::Cooling, None);
    let room = core.rooms.get(&RoomId::new("R1")).unwrap();
    let (min, _max) = core.config.cooling_band;
    assert_eq!(room.target_temp, min);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn random_power_on_off_sequences_hold_universal_invariants(
        actions in proptest::collection::vec((0usize..5, 0u8..2, 0u8..3), 1..40)
    ) {
        let (mut core, clock) = harness(&["R1", "R2", "R3", "R4", "R5"]);
        let room_names = ["R1", "R2", "R3", "R4", "R5"];
        let fans = [FanSpeed::Low, FanSpeed::Medium, FanSpeed::High];

        for (room_idx, action_bit, fan_idx) in actions {
            let room_id = RoomId::new(room_names[room_idx]);
            if action_bit == 0 {
                core.power_on(&room_id, 22.0, fans[fan_idx as usize], Mode::Cooling, None);
            } else {
                core.power_off(&room_id);
            }
            assert_universal_invariants(&core);
            let now = clock.advance(Duration::from_secs(1));
            core.run_tick(now, Duration::from_secs(1));
            assert_universal_invariants(&core);
        }
    }
}
