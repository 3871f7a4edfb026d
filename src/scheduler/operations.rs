/*!
 * Scheduler Core — Request Handling
 *
 * POWER_ON, POWER_OFF, CHANGE_SPEED, and admission-by-preemption (§4.4).
 * CHANGE_TEMP lives outside this module: it touches neither set nor the
 * detail record, so the gateway applies it directly against the room
 * store (§4.3).
 */

use crate::core::config::Config;
use crate::core::types::{FanSpeed, Mode, RoomId};
use crate::rooms::RoomStore;
use crate::scheduler::SchedulerCore;

/// `CHANGE_TEMP(target, mode)`: update `target_temp` (clamped) and `mode`
/// wherever the room currently is. Never touches queues, slot counts, or
/// detail records — users adjusting the setpoint keep their slot (§4.4).
pub fn change_temp(rooms: &RoomStore, config: &Config, room_id: &RoomId, target: f64, mode: Mode) -> bool {
    let clamped = config.clamp_target(target, mode);
    rooms.mutate(room_id, |room| {
        room.target_temp = clamped;
        room.mode = mode;
    })
}

impl SchedulerCore {
    /// `POWER_ON(target, fan, mode)` (§4.4).
    pub fn power_on(
        &mut self,
        room_id: &RoomId,
        target: f64,
        fan: FanSpeed,
        mode: Mode,
        order_id: Option<String>,
    ) {
        if self.rooms.get(room_id).is_none() {
            return;
        }
        let clamped_target = self.config.clamp_target(target, mode);
        let was_serving = self.service_set.contains(room_id);
        let was_waiting = self.wait_set.contains(room_id);

        if was_serving {
            // Regime change on an already-SERVING room: close the current
            // segment, apply the new parameters, reopen under them.
            self.close_open_record(room_id);
            self.rooms.mutate(room_id, |r| {
                r.target_temp = clamped_target;
                r.fan = fan;
                r.mode = mode;
            });
            self.open_record_for(room_id, order_id);
            return;
        }

        if was_waiting {
            // No open record to close while WAITING. The new fan priority
            // may now be high enough to preempt a SERVING room.
            self.rooms.mutate(room_id, |r| {
                r.target_temp = clamped_target;
                r.fan = fan;
                r.mode = mode;
            });
            self.reevaluate_preemption_from_waiting(room_id);
            return;
        }

        // Room is OFF or STANDBY.
        self.rooms.mutate(room_id, |r| {
            r.target_temp = clamped_target;
            r.fan = fan;
            r.mode = mode;
        });

        if self.service_set.len() < self.config.max_service_slots {
            self.admit_to_service(room_id, order_id);
        } else {
            self.admission_by_preemption(room_id, fan, order_id);
        }
    }

    /// `POWER_OFF` (§4.4).
    pub fn power_off(&mut self, room_id: &RoomId) {
        if self.service_set.contains(room_id) {
            self.close_open_record(room_id);
            self.service_set.retain(|id| id != room_id);
            self.rooms.mutate(room_id, |r| {
                r.phase = crate::core::types::Phase::Off;
                r.phase_entered_at = self.clock.now();
            });
            self.admission_from_wait();
        } else if self.wait_set.contains(room_id) {
            self.close_open_record(room_id);
            self.wait_set.retain(|id| id != room_id);
            self.rooms.mutate(room_id, |r| {
                r.phase = crate::core::types::Phase::Off;
                r.phase_entered_at = self.clock.now();
                r.wait_slice_deadline = None;
            });
        }
    }

    /// `CHANGE_SPEED(fan)` (§4.4).
    pub fn change_speed(&mut self, room_id: &RoomId, fan: FanSpeed) {
        let was_serving = self.service_set.contains(room_id);
        self.rooms.mutate(room_id, |r| r.fan = fan);

        if was_serving {
            // Fan change shifts the cost regime: end this segment, start a
            // fresh one.
            self.close_open_record(room_id);
            self.open_record_for(room_id, None);
        } else if self.wait_set.contains(room_id) {
            self.reevaluate_preemption_from_waiting(room_id);
        }
    }

    /// The new fan priority of a WAITING room may now exceed a SERVING
    /// room's; evict the lowest-priority (tie-break longest serving) victim
    /// and promote this room if so (§4.4's CHANGE_SPEED rule, reused by
    /// the POWER_ON regime-change path too).
    fn reevaluate_preemption_from_waiting(&mut self, room_id: &RoomId) {
        if !self.wait_set.contains(room_id) {
            return;
        }
        let Some(new_room) = self.rooms.get(room_id) else {
            return;
        };
        let now = self.clock.now();
        let mut victim: Option<(RoomId, FanSpeed, std::time::Duration)> = None;
        for candidate_id in &self.service_set {
            let Some(candidate) = self.rooms.get(candidate_id) else {
                continue;
            };
            if candidate.fan.priority() < new_room.fan.priority() {
                let duration = candidate.phase_duration(now);
                let better = match &victim {
                    None => true,
                    Some((_, v_fan, v_dur)) => {
                        candidate.fan.priority() < v_fan.priority()
                            || (candidate.fan.priority() == v_fan.priority() && duration > *v_dur)
                    }
                };
                if better {
                    victim = Some((candidate_id.clone(), candidate.fan, duration));
                }
            }
        }

        if let Some((victim_id, ..)) = victim {
            self.close_open_record(&victim_id);
            self.service_set.retain(|id| id != &victim_id);
            self.rooms.mutate(&victim_id, |r| {
                r.phase = crate::core::types::Phase::Waiting;
                r.phase_entered_at = now;
                r.wait_slice_deadline = Some(now + self.config.wait_time_slice);
            });
            self.wait_set.push(victim_id);

            self.wait_set.retain(|id| id != room_id);
            self.service_set.push(room_id.clone());
            self.open_record_for(room_id, None);
        }
    }

    /// Admission-by-preemption: when `POWER_ON` finds all slots taken
    /// (§4.4).
    fn admission_by_preemption(&mut self, room_id: &RoomId, fan: FanSpeed, order_id: Option<String>) {
        let now = self.clock.now();
        let p_new = fan.priority();

        let mut candidates: Vec<(RoomId, u8, std::time::Duration)> = self
            .service_set
            .iter()
            .filter_map(|id| {
                let room = self.rooms.get(id)?;
                if room.fan.priority() < p_new {
                    Some((id.clone(), room.fan.priority(), room.phase_duration(now)))
                } else {
                    None
                }
            })
            .collect();

        if candidates.is_empty() {
            self.rooms.mutate(room_id, |r| {
                r.phase = crate::core::types::Phase::Waiting;
                r.phase_entered_at = now;
                r.wait_slice_deadline = Some(now + self.config.wait_time_slice);
                r.open_record_id = None;
            });
            self.wait_set.push(room_id.clone());
            return;
        }

        candidates.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| b.2.cmp(&a.2)));
        let (victim_id, ..) = candidates.remove(0);

        self.close_open_record(&victim_id);
        self.service_set.retain(|id| id != &victim_id);
        self.rooms.mutate(&victim_id, |r| {
            r.phase = crate::core::types::Phase::Waiting;
            r.phase_entered_at = now;
            r.wait_slice_deadline = Some(now + self.config.wait_time_slice);
            r.open_record_id = None;
        });
        self.wait_set.push(victim_id);

        self.admit_to_service(room_id, order_id);
    }

    /// Promote a known OFF/STANDBY room straight into the service set.
    fn admit_to_service(&mut self, room_id: &RoomId, order_id: Option<String>) {
        let now = self.clock.now();
        self.rooms.mutate(room_id, |r| {
            r.phase = crate::core::types::Phase::Serving;
            r.phase_entered_at = now;
        });
        self.service_set.push(room_id.clone());
        self.open_record_for(room_id, order_id);
    }

    /// Close whatever detail record is open for `room_id`, if any.
    pub(crate) fn close_open_record(&self, room_id: &RoomId) {
        if let Some(room) = self.rooms.get(room_id) {
            if let Some(record_id) = room.open_record_id {
                if let Err(err) = self.recorder.close(
                    record_id,
                    room.current_temp,
                    room.accrued_energy,
                    room.accrued_cost,
                ) {
                    log::warn!("failed to close detail record for room {room_id}: {err}");
                }
                self.rooms.mutate(room_id, |r| r.open_record_id = None);
            }
        }
    }

    /// Open a fresh detail record for a room that is (about to be) SERVING.
    pub(crate) fn open_record_for(&self, room_id: &RoomId, order_id: Option<String>) {
        let Some(room) = self.rooms.get(room_id) else {
            return;
        };
        match self.recorder.open(
            room_id.clone(),
            order_id,
            room.current_temp,
            room.target_temp,
            room.fan,
            room.mode,
        ) {
            Ok(record_id) => {
                self.rooms.mutate(room_id, |r| r.open_record_id = Some(record_id));
            }
            Err(err) => {
                log::warn!("failed to open detail record for room {room_id}: {err}");
            }
        }
    }

    /// Admission-from-wait: backfill freed slots from the wait set (§4.5
    /// step 6, also used after `POWER_OFF`).
    pub(crate) fn admission_from_wait(&mut self) {
        while self.service_set.len() < self.config.max_service_slots && !self.wait_set.is_empty() {
            let now = self.clock.now();
            let best = self
                .wait_set
                .iter()
                .enumerate()
                .filter_map(|(idx, id)| {
                    let room = self.rooms.get(id)?;
                    Some((idx, room.fan.priority(), room.wait_slice_deadline.unwrap_or(now), room.phase_entered_at))
                })
                .min_by(|a, b| {
                    // priority descending, wait_slice_deadline ascending, phase_entered_at ascending
                    b.1.cmp(&a.1)
                        .then_with(|| a.2.cmp(&b.2))
                        .then_with(|| a.3.cmp(&b.3))
                });

            let Some((idx, ..)) = best else { break };
            let room_id = self.wait_set.remove(idx);
            self.rooms.mutate(&room_id, |r| {
                r.phase = crate::core::types::Phase::Serving;
                r.phase_entered_at = now;
                r.wait_slice_deadline = None;
            });
            self.service_set.push(room_id.clone());
            self.open_record_for(&room_id, None);
        }
    }
}
