/*!
 * Scheduler Core — Per-Tick Policy
 *
 * The six ordered steps run once per tick (§4.5). A tick is an atomic step
 * from the caller's point of view: all rooms see the same "now" and the
 * same `dt` snapshot.
 */

use crate::core::types::{Action, Mode, Phase};
use crate::scheduler::SchedulerCore;
use crate::simulator;
use std::time::{Duration, Instant};

impl SchedulerCore {
    /// Run one tick of duration `dt`, ending at `now`.
    pub fn run_tick(&mut self, now: Instant, dt: Duration) {
        self.drain_due_requests(now);
        self.advance_simulation(dt);
        self.check_targets_reached(now);
        self.rotate_time_slices(now);
        self.restart_drifted_standby_rooms();
        self.admission_from_wait();
        self.check_invariants(now);
    }

    /// Step 1: apply every pending request whose debounce window elapsed.
    fn drain_due_requests(&mut self, now: Instant) {
        for (room_id, request) in self.pending.drain_due(now) {
            if !self.rooms.contains(&room_id) {
                continue;
            }
            match request.action {
                Action::PowerOn => {
                    let target = request.target_temp.unwrap_or(self.config.default_temp);
                    let fan = request.fan.unwrap_or(crate::core::types::FanSpeed::Medium);
                    let mode = request.mode.unwrap_or(Mode::Cooling);
                    self.power_on(&room_id, target, fan, mode, None);
                }
                Action::PowerOff => self.power_off(&room_id),
                Action::ChangeSpeed => {
                    if let Some(fan) = request.fan {
                        self.change_speed(&room_id, fan);
                    }
                }
                Action::ChangeTemp => {
                    // Never queued here (§4.3); present only if a future
                    // caller misuses the pending path directly.
                }
            }
        }
    }

    /// Step 2: advance temperature/cost for every known room (§4.2).
    fn advance_simulation(&mut self, dt: Duration) {
        for room_id in self.rooms.room_ids() {
            self.rooms.mutate(&room_id, |room| {
                simulator::advance(room, &self.config, dt);
            });
        }
    }

    /// Step 3: SERVING rooms that reached their target move to STANDBY and
    /// free their slot.
    fn check_targets_reached(&mut self, now: Instant) {
        let reached: Vec<_> = self
            .service_set
            .iter()
            .filter(|id| {
                self.rooms
                    .get(id)
                    .map(|room| target_reached(&room))
                    .unwrap_or(false)
            })
            .cloned()
            .collect();

        for room_id in reached {
            self.close_open_record(&room_id);
            self.service_set.retain(|id| id != &room_id);
            self.rooms.mutate(&room_id, |r| {
                r.phase = Phase::Standby;
                r.phase_entered_at = now;
            });
        }
    }

    /// Step 4: rooms that have exhausted a full wait slice may preempt a
    /// lower-or-equal-priority SERVING room.
    fn rotate_time_slices(&mut self, now: Instant) {
        loop {
            let expired: Vec<_> = self
                .wait_set
                .iter()
                .filter_map(|id| {
                    let room = self.rooms.get(id)?;
                    let deadline = room.wait_slice_deadline?;
                    if deadline <= now {
                        Some((id.clone(), room.fan.priority(), room.phase_duration(now)))
                    } else {
                        None
                    }
                })
                .collect();

            if expired.is_empty() {
                break;
            }

            let mut ordered = expired;
            ordered.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| b.2.cmp(&a.2)));

            let mut swapped_any = false;
            for (waiter_id, waiter_priority, _) in ordered {
                if let Some(victim_id) = self.find_rotation_victim(waiter_priority, now) {
                    self.close_open_record(&victim_id);
                    self.service_set.retain(|id| id != &victim_id);
                    self.rooms.mutate(&victim_id, |r| {
                        r.phase = Phase::Waiting;
                        r.phase_entered_at = now;
                        r.wait_slice_deadline = Some(now + self.config.wait_time_slice);
                    });
                    self.wait_set.push(victim_id);

                    self.wait_set.retain(|id| id != &waiter_id);
                    self.rooms.mutate(&waiter_id, |r| {
                        r.phase = Phase::Serving;
                        r.phase_entered_at = now;
                        r.wait_slice_deadline = None;
                    });
                    self.service_set.push(waiter_id.clone());
                    self.open_record_for(&waiter_id, None);
                    swapped_any = true;
                    break;
                }
            }

            if !swapped_any {
                break;
            }
        }
    }

    /// Find a SERVING room with priority <= `waiter_priority`, preferring
    /// the longest service duration, tie-broken by lowest priority then
    /// lowest room id (§4.5 step 4).
    fn find_rotation_victim(&self, waiter_priority: u8, now: Instant) -> Option<crate::core::types::RoomId> {
        self.service_set
            .iter()
            .filter_map(|id| {
                let room = self.rooms.get(id)?;
                if room.fan.priority() <= waiter_priority {
                    Some((id.clone(), room.fan.priority(), room.phase_duration(now)))
                } else {
                    None
                }
            })
            .max_by(|a, b| {
                a.2.cmp(&b.2)
                    .then_with(|| b.1.cmp(&a.1))
                    .then_with(|| b.0.cmp(&a.0))
            })
            .map(|(id, ..)| id)
    }

    /// Step 5: a STANDBY room that has drifted past the threshold
    /// re-enters via an internal POWER_ON using its remembered setpoint.
    fn restart_drifted_standby_rooms(&mut self) {
        let standby_rooms = self.rooms.room_ids();
        let mut to_restart = Vec::new();
        for room_id in standby_rooms {
            let Some(room) = self.rooms.get(&room_id) else {
                continue;
            };
            if room.phase != Phase::Standby {
                continue;
            }
            let drifted = match room.mode {
                Mode::Cooling => room.current_temp > room.target_temp + self.config.temp_threshold,
                Mode::Heating => room.current_temp < room.target_temp - self.config.temp_threshold,
            };
            if drifted {
                to_restart.push((room_id, room.target_temp, room.fan, room.mode));
            }
        }
        for (room_id, target, fan, mode) in to_restart {
            self.power_on(&room_id, target, fan, mode, None);
        }
    }
    /// Step 7: defensive consistency check (§7's `InternalInvariantViolation`
    /// — service set over cap, or a room in both sets). None of the steps
    /// above should ever produce this; if one does through a bug elsewhere,
    /// log it and compensate rather than let the corruption propagate to the
    /// next tick (§7: "the loop logs, attempts a best-effort compensation
    /// (drop duplicates preferring SERVING), and proceeds").
    fn check_invariants(&mut self, now: Instant) {
        let service: std::collections::HashSet<_> = self.service_set.iter().cloned().collect();
        let dupes: Vec<_> = self
            .wait_set
            .iter()
            .filter(|id| service.contains(*id))
            .cloned()
            .collect();
        if !dupes.is_empty() {
            log::error!("invariant violation: rooms in both service and wait sets: {dupes:?}");
            self.wait_set.retain(|id| !service.contains(id));
        }

        if self.service_set.len() > self.config.max_service_slots {
            log::error!(
                "invariant violation: service set size {} exceeds cap {}",
                self.service_set.len(),
                self.config.max_service_slots
            );
            while self.service_set.len() > self.config.max_service_slots {
                let Some(room_id) = self.service_set.pop() else {
                    break;
                };
                self.close_open_record(&room_id);
                self.rooms.mutate(&room_id, |r| {
                    r.phase = Phase::Waiting;
                    r.phase_entered_at = now;
                    r.wait_slice_deadline = Some(now + self.config.wait_time_slice);
                });
                self.wait_set.push(room_id);
            }
        }
    }
}

fn target_reached(room: &crate::rooms::RoomState) -> bool {
    match room.mode {
        Mode::Cooling => room.current_temp <= room.target_temp,
        Mode::Heating => room.current_temp >= room.target_temp,
    }
}
