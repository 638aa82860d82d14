use crate::checkpoint::CheckpointRegistry;
use crate::physics::ContactEvent;
use crate::tuning::VehicleTuning;
use crate::vehicle::ChassisSample;
use rapier3d::na::{UnitQuaternion, Vector3};
use serde::Serialize;
use std::f32::consts::FRAC_PI_2;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum VehicleCondition {
    Healthy,
    /// Entered only through a respawn; damage is ignored until `until`.
    Invulnerable { until: f32 },
    /// Terminal until the session restarts.
    Destroyed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RespawnCause {
    Flipped,
    Stalled,
    OutOfBounds,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DamageOutcome {
    /// Trigger volume, soft contact, or already destroyed.
    Ignored,
    /// Would have hurt, but the vehicle is invulnerable.
    Absorbed,
    Damaged { amount: f32, health: f32 },
    Destroyed { amount: f32 },
}

/// Side effects the caller owes the physics world after a tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickReport {
    pub respawn: Option<RespawnCause>,
    pub restore_collision: bool,
    pub invulnerability_ended: bool,
}

/// Where and how to put the vehicle back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RespawnOrder {
    pub position: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
}

/// Facing used after every respawn: a quarter turn about world up.
pub fn respawn_rotation() -> UnitQuaternion<f32> {
    UnitQuaternion::from_axis_angle(&Vector3::y_axis(), -FRAC_PI_2)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HealthState {
    pub health: f32,
    pub last_collision: f32,
    pub last_movement: f32,
    /// Time at which contact response comes back after a respawn.
    pub collision_restore_at: Option<f32>,
}

pub struct DamageRespawnController {
    tuning: VehicleTuning,
    condition: VehicleCondition,
    state: HealthState,
    bounds_hit: bool,
}

impl DamageRespawnController {
    pub fn new(tuning: VehicleTuning) -> Self {
        let state = HealthState {
            health: tuning.max_health,
            last_collision: 0.0,
            last_movement: 0.0,
            collision_restore_at: None,
        };
        Self {
            tuning,
            condition: VehicleCondition::Healthy,
            state,
            bounds_hit: false,
        }
    }

    pub fn health(&self) -> f32 {
        self.state.health
    }

    pub fn max_health(&self) -> f32 {
        self.tuning.max_health
    }

    pub fn condition(&self) -> VehicleCondition {
        self.condition
    }

    pub fn state(&self) -> &HealthState {
        &self.state
    }

    pub fn is_invulnerable(&self) -> bool {
        matches!(self.condition, VehicleCondition::Invulnerable { .. })
    }

    pub fn is_destroyed(&self) -> bool {
        self.condition == VehicleCondition::Destroyed
    }

    /// Contact damage from the physics step.
    pub fn handle_contact(&mut self, event: &ContactEvent, now: f32) -> DamageOutcome {
        if event.other_is_trigger {
            return DamageOutcome::Ignored;
        }
        if self.is_invulnerable() {
            return DamageOutcome::Absorbed;
        }

        let impact = event.impact_velocity.abs();
        if impact <= self.tuning.damage_velocity_threshold {
            return DamageOutcome::Ignored;
        }

        let amount = (impact * self.tuning.damage_velocity_multiplier)
            .min(self.tuning.collision_damage_cap);
        self.apply_damage(amount, now)
    }

    /// Damage from any source (contacts, crates). Same invulnerability and
    /// floor rules for all of them.
    pub fn apply_damage(&mut self, amount: f32, now: f32) -> DamageOutcome {
        match self.condition {
            VehicleCondition::Destroyed => return DamageOutcome::Ignored,
            VehicleCondition::Invulnerable { .. } => return DamageOutcome::Absorbed,
            VehicleCondition::Healthy => {}
        }

        let amount = amount.max(0.0);
        self.state.health = (self.state.health - amount).max(0.0);
        self.state.last_collision = now;

        if self.state.health <= 0.0 {
            self.condition = VehicleCondition::Destroyed;
            info!(amount, "vehicle destroyed");
            return DamageOutcome::Destroyed { amount };
        }

        debug!(amount, health = self.state.health, "vehicle damaged");
        DamageOutcome::Damaged {
            amount,
            health: self.state.health,
        }
    }

    /// Bound volumes ask for a respawn; it is carried out on the next tick.
    pub fn request_bounds_respawn(&mut self) {
        self.bounds_hit = true;
    }

    /// Per-tick bookkeeping after the physics step and contact handling.
    pub fn tick(
        &mut self,
        sample: &ChassisSample,
        now: f32,
        dt: f32,
        game_active: bool,
    ) -> TickReport {
        let mut report = TickReport::default();

        if self.state.collision_restore_at.is_some_and(|at| now >= at) {
            self.state.collision_restore_at = None;
            report.restore_collision = true;
        }

        if let VehicleCondition::Invulnerable { until } = self.condition {
            if now > until {
                self.condition = VehicleCondition::Healthy;
                report.invulnerability_ended = true;
            }
        }

        if self.is_destroyed() {
            return report;
        }

        let max = self.tuning.max_health;
        if self.state.health < max && now - self.state.last_collision > self.tuning.health_regen_delay {
            self.state.health = (self.state.health + self.tuning.health_regen_rate * dt).min(max);
        }

        if sample.planar_speed() > self.tuning.movement_threshold || !game_active {
            self.state.last_movement = now;
        }

        if game_active {
            report.respawn = if sample.is_upside_down() {
                Some(RespawnCause::Flipped)
            } else if now - self.state.last_movement > self.tuning.respawn_delay {
                Some(RespawnCause::Stalled)
            } else if self.bounds_hit {
                Some(RespawnCause::OutOfBounds)
            } else {
                None
            };
        }
        self.bounds_hit = false;

        report
    }

    /// Full health, a short invulnerability window and no contact response
    /// for `collision_response_delay`. The caller teleports the vehicle.
    pub fn respawn(&mut self, checkpoints: &CheckpointRegistry, now: f32) -> RespawnOrder {
        let t = &self.tuning;
        self.state.health = t.max_health;
        self.state.last_movement = now;
        self.state.collision_restore_at = Some(now + t.collision_response_delay);
        self.condition = VehicleCondition::Invulnerable {
            until: now + t.invulnerability_duration,
        };
        self.bounds_hit = false;

        let position = checkpoints.current() + Vector3::new(0.0, t.respawn_lift, 0.0);
        info!(?position, "vehicle respawned");

        RespawnOrder {
            position,
            rotation: respawn_rotation(),
        }
    }

    /// Fresh vehicle for a restarted session.
    pub fn reset(&mut self, now: f32) {
        self.condition = VehicleCondition::Healthy;
        self.state = HealthState {
            health: self.tuning.max_health,
            last_collision: now,
            last_movement: now,
            collision_restore_at: None,
        };
        self.bounds_hit = false;
    }
}
