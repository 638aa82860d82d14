// src/session.rs

use crate::camera::{CameraController, CameraMode, CameraOutput};
use crate::checkpoint::CheckpointRegistry;
use crate::config::{FIXED_DT, MAX_STEPS_PER_FRAME};
use crate::controls::{Action, ControlSystem, InputState, KeyBindings};
use crate::crates::CrateDamageEmitter;
use crate::damage::{DamageOutcome, DamageRespawnController, RespawnCause};
use crate::error::SetupError;
use crate::level::LevelLayout;
use crate::physics::{BodyTag, ContactEvent, PhysicsWorld};
use crate::pickups::BoostPickups;
use crate::state::Snapshot;
use crate::timestep::FixedTimestep;
use crate::triggers::{TriggerAction, TriggerDispatch, TriggerZoneSystem};
use crate::tuning::GameTuning;
use crate::vehicle::{ChassisSample, RigidVehicle};
use rapier3d::na::UnitQuaternion;
use serde::Serialize;
use tracing::{debug, info};

// Offset of the debug block drop relative to the chassis (x, z).
const DEBUG_DROP_OFFSET: (f32, f32) = (-20.0, 10.0);

// Debug ring of blocks centred on the chassis; rows run along z, columns along x.
const BLOCK_PATTERN: [[bool; 3]; 3] = [
    [true, true, true],
    [true, false, true],
    [true, true, true],
];
const BLOCK_PATTERN_SPACING: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOverReason {
    Destroyed,
    TimeUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionStatus {
    /// Level loaded, waiting for the first driving key.
    Ready,
    Running,
    Paused,
    Over { reason: GameOverReason },
    Won { completion_secs: u32 },
}

impl SessionStatus {
    pub fn is_finished(self) -> bool {
        matches!(self, SessionStatus::Over { .. } | SessionStatus::Won { .. })
    }
}

/// Discrete things that happened during a frame, for the client's HUD,
/// sounds and cosmetic effects.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "signal", rename_all = "snake_case")]
pub enum GameSignal {
    Started,
    Paused,
    Resumed,
    Restarted,
    Damaged { amount: f32, health: f32 },
    CrateHit { crate_index: usize, amount: f32 },
    CheckpointReached { index: usize, position: [f32; 3] },
    Respawned { cause: RespawnCause, position: [f32; 3] },
    InvulnerabilityEnded,
    BoostCollected { index: usize },
    BlocksDropped { positions: Vec<[f32; 3]> },
    TriggersReset { blocks_cleared: usize },
    BlocksCleared { count: usize },
    CameraChanged { mode: CameraMode },
    HeadlightsToggled { on: bool },
    GameOver { reason: GameOverReason },
    GameWon { completion_secs: u32 },
}

/// One player's run: the physics world, the car and every controller,
/// advanced in fixed ticks.
pub struct GameSession {
    tuning: GameTuning,
    layout: LevelLayout,
    world: PhysicsWorld,
    vehicle: RigidVehicle,
    controls: ControlSystem,
    camera: CameraController,
    damage: DamageRespawnController,
    checkpoints: CheckpointRegistry,
    triggers: TriggerZoneSystem,
    pickups: BoostPickups,
    crates: CrateDamageEmitter,
    bindings: KeyBindings,
    timestep: FixedTimestep,
    status: SessionStatus,
    tick: u64,
    race_ticks: u32, // ticks since the last whole race second
    time_left: u32,
    elapsed_secs: u32,
    headlights: bool,
    last_sample: ChassisSample,
    camera_output: CameraOutput,
    signals: Vec<GameSignal>,
}

impl GameSession {
    pub fn new(tuning: GameTuning, layout: LevelLayout) -> Result<Self, SetupError> {
        let mut world = PhysicsWorld::new(tuning.race.gravity);
        let mut triggers = TriggerZoneSystem::new();
        let mut pickups = BoostPickups::new(tuning.race.pickup_radius);
        let checkpoints = layout.populate(&mut world, &mut triggers, &mut pickups);

        let start = layout.car_start();
        let vehicle = RigidVehicle::build(
            &mut world,
            &tuning.chassis,
            start,
            UnitQuaternion::identity(),
        )?;
        let last_sample = vehicle.sample(&world);

        let camera = CameraController::new(tuning.camera.clone());
        let camera_output = camera.view(&last_sample);

        Ok(Self {
            controls: ControlSystem::new(tuning.vehicle.clone()),
            damage: DamageRespawnController::new(tuning.vehicle.clone()),
            crates: CrateDamageEmitter::new(tuning.race.crate_damage, tuning.race.crate_cooldown),
            bindings: KeyBindings::default(),
            timestep: FixedTimestep::new(f64::from(FIXED_DT), MAX_STEPS_PER_FRAME),
            status: SessionStatus::Ready,
            tick: 0,
            race_ticks: 0,
            time_left: tuning.race.race_duration_secs,
            elapsed_secs: 0,
            headlights: false,
            signals: Vec::new(),
            tuning,
            layout,
            world,
            vehicle,
            camera,
            checkpoints,
            triggers,
            pickups,
            last_sample,
            camera_output,
        })
    }

    pub fn level1(tuning: GameTuning) -> Result<Self, SetupError> {
        Self::new(tuning, LevelLayout::level1())
    }

    // --------------------------------------------------
    // accessors
    // --------------------------------------------------

    /// Simulation clock in seconds.
    pub fn now(&self) -> f32 {
        self.tick as f32 * FIXED_DT
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    pub fn sample(&self) -> &ChassisSample {
        &self.last_sample
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    pub fn vehicle(&self) -> &RigidVehicle {
        &self.vehicle
    }

    pub fn controls(&self) -> &ControlSystem {
        &self.controls
    }

    pub fn damage(&self) -> &DamageRespawnController {
        &self.damage
    }

    pub fn checkpoints(&self) -> &CheckpointRegistry {
        &self.checkpoints
    }

    pub fn triggers(&self) -> &TriggerZoneSystem {
        &self.triggers
    }

    pub fn drain_signals(&mut self) -> Vec<GameSignal> {
        std::mem::take(&mut self.signals)
    }

    // --------------------------------------------------
    // input & lifecycle
    // --------------------------------------------------

    /// Raw key event from the client. Unknown keys are ignored.
    pub fn handle_key(&mut self, key: &str, pressed: bool) {
        let Some(action) = self.bindings.lookup(key) else {
            debug!(key, "unbound key");
            return;
        };

        if action.is_held() {
            if self.status.is_finished() {
                return;
            }
            self.controls.input_mut().set(action, pressed);
            if pressed && action.starts_race() && self.status == SessionStatus::Ready {
                self.start();
            }
            return;
        }

        if pressed {
            self.trigger_action(action);
        }
    }

    fn trigger_action(&mut self, action: Action) {
        let now = self.now();
        match action {
            Action::CameraCycle => {
                let mode = self.camera.cycle();
                self.camera_output = self.camera.view(&self.last_sample);
                self.signals.push(GameSignal::CameraChanged { mode });
            }
            Action::Pause => self.toggle_pause(),
            Action::Headlights => {
                self.headlights = !self.headlights;
                self.signals.push(GameSignal::HeadlightsToggled { on: self.headlights });
            }
            Action::Boost => self.controls.activate_boost(now),
            Action::ResetTriggers => {
                self.triggers.reset();
                let blocks_cleared = self.world.clear_blocks();
                self.signals.push(GameSignal::TriggersReset { blocks_cleared });
            }
            Action::DropBlock => {
                let planar = self.last_sample.planar_position();
                let (dx, dz) = DEBUG_DROP_OFFSET;
                let position = [planar.x + dx, self.tuning.race.block_drop_height, planar.z + dz];
                self.world.drop_block(&Default::default(), position);
                self.signals.push(GameSignal::BlocksDropped {
                    positions: vec![position],
                });
            }
            Action::DropBlockPattern => {
                let planar = self.last_sample.planar_position();
                let height = self.tuning.race.block_drop_height;
                let mut positions = Vec::new();
                for (row, cells) in BLOCK_PATTERN.iter().enumerate() {
                    for (col, &filled) in cells.iter().enumerate() {
                        if !filled {
                            continue;
                        }
                        let x = planar.x + (col as f32 - 1.0) * BLOCK_PATTERN_SPACING;
                        let z = planar.z + (row as f32 - 1.0) * BLOCK_PATTERN_SPACING;
                        positions.push([x, height, z]);
                    }
                }
                for &position in &positions {
                    self.world.drop_block(&Default::default(), position);
                }
                self.signals.push(GameSignal::BlocksDropped { positions });
            }
            Action::ClearBlocks => {
                let count = self.world.clear_blocks();
                self.signals.push(GameSignal::BlocksCleared { count });
            }
            Action::Forward | Action::Back | Action::Left | Action::Right => {}
        }
    }

    pub fn start(&mut self) {
        if self.status != SessionStatus::Ready {
            return;
        }
        let now = self.now();
        self.status = SessionStatus::Running;
        self.time_left = self.tuning.race.race_duration_secs;
        self.elapsed_secs = 0;
        self.race_ticks = 0;
        self.damage.reset(now);
        self.signals.push(GameSignal::Started);
        info!(time_left = self.time_left, "race started");
    }

    pub fn toggle_pause(&mut self) {
        match self.status {
            SessionStatus::Running => {
                self.status = SessionStatus::Paused;
                self.signals.push(GameSignal::Paused);
            }
            SessionStatus::Paused => {
                self.status = SessionStatus::Running;
                self.signals.push(GameSignal::Resumed);
            }
            _ => {}
        }
    }

    /// Puts the car back on the start line and re-arms the level.
    pub fn restart(&mut self) {
        let now = self.now();
        self.vehicle
            .teleport(&mut self.world, self.layout.car_start(), UnitQuaternion::identity());
        self.vehicle.set_collision_response(&mut self.world, true);
        self.controls.reset();
        self.damage.reset(now);
        self.checkpoints.reset();
        self.triggers.reset();
        self.world.clear_blocks();
        self.pickups.reset();
        self.crates.reset();
        self.timestep.reset();

        self.status = SessionStatus::Ready;
        self.time_left = self.tuning.race.race_duration_secs;
        self.elapsed_secs = 0;
        self.race_ticks = 0;
        self.last_sample = self.vehicle.sample(&self.world);
        self.camera_output = self.camera.view(&self.last_sample);
        self.signals.push(GameSignal::Restarted);
        info!("session restarted");
    }

    // --------------------------------------------------
    // simulation
    // --------------------------------------------------

    /// One rendered frame at wall time `now_secs`: runs the fixed steps owed.
    /// Returns the number of steps taken.
    pub fn frame(&mut self, now_secs: f64) -> u32 {
        if self.status == SessionStatus::Paused {
            self.timestep.hold(now_secs);
            return 0;
        }

        let steps = self.timestep.advance(now_secs);
        for _ in 0..steps {
            self.step();
        }
        steps
    }

    /// One fixed 1/60 s tick.
    pub fn step(&mut self) {
        let now = self.now();
        let running = self.status == SessionStatus::Running;

        self.controls
            .update(&mut self.vehicle, self.last_sample.planar_speed(), now);
        self.vehicle.apply_actuation(&mut self.world);

        let contacts = self.world.step(FIXED_DT);
        self.last_sample = self.vehicle.sample(&self.world);
        self.camera_output = self.camera.update(&self.last_sample);

        self.handle_contacts(&contacts, now);
        self.tick_damage(now, running);
        self.check_triggers();

        if let Some(index) = self.pickups.collect_near(self.last_sample.position) {
            self.controls.activate_boost(now);
            self.signals.push(GameSignal::BoostCollected { index });
        }

        if self.status == SessionStatus::Running {
            self.advance_race_clock();
        }

        self.tick += 1;
    }

    fn handle_contacts(&mut self, contacts: &[ContactEvent], now: f32) {
        if contacts.is_empty() || self.status.is_finished() {
            return;
        }

        // damage first
        for event in contacts {
            let outcome = self.damage.handle_contact(event, now);
            self.on_damage(outcome);
        }

        // checkpoint latch
        for event in contacts {
            if let BodyTag::Checkpoint(index) = event.other {
                if self.checkpoints.reach(index, now) {
                    let c = self.checkpoints.current();
                    self.signals.push(GameSignal::CheckpointReached {
                        index,
                        position: [c.x, c.y, c.z],
                    });
                    info!(index, "checkpoint reached");
                }
            }
        }

        // crates, finish line, bounds
        for event in contacts {
            match event.other {
                BodyTag::Crate(_) => {
                    if let Some(hit) = self.crates.on_contact(event, now) {
                        self.signals.push(GameSignal::CrateHit {
                            crate_index: hit.crate_index,
                            amount: hit.amount,
                        });
                        let outcome = self.damage.apply_damage(hit.amount, now);
                        self.on_damage(outcome);
                    }
                }
                BodyTag::Finish => self.win(),
                BodyTag::Bound => self.damage.request_bounds_respawn(),
                _ => {}
            }
        }
    }

    fn on_damage(&mut self, outcome: DamageOutcome) {
        match outcome {
            DamageOutcome::Damaged { amount, health } => {
                self.signals.push(GameSignal::Damaged { amount, health });
            }
            DamageOutcome::Destroyed { amount } => {
                self.signals.push(GameSignal::Damaged { amount, health: 0.0 });
                self.end(SessionStatus::Over {
                    reason: GameOverReason::Destroyed,
                });
            }
            DamageOutcome::Ignored | DamageOutcome::Absorbed => {}
        }
    }

    fn tick_damage(&mut self, now: f32, running: bool) {
        let report = self.damage.tick(&self.last_sample, now, FIXED_DT, running);

        if report.restore_collision {
            self.vehicle.set_collision_response(&mut self.world, true);
        }
        if report.invulnerability_ended {
            self.signals.push(GameSignal::InvulnerabilityEnded);
        }
        if let Some(cause) = report.respawn {
            self.respawn(cause, now);
        }
    }

    fn respawn(&mut self, cause: RespawnCause, now: f32) {
        let order = self.damage.respawn(&self.checkpoints, now);
        self.vehicle
            .teleport(&mut self.world, order.position, order.rotation);
        self.vehicle.set_collision_response(&mut self.world, false);
        self.last_sample = self.vehicle.sample(&self.world);

        let p = order.position;
        self.signals.push(GameSignal::Respawned {
            cause,
            position: [p.x, p.y, p.z],
        });
    }

    fn check_triggers(&mut self) {
        let mut dispatched: Vec<TriggerDispatch> = Vec::new();
        self.triggers
            .check_triggers(self.last_sample.planar_position(), &mut dispatched);

        let mut dropped = Vec::new();
        for dispatch in dispatched {
            match dispatch.action {
                TriggerAction::DropBlocks(spec) => {
                    let position = [
                        dispatch.position.x,
                        self.tuning.race.block_drop_height,
                        dispatch.position.z,
                    ];
                    self.world.drop_block(&spec, position);
                    dropped.push(position);
                }
                TriggerAction::Finish => self.win(),
            }
        }

        if !dropped.is_empty() {
            self.signals.push(GameSignal::BlocksDropped { positions: dropped });
        }
    }

    fn advance_race_clock(&mut self) {
        self.race_ticks += 1;
        if self.race_ticks < 60 {
            return;
        }
        self.race_ticks = 0;
        self.time_left = self.time_left.saturating_sub(1);
        self.elapsed_secs += 1;

        if self.time_left == 0 {
            self.end(SessionStatus::Over {
                reason: GameOverReason::TimeUp,
            });
        }
    }

    fn win(&mut self) {
        if self.status != SessionStatus::Running {
            return;
        }
        self.end(SessionStatus::Won {
            completion_secs: self.elapsed_secs,
        });
    }

    fn end(&mut self, status: SessionStatus) {
        if self.status.is_finished() {
            return;
        }
        self.status = status;
        *self.controls.input_mut() = InputState::default();

        match status {
            SessionStatus::Over { reason } => {
                self.signals.push(GameSignal::GameOver { reason });
                info!(?reason, "game over");
            }
            SessionStatus::Won { completion_secs } => {
                self.signals.push(GameSignal::GameWon { completion_secs });
                info!(completion_secs, "race won");
            }
            _ => {}
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        let now = self.now();
        let current = self.checkpoints.current();

        Snapshot {
            tick: self.tick,
            status: self.status,
            chassis: self.vehicle.chassis_pose(&self.world),
            wheels: self.vehicle.wheel_poses(&self.world),
            planar_position: self.last_sample.planar_position(),
            speed_kmh: self.last_sample.planar_speed() * 3.6,
            health: self.damage.health(),
            max_health: self.damage.max_health(),
            condition: self.damage.condition(),
            time_left: self.time_left,
            camera_mode: self.camera.mode(),
            camera: self.camera_output,
            controls: *self.controls.state(),
            boost_active: self.controls.boost_active(now),
            headlights: self.headlights,
            current_checkpoint: [current.x, current.y, current.z],
            highlighted_checkpoints: self
                .checkpoints
                .checkpoints()
                .iter()
                .enumerate()
                .filter(|(_, c)| c.highlighted(now))
                .map(|(i, _)| i)
                .collect(),
            crates: self.world.crate_poses(),
            blocks: self.world.block_poses(),
            boosts: self.pickups.remaining().map(|p| p.position).collect(),
        }
    }
}
