// src/physics.rs

use rapier3d::na::UnitQuaternion;
use rapier3d::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, warn};

/// Role of a collider in the level. Every collider inserted through
/// `PhysicsWorld` carries exactly one tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "index", rename_all = "snake_case")]
pub enum BodyTag {
    Ground,
    Checkpoint(usize),
    Finish,
    Bound,
    Crate(usize),
    Block,
    Chassis,
    Wheel(usize),
}

impl BodyTag {
    pub fn is_vehicle(self) -> bool {
        matches!(self, BodyTag::Chassis | BodyTag::Wheel(_))
    }
}

/// One contact that began during the last step and involves the chassis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactEvent {
    pub other: BodyTag,
    pub other_is_trigger: bool,
    /// Closing speed of the two bodies projected on the contact normal.
    /// Always zero for trigger volumes.
    pub impact_velocity: f32,
}

/// Obstacle block dropped by a trigger zone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BlockSpec {
    pub size: [f32; 3],
    pub scale: f32,
    pub mass: f32,
}

impl Default for BlockSpec {
    fn default() -> Self {
        Self {
            size: [2.0, 2.0, 2.0],
            scale: 1.0,
            mass: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BodyPose {
    pub position: [f32; 3],
    pub rotation: [f32; 4], // quaternion, xyzw
}

impl BodyPose {
    pub fn from_isometry(iso: &Isometry<Real>) -> Self {
        let t = iso.translation.vector;
        let q = iso.rotation.coords;
        Self {
            position: [t.x, t.y, t.z],
            rotation: [q.x, q.y, q.z, q.w],
        }
    }
}

// --------------------------------------------------
// contact collection
// --------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct RawContact {
    collider1: ColliderHandle,
    collider2: ColliderHandle,
    sensor: bool,
    impact_velocity: f32,
}

/// Buffers contact starts raised by the pipeline; the world drains it right
/// after each step so nothing is handled mid-step.
#[derive(Default)]
struct ContactCollector {
    started: Mutex<Vec<RawContact>>,
}

impl ContactCollector {
    fn drain(&self) -> Vec<RawContact> {
        match self.started.lock() {
            Ok(mut started) => std::mem::take(&mut *started),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    fn push(&self, contact: RawContact) {
        match self.started.lock() {
            Ok(mut started) => started.push(contact),
            Err(poisoned) => poisoned.into_inner().push(contact),
        }
    }
}

fn closing_speed(
    bodies: &RigidBodySet,
    colliders: &ColliderSet,
    pair: &ContactPair,
) -> f32 {
    let (Some(c1), Some(c2)) = (colliders.get(pair.collider1), colliders.get(pair.collider2)) else {
        return 0.0;
    };

    let Some(manifold) = pair.manifolds.iter().find(|m| !m.points.is_empty()) else {
        return 0.0;
    };

    // world-space normal, pointing from collider1 toward collider2
    let normal = manifold.data.normal;
    let point = c1.position() * manifold.points[0].local_p1;

    let velocity_of = |collider: &Collider| {
        collider
            .parent()
            .and_then(|handle| bodies.get(handle))
            .map(|body| body.velocity_at_point(&point))
            .unwrap_or_else(Vector::zeros)
    };

    let relative = velocity_of(c1) - velocity_of(c2);
    relative.dot(&normal)
}

impl EventHandler for ContactCollector {
    fn handle_collision_event(
        &self,
        bodies: &RigidBodySet,
        colliders: &ColliderSet,
        event: CollisionEvent,
        contact_pair: Option<&ContactPair>,
    ) {
        let CollisionEvent::Started(collider1, collider2, flags) = event else {
            return;
        };

        let sensor = flags.contains(CollisionEventFlags::SENSOR);
        let impact_velocity = match (sensor, contact_pair) {
            (false, Some(pair)) => closing_speed(bodies, colliders, pair),
            _ => 0.0,
        };

        self.push(RawContact {
            collider1,
            collider2,
            sensor,
            impact_velocity,
        });
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
    }
}

// --------------------------------------------------
// world
// --------------------------------------------------

const WORLD_LIMIT: f32 = 1_000.0;

pub struct PhysicsWorld {
    pub gravity: Vector<Real>, // gravity vector
    pub pipeline: PhysicsPipeline, // physics pipeline
    pub island_manager: IslandManager, // manages islands of bodies
    pub broad_phase: DefaultBroadPhase, // broad-phase collision detection
    pub narrow_phase: NarrowPhase, // collision detection
    pub bodies: RigidBodySet, // for rigid bodies
    pub colliders: ColliderSet, // for collision shapes
    pub joints: ImpulseJointSet, // wheel hinges
    pub multibody_joints: MultibodyJointSet, // unused, required by the pipeline
    pub ccd: CCDSolver, // continuous collision detection
    pub query_pipeline: QueryPipeline, // for raycasting
    tags: HashMap<ColliderHandle, BodyTag>, // collider → level role
    crates: Vec<RigidBodyHandle>, // index == BodyTag::Crate(index)
    blocks: Vec<RigidBodyHandle>, // trigger-dropped obstacles
    collector: ContactCollector,
}

impl PhysicsWorld {
    pub fn new(gravity_y: f32) -> Self {
        Self {
            gravity: vector![0.0, gravity_y, 0.0],
            pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            tags: HashMap::new(),
            crates: Vec::new(),
            blocks: Vec::new(),
            collector: ContactCollector::default(),
        }
    }

    /// Big static slab whose top surface sits exactly at y = 0.
    pub fn add_ground(&mut self, half_extent: f32) -> RigidBodyHandle {
        let ground_rb = RigidBodyBuilder::fixed()
            .translation(vector![0.0, -0.1, 0.0])
            .build();
        let handle = self.bodies.insert(ground_rb);

        let collider = ColliderBuilder::cuboid(half_extent, 0.1, half_extent)
            .friction(1.0)
            .restitution(0.0)
            .build();
        self.insert_collider(collider, handle, BodyTag::Ground);

        debug!(
            bodies = self.bodies.len(),
            colliders = self.colliders.len(),
            "ground inserted"
        );
        handle
    }

    /// Static box given by its centre and full size. Sensor volumes report
    /// contacts but never push back.
    pub fn add_static_box(
        &mut self,
        center: [f32; 3],
        size: [f32; 3],
        tag: BodyTag,
        sensor: bool,
    ) -> ColliderHandle {
        let rb = RigidBodyBuilder::fixed()
            .translation(vector![center[0], center[1], center[2]])
            .build();
        let handle = self.bodies.insert(rb);

        let collider = ColliderBuilder::cuboid(size[0] * 0.5, size[1] * 0.5, size[2] * 0.5)
            .sensor(sensor)
            .build();
        self.insert_collider(collider, handle, tag)
    }

    /// Dynamic crate (2 m cube, 1 kg). Returns its crate index.
    pub fn add_crate(&mut self, center: [f32; 3]) -> usize {
        let index = self.crates.len();
        let rb = RigidBodyBuilder::dynamic()
            .translation(vector![center[0], center[1], center[2]])
            .build();
        let handle = self.bodies.insert(rb);

        let collider = ColliderBuilder::cuboid(1.0, 1.0, 1.0)
            .mass(1.0)
            .friction(0.3)
            .restitution(0.4)
            .build();
        self.insert_collider(collider, handle, BodyTag::Crate(index));
        self.crates.push(handle);
        index
    }

    pub fn drop_block(&mut self, spec: &BlockSpec, position: [f32; 3]) -> RigidBodyHandle {
        let rb = RigidBodyBuilder::dynamic()
            .translation(vector![position[0], position[1], position[2]])
            .build();
        let handle = self.bodies.insert(rb);

        let half = spec.scale * 0.5;
        let collider = ColliderBuilder::cuboid(
            spec.size[0] * half,
            spec.size[1] * half,
            spec.size[2] * half,
        )
        .mass(spec.mass)
        .build();
        self.insert_collider(collider, handle, BodyTag::Block);
        self.blocks.push(handle);

        debug!(?position, "block dropped");
        handle
    }

    /// Removes every trigger-dropped block. Returns how many were removed.
    pub fn clear_blocks(&mut self) -> usize {
        let removed = self.blocks.len();
        for handle in std::mem::take(&mut self.blocks) {
            self.remove_body(handle);
        }
        removed
    }

    pub fn remove_body(&mut self, handle: RigidBodyHandle) {
        if let Some(body) = self.bodies.get(handle) {
            for collider in body.colliders() {
                self.tags.remove(collider);
            }
        }
        self.bodies.remove(
            handle,
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.joints,
            &mut self.multibody_joints,
            true,
        );
    }

    pub fn insert_collider(
        &mut self,
        collider: Collider,
        parent: RigidBodyHandle,
        tag: BodyTag,
    ) -> ColliderHandle {
        let handle = self
            .colliders
            .insert_with_parent(collider, parent, &mut self.bodies);
        self.tags.insert(handle, tag);
        handle
    }

    pub fn tag(&self, collider: ColliderHandle) -> Option<BodyTag> {
        self.tags.get(&collider).copied()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn crate_poses(&self) -> Vec<BodyPose> {
        self.poses_of(&self.crates)
    }

    pub fn block_poses(&self) -> Vec<BodyPose> {
        self.poses_of(&self.blocks)
    }

    pub fn pose(&self, handle: RigidBodyHandle) -> Option<BodyPose> {
        self.bodies
            .get(handle)
            .map(|body| BodyPose::from_isometry(body.position()))
    }

    fn poses_of(&self, handles: &[RigidBodyHandle]) -> Vec<BodyPose> {
        handles.iter().filter_map(|&h| self.pose(h)).collect()
    }

    /// Advances the simulation by `dt` and returns the contacts that began
    /// during this step between the chassis and anything else.
    pub fn step(&mut self, dt: Real) -> Vec<ContactEvent> {
        let hooks = ();

        self.pipeline.step(
            &self.gravity,
            &IntegrationParameters {
                dt,
                ..IntegrationParameters::default()
            },
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.joints,
            &mut self.multibody_joints,
            &mut self.ccd,
            Some(&mut self.query_pipeline),
            &hooks,
            &self.collector,
        );

        self.reset_runaway_bodies();

        self.collector
            .drain()
            .into_iter()
            .filter_map(|raw| self.chassis_contact(raw))
            .collect()
    }

    fn chassis_contact(&self, raw: RawContact) -> Option<ContactEvent> {
        let tag1 = self.tag(raw.collider1)?;
        let tag2 = self.tag(raw.collider2)?;

        let (other, other_handle) = match (tag1, tag2) {
            (BodyTag::Chassis, other) => (other, raw.collider2),
            (other, BodyTag::Chassis) => (other, raw.collider1),
            _ => return None,
        };
        if other.is_vehicle() {
            return None;
        }

        let other_is_trigger = raw.sensor
            || self
                .colliders
                .get(other_handle)
                .is_some_and(|c| c.is_sensor());

        Some(ContactEvent {
            other,
            other_is_trigger,
            impact_velocity: if other_is_trigger { 0.0 } else { raw.impact_velocity.abs() },
        })
    }

    // Safety: prevent bodies from exploding to insane coordinates
    fn reset_runaway_bodies(&mut self) {
        for (_, body) in self.bodies.iter_mut() {
            let pos = *body.translation();

            let bad = !pos.x.is_finite()
                || !pos.y.is_finite()
                || !pos.z.is_finite()
                || pos.x.abs() > WORLD_LIMIT
                || pos.y.abs() > WORLD_LIMIT
                || pos.z.abs() > WORLD_LIMIT;

            if bad {
                let safe = vector![0.0, 1.0, 0.0];
                body.set_position(Isometry::from_parts(safe.into(), UnitQuaternion::identity()), true);
                body.set_linvel(Vector::zeros(), true);
                body.set_angvel(Vector::zeros(), true);

                warn!(?pos, "reset runaway body");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dynamic_ball(world: &mut PhysicsWorld, at: [f32; 3], tag: BodyTag) -> RigidBodyHandle {
        let rb = RigidBodyBuilder::dynamic()
            .translation(vector![at[0], at[1], at[2]])
            .build();
        let handle = world.bodies.insert(rb);
        let collider = ColliderBuilder::ball(0.5)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build();
        world.insert_collider(collider, handle, tag);
        handle
    }

    #[test]
    fn sensor_contact_is_reported_as_trigger() {
        let mut world = PhysicsWorld::new(-9.82);
        world.add_ground(50.0);
        world.add_static_box([0.0, 2.0, 0.0], [4.0, 4.0, 4.0], BodyTag::Checkpoint(3), true);
        dynamic_ball(&mut world, [0.0, 6.0, 0.0], BodyTag::Chassis);

        let mut seen = Vec::new();
        for _ in 0..120 {
            seen.extend(world.step(1.0 / 60.0));
        }

        let checkpoint = seen
            .iter()
            .find(|e| e.other == BodyTag::Checkpoint(3))
            .expect("checkpoint contact");
        assert!(checkpoint.other_is_trigger);
        assert_eq!(checkpoint.impact_velocity, 0.0);
    }

    #[test]
    fn falling_onto_ground_reports_impact_speed() {
        let mut world = PhysicsWorld::new(-9.82);
        world.add_ground(50.0);
        // ~2 m drop, so roughly 6 m/s on touchdown
        dynamic_ball(&mut world, [0.0, 2.5, 0.0], BodyTag::Chassis);

        let mut seen = Vec::new();
        for _ in 0..120 {
            seen.extend(world.step(1.0 / 60.0));
        }

        let ground = seen
            .iter()
            .find(|e| e.other == BodyTag::Ground)
            .expect("ground contact");
        assert!(!ground.other_is_trigger);
        assert!(ground.impact_velocity > 4.0, "got {}", ground.impact_velocity);
        assert!(ground.impact_velocity < 9.0, "got {}", ground.impact_velocity);
    }

    #[test]
    fn contacts_without_chassis_are_dropped() {
        let mut world = PhysicsWorld::new(-9.82);
        world.add_ground(50.0);
        world.add_crate([0.0, 3.0, 0.0]);

        for _ in 0..120 {
            assert!(world.step(1.0 / 60.0).is_empty());
        }
    }

    #[test]
    fn clear_blocks_removes_bodies_and_tags() {
        let mut world = PhysicsWorld::new(-9.82);
        let spec = BlockSpec::default();
        world.drop_block(&spec, [0.0, 5.0, 0.0]);
        world.drop_block(&spec, [4.0, 5.0, 0.0]);
        let bodies_before = world.bodies.len();

        assert_eq!(world.clear_blocks(), 2);
        assert_eq!(world.block_count(), 0);
        assert_eq!(world.bodies.len(), bodies_before - 2);
        assert!(world.tags.values().all(|t| *t != BodyTag::Block));
    }

    #[test]
    fn runaway_body_is_pulled_back() {
        let mut world = PhysicsWorld::new(-9.82);
        let handle = dynamic_ball(&mut world, [0.0, 5_000.0, 0.0], BodyTag::Block);

        world.step(1.0 / 60.0);

        let body = &world.bodies[handle];
        assert!(body.translation().y.abs() < WORLD_LIMIT);
        assert_eq!(*body.linvel(), Vector::zeros());
    }
}
