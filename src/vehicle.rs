// src/vehicle.rs

use crate::controls::{WheelActuator, FRONT_WHEELS};
use crate::error::SetupError;
use crate::physics::{BodyPose, BodyTag, PhysicsWorld};
use crate::tuning::ChassisTuning;
use rapier3d::na::{UnitQuaternion, Vector3};
use rapier3d::prelude::*;
use serde::Serialize;
use tracing::debug;

pub const WHEEL_COUNT: usize = 4;

/// Per-tick readout of the chassis body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChassisSample {
    pub position: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub linvel: Vector3<f32>,
    pub angvel: Vector3<f32>,
}

/// Position on the ground plane (world x, world z).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlanarPoint {
    pub x: f32,
    pub z: f32,
}

impl PlanarPoint {
    pub fn new(x: f32, z: f32) -> Self {
        Self { x, z }
    }

    pub fn distance(self, other: PlanarPoint) -> f32 {
        ((self.x - other.x).powi(2) + (self.z - other.z).powi(2)).sqrt()
    }
}

impl ChassisSample {
    pub fn at_rest(position: Vector3<f32>, rotation: UnitQuaternion<f32>) -> Self {
        Self {
            position,
            rotation,
            linvel: Vector3::zeros(),
            angvel: Vector3::zeros(),
        }
    }

    pub fn planar_speed(&self) -> f32 {
        (self.linvel.x * self.linvel.x + self.linvel.z * self.linvel.z).sqrt()
    }

    pub fn planar_position(&self) -> PlanarPoint {
        PlanarPoint::new(self.position.x, self.position.z)
    }

    /// Chassis up axis in world space.
    pub fn up(&self) -> Vector3<f32> {
        self.rotation * Vector3::y()
    }

    /// Tilted more than 90° away from world up.
    pub fn is_upside_down(&self) -> bool {
        self.up().dot(&Vector3::y()) < 0.0
    }

    /// Linear velocity expressed in the chassis frame.
    pub fn local_velocity(&self) -> Vector3<f32> {
        self.rotation.inverse() * self.linvel
    }
}

#[derive(Debug, Clone, Copy)]
struct WheelMount {
    body: RigidBodyHandle,
    collider: ColliderHandle,
    joint: ImpulseJointHandle,
    offset: Vector3<f32>, // in chassis local space
}

/// Chassis plus four sphere wheels hinged on revolute joints. Wheels 0 and 1
/// steer, 2 and 3 are driven.
pub struct RigidVehicle {
    chassis: RigidBodyHandle,
    chassis_collider: ColliderHandle,
    wheels: [WheelMount; WHEEL_COUNT],
    axle: UnitVector<f32>, // wheel axle in both chassis and wheel space
    wheel_forces: [f32; WHEEL_COUNT],
    steering: [f32; 2],
    applied_steering: [f32; 2],
}

fn validate(tuning: &ChassisTuning) -> Result<UnitVector<f32>, SetupError> {
    if tuning.wheel_offsets.len() != WHEEL_COUNT {
        return Err(SetupError::WheelCount {
            found: tuning.wheel_offsets.len(),
        });
    }
    if !(tuning.mass > 0.0) {
        return Err(SetupError::NonPositiveMass {
            part: "chassis",
            mass: tuning.mass,
        });
    }
    if !(tuning.wheel_mass > 0.0) {
        return Err(SetupError::NonPositiveMass {
            part: "wheel",
            mass: tuning.wheel_mass,
        });
    }
    if tuning.half_extents.iter().any(|e| !(*e > 0.0)) {
        return Err(SetupError::NonPositiveExtent { part: "chassis" });
    }
    if !(tuning.wheel_radius > 0.0) {
        return Err(SetupError::NonPositiveExtent { part: "wheel" });
    }

    for first in 0..WHEEL_COUNT {
        for second in first + 1..WHEEL_COUNT {
            if tuning.wheel_offsets[first] == tuning.wheel_offsets[second] {
                return Err(SetupError::DuplicateWheelOffset { first, second });
            }
        }
    }

    let [x, y, z] = tuning.wheel_axis;
    UnitVector::try_new(vector![x, y, z], 1.0e-6).ok_or(SetupError::DegenerateWheelAxis)
}

impl RigidVehicle {
    pub fn build(
        world: &mut PhysicsWorld,
        tuning: &ChassisTuning,
        position: Vector3<f32>,
        rotation: UnitQuaternion<f32>,
    ) -> Result<Self, SetupError> {
        let axle = validate(tuning)?;
        let pose = Isometry::from_parts(position.into(), rotation);

        // === chassis ===
        let chassis = world.bodies.insert(RigidBodyBuilder::dynamic().position(pose).build());
        let [hx, hy, hz] = tuning.half_extents;
        let chassis_collider = world.insert_collider(
            ColliderBuilder::cuboid(hx, hy, hz)
                .mass(tuning.mass)
                .friction(tuning.friction)
                .restitution(tuning.restitution)
                .active_events(ActiveEvents::COLLISION_EVENTS)
                .build(),
            chassis,
            BodyTag::Chassis,
        );

        // === wheels ===
        let mut mounts = Vec::with_capacity(WHEEL_COUNT);
        for (index, raw) in tuning.wheel_offsets.iter().enumerate() {
            let offset = Vector3::new(raw[0], raw[1], raw[2]);
            let wheel_pose = Isometry::from_parts((position + rotation * offset).into(), rotation);

            let body = world.bodies.insert(
                RigidBodyBuilder::dynamic()
                    .position(wheel_pose)
                    .angular_damping(tuning.wheel_angular_damping)
                    .build(),
            );
            let collider = world.insert_collider(
                ColliderBuilder::ball(tuning.wheel_radius)
                    .mass(tuning.wheel_mass)
                    .friction(tuning.wheel_friction)
                    .build(),
                body,
                BodyTag::Wheel(index),
            );

            let hinge = RevoluteJointBuilder::new(axle)
                .local_anchor1(offset.into())
                .local_anchor2(point![0.0, 0.0, 0.0])
                .contacts_enabled(false);
            let joint = world.joints.insert(chassis, body, hinge, true);

            mounts.push(WheelMount {
                body,
                collider,
                joint,
                offset,
            });
        }

        let wheels: [WheelMount; WHEEL_COUNT] = mounts
            .try_into()
            .map_err(|m: Vec<WheelMount>| SetupError::WheelCount { found: m.len() })?;

        debug!(?position, "vehicle built");

        Ok(Self {
            chassis,
            chassis_collider,
            wheels,
            axle,
            wheel_forces: [0.0; WHEEL_COUNT],
            steering: [0.0; 2],
            applied_steering: [0.0; 2],
        })
    }

    pub fn wheel_forces(&self) -> [f32; WHEEL_COUNT] {
        self.wheel_forces
    }

    pub fn steering(&self) -> [f32; 2] {
        self.steering
    }

    /// Pushes the stored drive and steering values into the engine. Called
    /// once per tick, right before the physics step.
    pub fn apply_actuation(&mut self, world: &mut PhysicsWorld) {
        for (slot, wheel) in FRONT_WHEELS.into_iter().enumerate() {
            let angle = self.steering[slot];
            if angle == self.applied_steering[slot] {
                continue;
            }
            let turned = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), angle) * self.axle;
            if let Some(joint) = world.joints.get_mut(self.wheels[wheel].joint) {
                joint.data.set_local_axis1(turned);
                self.applied_steering[slot] = angle;
            }
        }

        for (mount, force) in self.wheels.iter().zip(self.wheel_forces) {
            let Some(body) = world.bodies.get_mut(mount.body) else {
                continue;
            };
            body.reset_torques(true);
            if force != 0.0 {
                let axle_world = body.rotation() * self.axle.into_inner();
                body.add_torque(axle_world * force, true);
            }
        }
    }

    pub fn sample(&self, world: &PhysicsWorld) -> ChassisSample {
        match world.bodies.get(self.chassis) {
            Some(body) => ChassisSample {
                position: *body.translation(),
                rotation: *body.rotation(),
                linvel: *body.linvel(),
                angvel: *body.angvel(),
            },
            None => ChassisSample::at_rest(Vector3::zeros(), UnitQuaternion::identity()),
        }
    }

    /// Moves all five bodies to a new pose and kills every velocity and
    /// accumulated force/torque. Stored drive values are cleared too.
    pub fn teleport(
        &mut self,
        world: &mut PhysicsWorld,
        position: Vector3<f32>,
        rotation: UnitQuaternion<f32>,
    ) {
        let mut targets = vec![(self.chassis, position)];
        targets.extend(
            self.wheels
                .iter()
                .map(|mount| (mount.body, position + rotation * mount.offset)),
        );

        for (handle, translation) in targets {
            if let Some(body) = world.bodies.get_mut(handle) {
                body.set_position(Isometry::from_parts(translation.into(), rotation), true);
                body.set_linvel(Vector3::zeros(), true);
                body.set_angvel(Vector3::zeros(), true);
                body.reset_forces(true);
                body.reset_torques(true);
            }
        }

        self.wheel_forces = [0.0; WHEEL_COUNT];
    }

    /// Contact events keep flowing while response is off.
    pub fn set_collision_response(&self, world: &mut PhysicsWorld, enabled: bool) {
        let groups = if enabled {
            InteractionGroups::all()
        } else {
            InteractionGroups::none()
        };

        let handles = std::iter::once(self.chassis_collider)
            .chain(self.wheels.iter().map(|mount| mount.collider));
        for handle in handles {
            if let Some(collider) = world.colliders.get_mut(handle) {
                collider.set_solver_groups(groups);
            }
        }
    }

    pub fn chassis_pose(&self, world: &PhysicsWorld) -> Option<BodyPose> {
        world.pose(self.chassis)
    }

    pub fn wheel_poses(&self, world: &PhysicsWorld) -> Vec<BodyPose> {
        self.wheels
            .iter()
            .filter_map(|mount| world.pose(mount.body))
            .collect()
    }

    /// All body velocities, chassis first. Used to check a clean respawn.
    pub fn velocities(&self, world: &PhysicsWorld) -> Vec<(Vector3<f32>, Vector3<f32>)> {
        std::iter::once(self.chassis)
            .chain(self.wheels.iter().map(|mount| mount.body))
            .filter_map(|handle| world.bodies.get(handle))
            .map(|body| (*body.linvel(), *body.angvel()))
            .collect()
    }
}

impl WheelActuator for RigidVehicle {
    fn set_wheel_force(&mut self, force: f32, wheel: usize) {
        debug_assert!(wheel < WHEEL_COUNT, "wheel index {wheel} out of range");
        if let Some(slot) = self.wheel_forces.get_mut(wheel) {
            *slot = force;
        }
    }

    fn set_steering_value(&mut self, angle: f32, wheel: usize) {
        debug_assert!(wheel < 2, "wheel {wheel} does not steer");
        if let Some(slot) = self.steering.get_mut(wheel) {
            *slot = angle;
        }
    }
}
