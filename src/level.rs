// src/level.rs

use crate::checkpoint::CheckpointRegistry;
use crate::physics::{BlockSpec, BodyTag, PhysicsWorld};
use crate::pickups::BoostPickups;
use crate::triggers::{TriggerAction, TriggerZoneSystem};
use crate::vehicle::PlanarPoint;
use rapier3d::na::Vector3;
use tracing::info;

/// Axis-aligned box given by centre and full size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Volume {
    pub center: [f32; 3],
    pub size: [f32; 3],
}

impl Volume {
    pub const fn new(center: [f32; 3], size: [f32; 3]) -> Self {
        Self { center, size }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TriggerSpec {
    pub position: PlanarPoint,
    pub radius: f32,
    pub action: TriggerAction,
    pub drops: Option<Vec<PlanarPoint>>,
}

/// Static description of a track: everything placed before the loop starts.
#[derive(Debug, Clone)]
pub struct LevelLayout {
    pub name: &'static str,
    pub ground_half_extent: f32,
    pub car_start: [f32; 3],
    pub initial_checkpoint: [f32; 3],
    pub checkpoints: Vec<Volume>,
    pub finish: Volume,
    pub bounds: Vec<Volume>,
    pub crates: Vec<[f32; 3]>,
    pub boosts: Vec<[f32; 3]>,
    pub triggers: Vec<TriggerSpec>,
}

fn drop_zone(x: f32, z: f32, drops: [(f32, f32); 3]) -> TriggerSpec {
    TriggerSpec {
        position: PlanarPoint::new(x, z),
        radius: 2.0,
        action: TriggerAction::DropBlocks(BlockSpec::default()),
        drops: Some(drops.iter().map(|&(x, z)| PlanarPoint::new(x, z)).collect()),
    }
}

impl LevelLayout {
    pub fn level1() -> Self {
        Self {
            name: "lvl1",
            ground_half_extent: 500.0,
            car_start: [-20.0, 1.0, -3.0],
            initial_checkpoint: [0.0, 2.0, -10.0],
            checkpoints: vec![
                Volume::new([-10.0, 2.0, -3.0], [2.0, 20.0, 40.0]),
                Volume::new([122.0, 2.0, 74.0], [2.0, 20.0, 40.0]),
                Volume::new([336.0, 2.0, -53.0], [40.0, 20.0, 2.0]),
            ],
            finish: Volume::new([70.0, 2.0, -200.0], [2.0, 50.0, 80.0]),
            bounds: vec![Volume::new([230.0, 2.0, 65.0], [6.0, 6.0, 10.0])],
            crates: vec![
                [0.0, 2.0, 2.0],
                [280.0, 2.0, -90.0],
                [260.0, 2.0, -80.0],
                [280.0, 2.0, -100.0],
                [260.0, 2.0, -110.0],
                [280.0, 2.0, -85.0],
                [102.0, 2.0, -211.0],
                [80.0, 2.0, -192.0],
                [198.0, 2.0, -109.0],
                [96.0, 2.0, 20.0],
                [200.0, 13.0, 92.0],
                [285.0, 2.0, 94.0],
                [359.0, 2.0, 45.0],
                [356.0, 2.0, -9.0],
                [322.0, 2.0, -56.0],
                [150.0, 1.0, -190.0],
            ],
            boosts: vec![
                [210.0, 15.0, 80.0],
                [220.0, 2.0, -120.0],
                [220.0, 2.0, -200.0],
                [290.0, 2.0, -200.0],
                [300.0, 2.0, -80.0],
                [320.0, 2.0, -70.0],
                [20.0, 2.0, 10.0],
            ],
            triggers: vec![
                drop_zone(110.0, 38.0, [(100.0, 30.0), (90.0, 15.0), (110.0, 20.0)]),
                drop_zone(290.0, 82.0, [(330.0, 80.0), (340.0, 90.0), (350.0, 70.0)]),
                drop_zone(345.0, -60.0, [(315.0, -90.0), (335.0, -100.0), (325.0, -120.0)]),
            ],
        }
    }

    pub fn car_start(&self) -> Vector3<f32> {
        let [x, y, z] = self.car_start;
        Vector3::new(x, y, z)
    }

    /// Inserts the static level into the world and registers checkpoints,
    /// trigger zones and pickups with their owners.
    pub fn populate(
        &self,
        world: &mut PhysicsWorld,
        triggers: &mut TriggerZoneSystem,
        pickups: &mut BoostPickups,
    ) -> CheckpointRegistry {
        world.add_ground(self.ground_half_extent);

        let [x, y, z] = self.initial_checkpoint;
        let mut checkpoints = CheckpointRegistry::new(Vector3::new(x, y, z));
        for volume in &self.checkpoints {
            let index = checkpoints.add(volume.center, volume.size);
            world.add_static_box(volume.center, volume.size, BodyTag::Checkpoint(index), true);
        }

        world.add_static_box(self.finish.center, self.finish.size, BodyTag::Finish, true);
        for volume in &self.bounds {
            world.add_static_box(volume.center, volume.size, BodyTag::Bound, true);
        }

        for &position in &self.crates {
            world.add_crate(position);
        }
        for &position in &self.boosts {
            pickups.add(position);
        }
        for spec in &self.triggers {
            triggers.add_trigger(spec.position, spec.radius, spec.action, spec.drops.clone());
        }

        info!(
            level = self.name,
            checkpoints = self.checkpoints.len(),
            crates = self.crates.len(),
            boosts = self.boosts.len(),
            triggers = self.triggers.len(),
            "level loaded"
        );
        checkpoints
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level1_populates_world_and_registries() {
        let layout = LevelLayout::level1();
        let mut world = PhysicsWorld::new(-9.82);
        let mut triggers = TriggerZoneSystem::new();
        let mut pickups = BoostPickups::new(2.0);

        let checkpoints = layout.populate(&mut world, &mut triggers, &mut pickups);

        assert_eq!(checkpoints.checkpoints().len(), 3);
        assert_eq!(checkpoints.current(), Vector3::new(0.0, 2.0, -10.0));
        assert_eq!(triggers.zones().len(), 3);
        assert!(triggers.zones().iter().all(|z| z.drop_positions.len() == 3));
        assert_eq!(pickups.remaining().count(), 7);
        assert_eq!(world.crate_poses().len(), 16);
        // ground + 3 checkpoints + finish + bound + 16 crates
        assert_eq!(world.bodies.len(), 22);
    }
}
