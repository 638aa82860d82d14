use rapier3d::na::Vector3;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoostPickup {
    pub position: [f32; 3],
    pub collected: bool,
}

/// Boost items lying on the track. Collected by proximity, at most one per
/// tick, and restored on restart.
#[derive(Debug, Clone, Default)]
pub struct BoostPickups {
    pickups: Vec<BoostPickup>,
    radius: f32,
}

impl BoostPickups {
    pub fn new(radius: f32) -> Self {
        Self {
            pickups: Vec::new(),
            radius,
        }
    }

    pub fn add(&mut self, position: [f32; 3]) {
        self.pickups.push(BoostPickup {
            position,
            collected: false,
        });
    }

    /// Collects the first pickup within reach of `chassis`, if any.
    pub fn collect_near(&mut self, chassis: Vector3<f32>) -> Option<usize> {
        let radius = self.radius;
        let (index, pickup) = self.pickups.iter_mut().enumerate().find(|(_, p)| {
            let [x, y, z] = p.position;
            !p.collected && (Vector3::new(x, y, z) - chassis).norm() < radius
        })?;
        pickup.collected = true;
        Some(index)
    }

    pub fn remaining(&self) -> impl Iterator<Item = &BoostPickup> {
        self.pickups.iter().filter(|p| !p.collected)
    }

    pub fn reset(&mut self) {
        for pickup in &mut self.pickups {
            pickup.collected = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pickup_is_consumed_on_first_touch() {
        let mut pickups = BoostPickups::new(2.0);
        pickups.add([220.0, 2.0, -120.0]);

        assert_eq!(pickups.collect_near(Vector3::new(219.0, 1.5, -120.5)), Some(0));
        assert_eq!(pickups.collect_near(Vector3::new(219.0, 1.5, -120.5)), None);
        assert_eq!(pickups.remaining().count(), 0);
    }

    #[test]
    fn distance_is_measured_in_three_dimensions() {
        let mut pickups = BoostPickups::new(2.0);
        pickups.add([210.0, 15.0, 80.0]);

        // right below the floating pickup
        assert_eq!(pickups.collect_near(Vector3::new(210.0, 1.0, 80.0)), None);
    }

    #[test]
    fn one_pickup_per_call_and_reset_restores() {
        let mut pickups = BoostPickups::new(2.0);
        pickups.add([0.0, 2.0, 0.0]);
        pickups.add([0.5, 2.0, 0.0]);

        assert_eq!(pickups.collect_near(Vector3::new(0.2, 2.0, 0.0)), Some(0));
        assert_eq!(pickups.collect_near(Vector3::new(0.2, 2.0, 0.0)), Some(1));

        pickups.reset();
        assert_eq!(pickups.remaining().count(), 2);
    }
}
