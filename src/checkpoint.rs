use rapier3d::na::Vector3;
use serde::Serialize;

/// Seconds a checkpoint stays highlighted after being touched.
pub const HIGHLIGHT_SECS: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Checkpoint {
    pub position: [f32; 3],
    pub size: [f32; 3],
    #[serde(skip)]
    highlight_until: Option<f32>,
}

impl Checkpoint {
    pub fn highlighted(&self, now: f32) -> bool {
        self.highlight_until.is_some_and(|until| now < until)
    }
}

/// Checkpoint volumes plus the latched respawn point. Touching any volume
/// overwrites the latch; volumes are never consumed.
#[derive(Debug, Clone)]
pub struct CheckpointRegistry {
    checkpoints: Vec<Checkpoint>,
    initial: Vector3<f32>,
    current: Vector3<f32>,
}

impl CheckpointRegistry {
    pub fn new(initial: Vector3<f32>) -> Self {
        Self {
            checkpoints: Vec::new(),
            initial,
            current: initial,
        }
    }

    /// Registers a volume and returns its index.
    pub fn add(&mut self, position: [f32; 3], size: [f32; 3]) -> usize {
        self.checkpoints.push(Checkpoint {
            position,
            size,
            highlight_until: None,
        });
        self.checkpoints.len() - 1
    }

    /// Latches checkpoint `index` as the respawn point. Returns true when the
    /// latched position actually moved.
    pub fn reach(&mut self, index: usize, now: f32) -> bool {
        let Some(checkpoint) = self.checkpoints.get_mut(index) else {
            return false;
        };
        checkpoint.highlight_until = Some(now + HIGHLIGHT_SECS);

        let [x, y, z] = checkpoint.position;
        let position = Vector3::new(x, y, z);
        let moved = position != self.current;
        self.current = position;
        moved
    }

    pub fn current(&self) -> Vector3<f32> {
        self.current
    }

    pub fn checkpoints(&self) -> &[Checkpoint] {
        &self.checkpoints
    }

    /// Back to the level's initial spawn point with no highlights.
    pub fn reset(&mut self) {
        self.current = self.initial;
        for checkpoint in &mut self.checkpoints {
            checkpoint.highlight_until = None;
        }
    }
}

impl Default for CheckpointRegistry {
    fn default() -> Self {
        Self::new(Vector3::new(0.0, 2.0, -10.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reaching_same_checkpoint_twice_is_idempotent() {
        let mut reg = CheckpointRegistry::default();
        let cp = reg.add([122.0, 2.0, 74.0], [2.0, 20.0, 40.0]);

        assert!(reg.reach(cp, 1.0));
        let after_first = reg.current();
        assert!(!reg.reach(cp, 1.1));

        assert_eq!(reg.current(), after_first);
        assert_eq!(after_first, Vector3::new(122.0, 2.0, 74.0));
    }

    #[test]
    fn later_touch_overwrites_regardless_of_order() {
        let mut reg = CheckpointRegistry::default();
        let a = reg.add([-10.0, 2.0, -3.0], [2.0, 20.0, 40.0]);
        let b = reg.add([336.0, 2.0, -53.0], [40.0, 20.0, 2.0]);

        reg.reach(b, 0.0);
        reg.reach(a, 1.0);

        assert_eq!(reg.current(), Vector3::new(-10.0, 2.0, -3.0));
    }

    #[test]
    fn highlight_expires() {
        let mut reg = CheckpointRegistry::default();
        let cp = reg.add([0.0; 3], [1.0; 3]);
        reg.reach(cp, 2.0);

        assert!(reg.checkpoints()[cp].highlighted(2.4));
        assert!(!reg.checkpoints()[cp].highlighted(2.5));
    }

    #[test]
    fn unknown_index_and_reset() {
        let mut reg = CheckpointRegistry::default();
        let cp = reg.add([5.0, 2.0, 5.0], [1.0; 3]);

        assert!(!reg.reach(42, 0.0));
        reg.reach(cp, 0.0);
        reg.reset();

        assert_eq!(reg.current(), Vector3::new(0.0, 2.0, -10.0));
        assert!(!reg.checkpoints()[cp].highlighted(0.1));
    }
}
