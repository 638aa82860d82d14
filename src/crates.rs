use crate::physics::{BodyTag, ContactEvent};
use tracing::debug;

/// Damage request raised when the vehicle bumps into a crate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrateDamage {
    pub crate_index: usize,
    pub amount: f32,
}

/// Turns vehicle/crate contacts into fixed damage. One cooldown is shared
/// by all crates.
#[derive(Debug, Clone)]
pub struct CrateDamageEmitter {
    amount: f32,
    cooldown: f32,
    last_hit: Option<f32>,
}

impl CrateDamageEmitter {
    pub fn new(amount: f32, cooldown: f32) -> Self {
        Self {
            amount,
            cooldown,
            last_hit: None,
        }
    }

    pub fn on_contact(&mut self, event: &ContactEvent, now: f32) -> Option<CrateDamage> {
        let BodyTag::Crate(crate_index) = event.other else {
            return None;
        };
        if self.last_hit.is_some_and(|last| now - last < self.cooldown) {
            return None;
        }
        self.last_hit = Some(now);

        debug!(crate_index, amount = self.amount, "crate hit");
        Some(CrateDamage {
            crate_index,
            amount: self.amount,
        })
    }

    pub fn reset(&mut self) {
        self.last_hit = None;
    }
}
