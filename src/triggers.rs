use crate::physics::BlockSpec;
use crate::vehicle::PlanarPoint;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TriggerHandle(u32);

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TriggerAction {
    /// Drop one obstacle block at each drop position.
    DropBlocks(BlockSpec),
    /// Crossing the zone wins the race.
    Finish,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriggerZone {
    pub handle: TriggerHandle,
    pub position: PlanarPoint,
    pub radius: f32,
    pub activated: bool,
    pub action: TriggerAction,
    pub drop_positions: Vec<PlanarPoint>,
}

/// One dispatched action at one drop position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerDispatch {
    pub handle: TriggerHandle,
    pub action: TriggerAction,
    pub position: PlanarPoint,
}

/// Receives zone actions. The session spawns blocks or ends the race; tests
/// just collect them.
pub trait TriggerDispatcher {
    fn dispatch(&mut self, dispatch: TriggerDispatch);
}

impl TriggerDispatcher for Vec<TriggerDispatch> {
    fn dispatch(&mut self, dispatch: TriggerDispatch) {
        self.push(dispatch);
    }
}

/// Radius zones polled against the vehicle's planar position. Each zone
/// fires once until `reset`.
#[derive(Debug, Default)]
pub struct TriggerZoneSystem {
    zones: Vec<TriggerZone>,
    next_id: u32,
}

impl TriggerZoneSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a zone. Without explicit drop positions the action fires at
    /// the zone centre; an empty list fires nothing.
    pub fn add_trigger(
        &mut self,
        position: PlanarPoint,
        radius: f32,
        action: TriggerAction,
        drop_positions: Option<Vec<PlanarPoint>>,
    ) -> TriggerHandle {
        let handle = TriggerHandle(self.next_id);
        self.next_id += 1;

        self.zones.push(TriggerZone {
            handle,
            position,
            radius,
            activated: false,
            action,
            drop_positions: drop_positions.unwrap_or_else(|| vec![position]),
        });
        handle
    }

    pub fn check_triggers(
        &mut self,
        vehicle: PlanarPoint,
        dispatcher: &mut dyn TriggerDispatcher,
    ) -> Vec<TriggerHandle> {
        let mut fired = Vec::new();

        for zone in self.zones.iter_mut().filter(|z| !z.activated) {
            if vehicle.distance(zone.position) >= zone.radius {
                continue;
            }
            zone.activated = true;
            fired.push(zone.handle);

            for &position in &zone.drop_positions {
                dispatcher.dispatch(TriggerDispatch {
                    handle: zone.handle,
                    action: zone.action,
                    position,
                });
            }
        }

        fired
    }

    /// Re-arms every zone.
    pub fn reset(&mut self) {
        for zone in &mut self.zones {
            zone.activated = false;
        }
    }

    pub fn zones(&self) -> &[TriggerZone] {
        &self.zones
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f32, z: f32) -> PlanarPoint {
        PlanarPoint::new(x, z)
    }

    fn drops() -> TriggerAction {
        TriggerAction::DropBlocks(BlockSpec::default())
    }

    #[test]
    fn zone_fires_once_while_vehicle_lingers() {
        let mut zones = TriggerZoneSystem::new();
        let handle = zones.add_trigger(
            p(110.0, 38.0),
            2.0,
            drops(),
            Some(vec![p(100.0, 30.0), p(90.0, 15.0), p(110.0, 20.0)]),
        );

        let mut out = Vec::new();
        for _ in 0..120 {
            zones.check_triggers(p(110.5, 38.5), &mut out);
        }

        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|d| d.handle == handle));
        assert_eq!(out[1].position, p(90.0, 15.0));
    }

    #[test]
    fn reset_allows_exactly_one_more_fire() {
        let mut zones = TriggerZoneSystem::new();
        zones.add_trigger(p(0.0, 0.0), 2.0, drops(), None);

        let mut out = Vec::new();
        zones.check_triggers(p(0.0, 0.0), &mut out);
        zones.reset();
        zones.check_triggers(p(0.0, 0.0), &mut out);
        zones.check_triggers(p(0.0, 0.0), &mut out);

        assert_eq!(out.len(), 2);
        // no drop positions given, so the zone centre is used
        assert_eq!(out[0].position, p(0.0, 0.0));
    }

    #[test]
    fn overlapping_zones_fire_independently() {
        let mut zones = TriggerZoneSystem::new();
        let a = zones.add_trigger(p(0.0, 0.0), 2.0, drops(), Some(vec![p(5.0, 5.0)]));
        let b = zones.add_trigger(
            p(1.0, 0.0),
            2.0,
            drops(),
            Some(vec![p(-5.0, 5.0), p(-6.0, 5.0)]),
        );

        let mut out = Vec::new();
        let fired = zones.check_triggers(p(0.5, 0.0), &mut out);
        zones.check_triggers(p(0.6, 0.1), &mut out);

        assert_eq!(fired, vec![a, b]);
        assert_eq!(out.iter().filter(|d| d.handle == a).count(), 1);
        assert_eq!(out.iter().filter(|d| d.handle == b).count(), 2);
    }

    #[test]
    fn boundary_is_exclusive() {
        let mut zones = TriggerZoneSystem::new();
        zones.add_trigger(p(0.0, 0.0), 2.0, TriggerAction::Finish, None);

        let mut out = Vec::new();
        zones.check_triggers(p(2.0, 0.0), &mut out);
        assert!(out.is_empty());
        assert!(!zones.zones()[0].activated);

        zones.check_triggers(p(1.99, 0.0), &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].action, TriggerAction::Finish);
    }

    #[test]
    fn empty_drop_list_activates_without_dispatch() {
        let mut zones = TriggerZoneSystem::new();
        let handle = zones.add_trigger(p(0.0, 0.0), 2.0, drops(), Some(Vec::new()));

        let mut out = Vec::new();
        let fired = zones.check_triggers(p(0.0, 0.0), &mut out);

        assert_eq!(fired, vec![handle]);
        assert!(out.is_empty());
    }
}
