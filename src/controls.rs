use crate::tuning::VehicleTuning;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Drive-side seam between the control logic and whatever owns the wheels.
pub trait WheelActuator {
    /// Drive value for one wheel, applied about its axle on the next step.
    fn set_wheel_force(&mut self, force: f32, wheel: usize);

    /// Steering angle of a front wheel (0 or 1), in radians.
    fn set_steering_value(&mut self, angle: f32, wheel: usize);
}

pub const FRONT_WHEELS: [usize; 2] = [0, 1];
pub const DRIVE_WHEELS: [usize; 2] = [2, 3];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Forward,
    Back,
    Left,
    Right,
    Boost,
    CameraCycle,
    Pause,
    Headlights,
    ResetTriggers,
    DropBlock,
    DropBlockPattern,
    ClearBlocks,
}

impl Action {
    /// Held actions feed the per-tick drive logic; the rest fire once on press.
    pub fn is_held(self) -> bool {
        matches!(
            self,
            Action::Forward | Action::Back | Action::Left | Action::Right
        )
    }

    /// Keys that take the session out of its ready state.
    pub fn starts_race(self) -> bool {
        self.is_held()
    }
}

/// Key name → action lookup. Key names are matched case-insensitively.
#[derive(Debug, Clone)]
pub struct KeyBindings {
    map: HashMap<String, Action>,
}

impl KeyBindings {
    pub fn new<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Action)>,
        K: AsRef<str>,
    {
        let map = pairs
            .into_iter()
            .map(|(key, action)| (key.as_ref().to_ascii_lowercase(), action))
            .collect();
        Self { map }
    }

    pub fn lookup(&self, key: &str) -> Option<Action> {
        self.map.get(&key.to_ascii_lowercase()).copied()
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::new([
            ("w", Action::Forward),
            ("ArrowUp", Action::Forward),
            ("s", Action::Back),
            ("ArrowDown", Action::Back),
            ("a", Action::Left),
            ("ArrowLeft", Action::Left),
            ("d", Action::Right),
            ("ArrowRight", Action::Right),
            ("v", Action::CameraCycle),
            ("p", Action::Pause),
            ("Escape", Action::Pause),
            ("o", Action::Headlights),
            ("r", Action::ResetTriggers),
            ("b", Action::DropBlock),
            ("n", Action::DropBlockPattern),
            ("m", Action::ClearBlocks),
            ("Shift", Action::Boost),
        ])
    }
}

/// Held driving keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputState {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
}

impl InputState {
    /// Records a held key. Returns false for actions that are not held.
    pub fn set(&mut self, action: Action, pressed: bool) -> bool {
        let slot = match action {
            Action::Forward => &mut self.forward,
            Action::Back => &mut self.back,
            Action::Left => &mut self.left,
            Action::Right => &mut self.right,
            _ => return false,
        };
        *slot = pressed;
        true
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ControlState {
    /// Physical steering angle sent to the front wheels.
    pub current_steer_value: f32,

    // Cosmetic wheel state for the renderer.
    pub wheel_visual_roll_rotation: f32,
    pub front_wheel_steer_rotation: f32,

    /// Simulation time at which the current boost runs out.
    #[serde(skip)]
    pub boost_until: Option<f32>,
}

pub struct ControlSystem {
    tuning: VehicleTuning,
    input: InputState,
    state: ControlState,
}

impl ControlSystem {
    pub fn new(tuning: VehicleTuning) -> Self {
        Self {
            tuning,
            input: InputState::default(),
            state: ControlState {
                wheel_visual_roll_rotation: 1.0,
                ..ControlState::default()
            },
        }
    }

    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    pub fn state(&self) -> &ControlState {
        &self.state
    }

    /// Starts a boost, or pushes back the expiry of one already running.
    pub fn activate_boost(&mut self, now: f32) {
        self.state.boost_until = Some(now + self.tuning.boost_duration);
    }

    pub fn boost_active(&self, now: f32) -> bool {
        self.state.boost_until.is_some_and(|until| now < until)
    }

    /// Back to a centred, unboosted car with no keys held.
    pub fn reset(&mut self) {
        self.input = InputState::default();
        self.state = ControlState {
            wheel_visual_roll_rotation: 1.0,
            ..ControlState::default()
        };
    }

    /// One fixed tick: drive forces on the rear wheels, gradual steering on the
    /// front wheels, cosmetic wheel state.
    pub fn update(&mut self, actuator: &mut dyn WheelActuator, planar_speed: f32, now: f32) {
        if self.state.boost_until.is_some_and(|until| now >= until) {
            self.state.boost_until = None;
        }

        let t = &self.tuning;
        let multiplier = if self.boost_active(now) {
            t.boost_force_multiplier
        } else {
            1.0
        };

        let drive = if self.input.forward {
            self.state.wheel_visual_roll_rotation -= t.wheel_roll_speed;
            t.forward_force * multiplier
        } else if self.input.back {
            self.state.wheel_visual_roll_rotation += t.wheel_roll_speed;
            -t.reverse_force * multiplier
        } else {
            0.0
        };
        for wheel in DRIVE_WHEELS {
            actuator.set_wheel_force(drive, wheel);
        }

        let speed_factor = (1.0 - planar_speed / t.speed_factor_range).max(t.min_speed_factor);

        let (target, visual_target) = if self.input.left {
            (t.max_steer_value, t.max_visual_steer)
        } else if self.input.right {
            (-t.max_steer_value, -t.max_visual_steer)
        } else {
            (0.0, 0.0)
        };

        let rate = if target == 0.0 {
            t.return_steer_speed
        } else {
            t.steer_speed * speed_factor
        };
        self.state.current_steer_value = approach(self.state.current_steer_value, target, rate);

        let visual_rate = if visual_target == 0.0 {
            t.visual_steer_speed * 0.5
        } else {
            t.visual_steer_speed
        };
        self.state.front_wheel_steer_rotation =
            approach(self.state.front_wheel_steer_rotation, visual_target, visual_rate);

        for wheel in FRONT_WHEELS {
            actuator.set_steering_value(self.state.current_steer_value, wheel);
        }
    }
}

/// Moves `current` toward `target` by at most `step`, never past it.
fn approach(current: f32, target: f32, step: f32) -> f32 {
    if current < target {
        (current + step).min(target)
    } else if current > target {
        (current - step).max(target)
    } else {
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        forces: [f32; 4],
        steering: [f32; 2],
    }

    impl WheelActuator for Recorder {
        fn set_wheel_force(&mut self, force: f32, wheel: usize) {
            self.forces[wheel] = force;
        }

        fn set_steering_value(&mut self, angle: f32, wheel: usize) {
            self.steering[wheel] = angle;
        }
    }

    fn controls() -> ControlSystem {
        ControlSystem::new(VehicleTuning::default())
    }

    #[test]
    fn forward_drives_rear_wheels_only() {
        let mut ctl = controls();
        let mut rec = Recorder::default();
        ctl.input_mut().forward = true;

        ctl.update(&mut rec, 0.0, 0.0);

        assert_eq!(rec.forces, [0.0, 0.0, 10.0, 10.0]);
    }

    #[test]
    fn forward_wins_over_back() {
        let mut ctl = controls();
        let mut rec = Recorder::default();
        ctl.input_mut().forward = true;
        ctl.input_mut().back = true;

        ctl.update(&mut rec, 0.0, 0.0);

        assert_eq!(rec.forces[2], 10.0);
    }

    #[test]
    fn boost_multiplies_drive_until_expiry() {
        let mut ctl = controls();
        let mut rec = Recorder::default();
        ctl.input_mut().back = true;
        ctl.activate_boost(2.0);

        ctl.update(&mut rec, 0.0, 2.5);
        assert_eq!(rec.forces[3], -21.0);

        ctl.update(&mut rec, 0.0, 3.0);
        assert_eq!(rec.forces[3], -6.0);
        assert!(ctl.state().boost_until.is_none());
    }

    #[test]
    fn reverse_is_weaker_than_forward() {
        let mut ctl = controls();
        let mut rec = Recorder::default();

        ctl.input_mut().back = true;
        ctl.update(&mut rec, 0.0, 0.0);
        let reverse = rec.forces[2];

        ctl.input_mut().back = false;
        ctl.input_mut().forward = true;
        ctl.update(&mut rec, 0.0, 0.0);

        assert!(reverse < 0.0);
        assert!(reverse.abs() < rec.forces[2]);
    }

    #[test]
    fn boost_refresh_extends_expiry() {
        let mut ctl = controls();
        ctl.activate_boost(1.0);
        ctl.activate_boost(1.8);

        assert!(ctl.boost_active(2.5));
        assert!(!ctl.boost_active(2.8));
    }

    #[test]
    fn steering_never_exceeds_limit_and_approaches_monotonically() {
        let mut ctl = controls();
        let mut rec = Recorder::default();
        let max = VehicleTuning::default().max_steer_value;
        ctl.input_mut().left = true;

        let mut previous = 0.0;
        for tick in 0..40 {
            // speed varies so the speed factor kicks in part of the time
            let speed = (tick as f32) * 1.5;
            ctl.update(&mut rec, speed, 0.0);
            let value = ctl.state().current_steer_value;
            assert!(value.abs() <= max + f32::EPSILON);
            assert!(value >= previous);
            previous = value;
        }
        assert_eq!(rec.steering, [max, max]);
    }

    #[test]
    fn return_to_center_is_faster_than_turn_in() {
        let mut ctl = controls();
        let mut rec = Recorder::default();
        let max = VehicleTuning::default().max_steer_value;

        ctl.input_mut().right = true;
        let mut turn_in = 0;
        while ctl.state().current_steer_value > -max {
            ctl.update(&mut rec, 0.0, 0.0);
            turn_in += 1;
        }

        ctl.input_mut().right = false;
        let mut recentre = 0;
        while ctl.state().current_steer_value != 0.0 {
            ctl.update(&mut rec, 0.0, 0.0);
            recentre += 1;
        }

        assert_eq!(turn_in, 6);
        assert_eq!(recentre, 2);
        assert_eq!(rec.steering, [0.0, 0.0]);
    }

    #[test]
    fn high_speed_reduces_steer_rate_to_floor() {
        let mut ctl = controls();
        let mut rec = Recorder::default();
        ctl.input_mut().left = true;

        ctl.update(&mut rec, 100.0, 0.0);

        let expected = 0.1 * 0.3;
        assert!((ctl.state().current_steer_value - expected).abs() < 1e-6);
    }

    #[test]
    fn left_wins_over_right() {
        let mut ctl = controls();
        let mut rec = Recorder::default();
        ctl.input_mut().left = true;
        ctl.input_mut().right = true;

        ctl.update(&mut rec, 0.0, 0.0);

        assert!(ctl.state().current_steer_value > 0.0);
        assert!(ctl.state().front_wheel_steer_rotation > 0.0);
    }

    #[test]
    fn bindings_cover_both_layouts_and_ignore_unknown_keys() {
        let keys = KeyBindings::default();

        assert_eq!(keys.lookup("w"), Some(Action::Forward));
        assert_eq!(keys.lookup("W"), Some(Action::Forward));
        assert_eq!(keys.lookup("ArrowLeft"), Some(Action::Left));
        assert_eq!(keys.lookup("Escape"), Some(Action::Pause));
        assert_eq!(keys.lookup("F13"), None);
    }

    #[test]
    fn only_driving_actions_are_held() {
        let mut input = InputState::default();

        assert!(input.set(Action::Left, true));
        assert!(!input.set(Action::CameraCycle, true));
        assert!(input.left);
    }
}
