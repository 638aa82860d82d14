use std::{env, path::PathBuf, time::Duration};

// Runtime/server constants (not gameplay tuning).

pub fn ws_port() -> u16 {
    env::var("DRIVE_SERVER_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(9001)
}

pub fn bind_address() -> String {
    env::var("DRIVE_SERVER_BIND").unwrap_or_else(|_| "0.0.0.0".to_string())
}

/// Optional TOML file overriding the built-in gameplay tuning.
pub fn tuning_path() -> Option<PathBuf> {
    env::var("DRIVE_TUNING_PATH")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
}

// Wall-clock cadence of the world task; the simulation itself advances in
// FIXED_DT steps from an accumulator.
pub const TICK_INTERVAL: Duration = Duration::from_millis(16);
pub const FIXED_DT: f32 = 1.0 / 60.0;

// Upper bound of fixed steps run in one frame after a long stall.
pub const MAX_STEPS_PER_FRAME: u32 = 10;
