pub mod camera;
pub mod checkpoint;
pub mod config;
pub mod controls;
pub mod crates;
pub mod damage;
pub mod error;
pub mod level;
pub mod net;
pub mod physics;
pub mod pickups;
pub mod protocol;
pub mod session;
pub mod state;
pub mod timestep;
pub mod triggers;
pub mod tuning;
pub mod vehicle;
