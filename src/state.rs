use crate::camera::{CameraMode, CameraOutput};
use crate::controls::ControlState;
use crate::damage::VehicleCondition;
use crate::physics::BodyPose;
use crate::protocol::ServerMessage;
use crate::session::SessionStatus;
use crate::vehicle::PlanarPoint;
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};
use uuid::Uuid;

/// Everything the renderer needs for one frame.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub status: SessionStatus,
    pub chassis: Option<BodyPose>,
    pub wheels: Vec<BodyPose>,
    pub planar_position: PlanarPoint,
    pub speed_kmh: f32,
    pub health: f32,
    pub max_health: f32,
    pub condition: VehicleCondition,
    pub time_left: u32,
    pub camera_mode: CameraMode,
    pub camera: CameraOutput,
    pub controls: ControlState,
    pub boost_active: bool,
    pub headlights: bool,
    pub current_checkpoint: [f32; 3],
    pub highlighted_checkpoints: Vec<usize>,
    pub crates: Vec<BodyPose>,
    pub blocks: Vec<BodyPose>,
    pub boosts: Vec<[f32; 3]>,
}

/// Connected clients and their outgoing queues.
#[derive(Default)]
pub struct SharedGameState {
    pub tick: u64,
    pub clients: HashMap<Uuid, UnboundedSender<String>>,
}

impl SharedGameState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_client(&mut self, tx: UnboundedSender<String>) -> Uuid {
        let id = Uuid::new_v4();
        self.clients.insert(id, tx);
        debug!(%id, clients = self.clients.len(), "client registered");
        id
    }

    pub fn remove_client(&mut self, id: &Uuid) {
        self.clients.remove(id);
    }

    /// Serializes once and fans the text out to every client. Clients whose
    /// queue is gone are dropped.
    pub fn broadcast(&mut self, message: &ServerMessage) {
        let json = match serde_json::to_string(message) {
            Ok(json) => json,
            Err(err) => {
                warn!(%err, "failed to serialize server message");
                return;
            }
        };

        self.clients.retain(|_, tx| tx.send(json.clone()).is_ok());
    }
}
