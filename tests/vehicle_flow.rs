use drive_server::checkpoint::CheckpointRegistry;
use drive_server::config::FIXED_DT;
use drive_server::damage::{DamageRespawnController, RespawnCause};
use drive_server::physics::PhysicsWorld;
use drive_server::protocol::{ClientMessage, ServerMessage};
use drive_server::session::{GameSession, GameSignal, SessionStatus};
use drive_server::tuning::{ChassisTuning, GameTuning, VehicleTuning};
use drive_server::vehicle::RigidVehicle;
use rapier3d::na::{UnitQuaternion, Vector3};

fn session() -> GameSession {
    GameSession::level1(GameTuning::default()).expect("level1 builds")
}

#[test]
fn holding_forward_drives_the_car_along_negative_x() {
    let mut s = session();
    let start = s.sample().position;

    s.handle_key("w", true);
    assert_eq!(s.status(), SessionStatus::Running);

    for _ in 0..120 {
        s.step();
        let forces = s.vehicle().wheel_forces();
        assert!(forces[2] > 0.0 && forces[3] > 0.0, "rear wheels driven: {forces:?}");
        assert_eq!(forces[0], 0.0);
        assert_eq!(forces[1], 0.0);
    }

    let end = s.sample().position;
    assert!(end.x < start.x - 0.5, "moved from {start:?} to {end:?}");
    assert!(s.sample().planar_speed() > 0.1);
}

#[test]
fn releasing_forward_removes_the_drive_force() {
    let mut s = session();
    s.handle_key("ArrowUp", true);
    s.step();
    s.handle_key("ArrowUp", false);
    s.step();

    assert_eq!(s.vehicle().wheel_forces(), [0.0; 4]);
}

#[test]
fn flipped_car_respawns_once_with_all_velocities_cleared() {
    let mut world = PhysicsWorld::new(-9.82);
    world.add_ground(500.0);
    let flipped = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), std::f32::consts::PI);
    let mut vehicle = RigidVehicle::build(
        &mut world,
        &ChassisTuning::default(),
        Vector3::new(0.0, 3.0, 0.0),
        flipped,
    )
    .expect("vehicle builds");
    let checkpoints = CheckpointRegistry::new(Vector3::new(0.0, 2.0, -10.0));
    let mut damage = DamageRespawnController::new(VehicleTuning::default());
    damage.reset(0.0);

    let mut respawns = 0;
    let mut restored = false;
    for tick in 0..180u32 {
        let now = tick as f32 * FIXED_DT;
        world.step(FIXED_DT);
        let sample = vehicle.sample(&world);
        let report = damage.tick(&sample, now, FIXED_DT, true);

        if report.restore_collision {
            vehicle.set_collision_response(&mut world, true);
            restored = true;
        }
        if let Some(cause) = report.respawn {
            assert_eq!(cause, RespawnCause::Flipped);
            respawns += 1;

            let order = damage.respawn(&checkpoints, now);
            vehicle.teleport(&mut world, order.position, order.rotation);
            vehicle.set_collision_response(&mut world, false);

            assert_eq!(order.position, Vector3::new(0.0, 3.0, -10.0));
            for (linvel, angvel) in vehicle.velocities(&world) {
                assert_eq!(linvel, Vector3::zeros());
                assert_eq!(angvel, Vector3::zeros());
            }
            assert!(damage.is_invulnerable());
        }
    }

    assert_eq!(respawns, 1);
    assert!(restored);
    assert!(!vehicle.sample(&world).is_upside_down());
}

#[test]
fn client_messages_drive_the_session_lifecycle() {
    let mut s = session();

    match ClientMessage::from_json(r#"{"type":"start"}"#).expect("parses") {
        ClientMessage::Start => s.start(),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(s.status(), SessionStatus::Running);

    if let Ok(ClientMessage::Pause) = ClientMessage::from_json(r#"{"type":"pause"}"#) {
        s.toggle_pause();
    }
    assert_eq!(s.status(), SessionStatus::Paused);

    if let Ok(ClientMessage::Restart) = ClientMessage::from_json(r#"{"type":"restart"}"#) {
        s.restart();
    }
    assert_eq!(s.status(), SessionStatus::Ready);

    let signals = s.drain_signals();
    assert_eq!(
        signals,
        vec![GameSignal::Started, GameSignal::Paused, GameSignal::Restarted]
    );
}

#[test]
fn snapshot_message_carries_hud_fields() {
    let s = session();
    let msg = ServerMessage::Snapshot(Box::new(s.snapshot()));
    let json = serde_json::to_value(&msg).expect("serializes");

    assert_eq!(json["type"], "snapshot");
    assert_eq!(json["time_left"], 150);
    assert_eq!(json["health"], 100.0);
    assert_eq!(json["wheels"].as_array().map(Vec::len), Some(4));
    assert_eq!(json["boosts"].as_array().map(Vec::len), Some(7));
}
