use drive_server::config;
use drive_server::net::start_websocket_server;
use drive_server::protocol::ServerMessage;
use drive_server::session::GameSession;
use drive_server::state::SharedGameState;
use drive_server::tuning::GameTuning;

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tokio::time::interval;

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

fn load_tuning() -> Option<GameTuning> {
    let Some(path) = config::tuning_path() else {
        return Some(GameTuning::default());
    };
    match GameTuning::load_from_file(&path) {
        Ok(tuning) => {
            tracing::info!(path = %path.display(), "tuning loaded");
            Some(tuning)
        }
        Err(e) => {
            tracing::error!(error = %e, "invalid tuning");
            None
        }
    }
}

#[tokio::main]
async fn main() {
    // Load .env locally; safe to ignore when not present.
    let _ = dotenvy::dotenv();
    init_tracing();
    tracing::info!("starting drive server");

    let Some(tuning) = load_tuning() else {
        return;
    };
    let session = match GameSession::level1(tuning) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "failed to build vehicle");
            return;
        }
    };

    let state = Arc::new(Mutex::new(SharedGameState::new()));
    let session = Arc::new(Mutex::new(session));

    let addr = format!("{}:{}", config::bind_address(), config::ws_port());
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(%addr, error = %e, "failed to bind");
            return;
        }
    };

    tokio::spawn(start_websocket_server(
        listener,
        Arc::clone(&state),
        Arc::clone(&session),
    ));

    // Frame cadence; the session runs fixed 1/60 s steps from its accumulator.
    let started = Instant::now();
    let mut ticker = interval(config::TICK_INTERVAL);

    loop {
        ticker.tick().await;

        let mut game = session.lock().await;
        game.frame(started.elapsed().as_secs_f64());
        let snapshot = game.snapshot();
        let signals = game.drain_signals();
        drop(game);

        let mut shared = state.lock().await;
        shared.tick = snapshot.tick;
        for signal in signals {
            shared.broadcast(&ServerMessage::Signal(signal));
        }
        shared.broadcast(&ServerMessage::Snapshot(Box::new(snapshot)));
    }
}
