use crate::session::GameSignal;
use crate::state::Snapshot;
use serde::{Deserialize, Serialize};

/// Messages accepted from the browser.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Key { key: String, pressed: bool },
    Start,
    Restart,
    Pause,
    Ping,
}

/// Messages pushed to the browser.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome { client_id: String },
    Snapshot(Box<Snapshot>),
    Signal(GameSignal),
    Pong,
}

impl ClientMessage {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::GameOverReason;

    #[test]
    fn parses_key_events() {
        let msg = ClientMessage::from_json(r#"{"type":"key","key":"ArrowUp","pressed":true}"#)
            .expect("valid");
        assert_eq!(
            msg,
            ClientMessage::Key {
                key: "ArrowUp".into(),
                pressed: true
            }
        );
        assert_eq!(ClientMessage::from_json(r#"{"type":"ping"}"#).ok(), Some(ClientMessage::Ping));
    }

    #[test]
    fn rejects_unknown_or_incomplete_messages() {
        assert!(ClientMessage::from_json(r#"{"type":"input","throttle":1.0}"#).is_err());
        assert!(ClientMessage::from_json(r#"{"type":"key","key":"w"}"#).is_err());
        assert!(ClientMessage::from_json("not json").is_err());
    }

    #[test]
    fn signals_are_flattened_under_the_type_tag() {
        let msg = ServerMessage::Signal(GameSignal::GameOver {
            reason: GameOverReason::TimeUp,
        });
        let json = serde_json::to_value(&msg).expect("serializes");

        assert_eq!(json["type"], "signal");
        assert_eq!(json["signal"], "game_over");
        assert_eq!(json["reason"], "time_up");
    }
}
