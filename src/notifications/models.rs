use serde::{Deserialize, Serialize};

/// Frames exchanged on the doctor notification socket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationMessage {
    // Server -> Client
    SessionUpdate {
        session_id: String,
        status: Option<String>,
        data: serde_json::Value,
    },
    Connected {
        doctor_id: String,
    },
    Pong,
    Error {
        message: String,
    },

    // Client -> Server
    Ping,
}

#[derive(Debug, Deserialize)]
pub struct SocketParams {
    pub token: Option<String>,
}
