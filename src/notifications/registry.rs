use axum::extract::ws::Message;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info};

use super::models::NotificationMessage;

/// Outbound half of one open socket
#[derive(Debug, Clone)]
pub struct LiveConnection {
    pub id: String,
    sender: mpsc::UnboundedSender<Message>,
}

impl LiveConnection {
    pub fn new(id: String, sender: mpsc::UnboundedSender<Message>) -> Self {
        Self { id, sender }
    }

    /// Fails once the socket's writer task has gone away
    pub fn send(&self, message: Message) -> Result<(), String> {
        self.sender
            .send(message)
            .map_err(|e| format!("Failed to send message: {}", e))
    }
}

/// Live notification connections keyed by doctor id.
///
/// One lock guards the whole map; it is never held across a socket write.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    doctors: Arc<RwLock<HashMap<String, HashMap<String, LiveConnection>>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, doctor_id: &str, connection: LiveConnection) {
        let connection_id = connection.id.clone();
        self.doctors
            .write()
            .await
            .entry(doctor_id.to_string())
            .or_default()
            .insert(connection_id.clone(), connection);

        info!(
            doctor_id = %doctor_id,
            connection_id = %connection_id,
            "Notification connection registered"
        );
    }

    /// Removes one connection and prunes the doctor entry once it is empty
    pub async fn unregister(&self, doctor_id: &str, connection_id: &str) {
        let mut doctors = self.doctors.write().await;
        let removed = match doctors.get_mut(doctor_id) {
            Some(conns) => {
                let removed = conns.remove(connection_id).is_some();
                if conns.is_empty() {
                    doctors.remove(doctor_id);
                }
                removed
            }
            None => false,
        };

        if removed {
            info!(
                doctor_id = %doctor_id,
                connection_id = %connection_id,
                "Notification connection unregistered"
            );
        }
    }

    /// Snapshot of a doctor's connections at the time of the call
    pub async fn connections_for(&self, doctor_id: &str) -> Vec<LiveConnection> {
        self.doctors
            .read()
            .await
            .get(doctor_id)
            .map(|conns| conns.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Send a frame to one specific connection
    pub async fn send_to(
        &self,
        doctor_id: &str,
        connection_id: &str,
        message: &NotificationMessage,
    ) -> Result<(), String> {
        let json = serde_json::to_string(message)
            .map_err(|e| format!("Failed to serialize message: {}", e))?;

        let connection = self
            .doctors
            .read()
            .await
            .get(doctor_id)
            .and_then(|conns| conns.get(connection_id))
            .cloned()
            .ok_or_else(|| format!("Connection {} not found", connection_id))?;

        connection.send(Message::Text(json))?;
        debug!(connection_id = %connection_id, "Frame sent to connection");
        Ok(())
    }

    pub async fn connection_count(&self, doctor_id: &str) -> usize {
        self.doctors
            .read()
            .await
            .get(doctor_id)
            .map(|conns| conns.len())
            .unwrap_or(0)
    }

    pub async fn total_connections(&self) -> usize {
        self.doctors.read().await.values().map(|conns| conns.len()).sum()
    }

    /// Drops every sender so each socket's writer task ends
    pub async fn close_all(&self) {
        let mut doctors = self.doctors.write().await;
        let closed: usize = doctors.values().map(|conns| conns.len()).sum();
        doctors.clear();
        info!(closed = closed, "Closed all notification connections");
    }
}
