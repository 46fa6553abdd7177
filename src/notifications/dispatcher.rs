use axum::extract::ws::Message;
use tracing::{debug, warn};

use super::models::NotificationMessage;
use super::registry::ConnectionRegistry;
use crate::services::Database;

/// Pushes patient events to the owning doctor's live connections.
///
/// Delivery is best effort. Nothing here fails the caller.
#[derive(Clone)]
pub struct NotificationDispatcher {
    db: Database,
    registry: ConnectionRegistry,
}

impl NotificationDispatcher {
    pub fn new(db: Database, registry: ConnectionRegistry) -> Self {
        Self { db, registry }
    }

    /// Returns the number of connections the event was handed to
    pub async fn notify_doctor(&self, patient_id: &str, event: &NotificationMessage) -> usize {
        let doctor_id = match self.db.find_patient_doctor_id(patient_id).await {
            Ok(Some(doctor_id)) => doctor_id,
            Ok(None) => {
                warn!(patient_id = %patient_id, "No owning doctor for notification");
                return 0;
            }
            Err(e) => {
                warn!(patient_id = %patient_id, error = %e, "Failed to resolve doctor for notification");
                return 0;
            }
        };

        let connections = self.registry.connections_for(&doctor_id).await;
        if connections.is_empty() {
            debug!(doctor_id = %doctor_id, "Doctor has no live connections");
            return 0;
        }

        let json = match serde_json::to_string(event) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Failed to serialize notification");
                return 0;
            }
        };

        let mut delivered = 0;
        for connection in connections {
            match connection.send(Message::Text(json.clone())) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!(
                        doctor_id = %doctor_id,
                        connection_id = %connection.id,
                        error = %e,
                        "Dropping dead notification connection"
                    );
                    self.registry.unregister(&doctor_id, &connection.id).await;
                }
            }
        }

        debug!(doctor_id = %doctor_id, delivered = delivered, "Notification dispatched");
        delivered
    }
}
