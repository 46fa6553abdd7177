use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, WebSocketUpgrade,
    },
    response::IntoResponse,
    Extension,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::models::{NotificationMessage, SocketParams};
use super::registry::{ConnectionRegistry, LiveConnection};
use crate::auth::{authenticate_token, Role};
use crate::common::{generate_connection_id, ApiError, SharedState};

/// GET /ws/doctor?token=<jwt>
///
/// Browsers cannot attach headers to a WebSocket upgrade, so the bearer
/// token travels as a query parameter.
pub async fn doctor_socket(
    ws: WebSocketUpgrade,
    Extension(state_lock): Extension<SharedState>,
    Query(params): Query<SocketParams>,
) -> Result<impl IntoResponse, ApiError> {
    let token = params
        .token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Missing authentication token".to_string()))?;

    let state = state_lock.read().await.clone();
    let user = authenticate_token(state.identity.as_ref(), &token).await?;
    user.require_role(Role::Doctor, "Only doctors can subscribe to session updates")?;

    let doctor = state
        .db
        .get_or_create_doctor(&user.id, &user.email)
        .await
        .map_err(|e| ApiError::internal("Failed to resolve doctor profile", e))?;

    info!(
        user_id = %user.id,
        doctor_id = %doctor.id,
        "Notification socket authenticated"
    );

    let registry = state.registry.clone();
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, doctor.id, registry)))
}

async fn handle_socket(socket: WebSocket, doctor_id: String, registry: ConnectionRegistry) {
    let connection_id = generate_connection_id();
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

    // The registry holds the only sender, so close_all ends the writer task.
    registry
        .register(&doctor_id, LiveConnection::new(connection_id.clone(), tx))
        .await;
    let doctor_connections = registry.connection_count(&doctor_id).await;
    let total_connections = registry.total_connections().await;
    debug!(
        doctor_id = %doctor_id,
        doctor_connections = doctor_connections,
        total_connections = total_connections,
        "Live connection counts"
    );

    let connected = NotificationMessage::Connected {
        doctor_id: doctor_id.clone(),
    };
    match serde_json::to_string(&connected) {
        Ok(json) => {
            if let Err(e) = sender.send(Message::Text(json)).await {
                debug!(
                    connection_id = %connection_id,
                    error = %e,
                    "Failed to send connected frame"
                );
            }
        }
        Err(e) => debug!(error = %e, "Failed to serialize connected frame"),
    }

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
        let _ = sender.close().await;
    });

    let recv_doctor_id = doctor_id.clone();
    let recv_connection_id = connection_id.clone();
    let recv_registry = registry.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            let reply = match msg {
                Message::Text(text) => client_frame_reply(&text),
                Message::Close(_) => {
                    debug!(connection_id = %recv_connection_id, "Received close frame");
                    break;
                }
                // Protocol-level ping/pong is answered by the socket itself
                _ => None,
            };

            if let Some(reply) = reply {
                if let Err(e) = recv_registry
                    .send_to(&recv_doctor_id, &recv_connection_id, &reply)
                    .await
                {
                    warn!(
                        connection_id = %recv_connection_id,
                        error = %e,
                        "Failed to reply on notification socket"
                    );
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => {
            recv_task.abort();
        }
        _ = (&mut recv_task) => {
            send_task.abort();
        }
    }

    registry.unregister(&doctor_id, &connection_id).await;

    info!(
        doctor_id = %doctor_id,
        connection_id = %connection_id,
        "Notification socket closed"
    );
}

/// Reply owed to a text frame from the client, if any
fn client_frame_reply(text: &str) -> Option<NotificationMessage> {
    match serde_json::from_str::<NotificationMessage>(text) {
        Ok(NotificationMessage::Ping) => Some(NotificationMessage::Pong),
        Ok(other) => {
            warn!(message_type = ?other, "Unsupported frame from client");
            Some(NotificationMessage::Error {
                message: "Unsupported message type".to_string(),
            })
        }
        Err(e) => Some(NotificationMessage::Error {
            message: format!("Invalid message format: {}", e),
        }),
    }
}
