//! # Notifications Module
//!
//! Live session updates for doctors:
//! - `ConnectionRegistry` tracks open sockets per doctor
//! - `NotificationDispatcher` routes a patient's event to the owning doctor
//! - `/ws/doctor` accepts the sockets

pub mod dispatcher;
pub mod handlers;
pub mod models;
pub mod registry;
pub mod routes;


pub use dispatcher::NotificationDispatcher;
pub use models::NotificationMessage;
pub use registry::{ConnectionRegistry, LiveConnection};
pub use routes::notifications_routes;
