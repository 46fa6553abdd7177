// Application state shared across all modules

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::auth::IdentityProvider;
use crate::common::config::AppConfig;
use crate::notifications::{ConnectionRegistry, NotificationDispatcher};
use crate::services::{Database, Mailer};

/// Database gateway, collaborators and configuration handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub identity: Arc<dyn IdentityProvider>,
    pub mailer: Arc<dyn Mailer>,
    pub registry: ConnectionRegistry,
    pub dispatcher: NotificationDispatcher,
    pub config: AppConfig,
}

pub type SharedState = Arc<RwLock<AppState>>;
