//! # Auth Module
//!
//! This module handles all authentication-related functionality including:
//! - The identity provider (accounts, password hashing, JWT issue and validation)
//! - The `resolve_identity` middleware guarding protected routes
//! - The `AuthedUser` extractor and per-handler role checks
//! - Register, login and "who am I" endpoints

pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod provider;
pub mod routes;


pub use extractors::AuthedUser;
pub use middleware::{authenticate_token, resolve_identity};
pub use models::Role;
pub use provider::{IdentityError, IdentityProvider, LocalIdentityProvider};
pub use routes::auth_routes;
