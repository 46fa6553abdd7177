//! # Sessions Module
//!
//! A patient's exercise sessions: start, update and read back. Updates are
//! relayed to the doctor through the notification dispatcher.

pub mod handlers;
pub mod models;
pub mod routes;
pub mod validators;


pub use routes::sessions_routes;
