//! # Exercises Module
//!
//! Read access to the exercise catalog.

pub mod handlers;
pub mod routes;

pub use routes::exercises_routes;
