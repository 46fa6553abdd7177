//! # Patient Module
//!
//! Read-only views a patient has of their own programme.

pub mod handlers;
pub mod models;
pub mod routes;


pub use handlers::current_patient;
pub use routes::patient_routes;
