//! # Doctor Module
//!
//! Doctor-facing endpoints: patient onboarding, the patient roster,
//! exercise assignment and session oversight.

pub mod handlers;
pub mod models;
pub mod password;
pub mod routes;
pub mod validators;

#[cfg(test)]
mod tests;

pub use routes::doctor_routes;
