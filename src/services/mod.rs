// src/services/mod.rs
//
// Collaborators shared by the route modules: the persistence gateway and
// outbound email.

pub mod database;
pub mod email;

pub use database::Database;
pub use email::{LogMailer, Mailer, SesMailer};
