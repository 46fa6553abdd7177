//! Persistence gateway
//!
//! `Database` is the only type that issues SQL for the clinic tables. Each
//! submodule adds the reads and writes for one table (or one join) as an
//! `impl Database` block. Methods return raw `sqlx` results so callers decide
//! which safe message a failure maps to.

mod assignments;
mod doctors;
mod exercises;
pub mod models;
mod patients;
mod sessions;

#[cfg(test)]
mod tests;

use sqlx::SqlitePool;

pub use models::*;
pub use sessions::{STATUS_COMPLETED, STATUS_IN_PROGRESS};

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
