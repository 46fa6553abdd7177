// src/common/id_generator.rs
//! Crockford Base32 ID Generator
//!
//! Every row gets a prefixed, human-readable id such as `P_K7NP3XY2QM`.
//! The prefix tells which table the id belongs to, which makes ids pasted
//! into logs or support tickets easy to place.

use rand::Rng;

/// Crockford Base32 alphabet (excludes I, L, O, U)
const CROCKFORD_ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Random characters after the prefix
const ID_LENGTH: usize = 10;

/// Entity type prefixes for ID generation
#[derive(Debug, Clone, Copy)]
pub enum EntityPrefix {
    /// Identity provider account (U_)
    User,
    /// Doctor profile (D_)
    Doctor,
    /// Patient profile (P_)
    Patient,
    /// Exercise catalog entry (E_)
    Exercise,
    /// Assigned exercise (A_)
    Assignment,
    /// Exercise session (S_)
    Session,
    /// Live notification connection (N_)
    Connection,
}

impl EntityPrefix {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityPrefix::User => "U",
            EntityPrefix::Doctor => "D",
            EntityPrefix::Patient => "P",
            EntityPrefix::Exercise => "E",
            EntityPrefix::Assignment => "A",
            EntityPrefix::Session => "S",
            EntityPrefix::Connection => "N",
        }
    }
}

fn generate_crockford_string(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| CROCKFORD_ALPHABET[rng.gen_range(0..32)] as char)
        .collect()
}

/// Generate a prefixed ID, e.g. `S_8MWQT2K7NP`
pub fn generate_id(prefix: EntityPrefix) -> String {
    format!("{}_{}", prefix.as_str(), generate_crockford_string(ID_LENGTH))
}

pub fn generate_user_id() -> String {
    generate_id(EntityPrefix::User)
}

pub fn generate_doctor_id() -> String {
    generate_id(EntityPrefix::Doctor)
}

pub fn generate_patient_id() -> String {
    generate_id(EntityPrefix::Patient)
}

pub fn generate_exercise_id() -> String {
    generate_id(EntityPrefix::Exercise)
}

pub fn generate_assignment_id() -> String {
    generate_id(EntityPrefix::Assignment)
}

pub fn generate_session_id() -> String {
    generate_id(EntityPrefix::Session)
}

pub fn generate_connection_id() -> String {
    generate_id(EntityPrefix::Connection)
}
