//! Temporary passwords for doctor-created patient accounts

use rand::distributions::Alphanumeric;
use rand::Rng;

const FALLBACK_LENGTH: usize = 11;

/// Capitalized first name followed by the last four phone digits.
///
/// Phones with fewer than four digits are right-padded with `0`. A name
/// without any word falls back to a random URL-safe token.
pub fn temporary_password(full_name: &str, phone: &str) -> String {
    let first_name = match full_name.split_whitespace().next() {
        Some(word) => capitalize(word),
        None => return random_token(),
    };

    let digits: Vec<char> = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    let suffix: String = if digits.len() >= 4 {
        digits[digits.len() - 4..].iter().collect()
    } else {
        let mut padded: String = digits.iter().collect();
        while padded.len() < 4 {
            padded.push('0');
        }
        padded
    };

    format!("{}{}", first_name, suffix)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(|c| c.to_lowercase()))
            .collect(),
        None => String::new(),
    }
}

fn random_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(FALLBACK_LENGTH)
        .map(char::from)
        .collect()
}
