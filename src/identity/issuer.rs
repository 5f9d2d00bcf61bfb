//! Credential issuance: unique usernames derived from a person's name and
//! random passwords for newly created accounts.

use anyhow::{anyhow, Result};
use std::collections::HashSet;

const PASSWORD_LEN: usize = 10;
const PASSWORD_ALPHABET: &[u8; 62] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Derive a username unique within `existing`.
///
/// The base candidate is `first.last`; on a case-insensitive collision an
/// integer suffix starting at 1 is appended until the candidate is free.
/// `existing` is a snapshot supplied by the caller; the issuer holds no state.
pub fn generate_username(first_name: &str, last_name: &str, existing: &[String]) -> String {
    let taken: HashSet<String> = existing.iter().map(|u| u.to_lowercase()).collect();
    let base = format!("{}.{}", first_name, last_name);
    if !taken.contains(&base.to_lowercase()) {
        return base;
    }
    let mut suffix: u64 = 1;
    loop {
        let candidate = format!("{}{}", base, suffix);
        if !taken.contains(&candidate.to_lowercase()) {
            return candidate;
        }
        suffix += 1;
    }
}

/// Generate a 10-character alphanumeric password from the system CSPRNG.
///
/// Bytes at or above the largest multiple of 62 are rejected so every symbol
/// is drawn uniformly. The only failure mode is an unavailable entropy source.
pub fn generate_password() -> Result<String> {
    let mut out = String::with_capacity(PASSWORD_LEN);
    let mut buf = [0u8; 32];
    while out.len() < PASSWORD_LEN {
        getrandom::getrandom(&mut buf).map_err(|e| anyhow!(e.to_string()))?;
        for &b in buf.iter() {
            if b >= 248 {
                continue;
            }
            out.push(PASSWORD_ALPHABET[(b % 62) as usize] as char);
            if out.len() == PASSWORD_LEN {
                break;
            }
        }
    }
    Ok(out)
}
