//! Salted PBKDF2-HMAC-SHA256 credential hashing.
//!
//! Stored form: `pbkdf2-sha256$<rounds>$<salt hex>$<digest hex>`. The round count
//! is read back from the stored hash, so raising `ROUNDS` only affects new hashes.

use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;

const SCHEME: &str = "pbkdf2-sha256";
const ROUNDS: u32 = if cfg!(test) { 1_000 } else { 100_000 };
const MAX_ROUNDS: u32 = 10_000_000;
const SALT_LEN: usize = 16;
const DIGEST_LEN: usize = 32;

/// Hashes `password` with a fresh random salt.
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    let digest = derive(password.as_bytes(), &salt, ROUNDS);
    format!("{}${}${}${}", SCHEME, ROUNDS, hex::encode(salt), hex::encode(digest))
}

/// Returns true iff `password` hashes to `stored`. Malformed hashes never verify.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.split('$');
    let (Some(scheme), Some(rounds), Some(salt), Some(expected), None) =
        (parts.next(), parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    if scheme != SCHEME {
        return false;
    }
    let Ok(rounds) = rounds.parse::<u32>() else {
        return false;
    };
    if rounds == 0 || rounds > MAX_ROUNDS {
        return false;
    }
    let (Ok(salt), Ok(expected)) = (hex::decode(salt), hex::decode(expected)) else {
        return false;
    };
    let actual = derive(password.as_bytes(), &salt, rounds);
    constant_time_eq(&actual, &expected)
}

fn derive(password: &[u8], salt: &[u8], rounds: u32) -> [u8; DIGEST_LEN] {
    let mut digest = [0u8; DIGEST_LEN];
    pbkdf2_hmac::<Sha256>(password, salt, rounds, &mut digest);
    digest
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
