//! Referral code generation
//!
//! Codes are the public handle for attributing clicks and signups, which makes
//! them bearer credentials: candidates come from the OS CSPRNG, never a seeded
//! sequence. The alphabet is uppercase and visually unambiguous (no I/L/O/0/1)
//! so codes survive being read aloud or retyped.

use std::future::Future;

use rand::Rng;
use rand::rngs::OsRng;
use sqlx::SqlitePool;

use crate::db::ambassadors;
use crate::error::{ServiceError, ServiceResult};

pub const CODE_LEN: usize = 6;
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

/// Candidate bound before giving up. Hitting it means the code space is
/// unexpectedly saturated or the store is misbehaving; the caller surfaces it
/// as a 5xx and it should page someone.
const MAX_ATTEMPTS: u32 = 32;

/// Generate a referral code that is unique among all stored codes.
pub async fn generate_code(pool: &SqlitePool) -> ServiceResult<String> {
    generate_with(MAX_ATTEMPTS, |candidate| async move {
        ambassadors::code_exists(pool, &candidate).await
    })
    .await
}

/// Generation loop over an arbitrary exists-checker, bounded at
/// `max_attempts` candidates.
pub async fn generate_with<F, Fut>(max_attempts: u32, mut exists: F) -> ServiceResult<String>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<bool, sqlx::Error>>,
{
    for _ in 0..max_attempts {
        let candidate = random_code();
        if !exists(candidate.clone()).await? {
            return Ok(candidate);
        }
    }
    Err(ServiceError::GenerationExhausted {
        attempts: max_attempts,
    })
}

fn random_code() -> String {
    let mut rng = OsRng;
    (0..CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}
