//! Ambassador store
//!
//! One table, two natural keys: `email` (lowercased) and `code` (uppercased).
//! Records are created once per email and never deleted; counters only grow.

use sqlx::SqlitePool;

use crate::db::now_millis;
use crate::error::{ServiceError, ServiceResult};
use crate::referral::codegen;

#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct Ambassador {
    pub id: String,
    pub name: String,
    pub email: String,
    pub code: String,
    pub payout_preference: Option<String>,
    pub payout_identifier: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    pub clicks: i64,
    pub signups: i64,
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<Ambassador>, sqlx::Error> {
    let email = email.trim().to_lowercase();
    sqlx::query_as("SELECT * FROM ambassadors WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_code(pool: &SqlitePool, code: &str) -> Result<Option<Ambassador>, sqlx::Error> {
    let code = code.trim().to_uppercase();
    sqlx::query_as("SELECT * FROM ambassadors WHERE code = ?")
        .bind(code)
        .fetch_optional(pool)
        .await
}

pub async fn code_exists(pool: &SqlitePool, code: &str) -> Result<bool, sqlx::Error> {
    let found: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM ambassadors WHERE code = ?")
        .bind(code.trim().to_uppercase())
        .fetch_optional(pool)
        .await?;
    Ok(found.is_some())
}

/// Insert-or-update keyed by email.
///
/// First registration allocates a fresh referral code and inserts with zeroed
/// counters. Repeat registrations update `name` only when the new value is
/// non-empty and differs, and never overwrite a previously-set payout field
/// with a blank one. `updated_at` is refreshed either way.
///
/// Returns the record plus `is_new`. A concurrent first-time registration for
/// the same email is resolved by the unique index: the losing insert retries
/// as an update.
pub async fn upsert(
    pool: &SqlitePool,
    name: &str,
    email: &str,
    payout_preference: Option<&str>,
    payout_identifier: Option<&str>,
) -> ServiceResult<(Ambassador, bool)> {
    let email = email.trim().to_lowercase();

    // An email conflict means the row exists and the next pass takes the
    // update path, so two email conflicts are a hard stop. A code conflict is
    // an unrelated generation race and only costs a fresh candidate.
    let mut email_conflicts = 0u32;
    for _ in 0..UPSERT_RETRIES {
        if let Some(existing) = find_by_email(pool, &email).await? {
            let updated =
                apply_update(pool, existing, name, payout_preference, payout_identifier).await?;
            return Ok((updated, false));
        }

        let code = codegen::generate_code(pool).await?;
        let id = uuid::Uuid::new_v4().to_string();
        let now = now_millis();
        let insert = sqlx::query(
            "INSERT INTO ambassadors \
             (id, name, email, code, payout_preference, payout_identifier, \
              created_at, updated_at, clicks, signups) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0, 0)",
        )
        .bind(&id)
        .bind(name.trim())
        .bind(&email)
        .bind(&code)
        .bind(payout_preference.map(str::trim).filter(|s| !s.is_empty()))
        .bind(payout_identifier.map(str::trim).filter(|s| !s.is_empty()))
        .bind(now)
        .bind(now)
        .execute(pool)
        .await;

        match insert {
            Ok(_) => {
                let ambassador = Ambassador {
                    id,
                    name: name.trim().to_string(),
                    email,
                    code,
                    payout_preference: payout_preference
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from),
                    payout_identifier: payout_identifier
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from),
                    created_at: now,
                    updated_at: now,
                    clicks: 0,
                    signups: 0,
                };
                return Ok((ambassador, true));
            }
            Err(sqlx::Error::Database(dbe))
                if matches!(dbe.kind(), sqlx::error::ErrorKind::UniqueViolation) =>
            {
                if is_code_conflict(dbe.message()) {
                    continue;
                }
                email_conflicts += 1;
                if email_conflicts >= 2 {
                    return Err(ServiceError::DuplicateEmail);
                }
                continue;
            }
            Err(e) => return Err(e.into()),
        }
    }

    // Only repeated code collisions can fall through the retry bound
    Err(ServiceError::GenerationExhausted {
        attempts: UPSERT_RETRIES,
    })
}

const UPSERT_RETRIES: u32 = 4;

/// Classify a SQLite unique violation by the constraint it names.
/// Anything not naming the code column is treated as the email conflict.
fn is_code_conflict(message: &str) -> bool {
    message.contains("ambassadors.code")
}

async fn apply_update(
    pool: &SqlitePool,
    existing: Ambassador,
    name: &str,
    payout_preference: Option<&str>,
    payout_identifier: Option<&str>,
) -> Result<Ambassador, sqlx::Error> {
    let name = name.trim();
    let new_name = if !name.is_empty() && name != existing.name {
        name.to_string()
    } else {
        existing.name.clone()
    };
    let new_preference = payout_preference
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .or(existing.payout_preference.clone());
    let new_identifier = payout_identifier
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .or(existing.payout_identifier.clone());
    let now = now_millis();

    sqlx::query(
        "UPDATE ambassadors SET name = ?, payout_preference = ?, payout_identifier = ?, \
         updated_at = ? WHERE id = ?",
    )
    .bind(&new_name)
    .bind(&new_preference)
    .bind(&new_identifier)
    .bind(now)
    .bind(&existing.id)
    .execute(pool)
    .await?;

    Ok(Ambassador {
        name: new_name,
        payout_preference: new_preference,
        payout_identifier: new_identifier,
        updated_at: now,
        ..existing
    })
}

/// Atomic click credit. Single update-in-place so concurrent redirects for a
/// popular code never lose a count. Unknown codes are a no-op, not an error.
pub async fn increment_clicks(pool: &SqlitePool, code: &str) -> Result<bool, sqlx::Error> {
    let code = code.trim().to_uppercase();
    let result = sqlx::query(
        "UPDATE ambassadors SET clicks = clicks + 1, updated_at = ? WHERE code = ?",
    )
    .bind(now_millis())
    .bind(code)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Conversion credit, same atomic shape as clicks. Written only by the manual
/// admin entry path; the billing system is the canonical conversion writer.
pub async fn increment_signups(pool: &SqlitePool, code: &str) -> Result<bool, sqlx::Error> {
    let code = code.trim().to_uppercase();
    let result = sqlx::query(
        "UPDATE ambassadors SET signups = signups + 1, updated_at = ? WHERE code = ?",
    )
    .bind(now_millis())
    .bind(code)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Full snapshot for the admin views and exports, newest first.
pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Ambassador>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM ambassadors ORDER BY created_at DESC")
        .fetch_all(pool)
        .await
}

pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM ambassadors")
        .fetch_one(pool)
        .await
}
