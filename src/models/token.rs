use chrono::{Duration, Utc};
use rusqlite::params;

use crate::db::DbPool;

/// One-time anti-forgery token for the per-item metadata forms.
///
/// Issued when an edit form is rendered, consumed on save. A save whose
/// token is missing, unknown, expired, or already consumed is skipped
/// entirely; no partial write happens.
pub struct FormToken;

const TOKEN_TTL_HOURS: i64 = 4;

impl FormToken {
    pub fn issue(pool: &DbPool) -> Option<String> {
        let conn = pool.get().ok()?;
        let token = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();
        let expires = now + Duration::hours(TOKEN_TTL_HOURS);
        conn.execute(
            "INSERT INTO form_tokens (token, created_at, expires_at) VALUES (?1, ?2, ?3)",
            params![
                token,
                now.format("%Y-%m-%d %H:%M:%S").to_string(),
                expires.format("%Y-%m-%d %H:%M:%S").to_string(),
            ],
        )
        .ok()?;
        Some(token)
    }

    /// Validates and burns the token in one step.
    pub fn consume(pool: &DbPool, token: &str) -> bool {
        if token.is_empty() {
            return false;
        }
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return false,
        };
        let now = Utc::now()
            .naive_utc()
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();
        let deleted = conn
            .execute(
                "DELETE FROM form_tokens WHERE token = ?1 AND expires_at > ?2",
                params![token, now],
            )
            .unwrap_or(0);
        // Expired rows are cleaned opportunistically on every check.
        let _ = conn.execute(
            "DELETE FROM form_tokens WHERE expires_at <= ?1",
            params![now],
        );
        deleted > 0
    }
}
