use rusqlite::params;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::db::{DbPool, SETTING_DEFAULTS};

#[derive(Debug, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: String,
}

impl Setting {
    pub fn get(pool: &DbPool, key: &str) -> Option<String> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT value FROM settings WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .ok()
    }

    /// Returns the stored value, or the declared default for this key.
    /// A missing row is materialized with its default before returning,
    /// so later reads (and `all`) always see a concrete value.
    pub fn get_or_default(pool: &DbPool, key: &str) -> String {
        if let Some(v) = Self::get(pool, key) {
            return v;
        }
        let default = Self::declared_default(key).unwrap_or("");
        let _ = Self::set(pool, key, default);
        default.to_string()
    }

    pub fn declared_default(key: &str) -> Option<&'static str> {
        SETTING_DEFAULTS
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
    }

    pub fn set(pool: &DbPool, key: &str, value: &str) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2",
            params![key, value],
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }

    pub fn set_many(pool: &DbPool, settings: &HashMap<String, String>) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        for (key, value) in settings {
            conn.execute(
                "INSERT INTO settings (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = ?2",
                params![key, value],
            )
            .map_err(|e| e.to_string())?;
        }
        Ok(())
    }

    pub fn all(pool: &DbPool) -> HashMap<String, String> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return HashMap::new(),
        };

        let mut stmt = match conn.prepare("SELECT key, value FROM settings") {
            Ok(s) => s,
            Err(_) => return HashMap::new(),
        };

        stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })
        .map(|rows| rows.filter_map(|r| r.ok()).collect())
        .unwrap_or_default()
    }

    /// Uploaded custom font file URLs, parsed from the `custom_fonts` JSON list.
    pub fn custom_fonts(pool: &DbPool) -> Vec<String> {
        let raw = Self::get_or_default(pool, "custom_fonts");
        serde_json::from_str(&raw).unwrap_or_default()
    }

    pub fn add_custom_font(pool: &DbPool, file_url: &str) -> Result<(), String> {
        let mut fonts = Self::custom_fonts(pool);
        if !fonts.iter().any(|f| f == file_url) {
            fonts.push(file_url.to_string());
        }
        let raw = serde_json::to_string(&fonts).map_err(|e| e.to_string())?;
        Self::set(pool, "custom_fonts", &raw)
    }
}
