use chrono::NaiveDateTime;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Service {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub rank: i64,
    pub featured_image: Option<String>,
    pub body: Option<String>,
    pub full_description: Option<String>,
    pub seo_paragraph: String,
    pub custom_link: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Deserialize)]
pub struct ServiceForm {
    pub title: String,
    pub slug: String,
    pub rank: Option<i64>,
    pub featured_image: Option<String>,
    pub body: Option<String>,
    pub full_description: Option<String>,
}

impl Service {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Service {
            id: row.get("id")?,
            title: row.get("title")?,
            slug: row.get("slug")?,
            rank: row.get("rank")?,
            featured_image: row.get("featured_image")?,
            body: row.get("body")?,
            full_description: row.get("full_description")?,
            seo_paragraph: row
                .get::<_, Option<String>>("seo_paragraph")?
                .unwrap_or_default(),
            custom_link: row
                .get::<_, Option<String>>("custom_link")?
                .unwrap_or_default(),
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    pub fn find_by_id(pool: &DbPool, id: i64) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT * FROM services WHERE id = ?1",
            params![id],
            Self::from_row,
        )
        .ok()
    }

    pub fn find_by_slug(pool: &DbPool, slug: &str) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT * FROM services WHERE slug = ?1",
            params![slug],
            Self::from_row,
        )
        .ok()
    }

    /// All services in manual rank order. The grids render the entire set,
    /// collection sizes are assumed small.
    pub fn list_by_rank(pool: &DbPool) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };

        let mut stmt = match conn.prepare("SELECT * FROM services ORDER BY rank, title") {
            Ok(s) => s,
            Err(_) => return vec![],
        };

        stmt.query_map([], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    /// Up to `limit` other services, excluding `exclude_id`, most recent first.
    pub fn recent_others(pool: &DbPool, exclude_id: i64, limit: i64) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };

        let mut stmt = match conn.prepare(
            "SELECT * FROM services WHERE id != ?1 ORDER BY created_at DESC LIMIT ?2",
        ) {
            Ok(s) => s,
            Err(_) => return vec![],
        };

        stmt.query_map(params![exclude_id, limit], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn count(pool: &DbPool) -> i64 {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return 0,
        };
        conn.query_row("SELECT COUNT(*) FROM services", [], |row| row.get(0))
            .unwrap_or(0)
    }

    /// The grid card's click-through target: the custom redirect link when
    /// set and non-empty, otherwise the service's own detail permalink.
    pub fn explore_url(&self) -> String {
        if self.custom_link.trim().is_empty() {
            format!("/services/{}", self.slug)
        } else {
            self.custom_link.clone()
        }
    }

    pub fn create(pool: &DbPool, form: &ServiceForm) -> Result<i64, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO services (title, slug, rank, featured_image, body, full_description)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                form.title,
                form.slug,
                form.rank.unwrap_or(0),
                form.featured_image,
                form.body,
                form.full_description,
            ],
        )
        .map_err(|e| e.to_string())?;
        Ok(conn.last_insert_rowid())
    }

    pub fn update(pool: &DbPool, id: i64, form: &ServiceForm) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "UPDATE services SET title=?1, slug=?2, rank=?3, featured_image=?4,
             body=?5, full_description=?6, updated_at=CURRENT_TIMESTAMP WHERE id=?7",
            params![
                form.title,
                form.slug,
                form.rank.unwrap_or(0),
                form.featured_image,
                form.body,
                form.full_description,
                id,
            ],
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }

    pub fn update_meta(
        pool: &DbPool,
        id: i64,
        seo_paragraph: &str,
        custom_link: &str,
    ) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "UPDATE services SET seo_paragraph=?1, custom_link=?2,
             updated_at=CURRENT_TIMESTAMP WHERE id=?3",
            params![seo_paragraph, custom_link, id],
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }

    pub fn delete(pool: &DbPool, id: i64) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        // No cascade to projects: their service_id is left dangling on purpose.
        conn.execute("DELETE FROM services WHERE id = ?1", params![id])
            .map_err(|e| e.to_string())?;
        Ok(())
    }
}
