use chrono::NaiveDateTime;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Project {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub featured_image: Option<String>,
    pub body: Option<String>,
    pub full_description: Option<String>,
    pub seo_caption: String,
    pub live_url: String,
    pub service_id: Option<i64>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Deserialize)]
pub struct ProjectForm {
    pub title: String,
    pub slug: String,
    pub featured_image: Option<String>,
    pub body: Option<String>,
    pub full_description: Option<String>,
}

impl Project {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Project {
            id: row.get("id")?,
            title: row.get("title")?,
            slug: row.get("slug")?,
            featured_image: row.get("featured_image")?,
            body: row.get("body")?,
            full_description: row.get("full_description")?,
            seo_caption: row
                .get::<_, Option<String>>("seo_caption")?
                .unwrap_or_default(),
            live_url: row
                .get::<_, Option<String>>("live_url")?
                .unwrap_or_default(),
            service_id: row.get("service_id")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    pub fn find_by_id(pool: &DbPool, id: i64) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT * FROM projects WHERE id = ?1",
            params![id],
            Self::from_row,
        )
        .ok()
    }

    pub fn find_by_slug(pool: &DbPool, slug: &str) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT * FROM projects WHERE slug = ?1",
            params![slug],
            Self::from_row,
        )
        .ok()
    }

    /// Every project, newest first. The grid renders the whole set and the
    /// filtering happens client-side over the emitted markup.
    pub fn list_all(pool: &DbPool) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };

        let mut stmt = match conn.prepare("SELECT * FROM projects ORDER BY created_at DESC") {
            Ok(s) => s,
            Err(_) => return vec![],
        };

        stmt.query_map([], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    /// Up to `limit` other projects, excluding `exclude_id`, most recent first.
    pub fn recent_others(pool: &DbPool, exclude_id: i64, limit: i64) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };

        let mut stmt = match conn.prepare(
            "SELECT * FROM projects WHERE id != ?1 ORDER BY created_at DESC LIMIT ?2",
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
        conn.query_row("SELECT COUNT(*) FROM projects", [], |row| row.get(0))
            .unwrap_or(0)
    }

    pub fn create(pool: &DbPool, form: &ProjectForm) -> Result<i64, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO projects (title, slug, featured_image, body, full_description)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                form.title,
                form.slug,
                form.featured_image,
                form.body,
                form.full_description,
            ],
        )
        .map_err(|e| e.to_string())?;
        Ok(conn.last_insert_rowid())
    }

    pub fn update(pool: &DbPool, id: i64, form: &ProjectForm) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "UPDATE projects SET title=?1, slug=?2, featured_image=?3, body=?4,
             full_description=?5, updated_at=CURRENT_TIMESTAMP WHERE id=?6",
            params![
                form.title,
                form.slug,
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
        service_id: Option<i64>,
        live_url: &str,
        seo_caption: &str,
    ) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "UPDATE projects SET service_id=?1, live_url=?2, seo_caption=?3,
             updated_at=CURRENT_TIMESTAMP WHERE id=?4",
            params![service_id, live_url, seo_caption, id],
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }

    pub fn delete(pool: &DbPool, id: i64) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "DELETE FROM project_industries WHERE project_id = ?1",
            params![id],
        )
        .map_err(|e| e.to_string())?;
        conn.execute("DELETE FROM projects WHERE id = ?1", params![id])
            .map_err(|e| e.to_string())?;
        Ok(())
    }
}
