use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;

/// Hierarchical classification tag for projects. Created ad hoc from the
/// project metadata form; `parent_id` nests one industry under another.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Industry {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub parent_id: Option<i64>,
}

impl Industry {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Industry {
            id: row.get("id")?,
            name: row.get("name")?,
            slug: row.get("slug")?,
            parent_id: row.get("parent_id")?,
        })
    }

    pub fn find_by_slug(pool: &DbPool, slug: &str) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT * FROM industries WHERE slug = ?1",
            params![slug],
            Self::from_row,
        )
        .ok()
    }

    pub fn list(pool: &DbPool) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn.prepare("SELECT * FROM industries ORDER BY name") {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map([], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    /// Industries with at least one tagged project. Only these get a
    /// filter button in the project grid.
    pub fn with_projects(pool: &DbPool) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn.prepare(
            "SELECT DISTINCT i.* FROM industries i
             JOIN project_industries pi ON pi.industry_id = i.id
             ORDER BY i.name",
        ) {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map([], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn for_project(pool: &DbPool, project_id: i64) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn.prepare(
            "SELECT i.* FROM industries i
             JOIN project_industries pi ON pi.industry_id = i.id
             WHERE pi.project_id = ?1
             ORDER BY i.name",
        ) {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map(params![project_id], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn find_or_create(pool: &DbPool, name: &str) -> Result<i64, String> {
        let slug_str = slug::slugify(name);
        if let Some(existing) = Self::find_by_slug(pool, &slug_str) {
            return Ok(existing.id);
        }
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO industries (name, slug) VALUES (?1, ?2)",
            params![name.trim(), slug_str],
        )
        .map_err(|e| e.to_string())?;
        Ok(conn.last_insert_rowid())
    }

    pub fn set_for_project(
        pool: &DbPool,
        project_id: i64,
        industry_ids: &[i64],
    ) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "DELETE FROM project_industries WHERE project_id = ?1",
            params![project_id],
        )
        .map_err(|e| e.to_string())?;

        for industry_id in industry_ids {
            conn.execute(
                "INSERT OR IGNORE INTO project_industries (project_id, industry_id) VALUES (?1, ?2)",
                params![project_id, industry_id],
            )
            .map_err(|e| e.to_string())?;
        }
        Ok(())
    }

    pub fn delete(pool: &DbPool, id: i64) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "DELETE FROM project_industries WHERE industry_id = ?1",
            params![id],
        )
        .map_err(|e| e.to_string())?;
        conn.execute("DELETE FROM industries WHERE id = ?1", params![id])
            .map_err(|e| e.to_string())?;
        Ok(())
    }
}
