use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

pub type DbPool = Pool<SqliteConnectionManager>;

pub fn init_pool() -> Result<DbPool, Box<dyn std::error::Error>> {
    let manager = SqliteConnectionManager::file("website/db/vitrine.db");
    let pool = Pool::builder().max_size(10).build(manager)?;

    // Enable WAL mode for better concurrent read performance
    let conn = pool.get()?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;

    Ok(pool)
}

pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn std::error::Error>> {
    let conn = pool.get()?;

    conn.execute_batch(
        "
        -- Services (agency offerings)
        CREATE TABLE IF NOT EXISTS services (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            slug TEXT UNIQUE NOT NULL,
            rank INTEGER NOT NULL DEFAULT 0,
            featured_image TEXT,
            body TEXT,
            full_description TEXT,
            seo_paragraph TEXT NOT NULL DEFAULT '',
            custom_link TEXT NOT NULL DEFAULT '',
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        -- Projects (case studies)
        -- service_id is a value reference only: deleting a service does not
        -- cascade here, a dangling id just never matches a filter bucket.
        CREATE TABLE IF NOT EXISTS projects (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            slug TEXT UNIQUE NOT NULL,
            featured_image TEXT,
            body TEXT,
            full_description TEXT,
            seo_caption TEXT NOT NULL DEFAULT '',
            live_url TEXT NOT NULL DEFAULT '',
            service_id INTEGER,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        -- Industries (hierarchical classification for projects)
        CREATE TABLE IF NOT EXISTS industries (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            slug TEXT UNIQUE NOT NULL,
            parent_id INTEGER
        );

        -- Many-to-many: projects <-> industries
        CREATE TABLE IF NOT EXISTS project_industries (
            project_id INTEGER NOT NULL,
            industry_id INTEGER NOT NULL,
            UNIQUE(project_id, industry_id)
        );

        -- Settings (key-value)
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT
        );

        -- One-time anti-forgery tokens for metadata forms
        CREATE TABLE IF NOT EXISTS form_tokens (
            token TEXT PRIMARY KEY,
            created_at DATETIME NOT NULL,
            expires_at DATETIME NOT NULL
        );
        ",
    )?;

    Ok(())
}

/// Declared defaults for every settings name. Seeded at boot and
/// re-materialized by `Setting::get_or_default` on first read, so a
/// read never observes an unset key.
pub const SETTING_DEFAULTS: &[(&str, &str)] = &[
    // Site
    ("site_name", "Vitrine"),
    ("contact_url", ""),
    // Theme colors
    ("theme_primary_color", "#1f6f54"),
    ("theme_secondary_color", "#d4a017"),
    ("theme_text_color", "#1a1a1a"),
    ("theme_card_bg", "#ffffff"),
    // Theme shape
    ("theme_border_radius", "10px"),
    ("theme_card_shadow", "rgba(0,0,0,0.12)"),
    // Typography
    ("theme_font_family", "Inter"),
    ("theme_heading_weight", "600"),
    ("theme_font_size_body", "16px"),
    ("theme_font_size_heading", "2rem"),
    ("theme_font_size_button", "15px"),
    // Button copy
    ("label_explore", "Explore"),
    ("label_contact", "Contact Us"),
    ("label_view_project", "View Project"),
    ("label_view_live", "View Live Site"),
    // Uploaded custom font descriptors (JSON array of file URLs)
    ("custom_fonts", "[]"),
    // Media
    (
        "media_allowed_types",
        "jpg,jpeg,png,gif,webp,svg,woff,woff2,ttf",
    ),
];

pub fn seed_defaults(pool: &DbPool) -> Result<(), Box<dyn std::error::Error>> {
    let conn = pool.get()?;

    for (key, value) in SETTING_DEFAULTS {
        conn.execute(
            "INSERT OR IGNORE INTO settings (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
    }

    Ok(())
}
