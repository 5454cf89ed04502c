#![cfg(test)]

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use std::collections::HashMap;

use crate::db::{run_migrations, seed_defaults, DbPool};
use crate::filter::{matches, CardTokens, FilterState, Selection};
use crate::models::industry::Industry;
use crate::models::project::{Project, ProjectForm};
use crate::models::service::{Service, ServiceForm};
use crate::models::settings::Setting;
use crate::models::token::FormToken;
use crate::render;
use crate::render::ContentSource;
use crate::routes::admin::sanitize_url;
use crate::theme;

/// Atomic counter for unique shared-cache DB names so parallel tests don't collide.
static TEST_DB_COUNTER: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(0);

/// Fresh in-memory SQLite pool with migrations applied but NO seeded
/// defaults, for exercising default materialization on first read.
fn bare_pool() -> DbPool {
    let id = TEST_DB_COUNTER.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    let uri = format!("file:testdb_{}?mode=memory&cache=shared", id);
    let manager = SqliteConnectionManager::file(uri);
    let pool = Pool::builder()
        .max_size(2)
        .build(manager)
        .expect("Failed to create test pool");
    run_migrations(&pool).expect("Failed to run migrations");
    pool
}

/// Fresh in-memory pool with migrations + seed defaults applied.
fn test_pool() -> DbPool {
    let pool = bare_pool();
    seed_defaults(&pool).expect("Failed to seed defaults");
    pool
}

fn make_service(pool: &DbPool, title: &str, rank: i64) -> i64 {
    Service::create(
        pool,
        &ServiceForm {
            title: title.to_string(),
            slug: slug::slugify(title),
            rank: Some(rank),
            featured_image: Some("/uploads/img.jpg".to_string()),
            body: Some("Body text".to_string()),
            full_description: None,
        },
    )
    .unwrap()
}

fn make_project(pool: &DbPool, title: &str) -> i64 {
    Project::create(
        pool,
        &ProjectForm {
            title: title.to_string(),
            slug: slug::slugify(title),
            featured_image: Some("/uploads/img.jpg".to_string()),
            body: Some("Body text".to_string()),
            full_description: None,
        },
    )
    .unwrap()
}

/// Give a row a distinct created_at so recency ordering is deterministic.
fn set_created_at(pool: &DbPool, table: &str, id: i64, ts: &str) {
    let conn = pool.get().unwrap();
    conn.execute(
        &format!("UPDATE {} SET created_at = ?1 WHERE id = ?2", table),
        rusqlite::params![ts, id],
    )
    .unwrap();
}

// ═══════════════════════════════════════════════════════════
// Settings
// ═══════════════════════════════════════════════════════════

#[test]
fn settings_default_materialized_on_first_read() {
    let pool = bare_pool();

    // Never written: first read yields the declared default...
    assert_eq!(Setting::get(&pool, "theme_primary_color"), None);
    assert_eq!(
        Setting::get_or_default(&pool, "theme_primary_color"),
        "#1f6f54"
    );

    // ...and that default is now the persisted value.
    assert_eq!(
        Setting::get(&pool, "theme_primary_color"),
        Some("#1f6f54".to_string())
    );
}

#[test]
fn settings_every_declared_default_materializes() {
    let pool = bare_pool();
    for (key, default) in crate::db::SETTING_DEFAULTS {
        assert_eq!(&Setting::get_or_default(&pool, key), default);
        assert_eq!(Setting::get(&pool, key), Some(default.to_string()));
    }
}

#[test]
fn settings_set_and_get() {
    let pool = test_pool();
    Setting::set(&pool, "theme_primary_color", "#123456").unwrap();
    assert_eq!(
        Setting::get(&pool, "theme_primary_color"),
        Some("#123456".to_string())
    );
}

#[test]
fn settings_set_many() {
    let pool = test_pool();
    let mut map = HashMap::new();
    map.insert("label_explore".to_string(), "Discover".to_string());
    map.insert("label_contact".to_string(), "Reach Out".to_string());
    Setting::set_many(&pool, &map).unwrap();
    assert_eq!(
        Setting::get(&pool, "label_explore"),
        Some("Discover".to_string())
    );
    assert_eq!(
        Setting::get(&pool, "label_contact"),
        Some("Reach Out".to_string())
    );
}

#[test]
fn settings_custom_fonts_roundtrip() {
    let pool = test_pool();
    assert!(Setting::custom_fonts(&pool).is_empty());
    Setting::add_custom_font(&pool, "/uploads/fonts/archivo.woff2").unwrap();
    Setting::add_custom_font(&pool, "/uploads/fonts/archivo.woff2").unwrap();
    assert_eq!(
        Setting::custom_fonts(&pool),
        vec!["/uploads/fonts/archivo.woff2".to_string()]
    );
}

// ═══════════════════════════════════════════════════════════
// Theme generator
// ═══════════════════════════════════════════════════════════

#[test]
fn font_face_ttf_maps_to_truetype() {
    let css = theme::build_font_faces(&["/uploads/fonts/archivo.ttf".to_string()]);
    assert_eq!(css.matches("@font-face").count(), 1);
    assert!(css.contains("font-family: 'archivo'"));
    assert!(css.contains("format('truetype')"));
}

#[test]
fn font_face_woff2_keeps_extension_verbatim() {
    let css = theme::build_font_faces(&["/uploads/fonts/geist-mono.woff2".to_string()]);
    assert_eq!(css.matches("@font-face").count(), 1);
    assert!(css.contains("font-family: 'geist-mono'"));
    assert!(css.contains("format('woff2')"));
}

#[test]
fn font_face_one_rule_per_descriptor() {
    let css = theme::build_font_faces(&[
        "/uploads/fonts/a.woff".to_string(),
        "/uploads/fonts/b.ttf".to_string(),
    ]);
    assert_eq!(css.matches("@font-face").count(), 2);
    assert!(css.contains("format('woff')"));
    assert!(css.contains("format('truetype')"));
}

#[test]
fn stylesheet_binds_settings_to_custom_properties() {
    let mut settings = HashMap::new();
    settings.insert("theme_primary_color".to_string(), "#ff0000".to_string());
    settings.insert("theme_border_radius".to_string(), "3px".to_string());
    let css = theme::build_stylesheet(&settings, &[]);
    assert!(css.contains("--vt-primary: #ff0000;"));
    assert!(css.contains("--vt-radius: 3px;"));
    // Component rules reference the properties by name
    assert!(css.contains("var(--vt-primary)"));
    assert!(css.contains("var(--vt-radius)"));
}

#[test]
fn stylesheet_passes_malformed_values_through() {
    let mut settings = HashMap::new();
    settings.insert(
        "theme_primary_color".to_string(),
        "definitely-not-a-color".to_string(),
    );
    let css = theme::build_stylesheet(&settings, &[]);
    assert!(css.contains("--vt-primary: definitely-not-a-color;"));
}

#[test]
fn stylesheet_falls_back_to_declared_defaults() {
    let css = theme::build_stylesheet(&HashMap::new(), &[]);
    assert!(css.contains("--vt-primary: #1f6f54;"));
    assert!(css.contains("--vt-font: 'Inter', sans-serif;"));
}

// ═══════════════════════════════════════════════════════════
// Filter runtime
// ═══════════════════════════════════════════════════════════

fn card(industries: &[&str], service: Option<&str>) -> CardTokens {
    CardTokens {
        industries: industries.iter().map(|s| s.to_string()).collect(),
        service: service.map(|s| s.to_string()),
    }
}

#[test]
fn filter_defaults_to_all_all() {
    let state = FilterState::default();
    assert_eq!(state.industry, Selection::All);
    assert_eq!(state.service, Selection::All);
}

#[test]
fn untagged_card_matches_under_all_in_each_dimension() {
    let bare = card(&[], None);
    let mut state = FilterState::default();
    assert!(matches(&bare, &state));

    // "all" bypasses the industry check regardless of the card's tag set...
    state.select_service("ser-1");
    assert!(!matches(&bare, &state));
    state.select_service("all");
    assert!(matches(&bare, &state));

    // ...and likewise for the service dimension.
    state.select_industry("ind-tech");
    assert!(!matches(&bare, &state));
}

#[test]
fn filter_and_semantics_across_dimensions() {
    let c = card(&["ind-health"], Some("ser-2"));
    let mut state = FilterState::default();

    // Matching industry but a different service must stay hidden.
    state.select_industry("ind-health");
    state.select_service("ser-9");
    assert!(!matches(&c, &state));

    state.select_service("ser-2");
    assert!(matches(&c, &state));
}

#[test]
fn filter_selection_toggles_back_to_all() {
    let c = card(&["ind-retail"], None);
    let mut state = FilterState::default();
    state.select_industry("ind-finance");
    assert!(!matches(&c, &state));
    state.select_industry("all");
    assert!(matches(&c, &state));
}

#[test]
fn card_tokens_for_project() {
    let pool = test_pool();
    let sid = make_service(&pool, "Branding", 1);
    let pid = make_project(&pool, "Acme Rebrand");
    let ind = Industry::find_or_create(&pool, "Consumer Goods").unwrap();
    Industry::set_for_project(&pool, pid, &[ind]).unwrap();
    Project::update_meta(&pool, pid, Some(sid), "", "").unwrap();

    let project = Project::find_by_id(&pool, pid).unwrap();
    let industries = Industry::for_project(&pool, pid);
    let tokens = CardTokens::for_project(&project, &industries);

    assert_eq!(tokens.industries, vec!["ind-consumer-goods".to_string()]);
    assert_eq!(tokens.service, Some(format!("ser-{}", sid)));
    assert!(tokens.class_tokens().contains(&format!("ser-{}", sid)));
}

#[test]
fn dangling_service_reference_keeps_token_but_loses_bucket() {
    let pool = test_pool();
    let sid = make_service(&pool, "Web Dev", 1);
    let pid = make_project(&pool, "Old Client Site");
    Project::update_meta(&pool, pid, Some(sid), "", "").unwrap();

    // Deleting the service does not cascade to the project...
    Service::delete(&pool, sid).unwrap();
    let project = Project::find_by_id(&pool, pid).unwrap();
    assert_eq!(project.service_id, Some(sid));

    // ...the card still carries a ser- token, but no grid button offers it.
    let tokens = CardTokens::for_project(&project, &[]);
    assert_eq!(tokens.service, Some(format!("ser-{}", sid)));
    let grid = render::render_project_grid(
        &[(project, vec![])],
        &Industry::with_projects(&pool),
        &Service::list_by_rank(&pool),
        &Setting::all(&pool),
    );
    assert!(!grid.contains(&format!("<button data-filter=\"ser-{}\"", sid)));
}

// ═══════════════════════════════════════════════════════════
// Industries
// ═══════════════════════════════════════════════════════════

#[test]
fn industry_find_or_create_is_idempotent() {
    let pool = test_pool();
    let a = Industry::find_or_create(&pool, "Fintech").unwrap();
    let b = Industry::find_or_create(&pool, "Fintech").unwrap();
    assert_eq!(a, b);
    assert_eq!(Industry::list(&pool).len(), 1);
}

#[test]
fn industry_with_projects_excludes_untagged() {
    let pool = test_pool();
    let tagged = Industry::find_or_create(&pool, "Hospitality").unwrap();
    Industry::find_or_create(&pool, "Nobody Uses This").unwrap();
    let pid = make_project(&pool, "Hotel Site");
    Industry::set_for_project(&pool, pid, &[tagged]).unwrap();

    let with = Industry::with_projects(&pool);
    assert_eq!(with.len(), 1);
    assert_eq!(with[0].slug, "hospitality");
}

#[test]
fn industry_set_for_project_replaces_prior_tags() {
    let pool = test_pool();
    let pid = make_project(&pool, "Campaign");
    let a = Industry::find_or_create(&pool, "Auto").unwrap();
    let b = Industry::find_or_create(&pool, "Aviation").unwrap();
    Industry::set_for_project(&pool, pid, &[a]).unwrap();
    Industry::set_for_project(&pool, pid, &[b]).unwrap();

    let tags = Industry::for_project(&pool, pid);
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].slug, "aviation");
}

// ═══════════════════════════════════════════════════════════
// Service grid
// ═══════════════════════════════════════════════════════════

#[test]
fn explore_url_prefers_custom_link() {
    let pool = test_pool();
    let sid = make_service(&pool, "SEO Audits", 1);
    Service::update_meta(&pool, sid, "", "https://example.com/audits").unwrap();

    let service = Service::find_by_id(&pool, sid).unwrap();
    assert_eq!(service.explore_url(), "https://example.com/audits");

    // Both the image anchor and the primary button carry the custom link,
    // the own permalink appears nowhere.
    let grid = render::render_service_grid(&[service], &Setting::all(&pool));
    assert_eq!(grid.matches("https://example.com/audits").count(), 2);
    assert!(!grid.contains("/services/seo-audits"));
}

#[test]
fn explore_url_falls_back_to_permalink() {
    let pool = test_pool();
    let sid = make_service(&pool, "SEO Audits", 1);
    let service = Service::find_by_id(&pool, sid).unwrap();
    assert_eq!(service.explore_url(), "/services/seo-audits");

    let grid = render::render_service_grid(&[service], &Setting::all(&pool));
    assert_eq!(grid.matches("/services/seo-audits").count(), 2);
}

#[test]
fn service_grid_contact_button_uses_setting() {
    let pool = test_pool();
    Setting::set(&pool, "contact_url", "https://example.com/contact").unwrap();
    Setting::set(&pool, "label_contact", "Talk To Us").unwrap();
    let sid = make_service(&pool, "Design", 1);
    let service = Service::find_by_id(&pool, sid).unwrap();

    let grid = render::render_service_grid(&[service], &Setting::all(&pool));
    assert!(grid.contains("https://example.com/contact"));
    assert!(grid.contains("Talk To Us"));
}

#[test]
fn services_listed_in_rank_order() {
    let pool = test_pool();
    make_service(&pool, "Zeta", 2);
    make_service(&pool, "Alpha", 1);
    make_service(&pool, "Omega", 3);

    let titles: Vec<String> = Service::list_by_rank(&pool)
        .into_iter()
        .map(|s| s.title)
        .collect();
    assert_eq!(titles, vec!["Alpha", "Zeta", "Omega"]);
}

// ═══════════════════════════════════════════════════════════
// Project grid markup
// ═══════════════════════════════════════════════════════════

#[test]
fn project_grid_embeds_tokens_as_classes_and_data_attributes() {
    let pool = test_pool();
    let sid = make_service(&pool, "Branding", 1);
    let pid = make_project(&pool, "Acme Rebrand");
    let ind = Industry::find_or_create(&pool, "Retail").unwrap();
    Industry::set_for_project(&pool, pid, &[ind]).unwrap();
    Project::update_meta(&pool, pid, Some(sid), "", "").unwrap();

    let project = Project::find_by_id(&pool, pid).unwrap();
    let industries = Industry::for_project(&pool, pid);
    let grid = render::render_project_grid(
        &[(project, industries)],
        &Industry::with_projects(&pool),
        &Service::list_by_rank(&pool),
        &Setting::all(&pool),
    );

    assert!(grid.contains(&format!("class=\"vt-card ind-retail ser-{}\"", sid)));
    assert!(grid.contains("data-industries=\"ind-retail\""));
    assert!(grid.contains(&format!("data-service=\"ser-{}\"", sid)));
    // Both filter groups with their implicit "all" buttons
    assert!(grid.contains("vt-filter-industries"));
    assert!(grid.contains("vt-filter-services"));
    assert_eq!(
        grid.matches("<button data-filter=\"all\" class=\"active\">")
            .count(),
        2
    );
    assert!(grid.contains("<button data-filter=\"ind-retail\">"));
    // The inline filter script ships with the fragment
    assert!(grid.contains("activeIndustry"));
}

#[test]
fn untagged_project_still_rendered_in_grid() {
    let pool = test_pool();
    let pid = make_project(&pool, "Mystery Work");
    let project = Project::find_by_id(&pool, pid).unwrap();

    let grid = render::render_project_grid(
        &[(project, vec![])],
        &[],
        &[],
        &Setting::all(&pool),
    );
    assert!(grid.contains("Mystery Work"));
    assert!(grid.contains("data-industries=\"\""));
    assert!(grid.contains("data-service=\"\""));
}

// ═══════════════════════════════════════════════════════════
// Detail pages
// ═══════════════════════════════════════════════════════════

#[test]
fn sidebar_limits_to_five_recent_excluding_self() {
    let pool = test_pool();
    let mut ids = Vec::new();
    for i in 0..7 {
        let id = make_project(&pool, &format!("Project {}", i));
        set_created_at(&pool, "projects", id, &format!("2026-01-0{} 12:00:00", i + 1));
        ids.push(id);
    }
    let current = ids[6]; // the newest one

    let others = Project::recent_others(&pool, current, 5);
    assert_eq!(others.len(), 5);
    assert!(others.iter().all(|p| p.id != current));
    // Most recent first
    let titles: Vec<String> = others.into_iter().map(|p| p.title).collect();
    assert_eq!(
        titles,
        vec!["Project 5", "Project 4", "Project 3", "Project 2", "Project 1"]
    );
}

#[test]
fn detail_renders_two_columns_with_sidebar_links() {
    let settings = HashMap::new();
    let sidebar = vec![("Other Work".to_string(), "/projects/other-work".to_string())];
    let html = render::render_detail(
        "Acme Rebrand",
        "<p>Body</p>",
        ContentSource::HostRendered,
        "More Projects",
        &sidebar,
        &settings,
    );
    assert!(html.contains("vt-detail"));
    assert!(html.contains("vt-sidebar"));
    assert!(html.contains("<a href=\"/projects/other-work\">Other Work</a>"));
}

#[test]
fn builder_content_bypasses_takeover_layout() {
    let body = "<div data-gjs-type=\"wrapper\"><p>Built visually</p></div>";
    assert_eq!(
        ContentSource::classify(Some(body)),
        ContentSource::BuilderRendered
    );

    let html = render::render_detail(
        "Acme",
        body,
        ContentSource::BuilderRendered,
        "More Projects",
        &[("X".to_string(), "/x".to_string())],
        &HashMap::new(),
    );
    assert!(html.contains("vt-builder-content"));
    assert!(!html.contains("vt-sidebar"));
}

#[test]
fn content_source_classification() {
    assert_eq!(ContentSource::classify(None), ContentSource::Empty);
    assert_eq!(ContentSource::classify(Some("   ")), ContentSource::Empty);
    assert_eq!(
        ContentSource::classify(Some("Real words")),
        ContentSource::HostRendered
    );
    assert_eq!(
        ContentSource::classify(Some("<section class=\"gjs-block\">x</section>")),
        ContentSource::BuilderRendered
    );
}

// ═══════════════════════════════════════════════════════════
// Body fallback (§ content injection)
// ═══════════════════════════════════════════════════════════

fn service_with_body(body: Option<&str>, full: Option<&str>) -> Service {
    let pool = test_pool();
    let id = Service::create(
        &pool,
        &ServiceForm {
            title: "T".to_string(),
            slug: "t".to_string(),
            rank: None,
            featured_image: None,
            body: body.map(|s| s.to_string()),
            full_description: full.map(|s| s.to_string()),
        },
    )
    .unwrap();
    Service::find_by_id(&pool, id).unwrap()
}

fn project_with_body(body: Option<&str>, full: Option<&str>) -> Project {
    let pool = test_pool();
    let id = Project::create(
        &pool,
        &ProjectForm {
            title: "T".to_string(),
            slug: "t".to_string(),
            featured_image: None,
            body: body.map(|s| s.to_string()),
            full_description: full.map(|s| s.to_string()),
        },
    )
    .unwrap();
    Project::find_by_id(&pool, id).unwrap()
}

#[test]
fn project_empty_body_falls_back_to_full_description() {
    let p = project_with_body(Some("   "), Some("Two lines here.\n\nSecond paragraph."));
    let html = render::resolve_project_body(&p);
    assert!(html.contains("<p>Two lines here.</p>"));
    assert!(html.contains("<p>Second paragraph.</p>"));
}

#[test]
fn project_with_body_never_falls_back() {
    let p = project_with_body(Some("Actual body"), Some("Fallback"));
    let html = render::resolve_project_body(&p);
    assert!(html.contains("Actual body"));
    assert!(!html.contains("Fallback"));
}

#[test]
fn service_whitespace_body_short_circuits_before_fallback() {
    // A service with ANY stored body — even whitespace — never receives
    // the fallback text; only a never-set body does.
    let s = service_with_body(Some("   "), Some("Fallback text"));
    let html = render::resolve_service_body(&s);
    assert!(!html.contains("Fallback text"));

    let s = service_with_body(None, Some("Fallback text"));
    let html = render::resolve_service_body(&s);
    assert!(html.contains("<p>Fallback text</p>"));
}

// ═══════════════════════════════════════════════════════════
// Anti-forgery tokens
// ═══════════════════════════════════════════════════════════

#[test]
fn form_token_is_single_use() {
    let pool = test_pool();
    let token = FormToken::issue(&pool).unwrap();
    assert!(FormToken::consume(&pool, &token));
    assert!(!FormToken::consume(&pool, &token));
}

#[test]
fn form_token_rejects_unknown_and_empty() {
    let pool = test_pool();
    assert!(!FormToken::consume(&pool, "not-a-real-token"));
    assert!(!FormToken::consume(&pool, ""));
}

#[test]
fn invalid_token_leaves_metadata_unchanged() {
    let pool = test_pool();
    let sid = make_service(&pool, "Design", 1);
    Service::update_meta(&pool, sid, "Original paragraph", "https://example.com").unwrap();

    // The save path checks the token before touching anything; an invalid
    // token means no write at all.
    if FormToken::consume(&pool, "forged") {
        Service::update_meta(&pool, sid, "Attacker text", "").unwrap();
    }

    let service = Service::find_by_id(&pool, sid).unwrap();
    assert_eq!(service.seo_paragraph, "Original paragraph");
    assert_eq!(service.custom_link, "https://example.com");
}

// ═══════════════════════════════════════════════════════════
// URL sanitization
// ═══════════════════════════════════════════════════════════

#[test]
fn sanitize_url_keeps_http_and_https() {
    assert_eq!(
        sanitize_url(" https://example.com/x "),
        "https://example.com/x"
    );
    assert_eq!(sanitize_url("http://example.com"), "http://example.com");
}

#[test]
fn sanitize_url_rejects_other_schemes() {
    assert_eq!(sanitize_url("javascript:alert(1)"), "");
    assert_eq!(sanitize_url("not a url"), "");
    assert_eq!(sanitize_url(""), "");
}

// ═══════════════════════════════════════════════════════════
// Shortcodes & page chrome
// ═══════════════════════════════════════════════════════════

#[test]
fn shortcodes_expand_in_place() {
    let html = format!(
        "<p>Intro</p>{}<p>Mid</p>{}",
        render::PROJECTS_GRID_SHORTCODE,
        render::SERVICES_GRID_SHORTCODE
    );
    let out = render::expand_shortcodes(&html, "<div>PGRID</div>", "<div>SGRID</div>");
    assert!(out.contains("<div>PGRID</div>"));
    assert!(out.contains("<div>SGRID</div>"));
    assert!(!out.contains("[agency_"));
}

#[test]
fn page_chrome_inlines_fresh_stylesheet() {
    let mut settings = HashMap::new();
    settings.insert("site_name".to_string(), "Studio North".to_string());
    settings.insert("theme_primary_color".to_string(), "#abcdef".to_string());
    let fonts = vec!["/uploads/fonts/inter.woff2".to_string()];

    let html = render::render_page(&settings, &fonts, "Projects", "Case studies", "<p>x</p>");
    assert!(html.contains("<title>Projects — Studio North</title>"));
    assert!(html.contains("--vt-primary: #abcdef;"));
    assert!(html.contains("@font-face"));
    assert!(html.contains("meta name=\"description\" content=\"Case studies\""));
}

#[test]
fn markdown_bodies_are_auto_paragraphed() {
    let html = render::markdown_to_html("First line.\n\nSecond line.");
    assert_eq!(html.matches("<p>").count(), 2);
}
