use rocket::response::content::RawHtml;
use rocket::State;

use crate::db::DbPool;
use crate::models::industry::Industry;
use crate::models::project::Project;
use crate::models::service::Service;
use crate::models::settings::Setting;
use crate::render;
use crate::render::ContentSource;

const SIDEBAR_LIMIT: i64 = 5;

fn project_grid_fragment(pool: &DbPool) -> String {
    let settings = Setting::all(pool);
    let projects: Vec<(Project, Vec<Industry>)> = Project::list_all(pool)
        .into_iter()
        .map(|p| {
            let industries = Industry::for_project(pool, p.id);
            (p, industries)
        })
        .collect();
    let industries = Industry::with_projects(pool);
    let services = Service::list_by_rank(pool);
    render::render_project_grid(&projects, &industries, &services, &settings)
}

fn service_grid_fragment(pool: &DbPool) -> String {
    let settings = Setting::all(pool);
    let services = Service::list_by_rank(pool);
    render::render_service_grid(&services, &settings)
}

/// Expand grid shortcodes inside a rendered body, computing each fragment
/// only when its marker is actually present.
fn expand_body_shortcodes(pool: &DbPool, body_html: String) -> String {
    let projects_grid = if body_html.contains(render::PROJECTS_GRID_SHORTCODE) {
        project_grid_fragment(pool)
    } else {
        String::new()
    };
    let services_grid = if body_html.contains(render::SERVICES_GRID_SHORTCODE) {
        service_grid_fragment(pool)
    } else {
        String::new()
    };
    render::expand_shortcodes(&body_html, &projects_grid, &services_grid)
}

// ── Homepage ───────────────────────────────────────────

#[get("/")]
pub fn homepage(pool: &State<DbPool>) -> RawHtml<String> {
    let settings = Setting::all(pool);
    let fonts = Setting::custom_fonts(pool);

    let body = format!(
        "<h1 class=\"vt-page-title\">Services</h1>\n{}\n<h1 class=\"vt-page-title\">Projects</h1>\n{}",
        service_grid_fragment(pool),
        project_grid_fragment(pool),
    );

    RawHtml(render::render_page(&settings, &fonts, "Home", "", &body))
}

// ── Grids ──────────────────────────────────────────────

#[get("/projects")]
pub fn projects_grid(pool: &State<DbPool>) -> RawHtml<String> {
    let settings = Setting::all(pool);
    let fonts = Setting::custom_fonts(pool);
    let body = format!(
        "<h1 class=\"vt-page-title\">Projects</h1>\n{}",
        project_grid_fragment(pool)
    );
    RawHtml(render::render_page(&settings, &fonts, "Projects", "", &body))
}

#[get("/services")]
pub fn services_grid(pool: &State<DbPool>) -> RawHtml<String> {
    let settings = Setting::all(pool);
    let fonts = Setting::custom_fonts(pool);
    let body = format!(
        "<h1 class=\"vt-page-title\">Services</h1>\n{}",
        service_grid_fragment(pool)
    );
    RawHtml(render::render_page(&settings, &fonts, "Services", "", &body))
}

// ── Detail pages ───────────────────────────────────────

#[get("/projects/<slug>", rank = 5)]
pub fn project_detail(pool: &State<DbPool>, slug: &str) -> Option<RawHtml<String>> {
    let project = Project::find_by_slug(pool, slug)?;
    let settings = Setting::all(pool);
    let fonts = Setting::custom_fonts(pool);

    let source = ContentSource::classify(project.body.as_deref());
    let body_html = expand_body_shortcodes(pool, render::resolve_project_body(&project));

    let sidebar: Vec<(String, String)> = Project::recent_others(pool, project.id, SIDEBAR_LIMIT)
        .into_iter()
        .map(|p| (p.title, format!("/projects/{}", p.slug)))
        .collect();

    let detail = render::render_detail(
        &project.title,
        &body_html,
        source,
        "More Projects",
        &sidebar,
        &settings,
    );

    Some(RawHtml(render::render_page(
        &settings,
        &fonts,
        &project.title,
        &project.seo_caption,
        &detail,
    )))
}

#[get("/services/<slug>", rank = 5)]
pub fn service_detail(pool: &State<DbPool>, slug: &str) -> Option<RawHtml<String>> {
    let service = Service::find_by_slug(pool, slug)?;
    let settings = Setting::all(pool);
    let fonts = Setting::custom_fonts(pool);

    let source = ContentSource::classify(service.body.as_deref());
    let body_html = expand_body_shortcodes(pool, render::resolve_service_body(&service));

    let sidebar: Vec<(String, String)> = Service::recent_others(pool, service.id, SIDEBAR_LIMIT)
        .into_iter()
        .map(|s| (s.title, format!("/services/{}", s.slug)))
        .collect();

    let detail = render::render_detail(
        &service.title,
        &body_html,
        source,
        "More Services",
        &sidebar,
        &settings,
    );

    Some(RawHtml(render::render_page(
        &settings,
        &fonts,
        &service.title,
        &service.seo_paragraph,
        &detail,
    )))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        homepage,
        projects_grid,
        services_grid,
        project_detail,
        service_detail,
    ]
}
