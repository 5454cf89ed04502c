use std::collections::HashMap;

use rocket::form::Form;
use rocket::fs::TempFile;
use rocket::response::content::RawHtml;
use rocket::response::Redirect;
use rocket::State;

use crate::db::{DbPool, SETTING_DEFAULTS};
use crate::models::industry::Industry;
use crate::models::project::{Project, ProjectForm};
use crate::models::service::{Service, ServiceForm};
use crate::models::settings::Setting;
use crate::models::token::FormToken;
use crate::render::html_escape;

/// Setting names whose values are URLs and get sanitized on save.
const URL_SETTINGS: &[&str] = &["contact_url"];

/// Keep http(s) URLs verbatim, empty out anything else. Mirrors the
/// host-level sanitization the settings and metadata forms rely on;
/// no other validation happens on stored values.
pub(crate) fn sanitize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    match url::Url::parse(trimmed) {
        Ok(u) if u.scheme() == "http" || u.scheme() == "https" => trimmed.to_string(),
        _ => String::new(),
    }
}

fn none_if_empty(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.trim().is_empty())
}

// ── Admin chrome ───────────────────────────────────────

fn admin_page(title: &str, body: &str) -> RawHtml<String> {
    RawHtml(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{title} — Vitrine Admin</title>
    <style>
        body {{ font-family: system-ui, sans-serif; margin: 0; color: #1a1a1a; }}
        header {{ background: #17212b; color: #fff; padding: 12px 24px; }}
        header a {{ color: #9fc3b3; margin-right: 16px; text-decoration: none; }}
        main {{ max-width: 860px; margin: 24px auto; padding: 0 16px; }}
        label {{ display: block; margin: 12px 0 4px; font-weight: 600; }}
        input[type=text], input[type=number], textarea, select {{ width: 100%; padding: 6px; }}
        button {{ margin-top: 16px; padding: 8px 18px; }}
        table {{ border-collapse: collapse; width: 100%; }}
        td, th {{ border-bottom: 1px solid #ddd; padding: 6px 8px; text-align: left; }}
    </style>
</head>
<body>
    <header>
        <a href="/admin/settings">Settings</a>
        <a href="/admin/services">Services</a>
        <a href="/admin/projects">Projects</a>
        <a href="/admin/industries">Industries</a>
        <a href="/admin/media">Media</a>
        <a href="/">View Site</a>
    </header>
    <main>
    <h1>{title}</h1>
{body}
    </main>
</body>
</html>"#,
        title = html_escape(title),
        body = body,
    ))
}

// ── Settings ───────────────────────────────────────────

#[get("/settings")]
pub fn settings_page(pool: &State<DbPool>) -> RawHtml<String> {
    let mut body = String::from("<form method=\"post\" action=\"/admin/settings\">\n");

    // One input per declared setting; the uploads-managed font list and
    // the media allow-list are shown elsewhere.
    for (key, _) in SETTING_DEFAULTS {
        if *key == "custom_fonts" || *key == "media_allowed_types" {
            continue;
        }
        let value = Setting::get_or_default(pool, key);
        body.push_str(&format!(
            "<label for=\"{key}\">{key}</label>\n<input type=\"text\" id=\"{key}\" name=\"{key}\" value=\"{value}\">\n",
            key = key,
            value = html_escape(&value),
        ));
    }
    body.push_str("<button type=\"submit\">Save Settings</button>\n</form>\n");

    let fonts = Setting::custom_fonts(pool);
    if !fonts.is_empty() {
        body.push_str("<h2>Custom Fonts</h2>\n<ul>\n");
        for f in fonts {
            body.push_str(&format!("<li>{}</li>\n", html_escape(&f)));
        }
        body.push_str("</ul>\n");
    }

    admin_page("Settings", &body)
}

#[post("/settings", data = "<form>")]
pub fn settings_save(pool: &State<DbPool>, form: Form<HashMap<String, String>>) -> Redirect {
    let mut data = form.into_inner();

    for key in URL_SETTINGS {
        if let Some(v) = data.get_mut(*key) {
            *v = sanitize_url(v);
        }
    }

    if let Err(e) = Setting::set_many(pool, &data) {
        log::error!("settings save failed: {}", e);
    }

    Redirect::to("/admin/settings")
}

// ── Services ───────────────────────────────────────────

#[get("/services")]
pub fn services_list(pool: &State<DbPool>) -> RawHtml<String> {
    let mut body = String::from(
        "<p><a href=\"/admin/services/new\">New Service</a></p>\n<table>\n<tr><th>Rank</th><th>Title</th><th></th></tr>\n",
    );
    for s in Service::list_by_rank(pool) {
        body.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>\
             <a href=\"/admin/services/{}/edit\">Edit</a> \
             <a href=\"/admin/services/{}/meta\">Metadata</a>\
             <form method=\"post\" action=\"/admin/services/{}/delete\" style=\"display:inline\"><button>Delete</button></form>\
             </td></tr>\n",
            s.rank,
            html_escape(&s.title),
            s.id,
            s.id,
            s.id,
        ));
    }
    body.push_str("</table>\n");
    admin_page("Services", &body)
}

#[derive(FromForm)]
pub struct ServiceFormData {
    pub title: String,
    pub slug: Option<String>,
    pub rank: Option<i64>,
    pub featured_image: Option<String>,
    pub body: Option<String>,
    pub full_description: Option<String>,
}

fn service_form_html(service: Option<&Service>) -> String {
    let g = |f: fn(&Service) -> String| service.map(f).unwrap_or_default();
    format!(
        r#"<label>Title</label><input type="text" name="title" value="{title}">
<label>Slug (blank to derive from title)</label><input type="text" name="slug" value="{slug}">
<label>Rank</label><input type="number" name="rank" value="{rank}">
<label>Featured image path</label><input type="text" name="featured_image" value="{image}">
<label>Body (markdown)</label><textarea name="body" rows="10">{body}</textarea>
<label>Full description (fallback body)</label><textarea name="full_description" rows="5">{full}</textarea>
<button type="submit">Save</button>"#,
        title = html_escape(&g(|s| s.title.clone())),
        slug = html_escape(&g(|s| s.slug.clone())),
        rank = service.map(|s| s.rank).unwrap_or(0),
        image = html_escape(&g(|s| s.featured_image.clone().unwrap_or_default())),
        body = html_escape(&g(|s| s.body.clone().unwrap_or_default())),
        full = html_escape(&g(|s| s.full_description.clone().unwrap_or_default())),
    )
}

fn service_form_from_data(data: &ServiceFormData) -> ServiceForm {
    let slug = match none_if_empty(data.slug.clone()) {
        Some(s) => s,
        None => slug::slugify(&data.title),
    };
    ServiceForm {
        title: data.title.clone(),
        slug,
        rank: data.rank,
        featured_image: none_if_empty(data.featured_image.clone()),
        body: none_if_empty(data.body.clone()),
        full_description: none_if_empty(data.full_description.clone()),
    }
}

#[get("/services/new")]
pub fn service_new(_pool: &State<DbPool>) -> RawHtml<String> {
    let body = format!(
        "<form method=\"post\" action=\"/admin/services/new\">\n{}\n</form>",
        service_form_html(None)
    );
    admin_page("New Service", &body)
}

#[post("/services/new", data = "<form>")]
pub fn service_create(pool: &State<DbPool>, form: Form<ServiceFormData>) -> Redirect {
    match Service::create(pool, &service_form_from_data(&form)) {
        Ok(id) => log::info!("service {} created", id),
        Err(e) => log::error!("service create failed: {}", e),
    }
    Redirect::to("/admin/services")
}

#[get("/services/<id>/edit")]
pub fn service_edit(pool: &State<DbPool>, id: i64) -> Option<RawHtml<String>> {
    let service = Service::find_by_id(pool, id)?;
    let body = format!(
        "<form method=\"post\" action=\"/admin/services/{}/edit\">\n{}\n</form>",
        id,
        service_form_html(Some(&service))
    );
    Some(admin_page("Edit Service", &body))
}

#[post("/services/<id>/edit", data = "<form>")]
pub fn service_update(pool: &State<DbPool>, id: i64, form: Form<ServiceFormData>) -> Redirect {
    if let Err(e) = Service::update(pool, id, &service_form_from_data(&form)) {
        log::error!("service {} update failed: {}", id, e);
    }
    Redirect::to("/admin/services")
}

#[post("/services/<id>/delete")]
pub fn service_delete(pool: &State<DbPool>, id: i64) -> Redirect {
    if let Err(e) = Service::delete(pool, id) {
        log::error!("service {} delete failed: {}", id, e);
    }
    Redirect::to("/admin/services")
}

// ── Service metadata (token-gated) ─────────────────────

#[derive(FromForm)]
pub struct ServiceMetaFormData {
    pub _token: String,
    pub service_seo_paragraph: String,
    pub service_custom_link: String,
}

#[get("/services/<id>/meta")]
pub fn service_meta(pool: &State<DbPool>, id: i64) -> Option<RawHtml<String>> {
    let service = Service::find_by_id(pool, id)?;
    let token = FormToken::issue(pool)?;
    let body = format!(
        r#"<form method="post" action="/admin/services/{id}/meta">
<input type="hidden" name="_token" value="{token}">
<label>SEO paragraph</label><textarea name="service_seo_paragraph" rows="4">{seo}</textarea>
<label>Custom redirect link (blank = own detail page)</label><input type="text" name="service_custom_link" value="{link}">
<button type="submit">Save Metadata</button>
</form>"#,
        id = id,
        token = token,
        seo = html_escape(&service.seo_paragraph),
        link = html_escape(&service.custom_link),
    );
    Some(admin_page(
        &format!("Service Metadata — {}", service.title),
        &body,
    ))
}

#[post("/services/<id>/meta", data = "<form>")]
pub fn service_meta_save(
    pool: &State<DbPool>,
    id: i64,
    form: Form<ServiceMetaFormData>,
) -> Redirect {
    // The token is the one hard gate: a missing or invalid token skips the
    // whole save with no partial write and no visible error.
    if !FormToken::consume(pool, &form._token) {
        log::warn!("service {} metadata save skipped: invalid form token", id);
        return Redirect::to(format!("/admin/services/{}/meta", id));
    }

    let link = sanitize_url(&form.service_custom_link);
    if let Err(e) = Service::update_meta(pool, id, &form.service_seo_paragraph, &link) {
        log::error!("service {} metadata save failed: {}", id, e);
    }
    Redirect::to(format!("/admin/services/{}/meta", id))
}

// ── Projects ───────────────────────────────────────────

#[get("/projects")]
pub fn projects_list(pool: &State<DbPool>) -> RawHtml<String> {
    let mut body = String::from(
        "<p><a href=\"/admin/projects/new\">New Project</a></p>\n<table>\n<tr><th>Title</th><th></th></tr>\n",
    );
    for p in Project::list_all(pool) {
        body.push_str(&format!(
            "<tr><td>{}</td><td>\
             <a href=\"/admin/projects/{}/edit\">Edit</a> \
             <a href=\"/admin/projects/{}/meta\">Metadata</a>\
             <form method=\"post\" action=\"/admin/projects/{}/delete\" style=\"display:inline\"><button>Delete</button></form>\
             </td></tr>\n",
            html_escape(&p.title),
            p.id,
            p.id,
            p.id,
        ));
    }
    body.push_str("</table>\n");
    admin_page("Projects", &body)
}

#[derive(FromForm)]
pub struct ProjectFormData {
    pub title: String,
    pub slug: Option<String>,
    pub featured_image: Option<String>,
    pub body: Option<String>,
    pub full_description: Option<String>,
}

fn project_form_html(project: Option<&Project>) -> String {
    let g = |f: fn(&Project) -> String| project.map(f).unwrap_or_default();
    format!(
        r#"<label>Title</label><input type="text" name="title" value="{title}">
<label>Slug (blank to derive from title)</label><input type="text" name="slug" value="{slug}">
<label>Featured image path</label><input type="text" name="featured_image" value="{image}">
<label>Body (markdown)</label><textarea name="body" rows="10">{body}</textarea>
<label>Full description (fallback body)</label><textarea name="full_description" rows="5">{full}</textarea>
<button type="submit">Save</button>"#,
        title = html_escape(&g(|p| p.title.clone())),
        slug = html_escape(&g(|p| p.slug.clone())),
        image = html_escape(&g(|p| p.featured_image.clone().unwrap_or_default())),
        body = html_escape(&g(|p| p.body.clone().unwrap_or_default())),
        full = html_escape(&g(|p| p.full_description.clone().unwrap_or_default())),
    )
}

fn project_form_from_data(data: &ProjectFormData) -> ProjectForm {
    let slug = match none_if_empty(data.slug.clone()) {
        Some(s) => s,
        None => slug::slugify(&data.title),
    };
    ProjectForm {
        title: data.title.clone(),
        slug,
        featured_image: none_if_empty(data.featured_image.clone()),
        body: none_if_empty(data.body.clone()),
        full_description: none_if_empty(data.full_description.clone()),
    }
}

#[get("/projects/new")]
pub fn project_new(_pool: &State<DbPool>) -> RawHtml<String> {
    let body = format!(
        "<form method=\"post\" action=\"/admin/projects/new\">\n{}\n</form>",
        project_form_html(None)
    );
    admin_page("New Project", &body)
}

#[post("/projects/new", data = "<form>")]
pub fn project_create(pool: &State<DbPool>, form: Form<ProjectFormData>) -> Redirect {
    match Project::create(pool, &project_form_from_data(&form)) {
        Ok(id) => log::info!("project {} created", id),
        Err(e) => log::error!("project create failed: {}", e),
    }
    Redirect::to("/admin/projects")
}

#[get("/projects/<id>/edit")]
pub fn project_edit(pool: &State<DbPool>, id: i64) -> Option<RawHtml<String>> {
    let project = Project::find_by_id(pool, id)?;
    let body = format!(
        "<form method=\"post\" action=\"/admin/projects/{}/edit\">\n{}\n</form>",
        id,
        project_form_html(Some(&project))
    );
    Some(admin_page("Edit Project", &body))
}

#[post("/projects/<id>/edit", data = "<form>")]
pub fn project_update(pool: &State<DbPool>, id: i64, form: Form<ProjectFormData>) -> Redirect {
    if let Err(e) = Project::update(pool, id, &project_form_from_data(&form)) {
        log::error!("project {} update failed: {}", id, e);
    }
    Redirect::to("/admin/projects")
}

#[post("/projects/<id>/delete")]
pub fn project_delete(pool: &State<DbPool>, id: i64) -> Redirect {
    if let Err(e) = Project::delete(pool, id) {
        log::error!("project {} delete failed: {}", id, e);
    }
    Redirect::to("/admin/projects")
}

// ── Project metadata (token-gated) ─────────────────────

#[derive(FromForm)]
pub struct ProjectMetaFormData {
    pub _token: String,
    pub linked_service_id: Option<String>,
    pub project_live_url: String,
    pub project_seo_caption: String,
    /// Comma-separated industry names, created ad hoc as needed.
    pub industries: Option<String>,
}

#[get("/projects/<id>/meta")]
pub fn project_meta(pool: &State<DbPool>, id: i64) -> Option<RawHtml<String>> {
    let project = Project::find_by_id(pool, id)?;
    let token = FormToken::issue(pool)?;

    let mut service_options = String::from("<option value=\"\">— none —</option>\n");
    for s in Service::list_by_rank(pool) {
        let selected = if project.service_id == Some(s.id) {
            " selected"
        } else {
            ""
        };
        service_options.push_str(&format!(
            "<option value=\"{}\"{}>{}</option>\n",
            s.id,
            selected,
            html_escape(&s.title)
        ));
    }

    let industry_names = Industry::for_project(pool, id)
        .iter()
        .map(|i| i.name.clone())
        .collect::<Vec<_>>()
        .join(", ");

    let body = format!(
        r#"<form method="post" action="/admin/projects/{id}/meta">
<input type="hidden" name="_token" value="{token}">
<label>Linked service</label><select name="linked_service_id">{options}</select>
<label>Live site URL</label><input type="text" name="project_live_url" value="{live}">
<label>SEO caption</label><textarea name="project_seo_caption" rows="3">{seo}</textarea>
<label>Industries (comma separated, created as needed)</label><input type="text" name="industries" value="{industries}">
<button type="submit">Save Metadata</button>
</form>"#,
        id = id,
        token = token,
        options = service_options,
        live = html_escape(&project.live_url),
        seo = html_escape(&project.seo_caption),
        industries = html_escape(&industry_names),
    );
    Some(admin_page(
        &format!("Project Metadata — {}", project.title),
        &body,
    ))
}

#[post("/projects/<id>/meta", data = "<form>")]
pub fn project_meta_save(
    pool: &State<DbPool>,
    id: i64,
    form: Form<ProjectMetaFormData>,
) -> Redirect {
    if !FormToken::consume(pool, &form._token) {
        log::warn!("project {} metadata save skipped: invalid form token", id);
        return Redirect::to(format!("/admin/projects/{}/meta", id));
    }

    let service_id = form
        .linked_service_id
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .and_then(|s| s.trim().parse::<i64>().ok());
    let live_url = sanitize_url(&form.project_live_url);

    if let Err(e) = Project::update_meta(pool, id, service_id, &live_url, &form.project_seo_caption)
    {
        log::error!("project {} metadata save failed: {}", id, e);
        return Redirect::to(format!("/admin/projects/{}/meta", id));
    }

    if let Some(ref names) = form.industries {
        let industry_ids: Vec<i64> = names
            .split(',')
            .filter_map(|n| {
                let n = n.trim();
                if n.is_empty() {
                    return None;
                }
                Industry::find_or_create(pool, n).ok()
            })
            .collect();
        let _ = Industry::set_for_project(pool, id, &industry_ids);
    }

    Redirect::to(format!("/admin/projects/{}/meta", id))
}

// ── Industries ─────────────────────────────────────────

#[get("/industries")]
pub fn industries_list(pool: &State<DbPool>) -> RawHtml<String> {
    let mut body = String::from(
        "<p>Industries are created from the project metadata form; delete stray ones here.</p>\n\
         <table>\n<tr><th>Name</th><th>Slug</th><th></th></tr>\n",
    );
    for i in Industry::list(pool) {
        body.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>\
             <form method=\"post\" action=\"/admin/industries/{}/delete\" style=\"display:inline\"><button>Delete</button></form>\
             </td></tr>\n",
            html_escape(&i.name),
            html_escape(&i.slug),
            i.id,
        ));
    }
    body.push_str("</table>\n");
    admin_page("Industries", &body)
}

#[post("/industries/<id>/delete")]
pub fn industry_delete(pool: &State<DbPool>, id: i64) -> Redirect {
    if let Err(e) = Industry::delete(pool, id) {
        log::error!("industry {} delete failed: {}", id, e);
    }
    Redirect::to("/admin/industries")
}

// ── Media ──────────────────────────────────────────────

#[get("/media")]
pub fn media_page(pool: &State<DbPool>) -> RawHtml<String> {
    let allowed = Setting::get_or_default(pool, "media_allowed_types");
    let mut body = format!(
        r#"<form method="post" action="/admin/media" enctype="multipart/form-data">
<label>File ({allowed})</label><input type="file" name="file">
<button type="submit">Upload</button>
</form>"#,
        allowed = html_escape(&allowed),
    );

    let fonts = Setting::custom_fonts(pool);
    if !fonts.is_empty() {
        body.push_str("<h2>Custom Fonts</h2>\n<ul>\n");
        for f in fonts {
            body.push_str(&format!("<li>{}</li>\n", html_escape(&f)));
        }
        body.push_str("</ul>\n");
    }

    admin_page("Media", &body)
}

#[derive(FromForm)]
pub struct MediaUploadForm<'f> {
    pub file: TempFile<'f>,
}

const FONT_EXTENSIONS: &[&str] = &["woff", "woff2", "ttf"];

fn upload_extension(file: &TempFile<'_>) -> Option<String> {
    file.raw_name()
        .map(|rn| rn.dangerous_unsafe_unsanitized_raw().as_str().to_string())
        .and_then(|s| s.rsplit('.').next().map(|e| e.to_lowercase()))
        .or_else(|| {
            file.content_type()
                .and_then(|ct| ct.extension())
                .map(|e| e.to_string().to_lowercase())
        })
}

#[post("/media", data = "<form>")]
pub async fn media_upload(pool: &State<DbPool>, mut form: Form<MediaUploadForm<'_>>) -> Redirect {
    let ext = match upload_extension(&form.file) {
        Some(e) => e,
        None => return Redirect::to("/admin/media"),
    };

    let allowed = Setting::get_or_default(pool, "media_allowed_types");
    if !allowed
        .split(',')
        .any(|a| a.trim().eq_ignore_ascii_case(&ext))
    {
        log::warn!("upload rejected: extension '{}' not allow-listed", ext);
        return Redirect::to("/admin/media");
    }

    let base = form
        .file
        .raw_name()
        .map(|rn| rn.dangerous_unsafe_unsanitized_raw().as_str().to_string())
        .and_then(|s| {
            s.rsplit('/')
                .next()
                .and_then(|n| n.rsplit_once('.').map(|(b, _)| slug::slugify(b)))
        })
        .filter(|b| !b.is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let filename = format!("{}.{}", base, ext);

    let is_font = FONT_EXTENSIONS.contains(&ext.as_str());
    let (dir, url) = if is_font {
        (
            "website/uploads/fonts",
            format!("/uploads/fonts/{}", filename),
        )
    } else {
        ("website/uploads", format!("/uploads/{}", filename))
    };

    let _ = std::fs::create_dir_all(dir);
    if form
        .file
        .persist_to(std::path::Path::new(dir).join(&filename))
        .await
        .is_err()
    {
        log::error!("upload failed: could not persist {}", filename);
        return Redirect::to("/admin/media");
    }

    // A stored font becomes a custom font descriptor the theme turns into
    // an @font-face rule.
    if is_font {
        if let Err(e) = Setting::add_custom_font(pool, &url) {
            log::error!("could not record custom font {}: {}", url, e);
        }
    }

    Redirect::to("/admin/media")
}

#[get("/")]
pub fn admin_home() -> Redirect {
    Redirect::to("/admin/settings")
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        admin_home,
        settings_page,
        settings_save,
        services_list,
        service_new,
        service_create,
        service_edit,
        service_update,
        service_delete,
        service_meta,
        service_meta_save,
        projects_list,
        project_new,
        project_create,
        project_edit,
        project_update,
        project_delete,
        project_meta,
        project_meta_save,
        industries_list,
        industry_delete,
        media_page,
        media_upload,
    ]
}
