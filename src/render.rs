use std::collections::HashMap;

use pulldown_cmark::{html, Parser};

use crate::filter::{CardTokens, FILTER_JS};
use crate::models::industry::Industry;
use crate::models::project::Project;
use crate::models::service::Service;
use crate::theme;

pub const PROJECTS_GRID_SHORTCODE: &str = "[agency_projects_grid]";
pub const SERVICES_GRID_SHORTCODE: &str = "[agency_services_archive]";

/// Structural markers a visual page-builder leaves in content it produced.
/// Bodies carrying one of these bypass the detail takeover layout.
const BUILDER_MARKERS: &[&str] = &["data-gjs-", "gjs-block", "layout-builder"];

/// Where a stored body came from, decided once per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentSource {
    HostRendered,
    BuilderRendered,
    Empty,
}

impl ContentSource {
    pub fn classify(body: Option<&str>) -> Self {
        match body {
            Some(b) if BUILDER_MARKERS.iter().any(|m| b.contains(m)) => {
                ContentSource::BuilderRendered
            }
            Some(b) if !b.trim().is_empty() => ContentSource::HostRendered,
            _ => ContentSource::Empty,
        }
    }
}

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Markdown to HTML; plain paragraphs come out auto-paragraphed, which is
/// all the fallback descriptions need.
pub fn markdown_to_html(md: &str) -> String {
    let parser = Parser::new(md);
    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

fn fallback_body(full_description: Option<&str>) -> String {
    match full_description {
        Some(d) if !d.trim().is_empty() => markdown_to_html(d),
        _ => String::new(),
    }
}

/// Body HTML for a service detail page.
///
/// A service with any stored body short-circuits before the emptiness
/// check: even a whitespace-only body is rendered as-is and never replaced
/// by the fallback description. Only a never-set body falls through.
pub fn resolve_service_body(service: &Service) -> String {
    match service.body.as_deref() {
        Some(b) if ContentSource::classify(Some(b)) == ContentSource::BuilderRendered => {
            b.to_string()
        }
        Some(b) => markdown_to_html(b),
        None => fallback_body(service.full_description.as_deref()),
    }
}

/// Body HTML for a project detail page. Unlike services, projects are
/// judged purely on trimmed emptiness before the fallback kicks in.
pub fn resolve_project_body(project: &Project) -> String {
    match ContentSource::classify(project.body.as_deref()) {
        ContentSource::BuilderRendered => project.body.clone().unwrap_or_default(),
        ContentSource::HostRendered => markdown_to_html(project.body.as_deref().unwrap_or("")),
        ContentSource::Empty => fallback_body(project.full_description.as_deref()),
    }
}

fn sg<'a>(settings: &'a HashMap<String, String>, key: &str, def: &'a str) -> &'a str {
    settings.get(key).map(|v| v.as_str()).unwrap_or(def)
}

/// Wrap a body fragment in the full page chrome: head with the freshly
/// generated theme stylesheet, site header, footer.
pub fn render_page(
    settings: &HashMap<String, String>,
    font_urls: &[String],
    title: &str,
    meta_description: &str,
    body: &str,
) -> String {
    let site_name = sg(settings, "site_name", "Vitrine");
    let stylesheet = theme::build_stylesheet(settings, font_urls);
    let meta = if meta_description.is_empty() {
        String::new()
    } else {
        format!(
            "    <meta name=\"description\" content=\"{}\">\n",
            html_escape(meta_description)
        )
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} — {site_name}</title>
{meta}    <style>
{stylesheet}    </style>
</head>
<body>
    <header class="vt-header">
        <a href="/" class="vt-logo">{site_name}</a>
        <nav><a href="/services">Services</a> <a href="/projects">Projects</a></nav>
    </header>
    <main>
{body}
    </main>
    <footer class="vt-footer"><p>&copy; {year} {site_name}</p></footer>
</body>
</html>"#,
        title = html_escape(title),
        site_name = html_escape(site_name),
        meta = meta,
        stylesheet = stylesheet,
        body = body,
        year = chrono::Utc::now().format("%Y"),
    )
}

// ── Project grid ───────────────────────────────────────

/// The filterable project grid fragment: two filter button groups, one
/// card per project with its class tokens mirrored into data attributes,
/// and the inline filter script. The whole set is rendered; visibility is
/// recomputed client-side.
pub fn render_project_grid(
    projects: &[(Project, Vec<Industry>)],
    industries: &[Industry],
    services: &[Service],
    settings: &HashMap<String, String>,
) -> String {
    let mut out = String::new();

    out.push_str("<div class=\"vt-filters vt-filter-industries\">\n");
    out.push_str("<button data-filter=\"all\" class=\"active\">All Industries</button>\n");
    for industry in industries {
        out.push_str(&format!(
            "<button data-filter=\"ind-{}\">{}</button>\n",
            industry.slug,
            html_escape(&industry.name)
        ));
    }
    out.push_str("</div>\n");

    out.push_str("<div class=\"vt-filters vt-filter-services\">\n");
    out.push_str("<button data-filter=\"all\" class=\"active\">All Services</button>\n");
    for service in services {
        out.push_str(&format!(
            "<button data-filter=\"ser-{}\">{}</button>\n",
            service.id,
            html_escape(&service.title)
        ));
    }
    out.push_str("</div>\n");

    let label_view = sg(settings, "label_view_project", "View Project");
    let label_live = sg(settings, "label_view_live", "View Live Site");

    out.push_str("<div class=\"vt-grid vt-project-grid\">\n");
    for (project, project_industries) in projects {
        let tokens = CardTokens::for_project(project, project_industries);
        let classes = tokens.class_tokens().join(" ");
        let data_service = tokens.service.clone().unwrap_or_default();

        out.push_str(&format!(
            "<article class=\"vt-card {}\" data-industries=\"{}\" data-service=\"{}\">\n",
            classes,
            tokens.industries.join(" "),
            data_service,
        ));
        if let Some(ref image) = project.featured_image {
            out.push_str(&format!(
                "<a href=\"/projects/{}\"><img src=\"{}\" alt=\"{}\"></a>\n",
                project.slug,
                image,
                html_escape(&project.title)
            ));
        }
        out.push_str(&format!("<h3>{}</h3>\n", html_escape(&project.title)));
        if !project.seo_caption.is_empty() {
            out.push_str(&format!("<p>{}</p>\n", html_escape(&project.seo_caption)));
        }
        out.push_str(&format!(
            "<a class=\"vt-btn vt-btn-primary\" href=\"/projects/{}\">{}</a>\n",
            project.slug,
            html_escape(label_view)
        ));
        if !project.live_url.is_empty() {
            out.push_str(&format!(
                "<a class=\"vt-btn vt-btn-secondary\" href=\"{}\">{}</a>\n",
                project.live_url,
                html_escape(label_live)
            ));
        }
        out.push_str("</article>\n");
    }
    out.push_str("</div>\n");

    out.push_str(&format!("<script>{}</script>\n", FILTER_JS));
    out
}

// ── Service grid ───────────────────────────────────────

/// The service archive fragment. The explore destination (custom redirect
/// link when set, own permalink otherwise) goes on both the image anchor
/// and the primary button; the secondary button points at the configured
/// contact URL.
pub fn render_service_grid(services: &[Service], settings: &HashMap<String, String>) -> String {
    let label_explore = sg(settings, "label_explore", "Explore");
    let label_contact = sg(settings, "label_contact", "Contact Us");
    let contact_url = sg(settings, "contact_url", "");

    let mut out = String::new();
    out.push_str("<div class=\"vt-grid vt-service-grid\">\n");
    for service in services {
        let explore = service.explore_url();
        out.push_str("<article class=\"vt-card\">\n");
        if let Some(ref image) = service.featured_image {
            out.push_str(&format!(
                "<a href=\"{}\"><img src=\"{}\" alt=\"{}\"></a>\n",
                explore,
                image,
                html_escape(&service.title)
            ));
        }
        out.push_str(&format!("<h3>{}</h3>\n", html_escape(&service.title)));
        if !service.seo_paragraph.is_empty() {
            out.push_str(&format!("<p>{}</p>\n", html_escape(&service.seo_paragraph)));
        }
        out.push_str(&format!(
            "<a class=\"vt-btn vt-btn-primary\" href=\"{}\">{}</a>\n",
            explore,
            html_escape(label_explore)
        ));
        if !contact_url.is_empty() {
            out.push_str(&format!(
                "<a class=\"vt-btn vt-btn-secondary\" href=\"{}\">{}</a>\n",
                contact_url,
                html_escape(label_contact)
            ));
        }
        out.push_str("</article>\n");
    }
    out.push_str("</div>\n");
    out
}

// ── Detail pages ───────────────────────────────────────

/// Two-column detail layout: main column with title, body, and contact
/// call-to-action; sidebar with up to five other same-kind items, most
/// recent first, each linking to its own detail page.
///
/// Builder-rendered bodies skip this takeover and flow through the
/// default single-column layout instead.
pub fn render_detail(
    title: &str,
    body_html: &str,
    source: ContentSource,
    sidebar_heading: &str,
    sidebar_items: &[(String, String)],
    settings: &HashMap<String, String>,
) -> String {
    if source == ContentSource::BuilderRendered {
        return format!("<div class=\"vt-builder-content\">{}</div>\n", body_html);
    }

    let label_contact = sg(settings, "label_contact", "Contact Us");
    let contact_url = sg(settings, "contact_url", "");

    let mut sidebar = String::new();
    if !sidebar_items.is_empty() {
        sidebar.push_str(&format!("<h4>{}</h4>\n", html_escape(sidebar_heading)));
        for (item_title, url) in sidebar_items {
            sidebar.push_str(&format!(
                "<a href=\"{}\">{}</a>\n",
                url,
                html_escape(item_title)
            ));
        }
    }

    let cta = if contact_url.is_empty() {
        String::new()
    } else {
        format!(
            "<a class=\"vt-btn vt-btn-primary\" href=\"{}\">{}</a>\n",
            contact_url,
            html_escape(label_contact)
        )
    };

    format!(
        r#"<div class="vt-detail">
<div class="vt-main">
<h1 class="vt-page-title">{title}</h1>
{body}
{cta}</div>
<aside class="vt-sidebar">
{sidebar}</aside>
</div>
"#,
        title = html_escape(title),
        body = body_html,
        cta = cta,
        sidebar = sidebar,
    )
}

// ── Shortcodes ─────────────────────────────────────────

/// Substitute the grid shortcodes inside already-rendered body HTML.
/// Callers only compute the fragments when the marker is present.
pub fn expand_shortcodes(html: &str, projects_grid: &str, services_grid: &str) -> String {
    html.replace(PROJECTS_GRID_SHORTCODE, projects_grid)
        .replace(SERVICES_GRID_SHORTCODE, services_grid)
}
