use std::collections::HashMap;

use crate::models::settings::Setting;

/// Build one `@font-face` declaration per uploaded custom font file URL.
///
/// The family name is the file's base name and the source format follows
/// the extension: ".ttf" maps to "truetype", anything else is passed
/// through verbatim (woff stays woff, woff2 stays woff2).
pub fn build_font_faces(font_urls: &[String]) -> String {
    let mut css = String::new();
    for url in font_urls {
        let file_name = url.rsplit('/').next().unwrap_or(url);
        let (family, ext) = match file_name.rsplit_once('.') {
            Some((base, ext)) => (base, ext),
            None => (file_name, ""),
        };
        if family.is_empty() {
            continue;
        }
        let format = if ext.eq_ignore_ascii_case("ttf") {
            "truetype"
        } else {
            ext
        };
        css.push_str(&format!(
            "@font-face {{ font-family: '{}'; src: url('{}') format('{}'); font-display: swap; }}\n",
            family, url, format,
        ));
    }
    css
}

/// Build the full theme stylesheet from the settings map: custom font
/// faces, `:root` custom properties bound to setting values, then the
/// fixed component rules that reference them.
///
/// Regenerated on every page load; values are interpolated verbatim, a
/// malformed color or length flows straight into the output.
pub fn build_stylesheet(settings: &HashMap<String, String>, font_urls: &[String]) -> String {
    let get = |key: &str| -> &str {
        settings
            .get(key)
            .map(|v| v.as_str())
            .or_else(|| Setting::declared_default(key))
            .unwrap_or("")
    };

    let font_faces = build_font_faces(font_urls);

    let vars = format!(
        r#":root {{
    --vt-primary: {primary};
    --vt-secondary: {secondary};
    --vt-text: {text};
    --vt-card-bg: {card_bg};
    --vt-radius: {radius};
    --vt-shadow: {shadow};
    --vt-font: '{font}', sans-serif;
    --vt-heading-weight: {heading_weight};
    --vt-size-body: {size_body};
    --vt-size-heading: {size_heading};
    --vt-size-button: {size_button};
}}"#,
        primary = get("theme_primary_color"),
        secondary = get("theme_secondary_color"),
        text = get("theme_text_color"),
        card_bg = get("theme_card_bg"),
        radius = get("theme_border_radius"),
        shadow = get("theme_card_shadow"),
        font = get("theme_font_family"),
        heading_weight = get("theme_heading_weight"),
        size_body = get("theme_font_size_body"),
        size_heading = get("theme_font_size_heading"),
        size_button = get("theme_font_size_button"),
    );

    format!(
        r#"{font_faces}{vars}
body {{ font-family: var(--vt-font); font-size: var(--vt-size-body); color: var(--vt-text); margin: 0; }}
h1, h2, h3 {{ font-weight: var(--vt-heading-weight); }}
.vt-page-title {{ font-size: var(--vt-size-heading); color: var(--vt-primary); }}
.vt-grid {{ display: grid; grid-template-columns: repeat(auto-fill, minmax(280px, 1fr)); gap: 24px; }}
.vt-card {{ background: var(--vt-card-bg); border-radius: var(--vt-radius); box-shadow: 0 4px 16px var(--vt-shadow); overflow: hidden; }}
.vt-card img {{ width: 100%; display: block; }}
.vt-card h3 {{ color: var(--vt-text); margin: 12px 16px 4px; }}
.vt-card p {{ margin: 4px 16px 16px; }}
.vt-card.vt-hidden {{ display: none; }}
.vt-btn {{ display: inline-block; font-size: var(--vt-size-button); border-radius: var(--vt-radius); padding: 10px 18px; margin: 0 16px 16px 0; text-decoration: none; }}
.vt-btn-primary {{ background: var(--vt-primary); color: #fff; }}
.vt-btn-secondary {{ background: transparent; color: var(--vt-primary); border: 1px solid var(--vt-primary); }}
.vt-filters {{ margin: 16px 0; }}
.vt-filters button {{ font-size: var(--vt-size-button); border: 1px solid var(--vt-primary); background: transparent; color: var(--vt-primary); border-radius: var(--vt-radius); padding: 6px 14px; margin-right: 8px; cursor: pointer; }}
.vt-filters button.active {{ background: var(--vt-primary); color: #fff; }}
.vt-detail {{ display: grid; grid-template-columns: 2fr 1fr; gap: 32px; max-width: 1100px; margin: 0 auto; padding: 24px; }}
.vt-sidebar h4 {{ color: var(--vt-secondary); }}
.vt-sidebar a {{ display: block; color: var(--vt-text); padding: 6px 0; text-decoration: none; }}
"#,
        font_faces = font_faces,
        vars = vars,
    )
}
