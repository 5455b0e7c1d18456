//! Markdown rendering and description post-processing.
//!
//! READMEs render through comrak with the house extension set. Release
//! descriptions arrive pre-rendered from the platform but embed time-limited
//! private image URLs; [`rewrite_private_images`] swaps those for the stable
//! public asset URLs recovered from the markdown source.

use comrak::{markdown_to_html, Options};
use regex::Regex;

/// Renders markdown to HTML: GFM tables, strikethrough and task lists,
/// footnotes, alert blocks, emoji shortcodes, autolinking, typographic
/// substitutions and raw HTML passthrough.
pub fn render_markdown(text: &str) -> String {
    let mut options = Options::default();
    options.extension.autolink = true;
    options.extension.table = true;
    options.extension.strikethrough = true;
    options.extension.tasklist = true;
    options.extension.footnotes = true;
    options.extension.alerts = true;
    options.extension.shortcodes = true;
    options.parse.smart = true;
    options.render.unsafe_ = true;
    markdown_to_html(text, &options)
}

/// Public attachment URL in markdown source, capturing its uuid.
const PUBLIC_ASSET_PATTERN: &str = r"https://github\.com/[^/\s)]+/[^/\s)]+/assets/\d+/([0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12})";

/// Replaces every time-limited `private-user-images` URL in `html` with the
/// stable public asset URL from `markdown` carrying the same uuid. Applying
/// the rewrite twice equals applying it once: rewritten HTML contains no
/// private URL left to match.
pub fn rewrite_private_images(markdown: &str, html: &str) -> String {
    let public_url = Regex::new(PUBLIC_ASSET_PATTERN).expect("public asset pattern is valid");
    let mut out = html.to_string();
    for capture in public_url.captures_iter(markdown) {
        let public = &capture[0];
        let uuid = &capture[1];
        let private = Regex::new(&format!(
            r#"https://private-user-images\.githubusercontent\.com/\d+/\d+-{}[^"]*"#,
            regex::escape(uuid)
        ))
        .expect("private image pattern is valid");
        out = private.replace_all(&out, public).to_string();
    }
    out
}
