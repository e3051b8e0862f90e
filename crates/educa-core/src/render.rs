//! # Item Rendering
//!
//! Turns a content item into the HTML fragment shown to enrolled students.
//! Every interpolated value is escaped.

use crate::types::{Item, ItemBody};

impl Item {
    /// Render the item as an HTML fragment.
    #[must_use]
    pub fn render(&self) -> String {
        match &self.body {
            ItemBody::Text { content } => render_text(content),
            ItemBody::Image { file } => format!(
                "<p><img src=\"{}\" alt=\"{}\"></p>",
                escape(file),
                escape(&self.title)
            ),
            ItemBody::File { file } => format!(
                "<p><a href=\"{}\" class=\"button light\">Download file</a></p>",
                escape(file)
            ),
            ItemBody::Video { url } => render_video(url),
        }
    }
}

/// Escape the five HTML-significant characters.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            other => out.push(other),
        }
    }
    out
}

/// Blank lines separate paragraphs; single newlines become `<br>`.
fn render_text(content: &str) -> String {
    let normalized = content.replace("\r\n", "\n");
    normalized
        .split("\n\n")
        .map(str::trim)
        .filter(|para| !para.is_empty())
        .map(|para| {
            let lines: Vec<String> = para.lines().map(escape).collect();
            format!("<p>{}</p>", lines.join("<br>"))
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn render_video(url: &str) -> String {
    match embed_url(url) {
        Some(embed) => format!(
            "<iframe width=\"480\" height=\"360\" src=\"{}\" frameborder=\"0\" allowfullscreen></iframe>",
            escape(&embed)
        ),
        None => format!("<p><a href=\"{0}\">{0}</a></p>", escape(url)),
    }
}

/// Canonical embed URL for the video hosts we know how to embed.
pub fn embed_url(url: &str) -> Option<String> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))?;
    let rest = rest.strip_prefix("www.").unwrap_or(rest);
    let rest = rest.strip_prefix("m.").unwrap_or(rest);

    if let Some(query) = rest.strip_prefix("youtube.com/watch?") {
        let id = query
            .split('&')
            .find_map(|pair| pair.strip_prefix("v="))
            .filter(|id| is_video_id(id))?;
        return Some(format!("https://www.youtube.com/embed/{id}"));
    }
    if let Some(path) = rest.strip_prefix("youtu.be/") {
        let id = path.split(['?', '#', '/']).next().filter(|id| is_video_id(id))?;
        return Some(format!("https://www.youtube.com/embed/{id}"));
    }
    if let Some(path) = rest.strip_prefix("vimeo.com/") {
        let id = path.split(['?', '#', '/']).next()?;
        if !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) {
            return Some(format!("https://player.vimeo.com/video/{id}"));
        }
    }
    None
}

fn is_video_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

// =============================================================================
// TESTS
// =============================================================================
