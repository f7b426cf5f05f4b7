pub mod info_window;
pub mod marker_icon;

pub use info_window::render_info_window;
pub use marker_icon::{icon_url, render_marker_icon, MARKER_WRAPPER_CLASS};

/// Escapar texto del CMS antes de inyectarlo como HTML
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
