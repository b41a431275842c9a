/// Template rendering for the admission studio.
///
/// The page is a single HTML template (`studio/assets/studio.html`) with
/// `{{TOKEN}}` placeholders, embedded at compile time.

const TEMPLATE: &str = include_str!("assets/studio.html");

/// Renders the form page. `fill` replaces the page placeholders; any token it
/// leaves behind is blanked.
pub fn render_page<F>(fill: F) -> String
where
    F: FnOnce(String) -> String,
{
    blank_remaining(fill(TEMPLATE.to_owned()))
}

/// Replaces every `{{TOKEN}}` still present with an empty string.
fn blank_remaining(mut html: String) -> String {
    while let Some(start) = html.find("{{") {
        if let Some(end) = html[start..].find("}}") {
            let abs_end = start + end + 2;
            html.replace_range(start..abs_end, "");
        } else {
            break;
        }
    }
    html
}

/// Escapes the five HTML-significant characters.
pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
