//! Track title extraction from a service page.

use once_cell::sync::Lazy;
use regex_lite::Regex;

/// Social-preview meta tags, probed in order.
static META_PROBES: Lazy<[Regex; 2]> = Lazy::new(|| {
    [
        Regex::new(r#"<meta\s+property="og:title"\s+content="([^"]+)""#).expect("valid regex"),
        Regex::new(r#"<meta\s+name="twitter:title"\s+content="([^"]+)""#).expect("valid regex"),
    ]
});

static TITLE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<title>([^<]+)</title>").expect("valid regex"));

/// Extracts a human title from page HTML.
///
/// Tries `og:title`, then `twitter:title`, then `<title>` with
/// `branding_suffix` removed. Returns `None` when nothing matches or the
/// match is blank.
pub fn extract_page_title(html: &str, branding_suffix: &str) -> Option<String> {
    for probe in META_PROBES.iter() {
        if let Some(title) = probe.captures(html).and_then(|c| c.get(1)) {
            return non_blank(decode_entities(title.as_str()));
        }
    }

    let title = TITLE_TAG.captures(html)?.get(1)?.as_str();
    let title = if branding_suffix.is_empty() {
        title.to_string()
    } else {
        title.replace(branding_suffix, "")
    };
    non_blank(decode_entities(&title))
}

fn non_blank(title: String) -> Option<String> {
    let title = title.trim();
    if title.is_empty() {
        None
    } else {
        Some(title.to_string())
    }
}

/// Decodes the handful of entities that show up in page titles.
fn decode_entities(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
