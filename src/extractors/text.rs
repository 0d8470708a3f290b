//! Page text helpers: visible text, whitespace cleaning, readability.

use std::io::Cursor;

use scraper::{Html, Node};

/// Elements whose text never renders.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "svg"];

/// Collapse runs of whitespace to single spaces and trim.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// All text a reader would see, whitespace-collapsed, in document order.
pub fn visible_text(document: &Html) -> String {
    let mut out = String::new();
    for node in document.tree.root().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| HIDDEN_ELEMENTS.contains(&el.name()))
        });
        if !hidden {
            out.push_str(text);
            out.push(' ');
        }
    }
    clean_text(&out)
}

/// Truncate to at most `max_chars` characters on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Main article text via the readability algorithm. Empty on failure.
pub fn readability_text(html: &str, base_url: Option<&str>) -> String {
    use readability::extractor;
    use url::Url;

    let parsed_url = match base_url.and_then(|u| Url::parse(u).ok()) {
        Some(u) => u,
        None => match Url::parse("http://localhost/") {
            Ok(u) => u,
            Err(_) => return String::new(),
        },
    };

    let mut cursor = Cursor::new(html.as_bytes());
    match extractor::extract(&mut cursor, &parsed_url) {
        Ok(product) => clean_text(&product.text),
        Err(e) => {
            tracing::debug!("readability extraction failed: {:?}", e);
            String::new()
        }
    }
}
