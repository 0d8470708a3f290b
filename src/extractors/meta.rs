//! OpenGraph and named meta tag extraction
//!
//! Collects `<meta property=... content=...>` (og:, product:, place:
//! namespaces) and `<meta name=... content=...>` into one lookup. The first
//! non-empty occurrence of a key wins.

use std::collections::HashMap;

use scraper::{Html, Selector};

#[derive(Debug, Default, Clone)]
pub struct MetaTags {
    properties: HashMap<String, String>,
    names: HashMap<String, String>,
}

impl MetaTags {
    pub fn from_document(document: &Html) -> Self {
        let mut tags = Self::default();
        let Ok(selector) = Selector::parse("meta[content]") else {
            return tags;
        };

        for element in document.select(&selector) {
            let content = element.value().attr("content").unwrap_or("").trim();
            if content.is_empty() {
                continue;
            }
            if let Some(property) = element.value().attr("property") {
                tags.properties
                    .entry(property.trim().to_ascii_lowercase())
                    .or_insert_with(|| content.to_string());
            }
            if let Some(name) = element.value().attr("name") {
                tags.names
                    .entry(name.trim().to_ascii_lowercase())
                    .or_insert_with(|| content.to_string());
            }
        }

        tags
    }

    /// Look a key up as a `property` first (OpenGraph style), then as a `name`.
    pub fn get(&self, key: &str) -> Option<&str> {
        let key = key.to_ascii_lowercase();
        self.properties
            .get(&key)
            .or_else(|| self.names.get(&key))
            .map(String::as_str)
    }

    pub fn og(&self, key: &str) -> Option<&str> {
        self.get(&format!("og:{key}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_opengraph_and_names() {
        let html = r#"
        <html>
        <head>
            <meta property="og:title" content="123 Main St - $425,000">
            <meta property="og:url" content="https://example.com/listing/1">
            <meta property="place:location:latitude" content="49.28">
            <meta name="description" content="Bright corner unit">
            <meta name="twitter:card" content="">
        </head>
        </html>
        "#;

        let meta = MetaTags::from_document(&Html::parse_document(html));
        assert_eq!(meta.og("title"), Some("123 Main St - $425,000"));
        assert_eq!(meta.get("og:url"), Some("https://example.com/listing/1"));
        assert_eq!(meta.get("place:location:latitude"), Some("49.28"));
        assert_eq!(meta.get("description"), Some("Bright corner unit"));
        assert_eq!(meta.get("twitter:card"), None);
    }

    #[test]
    fn test_first_occurrence_wins() {
        let html = r#"
        <meta property="og:image" content="https://example.com/a.jpg">
        <meta property="og:image" content="https://example.com/b.jpg">
        "#;

        let meta = MetaTags::from_document(&Html::parse_document(html));
        assert_eq!(meta.og("image"), Some("https://example.com/a.jpg"));
    }
}
