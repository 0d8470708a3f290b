//! CSS selector-based extraction
//!
//! Uses the scraper crate to select elements by CSS selectors. Invalid
//! selectors select nothing.

use scraper::{ElementRef, Html, Selector};

use super::text::clean_text;

/// What to read off a selected element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accessor {
    /// Whitespace-collapsed text content
    Text,
    /// An attribute value
    Attr(&'static str),
    /// The `content` attribute if present (microdata), text otherwise
    ContentOrText,
}

/// Read the first element matching `selector` that yields a non-empty value.
pub fn select_first(document: &Html, selector: &str, accessor: Accessor) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .filter_map(|el| read(el, accessor))
        .next()
}

/// First element carrying both attributes, as a pair of raw values.
pub fn select_attr_pair(document: &Html, first: &str, second: &str) -> Option<(String, String)> {
    let selector = Selector::parse(&format!("[{first}][{second}]")).ok()?;
    document.select(&selector).find_map(|el| {
        let a = el.value().attr(first)?.trim();
        let b = el.value().attr(second)?.trim();
        (!a.is_empty() && !b.is_empty()).then(|| (a.to_string(), b.to_string()))
    })
}

fn read(element: ElementRef<'_>, accessor: Accessor) -> Option<String> {
    let value = match accessor {
        Accessor::Text => text_of(element),
        Accessor::Attr(name) => element.value().attr(name)?.trim().to_string(),
        Accessor::ContentOrText => match element.value().attr("content") {
            Some(content) if !content.trim().is_empty() => content.trim().to_string(),
            _ => text_of(element),
        },
    };
    (!value.is_empty()).then_some(value)
}

fn text_of(element: ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<Vec<_>>().join(" "))
}
