//! JSON-LD extraction from HTML
//!
//! Reads every `<script type="application/ld+json">` block and indexes the
//! objects carrying an `@type` by that type. `@graph` arrays and typed objects
//! nested inside other objects (an `Offer` inside a `Product`, a
//! `PostalAddress` inside a `SingleFamilyResidence`) are indexed too.

use std::collections::HashMap;

use scraper::{Html, Selector};
use serde_json::Value;

/// Nesting deeper than this is not indexed.
const MAX_DEPTH: usize = 16;

/// Typed JSON-LD objects in document order, keyed by `@type`.
#[derive(Debug, Default, Clone)]
pub struct JsonLdIndex {
    by_type: HashMap<String, Vec<Value>>,
}

impl JsonLdIndex {
    pub fn from_document(document: &Html) -> Self {
        let mut by_type: HashMap<String, Vec<Value>> = HashMap::new();
        let Ok(selector) = Selector::parse(r#"script[type="application/ld+json"]"#) else {
            return Self { by_type };
        };

        for element in document.select(&selector) {
            let text = element.text().collect::<String>();
            let trimmed = text.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<Value>(trimmed) {
                Ok(json) => collect_typed_objects(&json, &mut by_type, 0),
                Err(e) => tracing::debug!("skipping malformed JSON-LD block: {}", e),
            }
        }

        Self { by_type }
    }

    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty()
    }

    /// All objects of one type, in document order.
    pub fn objects(&self, type_name: &str) -> &[Value] {
        self.by_type.get(type_name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Objects of any of `types`, type-priority first, then document order.
    pub fn objects_of<'a>(&'a self, types: &'a [&'a str]) -> impl Iterator<Item = &'a Value> + 'a {
        types.iter().flat_map(move |t| self.objects(t).iter())
    }

    /// Navigate `path` inside the first object of `types` where it resolves
    /// to a non-null value.
    pub fn find(&self, types: &[&str], path: &[&str]) -> Option<&Value> {
        types
            .iter()
            .flat_map(|t| self.objects(t).iter())
            .filter_map(|obj| navigate(obj, path))
            .find(|v| !v.is_null())
    }

    /// The `@type` names present in the document, sorted.
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.by_type.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Walk a JSON value by object keys. Arrays met along the way resolve to
/// their first element unless the segment is a numeric index.
pub fn navigate<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = value;
    for segment in path {
        current = match current {
            Value::Array(items) => match segment.parse::<usize>() {
                Ok(idx) => items.get(idx)?,
                Err(_) => items.first()?.get(*segment)?,
            },
            _ => current.get(*segment)?,
        };
    }
    // A trailing array (e.g. "offers": [..]) resolves to its first element
    match current {
        Value::Array(items) if !path.is_empty() => items.first(),
        _ => Some(current),
    }
}

/// Recursively collect objects with @type, including from @graph and nested
/// property values.
fn collect_typed_objects(value: &Value, result: &mut HashMap<String, Vec<Value>>, depth: usize) {
    if depth > MAX_DEPTH {
        return;
    }
    match value {
        Value::Object(obj) => {
            if let Some(type_val) = obj.get("@type") {
                let types: Vec<&str> = match type_val {
                    Value::String(s) => vec![s.as_str()],
                    Value::Array(arr) => arr.iter().filter_map(Value::as_str).collect(),
                    _ => vec![],
                };

                for t in types {
                    // Strip schema.org prefix if present
                    let clean_type = t
                        .strip_prefix("https://schema.org/")
                        .or_else(|| t.strip_prefix("http://schema.org/"))
                        .unwrap_or(t)
                        .to_string();
                    result.entry(clean_type).or_default().push(value.clone());
                }
            }

            for (key, child) in obj {
                if key == "@type" || key == "@context" {
                    continue;
                }
                collect_typed_objects(child, result, depth + 1);
            }
        }
        Value::Array(arr) => {
            for item in arr {
                collect_typed_objects(item, result, depth + 1);
            }
        }
        _ => {}
    }
}
