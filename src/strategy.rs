//! Field strategies and the chain runner
//!
//! A [`FieldStrategy`] pairs a [`Matcher`], which pulls at most one raw
//! candidate out of a [`ListingDocument`], with a normalizer that either turns
//! the candidate into a typed value or rejects it. [`run_chain`] tries the
//! strategies of one field in rank order and stops at the first accepted value.

use regex::Regex;
use serde_json::Value;

use crate::document::ListingDocument;
use crate::extractors::{select_first, Accessor};
use crate::normalize::Limits;

/// Logical fields of a listing record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Address,
    Price,
    Currency,
    Bedrooms,
    Bathrooms,
    Sqft,
    LotSize,
    YearBuilt,
    PropertyType,
    Description,
    Coordinates,
    SourceUrl,
    ImageUrl,
    VideoUrl,
    MlsId,
    NumRooms,
    GarageSpaces,
    HoaMonthly,
    AnnualTax,
    PropertyTaxRate,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Address => "address",
            Field::Price => "price",
            Field::Currency => "currency",
            Field::Bedrooms => "bedrooms",
            Field::Bathrooms => "bathrooms",
            Field::Sqft => "sqft",
            Field::LotSize => "lot_size",
            Field::YearBuilt => "year_built",
            Field::PropertyType => "property_type",
            Field::Description => "description",
            Field::Coordinates => "coordinates",
            Field::SourceUrl => "source_url",
            Field::ImageUrl => "image_url",
            Field::VideoUrl => "video_url",
            Field::MlsId => "mls_id",
            Field::NumRooms => "num_rooms",
            Field::GarageSpaces => "garage_spaces",
            Field::HoaMonthly => "hoa_monthly",
            Field::AnnualTax => "annual_tax",
            Field::PropertyTaxRate => "property_tax_rate",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text a [`Matcher::Pattern`] runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Haystack {
    /// Rendered text of the page
    VisibleText,
    /// The undecoded document, markup included
    RawHtml,
    /// Content of one meta tag (property or name)
    Meta(&'static str),
}

/// Where a strategy looks for its candidate.
#[derive(Clone)]
pub enum Matcher {
    /// Value at `path` inside the first JSON-LD object of one of `types`
    JsonLd {
        types: &'static [&'static str],
        path: &'static [&'static str],
    },
    /// A meta tag's content, looked up by property then name
    Meta(&'static str),
    /// First non-empty value read from elements matching `selector`
    Css {
        selector: &'static str,
        accessor: Accessor,
    },
    /// Capture `group` of the first match of `regex`
    Pattern {
        haystack: Haystack,
        regex: Regex,
        group: usize,
    },
    /// Anything the declarative kinds cannot express
    Custom(fn(&ListingDocument) -> Option<Value>),
}

impl Matcher {
    /// Read this matcher's candidate from the document, if any.
    pub fn candidate(&self, doc: &ListingDocument) -> Option<Value> {
        match self {
            Matcher::JsonLd { types, path } => doc
                .jsonld()
                .find(types, path)
                .filter(|v| !is_blank(v))
                .cloned(),
            Matcher::Meta(key) => doc.meta().get(key).map(|s| Value::String(s.to_string())),
            Matcher::Css { selector, accessor } => {
                select_first(doc.html(), selector, *accessor).map(Value::String)
            }
            Matcher::Pattern {
                haystack,
                regex,
                group,
            } => {
                let text = match haystack {
                    Haystack::VisibleText => doc.visible_text(),
                    Haystack::RawHtml => doc.raw(),
                    Haystack::Meta(key) => doc.meta().get(key)?,
                };
                let found = regex.captures(text)?.get(*group)?.as_str().trim();
                (!found.is_empty()).then(|| Value::String(found.to_string()))
            }
            Matcher::Custom(matcher) => matcher(doc),
        }
    }
}

impl std::fmt::Debug for Matcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Matcher::JsonLd { types, path } => write!(f, "JsonLd({types:?}, {path:?})"),
            Matcher::Meta(key) => write!(f, "Meta({key})"),
            Matcher::Css { selector, .. } => write!(f, "Css({selector})"),
            Matcher::Pattern { regex, .. } => write!(f, "Pattern({})", regex.as_str()),
            Matcher::Custom(_) => f.write_str("Custom"),
        }
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// One extraction rule for one field. Lower `rank` runs first.
pub struct FieldStrategy<T> {
    pub name: &'static str,
    pub field: Field,
    pub rank: u16,
    pub matcher: Matcher,
    pub normalize: fn(&Value, &Limits) -> Option<T>,
}

impl<T> std::fmt::Debug for FieldStrategy<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldStrategy")
            .field("name", &self.name)
            .field("field", &self.field)
            .field("rank", &self.rank)
            .field("matcher", &self.matcher)
            .finish()
    }
}

/// Outcome of one field's chain.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionResult<T> {
    pub value: Option<T>,
    /// Name of the strategy that produced `value`, or `"none"`
    pub strategy: &'static str,
}

impl<T> ExtractionResult<T> {
    pub fn empty() -> Self {
        Self {
            value: None,
            strategy: "none",
        }
    }

    pub fn is_found(&self) -> bool {
        self.value.is_some()
    }
}

/// Run `strategies` against `doc` in rank order and return the first value a
/// normalizer accepts. Later strategies are not evaluated.
pub fn run_chain<T>(
    doc: &ListingDocument,
    strategies: &[FieldStrategy<T>],
    limits: &Limits,
) -> ExtractionResult<T> {
    let mut ordered: Vec<&FieldStrategy<T>> = strategies.iter().collect();
    // stable: equal ranks keep table order
    ordered.sort_by_key(|s| s.rank);

    for strategy in ordered {
        let Some(candidate) = strategy.matcher.candidate(doc) else {
            continue;
        };
        match (strategy.normalize)(&candidate, limits) {
            Some(value) => {
                tracing::debug!(
                    field = %strategy.field,
                    strategy = strategy.name,
                    "field extracted"
                );
                return ExtractionResult {
                    value: Some(value),
                    strategy: strategy.name,
                };
            }
            None => {
                tracing::debug!(
                    field = %strategy.field,
                    strategy = strategy.name,
                    %candidate,
                    "candidate rejected"
                );
            }
        }
    }

    ExtractionResult::empty()
}
