//! Raw document loading
//!
//! A [`ListingDocument`] is the parsed page plus everything the strategies
//! read from it, computed once up front. It is immutable after loading and
//! owned by a single extraction run.

use scraper::Html;
use serde_json::Value;

use crate::error::ExtractError;
use crate::extractors::{extract_js_variables, visible_text, JsonLdIndex, MetaTags};

pub struct ListingDocument {
    source_file: String,
    byte_len: usize,
    raw: String,
    html: Html,
    visible_text: String,
    jsonld: JsonLdIndex,
    meta: MetaTags,
    js_vars: Vec<(String, Value)>,
}

impl ListingDocument {
    /// Parse raw bytes into a document.
    ///
    /// Invalid UTF-8 is replaced rather than rejected and broken markup is
    /// repaired by the HTML5 parser. Only input with no text at all fails.
    pub fn load(bytes: &[u8], source_file: &str) -> Result<Self, ExtractError> {
        let raw = String::from_utf8_lossy(bytes).into_owned();
        Self::from_text(raw, source_file, bytes.len())
    }

    pub fn from_html(html: &str, source_file: &str) -> Result<Self, ExtractError> {
        Self::from_text(html.to_string(), source_file, html.len())
    }

    fn from_text(raw: String, source_file: &str, byte_len: usize) -> Result<Self, ExtractError> {
        if raw.chars().all(|c| c.is_whitespace() || c == '\0') {
            return Err(ExtractError::EmptyDocument);
        }

        let html = Html::parse_document(&raw);
        let visible_text = visible_text(&html);
        let jsonld = JsonLdIndex::from_document(&html);
        let meta = MetaTags::from_document(&html);
        let js_vars = extract_js_variables(&html);

        tracing::debug!(
            source_file,
            byte_len,
            jsonld_types = ?jsonld.type_names(),
            js_vars = js_vars.len(),
            "loaded listing document"
        );

        Ok(Self {
            source_file: source_file.to_string(),
            byte_len,
            raw,
            html,
            visible_text,
            jsonld,
            meta,
            js_vars,
        })
    }

    pub fn source_file(&self) -> &str {
        &self.source_file
    }

    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    /// The decoded document text exactly as received.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn html(&self) -> &Html {
        &self.html
    }

    pub fn visible_text(&self) -> &str {
        &self.visible_text
    }

    pub fn jsonld(&self) -> &JsonLdIndex {
        &self.jsonld
    }

    pub fn meta(&self) -> &MetaTags {
        &self.meta
    }

    /// Literal values from inline scripts, in document order.
    pub fn js_vars(&self) -> &[(String, Value)] {
        &self.js_vars
    }
}

impl std::fmt::Debug for ListingDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListingDocument")
            .field("source_file", &self.source_file)
            .field("byte_len", &self.byte_len)
            .finish_non_exhaustive()
    }
}
