//! HTML content readers
//!
//! Each module reads one kind of source out of a parsed page. They know
//! nothing about listings; the field strategies decide what to ask them.

pub mod css;
pub mod js;
pub mod jsonld;
pub mod meta;
pub mod text;

pub use css::{select_attr_pair, select_first, Accessor};
pub use js::extract_js_variables;
pub use jsonld::JsonLdIndex;
pub use meta::MetaTags;
pub use text::{clean_text, truncate_chars, visible_text};
