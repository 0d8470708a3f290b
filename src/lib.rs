//! Listing extraction engine
//!
//! Turns saved real-estate listing pages into one canonical record each.
//! Every field has its own ordered chain of strategies over:
//! - JSON-LD (with @graph and nested types)
//! - OpenGraph / named meta tags
//! - site-specific CSS selectors
//! - inline JavaScript map configs (via swc AST parsing)
//! - regular expressions over the visible text
//!
//! Coordinates missing from the page can be looked up by a [`Geocoder`].

pub mod config;
pub mod document;
pub mod error;
pub mod extractors;
pub mod ffi;
pub mod fields;
pub mod geo;
pub mod normalize;
pub mod record;
pub mod strategy;

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

pub use config::{ExtractorConfig, GeocoderConfig};
pub use document::ListingDocument;
pub use error::{ExtractError, GeocodeError};
pub use ffi::*;
pub use geo::{Coordinates, CoordinateResolver, GeocodeStatus, Geocoder, NominatimGeocoder};
pub use normalize::{Limits, PostalAddress};
pub use record::{CanonicalRecord, Provenance};
pub use strategy::{ExtractionResult, Field, FieldStrategy, Matcher};

use record::{FieldResults, Passthrough};
use strategy::run_chain;

/// A record plus how it was obtained.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extraction {
    pub record: CanonicalRecord,
    /// Field name to the strategy that produced it
    pub provenance: Provenance,
    pub geocode: GeocodeStatus,
}

/// Reusable extractor. Holds configuration and the optional geocoder only;
/// each call owns its document, so one instance can serve many threads.
#[derive(Debug, Clone)]
pub struct ListingExtractor {
    config: ExtractorConfig,
    limits: Limits,
    resolver: CoordinateResolver,
}

impl Default for ListingExtractor {
    fn default() -> Self {
        Self::new(ExtractorConfig::default())
    }
}

impl ListingExtractor {
    /// Extractor without a geocoder, whatever `config.geocoder` says.
    pub fn new(config: ExtractorConfig) -> Self {
        let limits = Limits::from(&config);
        Self {
            config,
            limits,
            resolver: CoordinateResolver::default(),
        }
    }

    /// Extractor with a Nominatim geocoder when `config.geocoder.enabled`.
    pub fn from_config(config: ExtractorConfig) -> Self {
        let geocoder: Option<Arc<dyn Geocoder>> = if config.geocoder.enabled {
            tracing::info!(endpoint = %config.geocoder.endpoint, "geocoding enabled");
            Some(Arc::new(NominatimGeocoder::new(&config.geocoder)))
        } else {
            None
        };
        Self {
            resolver: CoordinateResolver::new(geocoder),
            ..Self::new(config)
        }
    }

    pub fn with_geocoder(mut self, geocoder: Arc<dyn Geocoder>) -> Self {
        self.resolver = CoordinateResolver::new(Some(geocoder));
        self
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extract one listing.
    ///
    /// Always yields a record: empty or unreadable input gives one with only
    /// `source_file` set. The only error is a geocoder outage, which still
    /// carries the assembled record.
    pub fn extract(&self, bytes: &[u8], file_name: &str) -> Result<Extraction, ExtractError> {
        match ListingDocument::load(bytes, file_name) {
            Ok(doc) => self.extract_document(&doc),
            Err(e) => {
                tracing::warn!(source_file = file_name, "{}", e);
                Ok(Extraction {
                    record: CanonicalRecord::empty(file_name),
                    provenance: Provenance::new(),
                    geocode: GeocodeStatus::SkippedNoAddress,
                })
            }
        }
    }

    /// Read and extract a file; the record's `source_file` is its file name.
    pub fn extract_file(&self, path: &Path) -> Result<Extraction, ExtractError> {
        let bytes = std::fs::read(path).map_err(|source| ExtractError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.extract(&bytes, &file_name)
    }

    pub fn extract_document(&self, doc: &ListingDocument) -> Result<Extraction, ExtractError> {
        let mut results = self.run_field_chains(doc);

        let resolution = self
            .resolver
            .resolve(doc, results.address.value.as_ref(), &self.limits);
        results.coordinates = resolution.coordinates;

        let (record, provenance) = record::assemble(
            results,
            Passthrough {
                source_file: doc.source_file(),
                raw: doc.raw(),
                raw_html_limit: self.config.raw_html_limit,
            },
        );

        tracing::debug!(
            source_file = doc.source_file(),
            fields = provenance.len(),
            geocode = ?resolution.status,
            "listing extracted"
        );

        let extraction = Extraction {
            record,
            provenance,
            geocode: resolution.status,
        };
        match resolution.outage {
            Some(reason) => Err(ExtractError::GeocoderUnavailable {
                reason,
                extraction: Box::new(extraction),
            }),
            None => Ok(extraction),
        }
    }

    /// Every chain except coordinates, which depend on the address.
    fn run_field_chains(&self, doc: &ListingDocument) -> FieldResults {
        let limits = &self.limits;
        FieldResults {
            address: run_chain(doc, &fields::ADDRESS, limits),
            price: run_chain(doc, &fields::PRICE, limits),
            currency: run_chain(doc, &fields::CURRENCY, limits),
            bedrooms: run_chain(doc, &fields::BEDROOMS, limits),
            bathrooms: run_chain(doc, &fields::BATHROOMS, limits),
            sqft: run_chain(doc, &fields::SQFT, limits),
            lot_size: run_chain(doc, &fields::LOT_SIZE, limits),
            year_built: run_chain(doc, &fields::YEAR_BUILT, limits),
            property_type: run_chain(doc, &fields::PROPERTY_TYPE, limits),
            description: run_chain(doc, &fields::DESCRIPTION, limits),
            coordinates: ExtractionResult::empty(),
            source_url: run_chain(doc, &fields::SOURCE_URL, limits),
            image_url: run_chain(doc, &fields::IMAGE_URL, limits),
            video_url: run_chain(doc, &fields::VIDEO_URL, limits),
            mls_id: run_chain(doc, &fields::MLS_ID, limits),
            num_rooms: run_chain(doc, &fields::NUM_ROOMS, limits),
            garage_spaces: run_chain(doc, &fields::GARAGE_SPACES, limits),
            hoa_monthly: run_chain(doc, &fields::HOA_MONTHLY, limits),
            annual_tax: run_chain(doc, &fields::ANNUAL_TAX, limits),
            property_tax_rate: run_chain(doc, &fields::PROPERTY_TAX_RATE, limits),
        }
    }
}

/// Extract with default settings and no geocoder.
pub fn extract_listing(bytes: &[u8], file_name: &str) -> CanonicalRecord {
    let extractor = ListingExtractor::default();
    match extractor.extract(bytes, file_name) {
        Ok(extraction) => extraction.record,
        // Unreachable without a geocoder, but the record travels with the error
        Err(e) => e
            .into_partial_extraction()
            .map(|extraction| extraction.record)
            .unwrap_or_else(|| CanonicalRecord::empty(file_name)),
    }
}
