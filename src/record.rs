//! Canonical record and its assembly from per-field results.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::extractors::truncate_chars;
use crate::geo::Coordinates;
use crate::normalize::PostalAddress;
use crate::strategy::{ExtractionResult, Field};

/// One listing, flattened for storage.
///
/// Every field is optional. `latitude` and `longitude` are either both set or
/// both empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<f64>,
    pub sqft: Option<u32>,
    /// Acres
    pub lot_size: Option<f64>,
    pub year_built: Option<i32>,
    pub property_type: Option<String>,
    pub num_rooms: Option<u32>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub description: Option<String>,
    pub source_url: Option<String>,
    pub image_url: Option<String>,
    /// Video tour
    pub video_url: Option<String>,
    pub mls_id: Option<String>,
    pub garage_spaces: Option<u32>,
    pub hoa_monthly: Option<f64>,
    /// Dollars per year
    pub annual_tax: Option<f64>,
    /// Fraction of the assessed value per year, e.g. `0.012`
    pub property_tax_rate: Option<f64>,
    pub source_file: String,
    /// Leading part of the raw document
    pub raw_html: Option<String>,
    /// Assigned by whoever stores the record
    pub imported_at: Option<DateTime<Utc>>,
}

impl CanonicalRecord {
    /// A record that carries only its bookkeeping metadata.
    pub fn empty(source_file: &str) -> Self {
        Self {
            source_file: source_file.to_string(),
            ..Default::default()
        }
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates {
                latitude,
                longitude,
            }),
            _ => None,
        }
    }
}

/// Results of every field chain for one document.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldResults {
    pub address: ExtractionResult<PostalAddress>,
    pub price: ExtractionResult<f64>,
    pub currency: ExtractionResult<String>,
    pub bedrooms: ExtractionResult<u32>,
    pub bathrooms: ExtractionResult<f64>,
    pub sqft: ExtractionResult<u32>,
    pub lot_size: ExtractionResult<f64>,
    pub year_built: ExtractionResult<i32>,
    pub property_type: ExtractionResult<String>,
    pub description: ExtractionResult<String>,
    pub coordinates: ExtractionResult<Coordinates>,
    pub source_url: ExtractionResult<String>,
    pub image_url: ExtractionResult<String>,
    pub video_url: ExtractionResult<String>,
    pub mls_id: ExtractionResult<String>,
    pub num_rooms: ExtractionResult<u32>,
    pub garage_spaces: ExtractionResult<u32>,
    pub hoa_monthly: ExtractionResult<f64>,
    pub annual_tax: ExtractionResult<f64>,
    pub property_tax_rate: ExtractionResult<f64>,
}

impl Default for FieldResults {
    fn default() -> Self {
        Self {
            address: ExtractionResult::empty(),
            price: ExtractionResult::empty(),
            currency: ExtractionResult::empty(),
            bedrooms: ExtractionResult::empty(),
            bathrooms: ExtractionResult::empty(),
            sqft: ExtractionResult::empty(),
            lot_size: ExtractionResult::empty(),
            year_built: ExtractionResult::empty(),
            property_type: ExtractionResult::empty(),
            description: ExtractionResult::empty(),
            coordinates: ExtractionResult::empty(),
            source_url: ExtractionResult::empty(),
            image_url: ExtractionResult::empty(),
            video_url: ExtractionResult::empty(),
            mls_id: ExtractionResult::empty(),
            num_rooms: ExtractionResult::empty(),
            garage_spaces: ExtractionResult::empty(),
            hoa_monthly: ExtractionResult::empty(),
            annual_tax: ExtractionResult::empty(),
            property_tax_rate: ExtractionResult::empty(),
        }
    }
}

/// Metadata copied onto the record unchanged.
#[derive(Debug, Clone, Copy)]
pub struct Passthrough<'a> {
    pub source_file: &'a str,
    pub raw: &'a str,
    pub raw_html_limit: usize,
}

/// Field name to the strategy that filled it.
pub type Provenance = BTreeMap<&'static str, &'static str>;

/// Merge field results into one record. Never fails.
pub fn assemble(results: FieldResults, passthrough: Passthrough<'_>) -> (CanonicalRecord, Provenance) {
    let mut provenance = Provenance::new();
    let mut take = |field: Field, strategy: &'static str, found: bool| {
        if found {
            provenance.insert(field.as_str(), strategy);
        }
    };

    macro_rules! field {
        ($result:expr, $field:expr) => {{
            let result = $result;
            take($field, result.strategy, result.value.is_some());
            result.value
        }};
    }

    let address = field!(results.address, Field::Address);
    let coordinates = field!(results.coordinates, Field::Coordinates);

    let mut record = CanonicalRecord {
        price: field!(results.price, Field::Price),
        currency: field!(results.currency, Field::Currency),
        bedrooms: field!(results.bedrooms, Field::Bedrooms),
        bathrooms: field!(results.bathrooms, Field::Bathrooms),
        sqft: field!(results.sqft, Field::Sqft),
        lot_size: field!(results.lot_size, Field::LotSize),
        year_built: field!(results.year_built, Field::YearBuilt),
        property_type: field!(results.property_type, Field::PropertyType),
        num_rooms: field!(results.num_rooms, Field::NumRooms),
        description: field!(results.description, Field::Description),
        source_url: field!(results.source_url, Field::SourceUrl),
        image_url: field!(results.image_url, Field::ImageUrl),
        video_url: field!(results.video_url, Field::VideoUrl),
        mls_id: field!(results.mls_id, Field::MlsId),
        garage_spaces: field!(results.garage_spaces, Field::GarageSpaces),
        hoa_monthly: field!(results.hoa_monthly, Field::HoaMonthly),
        annual_tax: field!(results.annual_tax, Field::AnnualTax),
        property_tax_rate: field!(results.property_tax_rate, Field::PropertyTaxRate),
        source_file: passthrough.source_file.to_string(),
        raw_html: Some(truncate_chars(passthrough.raw, passthrough.raw_html_limit).to_string()),
        ..Default::default()
    };

    if let Some(address) = address {
        record.address = Some(address.street);
        record.city = address.city;
        record.state = address.state;
        record.zip_code = address.zip_code;
        record.country = address.country;
    }

    // The pair is one value, so it is set or cleared as a unit
    if let Some(coordinates) = coordinates {
        record.latitude = Some(coordinates.latitude);
        record.longitude = Some(coordinates.longitude);
    }

    (record, provenance)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn found<T>(value: T, strategy: &'static str) -> ExtractionResult<T> {
        ExtractionResult {
            value: Some(value),
            strategy,
        }
    }

    fn passthrough(raw: &str) -> Passthrough<'_> {
        Passthrough {
            source_file: "listing.html",
            raw,
            raw_html_limit: 10,
        }
    }

    #[test]
    fn test_empty_results_give_metadata_only_record() {
        let (record, provenance) = assemble(FieldResults::default(), passthrough("<p>hi</p>"));
        assert_eq!(record.source_file, "listing.html");
        assert_eq!(record.raw_html.as_deref(), Some("<p>hi</p>"));
        assert_eq!(record.price, None);
        assert_eq!(record.latitude, None);
        assert_eq!(record.longitude, None);
        assert_eq!(record.imported_at, None);
        assert!(provenance.is_empty());
    }

    #[test]
    fn test_fields_and_provenance() {
        let results = FieldResults {
            address: found(
                PostalAddress {
                    street: "123 Main St".into(),
                    city: Some("Springfield".into()),
                    state: Some("IL".into()),
                    zip_code: Some("62701".into()),
                    country: Some("US".into()),
                },
                "css_address",
            ),
            price: found(425_000.0, "og_title_price"),
            coordinates: found(
                Coordinates {
                    latitude: 39.78,
                    longitude: -89.65,
                },
                "geocoder",
            ),
            ..Default::default()
        };

        let (record, provenance) = assemble(results, passthrough("<html><body>long page</body></html>"));

        assert_eq!(record.address.as_deref(), Some("123 Main St"));
        assert_eq!(record.city.as_deref(), Some("Springfield"));
        assert_eq!(record.zip_code.as_deref(), Some("62701"));
        assert_eq!(record.price, Some(425_000.0));
        assert_eq!(
            record.coordinates(),
            Some(Coordinates {
                latitude: 39.78,
                longitude: -89.65
            })
        );
        assert_eq!(record.raw_html.as_deref(), Some("<html><bod"));
        assert_eq!(provenance.get("price"), Some(&"og_title_price"));
        assert_eq!(provenance.get("coordinates"), Some(&"geocoder"));
        assert_eq!(provenance.get("bedrooms"), None);
    }

    #[test]
    fn test_record_serializes_with_snake_case_keys() {
        let record = CanonicalRecord::empty("a.html");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["source_file"], "a.html");
        assert!(json["zip_code"].is_null());
        assert!(json["imported_at"].is_null());
    }
}
