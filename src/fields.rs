//! Field strategy table
//!
//! One ordered strategy list per field. Ranks follow source confidence:
//! JSON-LD and meta tags (10..), site-specific CSS selectors (40..), then
//! regular expressions over page text (70..). Supporting a new site means
//! adding rows here.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{json, Value};

use crate::document::ListingDocument;
use crate::extractors::text::readability_text;
use crate::extractors::{select_attr_pair, Accessor};
use crate::geo::Coordinates;
use crate::normalize::{self, PostalAddress};
use crate::strategy::{Field, FieldStrategy, Haystack, Matcher};

/// JSON-LD types that describe the listed property itself.
pub const LISTING_TYPES: &[&str] = &[
    "SingleFamilyResidence",
    "House",
    "Apartment",
    "Residence",
    "RealEstateListing",
    "Accommodation",
];

/// JSON-LD types carrying offers, SKUs and prices.
pub const OFFER_TYPES: &[&str] = &[
    "Product",
    "RealEstateListing",
    "SingleFamilyResidence",
    "House",
    "Apartment",
    "Residence",
];

/// Nesting limit when searching script variables for coordinates
const JS_SEARCH_DEPTH: usize = 8;

macro_rules! css {
    ($name:expr, $field:expr, $rank:expr, $selector:expr, $normalize:expr) => {
        FieldStrategy {
            name: $name,
            field: $field,
            rank: $rank,
            matcher: Matcher::Css {
                selector: $selector,
                accessor: Accessor::Text,
            },
            normalize: $normalize,
        }
    };
}

macro_rules! text_pattern {
    ($name:expr, $field:expr, $rank:expr, $pattern:expr, $normalize:expr) => {
        FieldStrategy {
            name: $name,
            field: $field,
            rank: $rank,
            matcher: Matcher::Pattern {
                haystack: Haystack::VisibleText,
                regex: table_regex($pattern),
                group: 1,
            },
            normalize: $normalize,
        }
    };
}

macro_rules! jsonld {
    ($name:expr, $field:expr, $rank:expr, $types:expr, $path:expr, $normalize:expr) => {
        FieldStrategy {
            name: $name,
            field: $field,
            rank: $rank,
            matcher: Matcher::JsonLd {
                types: $types,
                path: $path,
            },
            normalize: $normalize,
        }
    };
}

pub static ADDRESS: LazyLock<Vec<FieldStrategy<PostalAddress>>> = LazyLock::new(|| {
    vec![
        jsonld!("jsonld_address", Field::Address, 10, LISTING_TYPES, &["address"], normalize::postal_address),
        jsonld!("jsonld_postal_address", Field::Address, 11, &["PostalAddress"], &[], normalize::postal_address),
        css!("css_testid_summary_address", Field::Address, 40, r#"[data-testid="home-details-summary-address"]"#, normalize::postal_address),
        css!("css_testid_address", Field::Address, 41, r#"[data-testid="address"]"#, normalize::postal_address),
        css!("css_property_address", Field::Address, 42, ".property-address", normalize::postal_address),
        css!("css_listing_address", Field::Address, 43, ".listing-address", normalize::postal_address),
        css!("css_address", Field::Address, 44, ".address", normalize::postal_address),
        css!("css_h1_address", Field::Address, 45, r#"h1[class*="address"]"#, normalize::postal_address),
        css!("css_street_address", Field::Address, 46, r#"[class*="street-address"]"#, normalize::postal_address),
        css!("css_itemprop_street", Field::Address, 47, r#"[itemprop="streetAddress"]"#, normalize::postal_address),
        FieldStrategy {
            name: "og_title_address",
            field: Field::Address,
            rank: 60,
            // Titles read "123 Main St - $425,000" or "123 Main St | Site"
            matcher: Matcher::Pattern {
                haystack: Haystack::Meta("og:title"),
                regex: table_regex(r"^\s*([^|\-]*?\d+\s+\w[^|\-]*)"),
                group: 1,
            },
            normalize: normalize::postal_address,
        },
        text_pattern!(
            "text_street_with_zip",
            Field::Address,
            70,
            r"(?i)(\d+\s+[\w\s]+(?:St|Street|Ave|Avenue|Rd|Road|Dr|Drive|Ln|Lane|Ct|Court|Blvd|Boulevard|Way|Pl|Place)\b[\w\s,]*\d{5})",
            normalize::postal_address
        ),
        text_pattern!(
            "text_city_state_zip",
            Field::Address,
            71,
            r"(\d+\s+[\w\s]+,\s*[\w\s]+,\s*[A-Z]{2}\s*\d{5})",
            normalize::postal_address
        ),
    ]
});

pub static PRICE: LazyLock<Vec<FieldStrategy<f64>>> = LazyLock::new(|| {
    vec![
        jsonld!("jsonld_offer_price", Field::Price, 10, OFFER_TYPES, &["offers", "price"], normalize::price),
        jsonld!("jsonld_offer", Field::Price, 11, &["Offer"], &["price"], normalize::price),
        FieldStrategy {
            name: "meta_product_price",
            field: Field::Price,
            rank: 20,
            matcher: Matcher::Meta("product:price:amount"),
            normalize: normalize::price,
        },
        FieldStrategy {
            name: "meta_og_price",
            field: Field::Price,
            rank: 21,
            matcher: Matcher::Meta("og:price:amount"),
            normalize: normalize::price,
        },
        css!("css_testid_price", Field::Price, 40, r#"[data-testid="price"]"#, normalize::price),
        css!("css_price", Field::Price, 41, ".price", normalize::price),
        css!("css_listing_price", Field::Price, 42, ".listing-price", normalize::price),
        css!("css_class_price", Field::Price, 43, r#"[class*="price"]"#, normalize::price),
        FieldStrategy {
            name: "css_itemprop_price",
            field: Field::Price,
            rank: 44,
            matcher: Matcher::Css {
                selector: r#"[itemprop="price"]"#,
                accessor: Accessor::ContentOrText,
            },
            normalize: normalize::price,
        },
        FieldStrategy {
            name: "og_title_price",
            field: Field::Price,
            rank: 60,
            matcher: Matcher::Pattern {
                haystack: Haystack::Meta("og:title"),
                regex: table_regex(r"(\$\s*\d[\d,]*(?:\.\d{2})?)"),
                group: 1,
            },
            normalize: normalize::listing_price,
        },
        text_pattern!("text_dollar_amount", Field::Price, 70, r"(\$\s*\d[\d,]*(?:\.\d{2})?)", normalize::listing_price),
        text_pattern!("text_price_label", Field::Price, 71, r"Price[:\s]*\$?\s*(\d[\d,]*)", normalize::listing_price),
    ]
});

pub static CURRENCY: LazyLock<Vec<FieldStrategy<String>>> = LazyLock::new(|| {
    vec![
        jsonld!("jsonld_offer_currency", Field::Currency, 10, OFFER_TYPES, &["offers", "priceCurrency"], normalize::currency_code),
        jsonld!("jsonld_offer", Field::Currency, 11, &["Offer"], &["priceCurrency"], normalize::currency_code),
        FieldStrategy {
            name: "meta_product_currency",
            field: Field::Currency,
            rank: 20,
            matcher: Matcher::Meta("product:price:currency"),
            normalize: normalize::currency_code,
        },
        FieldStrategy {
            name: "meta_og_currency",
            field: Field::Currency,
            rank: 21,
            matcher: Matcher::Meta("og:price:currency"),
            normalize: normalize::currency_code,
        },
    ]
});

pub static BEDROOMS: LazyLock<Vec<FieldStrategy<u32>>> = LazyLock::new(|| {
    vec![
        jsonld!("jsonld_bedrooms", Field::Bedrooms, 10, LISTING_TYPES, &["numberOfBedrooms"], normalize::bedrooms),
        FieldStrategy {
            name: "css_itemprop_bedrooms",
            field: Field::Bedrooms,
            rank: 40,
            matcher: Matcher::Css {
                selector: r#"[itemprop="numberOfBedrooms"]"#,
                accessor: Accessor::ContentOrText,
            },
            normalize: normalize::bedrooms,
        },
        css!("css_testid_beds", Field::Bedrooms, 41, r#"[data-testid="bed-value"]"#, normalize::bedrooms),
        text_pattern!("text_count_beds", Field::Bedrooms, 70, r"(?i)\b(\d{1,2})\s*(?:bedrooms?|beds?|bd|br)\b", normalize::bedrooms),
        text_pattern!("text_beds_count", Field::Bedrooms, 71, r"(?i)\b(?:bedrooms?|beds?)[:\s]+(\d{1,2})\b", normalize::bedrooms),
    ]
});

pub static BATHROOMS: LazyLock<Vec<FieldStrategy<f64>>> = LazyLock::new(|| {
    vec![
        jsonld!("jsonld_bathrooms_total", Field::Bathrooms, 10, LISTING_TYPES, &["numberOfBathroomsTotal"], normalize::bathrooms),
        FieldStrategy {
            name: "jsonld_full_partial_bathrooms",
            field: Field::Bathrooms,
            rank: 11,
            matcher: Matcher::Custom(jsonld_full_partial_baths),
            normalize: normalize::bathrooms,
        },
        FieldStrategy {
            name: "css_itemprop_bathrooms",
            field: Field::Bathrooms,
            rank: 40,
            matcher: Matcher::Css {
                selector: r#"[itemprop="numberOfBathroomsTotal"]"#,
                accessor: Accessor::ContentOrText,
            },
            normalize: normalize::bathrooms,
        },
        css!("css_testid_baths", Field::Bathrooms, 41, r#"[data-testid="bath-value"]"#, normalize::bathrooms),
        FieldStrategy {
            name: "text_full_half_baths",
            field: Field::Bathrooms,
            rank: 70,
            matcher: Matcher::Pattern {
                haystack: Haystack::VisibleText,
                regex: table_regex(r"(?i)\b\d+\s*full\b[^.]{0,40}?\d+\s*(?:half|partial)\b"),
                group: 0,
            },
            normalize: normalize::bathrooms,
        },
        text_pattern!("text_count_baths", Field::Bathrooms, 71, r"(?i)\b(\d{1,2}(?:\.\d+)?)\s*(?:bathrooms?|baths?|ba)\b", normalize::bathrooms),
        text_pattern!("text_baths_count", Field::Bathrooms, 72, r"(?i)\b(?:bathrooms?|baths?)[:\s]+(\d{1,2}(?:\.\d+)?)", normalize::bathrooms),
    ]
});

pub static SQFT: LazyLock<Vec<FieldStrategy<u32>>> = LazyLock::new(|| {
    vec![
        jsonld!("jsonld_floor_size", Field::Sqft, 10, LISTING_TYPES, &["floorSize"], normalize::floor_area),
        css!("css_testid_sqft", Field::Sqft, 40, r#"[data-testid="sqft-value"]"#, normalize::floor_area),
        css!("css_sqft", Field::Sqft, 41, ".sqft", normalize::floor_area),
        text_pattern!("text_area_sqft", Field::Sqft, 70, r"(?i)(\d[\d,]*\s*(?:sq\.?\s*ft|sqft|square\s*feet))", normalize::plausible_floor_area),
        text_pattern!("text_sqft_area", Field::Sqft, 71, r"(?i)(?:sq\.?\s*ft|sqft|square\s*feet)[:\s]*(\d[\d,]*)", normalize::plausible_floor_area),
        text_pattern!(
            "text_area_square_metres",
            Field::Sqft,
            72,
            r"(?i)(\d[\d,]*(?:\.\d+)?\s*(?:m²|sq\.?\s*m\b|sqm|square\s*met(?:er|re)s))",
            normalize::plausible_floor_area
        ),
    ]
});

pub static LOT_SIZE: LazyLock<Vec<FieldStrategy<f64>>> = LazyLock::new(|| {
    vec![
        jsonld!("jsonld_lot_size", Field::LotSize, 10, LISTING_TYPES, &["lotSize"], normalize::lot_acres),
        css!("css_testid_lot", Field::LotSize, 40, r#"[data-testid="lot-size"]"#, normalize::lot_acres),
        text_pattern!(
            "text_lot_label",
            Field::LotSize,
            70,
            r"(?i)\blot(?:\s*size)?[:\s]*(\d[\d,]*(?:\.\d+)?\s*(?:acres?|ac\b|sq\.?\s*ft|sqft|square\s*feet|m²|sqm|hectares?|ha\b)?)",
            normalize::lot_acres
        ),
        text_pattern!("text_acres", Field::LotSize, 71, r"(?i)(\d[\d,]*(?:\.\d+)?\s*(?:acres?|ac\b))", normalize::lot_acres),
    ]
});

pub static YEAR_BUILT: LazyLock<Vec<FieldStrategy<i32>>> = LazyLock::new(|| {
    vec![
        jsonld!("jsonld_year_built", Field::YearBuilt, 10, LISTING_TYPES, &["yearBuilt"], normalize::year_built),
        css!("css_testid_year_built", Field::YearBuilt, 40, r#"[data-testid="year-built"]"#, normalize::year_built),
        text_pattern!(
            "text_built_label",
            Field::YearBuilt,
            70,
            r"(?i)(?:year\s*built|built(?:\s+in)?|constructed(?:\s+in)?)[:\s]*(\d{4})\b",
            normalize::year_built
        ),
        text_pattern!("text_year_built", Field::YearBuilt, 71, r"(?i)\b(\d{4})\s*(?:built|construction)", normalize::year_built),
    ]
});

pub static PROPERTY_TYPE: LazyLock<Vec<FieldStrategy<String>>> = LazyLock::new(|| {
    vec![
        FieldStrategy {
            name: "jsonld_residence_type",
            field: Field::PropertyType,
            rank: 10,
            matcher: Matcher::Custom(jsonld_residence_type),
            normalize: normalize::property_type,
        },
        css!("css_testid_property_type", Field::PropertyType, 40, r#"[data-testid="property-type"]"#, normalize::property_type),
        FieldStrategy {
            name: "text_type_keyword",
            field: Field::PropertyType,
            rank: 70,
            matcher: Matcher::Custom(property_type_keyword),
            normalize: normalize::property_type,
        },
    ]
});

pub static DESCRIPTION: LazyLock<Vec<FieldStrategy<String>>> = LazyLock::new(|| {
    vec![
        jsonld!("jsonld_description", Field::Description, 10, LISTING_TYPES, &["description"], normalize::description),
        jsonld!("jsonld_product_description", Field::Description, 11, &["Product"], &["description"], normalize::description),
        FieldStrategy {
            name: "meta_og_description",
            field: Field::Description,
            rank: 20,
            matcher: Matcher::Meta("og:description"),
            normalize: normalize::long_description,
        },
        css!("css_testid_description", Field::Description, 40, r#"[data-testid="description"]"#, normalize::long_description),
        css!("css_property_description", Field::Description, 41, ".property-description", normalize::long_description),
        css!("css_listing_description", Field::Description, 42, ".listing-description", normalize::long_description),
        css!("css_class_description", Field::Description, 43, r#"[class*="description"]"#, normalize::long_description),
        css!("css_itemprop_description", Field::Description, 44, r#"[itemprop="description"]"#, normalize::long_description),
        FieldStrategy {
            name: "readability",
            field: Field::Description,
            rank: 90,
            matcher: Matcher::Custom(readability_description),
            normalize: normalize::long_description,
        },
    ]
});

pub static COORDINATES: LazyLock<Vec<FieldStrategy<Coordinates>>> = LazyLock::new(|| {
    vec![
        jsonld!("jsonld_geo", Field::Coordinates, 10, LISTING_TYPES, &["geo"], normalize::coordinates),
        jsonld!("jsonld_geo_coordinates", Field::Coordinates, 11, &["GeoCoordinates"], &[], normalize::coordinates),
        FieldStrategy {
            name: "meta_place_location",
            field: Field::Coordinates,
            rank: 20,
            matcher: Matcher::Custom(meta_place_location),
            normalize: normalize::coordinates,
        },
        FieldStrategy {
            name: "data_lat_lng_attributes",
            field: Field::Coordinates,
            rank: 40,
            matcher: Matcher::Custom(data_attribute_coordinates),
            normalize: normalize::coordinates,
        },
        FieldStrategy {
            name: "script_map_config",
            field: Field::Coordinates,
            rank: 50,
            matcher: Matcher::Custom(script_coordinates),
            normalize: normalize::coordinates,
        },
        FieldStrategy {
            name: "raw_latitude_longitude",
            field: Field::Coordinates,
            rank: 70,
            matcher: Matcher::Custom(raw_latitude_longitude),
            normalize: normalize::coordinates,
        },
        FieldStrategy {
            name: "raw_lat_lng",
            field: Field::Coordinates,
            rank: 71,
            matcher: Matcher::Custom(raw_lat_lng),
            normalize: normalize::coordinates,
        },
    ]
});

pub static SOURCE_URL: LazyLock<Vec<FieldStrategy<String>>> = LazyLock::new(|| {
    vec![
        jsonld!("jsonld_url", Field::SourceUrl, 10, LISTING_TYPES, &["url"], normalize::http_url),
        FieldStrategy {
            name: "link_canonical",
            field: Field::SourceUrl,
            rank: 20,
            matcher: Matcher::Css {
                selector: r#"link[rel="canonical"]"#,
                accessor: Accessor::Attr("href"),
            },
            normalize: normalize::http_url,
        },
        FieldStrategy {
            name: "meta_og_url",
            field: Field::SourceUrl,
            rank: 21,
            matcher: Matcher::Meta("og:url"),
            normalize: normalize::http_url,
        },
    ]
});

pub static IMAGE_URL: LazyLock<Vec<FieldStrategy<String>>> = LazyLock::new(|| {
    vec![
        FieldStrategy {
            name: "jsonld_image",
            field: Field::ImageUrl,
            rank: 10,
            matcher: Matcher::Custom(jsonld_image),
            normalize: normalize::http_url,
        },
        FieldStrategy {
            name: "meta_og_image",
            field: Field::ImageUrl,
            rank: 20,
            matcher: Matcher::Meta("og:image"),
            normalize: normalize::http_url,
        },
    ]
});

pub static VIDEO_URL: LazyLock<Vec<FieldStrategy<String>>> = LazyLock::new(|| {
    vec![
        FieldStrategy {
            name: "jsonld_video",
            field: Field::VideoUrl,
            rank: 10,
            matcher: Matcher::Custom(jsonld_video),
            normalize: normalize::http_url,
        },
        FieldStrategy {
            name: "meta_og_video",
            field: Field::VideoUrl,
            rank: 20,
            matcher: Matcher::Meta("og:video"),
            normalize: normalize::http_url,
        },
    ]
});

pub static MLS_ID: LazyLock<Vec<FieldStrategy<String>>> = LazyLock::new(|| {
    vec![
        jsonld!("jsonld_product_sku", Field::MlsId, 10, &["Product"], &["sku"], normalize::mls_id),
        text_pattern!("text_mls_label", Field::MlsId, 70, r"(?i)MLS[#®\s]*[:\s]*([A-Z0-9-]+)", normalize::mls_id),
        FieldStrategy {
            name: "raw_sku",
            field: Field::MlsId,
            rank: 71,
            matcher: Matcher::Pattern {
                haystack: Haystack::RawHtml,
                regex: table_regex(r#""sku"\s*:\s*"([A-Za-z0-9-]+)""#),
                group: 1,
            },
            normalize: normalize::mls_id,
        },
        text_pattern!(
            "text_listing_number",
            Field::MlsId,
            72,
            r"(?i)(?:listing|property)[_\s-]*(?:id|number)[:\s]*([A-Z0-9-]+)",
            normalize::mls_id
        ),
        text_pattern!("text_r_number", Field::MlsId, 73, r"\b(R\d{7})\b", normalize::mls_id),
    ]
});

pub static NUM_ROOMS: LazyLock<Vec<FieldStrategy<u32>>> = LazyLock::new(|| {
    vec![
        jsonld!("jsonld_rooms", Field::NumRooms, 10, LISTING_TYPES, &["numberOfRooms"], normalize::room_count),
    ]
});

pub static GARAGE_SPACES: LazyLock<Vec<FieldStrategy<u32>>> = LazyLock::new(|| {
    vec![
        text_pattern!("text_car_garage", Field::GarageSpaces, 70, r"(?i)\b(\d{1,2})\s*(?:car\s+)?garage", normalize::garage_spaces),
        text_pattern!("text_garage_count", Field::GarageSpaces, 71, r"(?i)garage[:\s]+(\d{1,2})\b", normalize::garage_spaces),
        text_pattern!("text_parking_spaces", Field::GarageSpaces, 72, r"(?i)\b(\d{1,2})\s*parking\s*(?:space|spot)s?", normalize::garage_spaces),
        text_pattern!("text_parking_count", Field::GarageSpaces, 73, r"(?i)parking[:\s]+(\d{1,2})\b", normalize::garage_spaces),
    ]
});

pub static HOA_MONTHLY: LazyLock<Vec<FieldStrategy<f64>>> = LazyLock::new(|| {
    vec![
        FieldStrategy {
            name: "raw_maintenance_title",
            field: Field::HoaMonthly,
            rank: 40,
            matcher: Matcher::Pattern {
                haystack: Haystack::RawHtml,
                regex: table_regex(r#"(?is)class="title"[^>]*>Maintenance:</span>.*?>\$?(\d[\d,]*)"#),
                group: 1,
            },
            normalize: normalize::hoa_monthly,
        },
        text_pattern!(
            "text_hoa_fee",
            Field::HoaMonthly,
            70,
            r"(?i)\b(?:hoa|condo|strata)\s*(?:fees?|dues)?[:\s]*(\$?\s*\d[\d,]*)",
            normalize::hoa_monthly
        ),
        text_pattern!(
            "text_amount_per_month_hoa",
            Field::HoaMonthly,
            71,
            r"(?i)(\$\s*\d[\d,]*)\s*/\s*(?:month|mo)\s*(?:hoa|condo|strata)",
            normalize::hoa_monthly
        ),
        text_pattern!(
            "text_maintenance_fee",
            Field::HoaMonthly,
            72,
            r"(?i)maintenance\s*fees?[:\s]*(\$?\s*\d[\d,]*)",
            normalize::hoa_monthly
        ),
    ]
});

pub static ANNUAL_TAX: LazyLock<Vec<FieldStrategy<f64>>> = LazyLock::new(|| {
    vec![
        FieldStrategy {
            name: "raw_tax_title",
            field: Field::AnnualTax,
            rank: 40,
            matcher: Matcher::Pattern {
                haystack: Haystack::RawHtml,
                regex: table_regex(r#"(?is)class="title"[^>]*>Tax:</span>.*?>\$?(\d[\d,]*)"#),
                group: 1,
            },
            normalize: normalize::annual_tax,
        },
        text_pattern!(
            "text_annual_tax",
            Field::AnnualTax,
            70,
            r"(?i)annual\s*(?:property\s*)?tax(?:es)?[:\s]*(\$?\s*\d[\d,]*)",
            normalize::annual_tax
        ),
        text_pattern!(
            "text_property_tax",
            Field::AnnualTax,
            71,
            r"(?i)(?:property\s*)?tax(?:es)?[:\s]*(\$\s*\d[\d,]*)",
            normalize::annual_tax
        ),
        text_pattern!(
            "text_amount_per_year_tax",
            Field::AnnualTax,
            72,
            r"(?i)(\$\s*\d[\d,]*)\s*/\s*(?:year|yr)\s*(?:property\s*)?tax",
            normalize::annual_tax
        ),
    ]
});

pub static PROPERTY_TAX_RATE: LazyLock<Vec<FieldStrategy<f64>>> = LazyLock::new(|| {
    vec![
        text_pattern!(
            "text_tax_rate_label",
            Field::PropertyTaxRate,
            70,
            r"(?i)(?:property\s*)?tax\s*rate[:\s]*(\d+(?:\.\d+)?)\s*%",
            normalize::tax_rate
        ),
        text_pattern!(
            "text_percent_tax_rate",
            Field::PropertyTaxRate,
            71,
            r"(?i)(\d+(?:\.\d+)?)\s*%\s*(?:property\s*)?tax\s*rate",
            normalize::tax_rate
        ),
    ]
});

/// Compile a pattern from the tables above. They are literals, and the table
/// tests build every table, so a bad one fails there first.
fn table_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid strategy pattern {pattern:?}: {e}"))
}

// ---------------------------------------------------------------------------
// Custom matchers
// ---------------------------------------------------------------------------

fn jsonld_full_partial_baths(doc: &ListingDocument) -> Option<Value> {
    let full = doc.jsonld().find(LISTING_TYPES, &["numberOfFullBathrooms"])?.clone();
    let half = doc
        .jsonld()
        .find(LISTING_TYPES, &["numberOfPartialBathrooms"])
        .cloned()
        .unwrap_or(json!(0));
    Some(json!({ "full": full, "half": half }))
}

fn jsonld_residence_type(doc: &ListingDocument) -> Option<Value> {
    const LABELS: &[(&str, &str)] = &[
        ("SingleFamilyResidence", "Single Family"),
        ("Apartment", "Apartment"),
        ("House", "House"),
    ];
    LABELS
        .iter()
        .find(|(type_name, _)| !doc.jsonld().objects(type_name).is_empty())
        .map(|(_, label)| Value::String(label.to_string()))
}

/// Keyword and the label it stands for, in priority order
static TYPE_KEYWORDS: LazyLock<Vec<(Regex, &str)>> = LazyLock::new(|| {
    [
        ("single family", "Single Family"),
        ("condo", "Condo"),
        ("townhouse", "Townhouse"),
        ("multi-family", "Multi-Family"),
        ("apartment", "Apartment"),
        ("land", "Land"),
        ("mobile home", "Mobile Home"),
        ("manufactured", "Manufactured"),
    ]
    .into_iter()
    .map(|(keyword, label)| (table_regex(&format!(r"(?i)\b{}\b", regex::escape(keyword))), label))
    .collect()
});

fn property_type_keyword(doc: &ListingDocument) -> Option<Value> {
    let text = doc.visible_text();
    TYPE_KEYWORDS
        .iter()
        .find(|(re, _)| re.is_match(text))
        .map(|(_, label)| Value::String(label.to_string()))
}

fn readability_description(doc: &ListingDocument) -> Option<Value> {
    let text = readability_text(doc.raw(), doc.meta().og("url"));
    (!text.is_empty()).then_some(Value::String(text))
}

fn jsonld_image(doc: &ListingDocument) -> Option<Value> {
    match doc.jsonld().find(LISTING_TYPES, &["image"])? {
        Value::String(url) => Some(Value::String(url.clone())),
        Value::Object(image) => image
            .get("url")
            .or_else(|| image.get("contentUrl"))
            .filter(|v| v.is_string())
            .cloned(),
        _ => None,
    }
}

/// Video tour URL: a string, or a VideoObject's `contentUrl` / `url`.
fn jsonld_video(doc: &ListingDocument) -> Option<Value> {
    let video = doc
        .jsonld()
        .find(LISTING_TYPES, &["video"])
        .or_else(|| doc.jsonld().find(&["Product"], &["video"]))?;
    let video = match video {
        Value::Array(items) => items.first()?,
        other => other,
    };
    match video {
        Value::String(url) => Some(Value::String(url.clone())),
        Value::Object(obj) => obj
            .get("contentUrl")
            .or_else(|| obj.get("url"))
            .filter(|v| v.is_string())
            .cloned(),
        _ => None,
    }
}

fn coordinate_pair(lat: &str, lng: &str) -> Option<Value> {
    let lat: f64 = lat.trim().parse().ok()?;
    let lng: f64 = lng.trim().parse().ok()?;
    Some(json!({ "latitude": lat, "longitude": lng }))
}

fn meta_place_location(doc: &ListingDocument) -> Option<Value> {
    coordinate_pair(
        doc.meta().get("place:location:latitude")?,
        doc.meta().get("place:location:longitude")?,
    )
}

fn data_attribute_coordinates(doc: &ListingDocument) -> Option<Value> {
    select_attr_pair(doc.html(), "data-lat", "data-lng")
        .or_else(|| select_attr_pair(doc.html(), "data-latitude", "data-longitude"))
        .and_then(|(lat, lng)| coordinate_pair(&lat, &lng))
}

/// First object in any script variable that carries a numeric lat/lng pair,
/// e.g. a map widget's `center: {lat, lng}`.
fn script_coordinates(doc: &ListingDocument) -> Option<Value> {
    doc.js_vars()
        .iter()
        .find_map(|(_, value)| find_lat_lng(value, 0))
}

fn find_lat_lng(value: &Value, depth: usize) -> Option<Value> {
    if depth > JS_SEARCH_DEPTH {
        return None;
    }
    match value {
        Value::Object(obj) => {
            let number = |keys: &[&str]| {
                keys.iter()
                    .find_map(|k| obj.get(*k))
                    .and_then(|v| v.as_f64().or_else(|| v.as_str()?.trim().parse().ok()))
            };
            if let (Some(lat), Some(lng)) = (
                number(&["lat", "latitude"]),
                number(&["lng", "lon", "long", "longitude"]),
            ) {
                return Some(json!({ "latitude": lat, "longitude": lng }));
            }
            obj.values().find_map(|child| find_lat_lng(child, depth + 1))
        }
        Value::Array(items) => items.iter().find_map(|child| find_lat_lng(child, depth + 1)),
        _ => None,
    }
}

static LATITUDE_LONGITUDE_RE: LazyLock<Regex> = LazyLock::new(|| {
    table_regex(r#""latitude"\s*:\s*"?(-?\d+(?:\.\d+)?)"?\s*,\s*"longitude"\s*:\s*"?(-?\d+(?:\.\d+)?)"#)
});

/// `"lat": 1.0, "lng": 2.0` as well as unquoted `lat: 1.0, lng: 2.0`
static LAT_LNG_RE: LazyLock<Regex> = LazyLock::new(|| {
    table_regex(
        r#"\blat["']?\s*[:=]\s*["']?(-?\d+(?:\.\d+)?)["']?\s*,\s*["']?(?:lng|lon|long)["']?\s*[:=]\s*["']?(-?\d+(?:\.\d+)?)"#,
    )
});

/// First pair in the raw document that is a usable coordinate.
fn raw_pair(doc: &ListingDocument, re: &'static Regex) -> Option<Value> {
    re.captures_iter(doc.raw())
        .filter_map(|caps| coordinate_pair(caps.get(1)?.as_str(), caps.get(2)?.as_str()))
        .find(|pair| normalize::coordinates(pair, &LIMITLESS).is_some())
}

/// Coordinate validation ignores limits
const LIMITLESS: normalize::Limits = normalize::Limits {
    reference_year: 0,
    description_chars: 0,
};

fn raw_latitude_longitude(doc: &ListingDocument) -> Option<Value> {
    raw_pair(doc, &LATITUDE_LONGITUDE_RE)
}

fn raw_lat_lng(doc: &ListingDocument) -> Option<Value> {
    raw_pair(doc, &LAT_LNG_RE)
}
