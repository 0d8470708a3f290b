//! Value normalization
//!
//! Turns raw candidates (strings like `"$425,000"` or `"2 full / 1 half"`,
//! JSON numbers, small JSON objects) into typed values that satisfy the
//! record's domain constraints. Anything that does not fit yields `None`,
//! which sends the strategy chain on to its next strategy.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ExtractorConfig;
use crate::extractors::{clean_text, truncate_chars};
use crate::geo::Coordinates;

pub const SQFT_PER_ACRE: f64 = 43_560.0;
pub const SQFT_PER_SQUARE_METRE: f64 = 10.7639;
pub const ACRES_PER_HECTARE: f64 = 2.471_05;

/// Oldest plausible year of construction
pub const EARLIEST_YEAR_BUILT: i32 = 1700;

static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d[\d,]*(?:\.\d+)?").unwrap());
static AMOUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(-?)[$€£¥]?\s?(\d[\d,]*(?:\.\d+)?)").unwrap());
static FULL_HALF_BATHS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*full\b.*?(\d+)\s*(?:half|partial)\b").unwrap());
static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(\d{4})\b").unwrap());

static SQUARE_FEET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:sq\.?\s*f(?:ee)?t|sqft|square\s*f(?:ee|oo)t|sf\b|ft²|ft2\b)").unwrap()
});
static SQUARE_METRES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:m²|m2\b|sq\.?\s*m\b|sqm|square\s*met(?:er|re)s?)").unwrap()
});
static HECTARES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*(?:hectares?|ha\b)").unwrap());

const POSTAL_CODE: &str = r"[A-Z]\d[A-Z]\s*\d[A-Z]\d";

static CANADIAN_ADDRESS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i),\s*([^,]+),\s*([A-Z]{{2}})\s*({POSTAL_CODE})")).unwrap()
});
/// Same shape with the province spelled out
static PROVINCE_NAME_ADDRESS_RE: LazyLock<Regex> = LazyLock::new(|| {
    let names: Vec<String> = PROVINCES.iter().map(|(name, _)| regex::escape(name)).collect();
    Regex::new(&format!(
        r"(?i),\s*([^,]+),\s*({})\s*({POSTAL_CODE})",
        names.join("|")
    ))
    .unwrap()
});
static US_ADDRESS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*([^,]+),\s*([A-Z]{2})\s*(\d{5}(?:-\d{4})?)").unwrap());
static CITY_STATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*([^,]+),\s*([A-Z]{2})\s*$").unwrap());

/// Canadian province and territory names to postal abbreviations
pub const PROVINCES: &[(&str, &str)] = &[
    ("british columbia", "BC"),
    ("ontario", "ON"),
    ("quebec", "QC"),
    ("alberta", "AB"),
    ("manitoba", "MB"),
    ("saskatchewan", "SK"),
    ("nova scotia", "NS"),
    ("new brunswick", "NB"),
    ("newfoundland and labrador", "NL"),
    ("prince edward island", "PE"),
    ("northwest territories", "NT"),
    ("yukon", "YT"),
    ("nunavut", "NU"),
];

/// Bounds that depend on configuration rather than on the value itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limits {
    pub reference_year: i32,
    pub description_chars: usize,
}

impl From<&ExtractorConfig> for Limits {
    fn from(config: &ExtractorConfig) -> Self {
        Self {
            reference_year: config.reference_year,
            description_chars: config.description_limit,
        }
    }
}

/// Street address split into components.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostalAddress {
    pub street: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
}

// ---------------------------------------------------------------------------
// Text-level parsers
// ---------------------------------------------------------------------------

/// First number in `text` with thousands separators removed, and the byte
/// offset just past it.
pub fn first_number(text: &str) -> Option<(f64, usize)> {
    let m = NUMBER_RE.find(text)?;
    let value: f64 = m.as_str().replace(',', "").parse().ok()?;
    value.is_finite().then_some((value, m.end()))
}

/// Currency amount: symbols and separators are dropped. A minus sign directly
/// in front of the amount makes it negative.
pub fn parse_amount(text: &str) -> Option<f64> {
    let caps = AMOUNT_RE.captures(text)?;
    let digits = caps.get(2)?.as_str().replace(',', "");
    let value: f64 = digits.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(if caps.get(1).is_some_and(|m| !m.as_str().is_empty()) {
        -value
    } else {
        value
    })
}

/// Bathroom count in half steps: `"2.5 ba"`, `"2 full / 1 half"`.
pub fn parse_bathrooms(text: &str) -> Option<f64> {
    let lower = text.to_ascii_lowercase();
    let value = match FULL_HALF_BATHS_RE.captures(&lower) {
        Some(caps) => {
            let full: f64 = caps.get(1)?.as_str().parse().ok()?;
            let half: f64 = caps.get(2)?.as_str().parse().ok()?;
            full + 0.5 * half
        }
        None => first_number(&lower)?.0,
    };
    half_step(value)
}

fn half_step(value: f64) -> Option<f64> {
    ((0.0..20.0).contains(&value) && (value * 2.0).fract() == 0.0).then_some(value)
}

/// Floor area in square feet. Square metres are converted.
pub fn parse_area_sqft(text: &str) -> Option<u32> {
    let lower = text.to_lowercase();
    let (value, end) = first_number(&lower)?;
    let unit = &lower[end..];
    let sqft = if is_square_metres(unit) {
        value * SQFT_PER_SQUARE_METRE
    } else {
        value
    };
    positive_u32(sqft)
}

/// Lot size in acres.
///
/// Square feet, square metres and hectares are converted. A number with no
/// recognizable unit is taken to be acres, so unitless square-foot figures
/// are misread: "Lot: 5000" comes out as 5000 acres. Only results of 10000
/// acres or more are rejected.
pub fn parse_lot_acres(text: &str) -> Option<f64> {
    let lower = text.to_lowercase();
    let (value, end) = first_number(&lower)?;
    let unit = &lower[end..];
    let acres = if is_square_feet(unit) {
        value / SQFT_PER_ACRE
    } else if is_square_metres(unit) {
        value * SQFT_PER_SQUARE_METRE / SQFT_PER_ACRE
    } else if is_hectares(unit) {
        value * ACRES_PER_HECTARE
    } else {
        value
    };
    (acres > 0.0 && acres < 10_000.0).then(|| round_to(acres, 4))
}

fn is_square_feet(unit: &str) -> bool {
    SQUARE_FEET_RE.is_match(unit)
}

fn is_square_metres(unit: &str) -> bool {
    SQUARE_METRES_RE.is_match(unit)
}

fn is_hectares(unit: &str) -> bool {
    HECTARES_RE.is_match(unit)
}

/// Four-digit year no earlier than 1700 and no later than next year.
pub fn parse_year(text: &str, reference_year: i32) -> Option<i32> {
    let year: i32 = YEAR_RE.captures(text)?.get(1)?.as_str().parse().ok()?;
    plausible_year(year, reference_year)
}

fn plausible_year(year: i32, reference_year: i32) -> Option<i32> {
    (EARLIEST_YEAR_BUILT..=reference_year + 1)
        .contains(&year)
        .then_some(year)
}

/// Split a one-line address into street, city, state/province and postal code.
///
/// Canadian (`City, BC V6B 1A1`, full province names too) and US
/// (`City, ST 12345`, `City, ST`) shapes are recognized. When none fits, the
/// whole line is the street and the other components stay empty.
pub fn split_address(line: &str) -> PostalAddress {
    let line = clean_text(line);
    let line = line.trim_end_matches([',', ' ']).to_string();

    let unsplit = PostalAddress {
        street: line.clone(),
        ..Default::default()
    };

    if let Some(address) = split_with(&line, &CANADIAN_ADDRESS_RE, |caps| {
        Some((
            caps.get(1)?.as_str().trim().to_string(),
            Some(caps.get(2)?.as_str().to_ascii_uppercase()),
            Some(canadian_postal_code(caps.get(3)?.as_str())),
            Some("CA".to_string()),
        ))
    }) {
        return address;
    }

    if let Some(address) = split_with(&line, &PROVINCE_NAME_ADDRESS_RE, |caps| {
        Some((
            caps.get(1)?.as_str().trim().to_string(),
            normalize_region(caps.get(2)?.as_str()),
            Some(canadian_postal_code(caps.get(3)?.as_str())),
            Some("CA".to_string()),
        ))
    }) {
        return address;
    }

    if let Some(address) = split_with(&line, &US_ADDRESS_RE, |caps| {
        Some((
            caps.get(1)?.as_str().trim().to_string(),
            Some(caps.get(2)?.as_str().to_string()),
            Some(caps.get(3)?.as_str().to_string()),
            Some("US".to_string()),
        ))
    }) {
        return address;
    }

    if let Some(address) = split_with(&line, &CITY_STATE_RE, |caps| {
        Some((
            caps.get(1)?.as_str().trim().to_string(),
            Some(caps.get(2)?.as_str().to_string()),
            None,
            None,
        ))
    }) {
        return address;
    }

    unsplit
}

type Components = (String, Option<String>, Option<String>, Option<String>);

fn split_with(
    line: &str,
    re: &Regex,
    components: impl Fn(&regex::Captures<'_>) -> Option<Components>,
) -> Option<PostalAddress> {
    let caps = re.captures(line)?;
    let street = line[..caps.get(0)?.start()].trim().trim_end_matches(',');
    if street.is_empty() {
        return None;
    }
    let (city, state, zip_code, country) = components(&caps)?;
    Some(PostalAddress {
        street: street.to_string(),
        city: Some(city).filter(|c| !c.is_empty()),
        state,
        zip_code,
        country,
    })
}

fn canadian_postal_code(raw: &str) -> String {
    raw.to_ascii_uppercase().replace(' ', "")
}

/// Province names become their two-letter code; two-letter codes are uppercased.
pub fn normalize_region(region: &str) -> Option<String> {
    let region = clean_text(region);
    if region.is_empty() {
        return None;
    }
    let lower = region.to_lowercase();
    if let Some((_, abbrev)) = PROVINCES.iter().find(|(name, _)| *name == lower) {
        return Some(abbrev.to_string());
    }
    if region.len() == 2 && region.chars().all(|c| c.is_ascii_alphabetic()) {
        return Some(region.to_ascii_uppercase());
    }
    Some(region)
}

// ---------------------------------------------------------------------------
// Candidate normalizers
// ---------------------------------------------------------------------------

/// Candidate as text: strings are trimmed, numbers are rendered.
fn as_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then_some(Cow::Borrowed(trimmed))
        }
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        _ => None,
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

fn positive_u32(value: f64) -> Option<u32> {
    let rounded = value.round();
    (rounded >= 1.0 && rounded <= u32::MAX as f64).then_some(rounded as u32)
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Whole number in `range`; fractional values are rejected.
fn whole_in(value: &Value, range: std::ops::Range<u32>) -> Option<u32> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        _ => first_number(&as_text(value)?)?.0,
    };
    if number.fract() != 0.0 || number < 0.0 {
        return None;
    }
    let whole = number as u32;
    range.contains(&whole).then_some(whole)
}

/// Asking price; zero and negative amounts are rejected.
pub fn price(value: &Value, _: &Limits) -> Option<f64> {
    let amount = match value {
        Value::Number(n) => n.as_f64()?,
        _ => parse_amount(&as_text(value)?)?,
    };
    (amount > 0.0 && amount < 1e12).then(|| round_to(amount, 2))
}

/// Price found by free-text patterns; small amounts are more likely fees or
/// discounts than the asking price.
pub fn listing_price(value: &Value, limits: &Limits) -> Option<f64> {
    price(value, limits).filter(|p| *p > 10_000.0)
}

pub fn bedrooms(value: &Value, _: &Limits) -> Option<u32> {
    whole_in(value, 0..20)
}

pub fn bathrooms(value: &Value, _: &Limits) -> Option<f64> {
    match value {
        Value::Number(n) => half_step(n.as_f64()?),
        Value::Object(obj) => {
            // {"full": 2, "half": 1}
            let full = obj.get("full").and_then(as_f64)?;
            let half = obj.get("half").and_then(as_f64).unwrap_or(0.0);
            half_step(full + 0.5 * half)
        }
        _ => parse_bathrooms(&as_text(value)?),
    }
}

/// Floor area in square feet from text, a number, or a schema.org
/// QuantitativeValue (`{"value": 1495, "unitCode": "FTK"}`).
pub fn floor_area(value: &Value, _: &Limits) -> Option<u32> {
    match value {
        Value::Object(obj) => {
            let amount = obj.get("value").and_then(as_f64)?;
            let unit = obj.get("unitCode").or_else(|| obj.get("unitText"));
            let unit = unit.and_then(Value::as_str).unwrap_or("").to_ascii_uppercase();
            match unit.as_str() {
                "MTK" | "SQM" | "M2" | "M²" => positive_u32(amount * SQFT_PER_SQUARE_METRE),
                "" | "FTK" | "SQF" | "SQFT" | "SQ FT" => positive_u32(amount),
                _ => None,
            }
        }
        Value::Number(n) => positive_u32(n.as_f64()?),
        _ => parse_area_sqft(&as_text(value)?),
    }
}

/// Floor area found by free-text patterns, restricted to house-sized values.
pub fn plausible_floor_area(value: &Value, limits: &Limits) -> Option<u32> {
    floor_area(value, limits).filter(|sqft| (101..100_000).contains(sqft))
}

pub fn lot_acres(value: &Value, _: &Limits) -> Option<f64> {
    match value {
        Value::Object(obj) => {
            let amount = obj.get("value").and_then(as_f64)?;
            let unit = obj.get("unitCode").or_else(|| obj.get("unitText"));
            let unit = unit.and_then(Value::as_str).unwrap_or("");
            parse_lot_acres(&format!("{amount} {}", unit_code_to_text(unit)))
        }
        Value::Number(n) => parse_lot_acres(&n.to_string()),
        _ => parse_lot_acres(&as_text(value)?),
    }
}

fn unit_code_to_text(unit: &str) -> &str {
    match unit.to_ascii_uppercase().as_str() {
        "FTK" | "SQF" => "sqft",
        "MTK" | "SQM" => "sqm",
        "HAR" => "hectares",
        "ACR" => "acres",
        _ => unit,
    }
}

pub fn year_built(value: &Value, limits: &Limits) -> Option<i32> {
    match value {
        Value::Number(n) => {
            let year = i32::try_from(n.as_i64()?).ok()?;
            plausible_year(year, limits.reference_year)
        }
        _ => parse_year(&as_text(value)?, limits.reference_year),
    }
}

/// Free-text label such as "Single Family" or "Condo".
pub fn property_type(value: &Value, _: &Limits) -> Option<String> {
    let label = clean_text(&as_text(value)?);
    let has_letters = label.chars().any(char::is_alphabetic);
    (has_letters && label.chars().count() <= 60).then_some(label)
}

pub fn description(value: &Value, limits: &Limits) -> Option<String> {
    let text = clean_text(&as_text(value)?);
    (!text.is_empty()).then(|| truncate_chars(&text, limits.description_chars).to_string())
}

/// Description read from page markup; short fragments are usually labels.
pub fn long_description(value: &Value, limits: &Limits) -> Option<String> {
    let text = clean_text(&as_text(value)?);
    (text.chars().count() > 50).then(|| truncate_chars(&text, limits.description_chars).to_string())
}

/// Absolute http(s) URL.
pub fn http_url(value: &Value, _: &Limits) -> Option<String> {
    let url = url::Url::parse(as_text(value)?.as_ref()).ok()?;
    matches!(url.scheme(), "http" | "https").then(|| url.to_string())
}

/// ISO 4217 style three-letter code.
pub fn currency_code(value: &Value, _: &Limits) -> Option<String> {
    let code = as_text(value)?;
    (code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()))
        .then(|| code.to_ascii_uppercase())
}

pub fn room_count(value: &Value, _: &Limits) -> Option<u32> {
    whole_in(value, 1..100)
}

pub fn garage_spaces(value: &Value, _: &Limits) -> Option<u32> {
    whole_in(value, 1..20)
}

/// Monthly HOA / condo / strata fee in dollars.
pub fn hoa_monthly(value: &Value, limits: &Limits) -> Option<f64> {
    price(value, limits).filter(|fee| (50.0..=5_000.0).contains(fee))
}

/// Annual property tax in dollars.
pub fn annual_tax(value: &Value, limits: &Limits) -> Option<f64> {
    price(value, limits).filter(|tax| (100.0..=100_000.0).contains(tax))
}

/// Property tax rate as a fraction: `"1.2"` (percent) becomes `0.012`.
/// Rates outside 0.1%..5% are rejected.
pub fn tax_rate(value: &Value, _: &Limits) -> Option<f64> {
    let percent = match value {
        Value::Number(n) => n.as_f64()?,
        _ => first_number(&as_text(value)?)?.0,
    };
    let rate = round_to(percent / 100.0, 6);
    (0.001..=0.05).contains(&rate).then_some(rate)
}

/// MLS listing number: at least five characters, letters/digits/hyphens,
/// and at least one digit.
pub fn mls_id(value: &Value, _: &Limits) -> Option<String> {
    let id = as_text(value)?.trim().to_string();
    let well_formed = id.len() >= 5
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        && id.chars().any(|c| c.is_ascii_digit());
    well_formed.then_some(id)
}

/// Address from a one-line string or a schema.org PostalAddress object.
pub fn postal_address(value: &Value, _: &Limits) -> Option<PostalAddress> {
    match value {
        Value::Object(obj) => {
            let street = clean_text(obj.get("streetAddress").and_then(Value::as_str)?);
            if street.is_empty() {
                return None;
            }
            let text = |key: &str| {
                obj.get(key)
                    .and_then(Value::as_str)
                    .map(clean_text)
                    .filter(|s| !s.is_empty())
            };
            let country = match obj.get("addressCountry") {
                Some(Value::String(s)) => Some(clean_text(s)),
                Some(Value::Object(c)) => c.get("name").and_then(Value::as_str).map(clean_text),
                _ => None,
            }
            .filter(|s| !s.is_empty());

            let mut address = PostalAddress {
                street: street.clone(),
                city: text("addressLocality"),
                state: text("addressRegion").and_then(|r| normalize_region(&r)),
                zip_code: text("postalCode"),
                country,
            };

            // Some sites put the whole line into streetAddress
            if address.city.is_none() && address.state.is_none() && address.zip_code.is_none() {
                let split = split_address(&street);
                address.street = split.street;
                address.city = split.city;
                address.state = split.state;
                address.zip_code = split.zip_code;
                address.country = address.country.or(split.country);
            }
            Some(address)
        }
        _ => {
            let line = as_text(value)?;
            let address = split_address(&line);
            (!address.street.is_empty()).then_some(address)
        }
    }
}

/// Coordinate pair from `{"latitude": .., "longitude": ..}` (numbers or
/// numeric strings); swapped pairs are corrected, out-of-range pairs rejected.
pub fn coordinates(value: &Value, _: &Limits) -> Option<Coordinates> {
    let lat = value.get("latitude").and_then(as_f64)?;
    let lng = value.get("longitude").and_then(as_f64)?;
    Coordinates::from_raw(lat, lng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const LIMITS: Limits = Limits {
        reference_year: 2026,
        description_chars: 2000,
    };

    fn s(text: &str) -> Value {
        Value::String(text.to_string())
    }

    #[test]
    fn test_price() {
        assert_eq!(price(&s("$425,000"), &LIMITS), Some(425_000.0));
        assert_eq!(price(&s("$1,234.56 USD"), &LIMITS), Some(1234.56));
        assert_eq!(price(&json!(999900), &LIMITS), Some(999_900.0));
        assert_eq!(price(&s("999,900"), &LIMITS), Some(999_900.0));
        assert_eq!(price(&s("$0"), &LIMITS), None);
        assert_eq!(price(&s("-$5,000"), &LIMITS), None);
        assert_eq!(price(&s("Contact agent"), &LIMITS), None);
        assert_eq!(price(&s(""), &LIMITS), None);
    }

    #[test]
    fn test_separator_dash_is_not_a_minus_sign() {
        assert_eq!(price(&s("Listed - $425,000"), &LIMITS), Some(425_000.0));
    }

    #[test]
    fn test_listing_price_threshold() {
        assert_eq!(listing_price(&s("$2,500"), &LIMITS), None);
        assert_eq!(listing_price(&s("$725,000"), &LIMITS), Some(725_000.0));
    }

    #[test]
    fn test_bathrooms() {
        assert_eq!(bathrooms(&s("2.5 ba"), &LIMITS), Some(2.5));
        assert_eq!(bathrooms(&s("2.25 ba"), &LIMITS), None);
        assert_eq!(bathrooms(&s("2 full / 1 half"), &LIMITS), Some(2.5));
        assert_eq!(bathrooms(&s("3 Full Baths, 2 Half Baths"), &LIMITS), Some(4.0));
        assert_eq!(bathrooms(&json!(2), &LIMITS), Some(2.0));
        assert_eq!(bathrooms(&json!({"full": 1, "half": 1}), &LIMITS), Some(1.5));
        assert_eq!(bathrooms(&s("45 baths"), &LIMITS), None);
    }

    #[test]
    fn test_bedrooms() {
        assert_eq!(bedrooms(&s("3 bd"), &LIMITS), Some(3));
        assert_eq!(bedrooms(&json!(0), &LIMITS), Some(0));
        assert_eq!(bedrooms(&json!(2.5), &LIMITS), None);
        assert_eq!(bedrooms(&s("25 beds"), &LIMITS), None);
    }

    #[test]
    fn test_floor_area() {
        assert_eq!(floor_area(&s("1,850 sqft"), &LIMITS), Some(1850));
        assert_eq!(floor_area(&s("0 sqft"), &LIMITS), None);
        assert_eq!(floor_area(&s("100 m²"), &LIMITS), Some(1076));
        assert_eq!(floor_area(&json!({"value": 1495, "unitCode": "FTK"}), &LIMITS), Some(1495));
        assert_eq!(floor_area(&json!({"value": 100, "unitCode": "MTK"}), &LIMITS), Some(1076));
        assert_eq!(floor_area(&json!({"value": 3, "unitCode": "ACR"}), &LIMITS), None);
        assert_eq!(plausible_floor_area(&s("12 sqft"), &LIMITS), None);
    }

    #[test]
    fn test_lot_acres() {
        assert_eq!(lot_acres(&s("0.25 acres"), &LIMITS), Some(0.25));
        assert_eq!(lot_acres(&s("10,890 sq ft lot"), &LIMITS), Some(0.25));
        assert_eq!(lot_acres(&s("Lot: 2 ha"), &LIMITS), Some(4.9421));
        assert_eq!(lot_acres(&json!({"value": 21780, "unitCode": "FTK"}), &LIMITS), Some(0.5));
        // Unitless figures are read as acres
        assert_eq!(lot_acres(&s("Lot: 1.5"), &LIMITS), Some(1.5));
        assert_eq!(lot_acres(&s("Lot: 5000"), &LIMITS), Some(5000.0));
        assert_eq!(lot_acres(&s("Lot: 43560"), &LIMITS), None);
        assert_eq!(lot_acres(&s("0 acres"), &LIMITS), None);
    }

    #[test]
    fn test_year_built() {
        assert_eq!(year_built(&s("1895"), &LIMITS), Some(1895));
        assert_eq!(year_built(&s("3025"), &LIMITS), None);
        assert_eq!(year_built(&s("Built in 2027"), &LIMITS), Some(2027));
        assert_eq!(year_built(&s("2028"), &LIMITS), None);
        assert_eq!(year_built(&json!(1650), &LIMITS), None);
        assert_eq!(year_built(&json!(2001), &LIMITS), Some(2001));
    }

    #[test]
    fn test_split_us_address() {
        let address = split_address("123 Main St, Springfield, IL 62701");
        assert_eq!(address.street, "123 Main St");
        assert_eq!(address.city.as_deref(), Some("Springfield"));
        assert_eq!(address.state.as_deref(), Some("IL"));
        assert_eq!(address.zip_code.as_deref(), Some("62701"));
        assert_eq!(address.country.as_deref(), Some("US"));

        let no_zip = split_address("9 Elm Ave, Austin, TX");
        assert_eq!(no_zip.city.as_deref(), Some("Austin"));
        assert_eq!(no_zip.state.as_deref(), Some("TX"));
        assert_eq!(no_zip.zip_code, None);
    }

    #[test]
    fn test_split_canadian_address() {
        let address = split_address("123 Main St, Vancouver, BC V6B 1A1");
        assert_eq!(address.street, "123 Main St");
        assert_eq!(address.city.as_deref(), Some("Vancouver"));
        assert_eq!(address.state.as_deref(), Some("BC"));
        assert_eq!(address.zip_code.as_deref(), Some("V6B1A1"));
        assert_eq!(address.country.as_deref(), Some("CA"));

        let full = split_address("456 Oak Rd, Toronto, Ontario m5v 2t6");
        assert_eq!(full.city.as_deref(), Some("Toronto"));
        assert_eq!(full.state.as_deref(), Some("ON"));
        assert_eq!(full.zip_code.as_deref(), Some("M5V2T6"));

        let two_words = split_address("7 Pine Cres, Victoria, British Columbia V8W 1N4");
        assert_eq!(two_words.street, "7 Pine Cres");
        assert_eq!(two_words.city.as_deref(), Some("Victoria"));
        assert_eq!(two_words.state.as_deref(), Some("BC"));
        assert_eq!(two_words.zip_code.as_deref(), Some("V8W1N4"));
    }

    #[test]
    fn test_tax_rate() {
        assert_eq!(tax_rate(&s("1.2"), &LIMITS), Some(0.012));
        assert_eq!(tax_rate(&json!(0.5), &LIMITS), Some(0.005));
        assert_eq!(tax_rate(&s("0.05"), &LIMITS), None);
        assert_eq!(tax_rate(&s("7"), &LIMITS), None);
        assert_eq!(tax_rate(&s("n/a"), &LIMITS), None);
    }

    #[test]
    fn test_unsplittable_address_keeps_full_line() {
        let address = split_address("  123 Main St  ");
        assert_eq!(address.street, "123 Main St");
        assert_eq!(address.city, None);
        assert_eq!(address.state, None);
        assert_eq!(address.zip_code, None);
    }

    #[test]
    fn test_postal_address_object() {
        let value = json!({
            "@type": "PostalAddress",
            "streetAddress": "123 Test Street",
            "addressLocality": "Vancouver",
            "addressRegion": "British Columbia",
            "postalCode": "V6B1A1",
            "addressCountry": "CA"
        });
        let address = postal_address(&value, &LIMITS).unwrap();
        assert_eq!(address.street, "123 Test Street");
        assert_eq!(address.city.as_deref(), Some("Vancouver"));
        assert_eq!(address.state.as_deref(), Some("BC"));
        assert_eq!(address.country.as_deref(), Some("CA"));

        let whole_line = json!({"streetAddress": "9 Elm Ave, Austin, TX 78701"});
        let address = postal_address(&whole_line, &LIMITS).unwrap();
        assert_eq!(address.street, "9 Elm Ave");
        assert_eq!(address.zip_code.as_deref(), Some("78701"));

        assert_eq!(postal_address(&json!({"addressLocality": "Austin"}), &LIMITS), None);
    }

    #[test]
    fn test_mls_id() {
        assert_eq!(mls_id(&s("R3065322"), &LIMITS), Some("R3065322".to_string()));
        assert_eq!(mls_id(&s("listing"), &LIMITS), None);
        assert_eq!(mls_id(&s("R12"), &LIMITS), None);
    }

    #[test]
    fn test_description_truncated() {
        let limits = Limits {
            description_chars: 10,
            ..LIMITS
        };
        assert_eq!(
            description(&s("  Bright   corner unit with views "), &limits),
            Some("Bright cor".to_string())
        );
        assert_eq!(long_description(&s("Too short"), &LIMITS), None);
    }

    #[test]
    fn test_misc_fields() {
        assert_eq!(currency_code(&s("cad"), &LIMITS), Some("CAD".to_string()));
        assert_eq!(currency_code(&s("$"), &LIMITS), None);
        assert_eq!(
            http_url(&s("https://example.com/home/1"), &LIMITS),
            Some("https://example.com/home/1".to_string())
        );
        assert_eq!(http_url(&s("/home/1"), &LIMITS), None);
        assert_eq!(hoa_monthly(&s("$668/month"), &LIMITS), Some(668.0));
        assert_eq!(hoa_monthly(&s("$12"), &LIMITS), None);
        assert_eq!(annual_tax(&s("$3,402 / 2025"), &LIMITS), Some(3402.0));
        assert_eq!(garage_spaces(&s("2 car garage"), &LIMITS), Some(2));
        assert_eq!(property_type(&s("  Single   Family "), &LIMITS), Some("Single Family".to_string()));
        assert_eq!(property_type(&s("12345"), &LIMITS), None);
    }

    #[test]
    fn test_coordinates_candidate() {
        let c = coordinates(&json!({"latitude": "37.77", "longitude": -122.41}), &LIMITS).unwrap();
        assert_eq!(c.latitude, 37.77);
        assert_eq!(c.longitude, -122.41);
        assert_eq!(coordinates(&json!({"latitude": 37.77}), &LIMITS), None);
        assert_eq!(coordinates(&json!({"latitude": 0, "longitude": 0}), &LIMITS), None);
    }
}
