//! Coordinate resolution
//!
//! Coordinates embedded in the page win. Only when none are found and a
//! street address was recovered does the resolver ask a [`Geocoder`].
//! Timeouts and empty or garbled answers leave the coordinates unset; an
//! unreachable service is reported so the caller can retry later.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::GeocoderConfig;
use crate::document::ListingDocument;
use crate::error::GeocodeError;
use crate::fields;
use crate::normalize::{Limits, PostalAddress};
use crate::strategy::{run_chain, ExtractionResult};

/// A validated latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Checked constructor: both values in geographic range, not `(0, 0)`.
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let in_range = (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude);
        let placeholder = latitude == 0.0 && longitude == 0.0;
        (in_range && !placeholder).then_some(Self {
            latitude,
            longitude,
        })
    }

    /// Like [`Coordinates::new`], but first undoes a swapped pair.
    ///
    /// A latitude outside ±90 can only be a longitude. A "latitude" in
    /// [-180, -50] paired with a "longitude" in [20, 70] is a North American
    /// location written the wrong way round.
    pub fn from_raw(lat: f64, lng: f64) -> Option<Self> {
        let swapped = !(-90.0..=90.0).contains(&lat)
            || ((-180.0..=-50.0).contains(&lat) && (20.0..=70.0).contains(&lng));
        if swapped {
            Self::new(lng, lat)
        } else {
            Self::new(lat, lng)
        }
    }
}

/// Address-to-coordinate lookup.
///
/// Implementations bound their own latency; a lookup that runs out of time
/// returns [`GeocodeError::TimedOut`].
pub trait Geocoder: Send + Sync {
    fn resolve(&self, address: &str) -> Result<Option<Coordinates>, GeocodeError>;
}

/// How the Coordinate Resolver ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeocodeStatus {
    /// Found in the page itself
    Embedded,
    Geocoded,
    /// The geocoder answered without a match
    NoMatch,
    TimedOut,
    /// Nothing embedded and no street address to look up
    SkippedNoAddress,
    /// Nothing embedded and no geocoder configured
    Disabled,
    Unavailable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub coordinates: ExtractionResult<Coordinates>,
    pub status: GeocodeStatus,
    /// Set when the geocoding service could not be reached at all
    pub outage: Option<String>,
}

impl Resolution {
    fn without(status: GeocodeStatus) -> Self {
        Self {
            coordinates: ExtractionResult::empty(),
            status,
            outage: None,
        }
    }
}

#[derive(Clone, Default)]
pub struct CoordinateResolver {
    geocoder: Option<Arc<dyn Geocoder>>,
}

impl CoordinateResolver {
    pub fn new(geocoder: Option<Arc<dyn Geocoder>>) -> Self {
        Self { geocoder }
    }

    pub fn resolve(
        &self,
        doc: &ListingDocument,
        address: Option<&PostalAddress>,
        limits: &Limits,
    ) -> Resolution {
        let embedded = run_chain(doc, &fields::COORDINATES, limits);
        if embedded.is_found() {
            return Resolution {
                coordinates: embedded,
                status: GeocodeStatus::Embedded,
                outage: None,
            };
        }

        let Some(address) = address.filter(|a| !a.street.trim().is_empty()) else {
            return Resolution::without(GeocodeStatus::SkippedNoAddress);
        };
        let Some(geocoder) = &self.geocoder else {
            return Resolution::without(GeocodeStatus::Disabled);
        };

        let query = geocode_query(address);
        match geocoder.resolve(&query) {
            Ok(Some(found)) => match Coordinates::new(found.latitude, found.longitude) {
                Some(coordinates) => Resolution {
                    coordinates: ExtractionResult {
                        value: Some(coordinates),
                        strategy: "geocoder",
                    },
                    status: GeocodeStatus::Geocoded,
                    outage: None,
                },
                None => Resolution::without(GeocodeStatus::NoMatch),
            },
            Ok(None) => Resolution::without(GeocodeStatus::NoMatch),
            Err(GeocodeError::TimedOut) => {
                tracing::warn!(source_file = doc.source_file(), %query, "geocoding timed out");
                Resolution::without(GeocodeStatus::TimedOut)
            }
            Err(GeocodeError::InvalidResponse(reason)) => {
                tracing::warn!(source_file = doc.source_file(), %query, %reason, "unusable geocoder response");
                Resolution::without(GeocodeStatus::NoMatch)
            }
            Err(GeocodeError::Unavailable(reason)) => {
                tracing::warn!(source_file = doc.source_file(), %reason, "geocoder unavailable");
                Resolution {
                    outage: Some(reason),
                    ..Resolution::without(GeocodeStatus::Unavailable)
                }
            }
        }
    }
}

impl std::fmt::Debug for CoordinateResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoordinateResolver")
            .field("geocoder", &self.geocoder.is_some())
            .finish()
    }
}

/// "street, city, state, zip" with missing parts left out.
pub fn geocode_query(address: &PostalAddress) -> String {
    [
        Some(address.street.as_str()),
        address.city.as_deref(),
        address.state.as_deref(),
        address.zip_code.as_deref(),
    ]
    .into_iter()
    .flatten()
    .filter(|part| !part.trim().is_empty())
    .collect::<Vec<_>>()
    .join(", ")
}

/// Geocoder backed by a Nominatim-compatible `/search` endpoint.
pub struct NominatimGeocoder {
    agent: ureq::Agent,
    search_url: String,
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

impl NominatimGeocoder {
    pub fn new(config: &GeocoderConfig) -> Self {
        let agent = ureq::Agent::new_with_config(
            ureq::Agent::config_builder()
                .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
                .user_agent(config.user_agent.as_str())
                .build(),
        );
        Self {
            agent,
            search_url: format!("{}/search", config.endpoint.trim_end_matches('/')),
        }
    }
}

impl Geocoder for NominatimGeocoder {
    fn resolve(&self, address: &str) -> Result<Option<Coordinates>, GeocodeError> {
        let response = self
            .agent
            .get(&self.search_url)
            .query("q", address)
            .query("format", "json")
            .query("limit", "1")
            .call();

        let body = match response {
            Ok(resp) => resp
                .into_body()
                .read_to_string()
                .map_err(|e| classify(e, &self.search_url))?,
            Err(e) => return Err(classify(e, &self.search_url)),
        };

        let places: Vec<NominatimPlace> = serde_json::from_str(&body)
            .map_err(|e| GeocodeError::InvalidResponse(e.to_string()))?;
        let Some(place) = places.first() else {
            return Ok(None);
        };

        let lat: f64 = place
            .lat
            .trim()
            .parse()
            .map_err(|_| GeocodeError::InvalidResponse(format!("latitude {:?}", place.lat)))?;
        let lon: f64 = place
            .lon
            .trim()
            .parse()
            .map_err(|_| GeocodeError::InvalidResponse(format!("longitude {:?}", place.lon)))?;
        Ok(Coordinates::new(lat, lon))
    }
}

/// Rate limiting and server errors are outages; other client errors mean the
/// query itself was rejected, which is the same as no match.
fn classify(error: ureq::Error, url: &str) -> GeocodeError {
    match error {
        ureq::Error::Timeout(_) => GeocodeError::TimedOut,
        ureq::Error::Io(e) if e.kind() == std::io::ErrorKind::TimedOut => GeocodeError::TimedOut,
        ureq::Error::StatusCode(code) if code == 429 || code >= 500 => {
            GeocodeError::Unavailable(format!("HTTP {} for {}", code, url))
        }
        ureq::Error::StatusCode(code) => {
            GeocodeError::InvalidResponse(format!("HTTP {} for {}", code, url))
        }
        other => GeocodeError::Unavailable(format!("Failed to fetch {}: {}", url, other)),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;

    const LIMITS: Limits = Limits {
        reference_year: 2026,
        description_chars: 2000,
    };

    /// Canned geocoder that records every query it receives.
    struct Scripted {
        answer: fn() -> Result<Option<Coordinates>, GeocodeError>,
        queries: Mutex<Vec<String>>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(answer: fn() -> Result<Option<Coordinates>, GeocodeError>) -> Arc<Self> {
            Arc::new(Self {
                answer,
                queries: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl Geocoder for Scripted {
        fn resolve(&self, address: &str) -> Result<Option<Coordinates>, GeocodeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.queries.lock().unwrap().push(address.to_string());
            (self.answer)()
        }
    }

    fn doc(html: &str) -> ListingDocument {
        ListingDocument::from_html(html, "listing.html").unwrap()
    }

    fn address() -> PostalAddress {
        PostalAddress {
            street: "123 Main St".into(),
            city: Some("Springfield".into()),
            state: Some("IL".into()),
            zip_code: Some("62701".into()),
            country: Some("US".into()),
        }
    }

    #[test]
    fn test_swap_detection() {
        let c = Coordinates::from_raw(-122.41, 37.77).unwrap();
        assert_eq!((c.latitude, c.longitude), (37.77, -122.41));

        let c = Coordinates::from_raw(-79.38, 43.65).unwrap();
        assert_eq!((c.latitude, c.longitude), (43.65, -79.38));

        // Southern hemisphere stays as given
        let c = Coordinates::from_raw(-33.86, 151.21).unwrap();
        assert_eq!((c.latitude, c.longitude), (-33.86, 151.21));

        assert_eq!(Coordinates::from_raw(0.0, 0.0), None);
        assert_eq!(Coordinates::from_raw(95.0, 200.0), None);
        assert_eq!(Coordinates::new(f64::NAN, 10.0), None);
    }

    #[test]
    fn test_embedded_coordinates_skip_geocoder() {
        let geocoder = Scripted::new(|| Ok(Some(Coordinates { latitude: 1.0, longitude: 1.0 })));
        let resolver = CoordinateResolver::new(Some(geocoder.clone()));
        let page = doc(r#"<div data-lat="39.78" data-lng="-89.65"></div>"#);

        let resolution = resolver.resolve(&page, Some(&address()), &LIMITS);

        assert_eq!(resolution.status, GeocodeStatus::Embedded);
        assert_eq!(resolution.coordinates.strategy, "data_lat_lng_attributes");
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_geocodes_full_address() {
        let geocoder = Scripted::new(|| Ok(Some(Coordinates { latitude: 39.78, longitude: -89.65 })));
        let resolver = CoordinateResolver::new(Some(geocoder.clone()));

        let resolution = resolver.resolve(&doc("<p>no map</p>"), Some(&address()), &LIMITS);

        assert_eq!(resolution.status, GeocodeStatus::Geocoded);
        assert_eq!(resolution.coordinates.strategy, "geocoder");
        assert_eq!(
            geocoder.queries.lock().unwrap().as_slice(),
            ["123 Main St, Springfield, IL, 62701"]
        );
    }

    #[test]
    fn test_no_address_means_no_lookup() {
        let geocoder = Scripted::new(|| Ok(None));
        let resolver = CoordinateResolver::new(Some(geocoder.clone()));
        let blank = PostalAddress {
            street: "  ".into(),
            ..Default::default()
        };

        assert_eq!(
            resolver.resolve(&doc("<p>x</p>"), None, &LIMITS).status,
            GeocodeStatus::SkippedNoAddress
        );
        assert_eq!(
            resolver.resolve(&doc("<p>x</p>"), Some(&blank), &LIMITS).status,
            GeocodeStatus::SkippedNoAddress
        );
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_failures_leave_coordinates_unset() {
        let page = doc("<p>no map</p>");

        let timed_out = CoordinateResolver::new(Some(Scripted::new(|| Err(GeocodeError::TimedOut))));
        let resolution = timed_out.resolve(&page, Some(&address()), &LIMITS);
        assert_eq!(resolution.status, GeocodeStatus::TimedOut);
        assert_eq!(resolution.coordinates.value, None);
        assert_eq!(resolution.outage, None);

        let garbled = CoordinateResolver::new(Some(Scripted::new(|| {
            Err(GeocodeError::InvalidResponse("not json".into()))
        })));
        assert_eq!(garbled.resolve(&page, Some(&address()), &LIMITS).status, GeocodeStatus::NoMatch);

        let down = CoordinateResolver::new(Some(Scripted::new(|| {
            Err(GeocodeError::Unavailable("HTTP 503".into()))
        })));
        let resolution = down.resolve(&page, Some(&address()), &LIMITS);
        assert_eq!(resolution.status, GeocodeStatus::Unavailable);
        assert_eq!(resolution.coordinates.value, None);
        assert_eq!(resolution.outage.as_deref(), Some("HTTP 503"));

        let disabled = CoordinateResolver::default();
        assert_eq!(disabled.resolve(&page, Some(&address()), &LIMITS).status, GeocodeStatus::Disabled);
    }

    #[test]
    fn test_geocode_query_skips_missing_parts() {
        let partial = PostalAddress {
            street: "9 Elm Ave".into(),
            state: Some("TX".into()),
            ..Default::default()
        };
        assert_eq!(geocode_query(&partial), "9 Elm Ave, TX");
    }
}
