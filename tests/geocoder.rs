use std::sync::Arc;
use std::time::Duration;

use listing_extract::{
    ExtractError, ExtractorConfig, GeocodeError, GeocodeStatus, Geocoder, GeocoderConfig,
    ListingExtractor, NominatimGeocoder,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LISTING: &str = r#"<html><head>
<script type="application/ld+json">
{
    "@context": "https://schema.org",
    "@type": "SingleFamilyResidence",
    "address": {
        "@type": "PostalAddress",
        "streetAddress": "123 Main St",
        "addressLocality": "Springfield",
        "addressRegion": "IL",
        "postalCode": "62701"
    }
}
</script>
</head><body><p>3 beds</p></body></html>"#;

fn config_for(server: &MockServer, timeout_secs: u64) -> GeocoderConfig {
    GeocoderConfig {
        enabled: true,
        endpoint: server.uri(),
        user_agent: "listing-extract-tests".to_string(),
        timeout_secs,
    }
}

/// ureq blocks, so lookups run off the runtime thread that serves the mock
async fn lookup(config: GeocoderConfig, address: &str) -> Result<Option<(f64, f64)>, GeocodeError> {
    let address = address.to_string();
    tokio::task::spawn_blocking(move || {
        NominatimGeocoder::new(&config)
            .resolve(&address)
            .map(|found| found.map(|c| (c.latitude, c.longitude)))
    })
    .await
    .unwrap()
}

// ============================================================================
// NominatimGeocoder
// ============================================================================

#[tokio::test]
async fn nominatim_returns_first_match() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "123 Main St, Springfield, IL, 62701"))
        .and(query_param("format", "json"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"[{"lat": "39.7817", "lon": "-89.6501", "display_name": "123 Main St"}]"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = lookup(config_for(&mock_server, 5), "123 Main St, Springfield, IL, 62701").await;

    assert_eq!(result.unwrap(), Some((39.7817, -89.6501)));
}

#[tokio::test]
async fn nominatim_empty_result_is_no_match() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .mount(&mock_server)
        .await;

    let result = lookup(config_for(&mock_server, 5), "nowhere").await;

    assert_eq!(result.unwrap(), None);
}

#[tokio::test]
async fn nominatim_rate_limited_is_unavailable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&mock_server)
        .await;

    let result = lookup(config_for(&mock_server, 5), "123 Main St").await;

    assert!(matches!(result, Err(GeocodeError::Unavailable(_))));
}

#[tokio::test]
async fn nominatim_malformed_json_is_invalid_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not valid json}"))
        .mount(&mock_server)
        .await;

    let result = lookup(config_for(&mock_server, 5), "123 Main St").await;

    assert!(matches!(result, Err(GeocodeError::InvalidResponse(_))));
}

#[tokio::test]
async fn nominatim_slow_response_times_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("[]")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let result = lookup(config_for(&mock_server, 1), "123 Main St").await;

    assert!(matches!(result, Err(GeocodeError::TimedOut)));
}

// ============================================================================
// Extraction with a live geocoder
// ============================================================================

fn extractor_for(server: &MockServer) -> ListingExtractor {
    let config = ExtractorConfig {
        geocoder: config_for(server, 5),
        ..ExtractorConfig::default()
    };
    ListingExtractor::from_config(config)
}

#[tokio::test]
async fn extraction_geocodes_address_without_embedded_coordinates() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"[{"lat": "39.7817", "lon": "-89.6501"}]"#),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let extractor = Arc::new(extractor_for(&mock_server));
    let extraction = tokio::task::spawn_blocking(move || extractor.extract(LISTING.as_bytes(), "main.html"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(extraction.geocode, GeocodeStatus::Geocoded);
    assert_eq!(extraction.record.latitude, Some(39.7817));
    assert_eq!(extraction.record.longitude, Some(-89.6501));
    assert_eq!(extraction.provenance.get("coordinates"), Some(&"geocoder"));
}

#[tokio::test]
async fn extraction_reports_outage_with_record_attached() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let extractor = Arc::new(extractor_for(&mock_server));
    let result = tokio::task::spawn_blocking(move || extractor.extract(LISTING.as_bytes(), "main.html"))
        .await
        .unwrap();

    let err = result.unwrap_err();
    assert!(matches!(err, ExtractError::GeocoderUnavailable { .. }));
    let partial = err.into_partial_extraction().unwrap();
    assert_eq!(partial.geocode, GeocodeStatus::Unavailable);
    assert_eq!(partial.record.address.as_deref(), Some("123 Main St"));
    assert_eq!(partial.record.bedrooms, Some(3));
    assert_eq!(partial.record.latitude, None);
    assert_eq!(partial.record.longitude, None);
}

#[tokio::test]
async fn extraction_with_embedded_coordinates_never_calls_geocoder() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&mock_server)
        .await;

    let page = LISTING.replace(
        "<p>3 beds</p>",
        r#"<div id="map" data-lat="39.78" data-lng="-89.65"></div>"#,
    );
    let extractor = Arc::new(extractor_for(&mock_server));
    let extraction = tokio::task::spawn_blocking(move || extractor.extract(page.as_bytes(), "map.html"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(extraction.geocode, GeocodeStatus::Embedded);
    assert_eq!(extraction.record.latitude, Some(39.78));
}
