use std::path::PathBuf;

use crate::Extraction;

/// Errors that escape the extraction core.
///
/// Field-level and strategy-level failures never show up here; they are
/// absorbed by the strategy chains. Only input that cannot be read at all,
/// a bad configuration, or a geocoder outage propagate.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("document is empty or contains no text")]
    EmptyDocument,

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to load config from {}: {reason}", path.display())]
    ConfigLoad { path: PathBuf, reason: String },

    #[error("invalid config: {0}")]
    ConfigInvalid(String),

    /// The geocoding collaborator is down. The record was still assembled
    /// (without coordinates) and travels with the error so the caller can
    /// store it now and retry the lookup later.
    #[error("geocoder unavailable: {reason}")]
    GeocoderUnavailable {
        reason: String,
        extraction: Box<Extraction>,
    },
}

impl ExtractError {
    /// The coordinate-less extraction carried by a geocoder outage.
    pub fn partial_extraction(&self) -> Option<&Extraction> {
        match self {
            Self::GeocoderUnavailable { extraction, .. } => Some(&**extraction),
            _ => None,
        }
    }

    pub fn into_partial_extraction(self) -> Option<Extraction> {
        match self {
            Self::GeocoderUnavailable { extraction, .. } => Some(*extraction),
            _ => None,
        }
    }
}

/// Failure modes of a [`crate::geo::Geocoder`] lookup.
#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    #[error("geocoding request timed out")]
    TimedOut,

    #[error("geocoding service unavailable: {0}")]
    Unavailable(String),

    #[error("unexpected geocoder response: {0}")]
    InvalidResponse(String),
}
