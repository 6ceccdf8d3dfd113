//! Top-level error type returned by every loader operation.

use std::path::PathBuf;

use thiserror::Error;

use crate::data::FetchError;
use crate::formats::FormatError;
use crate::survey::{Release, Survey};

/// Boxed error raised by an external catalog reader.
pub type ExternalError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while loading a catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    /// An optional, independently installed component is not available.
    #[error("loading requires {component}, which is not available")]
    Unavailable { component: String },

    #[error("{survey} has no release {release} (supported: {supported})")]
    InvalidRelease {
        survey: Survey,
        release: Release,
        supported: String,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("fetching {survey} {release} failed")]
    Fetch {
        survey: Survey,
        release: Release,
        #[source]
        source: FetchError,
    },

    #[error("I/O error on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse {survey} {release} file {}", path.display())]
    Format {
        survey: Survey,
        release: Release,
        path: PathBuf,
        #[source]
        source: FormatError,
    },

    #[error("external reader failed for {survey}")]
    External {
        survey: Survey,
        #[source]
        source: ExternalError,
    },
}

impl CatalogError {
    pub(crate) fn invalid_release(survey: Survey, release: Release) -> Self {
        let supported = survey
            .supported_releases()
            .iter()
            .map(|dr| format!("DR{dr}"))
            .collect::<Vec<_>>()
            .join(", ");
        CatalogError::InvalidRelease {
            survey,
            release,
            supported: if supported.is_empty() {
                "none".to_string()
            } else {
                supported
            },
        }
    }
}
