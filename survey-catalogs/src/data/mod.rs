//! Data module for locating and downloading survey catalog files
//!
//! This module maps each survey release to its place under the data root and
//! fetches whatever is missing from the upstream archives.

mod downloader;
pub mod paths;
pub mod sources;
pub mod transport;

pub use downloader::{FetchError, Fetcher, HttpFetcher};
pub use paths::{tgas_file_name, DataPaths, ResolvedLocation, TGAS_FILE_COUNT};
pub use sources::{downloads_for, Download};
pub use transport::{HttpTransport, Transport};
