//! Loaders for published astronomical survey catalogs
//!
//! Each survey release is looked up under a local data root, downloaded from
//! its upstream archive the first time it is needed, and parsed from whatever
//! format the survey publishes (FITS binary tables, CDS fixed-width ASCII, or
//! CSV) into a column-oriented [`CatalogTable`].
//!
//! ```no_run
//! use survey_catalogs::{CatalogRequest, Loader, Survey};
//!
//! let loader = Loader::from_env()?;
//! let tgas = loader.tgas(None)?;
//! println!("TGAS: {} stars", tgas.num_rows());
//!
//! let rave4 = loader.load(&CatalogRequest::new(Survey::Rave).with_release(4u32))?;
//! println!("RAVE DR4 columns: {:?}", rave4.column_names().collect::<Vec<_>>());
//! # Ok::<(), survey_catalogs::CatalogError>(())
//! ```

pub mod apogee;
pub mod catalogs;
pub mod config;
pub mod data;
pub mod error;
pub mod formats;
pub mod loader;
pub mod survey;

pub use apogee::ApogeeReader;
pub use catalogs::{CatalogTable, Column, ColumnData, ColumnType, Value};
pub use config::{FetchConfig, LoaderConfig};
pub use data::{DataPaths, FetchError, Fetcher, HttpFetcher, ResolvedLocation};
pub use error::{CatalogError, ExternalError};
pub use formats::FormatError;
pub use loader::{Loader, FILL_VALUE};
pub use survey::{CatalogRequest, FilterOptions, OptionValue, Release, Survey};
