//! Delegation of the APOGEE catalogs to an independently installed reader.
//!
//! The APOGEE allStar file and red-clump sample need their own reduction
//! logic (duplicate removal, extinction columns, distance catalogs) which
//! lives outside this crate. A reader is registered on the
//! [`Loader`](crate::loader::Loader); without one, APOGEE loads fail with
//! [`CatalogError::Unavailable`](crate::error::CatalogError::Unavailable).
//!
//! Options are handed to the reader unchanged. The keys below are the ones
//! the reader documents; anything else is passed through as well.

use crate::catalogs::CatalogTable;
use crate::error::ExternalError;
use crate::survey::{FilterOptions, Release};

/// Drop stars observed during commissioning
pub const RM_COMMISSIONING: &str = "rmcommissioning";
/// Keep only main-survey targets
pub const MAIN: &str = "main";
/// Drop stars with the STAR_BAD flag set
pub const EXCLUDE_STAR_BAD: &str = "exclude_star_bad";
/// Drop stars with the STAR_WARN flag set
pub const EXCLUDE_STAR_WARN: &str = "exclude_star_warn";
/// Extinction column to add
pub const AK: &str = "ak";
/// Extinction estimate version
pub const AK_VERS: &str = "akvers";
/// Drop stars with zero visits
pub const RM_NO_VISITS: &str = "rmnovisits";
/// Join a distance catalog
pub const ADD_DIST: &str = "adddist";
/// Distance catalog reduction
pub const DIST_REDUX: &str = "distredux";
/// Remove duplicate entries
pub const RM_DUPS: &str = "rmdups";
/// Return the file without any post-processing
pub const RAW: &str = "raw";

/// Every option key the reader documents.
pub const KNOWN_OPTIONS: [&str; 11] = [
    RM_COMMISSIONING,
    MAIN,
    EXCLUDE_STAR_BAD,
    EXCLUDE_STAR_WARN,
    AK,
    AK_VERS,
    RM_NO_VISITS,
    ADD_DIST,
    DIST_REDUX,
    RM_DUPS,
    RAW,
];

/// An external reader for the APOGEE catalogs.
pub trait ApogeeReader: Send + Sync {
    /// Whether the reader can serve requests right now.
    fn is_available(&self) -> bool {
        true
    }

    /// Read the allStar catalog.
    fn all_star(
        &self,
        release: Option<Release>,
        options: &FilterOptions,
    ) -> Result<CatalogTable, ExternalError>;

    /// Read the red-clump sample.
    fn rc_sample(
        &self,
        release: Option<Release>,
        options: &FilterOptions,
    ) -> Result<CatalogTable, ExternalError>;
}

/// True if `key` is one of the documented reader options.
pub fn is_known_option(key: &str) -> bool {
    KNOWN_OPTIONS.contains(&key)
}
