//! Survey loaders.
//!
//! Every local survey goes through the same routine: resolve where the
//! release lives, fetch it once if anything is missing, parse each file and
//! apply the survey's fixups. What differs per survey is captured in a
//! [`SurveyStrategy`]. The APOGEE surveys are handed to an external
//! [`ApogeeReader`] instead.

use std::io;
use std::path::Path;

use crate::apogee::{self, ApogeeReader};
use crate::catalogs::{concat_tables, CatalogTable, TableError};
use crate::config::LoaderConfig;
use crate::data::{DataPaths, Fetcher, HttpFetcher, ResolvedLocation};
use crate::error::CatalogError;
use crate::formats::{cds, delimited, fits, FormatError};
use crate::survey::{CatalogRequest, FilterOptions, Release, Survey};

/// Value GALAH positions read as when the catalog leaves them blank.
pub const FILL_VALUE: f64 = -9999.99;

/// GALAH columns that receive [`FILL_VALUE`].
pub const GALAH_FILLED_COLUMNS: [&str; 2] = ["RA", "dec"];

/// Extension holding the table in every FITS catalog we read.
const FITS_TABLE_HDU: usize = 1;

const APOGEE_COMPONENT: &str = "an APOGEE catalog reader";

type ParseFn = fn(Release, &Path, Option<&Path>) -> Result<CatalogTable, FormatError>;
type FixupFn = fn(&mut CatalogTable) -> Result<(), TableError>;

/// How one local survey is parsed and cleaned up.
#[derive(Clone, Copy)]
pub struct SurveyStrategy {
    pub survey: Survey,
    /// Parses one data file, given the release and the optional ReadMe
    parse: ParseFn,
    /// Applied to the (concatenated) table
    fixup: Option<FixupFn>,
}

impl SurveyStrategy {
    /// Strategy for a local survey, `None` for the externally read ones.
    pub fn for_survey(survey: Survey) -> Option<Self> {
        let strategy = match survey {
            Survey::Galah => Self {
                survey,
                parse: parse_cds,
                fixup: Some(fill_galah_positions),
            },
            Survey::Rave => Self {
                survey,
                parse: parse_rave,
                fixup: None,
            },
            Survey::RaveOn | Survey::Tgas => Self {
                survey,
                parse: parse_fits,
                fixup: None,
            },
            Survey::Apogee | Survey::ApogeeRc => return None,
        };
        Some(strategy)
    }
}

impl std::fmt::Debug for SurveyStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurveyStrategy")
            .field("survey", &self.survey)
            .field("fixup", &self.fixup.is_some())
            .finish()
    }
}

fn parse_cds(
    _release: Release,
    data: &Path,
    readme: Option<&Path>,
) -> Result<CatalogTable, FormatError> {
    let readme = readme
        .ok_or_else(|| FormatError::ReadmeSectionNotFound(data.display().to_string()))?;
    cds::read_cds(data, readme)
}

fn parse_rave(
    release: Release,
    data: &Path,
    readme: Option<&Path>,
) -> Result<CatalogTable, FormatError> {
    if release.number() == 4 {
        parse_cds(release, data, readme)
    } else {
        delimited::read_delimited(data, b',')
    }
}

fn parse_fits(
    _release: Release,
    data: &Path,
    _readme: Option<&Path>,
) -> Result<CatalogTable, FormatError> {
    fits::read_bintable(data, FITS_TABLE_HDU)
}

fn fill_galah_positions(table: &mut CatalogTable) -> Result<(), TableError> {
    for name in GALAH_FILLED_COLUMNS {
        let filled = table.fill_nulls(name, FILL_VALUE)?;
        if filled > 0 {
            log::debug!("Filled {} null {} values with {}", filled, name, FILL_VALUE);
        }
    }
    Ok(())
}

/// Loads survey catalogs from a local data root, fetching on first use.
pub struct Loader {
    paths: DataPaths,
    fetcher: Box<dyn Fetcher>,
    apogee: Option<Box<dyn ApogeeReader>>,
}

impl Loader {
    pub fn new(paths: DataPaths, fetcher: impl Fetcher + 'static) -> Self {
        Self {
            paths,
            fetcher: Box::new(fetcher),
            apogee: None,
        }
    }

    /// Loader rooted at the configured data directory, downloading over HTTP.
    pub fn from_config(config: &LoaderConfig) -> Result<Self, CatalogError> {
        let fetcher = HttpFetcher::new(&config.fetch).map_err(|e| CatalogError::Unavailable {
            component: format!("an HTTP client ({e})"),
        })?;
        log::info!("Catalog data root: {}", config.data_dir().display());
        Ok(Self::new(DataPaths::new(config.data_dir()), fetcher))
    }

    /// Loader configured from the environment, see [`LoaderConfig::from_env`].
    pub fn from_env() -> Result<Self, CatalogError> {
        Self::from_config(&LoaderConfig::from_env())
    }

    /// Register the reader the APOGEE surveys are delegated to.
    pub fn with_apogee_reader(mut self, reader: impl ApogeeReader + 'static) -> Self {
        self.apogee = Some(Box::new(reader));
        self
    }

    /// Whether APOGEE loads can currently be served.
    pub fn has_apogee(&self) -> bool {
        self.apogee.as_ref().is_some_and(|r| r.is_available())
    }

    pub fn paths(&self) -> &DataPaths {
        &self.paths
    }

    /// Load whatever `request` names.
    ///
    /// Options are only meaningful to the APOGEE reader; passing any to a
    /// local survey is an argument error.
    pub fn load(&self, request: &CatalogRequest) -> Result<CatalogTable, CatalogError> {
        match request.survey {
            Survey::Apogee => self.apogee(request.release, &request.options),
            Survey::ApogeeRc => self.apogee_rc(request.release, &request.options),
            survey => {
                if !request.options.is_empty() {
                    let keys: Vec<&str> = request.options.iter().map(|(k, _)| k).collect();
                    return Err(CatalogError::InvalidArgument(format!(
                        "{survey} takes no options, got: {}",
                        keys.join(", ")
                    )));
                }
                self.load_local(survey, request.release)
            }
        }
    }

    /// GALAH, DR1 by default. Blank `RA`/`dec` come back as [`FILL_VALUE`].
    pub fn galah(&self, release: Option<Release>) -> Result<CatalogTable, CatalogError> {
        self.load_local(Survey::Galah, release)
    }

    /// RAVE, DR5 by default. DR4 is the CDS table, DR5 the CSV release.
    pub fn rave(&self, release: Option<Release>) -> Result<CatalogTable, CatalogError> {
        self.load_local(Survey::Rave, release)
    }

    /// RAVE-on, DR5 by default.
    pub fn raveon(&self, release: Option<Release>) -> Result<CatalogTable, CatalogError> {
        self.load_local(Survey::RaveOn, release)
    }

    /// TGAS, DR1 by default: all source files stacked in order.
    pub fn tgas(&self, release: Option<Release>) -> Result<CatalogTable, CatalogError> {
        self.load_local(Survey::Tgas, release)
    }

    /// APOGEE allStar through the registered reader.
    pub fn apogee(
        &self,
        release: Option<Release>,
        options: &FilterOptions,
    ) -> Result<CatalogTable, CatalogError> {
        let reader = self.apogee_reader()?;
        log_apogee_request(Survey::Apogee, release, options);
        reader
            .all_star(release, options)
            .map_err(|source| CatalogError::External {
                survey: Survey::Apogee,
                source,
            })
    }

    /// APOGEE red-clump sample through the registered reader.
    pub fn apogee_rc(
        &self,
        release: Option<Release>,
        options: &FilterOptions,
    ) -> Result<CatalogTable, CatalogError> {
        let reader = self.apogee_reader()?;
        log_apogee_request(Survey::ApogeeRc, release, options);
        reader
            .rc_sample(release, options)
            .map_err(|source| CatalogError::External {
                survey: Survey::ApogeeRc,
                source,
            })
    }

    fn apogee_reader(&self) -> Result<&dyn ApogeeReader, CatalogError> {
        match self.apogee.as_deref() {
            Some(reader) if reader.is_available() => Ok(reader),
            _ => Err(CatalogError::Unavailable {
                component: APOGEE_COMPONENT.to_string(),
            }),
        }
    }

    fn load_local(&self, survey: Survey, release: Option<Release>) -> Result<CatalogTable, CatalogError> {
        let strategy = SurveyStrategy::for_survey(survey).ok_or_else(|| {
            CatalogError::InvalidArgument(format!("{survey} is not stored locally"))
        })?;
        let release = release
            .or_else(|| survey.default_release())
            .ok_or_else(|| CatalogError::InvalidArgument(format!("{survey} needs a release")))?;
        self.retrieve(&strategy, release)
    }

    fn retrieve(&self, strategy: &SurveyStrategy, release: Release) -> Result<CatalogTable, CatalogError> {
        let survey = strategy.survey;
        let location = self.paths.resolve(survey, release)?;
        self.ensure_present(survey, release, &location)?;

        let readme = location.readme();
        let mut tables = Vec::with_capacity(location.files().len());
        for file in location.files() {
            let table = (strategy.parse)(release, file, readme)
                .map_err(|e| format_error(survey, release, file, e))?;
            log::debug!("{}: {} rows", file.display(), table.num_rows());
            tables.push(table);
        }

        let mut table = if tables.len() == 1 {
            tables.remove(0)
        } else {
            concat_tables(tables).map_err(|e| {
                format_error(survey, release, location_dir(&location), FormatError::Table(e))
            })?
        };

        if let Some(fixup) = strategy.fixup {
            fixup(&mut table).map_err(|e| {
                format_error(survey, release, location.primary(), FormatError::Table(e))
            })?;
        }

        log::info!(
            "Loaded {} {}: {} rows, {} columns",
            survey,
            release,
            table.num_rows(),
            table.num_columns()
        );
        Ok(table)
    }

    /// Fetch once if any required file is missing, then insist they all exist.
    fn ensure_present(
        &self,
        survey: Survey,
        release: Release,
        location: &ResolvedLocation,
    ) -> Result<(), CatalogError> {
        let missing = location.missing();
        if missing.is_empty() {
            log::debug!("{} {} already on disk", survey, release);
            return Ok(());
        }

        log::info!(
            "{} {}: {} file(s) missing, fetching",
            survey,
            release,
            missing.len()
        );
        self.fetcher
            .fetch(survey, release, location)
            .map_err(|source| CatalogError::Fetch {
                survey,
                release,
                source,
            })?;

        match location.missing().first() {
            None => Ok(()),
            Some(path) => Err(CatalogError::Io {
                path: path.to_path_buf(),
                source: io::Error::new(
                    io::ErrorKind::NotFound,
                    "file still missing after a successful fetch",
                ),
            }),
        }
    }
}

fn log_apogee_request(survey: Survey, release: Option<Release>, options: &FilterOptions) {
    let release = release.map_or_else(|| "default release".to_string(), |r| r.to_string());
    log::info!("Delegating {} ({}) to the external reader", survey, release);
    for (key, _) in options.iter().filter(|(k, _)| !apogee::is_known_option(k)) {
        log::debug!("Passing undocumented option '{}' through", key);
    }
}

/// Disk failures surface as I/O errors; anything else is a parse failure.
fn format_error(survey: Survey, release: Release, path: &Path, error: FormatError) -> CatalogError {
    match error {
        FormatError::Io(source) => CatalogError::Io {
            path: path.to_path_buf(),
            source,
        },
        source => CatalogError::Format {
            survey,
            release,
            path: path.to_path_buf(),
            source,
        },
    }
}

fn location_dir(location: &ResolvedLocation) -> &Path {
    location
        .primary()
        .parent()
        .unwrap_or_else(|| location.primary())
}
