//! Local file layout for every survey and release.
//!
//! All paths hang off one data root:
//!
//! ```text
//! <root>/
//! ├── Gaia/tgas_source/fits/TgasSource_000-000-0NN.fits
//! ├── galah/DR1/{catalog.dat, ReadMe}
//! └── rave/
//!     ├── DR4/{ravedr4.dat, ReadMe}
//!     └── DR5/{RAVE_DR5.csv, RAVE-on-v1.0.fits.gz}
//! ```

use std::path::{Path, PathBuf};

use crate::error::CatalogError;
use crate::survey::{Release, Survey};

/// Number of files the TGAS source table is split across
pub const TGAS_FILE_COUNT: usize = 16;

/// Where a survey release is expected on disk.
///
/// Always names at least one data file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLocation {
    /// Data files, in concatenation order
    files: Vec<PathBuf>,
    /// CDS `ReadMe` describing the data file layout
    readme: Option<PathBuf>,
}

impl ResolvedLocation {
    pub fn single(file: PathBuf) -> Self {
        Self {
            files: vec![file],
            readme: None,
        }
    }

    pub fn with_readme(file: PathBuf, readme: PathBuf) -> Self {
        Self {
            files: vec![file],
            readme: Some(readme),
        }
    }

    /// Several data files read in order; `None` if `files` is empty.
    pub fn many(files: Vec<PathBuf>) -> Option<Self> {
        if files.is_empty() {
            return None;
        }
        Some(Self {
            files,
            readme: None,
        })
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn readme(&self) -> Option<&Path> {
        self.readme.as_deref()
    }

    /// Every path that must exist before the release can be parsed.
    pub fn required(&self) -> impl Iterator<Item = &Path> {
        self.files
            .iter()
            .chain(self.readme.iter())
            .map(PathBuf::as_path)
    }

    /// Required paths that are not on disk.
    pub fn missing(&self) -> Vec<&Path> {
        self.required().filter(|p| !p.exists()).collect()
    }

    pub fn is_present(&self) -> bool {
        self.required().all(Path::exists)
    }

    /// First data file.
    pub fn primary(&self) -> &Path {
        &self.files[0]
    }
}

/// Maps (survey, release) to paths under a data root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    root: PathBuf,
}

impl DataPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Expected location of a survey release.
    ///
    /// Fails with an argument error for releases without a known layout, and
    /// for the APOGEE surveys, whose files belong to the external reader.
    pub fn resolve(&self, survey: Survey, release: Release) -> Result<ResolvedLocation, CatalogError> {
        match (survey, release.number()) {
            (Survey::Galah, 1) => {
                let dir = self.root.join("galah").join("DR1");
                Ok(ResolvedLocation::with_readme(
                    dir.join("catalog.dat"),
                    dir.join("ReadMe"),
                ))
            }
            (Survey::Rave, 4) => {
                let dir = self.rave_dir(release);
                Ok(ResolvedLocation::with_readme(
                    dir.join("ravedr4.dat"),
                    dir.join("ReadMe"),
                ))
            }
            (Survey::Rave, 5) => Ok(ResolvedLocation::single(
                self.rave_dir(release).join("RAVE_DR5.csv"),
            )),
            (Survey::RaveOn, 5) => Ok(ResolvedLocation::single(
                self.rave_dir(release).join("RAVE-on-v1.0.fits.gz"),
            )),
            (Survey::Tgas, 1) => {
                let dir = self.root.join("Gaia").join("tgas_source").join("fits");
                let files = (0..TGAS_FILE_COUNT)
                    .map(|n| dir.join(tgas_file_name(n)))
                    .collect();
                Ok(ResolvedLocation {
                    files,
                    readme: None,
                })
            }
            (Survey::Apogee | Survey::ApogeeRc, _) => Err(CatalogError::InvalidArgument(format!(
                "{survey} files are managed by the external APOGEE reader"
            ))),
            _ => Err(CatalogError::invalid_release(survey, release)),
        }
    }

    fn rave_dir(&self, release: Release) -> PathBuf {
        self.root.join("rave").join(format!("DR{}", release.number()))
    }
}

/// File name of the `n`th TGAS source chunk.
pub fn tgas_file_name(n: usize) -> String {
    format!("TgasSource_000-000-0{n:02}.fits")
}
