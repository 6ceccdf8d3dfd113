//! Upstream download locations for each local catalog file.

use std::path::{Path, PathBuf};

use super::downloader::FetchError;
use super::paths::{tgas_file_name, ResolvedLocation};
use crate::survey::{Release, Survey};

const TGAS_BASE_URL: &str = "http://cdn.gea.esac.esa.int/Gaia/tgas_source/fits";
const GALAH_DR1_URL: &str = "http://cdsarc.u-strasbg.fr/ftp/J/MNRAS/465/3203";
const RAVE_DR4_URL: &str = "http://cdsarc.u-strasbg.fr/ftp/III/272";
const RAVE_DR5_URL: &str = "https://www.rave-survey.org/files";
const RAVEON_URL: &str = "https://zenodo.org/record/154381/files";

/// One file transfer: where to get it and where it goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub url: String,
    pub target: PathBuf,
    /// Source is gzipped but the target is stored decompressed
    pub gunzip: bool,
    /// Expected MD5 of the stored file, hex encoded
    pub md5: Option<String>,
}

impl Download {
    pub fn new(url: String, target: &Path) -> Self {
        Self {
            url,
            target: target.to_path_buf(),
            gunzip: false,
            md5: None,
        }
    }

    pub fn gunzipped(mut self) -> Self {
        self.gunzip = true;
        self
    }

    pub fn with_md5(mut self, hex: &str) -> Self {
        self.md5 = Some(hex.to_ascii_lowercase());
        self
    }
}

/// Downloads that produce every required path of `location`.
pub fn downloads_for(
    survey: Survey,
    release: Release,
    location: &ResolvedLocation,
) -> Result<Vec<Download>, FetchError> {
    let no_source = || FetchError::NoSource { survey, release };

    let mut downloads = Vec::new();
    match (survey, release.number()) {
        (Survey::Tgas, 1) => {
            for (n, file) in location.files().iter().enumerate() {
                downloads.push(Download::new(
                    format!("{TGAS_BASE_URL}/{}", tgas_file_name(n)),
                    file,
                ));
            }
        }
        (Survey::Galah, 1) => {
            downloads.push(
                Download::new(format!("{GALAH_DR1_URL}/catalog.dat.gz"), location.primary())
                    .gunzipped(),
            );
            let readme = location.readme().ok_or_else(no_source)?;
            downloads.push(Download::new(format!("{GALAH_DR1_URL}/ReadMe"), readme));
        }
        (Survey::Rave, 4) => {
            downloads.push(
                Download::new(format!("{RAVE_DR4_URL}/ravedr4.dat.gz"), location.primary())
                    .gunzipped(),
            );
            let readme = location.readme().ok_or_else(no_source)?;
            downloads.push(Download::new(format!("{RAVE_DR4_URL}/ReadMe"), readme));
        }
        (Survey::Rave, 5) => {
            downloads.push(
                Download::new(format!("{RAVE_DR5_URL}/RAVE_DR5.csv.gz"), location.primary())
                    .gunzipped(),
            );
        }
        (Survey::RaveOn, 5) => {
            downloads.push(Download::new(
                format!("{RAVEON_URL}/RAVE-on-v1.0.fits.gz"),
                location.primary(),
            ));
        }
        _ => return Err(no_source()),
    }
    Ok(downloads)
}
