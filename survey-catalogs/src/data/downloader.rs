//! Download-on-miss for catalog files.
//!
//! Each missing file is streamed into a `.part` sibling and renamed into place
//! only once the transfer (and checksum, when one is known) succeeds, so an
//! interrupted download never looks like a present file.

use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use thiserror::Error;

use super::paths::ResolvedLocation;
use super::sources::{downloads_for, Download};
use super::transport::{HttpTransport, Transport};
use crate::config::FetchConfig;
use crate::survey::{Release, Survey};

const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Errors that can occur while fetching catalog files
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request to {url} failed")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("could not build the HTTP client")]
    Client(#[source] reqwest::Error),

    #[error("{url} returned HTTP status {status}")]
    Status { url: String, status: u16 },

    #[error("I/O error while writing {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("checksum mismatch for {}: expected {expected}, got {actual}", path.display())]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("no download source known for {survey} {release}")]
    NoSource { survey: Survey, release: Release },
}

/// Retrieves the files of a survey release into the paths the resolver gave.
///
/// On success every required path of `location` exists.
pub trait Fetcher: Send + Sync {
    fn fetch(
        &self,
        survey: Survey,
        release: Release,
        location: &ResolvedLocation,
    ) -> Result<(), FetchError>;
}

/// Fetches catalog files from their upstream archives.
pub struct HttpFetcher<T: Transport = HttpTransport> {
    transport: T,
}

impl HttpFetcher<HttpTransport> {
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        Ok(Self::with_transport(HttpTransport::new(config)?))
    }
}

impl<T: Transport> HttpFetcher<T> {
    pub fn with_transport(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Perform one transfer, replacing any existing target.
    pub fn download(&self, download: &Download) -> Result<(), FetchError> {
        let target = &download.target;
        ensure_parent_dir(target)?;

        log::info!("Downloading {} -> {}", download.url, target.display());
        let source = self.transport.open(&download.url)?;
        let source: Box<dyn Read + Send> = if download.gunzip {
            Box::new(GzDecoder::new(source))
        } else {
            source
        };

        let part = part_path(target);
        let result = write_part(source, &part).and_then(|(bytes, digest)| {
            if let Some(expected) = &download.md5 {
                if *expected != digest {
                    return Err(FetchError::ChecksumMismatch {
                        path: target.clone(),
                        expected: expected.clone(),
                        actual: digest,
                    });
                }
            }
            fs::rename(&part, target).map_err(|source| FetchError::Io {
                path: target.clone(),
                source,
            })?;
            Ok((bytes, digest))
        });

        match result {
            Ok((bytes, digest)) => {
                log::info!("Saved {} ({} bytes, md5 {})", target.display(), bytes, digest);
                Ok(())
            }
            Err(e) => {
                if part.exists() {
                    if let Err(cleanup) = fs::remove_file(&part) {
                        log::warn!("Could not remove {}: {}", part.display(), cleanup);
                    }
                }
                Err(e)
            }
        }
    }
}

impl<T: Transport> Fetcher for HttpFetcher<T> {
    fn fetch(
        &self,
        survey: Survey,
        release: Release,
        location: &ResolvedLocation,
    ) -> Result<(), FetchError> {
        let downloads = downloads_for(survey, release, location)?;
        let pending: Vec<&Download> = downloads.iter().filter(|d| !d.target.exists()).collect();
        log::info!(
            "Fetching {} {}: {} of {} files missing",
            survey,
            release,
            pending.len(),
            downloads.len()
        );

        for download in pending {
            self.download(download)?;
        }
        Ok(())
    }
}

fn ensure_parent_dir(path: &Path) -> Result<(), FetchError> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            fs::create_dir_all(dir).map_err(|source| FetchError::Io {
                path: dir.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}

/// `catalog.dat` -> `catalog.dat.part`
fn part_path(target: &Path) -> PathBuf {
    let mut name = target.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    target.with_file_name(name)
}

/// Stream `source` into `part`; returns the byte count and hex MD5.
fn write_part<R: Read>(mut source: R, part: &Path) -> Result<(u64, String), FetchError> {
    let io_error = |source: io::Error| FetchError::Io {
        path: part.to_path_buf(),
        source,
    };

    let mut writer = BufWriter::new(File::create(part).map_err(io_error)?);
    let mut context = md5::Context::new();
    let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
    let mut total: u64 = 0;

    loop {
        let n = match source.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(io_error(e)),
        };
        writer.write_all(&buffer[..n]).map_err(io_error)?;
        context.consume(&buffer[..n]);
        total += n as u64;
    }
    writer.flush().map_err(io_error)?;

    Ok((total, format!("{:x}", context.compute())))
}
