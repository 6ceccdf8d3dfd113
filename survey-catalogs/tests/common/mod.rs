//! Fixture builders shared by the integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use byteorder::{BigEndian, WriteBytesExt};
use flate2::write::GzEncoder;
use flate2::Compression;

use survey_catalogs::data::{downloads_for, Transport};
use survey_catalogs::{FetchError, Fetcher, Release, ResolvedLocation, Survey};

const BLOCK: usize = 2880;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// One column of a generated FITS binary table.
#[derive(Debug, Clone)]
pub enum FitsColumn {
    /// `K`: 64-bit integers
    Long(&'static str, Vec<i64>),
    /// `D`: 64-bit floats
    Double(&'static str, Vec<f64>),
}

impl FitsColumn {
    fn name(&self) -> &'static str {
        match self {
            FitsColumn::Long(name, _) | FitsColumn::Double(name, _) => name,
        }
    }

    fn rows(&self) -> usize {
        match self {
            FitsColumn::Long(_, v) => v.len(),
            FitsColumn::Double(_, v) => v.len(),
        }
    }
}

fn card(text: &str) -> Vec<u8> {
    format!("{text:<80}").into_bytes()
}

fn pad(bytes: &mut Vec<u8>, fill: u8) {
    let target = bytes.len().div_ceil(BLOCK) * BLOCK;
    bytes.resize(target, fill);
}

fn header(cards: &[String]) -> Vec<u8> {
    let mut bytes: Vec<u8> = cards.iter().flat_map(|c| card(c)).collect();
    bytes.extend(card("END"));
    pad(&mut bytes, b' ');
    bytes
}

/// A primary HDU followed by one BINTABLE extension.
pub fn fits_bytes(columns: &[FitsColumn]) -> Vec<u8> {
    let rows = columns.first().map_or(0, FitsColumn::rows);
    let mut bytes = header(&[
        "SIMPLE  =                    T".to_string(),
        "BITPIX  =                    8".to_string(),
        "NAXIS   =                    0".to_string(),
        "EXTEND  =                    T".to_string(),
    ]);

    let mut cards = vec![
        "XTENSION= 'BINTABLE'".to_string(),
        "BITPIX  =                    8".to_string(),
        "NAXIS   =                    2".to_string(),
        format!("NAXIS1  = {:>20}", columns.len() * 8),
        format!("NAXIS2  = {:>20}", rows),
        "PCOUNT  =                    0".to_string(),
        "GCOUNT  =                    1".to_string(),
        format!("TFIELDS = {:>20}", columns.len()),
    ];
    for (i, column) in columns.iter().enumerate() {
        let code = match column {
            FitsColumn::Long(..) => "K",
            FitsColumn::Double(..) => "D",
        };
        cards.push(format!("TTYPE{:<3}= '{}'", i + 1, column.name()));
        cards.push(format!("TFORM{:<3}= '{}'", i + 1, code));
    }
    bytes.extend(header(&cards));

    let mut data = Vec::new();
    for row in 0..rows {
        for column in columns {
            match column {
                FitsColumn::Long(_, v) => data.write_i64::<BigEndian>(v[row]).unwrap(),
                FitsColumn::Double(_, v) => data.write_f64::<BigEndian>(v[row]).unwrap(),
            }
        }
    }
    pad(&mut data, 0);
    bytes.extend(data);
    bytes
}

pub fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap()
}

fn write(path: &Path, bytes: &[u8]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, bytes).unwrap();
}

/// TGAS chunk `n`: `n + 1` rows with source ids `n * 100 + row`.
pub fn tgas_chunk(n: usize) -> Vec<u8> {
    let ids: Vec<i64> = (0..=n as i64).map(|row| n as i64 * 100 + row).collect();
    let ra: Vec<f64> = ids.iter().map(|id| *id as f64 * 0.01).collect();
    let dec: Vec<f64> = ids.iter().map(|id| -(*id as f64) * 0.01).collect();
    fits_bytes(&[
        FitsColumn::Long("source_id", ids),
        FitsColumn::Double("ra", ra),
        FitsColumn::Double("dec", dec),
    ])
}

/// Rows in a full TGAS fixture: chunk `n` has `n + 1` rows.
pub fn tgas_total_rows(files: usize) -> usize {
    (1..=files).sum()
}

pub const RAVEON_ROWS: usize = 3;

pub fn raveon_fits() -> Vec<u8> {
    fits_bytes(&[
        FitsColumn::Long("RAVE_OBS_ID", vec![1, 2, 3]),
        FitsColumn::Double("TEFF", vec![4800.0, 5100.5, 6020.0]),
        FitsColumn::Double("FE_H", vec![-0.25, 0.1, -1.3]),
    ])
}

pub const GALAH_README: &str = "\
J/MNRAS/465/3203   GALAH survey DR1   (Martell+, 2017)
================================================================================
Byte-by-byte Description of file: catalog.dat
--------------------------------------------------------------------------------
   Bytes Format Units   Label     Explanations
--------------------------------------------------------------------------------
   1- 16  A16   ---     2MASS     2MASS identifier
  18- 27  F10.6 deg     RA        ?=-9999.99 Right ascension (J2000)
  29- 38  F10.6 deg     dec       ? Declination (J2000)
  40- 43  I4    K       Teff      Effective temperature
--------------------------------------------------------------------------------
";

/// Three stars: the second has a sentinel RA and a blank dec.
pub const GALAH_DATA: &str = "\
00000000+0000001  10.500000  -5.250000 5000
00000000+0000002   -9999.99            4800
00000000+0000003 200.250000  45.000000 6100
";

pub const RAVE_DR4_README: &str = "\
III/272            RAVE 4th data release    (Kordopatis+, 2013)
================================================================================
Byte-by-byte Description of file: ravedr4.dat
--------------------------------------------------------------------------------
   Bytes Format Units   Label     Explanations
--------------------------------------------------------------------------------
   1- 20  A20   ---     RAVE      RAVE designation
  22- 29  F8.2  km/s    HRV       Heliocentric radial velocity
--------------------------------------------------------------------------------
";

pub const RAVE_DR4_DATA: &str = "\
J000000.0-000001     12.50
J000000.0-000002     -3.25
";

pub const RAVE_DR5_CSV: &str = "\
RAVE_OBS_ID,HRV,eHRV,Teff_K
20030101_1234m56_001,12.5,1.1,5000
20030101_1234m56_002,-3,,4800
";

/// Contents of every required file of a release, keyed by file name.
pub fn fixture_files(survey: Survey, release: Release) -> HashMap<String, Vec<u8>> {
    let mut files = HashMap::new();
    match (survey, release.number()) {
        (Survey::Tgas, 1) => {
            for n in 0..survey_catalogs::data::TGAS_FILE_COUNT {
                files.insert(survey_catalogs::data::tgas_file_name(n), tgas_chunk(n));
            }
        }
        (Survey::Galah, 1) => {
            files.insert("catalog.dat".to_string(), GALAH_DATA.as_bytes().to_vec());
            files.insert("ReadMe".to_string(), GALAH_README.as_bytes().to_vec());
        }
        (Survey::Rave, 4) => {
            files.insert("ravedr4.dat".to_string(), RAVE_DR4_DATA.as_bytes().to_vec());
            files.insert("ReadMe".to_string(), RAVE_DR4_README.as_bytes().to_vec());
        }
        (Survey::Rave, 5) => {
            files.insert("RAVE_DR5.csv".to_string(), RAVE_DR5_CSV.as_bytes().to_vec());
        }
        (Survey::RaveOn, 5) => {
            files.insert("RAVE-on-v1.0.fits.gz".to_string(), gzip(&raveon_fits()));
        }
        _ => panic!("no fixture for {survey} {release}"),
    }
    files
}

/// Write the fixture files of `location` that are missing; returns how many.
pub fn write_missing(survey: Survey, release: Release, location: &ResolvedLocation) -> usize {
    let files = fixture_files(survey, release);
    let mut written = 0;
    for path in location.missing() {
        let name = path.file_name().unwrap().to_str().unwrap();
        write(path, &files[name]);
        written += 1;
    }
    written
}

/// Fetcher that installs fixtures and counts calls and files.
#[derive(Clone, Default)]
pub struct FixtureFetcher {
    pub calls: Arc<AtomicUsize>,
    pub files: Arc<AtomicUsize>,
}

impl FixtureFetcher {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn files(&self) -> usize {
        self.files.load(Ordering::SeqCst)
    }
}

impl Fetcher for FixtureFetcher {
    fn fetch(
        &self,
        survey: Survey,
        release: Release,
        location: &ResolvedLocation,
    ) -> Result<(), FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let written = write_missing(survey, release, location);
        self.files.fetch_add(written, Ordering::SeqCst);
        Ok(())
    }
}

/// Fetcher that always fails with an HTTP status.
pub struct FailingFetcher;

impl Fetcher for FailingFetcher {
    fn fetch(&self, _: Survey, _: Release, _: &ResolvedLocation) -> Result<(), FetchError> {
        Err(FetchError::Status {
            url: "http://archive.invalid/catalog".to_string(),
            status: 503,
        })
    }
}

/// Serves the upstream bodies of a release from memory and records requests.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    bodies: Arc<HashMap<String, Vec<u8>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl RecordingTransport {
    /// Serve every download of `survey`/`release` as the archive would.
    pub fn for_release(survey: Survey, release: Release, location: &ResolvedLocation) -> Self {
        let files = fixture_files(survey, release);
        let bodies = downloads_for(survey, release, location)
            .unwrap()
            .into_iter()
            .map(|download| {
                let name = download.target.file_name().unwrap().to_str().unwrap();
                let body = &files[name];
                let body = if download.gunzip { gzip(body) } else { body.clone() };
                (download.url, body)
            })
            .collect();
        Self {
            bodies: Arc::new(bodies),
            requests: Arc::default(),
        }
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for RecordingTransport {
    fn open(&self, url: &str) -> Result<Box<dyn Read + Send>, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());
        match self.bodies.get(url) {
            Some(body) => Ok(Box::new(Cursor::new(body.clone()))),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}
