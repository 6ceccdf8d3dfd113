//! Survey identifiers, data releases and load requests.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// The published catalogs this crate knows how to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Survey {
    /// APOGEE allStar file, read through an external reader
    Apogee,
    /// APOGEE red-clump sample, read through an external reader
    ApogeeRc,
    /// GALAH spectroscopic survey
    Galah,
    /// RAVE spectroscopic survey
    Rave,
    /// RAVE-on data-driven re-analysis of RAVE spectra
    RaveOn,
    /// Tycho-Gaia astrometric solution
    Tgas,
}

impl Survey {
    /// Every survey, in declaration order.
    pub const ALL: [Survey; 6] = [
        Survey::Apogee,
        Survey::ApogeeRc,
        Survey::Galah,
        Survey::Rave,
        Survey::RaveOn,
        Survey::Tgas,
    ];

    /// Stable lowercase name used in logs, errors and on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Survey::Apogee => "apogee",
            Survey::ApogeeRc => "apogee-rc",
            Survey::Galah => "galah",
            Survey::Rave => "rave",
            Survey::RaveOn => "raveon",
            Survey::Tgas => "tgas",
        }
    }

    /// Release loaded when the caller does not name one.
    ///
    /// APOGEE surveys have no default here: the external reader picks its own
    /// reduction when no release is passed through.
    pub fn default_release(&self) -> Option<Release> {
        match self {
            Survey::Apogee | Survey::ApogeeRc => None,
            Survey::Galah => Some(Release(1)),
            Survey::Rave => Some(Release(5)),
            Survey::RaveOn => Some(Release(5)),
            Survey::Tgas => Some(Release(1)),
        }
    }

    /// Releases with a known on-disk layout.
    pub fn supported_releases(&self) -> &'static [u32] {
        match self {
            Survey::Apogee | Survey::ApogeeRc => &[],
            Survey::Galah => &[1],
            Survey::Rave => &[4, 5],
            Survey::RaveOn => &[5],
            Survey::Tgas => &[1],
        }
    }

    /// True for surveys delegated to the external APOGEE reader.
    pub fn is_external(&self) -> bool {
        matches!(self, Survey::Apogee | Survey::ApogeeRc)
    }
}

impl fmt::Display for Survey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Survey {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Survey::ALL
            .iter()
            .copied()
            .find(|survey| survey.name() == wanted || (wanted == "rave-on" && *survey == Survey::RaveOn))
            .ok_or_else(|| CatalogError::InvalidArgument(format!("unknown survey '{s}'")))
    }
}

/// A published data release number (the "dr" of a survey).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Release(pub u32);

impl Release {
    pub fn number(&self) -> u32 {
        self.0
    }
}

impl From<u32> for Release {
    fn from(value: u32) -> Self {
        Release(value)
    }
}

impl fmt::Display for Release {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DR{}", self.0)
    }
}

/// Accepts `"5"`, `"dr5"` and `"DR5"`.
impl FromStr for Release {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("dr")
            .or_else(|| trimmed.strip_prefix("DR"))
            .or_else(|| trimmed.strip_prefix("Dr"))
            .unwrap_or(trimmed);

        digits
            .parse::<u32>()
            .map(Release)
            .map_err(|_| CatalogError::InvalidArgument(format!("malformed release '{s}'")))
    }
}

/// A single keyword-style option value passed through to an external reader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Bool(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        OptionValue::Int(value)
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        OptionValue::Float(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Text(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::Text(value)
    }
}

/// Keyword-style filter options, kept in key order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterOptions {
    values: BTreeMap<String, OptionValue>,
}

impl FilterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    pub fn with(mut self, key: &str, value: impl Into<OptionValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: &str, value: impl Into<OptionValue>) {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.values.get(key)
    }

    /// Boolean option, if present and boolean.
    pub fn flag(&self, key: &str) -> Option<bool> {
        match self.values.get(key) {
            Some(OptionValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// One load request: which survey, which release, and any pass-through options.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogRequest {
    pub survey: Survey,
    pub release: Option<Release>,
    pub options: FilterOptions,
}

impl CatalogRequest {
    pub fn new(survey: Survey) -> Self {
        Self {
            survey,
            release: None,
            options: FilterOptions::new(),
        }
    }

    pub fn with_release(mut self, release: impl Into<Release>) -> Self {
        self.release = Some(release.into());
        self
    }

    pub fn with_options(mut self, options: FilterOptions) -> Self {
        self.options = options;
        self
    }

    /// The explicit release, or the survey default.
    pub fn effective_release(&self) -> Option<Release> {
        self.release.or_else(|| self.survey.default_release())
    }
}
