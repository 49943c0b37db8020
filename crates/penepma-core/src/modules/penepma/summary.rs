//! Typed view of the `penepma-res.dat` summary log.

use crate::domain::{Measured, PenelopeError};
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const ENTRY_PATTERN: &str = r"^([^.]*) \.+  ([^ ]*)(?: \+- )?([^ ]*)?";

const ABSORPTION_FRACTION: &str = "Absorption fraction";
const UPBOUND_FRACTION: &str = "Upbound fraction";
const DOWNBOUND_FRACTION: &str = "Downbound fraction";
const SIMULATION_TIME: &str = "Simulation time";
const SIMULATION_SPEED: &str = "Simulation speed";
const SIMULATED_SHOWERS: &str = "Simulated primary showers";

#[derive(Debug, thiserror::Error)]
pub enum SummaryLogError {
    #[error("Data file {} cannot be found", path.display())]
    Missing { path: PathBuf },
    #[error("failed to read summary log '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid summary log pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("summary log '{}' has no '{field}' entry", path.display())]
    MissingField { path: PathBuf, field: &'static str },
}

impl From<SummaryLogError> for PenelopeError {
    fn from(error: SummaryLogError) -> Self {
        match &error {
            SummaryLogError::Missing { .. } => {
                PenelopeError::importer("IMPORT.MISSING_FILE", error.to_string())
            }
            SummaryLogError::Read { .. } => {
                PenelopeError::importer("IMPORT.READ_FILE", error.to_string())
            }
            SummaryLogError::Pattern(_) => {
                PenelopeError::internal("IMPORT.SUMMARY_PATTERN", error.to_string())
            }
            SummaryLogError::MissingField { .. } => {
                PenelopeError::importer("IMPORT.SUMMARY_FIELD", error.to_string())
            }
        }
    }
}

/// Entries of the summary log needed by the electron-fraction, time and
/// showers-statistics detectors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryLog {
    pub absorption_fraction: Measured,
    pub upbound_fraction: Measured,
    pub downbound_fraction: Measured,
    pub simulation_time_s: f64,
    /// Showers per second.
    pub simulation_speed: f64,
    pub simulated_showers: f64,
}

impl SummaryLog {
    pub fn read(path: &Path) -> Result<Self, SummaryLogError> {
        if !path.is_file() {
            return Err(SummaryLogError::Missing {
                path: path.to_path_buf(),
            });
        }
        let source = fs::read_to_string(path).map_err(|source| SummaryLogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &source)
    }

    pub fn parse(path: &Path, source: &str) -> Result<Self, SummaryLogError> {
        let pattern = Regex::new(ENTRY_PATTERN)?;

        let mut entries: BTreeMap<String, Measured> = BTreeMap::new();
        for line in source.lines().map(str::trim) {
            let Some(captures) = pattern.captures(line) else {
                continue;
            };
            let name = captures[1].trim();
            let Ok(value) = captures[2].parse::<f64>() else {
                tracing::trace!(entry = name, "skipping non-numeric summary entry");
                continue;
            };
            let uncertainty = captures
                .get(3)
                .and_then(|text| text.as_str().parse::<f64>().ok())
                .unwrap_or(0.0);
            entries.insert(name.to_string(), Measured::new(value, uncertainty));
        }

        let required = |field: &'static str| {
            entries
                .get(field)
                .copied()
                .ok_or_else(|| SummaryLogError::MissingField {
                    path: path.to_path_buf(),
                    field,
                })
        };

        Ok(Self {
            absorption_fraction: required(ABSORPTION_FRACTION)?,
            upbound_fraction: required(UPBOUND_FRACTION)?,
            downbound_fraction: required(DOWNBOUND_FRACTION)?,
            simulation_time_s: required(SIMULATION_TIME)?.value,
            simulation_speed: required(SIMULATION_SPEED)?.value,
            simulated_showers: required(SIMULATED_SHOWERS)?.value,
        })
    }

    /// Seconds per shower.
    pub fn seconds_per_shower(&self) -> f64 {
        1.0 / self.simulation_speed
    }
}
