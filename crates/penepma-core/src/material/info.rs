//! Tabulated material properties (CSDA ranges and mean free paths).
//!
//! Tables are produced by the pendbase tables tool next to each material
//! file (`mat1.mat` -> `mat1.tab`). Each data row is
//! `KPAR ICOL ENERGY_EV VALUE_CM`; `ICOL 0` carries the range and any other
//! `ICOL` the mean free path of that interaction.

use crate::common::units::cm_to_m;
use crate::domain::{Particle, PenelopeError, PenelopeResult};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const RANGE_ICOL: u8 = 0;
const TABLE_EXTENSION: &str = "tab";

pub trait MaterialProperties {
    fn range_m(&self, energy_ev: f64, particle: Particle) -> PenelopeResult<f64>;

    fn mean_free_path_m(&self, energy_ev: f64, particle: Particle, icol: u8)
    -> PenelopeResult<f64>;
}

/// Provides the property tables of an exported material file.
pub trait MaterialPropertySource {
    fn properties_for(&self, material_path: &Path) -> PenelopeResult<Box<dyn MaterialProperties>>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TabulatedPropertySource;

impl MaterialPropertySource for TabulatedPropertySource {
    fn properties_for(&self, material_path: &Path) -> PenelopeResult<Box<dyn MaterialProperties>> {
        let info = MaterialInfo::for_material_file(material_path)?;
        Ok(Box::new(info))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MaterialInfoError {
    #[error("failed to read material table '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid row {line} in material table '{}': {reason}", path.display())]
    Row {
        path: PathBuf,
        line: usize,
        reason: String,
    },
    #[error("material table '{}' has no data for KPAR={kpar} ICOL={icol}", path.display())]
    MissingTable { path: PathBuf, kpar: u8, icol: u8 },
}

impl From<MaterialInfoError> for PenelopeError {
    fn from(error: MaterialInfoError) -> Self {
        let placeholder = match &error {
            MaterialInfoError::Read { .. } => "IO.MATERIAL_TABLE_READ",
            MaterialInfoError::Row { .. } => "IO.MATERIAL_TABLE_ROW",
            MaterialInfoError::MissingTable { .. } => "IO.MATERIAL_TABLE_MISSING",
        };
        PenelopeError::io_system(placeholder, error.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaterialInfo {
    path: PathBuf,
    tables: BTreeMap<(u8, u8), Vec<(f64, f64)>>,
}

impl MaterialInfo {
    pub fn for_material_file(material_path: &Path) -> Result<Self, MaterialInfoError> {
        Self::open(material_path.with_extension(TABLE_EXTENSION))
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self, MaterialInfoError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| MaterialInfoError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &source)
    }

    fn parse(path: &Path, source: &str) -> Result<Self, MaterialInfoError> {
        let mut tables: BTreeMap<(u8, u8), Vec<(f64, f64)>> = BTreeMap::new();

        for (line_index, line) in source.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let row_error = |reason: &str| MaterialInfoError::Row {
                path: path.to_path_buf(),
                line: line_index + 1,
                reason: reason.to_string(),
            };

            let columns: Vec<&str> = trimmed.split_whitespace().collect();
            if columns.len() < 4 {
                return Err(row_error("expected KPAR ICOL ENERGY_EV VALUE_CM"));
            }
            let kpar: u8 = columns[0].parse().map_err(|_| row_error("invalid KPAR"))?;
            let icol: u8 = columns[1].parse().map_err(|_| row_error("invalid ICOL"))?;
            let energy: f64 = columns[2].parse().map_err(|_| row_error("invalid energy"))?;
            let value: f64 = columns[3].parse().map_err(|_| row_error("invalid value"))?;
            if !(energy > 0.0 && value > 0.0) {
                return Err(row_error("energy and value must be positive"));
            }

            tables
                .entry((kpar, icol))
                .or_default()
                .push((energy, cm_to_m(value)));
        }

        for table in tables.values_mut() {
            table.sort_by(|left, right| left.0.total_cmp(&right.0));
        }

        Ok(Self {
            path: path.to_path_buf(),
            tables,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lookup(&self, energy_ev: f64, kpar: u8, icol: u8) -> Result<f64, MaterialInfoError> {
        let table = self
            .tables
            .get(&(kpar, icol))
            .filter(|table| !table.is_empty())
            .ok_or_else(|| MaterialInfoError::MissingTable {
                path: self.path.clone(),
                kpar,
                icol,
            })?;
        Ok(interpolate_log_log(table, energy_ev))
    }
}

impl MaterialProperties for MaterialInfo {
    fn range_m(&self, energy_ev: f64, particle: Particle) -> PenelopeResult<f64> {
        Ok(self.lookup(energy_ev, particle.kpar(), RANGE_ICOL)?)
    }

    fn mean_free_path_m(
        &self,
        energy_ev: f64,
        particle: Particle,
        icol: u8,
    ) -> PenelopeResult<f64> {
        Ok(self.lookup(energy_ev, particle.kpar(), icol)?)
    }
}

/// Log-log interpolation clamped to the first and last rows.
fn interpolate_log_log(table: &[(f64, f64)], energy_ev: f64) -> f64 {
    let first = table[0];
    let last = table[table.len() - 1];
    if energy_ev <= first.0 {
        return first.1;
    }
    if energy_ev >= last.0 {
        return last.1;
    }

    let upper = table.partition_point(|(energy, _)| *energy < energy_ev);
    let (e0, v0) = table[upper - 1];
    let (e1, v1) = table[upper];
    if e1 == e0 {
        return v0;
    }

    let fraction = (energy_ev.ln() - e0.ln()) / (e1.ln() - e0.ln());
    (v0.ln() + fraction * (v1.ln() - v0.ln())).exp()
}
