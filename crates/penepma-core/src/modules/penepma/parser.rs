//! Readers for the tabulated PENEPMA output files.

use crate::common::units::cm_to_m;
use crate::domain::{HistogramBin, ImportResult, Measured, PenelopeError, Transition};
use globset::Glob;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

/// Header rows preceding the numeric body of a depth map.
const DEPTH_HEADER_ROWS: usize = 6;

const DEPTH_HEADER_PATTERN: &str =
    r"^Z = ([ \d]+),([ \w]+)-([ \w]+), detector = ([ \d]+)";

pub(crate) fn require_file(path: &Path) -> ImportResult<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(PenelopeError::importer(
            "IMPORT.MISSING_FILE",
            format!("Data file {} cannot be found", path.display()),
        ))
    }
}

pub(crate) fn read_data_file(path: &Path) -> ImportResult<String> {
    require_file(path)?;
    fs::read_to_string(path).map_err(|source| {
        PenelopeError::importer(
            "IMPORT.READ_FILE",
            format!("failed to read data file '{}': {source}", path.display()),
        )
    })
}

fn data_rows(source: &str) -> impl Iterator<Item = (usize, &str)> {
    source
        .lines()
        .enumerate()
        .map(|(number, line)| (number + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
}

fn parse_float(path: &Path, line_number: usize, token: &str) -> ImportResult<f64> {
    token.parse::<f64>().map_err(|_| {
        PenelopeError::importer(
            "IMPORT.NUMERIC_ROW",
            format!(
                "'{}' line {line_number}: '{token}' is not a number",
                path.display()
            ),
        )
    })
}

/// Three-column `x value uncertainty` table.
pub(super) fn read_histogram(path: &Path) -> ImportResult<Vec<HistogramBin>> {
    let source = read_data_file(path)?;
    data_rows(&source)
        .map(|(line_number, line)| {
            let values: Vec<&str> = line.split_whitespace().collect();
            if values.len() < 3 {
                return Err(PenelopeError::importer(
                    "IMPORT.NUMERIC_ROW",
                    format!(
                        "'{}' line {line_number}: expected 3 columns, found {}",
                        path.display(),
                        values.len()
                    ),
                ));
            }
            Ok(HistogramBin::new(
                parse_float(path, line_number, values[0])?,
                parse_float(path, line_number, values[1])?,
                parse_float(path, line_number, values[2])?,
            ))
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct IntensityRow {
    pub(super) transition: Transition,
    pub(super) characteristic: Measured,
    pub(super) bremsstrahlung: Measured,
    pub(super) primary: Measured,
    pub(super) total: Measured,
}

/// Parses `Z dest src ... nf cf bf tf t` rows. Rows naming a transition
/// PENELOPE does not tabulate, or too short to hold the totals, give `None`.
pub(super) fn parse_intensity_row(line: &str) -> Option<IntensityRow> {
    let values: Vec<&str> = line.split_whitespace().collect();
    if values.len() < 14 {
        return None;
    }

    let z = values[0].parse::<u8>().ok()?;
    let transition = Transition::from_iupac(z, values[1].trim(), values[2].trim())?;
    let pair = |value: usize, uncertainty: usize| -> Option<Measured> {
        Some(Measured::new(
            values[value].parse().ok()?,
            values[uncertainty].parse().ok()?,
        ))
    };

    Some(IntensityRow {
        transition,
        primary: pair(4, 5)?,
        characteristic: pair(6, 7)?,
        bremsstrahlung: pair(8, 9)?,
        total: pair(12, 13)?,
    })
}

pub(super) fn read_intensity_rows(path: &Path) -> ImportResult<Vec<IntensityRow>> {
    let source = read_data_file(path)?;
    Ok(data_rows(&source)
        .filter_map(|(_, line)| parse_intensity_row(line))
        .collect())
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct DepthMap {
    pub(super) transition: Transition,
    /// Zero for the distribution without absorption.
    pub(super) detector_index: usize,
    pub(super) rows: Vec<Vec<f64>>,
}

/// Depth map files in `dir`, sorted by name.
pub(super) fn depth_map_paths(dir: &Path, pattern: &str) -> ImportResult<Vec<PathBuf>> {
    let matcher = Glob::new(pattern)
        .map_err(|source| {
            PenelopeError::internal(
                "IMPORT.DEPTH_GLOB",
                format!("invalid depth map pattern '{pattern}': {source}"),
            )
        })?
        .compile_matcher();

    let entries = fs::read_dir(dir).map_err(|source| {
        PenelopeError::importer(
            "IMPORT.READ_DIRECTORY",
            format!("failed to list results directory '{}': {source}", dir.display()),
        )
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| {
            PenelopeError::importer(
                "IMPORT.READ_DIRECTORY",
                format!("failed to list results directory '{}': {source}", dir.display()),
            )
        })?;
        let path = entry.path();
        if path.is_file() && path.file_name().is_some_and(|name| matcher.is_match(name)) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

pub(super) fn read_depth_map(path: &Path) -> ImportResult<DepthMap> {
    let source = read_data_file(path)?;
    let header_error = |detail: &str| {
        PenelopeError::importer(
            "IMPORT.DEPTH_HEADER",
            format!("'{}': {detail}", path.display()),
        )
    };

    let header = source
        .lines()
        .nth(1)
        .and_then(|line| line.split(':').nth(1))
        .map(str::trim)
        .ok_or_else(|| header_error("missing transition header on line 2"))?;

    let pattern = Regex::new(DEPTH_HEADER_PATTERN).map_err(|source| {
        PenelopeError::internal(
            "IMPORT.DEPTH_PATTERN",
            format!("invalid depth header pattern: {source}"),
        )
    })?;
    let captures = pattern
        .captures(header)
        .ok_or_else(|| header_error(&format!("unrecognised header '{header}'")))?;

    let z = captures[1]
        .trim()
        .parse::<u8>()
        .map_err(|_| header_error("invalid atomic number"))?;
    let transition = Transition::from_iupac(z, captures[2].trim(), captures[3].trim())
        .ok_or_else(|| header_error(&format!("unknown transition in '{header}'")))?;
    let detector_index = captures[4]
        .trim()
        .parse::<usize>()
        .map_err(|_| header_error("invalid detector index"))?;

    let mut rows = Vec::new();
    for (line_number, line) in source.lines().enumerate().skip(DEPTH_HEADER_ROWS) {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let row = line
            .split_whitespace()
            .map(|token| parse_float(path, line_number + 1, token).map(cm_to_m))
            .collect::<ImportResult<Vec<f64>>>()?;
        rows.push(row);
    }

    Ok(DepthMap {
        transition,
        detector_index,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::{parse_intensity_row, read_depth_map, read_histogram, require_file};
    use crate::domain::{Measured, PenelopeErrorCategory, Transition};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn missing_files_are_importer_errors_naming_the_path() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("pe-spect-01.dat");

        let error = require_file(&path).expect_err("file is missing");
        assert_eq!(error.category(), PenelopeErrorCategory::ImporterError);
        assert!(error.message().contains("pe-spect-01.dat"));
    }

    #[test]
    fn histogram_skips_comments_and_blank_lines() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("pe-energy-el-up.dat");
        fs::write(
            &path,
            "# Energy distribution\n#\n  1.0E+02  2.5E-03  1.0E-04\n\n  2.0E+02  3.5E-03  2.0E-04\n",
        )
        .expect("table should be written");

        let bins = read_histogram(&path).expect("histogram should parse");
        assert_eq!(bins.len(), 2);
        assert_eq!(bins[1].x, 200.0);
        assert_eq!(bins[1].value, 3.5e-3);
        assert_eq!(bins[1].uncertainty, 2.0e-4);
    }

    #[test]
    fn intensity_rows_skip_unsupported_transitions() {
        let row = parse_intensity_row(
            "29 K L3 8.04E+03 1.0E-05 1.0E-07 2.0E-06 2.0E-08 3.0E-06 3.0E-08 0 0 4.0E-05 4.0E-07",
        )
        .expect("row should parse");
        assert_eq!(row.transition, Transition::from_iupac(29, "K", "L3").expect("valid"));
        assert_eq!(row.primary, Measured::new(1.0e-5, 1.0e-7));
        assert_eq!(row.characteristic, Measured::new(2.0e-6, 2.0e-8));
        assert_eq!(row.bremsstrahlung, Measured::new(3.0e-6, 3.0e-8));
        assert_eq!(row.total, Measured::new(4.0e-5, 4.0e-7));

        assert!(parse_intensity_row("29 L3 K 0 0 0 0 0 0 0 0 0 0 0").is_none());
        assert!(parse_intensity_row("29 K L3 1.0").is_none());
    }

    #[test]
    fn depth_header_recovers_transition_and_detector() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("pe-map-01-depth.dat");
        fs::write(
            &path,
            "# Depth distribution\n# X-ray line : Z = 29, K-L3, detector =  1\n#\n#\n#\n#\n\
             -1.0E-04 2.0E+00 1.0E-02\n -2.0E-04 1.0E+00 1.0E-02\n",
        )
        .expect("map should be written");

        let map = read_depth_map(&path).expect("map should parse");
        assert_eq!(map.transition, Transition::from_iupac(29, "K", "L3").expect("valid"));
        assert_eq!(map.detector_index, 1);
        assert_eq!(map.rows.len(), 2);
        assert!((map.rows[0][0] + 1.0e-6).abs() <= 1.0e-18);
        assert!((map.rows[1][1] - 1.0e-2).abs() <= 1.0e-15);
    }
}
