//! Assignment of PENEPMA photon-detector indices to delimited detectors.
//!
//! Detectors sharing an angular opening, compared at six decimal places,
//! share one index. Indices are assigned in ascending order of the rounded
//! opening so that exporting and importing the same options always agree.

use crate::common::constants::MAX_PHOTON_DETECTORS;
use crate::domain::{AngularWindow, DetectorSet, PenelopeError, PenelopeResult};
use std::collections::BTreeMap;

const OPENING_SCALE: f64 = 1.0e6;

type OpeningKey = [i64; 4];

fn opening_key(window: &AngularWindow) -> OpeningKey {
    let round = |value: f64| (value * OPENING_SCALE).round() as i64;
    [
        round(window.elevation_rad.0),
        round(window.elevation_rad.1),
        round(window.azimuth_rad.0),
        round(window.azimuth_rad.1),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DetectorIndexMap {
    key_index: BTreeMap<String, usize>,
    index_keys: Vec<Vec<String>>,
}

impl DetectorIndexMap {
    pub fn resolve(detectors: &DetectorSet) -> Self {
        let mut openings: BTreeMap<OpeningKey, Vec<String>> = BTreeMap::new();
        for (key, window) in detectors.delimited() {
            openings
                .entry(opening_key(window))
                .or_default()
                .push(key.to_string());
        }

        let mut map = Self::default();
        for (index, keys) in openings.into_values().enumerate() {
            for key in &keys {
                map.key_index.insert(key.clone(), index);
            }
            map.index_keys.push(keys);
        }
        map
    }

    /// Zero-based index of a delimited detector.
    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.key_index.get(key).copied()
    }

    /// One-based index used in PENEPMA file names and keywords.
    pub fn file_index_of(&self, key: &str) -> Option<usize> {
        self.index_of(key).map(|index| index + 1)
    }

    pub fn keys_at(&self, index: usize) -> &[String] {
        self.index_keys
            .get(index)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &[String])> {
        self.index_keys
            .iter()
            .enumerate()
            .map(|(index, keys)| (index, keys.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.index_keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index_keys.is_empty()
    }

    pub fn ensure_within_limit(&self) -> PenelopeResult<()> {
        if self.len() > MAX_PHOTON_DETECTORS {
            return Err(PenelopeError::format_limit(
                "FORMAT.MAX_PHOTON_DETECTORS",
                format!(
                    "PENEPMA can only have {MAX_PHOTON_DETECTORS} detectors. {} are defined.",
                    self.len()
                ),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::DetectorIndexMap;
    use crate::domain::{AngularWindow, Detector, DetectorSet, PenelopeErrorCategory};

    fn window(elevation_low: f64) -> AngularWindow {
        AngularWindow::new((elevation_low, elevation_low + 0.1), (0.0, 6.28))
    }

    #[test]
    fn equal_openings_share_an_index() {
        let detectors = DetectorSet::new()
            .with("spectrum", Detector::photon_spectrum(window(0.6), 100, (0.0, 1.0e4)))
            .with("low", Detector::photon_intensity(window(0.2)))
            .with("intensity", Detector::photon_intensity(window(0.600_000_000_1)))
            .with("fraction", Detector::ElectronFraction);

        let map = DetectorIndexMap::resolve(&detectors);

        assert_eq!(map.len(), 2);
        assert_eq!(map.index_of("low"), Some(0));
        assert_eq!(map.index_of("spectrum"), Some(1));
        assert_eq!(map.index_of("intensity"), Some(1));
        assert_eq!(map.file_index_of("intensity"), Some(2));
        assert_eq!(map.index_of("fraction"), None);
        assert_eq!(map.keys_at(1), ["spectrum".to_string(), "intensity".to_string()]);
        assert!(map.keys_at(5).is_empty());
    }

    #[test]
    fn resolution_is_deterministic() {
        let detectors = DetectorSet::new()
            .with("b", Detector::photon_intensity(window(0.5)))
            .with("a", Detector::photon_intensity(window(0.1)));

        let first = DetectorIndexMap::resolve(&detectors);
        let second = DetectorIndexMap::resolve(&detectors.clone());

        assert_eq!(first, second);
        assert_eq!(first.index_of("a"), Some(0));
        assert_eq!(first.index_of("b"), Some(1));
    }

    #[test]
    fn more_than_twenty_five_openings_exceed_the_limit() {
        let mut detectors = DetectorSet::new();
        for position in 0..26 {
            detectors.insert(
                format!("det{position}"),
                Detector::photon_intensity(window(-1.5 + 0.1 * f64::from(position))),
            );
        }

        let map = DetectorIndexMap::resolve(&detectors);
        assert_eq!(map.len(), 26);
        let error = map
            .ensure_within_limit()
            .expect_err("26 openings should exceed the limit");
        assert_eq!(error.category(), PenelopeErrorCategory::FormatLimitExceeded);
        assert_eq!(error.placeholder(), "FORMAT.MAX_PHOTON_DETECTORS");
    }
}
