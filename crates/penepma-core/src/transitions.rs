//! X-ray transition catalog used to pick depth-distribution lines.

use crate::common::units::{ev_to_kev, kg_m3_to_g_cm3};
use crate::domain::{Material, PenelopeError, Subshell, Transition};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CatalogTransition {
    pub z: u8,
    pub dest: Subshell,
    pub src: Subshell,
    pub probability: f64,
    #[serde(rename = "energy_eV")]
    pub energy_ev: f64,
    #[serde(rename = "edge_energy_eV")]
    pub edge_energy_ev: f64,
}

impl CatalogTransition {
    pub fn transition(&self) -> Option<Transition> {
        Transition::new(self.z, self.src, self.dest)
    }
}

pub trait TransitionCatalog {
    /// Transitions of element `z` whose line energy lies in
    /// `[low_ev, high_ev]`.
    fn transitions_for(&self, z: u8, low_ev: f64, high_ev: f64) -> Vec<CatalogTransition>;

    /// Ionisation edge energy of the transition's vacancy shell.
    fn edge_energy_ev(&self, transition: &Transition) -> Option<f64>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyTransitionCatalog;

impl TransitionCatalog for EmptyTransitionCatalog {
    fn transitions_for(&self, _z: u8, _low_ev: f64, _high_ev: f64) -> Vec<CatalogTransition> {
        Vec::new()
    }

    fn edge_energy_ev(&self, _transition: &Transition) -> Option<f64> {
        None
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read transition catalog '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse transition catalog '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl From<CatalogError> for PenelopeError {
    fn from(error: CatalogError) -> Self {
        match &error {
            CatalogError::Read { .. } => {
                PenelopeError::io_system("IO.CATALOG_READ", error.to_string())
            }
            CatalogError::Parse { .. } => {
                PenelopeError::input_validation("INPUT.CATALOG_PARSE", error.to_string())
            }
        }
    }
}

/// Catalog backed by a JSON array of [`CatalogTransition`] records.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JsonTransitionCatalog {
    entries: Vec<CatalogTransition>,
}

impl JsonTransitionCatalog {
    pub fn new(entries: Vec<CatalogTransition>) -> Self {
        let entries = entries
            .into_iter()
            .filter(|entry| entry.transition().is_some())
            .collect();
        Self { entries }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let entries: Vec<CatalogTransition> =
            serde_json::from_str(&source).map_err(|source| CatalogError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::new(entries))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TransitionCatalog for JsonTransitionCatalog {
    fn transitions_for(&self, z: u8, low_ev: f64, high_ev: f64) -> Vec<CatalogTransition> {
        self.entries
            .iter()
            .filter(|entry| entry.z == z && entry.energy_ev >= low_ev && entry.energy_ev <= high_ev)
            .copied()
            .collect()
    }

    fn edge_energy_ev(&self, transition: &Transition) -> Option<f64> {
        self.entries
            .iter()
            .find(|entry| entry.z == transition.z && entry.dest == transition.dest)
            .map(|entry| entry.edge_energy_ev)
    }
}

/// Anderson-Hasler x-ray generation range, in meters.
pub fn photon_range_m(beam_energy_ev: f64, material: &Material, edge_energy_ev: f64) -> f64 {
    let density = kg_m3_to_g_cm3(material.density_kg_m3);
    if beam_energy_ev <= edge_energy_ev || density <= 0.0 {
        return 0.0;
    }
    let e0 = ev_to_kev(beam_energy_ev);
    let ec = ev_to_kev(edge_energy_ev);
    0.064e-6 / density * (e0.powf(1.68) - ec.powf(1.68))
}

#[cfg(test)]
mod tests {
    use super::{
        EmptyTransitionCatalog, JsonTransitionCatalog, TransitionCatalog, photon_range_m,
    };
    use crate::domain::{Material, Transition};
    use std::fs;
    use tempfile::TempDir;

    const CATALOG: &str = r#"[
        {"z": 29, "dest": "K", "src": "L3", "probability": 0.58,
         "energy_eV": 8047.8, "edge_energy_eV": 8979.0},
        {"z": 29, "dest": "L3", "src": "M5", "probability": 0.7,
         "energy_eV": 929.7, "edge_energy_eV": 932.7},
        {"z": 29, "dest": "L3", "src": "K", "probability": 0.1,
         "energy_eV": 1.0, "edge_energy_eV": 1.0}
    ]"#;

    #[test]
    fn catalog_filters_by_energy_window_and_drops_invalid_entries() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("catalog.json");
        fs::write(&path, CATALOG).expect("catalog should be written");

        let catalog = JsonTransitionCatalog::load(&path).expect("catalog should load");
        assert_eq!(catalog.len(), 2);

        let lines = catalog.transitions_for(29, 50.0, 5_000.0);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].transition(), Transition::from_iupac(29, "L3", "M5"));

        let ka1 = Transition::from_iupac(29, "K", "L3").expect("valid transition");
        assert_eq!(catalog.edge_energy_ev(&ka1), Some(8979.0));
        assert!(EmptyTransitionCatalog.transitions_for(29, 0.0, 1.0e5).is_empty());
    }

    #[test]
    fn photon_range_follows_anderson_hasler() {
        let copper = Material::new("Cu", [(29, 1.0)], 8960.0);
        let range = photon_range_m(20_000.0, &copper, 8979.0);
        let expected = 0.064e-6 / 8.96 * (20.0_f64.powf(1.68) - 8.979_f64.powf(1.68));
        assert!((range - expected).abs() <= 1.0e-18);
        assert_eq!(photon_range_m(5_000.0, &copper, 8979.0), 0.0);
    }
}
