use super::options::{Collision, Particle};
use super::transition::Transition;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Value with its one-sigma statistical uncertainty.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Measured {
    pub value: f64,
    pub uncertainty: f64,
}

impl Measured {
    pub const fn new(value: f64, uncertainty: f64) -> Self {
        Self { value, uncertainty }
    }

    pub const fn exact(value: f64) -> Self {
        Self::new(value, 0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub x: f64,
    pub value: f64,
    pub uncertainty: f64,
}

impl HistogramBin {
    pub const fn new(x: f64, value: f64, uncertainty: f64) -> Self {
        Self {
            x,
            value,
            uncertainty,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PhotonKind {
    /// Characteristic fluorescence.
    #[serde(rename = "C")]
    CharacteristicFluorescence,
    /// Bremsstrahlung fluorescence.
    #[serde(rename = "B")]
    BremsstrahlungFluorescence,
    /// Primary photons, no fluorescence.
    #[serde(rename = "P")]
    Primary,
    #[serde(rename = "T")]
    Total,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PhotonKey {
    pub transition: Transition,
    /// `true` for emitted intensities, `false` for generated ones.
    pub absorption: bool,
    pub kind: PhotonKind,
}

impl PhotonKey {
    pub const fn new(transition: Transition, absorption: bool, kind: PhotonKind) -> Self {
        Self {
            transition,
            absorption,
            kind,
        }
    }
}

mod keyed_entries {
    use serde::de::DeserializeOwned;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    #[derive(Serialize)]
    struct EntryRef<'a, K, V> {
        key: &'a K,
        value: &'a V,
    }

    #[derive(Deserialize)]
    struct Entry<K, V> {
        key: K,
        value: V,
    }

    pub(super) fn serialize<K, V, S>(map: &BTreeMap<K, V>, serializer: S) -> Result<S::Ok, S::Error>
    where
        K: Serialize,
        V: Serialize,
        S: Serializer,
    {
        serializer.collect_seq(map.iter().map(|(key, value)| EntryRef { key, value }))
    }

    pub(super) fn deserialize<'de, K, V, D>(deserializer: D) -> Result<BTreeMap<K, V>, D::Error>
    where
        K: DeserializeOwned + Ord,
        V: DeserializeOwned,
        D: Deserializer<'de>,
    {
        let entries = Vec::<Entry<K, V>>::deserialize(deserializer)?;
        Ok(entries
            .into_iter()
            .map(|entry| (entry.key, entry.value))
            .collect())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PhotonIntensityResult {
    #[serde(with = "keyed_entries")]
    pub intensities: BTreeMap<PhotonKey, Measured>,
}

impl PhotonIntensityResult {
    pub fn insert(&mut self, key: PhotonKey, value: Measured) {
        self.intensities.insert(key, value);
    }

    pub fn get(&self, key: &PhotonKey) -> Option<Measured> {
        self.intensities.get(key).copied()
    }

    /// Total intensity when `fluorescence` is set, primary intensity otherwise.
    pub fn intensity(
        &self,
        transition: Transition,
        absorption: bool,
        fluorescence: bool,
    ) -> Option<Measured> {
        let kind = if fluorescence {
            PhotonKind::Total
        } else {
            PhotonKind::Primary
        };
        self.get(&PhotonKey::new(transition, absorption, kind))
    }

    pub fn transitions(&self) -> Vec<Transition> {
        let mut transitions: Vec<Transition> =
            self.intensities.keys().map(|key| key.transition).collect();
        transitions.dedup();
        transitions
    }

    pub fn len(&self) -> usize {
        self.intensities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intensities.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PhotonSpectrumResult {
    pub total: Vec<HistogramBin>,
    pub background: Vec<HistogramBin>,
}

/// Depth distributions `phi(rho z)` keyed by transition and absorption.
/// Each row holds the columns of the PENEPMA map file, scaled by `1e-2`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PhotonDepthResult {
    #[serde(with = "keyed_entries")]
    pub distributions: BTreeMap<PhotonKey, Vec<Vec<f64>>>,
}

impl PhotonDepthResult {
    pub fn get(&self, transition: Transition, absorption: bool) -> Option<&[Vec<f64>]> {
        self.distributions
            .get(&PhotonKey::new(transition, absorption, PhotonKind::Total))
            .map(Vec::as_slice)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElectronFractionResult {
    pub absorbed: Measured,
    pub backscattered: Measured,
    pub transmitted: Measured,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeResult {
    pub simulation_time_s: f64,
    /// Seconds per simulated shower.
    pub simulation_speed_s: Measured,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShowersStatisticsResult {
    pub showers: u64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BackscatteredElectronEnergyResult {
    pub data: Vec<HistogramBin>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TransmittedElectronEnergyResult {
    pub data: Vec<HistogramBin>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub x_m: f64,
    pub y_m: f64,
    pub z_m: f64,
    #[serde(rename = "energy_eV")]
    pub energy_ev: f64,
    pub collision: Collision,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub index: i64,
    pub primary: bool,
    pub particle: Particle,
    pub collision: Collision,
    pub exit_state: i64,
    pub interactions: Vec<Interaction>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TrajectoryResult {
    pub trajectories: Vec<Trajectory>,
}

impl TrajectoryResult {
    pub fn primary(&self) -> impl Iterator<Item = &Trajectory> {
        self.trajectories
            .iter()
            .filter(|trajectory| trajectory.primary)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DetectorResult {
    PhotonSpectrum(PhotonSpectrumResult),
    PhotonIntensity(PhotonIntensityResult),
    PhotonDepth(PhotonDepthResult),
    ElectronFraction(ElectronFractionResult),
    Time(TimeResult),
    ShowersStatistics(ShowersStatisticsResult),
    BackscatteredElectronEnergy(BackscatteredElectronEnergyResult),
    TransmittedElectronEnergy(TransmittedElectronEnergyResult),
    Trajectory(TrajectoryResult),
}

impl DetectorResult {
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::PhotonSpectrum(_) => "photon_spectrum",
            Self::PhotonIntensity(_) => "photon_intensity",
            Self::PhotonDepth(_) => "photon_depth",
            Self::ElectronFraction(_) => "electron_fraction",
            Self::Time(_) => "time",
            Self::ShowersStatistics(_) => "showers_statistics",
            Self::BackscatteredElectronEnergy(_) => "backscattered_electron_energy",
            Self::TransmittedElectronEnergy(_) => "transmitted_electron_energy",
            Self::Trajectory(_) => "trajectory",
        }
    }
}
