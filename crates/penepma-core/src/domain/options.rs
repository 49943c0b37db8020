use super::errors::{PenelopeError, PenelopeResult};
use super::transition::{Transition, element_symbol};
use crate::common::constants::{
    DEFAULT_ABSORPTION_ENERGY_EV, DEFAULT_CUTOFF_ENERGY_EV, MAX_STEP_LENGTH_M,
};
use crate::common::units::rad_to_deg;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f64::consts::{FRAC_PI_2, PI};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Particle {
    #[default]
    Electron,
    Photon,
    Positron,
}

impl Particle {
    /// PENELOPE `KPAR` code.
    pub const fn kpar(self) -> u8 {
        match self {
            Self::Electron => 1,
            Self::Photon => 2,
            Self::Positron => 3,
        }
    }

    pub const fn from_kpar(kpar: u8) -> Option<Self> {
        match kpar {
            1 => Some(Self::Electron),
            2 => Some(Self::Photon),
            3 => Some(Self::Positron),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Electron => "electron",
            Self::Photon => "photon",
            Self::Positron => "positron",
        }
    }
}

impl Display for Particle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collision {
    NoCollision,
    SoftEvent,
    HardElastic,
    HardInelastic,
    HardBremsstrahlungEmission,
    InnershellImpactIonisation,
    CoherentRayleighScattering,
    IncoherentComptonScattering,
    PhotoelectricAbsorption,
    ElectronPositronPairProduction,
    Annihilation,
    Delta,
}

impl Collision {
    /// PENEPMA `ICOL` code of a forceable interaction, `None` when the
    /// particle cannot undergo this collision.
    pub const fn icol(self, particle: Particle) -> Option<u8> {
        match (particle, self) {
            (Particle::Electron | Particle::Positron, Self::HardElastic) => Some(2),
            (Particle::Electron | Particle::Positron, Self::HardInelastic) => Some(3),
            (Particle::Electron | Particle::Positron, Self::HardBremsstrahlungEmission) => Some(4),
            (Particle::Electron | Particle::Positron, Self::InnershellImpactIonisation) => Some(5),
            (Particle::Positron, Self::Annihilation) => Some(6),
            (Particle::Photon, Self::CoherentRayleighScattering) => Some(1),
            (Particle::Photon, Self::IncoherentComptonScattering) => Some(2),
            (Particle::Photon, Self::PhotoelectricAbsorption) => Some(3),
            (Particle::Photon, Self::ElectronPositronPairProduction) => Some(4),
            (_, Self::Delta) => Some(7),
            _ => None,
        }
    }

    /// Collision recorded in a PENSHOWER trajectory file. Unknown codes map
    /// to [`Collision::NoCollision`].
    pub fn from_trajectory_icol(particle: Particle, code: i64) -> Self {
        match (particle, code) {
            (Particle::Electron | Particle::Positron, 1) => Self::SoftEvent,
            (Particle::Electron | Particle::Positron, 2) => Self::HardElastic,
            (Particle::Electron | Particle::Positron, 3) => Self::HardInelastic,
            (Particle::Electron | Particle::Positron, 4) => Self::HardBremsstrahlungEmission,
            (Particle::Electron | Particle::Positron, 5) => Self::InnershellImpactIonisation,
            (Particle::Positron, 6) => Self::Annihilation,
            (Particle::Photon, 1) => Self::CoherentRayleighScattering,
            (Particle::Photon, 2) => Self::IncoherentComptonScattering,
            (Particle::Photon, 3) => Self::PhotoelectricAbsorption,
            (Particle::Photon, 4) => Self::ElectronPositronPairProduction,
            (_, 7) => Self::Delta,
            _ => Self::NoCollision,
        }
    }
}

fn default_forcer() -> f64 {
    -1.0
}

fn default_weight() -> (f64, f64) {
    (0.1, 1.0)
}

/// Forcing rule of one (particle, collision) pair. A negative forcer asks the
/// exporter to derive the factor from the material tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionForcing {
    pub particle: Particle,
    pub collision: Collision,
    #[serde(default = "default_forcer")]
    pub forcer: f64,
    #[serde(default = "default_weight")]
    pub weight: (f64, f64),
}

impl InteractionForcing {
    pub fn new(particle: Particle, collision: Collision) -> Self {
        Self {
            particle,
            collision,
            forcer: default_forcer(),
            weight: default_weight(),
        }
    }

    pub fn with_forcer(mut self, forcer: f64) -> Self {
        self.forcer = forcer;
        self
    }

    pub fn with_weight(mut self, low: f64, high: f64) -> Self {
        self.weight = (low, high);
        self
    }

    pub fn icol(&self) -> PenelopeResult<u8> {
        self.collision.icol(self.particle).ok_or_else(|| {
            PenelopeError::input_validation(
                "INPUT.FORCING_COLLISION",
                format!(
                    "collision {:?} cannot be forced for {} particles",
                    self.collision, self.particle
                ),
            )
        })
    }

    pub fn validate(&self) -> PenelopeResult<()> {
        self.icol()?;
        if self.forcer == 0.0 || !self.forcer.is_finite() {
            return Err(PenelopeError::input_validation(
                "INPUT.FORCING_FORCER",
                format!("forcer must be finite and non-zero, got {}", self.forcer),
            ));
        }
        let (low, high) = self.weight;
        if !(0.0..=1.0).contains(&low) || !(0.0..=1.0).contains(&high) {
            return Err(PenelopeError::input_validation(
                "INPUT.FORCING_WEIGHT",
                format!("weight window ({low}, {high}) must lie within [0.0, 1.0]"),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AbsorptionEnergies {
    pub electron: f64,
    pub photon: f64,
    pub positron: f64,
}

impl Default for AbsorptionEnergies {
    fn default() -> Self {
        Self {
            electron: DEFAULT_ABSORPTION_ENERGY_EV,
            photon: DEFAULT_ABSORPTION_ENERGY_EV,
            positron: DEFAULT_ABSORPTION_ENERGY_EV,
        }
    }
}

impl AbsorptionEnergies {
    pub const fn for_particle(&self, particle: Particle) -> f64 {
        match particle {
            Particle::Electron => self.electron,
            Particle::Photon => self.photon,
            Particle::Positron => self.positron,
        }
    }
}

fn default_cutoff_energy() -> f64 {
    DEFAULT_CUTOFF_ENERGY_EV
}

fn default_maximum_step_length() -> f64 {
    MAX_STEP_LENGTH_M
}

/// PENELOPE material. An empty composition denotes vacuum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    #[serde(default)]
    pub composition: BTreeMap<u8, f64>,
    #[serde(default)]
    pub density_kg_m3: f64,
    #[serde(default, rename = "absorption_energy_eV")]
    pub absorption_energy_ev: AbsorptionEnergies,
    #[serde(default)]
    pub elastic_scattering: (f64, f64),
    #[serde(default = "default_cutoff_energy", rename = "cutoff_energy_inelastic_eV")]
    pub cutoff_energy_inelastic_ev: f64,
    #[serde(
        default = "default_cutoff_energy",
        rename = "cutoff_energy_bremsstrahlung_eV"
    )]
    pub cutoff_energy_bremsstrahlung_ev: f64,
    #[serde(default)]
    pub interaction_forcings: Vec<InteractionForcing>,
    #[serde(default = "default_maximum_step_length")]
    pub maximum_step_length_m: f64,
}

impl Material {
    pub fn new(
        name: impl Into<String>,
        composition: impl IntoIterator<Item = (u8, f64)>,
        density_kg_m3: f64,
    ) -> Self {
        Self {
            name: name.into(),
            composition: composition.into_iter().collect(),
            density_kg_m3,
            absorption_energy_ev: AbsorptionEnergies::default(),
            elastic_scattering: (0.0, 0.0),
            cutoff_energy_inelastic_ev: DEFAULT_CUTOFF_ENERGY_EV,
            cutoff_energy_bremsstrahlung_ev: DEFAULT_CUTOFF_ENERGY_EV,
            interaction_forcings: Vec::new(),
            maximum_step_length_m: MAX_STEP_LENGTH_M,
        }
    }

    pub fn vacuum() -> Self {
        Self::new("Vacuum", [], 0.0)
    }

    pub fn is_vacuum(&self) -> bool {
        self.composition.is_empty()
    }

    pub fn with_forcing(mut self, forcing: InteractionForcing) -> Self {
        self.interaction_forcings.push(forcing);
        self
    }

    pub fn density_g_cm3(&self) -> f64 {
        self.density_kg_m3 / 1000.0
    }

    pub fn elements(&self) -> impl Iterator<Item = u8> + '_ {
        self.composition.keys().copied()
    }

    /// Step length written to DSMAX, capped at the PENELOPE maximum.
    pub fn effective_maximum_step_length_m(&self) -> f64 {
        if self.maximum_step_length_m > MAX_STEP_LENGTH_M {
            tracing::warn!(
                material = %self.name,
                requested = self.maximum_step_length_m,
                "maximum step length set to maximum value: 1e20"
            );
            MAX_STEP_LENGTH_M
        } else {
            self.maximum_step_length_m
        }
    }

    pub fn validate(&self) -> PenelopeResult<()> {
        if self.is_vacuum() {
            return Ok(());
        }

        for (z, fraction) in &self.composition {
            if element_symbol(*z).is_none() {
                return Err(PenelopeError::input_validation(
                    "INPUT.MATERIAL_ELEMENT",
                    format!("material '{}' contains unknown element Z={}", self.name, z),
                ));
            }
            if !(*fraction > 0.0 && *fraction <= 1.0) {
                return Err(PenelopeError::input_validation(
                    "INPUT.MATERIAL_FRACTION",
                    format!(
                        "material '{}' weight fraction of Z={} must be in ]0.0, 1.0], got {}",
                        self.name, z, fraction
                    ),
                ));
            }
        }

        if !(self.density_kg_m3 > 0.0 && self.density_kg_m3.is_finite()) {
            return Err(PenelopeError::input_validation(
                "INPUT.MATERIAL_DENSITY",
                format!(
                    "material '{}' density must be positive, got {} kg/m3",
                    self.name, self.density_kg_m3
                ),
            ));
        }

        let (c1, c2) = self.elastic_scattering;
        if !(0.0..=0.2).contains(&c1) || !(0.0..=0.2).contains(&c2) {
            return Err(PenelopeError::input_validation(
                "INPUT.MATERIAL_ELASTIC_SCATTERING",
                format!(
                    "material '{}' C1 and C2 must be within [0.0, 0.2], got ({}, {})",
                    self.name, c1, c2
                ),
            ));
        }

        if self.cutoff_energy_inelastic_ev < 0.0 || self.cutoff_energy_bremsstrahlung_ev < 0.0 {
            return Err(PenelopeError::input_validation(
                "INPUT.MATERIAL_CUTOFF",
                format!(
                    "material '{}' cutoff energies must be >= 0.0 eV",
                    self.name
                ),
            ));
        }

        if self.maximum_step_length_m < 0.0 {
            return Err(PenelopeError::input_validation(
                "INPUT.MATERIAL_STEP_LENGTH",
                format!(
                    "material '{}' maximum step length must be >= 0.0 m, got {}",
                    self.name, self.maximum_step_length_m
                ),
            ));
        }

        for forcing in &self.interaction_forcings {
            forcing.validate()?;
        }

        Ok(())
    }
}

fn default_origin() -> [f64; 3] {
    [0.0, 0.0, 1.0]
}

fn default_direction_polar() -> f64 {
    PI
}

/// Gaussian beam; a pencil beam is a beam with zero diameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Beam {
    #[serde(default)]
    pub particle: Particle,
    #[serde(rename = "energy_eV")]
    pub energy_ev: f64,
    #[serde(default = "default_origin")]
    pub origin_m: [f64; 3],
    #[serde(default = "default_direction_polar")]
    pub direction_polar_rad: f64,
    #[serde(default)]
    pub direction_azimuth_rad: f64,
    #[serde(default)]
    pub aperture_rad: f64,
    #[serde(default)]
    pub diameter_m: f64,
}

impl Beam {
    pub fn new(energy_ev: f64) -> Self {
        Self {
            particle: Particle::Electron,
            energy_ev,
            origin_m: default_origin(),
            direction_polar_rad: default_direction_polar(),
            direction_azimuth_rad: 0.0,
            aperture_rad: 0.0,
            diameter_m: 0.0,
        }
    }

    pub fn with_diameter(mut self, diameter_m: f64) -> Self {
        self.diameter_m = diameter_m;
        self
    }

    pub fn validate(&self) -> PenelopeResult<()> {
        if !(self.energy_ev > 0.0 && self.energy_ev.is_finite()) {
            return Err(PenelopeError::input_validation(
                "INPUT.BEAM_ENERGY",
                format!("beam energy must be positive, got {} eV", self.energy_ev),
            ));
        }
        if self.diameter_m < 0.0 || self.aperture_rad < 0.0 {
            return Err(PenelopeError::input_validation(
                "INPUT.BEAM_SHAPE",
                "beam diameter and aperture must be >= 0.0",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub material: Material,
    pub thickness_m: f64,
}

impl Layer {
    pub fn new(material: Material, thickness_m: f64) -> Self {
        Self {
            material,
            thickness_m,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryKind {
    Substrate {
        material: Material,
    },
    Inclusion {
        substrate: Material,
        inclusion: Material,
        inclusion_diameter_m: f64,
    },
    HorizontalLayers {
        layers: Vec<Layer>,
        #[serde(default)]
        substrate: Option<Material>,
    },
    VerticalLayers {
        left_substrate: Material,
        layers: Vec<Layer>,
        right_substrate: Material,
    },
    Sphere {
        material: Material,
        diameter_m: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub kind: GeometryKind,
    #[serde(default)]
    pub tilt_rad: f64,
    #[serde(default)]
    pub rotation_rad: f64,
}

impl Geometry {
    pub fn new(kind: GeometryKind) -> Self {
        Self {
            kind,
            tilt_rad: 0.0,
            rotation_rad: 0.0,
        }
    }

    pub fn substrate(material: Material) -> Self {
        Self::new(GeometryKind::Substrate { material })
    }

    /// Lower-cased geometry name, also used as the `.geo` file stem.
    pub const fn title(&self) -> &'static str {
        match self.kind {
            GeometryKind::Substrate { .. } => "substrate",
            GeometryKind::Inclusion { .. } => "inclusion",
            GeometryKind::HorizontalLayers { .. } => "horizontallayers",
            GeometryKind::VerticalLayers { .. } => "verticallayers",
            GeometryKind::Sphere { .. } => "sphere",
        }
    }

    /// Distinct non-vacuum materials in body order.
    pub fn materials(&self) -> Vec<&Material> {
        let candidates: Vec<&Material> = match &self.kind {
            GeometryKind::Substrate { material } | GeometryKind::Sphere { material, .. } => {
                vec![material]
            }
            GeometryKind::Inclusion {
                substrate,
                inclusion,
                ..
            } => vec![substrate, inclusion],
            GeometryKind::HorizontalLayers { layers, substrate } => layers
                .iter()
                .map(|layer| &layer.material)
                .chain(substrate.iter())
                .collect(),
            GeometryKind::VerticalLayers {
                left_substrate,
                layers,
                right_substrate,
            } => std::iter::once(left_substrate)
                .chain(layers.iter().map(|layer| &layer.material))
                .chain(std::iter::once(right_substrate))
                .collect(),
        };

        let mut materials: Vec<&Material> = Vec::new();
        for material in candidates {
            if !material.is_vacuum() && !materials.contains(&material) {
                materials.push(material);
            }
        }
        materials
    }

    pub fn validate(&self) -> PenelopeResult<()> {
        for material in self.materials() {
            material.validate()?;
        }

        match &self.kind {
            GeometryKind::Substrate { .. } => Ok(()),
            GeometryKind::Inclusion {
                inclusion_diameter_m,
                ..
            } => validate_positive_length("inclusion diameter", *inclusion_diameter_m),
            GeometryKind::Sphere { diameter_m, .. } => {
                validate_positive_length("sphere diameter", *diameter_m)
            }
            GeometryKind::HorizontalLayers { layers, substrate } => {
                if layers.is_empty() && substrate.is_none() {
                    return Err(PenelopeError::input_validation(
                        "INPUT.GEOMETRY_EMPTY",
                        "horizontal layers geometry requires a layer or a substrate",
                    ));
                }
                layers
                    .iter()
                    .try_for_each(|layer| validate_positive_length("layer thickness", layer.thickness_m))
            }
            GeometryKind::VerticalLayers { layers, .. } => {
                if layers.is_empty() {
                    return Err(PenelopeError::input_validation(
                        "INPUT.GEOMETRY_EMPTY",
                        "vertical layers geometry requires at least one layer",
                    ));
                }
                layers
                    .iter()
                    .try_for_each(|layer| validate_positive_length("layer thickness", layer.thickness_m))
            }
        }
    }
}

fn validate_positive_length(label: &str, value: f64) -> PenelopeResult<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(PenelopeError::input_validation(
            "INPUT.GEOMETRY_LENGTH",
            format!("{label} must be positive, got {value} m"),
        ))
    }
}

/// Angular acceptance of a delimited photon detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngularWindow {
    pub elevation_rad: (f64, f64),
    pub azimuth_rad: (f64, f64),
}

impl AngularWindow {
    pub fn new(elevation_rad: (f64, f64), azimuth_rad: (f64, f64)) -> Self {
        Self {
            elevation_rad,
            azimuth_rad,
        }
    }

    pub fn elevation_deg(&self) -> (f64, f64) {
        (rad_to_deg(self.elevation_rad.0), rad_to_deg(self.elevation_rad.1))
    }

    pub fn azimuth_deg(&self) -> (f64, f64) {
        (rad_to_deg(self.azimuth_rad.0), rad_to_deg(self.azimuth_rad.1))
    }

    pub fn validate(&self) -> PenelopeResult<()> {
        let (elevation_low, elevation_high) = self.elevation_rad;
        let (azimuth_low, azimuth_high) = self.azimuth_rad;
        let elevation_ok = (-FRAC_PI_2..=FRAC_PI_2).contains(&elevation_low)
            && (-FRAC_PI_2..=FRAC_PI_2).contains(&elevation_high)
            && elevation_low <= elevation_high;
        let azimuth_ok = (0.0..=2.0 * PI).contains(&azimuth_low)
            && (0.0..=2.0 * PI).contains(&azimuth_high)
            && azimuth_low <= azimuth_high;

        if elevation_ok && azimuth_ok {
            Ok(())
        } else {
            Err(PenelopeError::input_validation(
                "INPUT.DETECTOR_WINDOW",
                format!(
                    "invalid angular window: elevation {:?} rad, azimuth {:?} rad",
                    self.elevation_rad, self.azimuth_rad
                ),
            ))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Detector {
    PhotonSpectrum {
        window: AngularWindow,
        channels: usize,
        #[serde(rename = "limits_eV")]
        limits_ev: (f64, f64),
    },
    PhotonIntensity {
        window: AngularWindow,
    },
    PhotonDepth {
        window: AngularWindow,
        channels: usize,
        #[serde(default)]
        transitions: Vec<Transition>,
    },
    ElectronFraction,
    Time,
    ShowersStatistics,
    BackscatteredElectronEnergy {
        channels: usize,
        #[serde(rename = "limits_eV")]
        limits_ev: (f64, f64),
    },
    TransmittedElectronEnergy {
        channels: usize,
        #[serde(rename = "limits_eV")]
        limits_ev: (f64, f64),
    },
    Trajectory {
        #[serde(default = "default_secondary")]
        secondary: bool,
    },
}

fn default_secondary() -> bool {
    true
}

impl Detector {
    pub fn photon_spectrum(window: AngularWindow, channels: usize, limits_ev: (f64, f64)) -> Self {
        Self::PhotonSpectrum {
            window,
            channels,
            limits_ev,
        }
    }

    pub fn photon_intensity(window: AngularWindow) -> Self {
        Self::PhotonIntensity { window }
    }

    pub fn photon_depth(window: AngularWindow, channels: usize) -> Self {
        Self::PhotonDepth {
            window,
            channels,
            transitions: Vec::new(),
        }
    }

    /// Angular window of the delimited photon detectors.
    pub const fn window(&self) -> Option<&AngularWindow> {
        match self {
            Self::PhotonSpectrum { window, .. }
            | Self::PhotonIntensity { window }
            | Self::PhotonDepth { window, .. } => Some(window),
            _ => None,
        }
    }

    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::PhotonSpectrum { .. } => "photon_spectrum",
            Self::PhotonIntensity { .. } => "photon_intensity",
            Self::PhotonDepth { .. } => "photon_depth",
            Self::ElectronFraction => "electron_fraction",
            Self::Time => "time",
            Self::ShowersStatistics => "showers_statistics",
            Self::BackscatteredElectronEnergy { .. } => "backscattered_electron_energy",
            Self::TransmittedElectronEnergy { .. } => "transmitted_electron_energy",
            Self::Trajectory { .. } => "trajectory",
        }
    }

    pub fn validate(&self) -> PenelopeResult<()> {
        if let Some(window) = self.window() {
            window.validate()?;
        }

        match self {
            Self::PhotonSpectrum {
                channels,
                limits_ev,
                ..
            }
            | Self::BackscatteredElectronEnergy {
                channels,
                limits_ev,
            }
            | Self::TransmittedElectronEnergy {
                channels,
                limits_ev,
            } => {
                validate_channels(*channels)?;
                if !(limits_ev.0 >= 0.0 && limits_ev.0 < limits_ev.1) {
                    return Err(PenelopeError::input_validation(
                        "INPUT.DETECTOR_LIMITS",
                        format!(
                            "energy limits ({}, {}) eV must be increasing and >= 0.0",
                            limits_ev.0, limits_ev.1
                        ),
                    ));
                }
                Ok(())
            }
            Self::PhotonDepth {
                channels,
                transitions,
                ..
            } => {
                validate_channels(*channels)?;
                transitions.iter().try_for_each(validate_transition)
            }
            _ => Ok(()),
        }
    }
}

fn validate_channels(channels: usize) -> PenelopeResult<()> {
    if channels == 0 {
        return Err(PenelopeError::input_validation(
            "INPUT.DETECTOR_CHANNELS",
            "number of channels must be at least 1",
        ));
    }
    Ok(())
}

pub(crate) fn validate_transition(transition: &Transition) -> PenelopeResult<()> {
    match Transition::new(transition.z, transition.src, transition.dest) {
        Some(_) => Ok(()),
        None => Err(PenelopeError::input_validation(
            "INPUT.TRANSITION",
            format!(
                "transition Z={} {}-{} is not a valid x-ray transition",
                transition.z, transition.dest, transition.src
            ),
        )),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorEntry {
    pub key: String,
    pub detector: Detector,
}

/// Detectors keyed by name, iterated in insertion order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DetectorSet {
    entries: Vec<DetectorEntry>,
}

impl DetectorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the detector stored under `key`. A replaced
    /// detector keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, detector: Detector) {
        let key = key.into();
        if let Some(entry) = self.entries.iter_mut().find(|entry| entry.key == key) {
            entry.detector = detector;
        } else {
            self.entries.push(DetectorEntry { key, detector });
        }
    }

    pub fn with(mut self, key: impl Into<String>, detector: Detector) -> Self {
        self.insert(key, detector);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Detector> {
        self.entries
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| &entry.detector)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Detector)> {
        self.entries
            .iter()
            .map(|entry| (entry.key.as_str(), &entry.detector))
    }

    pub fn delimited(&self) -> impl Iterator<Item = (&str, &AngularWindow)> {
        self.iter()
            .filter_map(|(key, detector)| detector.window().map(|window| (key, window)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn validate(&self) -> PenelopeResult<()> {
        for (position, entry) in self.entries.iter().enumerate() {
            if entry.key.trim().is_empty() {
                return Err(PenelopeError::input_validation(
                    "INPUT.DETECTOR_KEY",
                    "detector keys must not be empty",
                ));
            }
            if self.entries[..position]
                .iter()
                .any(|previous| previous.key == entry.key)
            {
                return Err(PenelopeError::input_validation(
                    "INPUT.DETECTOR_KEY",
                    format!("detector key '{}' is defined more than once", entry.key),
                ));
            }
            entry.detector.validate()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Limit {
    Time {
        time_s: f64,
    },
    Showers {
        showers: u64,
    },
    Uncertainty {
        transition: Transition,
        detector_key: String,
        uncertainty: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Options {
    pub name: String,
    pub beam: Beam,
    pub geometry: Geometry,
    #[serde(default)]
    pub detectors: DetectorSet,
    #[serde(default)]
    pub limits: Vec<Limit>,
}

impl Options {
    pub fn new(name: impl Into<String>, beam: Beam, geometry: Geometry) -> Self {
        Self {
            name: name.into(),
            beam,
            geometry,
            detectors: DetectorSet::new(),
            limits: Vec::new(),
        }
    }

    pub fn time_limit_s(&self) -> Option<f64> {
        self.limits.iter().find_map(|limit| match limit {
            Limit::Time { time_s } => Some(*time_s),
            _ => None,
        })
    }

    pub fn showers_limit(&self) -> Option<u64> {
        self.limits.iter().find_map(|limit| match limit {
            Limit::Showers { showers } => Some(*showers),
            _ => None,
        })
    }

    pub fn uncertainty_limit(&self) -> Option<(&Transition, &str, f64)> {
        self.limits.iter().find_map(|limit| match limit {
            Limit::Uncertainty {
                transition,
                detector_key,
                uncertainty,
            } => Some((transition, detector_key.as_str(), *uncertainty)),
            _ => None,
        })
    }

    pub fn validate(&self) -> PenelopeResult<()> {
        if self.name.trim().is_empty() {
            return Err(PenelopeError::input_validation(
                "INPUT.OPTIONS_NAME",
                "options name must not be empty",
            ));
        }
        self.beam.validate()?;
        self.geometry.validate()?;
        self.detectors.validate()?;

        for limit in &self.limits {
            match limit {
                Limit::Time { time_s } if !(*time_s > 0.0) => {
                    return Err(PenelopeError::input_validation(
                        "INPUT.LIMIT_TIME",
                        format!("time limit must be positive, got {time_s} s"),
                    ));
                }
                Limit::Showers { showers } if *showers == 0 => {
                    return Err(PenelopeError::input_validation(
                        "INPUT.LIMIT_SHOWERS",
                        "showers limit must be at least 1",
                    ));
                }
                Limit::Uncertainty {
                    transition,
                    uncertainty,
                    ..
                } => {
                    validate_transition(transition)?;
                    if !(*uncertainty > 0.0 && *uncertainty <= 1.0) {
                        return Err(PenelopeError::input_validation(
                            "INPUT.LIMIT_UNCERTAINTY",
                            format!("uncertainty must be in ]0.0, 1.0], got {uncertainty}"),
                        ));
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{
        AngularWindow, Beam, Collision, Detector, DetectorSet, Geometry, GeometryKind,
        InteractionForcing, Layer, Material, Options, Particle,
    };

    fn copper() -> Material {
        Material::new("Cu", [(29, 1.0)], 8960.0)
    }

    #[test]
    fn window_angles_convert_to_degrees() {
        let window = AngularWindow::new(
            (std::f64::consts::FRAC_PI_6, std::f64::consts::FRAC_PI_2),
            (0.0, std::f64::consts::PI),
        );
        let (elevation_low, elevation_high) = window.elevation_deg();
        assert!((elevation_low - 30.0).abs() < 1.0e-12);
        assert!((elevation_high - 90.0).abs() < 1.0e-12);
        let (azimuth_low, azimuth_high) = window.azimuth_deg();
        assert_eq!(azimuth_low, 0.0);
        assert!((azimuth_high - 180.0).abs() < 1.0e-12);
    }

    #[test]
    fn forcing_icol_codes_follow_penepma_tables() {
        assert_eq!(Collision::HardBremsstrahlungEmission.icol(Particle::Electron), Some(4));
        assert_eq!(Collision::Annihilation.icol(Particle::Positron), Some(6));
        assert_eq!(Collision::Annihilation.icol(Particle::Electron), None);
        assert_eq!(Collision::PhotoelectricAbsorption.icol(Particle::Photon), Some(3));
        assert_eq!(Collision::Delta.icol(Particle::Photon), Some(7));
        assert_eq!(Collision::HardElastic.icol(Particle::Photon), None);
    }

    #[test]
    fn trajectory_codes_map_unknown_to_no_collision() {
        assert_eq!(
            Collision::from_trajectory_icol(Particle::Electron, 1),
            Collision::SoftEvent
        );
        assert_eq!(
            Collision::from_trajectory_icol(Particle::Photon, 1),
            Collision::CoherentRayleighScattering
        );
        assert_eq!(
            Collision::from_trajectory_icol(Particle::Electron, 6),
            Collision::NoCollision
        );
        assert_eq!(
            Collision::from_trajectory_icol(Particle::Positron, 42),
            Collision::NoCollision
        );
    }

    #[test]
    fn forcing_validation_rejects_zero_forcer_and_bad_weights() {
        let zero = InteractionForcing::new(Particle::Electron, Collision::HardInelastic)
            .with_forcer(0.0);
        assert_eq!(
            zero.validate().expect_err("zero forcer should fail").placeholder(),
            "INPUT.FORCING_FORCER"
        );

        let weight = InteractionForcing::new(Particle::Electron, Collision::HardInelastic)
            .with_weight(0.1, 1.5);
        assert_eq!(
            weight.validate().expect_err("weight should fail").placeholder(),
            "INPUT.FORCING_WEIGHT"
        );

        let unsupported = InteractionForcing::new(Particle::Photon, Collision::HardElastic);
        assert_eq!(
            unsupported
                .validate()
                .expect_err("unsupported pair should fail")
                .placeholder(),
            "INPUT.FORCING_COLLISION"
        );
    }

    #[test]
    fn material_validation_checks_elastic_scattering() {
        let mut material = copper();
        assert!(material.validate().is_ok());
        material.elastic_scattering = (0.1, 0.3);
        assert_eq!(
            material
                .validate()
                .expect_err("C2 out of range")
                .placeholder(),
            "INPUT.MATERIAL_ELASTIC_SCATTERING"
        );
        assert!(Material::vacuum().validate().is_ok());
    }

    #[test]
    fn geometry_materials_are_distinct_and_skip_vacuum() {
        let geometry = Geometry::new(GeometryKind::HorizontalLayers {
            layers: vec![
                Layer::new(copper(), 1.0e-6),
                Layer::new(Material::vacuum(), 1.0e-6),
                Layer::new(copper(), 2.0e-6),
            ],
            substrate: Some(Material::new("Fe", [(26, 1.0)], 7874.0)),
        });

        let names: Vec<&str> = geometry
            .materials()
            .iter()
            .map(|material| material.name.as_str())
            .collect();
        assert_eq!(names, vec!["Cu", "Fe"]);
        assert_eq!(geometry.title(), "horizontallayers");
    }

    #[test]
    fn detector_set_keeps_insertion_order_and_rejects_duplicates() {
        let window = AngularWindow::new((0.6, 0.7), (0.0, 6.28));
        let mut detectors = DetectorSet::new()
            .with("xray", Detector::photon_intensity(window))
            .with("fraction", Detector::ElectronFraction);
        detectors.insert("xray", Detector::photon_spectrum(window, 100, (0.0, 1.0e4)));

        let keys: Vec<&str> = detectors.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["xray", "fraction"]);
        assert_eq!(detectors.delimited().count(), 1);
        assert!(detectors.validate().is_ok());

        let json = r#"[
            {"key": "a", "detector": {"type": "time"}},
            {"key": "a", "detector": {"type": "electron_fraction"}}
        ]"#;
        let duplicated: DetectorSet = serde_json::from_str(json).expect("detectors should parse");
        assert_eq!(
            duplicated
                .validate()
                .expect_err("duplicate keys should fail")
                .placeholder(),
            "INPUT.DETECTOR_KEY"
        );
    }

    #[test]
    fn options_document_deserializes_with_defaults() {
        let json = r#"{
            "name": "cu20kev",
            "beam": {"energy_eV": 20000.0},
            "geometry": {"kind": {"substrate": {"material": {
                "name": "Cu", "composition": {"29": 1.0}, "density_kg_m3": 8960.0
            }}}},
            "detectors": [
                {"key": "spectrum", "detector": {
                    "type": "photon_spectrum",
                    "window": {"elevation_rad": [0.6, 0.7], "azimuth_rad": [0.0, 6.28]},
                    "channels": 1000,
                    "limits_eV": [0.0, 20000.0]
                }}
            ],
            "limits": [{"type": "showers", "showers": 1000}]
        }"#;

        let options: Options = serde_json::from_str(json).expect("options should parse");
        assert!(options.validate().is_ok());
        assert_eq!(options.beam.particle, Particle::Electron);
        assert_eq!(options.beam.origin_m, [0.0, 0.0, 1.0]);
        assert_eq!(options.showers_limit(), Some(1000));
        assert_eq!(options.time_limit_s(), None);

        let materials = options.geometry.materials();
        assert_eq!(materials[0].absorption_energy_ev.electron, 50.0);
        assert_eq!(materials[0].maximum_step_length_m, 1.0e20);
    }

    #[test]
    fn beam_energy_must_be_positive() {
        let options = Options::new("bad", Beam::new(0.0), Geometry::substrate(copper()));
        assert_eq!(
            options
                .validate()
                .expect_err("zero energy should fail")
                .placeholder(),
            "INPUT.BEAM_ENERGY"
        );
    }
}
