pub mod errors;
pub mod options;
pub mod results;
pub mod transition;

pub use errors::{
    ExitPlaceholder, ExportResult, ImportResult, PenelopeError, PenelopeErrorCategory,
    PenelopeResult,
};
pub use options::{
    AngularWindow, Beam, Collision, Detector, DetectorEntry, DetectorSet, Geometry, GeometryKind,
    InteractionForcing, Layer, Limit, Material, Options, Particle,
};
pub use results::{
    BackscatteredElectronEnergyResult, DetectorResult, ElectronFractionResult, HistogramBin,
    Interaction, Measured, PhotonDepthResult, PhotonIntensityResult, PhotonKey, PhotonKind,
    PhotonSpectrumResult, ShowersStatisticsResult, TimeResult, Trajectory, TrajectoryResult,
    TransmittedElectronEnergyResult,
};
pub use transition::{Subshell, Transition, atomic_number_for_symbol, element_symbol};

use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimulationProgram {
    Penepma,
    Penshower,
}

impl SimulationProgram {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Penepma => "PENEPMA",
            Self::Penshower => "PENSHOWER",
        }
    }

    /// Name of the results log written by the program (`penepma-res.dat`).
    pub const fn summary_log_name(self) -> &'static str {
        match self {
            Self::Penepma => "penepma-res.dat",
            Self::Penshower => "penshower-res.dat",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "penepma" => Some(Self::Penepma),
            "penshower" => Some(Self::Penshower),
            _ => None,
        }
    }
}

impl Display for SimulationProgram {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::SimulationProgram;

    #[test]
    fn program_names_resolve_case_insensitively() {
        assert_eq!(
            SimulationProgram::from_name("PenEpma"),
            Some(SimulationProgram::Penepma)
        );
        assert_eq!(
            SimulationProgram::from_name(" penshower "),
            Some(SimulationProgram::Penshower)
        );
        assert_eq!(SimulationProgram::from_name("casino"), None);
        assert_eq!(SimulationProgram::Penepma.to_string(), "PENEPMA");
        assert_eq!(
            SimulationProgram::Penepma.summary_log_name(),
            "penepma-res.dat"
        );
    }
}
