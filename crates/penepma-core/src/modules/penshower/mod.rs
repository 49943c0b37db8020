mod exporter;
mod importer;

pub use exporter::PenshowerExporter;
pub use importer::{PenshowerImporter, parse_trajectories};

pub(crate) const TRAJECTORY_FILE: &str = "pe-trajectories.dat";
