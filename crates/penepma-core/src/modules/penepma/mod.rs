mod exporter;
mod importer;
pub(crate) mod parser;
mod summary;

pub use exporter::PenepmaExporter;
pub use importer::PenepmaImporter;
pub use summary::{SummaryLog, SummaryLogError};

pub(crate) const SPECTRUM_FILE_PREFIX: &str = "pe-spect-";
pub(crate) const INTENSITY_FILE_PREFIX: &str = "pe-intens-";
pub(crate) const GENERATED_INTENSITY_FILE: &str = "pe-gen-ph.dat";
pub(crate) const DEPTH_FILE_PATTERN: &str = "pe-map-*-depth.dat";
pub(crate) const BACKSCATTERED_ENERGY_FILE: &str = "pe-energy-el-up.dat";
pub(crate) const TRANSMITTED_ENERGY_FILE: &str = "pe-energy-el-down.dat";

/// `pe-spect-01.dat` style name for a one-based detector index.
pub(crate) fn indexed_file_name(prefix: &str, file_index: usize) -> String {
    format!("{prefix}{file_index:02}.dat")
}

#[cfg(test)]
mod tests {
    use super::{SPECTRUM_FILE_PREFIX, indexed_file_name};

    #[test]
    fn indexed_files_are_zero_padded() {
        assert_eq!(indexed_file_name(SPECTRUM_FILE_PREFIX, 1), "pe-spect-01.dat");
        assert_eq!(indexed_file_name(SPECTRUM_FILE_PREFIX, 25), "pe-spect-25.dat");
    }
}
