use crate::domain::{
    DetectorResult, ExportResult, ImportResult, Options, PenelopeError, SimulationProgram,
};
use crate::geometry::{GeometryInfo, MaterialFile, export_geometry};
use crate::material::MaterialFileWriter;
use super::sections::ExportReport;
use std::path::Path;

pub trait ProgramExporter {
    fn program(&self) -> SimulationProgram;

    /// Checks every option the input file depends on. Runs before any file
    /// is written.
    fn validate(&self, options: &Options) -> ExportResult<()>;

    fn material_writer(&self) -> &dyn MaterialFileWriter;

    fn export_input_file(
        &self,
        options: &Options,
        output_dir: &Path,
        geometry: &GeometryInfo,
        material_files: &[MaterialFile],
    ) -> ExportResult<ExportReport>;

    fn export(&self, options: &Options, output_dir: &Path) -> ExportResult<ExportReport> {
        self.validate(options)?;
        let (geometry, material_files) = export_geometry(&options.geometry, output_dir)?;
        for material_file in &material_files {
            self.material_writer().write_material_file(material_file)?;
        }
        self.export_input_file(options, output_dir, &geometry, &material_files)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportFailure {
    pub key: String,
    pub error: PenelopeError,
}

/// Results keyed by detector, in detector insertion order. Each detector is
/// imported on its own; failures do not prevent the other imports.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImportedResults {
    pub results: Vec<(String, DetectorResult)>,
    pub failures: Vec<ImportFailure>,
}

impl ImportedResults {
    pub fn push(&mut self, key: &str, outcome: ImportResult<DetectorResult>) {
        match outcome {
            Ok(result) => self.results.push((key.to_string(), result)),
            Err(error) => {
                tracing::warn!(detector = key, error = %error, "detector import failed");
                self.failures.push(ImportFailure {
                    key: key.to_string(),
                    error,
                });
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&DetectorResult> {
        self.results
            .iter()
            .find(|(candidate, _)| candidate == key)
            .map(|(_, result)| result)
    }

    pub fn failure(&self, key: &str) -> Option<&PenelopeError> {
        self.failures
            .iter()
            .find(|failure| failure.key == key)
            .map(|failure| &failure.error)
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Returns the results, or the first failure.
    pub fn into_results(self) -> ImportResult<Vec<(String, DetectorResult)>> {
        match self.failures.into_iter().next() {
            Some(failure) => Err(failure.error),
            None => Ok(self.results),
        }
    }
}

pub trait ProgramImporter {
    fn program(&self) -> SimulationProgram;

    fn import(&self, options: &Options, results_dir: &Path) -> ImportResult<ImportedResults>;
}

#[cfg(test)]
mod tests {
    use super::ImportedResults;
    use crate::domain::{DetectorResult, PenelopeError, PenelopeErrorCategory, ShowersStatisticsResult};

    #[test]
    fn failures_are_kept_alongside_results() {
        let mut imported = ImportedResults::default();
        imported.push(
            "showers",
            Ok(DetectorResult::ShowersStatistics(ShowersStatisticsResult {
                showers: 10,
            })),
        );
        imported.push(
            "spectrum",
            Err(PenelopeError::importer("IMPORT.MISSING_FILE", "missing")),
        );

        assert!(imported.get("showers").is_some());
        assert!(imported.get("spectrum").is_none());
        assert!(!imported.is_complete());
        assert_eq!(
            imported
                .failure("spectrum")
                .map(PenelopeError::placeholder),
            Some("IMPORT.MISSING_FILE")
        );

        let error = imported
            .into_results()
            .expect_err("first failure should surface");
        assert_eq!(error.category(), PenelopeErrorCategory::ImporterError);
    }
}
