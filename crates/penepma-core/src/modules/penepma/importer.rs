use super::parser::{
    IntensityRow, depth_map_paths, read_depth_map, read_histogram, read_intensity_rows,
    require_file,
};
use super::summary::SummaryLog;
use super::{
    BACKSCATTERED_ENERGY_FILE, DEPTH_FILE_PATTERN, GENERATED_INTENSITY_FILE,
    INTENSITY_FILE_PREFIX, SPECTRUM_FILE_PREFIX, TRANSMITTED_ENERGY_FILE, indexed_file_name,
};
use crate::domain::{
    BackscatteredElectronEnergyResult, Detector, DetectorResult, ElectronFractionResult,
    HistogramBin, ImportResult, Measured, Options, PenelopeError, PhotonDepthResult,
    PhotonIntensityResult, PhotonKey, PhotonKind, PhotonSpectrumResult, ShowersStatisticsResult,
    SimulationProgram, TimeResult, TransmittedElectronEnergyResult,
};
use crate::indexing::DetectorIndexMap;
use crate::modules::traits::{ImportedResults, ProgramImporter};
use std::cell::OnceCell;
use std::path::Path;

/// Reads PENEPMA output files back into detector results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PenepmaImporter;

impl PenepmaImporter {
    pub fn new() -> Self {
        Self
    }
}

impl ProgramImporter for PenepmaImporter {
    fn program(&self) -> SimulationProgram {
        SimulationProgram::Penepma
    }

    fn import(&self, options: &Options, results_dir: &Path) -> ImportResult<ImportedResults> {
        if !results_dir.is_dir() {
            return Err(PenelopeError::importer(
                "IMPORT.RESULTS_DIRECTORY",
                format!("results directory '{}' does not exist", results_dir.display()),
            ));
        }

        let context = ImportContext {
            results_dir,
            index_map: DetectorIndexMap::resolve(&options.detectors),
            summary: OnceCell::new(),
        };

        let mut imported = ImportedResults::default();
        for (key, detector) in options.detectors.iter() {
            imported.push(key, context.import_detector(key, detector));
        }

        tracing::info!(
            results = imported.results.len(),
            failures = imported.failures.len(),
            "imported PENEPMA results"
        );
        Ok(imported)
    }
}

/// State shared by the detectors of one import.
struct ImportContext<'a> {
    results_dir: &'a Path,
    index_map: DetectorIndexMap,
    summary: OnceCell<ImportResult<SummaryLog>>,
}

impl ImportContext<'_> {
    fn import_detector(&self, key: &str, detector: &Detector) -> ImportResult<DetectorResult> {
        match detector {
            Detector::PhotonSpectrum { .. } => {
                self.photon_spectrum(key).map(DetectorResult::PhotonSpectrum)
            }
            Detector::PhotonIntensity { .. } => {
                self.photon_intensity(key).map(DetectorResult::PhotonIntensity)
            }
            Detector::PhotonDepth { .. } => {
                self.photon_depth(key).map(DetectorResult::PhotonDepth)
            }
            Detector::ElectronFraction => {
                let log = self.summary()?;
                Ok(DetectorResult::ElectronFraction(ElectronFractionResult {
                    absorbed: log.absorption_fraction,
                    backscattered: log.upbound_fraction,
                    transmitted: log.downbound_fraction,
                }))
            }
            Detector::Time => {
                let log = self.summary()?;
                Ok(DetectorResult::Time(TimeResult {
                    simulation_time_s: log.simulation_time_s,
                    simulation_speed_s: Measured::exact(log.seconds_per_shower()),
                }))
            }
            Detector::ShowersStatistics => {
                let log = self.summary()?;
                Ok(DetectorResult::ShowersStatistics(ShowersStatisticsResult {
                    showers: log.simulated_showers.round() as u64,
                }))
            }
            Detector::BackscatteredElectronEnergy { .. } => {
                let data = read_histogram(&self.results_dir.join(BACKSCATTERED_ENERGY_FILE))?;
                Ok(DetectorResult::BackscatteredElectronEnergy(
                    BackscatteredElectronEnergyResult { data },
                ))
            }
            Detector::TransmittedElectronEnergy { .. } => {
                let data = read_histogram(&self.results_dir.join(TRANSMITTED_ENERGY_FILE))?;
                Ok(DetectorResult::TransmittedElectronEnergy(
                    TransmittedElectronEnergyResult { data },
                ))
            }
            Detector::Trajectory { .. } => Err(PenelopeError::importer(
                "IMPORT.UNSUPPORTED_DETECTOR",
                format!("PENEPMA does not produce {} results", detector.kind_name()),
            )),
        }
    }

    fn summary(&self) -> ImportResult<SummaryLog> {
        self.summary
            .get_or_init(|| {
                let path = self
                    .results_dir
                    .join(SimulationProgram::Penepma.summary_log_name());
                SummaryLog::read(&path).map_err(PenelopeError::from)
            })
            .clone()
    }

    fn file_index(&self, key: &str) -> ImportResult<usize> {
        self.index_map.file_index_of(key).ok_or_else(|| {
            PenelopeError::internal(
                "IMPORT.DETECTOR_INDEX",
                format!("detector '{key}' has no PENEPMA detector index"),
            )
        })
    }

    fn photon_spectrum(&self, key: &str) -> ImportResult<PhotonSpectrumResult> {
        let file_index = self.file_index(key)?;
        let path = self
            .results_dir
            .join(indexed_file_name(SPECTRUM_FILE_PREFIX, file_index));

        let total = read_histogram(&path)?;
        // PENEPMA does not report the background separately.
        let background = total
            .iter()
            .map(|bin| HistogramBin::new(bin.x, 0.0, 0.0))
            .collect();

        Ok(PhotonSpectrumResult { total, background })
    }

    fn photon_intensity(&self, key: &str) -> ImportResult<PhotonIntensityResult> {
        let file_index = self.file_index(key)?;
        let emitted_path = self
            .results_dir
            .join(indexed_file_name(INTENSITY_FILE_PREFIX, file_index));
        let generated_path = self.results_dir.join(GENERATED_INTENSITY_FILE);
        require_file(&emitted_path)?;
        require_file(&generated_path)?;

        let mut result = PhotonIntensityResult::default();
        insert_intensities(&mut result, read_intensity_rows(&generated_path)?, false);
        insert_intensities(&mut result, read_intensity_rows(&emitted_path)?, true);
        Ok(result)
    }

    fn photon_depth(&self, key: &str) -> ImportResult<PhotonDepthResult> {
        let file_index = self.file_index(key)?;
        let mut result = PhotonDepthResult::default();

        for path in depth_map_paths(self.results_dir, DEPTH_FILE_PATTERN)? {
            let map = read_depth_map(&path)?;
            let absorption = match map.detector_index {
                0 => false,
                index if index == file_index => true,
                index => {
                    return Err(PenelopeError::importer(
                        "IMPORT.DEPTH_DETECTOR_INDEX",
                        format!(
                            "'{}' belongs to detector {index}, expected 0 or {file_index}",
                            path.display()
                        ),
                    ));
                }
            };

            result.distributions.insert(
                PhotonKey::new(map.transition, absorption, PhotonKind::Total),
                map.rows,
            );
        }

        Ok(result)
    }
}

fn insert_intensities(result: &mut PhotonIntensityResult, rows: Vec<IntensityRow>, absorption: bool) {
    for row in rows {
        let key = |kind| PhotonKey::new(row.transition, absorption, kind);
        result.insert(key(PhotonKind::CharacteristicFluorescence), row.characteristic);
        result.insert(key(PhotonKind::BremsstrahlungFluorescence), row.bremsstrahlung);
        result.insert(key(PhotonKind::Primary), row.primary);
        result.insert(key(PhotonKind::Total), row.total);
    }
}

#[cfg(test)]
mod tests {
    use super::PenepmaImporter;
    use crate::domain::{
        AngularWindow, Beam, Detector, DetectorResult, Geometry, Material, Options,
        PenelopeErrorCategory, Transition,
    };
    use crate::modules::ProgramImporter;
    use std::fs;
    use tempfile::TempDir;

    fn window() -> AngularWindow {
        AngularWindow::new((0.61, 0.79), (0.0, 6.28))
    }

    fn options() -> Options {
        let copper = Material::new("Cu", [(29, 1.0)], 8960.0);
        Options::new("cu", Beam::new(20_000.0), Geometry::substrate(copper))
    }

    #[test]
    fn intensity_combines_generated_and_emitted_tables() {
        let temp = TempDir::new().expect("tempdir should be created");
        let row = |scale: f64| {
            format!(
                "29 K L3 8.04E+03 {} 1.0E-07 {} 1.0E-08 {} 1.0E-09 0 0 {} 1.0E-06\n",
                1.0 * scale,
                2.0 * scale,
                3.0 * scale,
                6.0 * scale
            )
        };
        fs::write(
            temp.path().join("pe-gen-ph.dat"),
            format!("# generated\n{}29 L3 K 1 1 1 1 1 1 1 1 1 1 1\n", row(10.0)),
        )
        .expect("generated table should be written");
        fs::write(temp.path().join("pe-intens-01.dat"), format!("# emitted\n{}", row(1.0)))
            .expect("emitted table should be written");

        let mut options = options();
        options
            .detectors
            .insert("xray", Detector::photon_intensity(window()));

        let imported = PenepmaImporter
            .import(&options, temp.path())
            .expect("import should run");
        let Some(DetectorResult::PhotonIntensity(result)) = imported.get("xray") else {
            panic!("expected a photon intensity result");
        };

        let ka1 = Transition::from_iupac(29, "K", "L3").expect("valid transition");
        assert_eq!(result.len(), 8);
        assert_eq!(result.intensity(ka1, true, true).map(|m| m.value), Some(6.0));
        assert_eq!(result.intensity(ka1, true, false).map(|m| m.value), Some(1.0));
        assert_eq!(result.intensity(ka1, false, true).map(|m| m.value), Some(60.0));
        assert_eq!(result.intensity(ka1, false, false).map(|m| m.value), Some(10.0));
    }

    #[test]
    fn summary_detectors_share_one_log() {
        let temp = TempDir::new().expect("tempdir should be created");
        fs::write(
            temp.path().join("penepma-res.dat"),
            "  Simulation time .........  1.000000E+02 sec\n\
             \x20 Simulation speed ........  5.000000E+02 showers/sec\n\
             \x20 Simulated primary showers .  5.000049E+04\n\
             \x20 Upbound fraction ........  3.0E-01 +- 1.0E-02\n\
             \x20 Downbound fraction ......  0.0E+00 +- 0.0E+00\n\
             \x20 Absorption fraction .....  7.0E-01 +- 2.0E-02\n",
        )
        .expect("summary should be written");

        let mut options = options();
        options.detectors.insert("fraction", Detector::ElectronFraction);
        options.detectors.insert("time", Detector::Time);
        options.detectors.insert("showers", Detector::ShowersStatistics);

        let imported = PenepmaImporter
            .import(&options, temp.path())
            .expect("import should run");
        assert!(imported.is_complete());

        match imported.get("time") {
            Some(DetectorResult::Time(time)) => {
                assert_eq!(time.simulation_time_s, 100.0);
                assert_eq!(time.simulation_speed_s.value, 1.0 / 500.0);
                assert_eq!(time.simulation_speed_s.uncertainty, 0.0);
            }
            other => panic!("unexpected time result {other:?}"),
        }
        match imported.get("showers") {
            Some(DetectorResult::ShowersStatistics(showers)) => {
                assert_eq!(showers.showers, 50_000);
            }
            other => panic!("unexpected showers result {other:?}"),
        }
        match imported.get("fraction") {
            Some(DetectorResult::ElectronFraction(fraction)) => {
                assert_eq!(fraction.backscattered.value, 0.3);
                assert_eq!(fraction.absorbed.uncertainty, 0.02);
            }
            other => panic!("unexpected fraction result {other:?}"),
        }
    }

    #[test]
    fn depth_map_from_foreign_detector_is_rejected() {
        let temp = TempDir::new().expect("tempdir should be created");
        fs::write(
            temp.path().join("pe-map-01-depth.dat"),
            "#\n# Line : Z = 29, K-L3, detector =  7\n#\n#\n#\n#\n-1.0E-04 1.0 0.1\n",
        )
        .expect("map should be written");

        let mut options = options();
        options
            .detectors
            .insert("prz", Detector::photon_depth(window(), 100));

        let imported = PenepmaImporter
            .import(&options, temp.path())
            .expect("import should run");
        let error = imported.failure("prz").expect("depth import should fail");
        assert_eq!(error.placeholder(), "IMPORT.DEPTH_DETECTOR_INDEX");
    }

    #[test]
    fn trajectory_detectors_are_not_imported() {
        let temp = TempDir::new().expect("tempdir should be created");
        let mut options = options();
        options
            .detectors
            .insert("trajectories", Detector::Trajectory { secondary: false });

        let imported = PenepmaImporter
            .import(&options, temp.path())
            .expect("import should run");
        let error = imported.failure("trajectories").expect("trajectory import should fail");
        assert_eq!(error.category(), PenelopeErrorCategory::ImporterError);
    }

    #[test]
    fn missing_results_directory_is_reported() {
        let temp = TempDir::new().expect("tempdir should be created");
        let error = PenepmaImporter
            .import(&options(), &temp.path().join("missing"))
            .expect_err("directory does not exist");
        assert_eq!(error.placeholder(), "IMPORT.RESULTS_DIRECTORY");
    }
}
