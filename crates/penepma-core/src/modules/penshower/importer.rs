use super::TRAJECTORY_FILE;
use crate::common::units::cm_to_m;
use crate::domain::{
    Collision, Detector, DetectorResult, ImportResult, Interaction, Options, Particle,
    PenelopeError, SimulationProgram, Trajectory, TrajectoryResult,
};
use crate::modules::penepma::parser::read_data_file;
use crate::modules::traits::{ImportedResults, ProgramImporter};
use std::path::Path;

const CLOSE_MARKER: char = '0';
const OPEN_MARKER: char = '1';
const MARKER_WIDTH: usize = 80;

/// Reads `pe-trajectories.dat` back into a trajectory result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PenshowerImporter;

impl PenshowerImporter {
    pub fn new() -> Self {
        Self
    }
}

impl ProgramImporter for PenshowerImporter {
    fn program(&self) -> SimulationProgram {
        SimulationProgram::Penshower
    }

    fn import(&self, options: &Options, results_dir: &Path) -> ImportResult<ImportedResults> {
        if !results_dir.is_dir() {
            return Err(PenelopeError::importer(
                "IMPORT.RESULTS_DIRECTORY",
                format!("results directory '{}' does not exist", results_dir.display()),
            ));
        }

        let mut imported = ImportedResults::default();
        for (key, detector) in options.detectors.iter() {
            let outcome = match detector {
                Detector::Trajectory { .. } => {
                    let path = results_dir.join(TRAJECTORY_FILE);
                    read_data_file(&path)
                        .and_then(|source| parse_trajectories(&path, &source))
                        .map(DetectorResult::Trajectory)
                }
                _ => Err(PenelopeError::importer(
                    "IMPORT.UNSUPPORTED_DETECTOR",
                    format!("PENSHOWER does not produce {} results", detector.kind_name()),
                )),
            };
            imported.push(key, outcome);
        }

        tracing::info!(
            results = imported.results.len(),
            failures = imported.failures.len(),
            "imported PENSHOWER results"
        );
        Ok(imported)
    }
}

fn is_marker(line: &str, marker: char) -> bool {
    line.len() == MARKER_WIDTH && line.chars().all(|c| c == marker)
}

/// Trajectory being read, between two close markers.
#[derive(Debug, Default)]
struct PendingTrajectory {
    index: i64,
    primary: Option<bool>,
    particle: Option<Particle>,
    collision: Option<i64>,
    exit_state: Option<i64>,
    interactions: Vec<Interaction>,
}

impl PendingTrajectory {
    fn finish(self, path: &Path) -> ImportResult<Trajectory> {
        let missing = |header: &str| {
            PenelopeError::importer(
                "IMPORT.TRAJECTORY_HEADER",
                format!(
                    "'{}': trajectory {} has no {header} header",
                    path.display(),
                    self.index
                ),
            )
        };

        let particle = self.particle.ok_or_else(|| missing("KPAR"))?;
        let primary = self.primary.ok_or_else(|| missing("PARENT"))?;
        let collision = self.collision.ok_or_else(|| missing("ICOL"))?;
        let exit_state = self.exit_state.ok_or_else(|| missing("EXIT"))?;

        Ok(Trajectory {
            index: self.index,
            primary,
            particle,
            collision: Collision::from_trajectory_icol(particle, collision),
            exit_state,
            interactions: self.interactions,
        })
    }
}

fn header_value(path: &Path, line_number: usize, line: &str) -> ImportResult<i64> {
    line.split_whitespace()
        .nth(1)
        .and_then(|value| value.parse::<i64>().ok())
        .ok_or_else(|| {
            PenelopeError::importer(
                "IMPORT.TRAJECTORY_HEADER",
                format!(
                    "'{}' line {line_number}: invalid header '{line}'",
                    path.display()
                ),
            )
        })
}

fn parse_interaction(
    path: &Path,
    line_number: usize,
    line: &str,
    particle: Option<Particle>,
) -> ImportResult<Interaction> {
    let row_error = |detail: String| {
        PenelopeError::importer(
            "IMPORT.TRAJECTORY_ROW",
            format!("'{}' line {line_number}: {detail}", path.display()),
        )
    };

    let particle = particle.ok_or_else(|| row_error("interaction before KPAR header".to_string()))?;
    let values: Vec<&str> = line.split_whitespace().collect();
    if values.len() < 7 {
        return Err(row_error(format!(
            "expected 7 columns, found {}",
            values.len()
        )));
    }

    let real = |column: usize| {
        values[column]
            .parse::<f64>()
            .map_err(|_| row_error(format!("'{}' is not a number", values[column])))
    };
    let icol = values[6]
        .parse::<i64>()
        .map_err(|_| row_error(format!("'{}' is not a collision code", values[6])))?;

    Ok(Interaction {
        x_m: cm_to_m(real(0)?),
        y_m: cm_to_m(real(1)?),
        z_m: cm_to_m(real(2)?),
        energy_ev: real(3)?,
        collision: Collision::from_trajectory_icol(particle, icol),
    })
}

/// Parses the content of `pe-trajectories.dat`. Trajectories keep the order
/// of their first appearance; a repeated index replaces the earlier one.
pub fn parse_trajectories(path: &Path, source: &str) -> ImportResult<TrajectoryResult> {
    let mut trajectories: Vec<Trajectory> = Vec::new();
    let mut pending = PendingTrajectory::default();

    for (number, line) in source.lines().enumerate() {
        let line_number = number + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || is_marker(line, OPEN_MARKER) {
            continue;
        }

        if is_marker(line, CLOSE_MARKER) {
            let finished = std::mem::take(&mut pending);
            if finished.index <= 0 {
                continue;
            }
            let trajectory = finished.finish(path)?;
            match trajectories
                .iter_mut()
                .find(|existing| existing.index == trajectory.index)
            {
                Some(existing) => *existing = trajectory,
                None => trajectories.push(trajectory),
            }
        } else if line.starts_with("TRAJ") {
            pending.index = header_value(path, line_number, line)?;
        } else if line.starts_with("KPAR") {
            let code = header_value(path, line_number, line)?;
            let particle = u8::try_from(code)
                .ok()
                .and_then(Particle::from_kpar)
                .ok_or_else(|| {
                    PenelopeError::importer(
                        "IMPORT.TRAJECTORY_HEADER",
                        format!(
                            "'{}' line {line_number}: unknown particle code {code}",
                            path.display()
                        ),
                    )
                })?;
            pending.particle = Some(particle);
        } else if line.starts_with("PARENT") {
            pending.primary = Some(header_value(path, line_number, line)? == 0);
        } else if line.starts_with("ICOL") {
            pending.collision = Some(header_value(path, line_number, line)?);
        } else if line.starts_with("EXIT") {
            pending.exit_state = Some(header_value(path, line_number, line)?);
        } else {
            let interaction = parse_interaction(path, line_number, line, pending.particle)?;
            pending.interactions.push(interaction);
        }
    }

    tracing::debug!(trajectories = trajectories.len(), "parsed trajectories");
    Ok(TrajectoryResult { trajectories })
}

#[cfg(test)]
mod tests {
    use super::{PenshowerImporter, parse_trajectories};
    use crate::domain::{
        Beam, Collision, Detector, DetectorResult, Geometry, Material, Options, Particle,
        PenelopeErrorCategory,
    };
    use crate::modules::ProgramImporter;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn separator(marker: char) -> String {
        std::iter::repeat_n(marker, 80).collect()
    }

    fn trajectory_block(index: i64, kpar: u8, parent: i64, rows: &[&str]) -> String {
        let mut block = format!(
            "{}\nTRAJ {index}\nKPAR {kpar}\nPARENT {parent}\nICOL 2\nEXIT 1\n",
            separator('1')
        );
        for row in rows {
            block.push_str(row);
            block.push('\n');
        }
        block.push_str(&separator('0'));
        block.push('\n');
        block
    }

    #[test]
    fn trajectories_are_read_with_coordinates_in_meters() {
        let source = format!(
            "# PENSHOWER trajectories\n\n{}{}",
            trajectory_block(
                1,
                1,
                0,
                &[
                    " 0.0E+00  0.0E+00  1.0E+00  1.5E+04  0  0  0",
                    " 1.0E-04 -2.0E-04 -3.0E-04  1.4E+04  0  0  3",
                ],
            ),
            trajectory_block(2, 2, 1, &[" 1.0E-03 0.0 0.0 8.0E+03 0 0 3"]),
        );

        let result = parse_trajectories(Path::new("pe-trajectories.dat"), &source)
            .expect("trajectories should parse");
        assert_eq!(result.trajectories.len(), 2);

        let electron = &result.trajectories[0];
        assert_eq!(electron.index, 1);
        assert!(electron.primary);
        assert_eq!(electron.particle, Particle::Electron);
        assert_eq!(electron.collision, Collision::HardElastic);
        assert_eq!(electron.exit_state, 1);
        assert_eq!(electron.interactions.len(), 2);
        assert!((electron.interactions[0].z_m - 1.0e-2).abs() <= 1.0e-15);
        assert!((electron.interactions[1].y_m + 2.0e-6).abs() <= 1.0e-18);
        assert_eq!(electron.interactions[1].energy_ev, 1.4e4);
        assert_eq!(electron.interactions[0].collision, Collision::NoCollision);
        assert_eq!(electron.interactions[1].collision, Collision::HardInelastic);

        let photon = &result.trajectories[1];
        assert!(!photon.primary);
        assert_eq!(photon.particle, Particle::Photon);
        assert_eq!(result.primary().count(), 1);
    }

    #[test]
    fn repeated_index_replaces_the_earlier_trajectory() {
        let source = format!(
            "{}{}{}",
            trajectory_block(1, 1, 0, &["0 0 0 1.0E+04 0 0 0"]),
            trajectory_block(2, 1, 1, &["0 0 0 9.0E+03 0 0 0"]),
            trajectory_block(1, 3, 0, &["0 0 0 5.0E+03 0 0 0", "0 0 0 4.0E+03 0 0 0"]),
        );

        let result = parse_trajectories(Path::new("pe-trajectories.dat"), &source)
            .expect("trajectories should parse");
        let indices: Vec<i64> = result.trajectories.iter().map(|t| t.index).collect();
        assert_eq!(indices, vec![1, 2]);
        assert_eq!(result.trajectories[0].particle, Particle::Positron);
        assert_eq!(result.trajectories[0].interactions.len(), 2);
    }

    #[test]
    fn close_marker_without_index_is_skipped() {
        let source = format!("{}\n{}", separator('0'), trajectory_block(3, 1, 0, &[]));
        let result = parse_trajectories(Path::new("pe-trajectories.dat"), &source)
            .expect("trajectories should parse");
        assert_eq!(result.trajectories.len(), 1);
        assert_eq!(result.trajectories[0].index, 3);
    }

    #[test]
    fn interaction_before_particle_is_an_importer_error() {
        let source = "TRAJ 1\n0 0 0 1.0E+04 0 0 0\n";
        let error = parse_trajectories(Path::new("pe-trajectories.dat"), source)
            .expect_err("row precedes KPAR");
        assert_eq!(error.category(), PenelopeErrorCategory::ImporterError);
        assert_eq!(error.placeholder(), "IMPORT.TRAJECTORY_ROW");
    }

    #[test]
    fn import_reads_trajectory_file_from_results_directory() {
        let temp = TempDir::new().expect("tempdir should be created");
        fs::write(
            temp.path().join("pe-trajectories.dat"),
            trajectory_block(1, 1, 0, &["0 0 0 1.0E+04 0 0 0"]),
        )
        .expect("trajectories should be written");

        let copper = Material::new("Cu", [(29, 1.0)], 8960.0);
        let mut options = Options::new("shower", Beam::new(10_000.0), Geometry::substrate(copper));
        options
            .detectors
            .insert("trajectories", Detector::Trajectory { secondary: true });
        options.detectors.insert("time", Detector::Time);

        let imported = PenshowerImporter::new()
            .import(&options, temp.path())
            .expect("import should run");
        assert!(matches!(
            imported.get("trajectories"),
            Some(DetectorResult::Trajectory(result)) if result.trajectories.len() == 1
        ));
        assert_eq!(
            imported.failure("time").map(|error| error.placeholder()),
            Some("IMPORT.UNSUPPORTED_DETECTOR")
        );
    }
}
