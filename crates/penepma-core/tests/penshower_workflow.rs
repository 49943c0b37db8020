use penepma_core::common::config::ProgramSettings;
use penepma_core::domain::{
    Beam, Collision, Detector, DetectorResult, ExportResult, Geometry, GeometryKind, Layer,
    Limit, Material, Options, Particle, PenelopeError, PenelopeErrorCategory,
};
use penepma_core::geometry::MaterialFile;
use penepma_core::material::MaterialFileWriter;
use penepma_core::modules::penshower::{PenshowerExporter, PenshowerImporter};
use penepma_core::modules::{ProgramExporter, ProgramImporter};
use std::fs;
use tempfile::TempDir;

struct StubMaterialWriter;

impl MaterialFileWriter for StubMaterialWriter {
    fn write_material_file(&self, material_file: &MaterialFile) -> ExportResult<()> {
        fs::write(&material_file.path, &material_file.material.name)
            .map_err(|error| PenelopeError::io_system("IO.MATERIAL_WRITE", error.to_string()))
    }
}

fn exporter(temp: &TempDir) -> PenshowerExporter {
    PenshowerExporter::new(ProgramSettings::new(temp.path())).with_material_writer(StubMaterialWriter)
}

fn trajectory_options() -> Options {
    let copper = Material::new("Cu", [(29, 1.0)], 8960.0);
    let mut options = Options::new("shower", Beam::new(15_000.0), Geometry::substrate(copper));
    options
        .detectors
        .insert("trajectories", Detector::Trajectory { secondary: true });
    options.limits.push(Limit::Showers { showers: 100 });
    options
}

#[test]
fn penshower_input_tracks_secondaries_for_requested_showers() {
    let temp = TempDir::new().expect("tempdir should be created");
    let exporter = exporter(&temp);

    let report = exporter
        .export(&trajectory_options(), temp.path())
        .expect("export should succeed");
    let content = fs::read_to_string(&report.input_path).expect("input file should exist");
    let keywords: Vec<&str> = content
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .filter(|word| word.chars().all(|c| c.is_ascii_uppercase()))
        .collect();

    assert_eq!(
        keywords,
        vec![
            "TITLE", "SKPAR", "SENERG", "SPOSIT", "SDIREC", "SAPERT", "SDIAM", "MFNAME",
            "MSIMPA", "GEOMFN", "DSMAX", "TRJSC", "NTRJM", "END",
        ]
    );
    assert!(content.contains("TRJSC  1 "));
    assert!(content.contains("NTRJM  1.000000e+02 "));
}

#[test]
fn time_limit_is_rejected_before_writing() {
    let temp = TempDir::new().expect("tempdir should be created");
    let exporter = exporter(&temp);
    let mut options = trajectory_options();
    options.limits.push(Limit::Time { time_s: 60.0 });

    let error = exporter
        .export(&options, temp.path())
        .expect_err("PENSHOWER has no time limit");
    assert_eq!(error.category(), PenelopeErrorCategory::InputValidationError);
    assert_eq!(error.placeholder(), "INPUT.UNSUPPORTED_LIMIT");
    assert!(!temp.path().join("shower.in").exists());
}

#[test]
fn layered_sample_lists_every_material() {
    let temp = TempDir::new().expect("tempdir should be created");
    let exporter = exporter(&temp);
    let mut options = trajectory_options();
    options.geometry = Geometry::new(GeometryKind::HorizontalLayers {
        layers: vec![Layer::new(Material::new("C", [(6, 1.0)], 2200.0), 20.0e-9)],
        substrate: Some(Material::new("Si", [(14, 1.0)], 2330.0)),
    });

    let report = exporter
        .export(&options, temp.path())
        .expect("export should succeed");
    assert_eq!(report.material_files.len(), 2);

    let content = fs::read_to_string(&report.input_path).expect("input file should exist");
    assert_eq!(content.lines().filter(|line| line.starts_with("MFNAME")).count(), 2);
    assert_eq!(
        fs::read_to_string(temp.path().join("mat2.mat")).expect("material file should exist"),
        "Si"
    );
}

#[test]
fn trajectories_import_from_results_directory() {
    let temp = TempDir::new().expect("tempdir should be created");
    let close = "0".repeat(80);
    let open = "1".repeat(80);
    fs::write(
        temp.path().join("pe-trajectories.dat"),
        format!(
            "# trajectories\n{open}\nTRAJ 1\nKPAR 2\nPARENT 0\nICOL 3\nEXIT 2\n\
             0.0 0.0 0.0 1.5E+04 0 0 0\n 2.0E-04 0.0 -1.0E-04 1.5E+04 0 0 2\n{close}\n"
        ),
    )
    .expect("trajectory file should be written");

    let imported = PenshowerImporter::new()
        .import(&trajectory_options(), temp.path())
        .expect("import should run");
    let result = match imported.get("trajectories") {
        Some(DetectorResult::Trajectory(result)) => result,
        other => panic!("unexpected trajectory result: {other:?}"),
    };

    let trajectory = &result.trajectories[0];
    assert_eq!(trajectory.particle, Particle::Photon);
    assert_eq!(trajectory.collision, Collision::PhotoelectricAbsorption);
    assert_eq!(trajectory.exit_state, 2);
    assert!((trajectory.interactions[1].x_m - 2.0e-6).abs() <= 1.0e-18);
    assert_eq!(
        trajectory.interactions[1].collision,
        Collision::IncoherentComptonScattering
    );
}

#[test]
fn missing_trajectory_file_names_the_path() {
    let temp = TempDir::new().expect("tempdir should be created");
    let imported = PenshowerImporter::new()
        .import(&trajectory_options(), temp.path())
        .expect("import should run");

    let error = imported
        .failure("trajectories")
        .expect("trajectory import should fail");
    assert_eq!(error.placeholder(), "IMPORT.MISSING_FILE");
    assert!(error.message().contains("pe-trajectories.dat"));
}
