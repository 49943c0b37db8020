use super::CliError;
use super::helpers::*;
use penepma_core::domain::SimulationProgram;
use penepma_core::geometry::export_geometry;
use penepma_core::modules::penepma::{PenepmaExporter, PenepmaImporter};
use penepma_core::modules::penshower::{PenshowerExporter, PenshowerImporter};
use penepma_core::modules::{ProgramExporter, ProgramImporter};
use std::path::PathBuf;

#[derive(clap::Args)]
pub(super) struct ExportArgs {
    /// Options document (JSON)
    #[arg(long)]
    options: PathBuf,

    /// Program settings document (JSON) naming the pendbase directory
    #[arg(long)]
    settings: PathBuf,

    /// Directory receiving the `.geo` and `.in` files
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Target program: penepma or penshower
    #[arg(long, default_value = "penepma")]
    program: String,

    /// Transition catalog (JSON) used to select depth-distribution lines
    #[arg(long)]
    catalog: Option<PathBuf>,
}

#[derive(clap::Args)]
pub(super) struct ImportArgs {
    /// Options document (JSON) used for the simulation
    #[arg(long)]
    options: PathBuf,

    /// Directory holding the simulation outputs
    #[arg(long)]
    results_dir: PathBuf,

    /// JSON report output path (printed to stdout when omitted)
    #[arg(long)]
    report: Option<PathBuf>,

    /// Program that produced the outputs: penepma or penshower
    #[arg(long, default_value = "penepma")]
    program: String,
}

#[derive(clap::Args)]
pub(super) struct GeometryArgs {
    /// Options document (JSON)
    #[arg(long)]
    options: PathBuf,

    /// Directory receiving the `.geo` file
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
}

pub(super) fn run_export_command(args: ExportArgs) -> Result<i32, CliError> {
    let program = parse_program(&args.program)?;
    let options = load_options(&args.options)?;
    let settings = load_settings(&args.settings)?;

    let exporter: Box<dyn ProgramExporter> = match program {
        SimulationProgram::Penepma => {
            let mut exporter = PenepmaExporter::new(settings);
            if let Some(path) = &args.catalog {
                exporter = exporter.with_catalog(load_catalog(path)?);
            }
            Box::new(exporter)
        }
        SimulationProgram::Penshower => {
            if args.catalog.is_some() {
                tracing::warn!("transition catalog is ignored for PENSHOWER");
            }
            Box::new(PenshowerExporter::new(settings))
        }
    };

    // Nothing is created on disk for invalid options.
    exporter.validate(&options)?;
    ensure_directory(&args.output_dir)?;
    let report = exporter.export(&options, &args.output_dir)?;

    for warning in &report.warnings {
        eprintln!("{warning}");
    }
    println!("Geometry file: {}", report.geometry_path.display());
    for material_file in &report.material_files {
        println!(
            "Material file: {} ({})",
            material_file.path.display(),
            material_file.material.name
        );
    }
    println!("Input file: {}", report.input_path.display());
    Ok(0)
}

pub(super) fn run_import_command(args: ImportArgs) -> Result<i32, CliError> {
    let program = parse_program(&args.program)?;
    let options = load_options(&args.options)?;

    let importer: Box<dyn ProgramImporter> = match program {
        SimulationProgram::Penepma => Box::new(PenepmaImporter::new()),
        SimulationProgram::Penshower => Box::new(PenshowerImporter::new()),
    };
    let imported = importer.import(&options, &args.results_dir)?;

    let json = ImportReport::new(program, &imported).to_json()?;
    match &args.report {
        Some(path) => {
            write_report(path, &json)?;
            println!("JSON report: {}", path.display());
        }
        None => println!("{json}"),
    }

    for failure in &imported.failures {
        eprintln!("{}: {}", failure.key, failure.error.diagnostic_line());
    }
    Ok(imported
        .failures
        .first()
        .map_or(0, |failure| failure.error.exit_code()))
}

pub(super) fn run_geometry_command(args: GeometryArgs) -> Result<i32, CliError> {
    let options = load_options(&args.options)?;
    options.geometry.validate()?;
    ensure_directory(&args.output_dir)?;

    let (geometry, material_files) = export_geometry(&options.geometry, &args.output_dir)?;
    println!("Geometry file: {}", geometry.geo_path.display());
    for material_file in &material_files {
        println!(
            "Material {}: {}",
            material_file.index, material_file.material.name
        );
    }
    Ok(0)
}
