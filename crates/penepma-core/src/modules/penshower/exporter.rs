use crate::common::config::ProgramSettings;
use crate::domain::{
    Detector, ExportResult, Limit, Options, PenelopeError, PenelopeResult, SimulationProgram,
};
use crate::format::format_exponent_c;
use crate::format::keyword;
use crate::geometry::{GeometryInfo, MaterialFile};
use crate::material::{MaterialFileWriter, PendbaseMaterialTool};
use crate::modules::sections::{
    ExportReport, InputFileBuilder, append_electron_beam, append_geometry, append_material_data,
    append_title,
};
use crate::modules::traits::ProgramExporter;
use std::path::Path;

/// Writes PENSHOWER `.in` files for trajectory simulations.
pub struct PenshowerExporter {
    settings: ProgramSettings,
    materials: Box<dyn MaterialFileWriter>,
}

impl PenshowerExporter {
    pub fn new(settings: ProgramSettings) -> Self {
        let materials = Box::new(PendbaseMaterialTool::new(settings.pendbase_dir.clone()));
        Self {
            settings,
            materials,
        }
    }

    pub fn with_material_writer(mut self, materials: impl MaterialFileWriter + 'static) -> Self {
        self.materials = Box::new(materials);
        self
    }

    pub fn settings(&self) -> &ProgramSettings {
        &self.settings
    }
}

/// Secondary-tracking flag of the single trajectory detector.
fn trajectory_secondary(options: &Options) -> PenelopeResult<bool> {
    let mut secondary = None;
    for (key, detector) in options.detectors.iter() {
        match detector {
            Detector::Trajectory { secondary: flag } if secondary.is_none() => {
                secondary = Some(*flag);
            }
            Detector::Trajectory { .. } => {
                return Err(PenelopeError::input_validation(
                    "INPUT.TRAJECTORY_DETECTOR",
                    "PENSHOWER can only have one trajectory detector",
                ));
            }
            _ => {
                return Err(PenelopeError::input_validation(
                    "INPUT.UNSUPPORTED_DETECTOR",
                    format!(
                        "PENSHOWER does not support {} detector '{key}'",
                        detector.kind_name()
                    ),
                ));
            }
        }
    }

    secondary.ok_or_else(|| {
        PenelopeError::input_validation(
            "INPUT.TRAJECTORY_DETECTOR",
            "PENSHOWER requires a trajectory detector",
        )
    })
}

fn showers_limit(options: &Options) -> PenelopeResult<u64> {
    if let Some(limit) = options
        .limits
        .iter()
        .find(|limit| !matches!(limit, Limit::Showers { .. }))
    {
        return Err(PenelopeError::input_validation(
            "INPUT.UNSUPPORTED_LIMIT",
            format!("PENSHOWER only supports a showers limit, got {limit:?}"),
        ));
    }

    options.showers_limit().ok_or_else(|| {
        PenelopeError::input_validation(
            "INPUT.SHOWERS_LIMIT",
            "PENSHOWER requires a showers limit",
        )
    })
}

impl ProgramExporter for PenshowerExporter {
    fn program(&self) -> SimulationProgram {
        SimulationProgram::Penshower
    }

    fn validate(&self, options: &Options) -> ExportResult<()> {
        options.validate()?;
        trajectory_secondary(options)?;
        showers_limit(options)?;
        Ok(())
    }

    fn material_writer(&self) -> &dyn MaterialFileWriter {
        self.materials.as_ref()
    }

    fn export_input_file(
        &self,
        options: &Options,
        output_dir: &Path,
        geometry: &GeometryInfo,
        material_files: &[MaterialFile],
    ) -> ExportResult<ExportReport> {
        let secondary = trajectory_secondary(options)?;
        let showers = showers_limit(options)?;

        let mut builder = InputFileBuilder::new();
        append_title(&mut builder, options)?;
        append_electron_beam(&mut builder, options, true)?;
        append_material_data(&mut builder, material_files)?;
        append_geometry(&mut builder, geometry)?;

        builder.comment(keyword::JOB_PROPERTIES)?;
        builder.keyword(keyword::TRJSC, &[i64::from(secondary).into()])?;
        builder.keyword(keyword::NTRJM, &[format_exponent_c(showers as f64).into()])?;
        builder.skip()?;
        builder.keyword(keyword::END, &[])?;

        let input_path = output_dir.join(format!("{}.in", options.name));
        let warnings = builder.write(&input_path)?;

        Ok(ExportReport {
            input_path,
            geometry_path: geometry.geo_path.clone(),
            material_files: material_files.to_vec(),
            warnings,
        })
    }
}
