//! Input-file sections shared by the PENELOPE main programs.

use crate::common::units::{m_to_cm, rad_to_deg};
use crate::domain::{ExportResult, Options, PenelopeError, PenelopeResult};
use crate::format::keyword::{self, Comment, Keyword, KeywordValue};
use crate::format::{LINE_SEPARATOR, write_lines};
use crate::geometry::{GeometryInfo, MaterialFile};
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Non-fatal condition raised while exporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExporterWarning {
    pub code: &'static str,
    pub message: String,
}

impl Display for ExporterWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "WARNING: [{}] {}", self.code, self.message)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportReport {
    pub input_path: PathBuf,
    pub geometry_path: PathBuf,
    pub material_files: Vec<MaterialFile>,
    pub warnings: Vec<ExporterWarning>,
}

#[derive(Debug, Default)]
pub struct InputFileBuilder {
    lines: Vec<String>,
    warnings: Vec<ExporterWarning>,
}

impl InputFileBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keyword(&mut self, keyword: Keyword, values: &[KeywordValue]) -> PenelopeResult<()> {
        self.lines.push(keyword.line(values)?);
        Ok(())
    }

    pub fn comment(&mut self, comment: Comment) -> PenelopeResult<()> {
        self.lines.push(comment.line()?);
        Ok(())
    }

    /// Informational comment; text past the column limit is cut.
    pub fn note(&mut self, text: &str) {
        self.lines.push(Comment::truncated_text_line(text));
    }

    pub fn skip(&mut self) -> PenelopeResult<()> {
        self.comment(keyword::SKIP)
    }

    pub fn warn(&mut self, code: &'static str, message: impl Into<String>) {
        let warning = ExporterWarning {
            code,
            message: message.into(),
        };
        tracing::warn!(code = warning.code, "{}", warning.message);
        self.warnings.push(warning);
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn warnings(&self) -> &[ExporterWarning] {
        &self.warnings
    }

    /// Writes the lines to `path` and hands back the collected warnings.
    pub fn write(self, path: &Path) -> ExportResult<Vec<ExporterWarning>> {
        write_lines(path, &self.lines, LINE_SEPARATOR).map_err(|error| {
            PenelopeError::io_system(
                "IO.INPUT_WRITE",
                format!("failed to write '{}': {error}", path.display()),
            )
        })?;
        tracing::info!(path = %path.display(), lines = self.lines.len(), "wrote input file");
        Ok(self.warnings)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub(super) fn append_title(builder: &mut InputFileBuilder, options: &Options) -> PenelopeResult<()> {
    builder.keyword(keyword::TITLE, &[options.name.as_str().into()])?;
    builder.skip()
}

/// Beam section; `with_particle` prefixes it with the `SKPAR` particle code.
pub(super) fn append_electron_beam(
    builder: &mut InputFileBuilder,
    options: &Options,
    with_particle: bool,
) -> PenelopeResult<()> {
    let beam = &options.beam;
    builder.comment(keyword::ELECTRON_BEAM)?;

    if with_particle {
        builder.keyword(keyword::SKPAR, &[beam.particle.kpar().into()])?;
    }

    builder.keyword(keyword::SENERG, &[beam.energy_ev.into()])?;

    let origin: Vec<KeywordValue> = beam
        .origin_m
        .iter()
        .map(|coordinate| m_to_cm(*coordinate).into())
        .collect();
    builder.keyword(keyword::SPOSIT, &origin)?;

    builder.keyword(
        keyword::SDIREC,
        &[
            rad_to_deg(beam.direction_polar_rad).into(),
            rad_to_deg(beam.direction_azimuth_rad).into(),
        ],
    )?;
    builder.keyword(keyword::SAPERT, &[0.0.into()])?;
    builder.keyword(keyword::SDIAM, &[m_to_cm(beam.diameter_m).into()])?;
    builder.skip()
}

pub(super) fn append_material_data(
    builder: &mut InputFileBuilder,
    material_files: &[MaterialFile],
) -> PenelopeResult<()> {
    builder.comment(keyword::MATERIAL_DATA)?;

    for material_file in material_files {
        let material = &material_file.material;
        builder.keyword(keyword::MFNAME, &[material_file.file_name().into()])?;
        builder.keyword(
            keyword::MSIMPA,
            &[
                material.absorption_energy_ev.electron.into(),
                material.absorption_energy_ev.photon.into(),
                material.absorption_energy_ev.positron.into(),
                material.elastic_scattering.0.into(),
                material.elastic_scattering.1.into(),
                material.cutoff_energy_inelastic_ev.into(),
                material.cutoff_energy_bremsstrahlung_ev.into(),
            ],
        )?;
    }

    builder.skip()
}

pub(super) fn append_geometry(
    builder: &mut InputFileBuilder,
    geometry: &GeometryInfo,
) -> PenelopeResult<()> {
    builder.comment(keyword::GEOMETRY)?;
    builder.keyword(keyword::GEOMFN, &[file_name(&geometry.geo_path).into()])?;

    for body in &geometry.bodies {
        if body.material.is_vacuum() {
            continue;
        }
        builder.keyword(
            keyword::DSMAX,
            &[
                (body.index + 1).into(),
                m_to_cm(body.material.effective_maximum_step_length_m()).into(),
            ],
        )?;
    }

    builder.skip()
}
