use super::CliError;
use anyhow::Context;
use penepma_core::common::config::{ProgramSettings, load_program_settings};
use penepma_core::domain::{DetectorResult, Options, PenelopeError, SimulationProgram};
use penepma_core::modules::ImportedResults;
use penepma_core::transitions::JsonTransitionCatalog;
use serde::Serialize;
use std::fs;
use std::path::Path;

pub(super) fn parse_program(name: &str) -> Result<SimulationProgram, CliError> {
    SimulationProgram::from_name(name).ok_or_else(|| {
        CliError::Usage(format!(
            "unknown program '{name}'; expected 'penepma' or 'penshower'"
        ))
    })
}

pub(super) fn load_options(path: &Path) -> Result<Options, CliError> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read options '{}'", path.display()))?;
    let options: Options = serde_json::from_str(&source).map_err(|source| {
        PenelopeError::input_validation(
            "INPUT.OPTIONS_PARSE",
            format!("failed to parse options '{}': {source}", path.display()),
        )
    })?;
    tracing::debug!(
        name = %options.name,
        detectors = options.detectors.len(),
        "loaded options"
    );
    Ok(options)
}

pub(super) fn load_settings(path: &Path) -> Result<ProgramSettings, CliError> {
    let settings = load_program_settings(path).map_err(PenelopeError::from)?;
    settings.validate()?;
    Ok(settings)
}

pub(super) fn load_catalog(path: &Path) -> Result<JsonTransitionCatalog, CliError> {
    let catalog = JsonTransitionCatalog::load(path).map_err(PenelopeError::from)?;
    tracing::debug!(transitions = catalog.len(), "loaded transition catalog");
    Ok(catalog)
}

pub(super) fn ensure_directory(path: &Path) -> Result<(), CliError> {
    fs::create_dir_all(path)
        .with_context(|| format!("failed to create directory '{}'", path.display()))?;
    Ok(())
}

#[derive(Debug, Serialize)]
pub(super) struct ImportReport<'a> {
    program: &'static str,
    results: Vec<ReportResult<'a>>,
    failures: Vec<ReportFailure<'a>>,
}

#[derive(Debug, Serialize)]
struct ReportResult<'a> {
    key: &'a str,
    result: &'a DetectorResult,
}

#[derive(Debug, Serialize)]
struct ReportFailure<'a> {
    key: &'a str,
    category: &'static str,
    placeholder: &'static str,
    message: &'a str,
}

impl<'a> ImportReport<'a> {
    pub(super) fn new(program: SimulationProgram, imported: &'a ImportedResults) -> Self {
        Self {
            program: program.as_str(),
            results: imported
                .results
                .iter()
                .map(|(key, result)| ReportResult { key, result })
                .collect(),
            failures: imported
                .failures
                .iter()
                .map(|failure| ReportFailure {
                    key: &failure.key,
                    category: failure.error.category().rust_category(),
                    placeholder: failure.error.placeholder(),
                    message: failure.error.message(),
                })
                .collect(),
        }
    }

    pub(super) fn to_json(&self) -> Result<String, CliError> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize import report")?;
        Ok(json)
    }
}

pub(super) fn write_report(path: &Path, json: &str) -> Result<(), CliError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        ensure_directory(parent)?;
    }
    fs::write(path, json)
        .with_context(|| format!("failed to write import report '{}'", path.display()))?;
    tracing::info!(path = %path.display(), "wrote import report");
    Ok(())
}
