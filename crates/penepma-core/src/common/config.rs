//! Program settings shared by the PENEPMA and PENSHOWER exporters.
//!
//! Settings are read from a JSON document and passed explicitly to the
//! exporters.

use super::constants::DEFAULT_DUMP_PERIOD_S;
use crate::domain::{PenelopeError, PenelopeResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

fn default_dump_period() -> f64 {
    DEFAULT_DUMP_PERIOD_S
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramSettings {
    /// Directory holding the PENELOPE database and material tools.
    pub pendbase_dir: PathBuf,
    #[serde(default = "default_dump_period")]
    pub dump_period_s: f64,
    #[serde(default)]
    pub exe: Option<PathBuf>,
}

impl ProgramSettings {
    pub fn new(pendbase_dir: impl Into<PathBuf>) -> Self {
        Self {
            pendbase_dir: pendbase_dir.into(),
            dump_period_s: DEFAULT_DUMP_PERIOD_S,
            exe: None,
        }
    }

    pub fn with_dump_period(mut self, dump_period_s: f64) -> Self {
        self.dump_period_s = dump_period_s;
        self
    }

    pub fn validate(&self) -> PenelopeResult<()> {
        if !self.pendbase_dir.is_dir() {
            return Err(PenelopeError::input_validation(
                "INPUT.SETTINGS_PENDBASE",
                format!(
                    "pendbase directory '{}' does not exist",
                    self.pendbase_dir.display()
                ),
            ));
        }

        if let Some(exe) = &self.exe
            && !exe.is_file()
        {
            return Err(PenelopeError::input_validation(
                "INPUT.SETTINGS_EXE",
                format!("executable '{}' does not exist", exe.display()),
            ));
        }

        if !(self.dump_period_s > 0.0 && self.dump_period_s.is_finite()) {
            return Err(PenelopeError::input_validation(
                "INPUT.SETTINGS_DUMP_PERIOD",
                format!(
                    "dump period must be positive, got {} s",
                    self.dump_period_s
                ),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read program settings '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse program settings '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl From<SettingsError> for PenelopeError {
    fn from(error: SettingsError) -> Self {
        match &error {
            SettingsError::Read { .. } => {
                PenelopeError::io_system("IO.SETTINGS_READ", error.to_string())
            }
            SettingsError::Parse { .. } => {
                PenelopeError::input_validation("INPUT.SETTINGS_PARSE", error.to_string())
            }
        }
    }
}

pub fn load_program_settings(
    settings_path: impl AsRef<Path>,
) -> Result<ProgramSettings, SettingsError> {
    let settings_path = settings_path.as_ref();
    let source = fs::read_to_string(settings_path).map_err(|source| SettingsError::Read {
        path: settings_path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&source).map_err(|source| SettingsError::Parse {
        path: settings_path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::{ProgramSettings, SettingsError, load_program_settings};
    use crate::domain::PenelopeErrorCategory;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn settings_document_applies_default_dump_period() {
        let temp = TempDir::new().expect("tempdir should be created");
        let settings_path = temp.path().join("settings.json");
        let pendbase = temp.path().join("pendbase");
        fs::create_dir(&pendbase).expect("pendbase should be created");
        fs::write(
            &settings_path,
            format!(
                "{{\"pendbase_dir\": {}}}",
                serde_json::to_string(&pendbase).expect("path should serialize")
            ),
        )
        .expect("settings should be written");

        let settings = load_program_settings(&settings_path).expect("settings should load");
        assert_eq!(settings.dump_period_s, 60.0);
        assert_eq!(settings.exe, None);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn missing_pendbase_fails_validation() {
        let temp = TempDir::new().expect("tempdir should be created");
        let settings = ProgramSettings::new(temp.path().join("missing"));
        let error = settings.validate().expect_err("missing pendbase should fail");
        assert_eq!(error.placeholder(), "INPUT.SETTINGS_PENDBASE");
    }

    #[test]
    fn unreadable_settings_map_to_io_errors() {
        let temp = TempDir::new().expect("tempdir should be created");
        let error = load_program_settings(temp.path().join("absent.json"))
            .expect_err("absent settings should fail");
        assert!(matches!(error, SettingsError::Read { .. }));

        let mapped: crate::domain::PenelopeError = error.into();
        assert_eq!(mapped.category(), PenelopeErrorCategory::IoSystemError);
    }
}
