//! Creation of PENELOPE material (`.mat`) files.
//!
//! The pendbase `material` tool is interactive: it reads its answers from
//! stdin and must run from the pendbase directory so that it finds the
//! `pdfiles` database. The produced file is then moved next to the geometry.

use crate::common::units::kg_m3_to_g_cm3;
use crate::domain::{ExportResult, Material, PenelopeError};
use crate::geometry::MaterialFile;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

const MATERIAL_TOOL: &str = "material";
const MAX_MATERIAL_NAME: usize = 60;

/// Creates the `.mat` file of one exported material.
pub trait MaterialFileWriter {
    fn write_material_file(&self, material_file: &MaterialFile) -> ExportResult<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendbaseMaterialTool {
    pendbase_dir: PathBuf,
}

impl PendbaseMaterialTool {
    pub fn new(pendbase_dir: impl Into<PathBuf>) -> Self {
        Self {
            pendbase_dir: pendbase_dir.into(),
        }
    }

    pub fn tool_path(&self) -> PathBuf {
        self.pendbase_dir
            .join(format!("{MATERIAL_TOOL}{}", std::env::consts::EXE_SUFFIX))
    }
}

impl MaterialFileWriter for PendbaseMaterialTool {
    fn write_material_file(&self, material_file: &MaterialFile) -> ExportResult<()> {
        let tool = self.tool_path();
        if !tool.is_file() {
            return Err(PenelopeError::io_system(
                "IO.MATERIAL_TOOL_MISSING",
                format!("material tool was not found at '{}'", tool.display()),
            ));
        }

        let file_name = material_file.file_name();
        let answers = material_tool_answers(&material_file.material, &file_name);

        let mut child = Command::new(&tool)
            .current_dir(&self.pendbase_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| tool_exec_error(&tool, source))?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(answers.as_bytes())
                .map_err(|source| tool_exec_error(&tool, source))?;
        }
        let output = child
            .wait_with_output()
            .map_err(|source| tool_exec_error(&tool, source))?;

        if !output.status.success() {
            let status_text = output.status.code().map_or_else(
                || "terminated by signal".to_string(),
                |code| format!("exit code {code}"),
            );
            return Err(PenelopeError::io_system(
                "IO.MATERIAL_TOOL_FAILED",
                format!(
                    "material tool failed for '{}' with {status_text}: {}",
                    material_file.material.name,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }

        let produced = self.pendbase_dir.join(&file_name);
        move_file(&produced, &material_file.path)?;
        tracing::info!(
            material = %material_file.material.name,
            path = %material_file.path.display(),
            "wrote material file"
        );
        Ok(())
    }
}

/// Answers fed to the material tool: composition by weight fraction, the
/// density in g/cm3 and the default excitation energy and oscillators.
pub fn material_tool_answers(material: &Material, file_name: &str) -> String {
    let name: String = material.name.chars().take(MAX_MATERIAL_NAME).collect();
    let mut answers = vec![
        "1".to_string(),
        name,
        material.composition.len().to_string(),
        "2".to_string(),
    ];
    answers.extend(
        material
            .composition
            .iter()
            .map(|(z, fraction)| format!("{z} {fraction}")),
    );
    answers.push("2".to_string());
    answers.push(kg_m3_to_g_cm3(material.density_kg_m3).to_string());
    answers.push("2".to_string());
    answers.push(file_name.to_string());

    let mut script = answers.join("\n");
    script.push('\n');
    script
}

fn tool_exec_error(tool: &Path, source: std::io::Error) -> PenelopeError {
    PenelopeError::io_system(
        "IO.MATERIAL_TOOL_EXEC",
        format!("failed to execute material tool '{}': {source}", tool.display()),
    )
}

fn move_file(from: &Path, to: &Path) -> ExportResult<()> {
    if from == to {
        return Ok(());
    }
    let moved = fs::rename(from, to).or_else(|_| fs::copy(from, to).and_then(|_| fs::remove_file(from)));
    moved.map_err(|error| {
        PenelopeError::io_system(
            "IO.MATERIAL_WRITE",
            format!(
                "failed to move material file '{}' to '{}': {error}",
                from.display(),
                to.display()
            ),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::{MaterialFileWriter, PendbaseMaterialTool, material_tool_answers};
    use crate::domain::Material;
    use crate::geometry::MaterialFile;
    use tempfile::TempDir;

    fn brass_file(dir: &std::path::Path) -> MaterialFile {
        MaterialFile {
            index: 1,
            material: Material::new("Brass", [(29, 0.7), (30, 0.3)], 8500.0),
            path: dir.join("mat1.mat"),
        }
    }

    #[test]
    fn answers_list_composition_density_and_file_name() {
        let temp = TempDir::new().expect("tempdir should be created");
        let answers = material_tool_answers(&brass_file(temp.path()).material, "mat1.mat");
        let lines: Vec<&str> = answers.lines().collect();

        assert_eq!(
            lines,
            ["1", "Brass", "2", "2", "29 0.7", "30 0.3", "2", "8.5", "2", "mat1.mat"]
        );
    }

    #[test]
    fn missing_tool_is_an_io_error() {
        let temp = TempDir::new().expect("tempdir should be created");
        let writer = PendbaseMaterialTool::new(temp.path().join("pendbase"));
        let error = writer
            .write_material_file(&brass_file(temp.path()))
            .expect_err("tool does not exist");

        assert_eq!(error.placeholder(), "IO.MATERIAL_TOOL_MISSING");
        assert_eq!(error.exit_code(), 5);
    }

    #[cfg(unix)]
    #[test]
    fn tool_output_is_moved_to_the_material_path() {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().expect("tempdir should be created");
        let pendbase = temp.path().join("pendbase");
        fs::create_dir(&pendbase).expect("pendbase should be created");
        let tool = pendbase.join("material");
        fs::write(&tool, "#!/bin/sh\nname=$(tail -n 1)\necho \"PENELOPE material\" > \"$name\"\n")
            .expect("tool should be written");
        fs::set_permissions(&tool, fs::Permissions::from_mode(0o755))
            .expect("tool should be executable");

        let output_dir = temp.path().join("sim");
        fs::create_dir(&output_dir).expect("output dir should be created");
        let material_file = brass_file(&output_dir);
        PendbaseMaterialTool::new(&pendbase)
            .write_material_file(&material_file)
            .expect("material file should be written");

        let content = fs::read_to_string(&material_file.path).expect("mat file should exist");
        assert_eq!(content.trim(), "PENELOPE material");
        assert!(!pendbase.join("mat1.mat").exists());
    }
}
