use serde_json::Value;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const OPTIONS: &str = r#"
{
  "name": "cu15",
  "beam": { "energy_eV": 15000.0 },
  "geometry": {
    "kind": {
      "substrate": {
        "material": { "name": "Cu", "composition": { "29": 1.0 }, "density_kg_m3": 8960.0 }
      }
    }
  },
  "detectors": [
    {
      "key": "spectrum",
      "detector": {
        "type": "photon_spectrum",
        "window": { "elevation_rad": [0.6, 0.7], "azimuth_rad": [0.0, 6.0] },
        "channels": 1500,
        "limits_eV": [0.0, 15000.0]
      }
    },
    { "key": "fraction", "detector": { "type": "electron_fraction" } }
  ],
  "limits": [{ "type": "showers", "showers": 1000 }]
}
"#;

const SUMMARY_LOG: &str = "\
  Simulation time .........................  1.000000E+01 sec
  Simulation speed ........................  1.000000E+02 showers/sec
  Simulated primary showers ...............  1.000000E+03
  Upbound fraction ........................  3.000000E-01 +- 1.0E-02
  Downbound fraction ......................  0.000000E+00 +- 0.0E+00
  Absorption fraction .....................  7.000000E-01 +- 1.0E-02
";

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("parent dir should be created");
    }
    fs::write(path, content).expect("file should be written");
}

fn run_penepma_rs(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_penepma-rs"))
        .args(args)
        .output()
        .expect("penepma-rs should run")
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("temp paths are UTF-8")
}

fn write_settings(temp: &TempDir) -> std::path::PathBuf {
    let pendbase = temp.path().join("pendbase");
    fs::create_dir_all(&pendbase).expect("pendbase should be created");
    let settings_path = temp.path().join("settings.json");
    write_file(
        &settings_path,
        &serde_json::json!({ "pendbase_dir": pendbase, "dump_period_s": 30.0 }).to_string(),
    );
    settings_path
}

/// Stand-in for the pendbase material tool: writes the file named by the
/// last answer read from stdin.
#[cfg(unix)]
fn install_material_tool(temp: &TempDir) {
    use std::os::unix::fs::PermissionsExt;

    let tool = temp.path().join("pendbase/material");
    write_file(
        &tool,
        "#!/bin/sh\nname=$(tail -n 1)\necho \"PENELOPE material\" > \"$name\"\n",
    );
    fs::set_permissions(&tool, fs::Permissions::from_mode(0o755))
        .expect("tool should be executable");
}

#[cfg(unix)]
#[test]
fn export_writes_geometry_material_and_input_files_with_warnings() {
    let temp = TempDir::new().expect("tempdir should be created");
    let options_path = temp.path().join("options.json");
    write_file(&options_path, OPTIONS);
    let settings_path = write_settings(&temp);
    install_material_tool(&temp);
    let output_dir = temp.path().join("sim");

    let output = run_penepma_rs(&[
        "export",
        "--options",
        path_str(&options_path),
        "--settings",
        path_str(&settings_path),
        "--output-dir",
        path_str(&output_dir),
    ]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    assert!(output_dir.join("substrate.geo").is_file());
    assert_eq!(
        fs::read_to_string(output_dir.join("mat1.mat"))
            .expect("material file should exist")
            .trim(),
        "PENELOPE material"
    );
    let input = fs::read_to_string(output_dir.join("cu15.in")).expect("input file should exist");
    assert!(input.contains("PDENER 0.0 15000.0 1000 "));
    assert!(input.contains("DUMPP  30.0 "));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("WARNING: [EXPORT.PHOTON_DETECTOR_CHANNELS]"));
}

#[test]
fn export_without_material_tool_is_an_io_error() {
    let temp = TempDir::new().expect("tempdir should be created");
    let options_path = temp.path().join("options.json");
    write_file(&options_path, OPTIONS);
    let settings_path = write_settings(&temp);
    let output_dir = temp.path().join("sim");

    let output = run_penepma_rs(&[
        "export",
        "--options",
        path_str(&options_path),
        "--settings",
        path_str(&settings_path),
        "--output-dir",
        path_str(&output_dir),
    ]);
    assert_eq!(output.status.code(), Some(5));
    assert!(String::from_utf8_lossy(&output.stderr).contains("IO.MATERIAL_TOOL_MISSING"));
    assert!(!output_dir.join("cu15.in").exists());
}

#[test]
fn import_writes_report_and_exits_with_importer_code_on_missing_file() {
    let temp = TempDir::new().expect("tempdir should be created");
    let options_path = temp.path().join("options.json");
    write_file(&options_path, OPTIONS);
    let results_dir = temp.path().join("results");
    write_file(&results_dir.join("penepma-res.dat"), SUMMARY_LOG);
    let report_path = temp.path().join("report/results.json");

    let output = run_penepma_rs(&[
        "import",
        "--options",
        path_str(&options_path),
        "--results-dir",
        path_str(&results_dir),
        "--report",
        path_str(&report_path),
    ]);
    assert_eq!(output.status.code(), Some(4));
    assert!(String::from_utf8_lossy(&output.stderr).contains("pe-spect-01.dat"));

    let report: Value = serde_json::from_str(
        &fs::read_to_string(&report_path).expect("report should be written"),
    )
    .expect("report should be JSON");
    assert_eq!(report["results"][0]["key"], "fraction");
    assert_eq!(report["results"][0]["result"]["type"], "electron_fraction");
    assert_eq!(report["failures"][0]["key"], "spectrum");
    assert_eq!(report["failures"][0]["placeholder"], "IMPORT.MISSING_FILE");
}

#[test]
fn geometry_command_writes_only_the_geo_file() {
    let temp = TempDir::new().expect("tempdir should be created");
    let options_path = temp.path().join("options.json");
    write_file(&options_path, OPTIONS);
    let output_dir = temp.path().join("geo");

    let output = run_penepma_rs(&[
        "geometry",
        "--options",
        path_str(&options_path),
        "--output-dir",
        path_str(&output_dir),
    ]);
    assert!(output.status.success());
    assert!(output_dir.join("substrate.geo").is_file());
    assert!(!output_dir.join("cu15.in").exists());
}

#[test]
fn missing_pendbase_is_an_input_error() {
    let temp = TempDir::new().expect("tempdir should be created");
    let options_path = temp.path().join("options.json");
    write_file(&options_path, OPTIONS);
    let settings_path = temp.path().join("settings.json");
    write_file(
        &settings_path,
        &serde_json::json!({ "pendbase_dir": temp.path().join("missing") }).to_string(),
    );

    let output = run_penepma_rs(&[
        "export",
        "--options",
        path_str(&options_path),
        "--settings",
        path_str(&settings_path),
        "--output-dir",
        path_str(temp.path()),
    ]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: [INPUT.SETTINGS_PENDBASE]"));
    assert!(!temp.path().join("cu15.in").exists());
}

#[test]
fn unknown_program_is_a_usage_error() {
    let temp = TempDir::new().expect("tempdir should be created");
    let options_path = temp.path().join("options.json");
    write_file(&options_path, OPTIONS);

    let output = run_penepma_rs(&[
        "import",
        "--options",
        path_str(&options_path),
        "--results-dir",
        path_str(temp.path()),
        "--program",
        "pencyl",
    ]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("INPUT.CLI_USAGE"));
}
