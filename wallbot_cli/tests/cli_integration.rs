use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

// Minimal valid TOML config for the simulated backend
fn write_valid_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[pins]
motor_step = 7
motor_dir_left = 8
motor_dir_right = 9
echo_front = 14
echo_rear = 15
ir_notify = 4

[drive]
steps_per_rev = 200
wheel_circumference_in = 12.76
steps_per_degree = 1.055
# Fast pulses so maneuvers finish quickly in tests
step_interval_ms = 1

[runner]
poll_hz = 2000
"#;
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["drive", "--inches", "0"], 0, "complete", "stdout")]
#[case(&["drive", "--inches", "1"], 0, "complete", "stdout")]
#[case(&["turn", "--degrees", "-3"], 0, "complete", "stdout")]
#[case(&["drive"], 2, "required", "stderr")]
#[case(&["center", "--target", "24", "--max-polls", "2"], -1, "did not complete", "stderr")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let mut cmd = Command::cargo_bin("wallbot_cli").unwrap();

    // Always include a valid config to avoid relying on default path
    cmd.arg("--config").arg(&cfg);
    // Start 30 in out so centering at 24 has real work to do
    cmd.arg("--wall-in").arg("30");

    for a in args {
        cmd.arg(a);
    }

    let assert = cmd.assert();

    let assert = if exit_code >= 0 {
        assert.code(exit_code)
    } else {
        assert.failure()
    };

    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        "stderr" => {
            assert.stderr(predicate::str::contains(needle));
        }
        other => panic!("unknown stream: {other}"),
    }
}

#[rstest]
fn json_mode_emits_structured_result() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let mut cmd = Command::cargo_bin("wallbot_cli").unwrap();
    cmd.arg("--config")
        .arg(&cfg)
        .arg("--json")
        .arg("drive")
        .arg("--inches")
        .arg("0");

    let output = cmd.assert().success().get_output().stdout.clone();
    let line = String::from_utf8(output).unwrap();
    let v: serde_json::Value = serde_json::from_str(line.lines().next().unwrap()).unwrap();
    assert_eq!(v["event"], "drive complete");
    assert_eq!(v["polls"], 1);
}

#[rstest]
fn cli_rejects_invalid_config() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    // window = 0 fails validation
    fs::write(
        &path,
        r#"
[pins]
motor_step = 7
motor_dir_left = 8
motor_dir_right = 9
echo_front = 14
echo_rear = 15
ir_notify = 4

[ranging]
window = 0
"#,
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("wallbot_cli").unwrap();
    cmd.arg("--config").arg(&path).arg("align");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("ranging.window"));
}

#[rstest]
fn cli_reports_bad_calibration_header() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let bad_csv = dir.path().join("echo.csv");
    let mut f = fs::File::create(&bad_csv).unwrap();
    writeln!(f, "micros,value").unwrap();
    writeln!(f, "1000,6.8").unwrap();
    writeln!(f, "2000,13.5").unwrap();

    let mut cmd = Command::cargo_bin("wallbot_cli").unwrap();
    cmd.arg("--config")
        .arg(&cfg)
        .arg("--calibration")
        .arg(&bad_csv)
        .arg("self-check");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("micros,inches"));
}
