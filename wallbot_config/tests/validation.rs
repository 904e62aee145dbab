use wallbot_config::load_toml;

fn base_toml(ranging_window: usize, increment_deg: f32) -> String {
    format!(
        r#"
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
step_interval_ms = 10

[ranging]
window = {ranging_window}
ir_window = 8
no_echo_us = 2000
max_echo_us = 25000
inch_per_us = 0.00676
sensor_offset_in = 4.5
lane_width_in = 48.0

[search]
increment_deg = {increment_deg}

[center]
tolerance_in = 0.1
step_in = 0.09
"#
    )
}

#[test]
fn rejects_zero_ranging_window() {
    let cfg = load_toml(&base_toml(0, 1.0)).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject window=0");
    assert!(format!("{err}").contains("ranging.window must be >= 1"));
}

#[test]
fn rejects_non_positive_increment() {
    let cfg = load_toml(&base_toml(8, 0.0)).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject increment_deg=0");
    assert!(format!("{err}").contains("search.increment_deg must be > 0"));
}

#[test]
fn accepts_defaults_with_pins_only() {
    let toml = r#"
[pins]
motor_step = 7
motor_dir_left = 8
motor_dir_right = 9
echo_front = 14
echo_rear = 15
ir_notify = 4
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    cfg.validate().expect("default config should pass");
    assert_eq!(cfg.ranging.window, 8);
    assert_eq!(cfg.drive.step_interval_ms, 10);
    assert!((cfg.ir.found_threshold_pct - 70.0).abs() < f32::EPSILON);
}

#[test]
fn rejects_threshold_above_100() {
    let mut toml = base_toml(8, 1.0);
    toml.push_str("\n[ir]\nfound_threshold_pct = 130.0\n");
    let cfg = load_toml(&toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject threshold > 100");
    assert!(format!("{err}").contains("ir.found_threshold_pct"));
}

#[test]
fn rejects_sentinel_wider_than_max_echo() {
    let mut toml = base_toml(8, 1.0);
    toml.push_str("\n[runner]\npoll_hz = 200\n");
    // no_echo_us above max_echo_us is inconsistent
    let toml = toml.replace("no_echo_us = 2000", "no_echo_us = 30000");
    let cfg = load_toml(&toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject sentinel > max echo");
    assert!(format!("{err}").contains("no_echo_us"));
}
