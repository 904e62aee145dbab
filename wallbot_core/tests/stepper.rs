use std::sync::Arc;
use std::time::Duration;

use wallbot_core::config::DriveCfg;
use wallbot_core::mocks::{DriveEvent, ManualClock, SpyDrive};
use wallbot_core::stepper::{Drive, MotionStatus, StepperState};
use wallbot_traits::DriveDirection;

// 100 steps per inch and 1 step per degree keep the step math exact.
fn test_cfg() -> DriveCfg {
    DriveCfg {
        steps_per_rev: 200,
        wheel_circumference_in: 2.0,
        steps_per_degree: 1.0,
        step_interval_ms: 10,
    }
}

fn make_drive() -> (Drive<SpyDrive>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    let spy = SpyDrive::new(0.01, 1.0);
    (Drive::new(spy, test_cfg(), clock.clone()), clock)
}

#[test]
fn zero_length_move_is_done_on_first_poll() {
    let (mut drive, _clock) = make_drive();
    let mut st = StepperState::new();
    assert_eq!(drive.poll_linear(&mut st, 0.0).unwrap(), MotionStatus::Done);
    let mut st = StepperState::new();
    assert_eq!(drive.poll_turn(&mut st, 0.0).unwrap(), MotionStatus::Done);
}

#[test]
fn direction_is_set_before_any_step_edge() {
    let (mut drive, _clock) = make_drive();
    let mut st = StepperState::new();
    drive.poll_linear(&mut st, 1.0).unwrap();
    assert_eq!(
        drive.driver().events.first(),
        Some(&DriveEvent::Direction(DriveDirection::Forward))
    );
    assert!(matches!(
        drive.driver().events.get(1),
        Some(DriveEvent::StepEdge(true))
    ));
}

#[test]
fn exact_transition_count_then_done_exactly_once() {
    let (mut drive, clock) = make_drive();
    let mut st = StepperState::new();
    let mut done = 0;
    // 0.5 in at 100 steps/in = 50 toggle-to-active transitions
    for _ in 0..300 {
        clock.advance(Duration::from_millis(11));
        if drive.poll_linear(&mut st, 0.5).unwrap() == MotionStatus::Done {
            done += 1;
            break;
        }
    }
    assert_eq!(done, 1);
    assert_eq!(drive.driver().active_steps, 50);
    // The state was reset and is ready for the next maneuver.
    assert!(!st.active());
    assert_eq!(st.steps_taken, 0);
}

#[test]
fn inter_step_interval_gates_pulses() {
    let (mut drive, clock) = make_drive();
    let mut st = StepperState::new();
    // First pulse is not gated.
    drive.poll_linear(&mut st, 1.0).unwrap();
    let edges_after_first = drive.driver().events.len();
    // Without advancing time, further polls must not toggle the line.
    for _ in 0..5 {
        drive.poll_linear(&mut st, 1.0).unwrap();
    }
    assert_eq!(drive.driver().events.len(), edges_after_first);
    // Elapsed equal to the interval is still gated (strictly-greater rule).
    clock.advance(Duration::from_millis(10));
    drive.poll_linear(&mut st, 1.0).unwrap();
    assert_eq!(drive.driver().events.len(), edges_after_first);
    // One more millisecond releases the gate.
    clock.advance(Duration::from_millis(1));
    drive.poll_linear(&mut st, 1.0).unwrap();
    assert_eq!(drive.driver().events.len(), edges_after_first + 1);
}

#[test]
fn negative_move_runs_in_reverse() {
    let (mut drive, clock) = make_drive();
    let mut st = StepperState::new();
    drive.poll_linear(&mut st, -0.1).unwrap();
    assert_eq!(
        drive.driver().events.first(),
        Some(&DriveEvent::Direction(DriveDirection::Reverse))
    );
    // 0.1 in = 10 steps in reverse; pose moves backward.
    while drive.poll_linear(&mut st, -0.1).unwrap() == MotionStatus::InProgress {
        clock.advance(Duration::from_millis(11));
    }
    let pose = drive.driver().pose_handle().get();
    assert!((pose.x_in + 0.1).abs() < 1e-6, "pose {pose:?}");
}

#[test]
fn state_reuse_starts_a_fresh_maneuver() {
    let (mut drive, clock) = make_drive();
    let mut st = StepperState::new();
    while drive.poll_turn(&mut st, 2.0).unwrap() == MotionStatus::InProgress {
        clock.advance(Duration::from_millis(11));
    }
    assert_eq!(drive.driver().active_steps, 2);
    // Same state object, opposite direction.
    while drive.poll_turn(&mut st, -2.0).unwrap() == MotionStatus::InProgress {
        clock.advance(Duration::from_millis(11));
    }
    assert_eq!(drive.driver().active_steps, 4);
    let pose = drive.driver().pose_handle().get();
    assert!(pose.heading_deg.abs() < 1e-6, "pose {pose:?}");
}
