//! Plank validator
//!
//! Hold-based rather than angle-cyclic: the validator tracks how long a
//! valid plank has been held and fires a one-shot event at each duration
//! milestone. Leaving the position is debounced, and a broken plank keeps
//! the credit it already earned.
//!
//! Unlike the push-up and chin-up validators, which pass a frame on a
//! weighted form score above 0.6, the plank requires every one of its five
//! conditions to clear 0.7 (logical AND). The asymmetry is inherited
//! behavior and is preserved deliberately.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::geometry;
use crate::types::{
    Frame, ValidationResult, LEFT_ANKLE, LEFT_ELBOW, LEFT_HIP, LEFT_SHOULDER, RIGHT_ANKLE,
    RIGHT_ELBOW, RIGHT_HIP, RIGHT_SHOULDER,
};
use crate::validator::{ExerciseValidator, ValidatorCore, FEEDBACK_BODY_NOT_VISIBLE};

const REQUIRED_LANDMARKS: [usize; 8] = [
    LEFT_SHOULDER,
    RIGHT_SHOULDER,
    LEFT_ELBOW,
    RIGHT_ELBOW,
    LEFT_HIP,
    RIGHT_HIP,
    LEFT_ANKLE,
    RIGHT_ANKLE,
];

/// Hold durations that each fire a one-shot milestone event
pub const MILESTONES_MS: [u64; 5] = [5_000, 10_000, 20_000, 30_000, 60_000];

/// Continuous invalidity required before the position is considered left
const EXIT_DEBOUNCE_MS: u64 = 1_000;

/// Frames kept for the multi-frame stability score
const STABILITY_WINDOW: usize = 10;

/// Body-line deviation that zeroes the colinearity score
const BODY_LINE_TOLERANCE: f64 = 0.1;
/// Horizontal elbow/shoulder offset that zeroes the elbow score
const ELBOW_OFFSET_LIMIT: f64 = 0.1;
/// Hip angle deviation from 180 degrees that zeroes the hip score
const HIP_ANGLE_TOLERANCE_DEG: f64 = 45.0;
/// Every condition must individually clear this mark
const CRITERION_PASS: f64 = 0.7;

/// Plank hold state machine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlankValidator {
    core: ValidatorCore,
    frame_history: VecDeque<Frame>,
    in_position: bool,
    position_start: Option<u64>,
    /// Total time credited to the hold so far
    held_ms: u64,
    /// Timestamp of the last frame with a (smoothed) valid plank
    last_stable_timestamp: u64,
    /// Index into MILESTONES_MS of the next un-fired milestone
    next_milestone: usize,
}

impl Default for PlankValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl PlankValidator {
    pub fn new() -> Self {
        PlankValidator {
            core: ValidatorCore::new(),
            frame_history: VecDeque::with_capacity(STABILITY_WINDOW),
            in_position: false,
            position_start: None,
            held_ms: 0,
            last_stable_timestamp: 0,
            next_milestone: 0,
        }
    }

    /// Whether a plank position is currently considered held
    pub fn in_position(&self) -> bool {
        self.in_position
    }

    /// Time credited to the hold so far, in milliseconds
    pub fn held_ms(&self) -> u64 {
        self.held_ms
    }
}

struct PlankScores {
    left_line: f64,
    right_line: f64,
    elbow: f64,
    hip_angle: f64,
}

fn measure(frame: &Frame) -> Option<PlankScores> {
    let left_shoulder = frame.landmark(LEFT_SHOULDER)?;
    let right_shoulder = frame.landmark(RIGHT_SHOULDER)?;
    let left_elbow = frame.landmark(LEFT_ELBOW)?;
    let right_elbow = frame.landmark(RIGHT_ELBOW)?;
    let left_hip = frame.landmark(LEFT_HIP)?;
    let right_hip = frame.landmark(RIGHT_HIP)?;
    let left_ankle = frame.landmark(LEFT_ANKLE)?;
    let right_ankle = frame.landmark(RIGHT_ANKLE)?;

    // Shoulder-hip-ankle colinearity, scored per side
    let left_line =
        geometry::alignment_score(&[left_shoulder, left_hip, left_ankle], BODY_LINE_TOLERANCE);
    let right_line =
        geometry::alignment_score(&[right_shoulder, right_hip, right_ankle], BODY_LINE_TOLERANCE);

    // Elbows stacked under the shoulders
    let shoulder_center_x = (left_shoulder.x + right_shoulder.x) / 2.0;
    let elbow_center_x = (left_elbow.x + right_elbow.x) / 2.0;
    let elbow_offset = (shoulder_center_x - elbow_center_x).abs();
    let elbow = (1.0 - elbow_offset / ELBOW_OFFSET_LIMIT).clamp(0.0, 1.0);

    // Hip extension: angle at the hip vertex, averaged over both sides
    let left_hip_angle = geometry::joint_angle(left_shoulder, left_hip, left_ankle);
    let right_hip_angle = geometry::joint_angle(right_shoulder, right_hip, right_ankle);
    let avg_hip_angle = (left_hip_angle + right_hip_angle) / 2.0;
    let hip_angle = (1.0 - (180.0 - avg_hip_angle).abs() / HIP_ANGLE_TOLERANCE_DEG).clamp(0.0, 1.0);

    Some(PlankScores {
        left_line,
        right_line,
        elbow,
        hip_angle,
    })
}

impl ExerciseValidator for PlankValidator {
    fn validate(&mut self, frame: &Frame) -> ValidationResult {
        if let Some(sentinel) = ValidatorCore::check_frame(frame, &REQUIRED_LANDMARKS) {
            return sentinel;
        }
        let scores = match measure(frame) {
            Some(s) => s,
            None => return ValidationResult::invalid(FEEDBACK_BODY_NOT_VISIBLE),
        };

        self.frame_history.push_back(frame.clone());
        while self.frame_history.len() > STABILITY_WINDOW {
            self.frame_history.pop_front();
        }
        let stability = geometry::pose_stability(self.frame_history.make_contiguous());

        // AND of five conditions, each above the pass mark
        let conditions = [
            scores.left_line > CRITERION_PASS,
            scores.right_line > CRITERION_PASS,
            scores.elbow > CRITERION_PASS,
            scores.hip_angle > CRITERION_PASS,
            stability > CRITERION_PASS,
        ];
        let form_score = ValidatorCore::form_score(&conditions);
        let frame_valid = conditions.iter().all(|c| *c);
        let is_valid = self.core.record_and_smooth(frame_valid);

        let mut feedback = Vec::new();
        if !conditions[0] || !conditions[1] {
            feedback.push("keep your body in a straight line".to_string());
        }
        if !conditions[2] {
            feedback.push("place your elbows under your shoulders".to_string());
        }
        if !conditions[3] {
            feedback.push("don't let your hips sag".to_string());
        }
        if !conditions[4] {
            feedback.push("hold steady".to_string());
        }
        if feedback.is_empty() {
            feedback.push("great plank, keep holding".to_string());
        }

        let now = frame.timestamp;
        let mut completed_rep = false;

        if is_valid {
            self.last_stable_timestamp = now;
            if !self.in_position {
                self.in_position = true;
                // Back-date the start by time already credited so a broken
                // plank resumes instead of restarting
                self.position_start = Some(now.saturating_sub(self.held_ms));
            }
            if let Some(start) = self.position_start {
                self.held_ms = now.saturating_sub(start);
                if self.next_milestone < MILESTONES_MS.len()
                    && self.held_ms >= MILESTONES_MS[self.next_milestone]
                {
                    self.next_milestone += 1;
                    self.core.count_rep();
                    completed_rep = true;
                }
            }
        } else if self.in_position
            && now.saturating_sub(self.last_stable_timestamp) >= EXIT_DEBOUNCE_MS
        {
            // Held credit and milestone progress survive the exit
            self.in_position = false;
        }

        ValidationResult {
            is_valid,
            feedback,
            completed_rep,
            form_score,
        }
    }

    fn reset(&mut self) {
        self.core.reset();
        self.frame_history.clear();
        self.in_position = false;
        self.position_start = None;
        self.held_ms = 0;
        self.last_stable_timestamp = 0;
        self.next_milestone = 0;
    }

    fn rep_count(&self) -> u32 {
        self.core.rep_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Landmark;

    fn lm(x: f64, y: f64) -> Landmark {
        Landmark::new(x, y, 0.0).with_visibility(0.95)
    }

    /// A horizontal forearm plank; `hip_sag` pushes the hips off the
    /// shoulder-ankle line.
    fn make_frame(timestamp: u64, hip_sag: f64) -> Frame {
        let mut landmarks = vec![Landmark::new(0.0, 0.0, 0.0).with_visibility(0.95); 33];

        landmarks[LEFT_SHOULDER] = lm(0.25, 0.50);
        landmarks[RIGHT_SHOULDER] = lm(0.25, 0.52);
        landmarks[LEFT_ELBOW] = lm(0.25, 0.62);
        landmarks[RIGHT_ELBOW] = lm(0.25, 0.64);
        landmarks[LEFT_HIP] = lm(0.50, 0.50 + hip_sag);
        landmarks[RIGHT_HIP] = lm(0.50, 0.52 + hip_sag);
        landmarks[LEFT_ANKLE] = lm(0.75, 0.50);
        landmarks[RIGHT_ANKLE] = lm(0.75, 0.52);

        Frame {
            landmarks,
            confidence: 0.9,
            timestamp,
        }
    }

    /// Drive the validator with 100 ms frames from `from_ms` to `to_ms`
    /// inclusive, returning the timestamps where a milestone fired.
    fn run_hold(validator: &mut PlankValidator, from_ms: u64, to_ms: u64, sag: f64) -> Vec<u64> {
        let mut fired = Vec::new();
        let mut t = from_ms;
        while t <= to_ms {
            let result = validator.validate(&make_frame(t, sag));
            if result.completed_rep {
                fired.push(t);
            }
            t += 100;
        }
        fired
    }

    #[test]
    fn test_milestones_fire_once_each() {
        let mut validator = PlankValidator::new();

        // Smoothing and stability need a short warmup: the hold is credited
        // from t=300 (three valid frames in the window).
        let fired = run_hold(&mut validator, 0, 10_400, 0.0);

        // 5s and 10s milestones, measured from the credited start
        assert_eq!(fired, vec![5_300, 10_300]);
        assert_eq!(validator.rep_count(), 2);
    }

    #[test]
    fn test_brief_break_keeps_credit() {
        let mut validator = PlankValidator::new();
        run_hold(&mut validator, 0, 3_000, 0.0);
        assert!(validator.in_position());

        // 500 ms of sagging hips: smoothed validity dips but the position
        // debounce holds
        run_hold(&mut validator, 3_100, 3_500, 0.2);
        assert!(validator.in_position());

        // Recover and keep holding: the 5 s milestone still fires, with the
        // break included in the credited time
        let fired = run_hold(&mut validator, 3_600, 6_000, 0.0);
        assert_eq!(fired.len(), 1);
        assert_eq!(validator.rep_count(), 1);
    }

    #[test]
    fn test_long_break_clears_position_but_keeps_milestones() {
        let mut validator = PlankValidator::new();
        let fired = run_hold(&mut validator, 0, 5_400, 0.0);
        assert_eq!(fired, vec![5_300]);
        let credit_before = validator.held_ms();

        // Two seconds of broken form: position clears after the debounce
        run_hold(&mut validator, 5_500, 7_500, 0.2);
        assert!(!validator.in_position());
        assert_eq!(validator.rep_count(), 1);

        // Re-entering resumes from the earned credit; the 5 s milestone
        // never re-fires and the next one is 10 s of total hold
        let fired = run_hold(&mut validator, 7_600, 13_500, 0.0);
        assert_eq!(fired.len(), 1);
        assert_eq!(validator.rep_count(), 2);
        assert!(validator.held_ms() >= credit_before);
    }

    #[test]
    fn test_sagging_hips_fail_the_and_gate() {
        let mut validator = PlankValidator::new();
        let result = validator.validate(&make_frame(0, 0.2));

        assert!(!result.is_valid);
        assert!(result
            .feedback
            .contains(&"keep your body in a straight line".to_string()));
        assert!(result
            .feedback
            .contains(&"don't let your hips sag".to_string()));
        // Partial credit shows in the score, but the AND gate still fails
        assert!(result.form_score < 1.0);
    }

    #[test]
    fn test_first_frame_lacks_stability() {
        let mut validator = PlankValidator::new();
        let result = validator.validate(&make_frame(0, 0.0));

        // A single frame has no displacement history
        assert!(!result.is_valid);
        assert!(result.feedback.contains(&"hold steady".to_string()));
    }

    #[test]
    fn test_low_confidence_preserves_hold_state() {
        let mut validator = PlankValidator::new();
        run_hold(&mut validator, 0, 3_000, 0.0);
        let credit = validator.held_ms();

        let mut frame = make_frame(3_100, 0.0);
        frame.confidence = 0.2;
        let result = validator.validate(&frame);

        assert!(!result.is_valid);
        assert!(validator.in_position());
        assert_eq!(validator.held_ms(), credit);
    }

    #[test]
    fn test_reset() {
        let mut validator = PlankValidator::new();
        run_hold(&mut validator, 0, 5_400, 0.0);
        assert_eq!(validator.rep_count(), 1);

        validator.reset();
        assert_eq!(validator.rep_count(), 0);
        assert!(!validator.in_position());
        assert_eq!(validator.held_ms(), 0);
    }
}
