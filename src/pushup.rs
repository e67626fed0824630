//! Push-up validator
//!
//! Phase cycle: Transitioning -> Down -> Up -> Down(+1 rep) -> ...
//! A repetition counts on the Down -> Up transition (elbow lockout), gated
//! by the minimum event interval so bouncing at the top cannot double-count.

use serde::{Deserialize, Serialize};

use crate::geometry;
use crate::types::{
    Frame, ValidationResult, LEFT_ELBOW, LEFT_HIP, LEFT_SHOULDER, LEFT_WRIST, RIGHT_ELBOW,
    RIGHT_HIP, RIGHT_SHOULDER, RIGHT_WRIST,
};
use crate::validator::{
    ExerciseValidator, ValidatorCore, FEEDBACK_BODY_NOT_VISIBLE, MIN_REP_INTERVAL_MS,
};

const REQUIRED_LANDMARKS: [usize; 8] = [
    LEFT_SHOULDER,
    RIGHT_SHOULDER,
    LEFT_ELBOW,
    RIGHT_ELBOW,
    LEFT_WRIST,
    RIGHT_WRIST,
    LEFT_HIP,
    RIGHT_HIP,
];

/// Average elbow angle below this reads as the bottom of the rep
const DOWN_ANGLE_DEG: f64 = 70.0;
/// Average elbow angle above this reads as lockout
const LOCKOUT_ANGLE_DEG: f64 = 160.0;
/// Plausible elbow angle band for a push-up position
const MIN_ELBOW_ANGLE_DEG: f64 = 30.0;
const MAX_ELBOW_ANGLE_DEG: f64 = 180.0;
/// Vertical shoulder-center/hip-center offset that zeroes the alignment score
const ALIGNMENT_OFFSET_LIMIT: f64 = 0.1;
/// Left/right elbow angle difference that zeroes the symmetry score
const SYMMETRY_LIMIT_DEG: f64 = 30.0;
/// Individual criterion pass mark
const CRITERION_PASS: f64 = 0.7;
/// Weighted form score required for a frame to count as valid
const VALID_FORM_SCORE: f64 = 0.6;

/// Position within the push-up repetition cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PushUpPhase {
    Transitioning,
    Down,
    Up,
}

/// Push-up phase state machine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushUpValidator {
    core: ValidatorCore,
    phase: PushUpPhase,
}

impl Default for PushUpValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl PushUpValidator {
    pub fn new() -> Self {
        PushUpValidator {
            core: ValidatorCore::new(),
            phase: PushUpPhase::Transitioning,
        }
    }

    pub fn phase(&self) -> PushUpPhase {
        self.phase
    }
}

struct ArmMeasurements {
    avg_angle: f64,
    alignment: f64,
    symmetry: f64,
}

/// Derive the per-frame geometry. Returns None if any required landmark is
/// absent; callers run the reliability pre-check first, so this is a
/// belt-and-braces guard rather than an expected path.
fn measure(frame: &Frame) -> Option<ArmMeasurements> {
    let left_shoulder = frame.landmark(LEFT_SHOULDER)?;
    let right_shoulder = frame.landmark(RIGHT_SHOULDER)?;
    let left_hip = frame.landmark(LEFT_HIP)?;
    let right_hip = frame.landmark(RIGHT_HIP)?;

    let left_angle = geometry::joint_angle(
        left_shoulder,
        frame.landmark(LEFT_ELBOW)?,
        frame.landmark(LEFT_WRIST)?,
    );
    let right_angle = geometry::joint_angle(
        right_shoulder,
        frame.landmark(RIGHT_ELBOW)?,
        frame.landmark(RIGHT_WRIST)?,
    );

    let shoulder_center_y = (left_shoulder.y + right_shoulder.y) / 2.0;
    let hip_center_y = (left_hip.y + right_hip.y) / 2.0;
    let vertical_offset = (shoulder_center_y - hip_center_y).abs();
    let alignment = (1.0 - vertical_offset / ALIGNMENT_OFFSET_LIMIT).clamp(0.0, 1.0);

    let angle_diff = (left_angle - right_angle).abs();
    let symmetry = (1.0 - angle_diff / SYMMETRY_LIMIT_DEG).clamp(0.0, 1.0);

    Some(ArmMeasurements {
        avg_angle: (left_angle + right_angle) / 2.0,
        alignment,
        symmetry,
    })
}

impl ExerciseValidator for PushUpValidator {
    fn validate(&mut self, frame: &Frame) -> ValidationResult {
        if let Some(sentinel) = ValidatorCore::check_frame(frame, &REQUIRED_LANDMARKS) {
            return sentinel;
        }
        let m = match measure(frame) {
            Some(m) => m,
            None => return ValidationResult::invalid(FEEDBACK_BODY_NOT_VISIBLE),
        };

        let criteria = [
            m.alignment > CRITERION_PASS,
            m.symmetry > CRITERION_PASS,
            m.avg_angle > MIN_ELBOW_ANGLE_DEG && m.avg_angle < MAX_ELBOW_ANGLE_DEG,
        ];
        let form_score = ValidatorCore::form_score(&criteria);
        let is_valid = self.core.record_and_smooth(form_score > VALID_FORM_SCORE);

        let mut feedback = Vec::new();
        if !criteria[0] {
            feedback.push("keep your body in a straight line".to_string());
        }
        if !criteria[1] {
            feedback.push("push evenly with both arms".to_string());
        }
        if !criteria[2] {
            feedback.push("adjust your arm position".to_string());
        }

        let mut completed_rep = false;
        if is_valid && m.avg_angle < DOWN_ANGLE_DEG && self.phase != PushUpPhase::Down {
            self.phase = PushUpPhase::Down;
        } else if self.phase == PushUpPhase::Down && is_valid && m.avg_angle > LOCKOUT_ANGLE_DEG {
            // Lockout observed; count only if the event gate is open.
            // A closed gate leaves the phase untouched so a later frame can
            // still complete the rep.
            if self
                .core
                .time_gate_elapsed(frame.timestamp, MIN_REP_INTERVAL_MS)
            {
                self.phase = PushUpPhase::Up;
                self.core.count_rep();
                completed_rep = true;
            }
        }

        match self.phase {
            PushUpPhase::Down => feedback.push("push back up".to_string()),
            PushUpPhase::Up => feedback.push("lower yourself down".to_string()),
            PushUpPhase::Transitioning => {
                if feedback.is_empty() {
                    feedback.push("good form, keep going".to_string());
                }
            }
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
        self.phase = PushUpPhase::Transitioning;
    }

    fn rep_count(&self) -> u32 {
        self.core.rep_count()
    }
}
