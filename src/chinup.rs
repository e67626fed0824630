//! Chin-up validator
//!
//! Mirrors the push-up cycle: wide elbow angle = extended dead hang = Down,
//! narrow angle with the chin above the bar = Up, and the repetition counts
//! on the return to Down. The body-position criterion penalizes horizontal
//! shoulder/hip drift (swinging) rather than the push-up's vertical sag.

use serde::{Deserialize, Serialize};

use crate::geometry;
use crate::types::{
    Frame, Landmark, ValidationResult, LEFT_ELBOW, LEFT_HIP, LEFT_SHOULDER, LEFT_WRIST, NOSE,
    RIGHT_ELBOW, RIGHT_HIP, RIGHT_SHOULDER, RIGHT_WRIST,
};
use crate::validator::{
    ExerciseValidator, ValidatorCore, FEEDBACK_BODY_NOT_VISIBLE, MIN_REP_INTERVAL_MS,
};

const REQUIRED_LANDMARKS: [usize; 9] = [
    NOSE,
    LEFT_SHOULDER,
    RIGHT_SHOULDER,
    LEFT_ELBOW,
    RIGHT_ELBOW,
    LEFT_WRIST,
    RIGHT_WRIST,
    LEFT_HIP,
    RIGHT_HIP,
];

/// Average elbow angle above this reads as a full dead hang
const EXTENDED_ANGLE_DEG: f64 = 160.0;
/// Average elbow angle below this reads as the top of the pull
const FLEXED_ANGLE_DEG: f64 = 90.0;
/// Plausible elbow angle band while on the bar
const MIN_ELBOW_ANGLE_DEG: f64 = 30.0;
const MAX_ELBOW_ANGLE_DEG: f64 = 180.0;
/// Vertical nose clearance over the bar line that saturates the chin score
const CHIN_CLEARANCE_LIMIT: f64 = 0.05;
/// Horizontal shoulder-center/hip-center drift that zeroes the body score
const SWING_OFFSET_LIMIT: f64 = 0.1;
/// Left/right elbow angle difference that zeroes the symmetry score
const SYMMETRY_LIMIT_DEG: f64 = 30.0;
/// Individual criterion pass mark
const CRITERION_PASS: f64 = 0.7;
/// Weighted form score required for a frame to count as valid
const VALID_FORM_SCORE: f64 = 0.6;

/// Position within the chin-up repetition cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChinUpPhase {
    Transitioning,
    Down,
    Up,
}

/// Chin-up phase state machine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChinUpValidator {
    core: ValidatorCore,
    phase: ChinUpPhase,
}

impl Default for ChinUpValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl ChinUpValidator {
    pub fn new() -> Self {
        ChinUpValidator {
            core: ValidatorCore::new(),
            phase: ChinUpPhase::Transitioning,
        }
    }

    pub fn phase(&self) -> ChinUpPhase {
        self.phase
    }
}

/// Graded chin-over-bar check. The bar line is the mean of the two wrist
/// heights; a nose at or below it scores 0, and the score grows with
/// vertical clearance, saturating at 1 once clearance reaches the limit.
/// Smaller y is higher in image space.
pub fn chin_over_bar_score(nose: &Landmark, left_wrist: &Landmark, right_wrist: &Landmark) -> f64 {
    let bar_y = (left_wrist.y + right_wrist.y) / 2.0;
    if nose.y >= bar_y {
        return 0.0;
    }
    ((bar_y - nose.y) / CHIN_CLEARANCE_LIMIT).min(1.0)
}

struct PullMeasurements {
    avg_angle: f64,
    body_position: f64,
    symmetry: f64,
    chin_score: f64,
}

fn measure(frame: &Frame) -> Option<PullMeasurements> {
    let left_shoulder = frame.landmark(LEFT_SHOULDER)?;
    let right_shoulder = frame.landmark(RIGHT_SHOULDER)?;
    let left_hip = frame.landmark(LEFT_HIP)?;
    let right_hip = frame.landmark(RIGHT_HIP)?;
    let left_wrist = frame.landmark(LEFT_WRIST)?;
    let right_wrist = frame.landmark(RIGHT_WRIST)?;

    let left_angle = geometry::joint_angle(left_shoulder, frame.landmark(LEFT_ELBOW)?, left_wrist);
    let right_angle =
        geometry::joint_angle(right_shoulder, frame.landmark(RIGHT_ELBOW)?, right_wrist);

    // Anti-swing: horizontal drift between shoulder center and hip center
    let shoulder_center_x = (left_shoulder.x + right_shoulder.x) / 2.0;
    let hip_center_x = (left_hip.x + right_hip.x) / 2.0;
    let drift = (shoulder_center_x - hip_center_x).abs();
    let body_position = (1.0 - drift / SWING_OFFSET_LIMIT).clamp(0.0, 1.0);

    let angle_diff = (left_angle - right_angle).abs();
    let symmetry = (1.0 - angle_diff / SYMMETRY_LIMIT_DEG).clamp(0.0, 1.0);

    Some(PullMeasurements {
        avg_angle: (left_angle + right_angle) / 2.0,
        body_position,
        symmetry,
        chin_score: chin_over_bar_score(frame.landmark(NOSE)?, left_wrist, right_wrist),
    })
}

impl ExerciseValidator for ChinUpValidator {
    fn validate(&mut self, frame: &Frame) -> ValidationResult {
        if let Some(sentinel) = ValidatorCore::check_frame(frame, &REQUIRED_LANDMARKS) {
            return sentinel;
        }
        let m = match measure(frame) {
            Some(m) => m,
            None => return ValidationResult::invalid(FEEDBACK_BODY_NOT_VISIBLE),
        };

        let criteria = [
            m.body_position > CRITERION_PASS,
            m.symmetry > CRITERION_PASS,
            m.avg_angle > MIN_ELBOW_ANGLE_DEG && m.avg_angle < MAX_ELBOW_ANGLE_DEG,
        ];
        let form_score = ValidatorCore::form_score(&criteria);
        let is_valid = self.core.record_and_smooth(form_score > VALID_FORM_SCORE);

        let mut feedback = Vec::new();
        if !criteria[0] {
            feedback.push("keep your body straight, avoid swinging".to_string());
        }
        if !criteria[1] {
            feedback.push("keep both arms symmetric".to_string());
        }
        if !criteria[2] {
            feedback.push("adjust your grip position".to_string());
        }

        let mut completed_rep = false;
        match self.phase {
            ChinUpPhase::Transitioning => {
                if is_valid && m.avg_angle > EXTENDED_ANGLE_DEG {
                    self.phase = ChinUpPhase::Down;
                }
            }
            ChinUpPhase::Down => {
                if is_valid && m.avg_angle < FLEXED_ANGLE_DEG && m.chin_score > 0.0 {
                    self.phase = ChinUpPhase::Up;
                }
            }
            ChinUpPhase::Up => {
                // Rep counts on the return to the dead hang, same gate as
                // the push-up lockout
                if is_valid
                    && m.avg_angle > EXTENDED_ANGLE_DEG
                    && self
                        .core
                        .time_gate_elapsed(frame.timestamp, MIN_REP_INTERVAL_MS)
                {
                    self.phase = ChinUpPhase::Down;
                    self.core.count_rep();
                    completed_rep = true;
                }
            }
        }

        match self.phase {
            ChinUpPhase::Down => {
                if m.avg_angle < FLEXED_ANGLE_DEG && m.chin_score == 0.0 {
                    feedback.push("chin over the bar!".to_string());
                } else {
                    feedback.push("pull yourself up".to_string());
                }
            }
            ChinUpPhase::Up => feedback.push("lower yourself down".to_string()),
            ChinUpPhase::Transitioning => feedback.push("lower yourself down".to_string()),
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
        self.phase = ChinUpPhase::Transitioning;
    }

    fn rep_count(&self) -> u32 {
        self.core.rep_count()
    }
}
