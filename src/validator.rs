//! Shared validator capability
//!
//! Every concrete validator composes a [`ValidatorCore`] by value: rep
//! counting, majority-vote smoothing over the recent pass/fail history,
//! minimum-interval event gating, landmark reliability checks, and form
//! score aggregation all live here. The exercise-specific phase machines
//! stay in their own modules.

use serde::{Deserialize, Serialize};

use crate::types::{Frame, Landmark, ValidationResult};

/// Frames below this overall confidence are not scored
pub const MIN_FRAME_CONFIDENCE: f64 = 0.6;

/// Landmarks below this visibility are treated as unreliable
pub const MIN_LANDMARK_VISIBILITY: f64 = 0.5;

/// Number of recent frames in the pass/fail smoothing window
pub const SMOOTHING_WINDOW: usize = 5;

/// Passes required in the window for the smoothed signal to read valid
/// (ceil(5 * 0.6) = 3)
pub const SMOOTHING_PASS_COUNT: usize = 3;

/// Minimum spacing between counted rep/phase events
pub const MIN_REP_INTERVAL_MS: u64 = 1000;

/// Cue for frames with overall confidence below the floor
pub const FEEDBACK_LOW_CONFIDENCE: &str = "position yourself clearly in the camera view";

/// Cue for frames missing a required landmark
pub const FEEDBACK_BODY_NOT_VISIBLE: &str = "make sure your whole body is visible";

/// Capability shared by the push-up, chin-up, and plank validators
pub trait ExerciseValidator {
    /// Score one frame. Must be called at most once per logical frame;
    /// double invocation would double-count reps or corrupt debounce
    /// windows.
    fn validate(&mut self, frame: &Frame) -> ValidationResult;

    /// Reinitialize all state in place for a fresh session
    fn reset(&mut self);

    /// Repetitions (or milestones) counted so far; monotonic between resets
    fn rep_count(&self) -> u32;
}

/// Mutable state shared by every validator, composed by value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatorCore {
    rep_count: u32,
    /// Fixed-capacity ring of the last pass/fail decisions.
    /// Unwritten slots read false, so the majority vote is conservative
    /// until the window fills.
    history: [bool; SMOOTHING_WINDOW],
    write_index: usize,
    last_event_timestamp: Option<u64>,
}

impl Default for ValidatorCore {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidatorCore {
    pub fn new() -> Self {
        ValidatorCore {
            rep_count: 0,
            history: [false; SMOOTHING_WINDOW],
            write_index: 0,
            last_event_timestamp: None,
        }
    }

    pub fn rep_count(&self) -> u32 {
        self.rep_count
    }

    /// Count one completed repetition or milestone
    pub fn count_rep(&mut self) {
        self.rep_count += 1;
    }

    /// Zero the rep count, history, and event gate in place
    pub fn reset(&mut self) {
        *self = ValidatorCore::new();
    }

    /// True iff the landmark is present and its visibility clears the floor.
    /// Landmarks without a visibility estimate are taken at face value.
    pub fn is_reliable(landmark: Option<&Landmark>) -> bool {
        match landmark {
            Some(lm) => lm.visibility.unwrap_or(1.0) >= MIN_LANDMARK_VISIBILITY,
            None => false,
        }
    }

    /// Fraction of criteria satisfied; an empty list scores 0
    pub fn form_score(criteria: &[bool]) -> f64 {
        if criteria.is_empty() {
            return 0.0;
        }
        let passed = criteria.iter().filter(|c| **c).count();
        passed as f64 / criteria.len() as f64
    }

    /// Push this frame's decision into the ring and return the majority
    /// vote over the window
    pub fn record_and_smooth(&mut self, valid: bool) -> bool {
        self.history[self.write_index] = valid;
        self.write_index = (self.write_index + 1) % SMOOTHING_WINDOW;

        let passes = self.history.iter().filter(|v| **v).count();
        passes >= SMOOTHING_PASS_COUNT
    }

    /// True iff at least `min_interval_ms` elapsed since the last counted
    /// event. On success the gate timestamp advances; a failed check leaves
    /// it untouched so a later frame can still pass.
    pub fn time_gate_elapsed(&mut self, timestamp: u64, min_interval_ms: u64) -> bool {
        match self.last_event_timestamp {
            Some(last) if timestamp.saturating_sub(last) < min_interval_ms => false,
            _ => {
                self.last_event_timestamp = Some(timestamp);
                true
            }
        }
    }

    /// Common pre-checks shared by every validator: overall confidence and
    /// required-landmark reliability. Returns the sentinel result to hand
    /// back, or None when the frame is scoreable. Never mutates state.
    pub fn check_frame(frame: &Frame, required: &[usize]) -> Option<ValidationResult> {
        if frame.confidence < MIN_FRAME_CONFIDENCE {
            return Some(ValidationResult::invalid(FEEDBACK_LOW_CONFIDENCE));
        }
        for &index in required {
            if !Self::is_reliable(frame.landmark(index)) {
                return Some(ValidationResult::invalid(FEEDBACK_BODY_NOT_VISIBLE));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LEFT_SHOULDER, RIGHT_SHOULDER};

    fn make_frame(confidence: f64) -> Frame {
        let mut landmarks = vec![Landmark::new(0.5, 0.5, 0.0).with_visibility(0.9); 33];
        landmarks[RIGHT_SHOULDER] = Landmark::new(0.5, 0.5, 0.0).with_visibility(0.2);
        Frame {
            landmarks,
            confidence,
            timestamp: 0,
        }
    }

    #[test]
    fn test_form_score() {
        assert_eq!(ValidatorCore::form_score(&[]), 0.0);
        assert_eq!(
            ValidatorCore::form_score(&[true, true, false, true]),
            0.75
        );
        assert_eq!(ValidatorCore::form_score(&[false, false]), 0.0);
        assert_eq!(ValidatorCore::form_score(&[true]), 1.0);
    }

    #[test]
    fn test_is_reliable() {
        assert!(!ValidatorCore::is_reliable(None));

        let visible = Landmark::new(0.5, 0.5, 0.0).with_visibility(0.8);
        assert!(ValidatorCore::is_reliable(Some(&visible)));

        let hidden = Landmark::new(0.5, 0.5, 0.0).with_visibility(0.4);
        assert!(!ValidatorCore::is_reliable(Some(&hidden)));

        // No visibility estimate: taken at face value
        let unscored = Landmark::new(0.5, 0.5, 0.0);
        assert!(ValidatorCore::is_reliable(Some(&unscored)));
    }

    #[test]
    fn test_smoothing_majority_vote() {
        let mut core = ValidatorCore::new();

        // Two passes are not enough against three empty slots
        assert!(!core.record_and_smooth(true));
        assert!(!core.record_and_smooth(true));
        // Third pass tips the vote
        assert!(core.record_and_smooth(true));

        // A single failure does not flip a full window of passes
        assert!(core.record_and_smooth(true));
        assert!(core.record_and_smooth(true));
        assert!(core.record_and_smooth(false));

        // Three failures in the window do
        assert!(core.record_and_smooth(false));
        assert!(!core.record_and_smooth(false));
    }

    #[test]
    fn test_smoothing_evicts_oldest() {
        let mut core = ValidatorCore::new();
        for _ in 0..SMOOTHING_WINDOW {
            core.record_and_smooth(true);
        }
        // Window is all true; two failures leave three passes
        assert!(core.record_and_smooth(false));
        assert!(core.record_and_smooth(false));
        // Third failure evicts a pass and the vote flips
        assert!(!core.record_and_smooth(false));
    }

    #[test]
    fn test_time_gate() {
        let mut core = ValidatorCore::new();

        // First event always passes
        assert!(core.time_gate_elapsed(5_000, 1_000));
        // Too soon: gate holds and does not advance
        assert!(!core.time_gate_elapsed(5_500, 1_000));
        assert!(!core.time_gate_elapsed(5_999, 1_000));
        // Interval measured from the last counted event, not the last check
        assert!(core.time_gate_elapsed(6_000, 1_000));
    }

    #[test]
    fn test_check_frame_low_confidence() {
        let frame = make_frame(0.3);
        let result = ValidatorCore::check_frame(&frame, &[LEFT_SHOULDER]).unwrap();
        assert!(!result.is_valid);
        assert_eq!(result.feedback, vec![FEEDBACK_LOW_CONFIDENCE.to_string()]);
    }

    #[test]
    fn test_check_frame_unreliable_landmark() {
        let frame = make_frame(0.9);
        assert!(ValidatorCore::check_frame(&frame, &[LEFT_SHOULDER]).is_none());

        let result = ValidatorCore::check_frame(&frame, &[LEFT_SHOULDER, RIGHT_SHOULDER]).unwrap();
        assert_eq!(result.feedback, vec![FEEDBACK_BODY_NOT_VISIBLE.to_string()]);
    }

    #[test]
    fn test_check_frame_missing_landmark() {
        let frame = Frame {
            landmarks: vec![Landmark::new(0.5, 0.5, 0.0); 5],
            confidence: 0.9,
            timestamp: 0,
        };
        let result = ValidatorCore::check_frame(&frame, &[LEFT_SHOULDER]).unwrap();
        assert_eq!(result.feedback, vec![FEEDBACK_BODY_NOT_VISIBLE.to_string()]);
    }

    #[test]
    fn test_reset() {
        let mut core = ValidatorCore::new();
        core.count_rep();
        core.record_and_smooth(true);
        assert!(core.time_gate_elapsed(1_000, 1_000));

        core.reset();
        assert_eq!(core.rep_count(), 0);
        assert!(!core.record_and_smooth(true));
        // Gate reopens immediately after reset
        assert!(core.time_gate_elapsed(1_001, 1_000));
    }
}
