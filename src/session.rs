//! Session orchestration
//!
//! This module provides the public API consumed by the downstream
//! session/game layer: a stateful [`SessionProcessor`] that owns one
//! validator and accumulates session statistics, plus a stateless batch
//! entry point for replay tooling.

use serde::{Deserialize, Serialize};

use crate::chinup::ChinUpValidator;
use crate::error::EngineError;
use crate::plank::PlankValidator;
use crate::pushup::PushUpValidator;
use crate::report::{SessionSummary, SummaryEncoder};
use crate::types::{ExerciseKind, Frame, ValidationResult};
use crate::validator::ExerciseValidator;

/// Aggregates accumulated over one session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionStats {
    /// Frames submitted to the validator
    pub frames: u64,
    /// Frames whose smoothed judgment was valid
    pub valid_frames: u64,
    /// Sum of per-frame form scores, for the running mean
    pub form_score_sum: f64,
    /// Timestamp of the first frame seen
    pub first_timestamp: Option<u64>,
    /// Timestamp of the last frame seen
    pub last_timestamp: Option<u64>,
}

impl SessionStats {
    /// Fraction of frames judged valid (0 when no frames were seen)
    pub fn coverage(&self) -> f64 {
        if self.frames == 0 {
            return 0.0;
        }
        self.valid_frames as f64 / self.frames as f64
    }

    /// Mean per-frame form score (0 when no frames were seen)
    pub fn mean_form_score(&self) -> f64 {
        if self.frames == 0 {
            return 0.0;
        }
        self.form_score_sum / self.frames as f64
    }

    /// Milliseconds spanned by the frames seen so far
    pub fn duration_ms(&self) -> u64 {
        match (self.first_timestamp, self.last_timestamp) {
            (Some(first), Some(last)) => last.saturating_sub(first),
            _ => 0,
        }
    }

    fn record(&mut self, frame: &Frame, result: &ValidationResult) {
        self.frames += 1;
        if result.is_valid {
            self.valid_frames += 1;
        }
        self.form_score_sum += result.form_score;
        if self.first_timestamp.is_none() {
            self.first_timestamp = Some(frame.timestamp);
        }
        self.last_timestamp = Some(frame.timestamp);
    }
}

/// Validator dispatch, value-like so the processor stays plain data
#[derive(Debug, Clone, Serialize, Deserialize)]
enum Validator {
    PushUp(PushUpValidator),
    ChinUp(ChinUpValidator),
    Plank(PlankValidator),
}

impl Validator {
    fn new(exercise: ExerciseKind) -> Self {
        match exercise {
            ExerciseKind::PushUp => Validator::PushUp(PushUpValidator::new()),
            ExerciseKind::ChinUp => Validator::ChinUp(ChinUpValidator::new()),
            ExerciseKind::Plank => Validator::Plank(PlankValidator::new()),
        }
    }
}

impl ExerciseValidator for Validator {
    fn validate(&mut self, frame: &Frame) -> ValidationResult {
        match self {
            Validator::PushUp(v) => v.validate(frame),
            Validator::ChinUp(v) => v.validate(frame),
            Validator::Plank(v) => v.validate(frame),
        }
    }

    fn reset(&mut self) {
        match self {
            Validator::PushUp(v) => v.reset(),
            Validator::ChinUp(v) => v.reset(),
            Validator::Plank(v) => v.reset(),
        }
    }

    fn rep_count(&self) -> u32 {
        match self {
            Validator::PushUp(v) => v.rep_count(),
            Validator::ChinUp(v) => v.rep_count(),
            Validator::Plank(v) => v.rep_count(),
        }
    }
}

/// Stateful processor for one exercise session.
///
/// Feed frames in arrival order, at most once per logical frame; the
/// processor never calls back into the consuming layer.
#[derive(Debug, Clone)]
pub struct SessionProcessor {
    exercise: ExerciseKind,
    validator: Validator,
    stats: SessionStats,
}

impl SessionProcessor {
    pub fn new(exercise: ExerciseKind) -> Self {
        SessionProcessor {
            exercise,
            validator: Validator::new(exercise),
            stats: SessionStats::default(),
        }
    }

    pub fn exercise(&self) -> ExerciseKind {
        self.exercise
    }

    /// Score one frame and fold it into the session statistics
    pub fn process(&mut self, frame: &Frame) -> ValidationResult {
        let result = self.validator.validate(frame);
        self.stats.record(frame, &result);
        result
    }

    pub fn rep_count(&self) -> u32 {
        self.validator.rep_count()
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Reinitialize the validator and statistics for a fresh session
    pub fn reset(&mut self) {
        self.validator.reset();
        self.stats = SessionStats::default();
    }

    /// Encode the session so far as a summary payload
    pub fn summary(&self) -> SessionSummary {
        SummaryEncoder::encode(self.exercise, &self.stats, self.rep_count())
    }

    /// Encode the session so far as summary JSON
    pub fn summary_json(&self) -> Result<String, EngineError> {
        SummaryEncoder::encode_to_json(self.exercise, &self.stats, self.rep_count())
    }
}

/// Replay a whole frame batch through a fresh validator.
///
/// Convenience wrapper for tooling; interactive callers should hold a
/// [`SessionProcessor`] instead.
pub fn replay_frames(exercise: ExerciseKind, frames: &[Frame]) -> Vec<ValidationResult> {
    let mut processor = SessionProcessor::new(exercise);
    frames.iter().map(|frame| processor.process(frame)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Landmark;
    use pretty_assertions::assert_eq;

    fn low_confidence_frame(timestamp: u64) -> Frame {
        Frame {
            landmarks: vec![Landmark::new(0.5, 0.5, 0.0).with_visibility(0.9); 33],
            confidence: 0.2,
            timestamp,
        }
    }

    #[test]
    fn test_stats_accumulate() {
        let mut processor = SessionProcessor::new(ExerciseKind::PushUp);

        for i in 0..4 {
            let result = processor.process(&low_confidence_frame(i * 33));
            assert!(!result.is_valid);
        }

        let stats = processor.stats();
        assert_eq!(stats.frames, 4);
        assert_eq!(stats.valid_frames, 0);
        assert_eq!(stats.coverage(), 0.0);
        assert_eq!(stats.mean_form_score(), 0.0);
        assert_eq!(stats.duration_ms(), 99);
        assert_eq!(processor.rep_count(), 0);
    }

    #[test]
    fn test_reset_clears_stats_and_validator() {
        let mut processor = SessionProcessor::new(ExerciseKind::Plank);
        processor.process(&low_confidence_frame(0));
        assert_eq!(processor.stats().frames, 1);

        processor.reset();
        assert_eq!(processor.stats().frames, 0);
        assert_eq!(processor.rep_count(), 0);
        assert!(processor.stats().first_timestamp.is_none());
    }

    #[test]
    fn test_replay_matches_incremental() {
        let frames: Vec<Frame> = (0..5).map(|i| low_confidence_frame(i * 33)).collect();

        let replayed = replay_frames(ExerciseKind::ChinUp, &frames);

        let mut processor = SessionProcessor::new(ExerciseKind::ChinUp);
        let incremental: Vec<ValidationResult> =
            frames.iter().map(|f| processor.process(f)).collect();

        assert_eq!(replayed.len(), incremental.len());
        for (a, b) in replayed.iter().zip(incremental.iter()) {
            assert_eq!(a.is_valid, b.is_valid);
            assert_eq!(a.feedback, b.feedback);
            assert_eq!(a.completed_rep, b.completed_rep);
            assert_eq!(a.form_score, b.form_score);
        }
    }

    #[test]
    fn test_empty_stats_are_zero() {
        let stats = SessionStats::default();
        assert_eq!(stats.coverage(), 0.0);
        assert_eq!(stats.mean_form_score(), 0.0);
        assert_eq!(stats.duration_ms(), 0);
    }
}
