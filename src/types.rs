//! Core types for the repform engine
//!
//! This module defines the data that flows through the engine: pose frames
//! coming in from an upstream landmark provider, and the per-frame
//! validation result handed to the session/game layer.

use serde::{Deserialize, Serialize};

/// Maximum number of landmarks in a frame (full-body pose topology)
pub const MAX_LANDMARKS: usize = 33;

// Landmark indices are fixed semantic positions and must never be reassigned.
pub const NOSE: usize = 0;
pub const LEFT_SHOULDER: usize = 11;
pub const RIGHT_SHOULDER: usize = 12;
pub const LEFT_ELBOW: usize = 13;
pub const RIGHT_ELBOW: usize = 14;
pub const LEFT_WRIST: usize = 15;
pub const RIGHT_WRIST: usize = 16;
pub const LEFT_HIP: usize = 23;
pub const RIGHT_HIP: usize = 24;
pub const LEFT_KNEE: usize = 25;
pub const RIGHT_KNEE: usize = 26;
pub const LEFT_ANKLE: usize = 27;
pub const RIGHT_ANKLE: usize = 28;

/// Landmark subset used for multi-frame stability scoring
pub const KEY_LANDMARKS: [usize; 7] = [
    NOSE,
    LEFT_SHOULDER,
    RIGHT_SHOULDER,
    LEFT_HIP,
    RIGHT_HIP,
    LEFT_ANKLE,
    RIGHT_ANKLE,
];

/// Exercise types the engine can score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
    PushUp,
    ChinUp,
    Plank,
}

impl ExerciseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseKind::PushUp => "push_up",
            ExerciseKind::ChinUp => "chin_up",
            ExerciseKind::Plank => "plank",
        }
    }

    /// Parse an exercise name as used on the CLI/FFI surface.
    /// Accepts snake_case and hyphenated spellings.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().replace('-', "_").as_str() {
            "push_up" | "pushup" => Some(ExerciseKind::PushUp),
            "chin_up" | "chinup" | "pull_up" | "pullup" => Some(ExerciseKind::ChinUp),
            "plank" => Some(ExerciseKind::Plank),
            _ => None,
        }
    }
}

/// A single estimated body-joint position in normalized image space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    /// Horizontal position (0-1, left to right)
    pub x: f64,
    /// Vertical position (0-1, top to bottom; smaller y = higher in image)
    pub y: f64,
    /// Relative depth
    pub z: f64,
    /// Detection confidence for this landmark (0-1), if the provider emits one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f64>,
}

impl Landmark {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Landmark {
            x,
            y,
            z,
            visibility: None,
        }
    }

    pub fn with_visibility(mut self, visibility: f64) -> Self {
        self.visibility = Some(visibility);
        self
    }
}

/// One timestamped snapshot of all landmarks plus an overall detection confidence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    /// Up to 33 fixed-index landmarks
    pub landmarks: Vec<Landmark>,
    /// Overall per-frame detection confidence (0-1)
    pub confidence: f64,
    /// Frame timestamp in milliseconds; all engine timing derives from this,
    /// never from a live clock
    pub timestamp: u64,
}

impl Frame {
    /// Landmark at a fixed semantic index, if present in this frame
    pub fn landmark(&self, index: usize) -> Option<&Landmark> {
        self.landmarks.get(index)
    }
}

/// Per-frame judgment consumed by the downstream session/game layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Smoothed pass/fail over the recent validation history
    pub is_valid: bool,
    /// Corrective cues in detection order; duplicates allowed
    pub feedback: Vec<String>,
    /// One-shot: true only on the frame where a rep/milestone completed
    pub completed_rep: bool,
    /// Fraction of form criteria satisfied this frame (0-1)
    pub form_score: f64,
}

impl ValidationResult {
    /// Sentinel result for frames the engine refuses to score.
    /// Carries a single corrective cue and leaves all validator state untouched.
    pub fn invalid(feedback: impl Into<String>) -> Self {
        ValidationResult {
            is_valid: false,
            feedback: vec![feedback.into()],
            completed_rep: false,
            form_score: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exercise_kind_parse() {
        assert_eq!(ExerciseKind::parse("push_up"), Some(ExerciseKind::PushUp));
        assert_eq!(ExerciseKind::parse("Push-Up"), Some(ExerciseKind::PushUp));
        assert_eq!(ExerciseKind::parse("chinup"), Some(ExerciseKind::ChinUp));
        assert_eq!(ExerciseKind::parse("plank"), Some(ExerciseKind::Plank));
        assert_eq!(ExerciseKind::parse("burpee"), None);
    }

    #[test]
    fn test_frame_landmark_lookup() {
        let mut landmarks = vec![Landmark::new(0.0, 0.0, 0.0); 12];
        landmarks[NOSE] = Landmark::new(0.5, 0.2, 0.0).with_visibility(0.9);
        let frame = Frame {
            landmarks,
            confidence: 0.9,
            timestamp: 0,
        };

        assert_eq!(frame.landmark(NOSE).unwrap().visibility, Some(0.9));
        assert!(frame.landmark(RIGHT_SHOULDER).is_none());
    }

    #[test]
    fn test_landmark_serde_roundtrip() {
        let lm = Landmark::new(0.1, 0.2, 0.3);
        let json = serde_json::to_string(&lm).unwrap();
        // Visibility is optional and omitted when absent
        assert!(!json.contains("visibility"));

        let parsed: Landmark = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, lm);
    }

    #[test]
    fn test_invalid_sentinel() {
        let result = ValidationResult::invalid("get in frame");
        assert!(!result.is_valid);
        assert!(!result.completed_rep);
        assert_eq!(result.form_score, 0.0);
        assert_eq!(result.feedback, vec!["get in frame".to_string()]);
    }
}
