//! pose.frame.v1 input schema
//!
//! Frames arrive from the upstream pose provider as JSON, one object per
//! frame. This module validates their invariants (landmark count, value
//! ranges) and parses NDJSON or JSON-array batches for the replay tooling.

use crate::error::EngineError;
use crate::types::{Frame, MAX_LANDMARKS};

/// Current input schema version
pub const SCHEMA_VERSION: &str = "pose.frame.v1";

/// Schema violations for incoming frames
#[derive(Debug, Clone, thiserror::Error)]
pub enum ValidationError {
    #[error("Too many landmarks: {count} (maximum {MAX_LANDMARKS})")]
    TooManyLandmarks { count: usize },

    #[error("Frame confidence out of range: {value}")]
    ConfidenceOutOfRange { value: f64 },

    #[error("Landmark {index} visibility out of range: {value}")]
    VisibilityOutOfRange { index: usize, value: f64 },
}

/// A frame that failed validation within a batch
#[derive(Debug)]
pub struct InvalidFrame {
    /// Position of the frame within the parsed batch
    pub index: usize,
    pub error: ValidationError,
}

/// Parses and validates frame batches
pub struct FrameAdapter;

impl FrameAdapter {
    /// Parse newline-delimited JSON, one frame per line. Blank lines are
    /// skipped.
    pub fn parse_ndjson(input: &str) -> Result<Vec<Frame>, EngineError> {
        let mut frames = Vec::new();
        for (line_no, line) in input.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let frame: Frame = serde_json::from_str(trimmed).map_err(|e| {
                EngineError::ParseError(format!("line {}: {}", line_no + 1, e))
            })?;
            frames.push(frame);
        }
        Ok(frames)
    }

    /// Parse a JSON array of frames
    pub fn parse_array(input: &str) -> Result<Vec<Frame>, EngineError> {
        let frames: Vec<Frame> = serde_json::from_str(input)?;
        Ok(frames)
    }

    /// Validate a single frame against the schema invariants
    pub fn validate(frame: &Frame) -> Result<(), ValidationError> {
        if frame.landmarks.len() > MAX_LANDMARKS {
            return Err(ValidationError::TooManyLandmarks {
                count: frame.landmarks.len(),
            });
        }
        if !(0.0..=1.0).contains(&frame.confidence) {
            return Err(ValidationError::ConfidenceOutOfRange {
                value: frame.confidence,
            });
        }
        for (index, landmark) in frame.landmarks.iter().enumerate() {
            if let Some(visibility) = landmark.visibility {
                if !(0.0..=1.0).contains(&visibility) {
                    return Err(ValidationError::VisibilityOutOfRange { index, value: visibility });
                }
            }
        }
        Ok(())
    }

    /// Validate a batch, collecting every failure with its frame index
    pub fn validate_frames(frames: &[Frame]) -> Vec<InvalidFrame> {
        frames
            .iter()
            .enumerate()
            .filter_map(|(index, frame)| {
                Self::validate(frame)
                    .err()
                    .map(|error| InvalidFrame { index, error })
            })
            .collect()
    }
}
