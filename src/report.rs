//! Session summary encoding
//!
//! Encodes the outcome of a session as a versioned JSON payload for the
//! consuming app: producer identity, provenance of the frame stream,
//! quality aggregates, and the rep/milestone totals. Timestamps are the
//! caller-supplied frame timestamps formatted as RFC 3339; the encoder
//! never reads a live clock.

use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::session::SessionStats;
use crate::types::ExerciseKind;
use crate::{ENGINE_VERSION, PRODUCER_NAME};

/// Summary payload schema version
pub const SUMMARY_VERSION: &str = "repform.session_summary.v1";

/// Identity of the engine that produced the summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Where the scored frame stream came from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryProvenance {
    pub exercise: String,
    /// First frame timestamp, RFC 3339
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at_utc: Option<String>,
    /// Last frame timestamp, RFC 3339
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at_utc: Option<String>,
    /// Milliseconds spanned by the session's frames
    pub duration_ms: u64,
}

/// Quality aggregates over the session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryQuality {
    pub frames: u64,
    pub valid_frames: u64,
    /// Fraction of frames judged valid (0-1)
    pub coverage: f64,
    /// Mean per-frame form score (0-1)
    pub mean_form_score: f64,
}

/// Rep and milestone totals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryTotals {
    pub reps: u32,
}

/// Complete session summary payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub summary_version: String,
    pub producer: SummaryProducer,
    pub provenance: SummaryProvenance,
    pub quality: SummaryQuality,
    pub totals: SummaryTotals,
}

/// Encoder for session summaries
pub struct SummaryEncoder;

impl SummaryEncoder {
    pub fn encode(exercise: ExerciseKind, stats: &SessionStats, reps: u32) -> SessionSummary {
        SessionSummary {
            summary_version: SUMMARY_VERSION.to_string(),
            producer: SummaryProducer {
                name: PRODUCER_NAME.to_string(),
                version: ENGINE_VERSION.to_string(),
                instance_id: uuid::Uuid::new_v4().to_string(),
            },
            provenance: SummaryProvenance {
                exercise: exercise.as_str().to_string(),
                started_at_utc: stats.first_timestamp.and_then(format_timestamp),
                ended_at_utc: stats.last_timestamp.and_then(format_timestamp),
                duration_ms: stats.duration_ms(),
            },
            quality: SummaryQuality {
                frames: stats.frames,
                valid_frames: stats.valid_frames,
                coverage: stats.coverage(),
                mean_form_score: stats.mean_form_score(),
            },
            totals: SummaryTotals { reps },
        }
    }

    pub fn encode_to_json(
        exercise: ExerciseKind,
        stats: &SessionStats,
        reps: u32,
    ) -> Result<String, EngineError> {
        let summary = Self::encode(exercise, stats, reps);
        Ok(serde_json::to_string(&summary)?)
    }
}

/// Epoch milliseconds to RFC 3339, None for unrepresentable values
fn format_timestamp(ms: u64) -> Option<String> {
    let signed = i64::try_from(ms).ok()?;
    DateTime::from_timestamp_millis(signed).map(|dt| dt.to_rfc3339())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_stats() -> SessionStats {
        SessionStats {
            frames: 100,
            valid_frames: 80,
            form_score_sum: 75.0,
            first_timestamp: Some(1_705_312_800_000), // 2024-01-15T10:00:00Z
            last_timestamp: Some(1_705_312_860_000),
        }
    }

    #[test]
    fn test_encode_summary() {
        let summary = SummaryEncoder::encode(ExerciseKind::PushUp, &make_stats(), 12);

        assert_eq!(summary.summary_version, SUMMARY_VERSION);
        assert_eq!(summary.producer.name, "repform");
        assert_eq!(summary.provenance.exercise, "push_up");
        assert_eq!(summary.provenance.duration_ms, 60_000);
        assert_eq!(summary.quality.coverage, 0.8);
        assert_eq!(summary.quality.mean_form_score, 0.75);
        assert_eq!(summary.totals.reps, 12);
    }

    #[test]
    fn test_timestamps_are_rfc3339() {
        let summary = SummaryEncoder::encode(ExerciseKind::Plank, &make_stats(), 2);
        let started = summary.provenance.started_at_utc.unwrap();
        assert!(started.starts_with("2024-01-15T10:00:00"));
    }

    #[test]
    fn test_encode_empty_session() {
        let summary = SummaryEncoder::encode(ExerciseKind::ChinUp, &SessionStats::default(), 0);
        assert!(summary.provenance.started_at_utc.is_none());
        assert_eq!(summary.quality.coverage, 0.0);
        assert_eq!(summary.totals.reps, 0);
    }

    #[test]
    fn test_json_roundtrip() {
        let json = SummaryEncoder::encode_to_json(ExerciseKind::PushUp, &make_stats(), 5).unwrap();
        let payload: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(payload["summary_version"], SUMMARY_VERSION);
        assert_eq!(payload["producer"]["name"], "repform");
        assert_eq!(payload["totals"]["reps"], 5);
        assert_eq!(payload["quality"]["valid_frames"], 80);
    }
}
