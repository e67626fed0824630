//! Repform - On-device exercise form validation and rep counting engine
//!
//! Repform scores streams of body pose landmarks, one frame at a time, through
//! a deterministic pipeline: landmark reliability gating → exercise geometry →
//! temporal smoothing → phase tracking → rep/milestone accounting.
//!
//! ## Modules
//!
//! - **Validators**: Per-exercise form judges (push-up, chin-up, plank)
//! - **Session layer**: Stateful processor, statistics, and summary encoding
//!
//! All timing derives from the timestamps carried by the frames themselves;
//! the engine never reads a clock, so replays are reproducible.

pub mod chinup;
pub mod error;
pub mod geometry;
pub mod plank;
pub mod pushup;
pub mod report;
pub mod schema;
pub mod session;
pub mod types;
pub mod validator;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use error::EngineError;
pub use session::{replay_frames, SessionProcessor, SessionStats};
pub use types::{ExerciseKind, Frame, Landmark, ValidationResult};
pub use validator::ExerciseValidator;

// Schema exports
pub use report::{SessionSummary, SUMMARY_VERSION};
pub use schema::{FrameAdapter, SCHEMA_VERSION};

// Validator exports
pub use chinup::ChinUpValidator;
pub use plank::PlankValidator;
pub use pushup::PushUpValidator;

/// Engine version embedded in all summary payloads
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for summary payloads
pub const PRODUCER_NAME: &str = "repform";
