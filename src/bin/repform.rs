//! Repform CLI - Command-line interface for the repform engine
//!
//! Commands:
//! - replay: Score a recorded frame batch (batch mode)
//! - run: Score streaming frames from stdin (streaming mode)
//! - validate: Validate frame schema
//! - doctor: Diagnose engine health and configuration
//! - schema: Print schema information

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use repform::schema::{FrameAdapter, SCHEMA_VERSION};
use repform::session::SessionProcessor;
use repform::types::{ExerciseKind, Frame, ValidationResult};
use repform::{ENGINE_VERSION, PRODUCER_NAME, SUMMARY_VERSION};

/// Repform - On-device exercise form validation and rep counting
#[derive(Parser)]
#[command(name = "repform")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Score pose landmark streams for exercise form", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a recorded frame batch (batch mode)
    Replay {
        /// Exercise to validate
        #[arg(short, long)]
        exercise: Exercise,

        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        /// Append the session summary after the per-frame results
        #[arg(long)]
        summary: bool,
    },

    /// Score streaming frames from stdin (streaming mode)
    Run {
        /// Exercise to validate
        #[arg(short, long)]
        exercise: Exercise,

        /// Flush output after each result
        #[arg(long, default_value = "true")]
        flush: bool,

        /// Print the session summary on end of input
        #[arg(long)]
        summary: bool,
    },

    /// Validate frame schema
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose engine health and configuration
    Doctor {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Exercise {
    PushUp,
    ChinUp,
    Plank,
}

impl From<Exercise> for ExerciseKind {
    fn from(e: Exercise) -> Self {
        match e {
            Exercise::PushUp => ExerciseKind::PushUp,
            Exercise::ChinUp => ExerciseKind::ChinUp,
            Exercise::Plank => ExerciseKind::Plank,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one frame per line)
    Ndjson,
    /// JSON array of frames
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one result per line)
    Ndjson,
    /// JSON array of results
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input schema (pose.frame.v1)
    Input,
    /// Output schema (repform.session_summary.v1)
    Output,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), RepformCliError> {
    match cli.command {
        Commands::Replay {
            exercise,
            input,
            output,
            input_format,
            output_format,
            summary,
        } => cmd_replay(exercise, &input, &output, input_format, output_format, summary),

        Commands::Run {
            exercise,
            flush,
            summary,
        } => cmd_run(exercise, flush, summary),

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Doctor { json } => cmd_doctor(json),

        Commands::Schema { schema_type } => cmd_schema(schema_type),
    }
}

fn read_input(input: &PathBuf) -> Result<String, RepformCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn parse_frames(data: &str, format: &InputFormat) -> Result<Vec<Frame>, RepformCliError> {
    let frames = match format {
        InputFormat::Ndjson => FrameAdapter::parse_ndjson(data)?,
        InputFormat::Json => FrameAdapter::parse_array(data)?,
    };
    Ok(frames)
}

fn cmd_replay(
    exercise: Exercise,
    input: &PathBuf,
    output: &PathBuf,
    input_format: InputFormat,
    output_format: OutputFormat,
    summary: bool,
) -> Result<(), RepformCliError> {
    let input_data = read_input(input)?;
    let frames = parse_frames(&input_data, &input_format)?;

    if frames.is_empty() {
        return Err(RepformCliError::NoFrames);
    }

    let failures = FrameAdapter::validate_frames(&frames);
    if !failures.is_empty() {
        return Err(RepformCliError::ValidationFailed(failures.len()));
    }

    let mut processor = SessionProcessor::new(exercise.into());
    let results: Vec<ValidationResult> =
        frames.iter().map(|frame| processor.process(frame)).collect();

    let mut output_data = format_output(&results, &output_format)?;
    if summary {
        output_data.push_str(&serde_json::to_string(&processor.summary())?);
        output_data.push('\n');
    }

    if output.to_string_lossy() == "-" {
        print!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_run(exercise: Exercise, flush: bool, summary: bool) -> Result<(), RepformCliError> {
    let mut processor = SessionProcessor::new(exercise.into());

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = line?;
        let trimmed = line.trim();

        if trimmed.is_empty() {
            continue;
        }

        let frame: Frame = serde_json::from_str(trimmed)
            .map_err(|e| RepformCliError::ParseError(format!("Failed to parse frame: {}", e)))?;
        FrameAdapter::validate(&frame)?;

        let result = processor.process(&frame);
        writeln!(stdout, "{}", serde_json::to_string(&result)?)?;
        if flush {
            stdout.flush()?;
        }
    }

    if summary {
        writeln!(stdout, "{}", serde_json::to_string(&processor.summary())?)?;
        stdout.flush()?;
    }

    Ok(())
}

fn cmd_validate(
    input: &PathBuf,
    input_format: InputFormat,
    json: bool,
) -> Result<(), RepformCliError> {
    let input_data = read_input(input)?;
    let frames = parse_frames(&input_data, &input_format)?;

    let failures = FrameAdapter::validate_frames(&frames);

    let report = ValidationReport {
        total_frames: frames.len(),
        valid_frames: frames.len() - failures.len(),
        invalid_frames: failures.len(),
        errors: failures
            .iter()
            .map(|f| ValidationErrorDetail {
                index: f.index,
                error: f.error.to_string(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total frames:   {}", report.total_frames);
        println!("Valid frames:   {}", report.valid_frames);
        println!("Invalid frames: {}", report.invalid_frames);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!("  - Frame {}: {}", err.index, err.error);
            }
        }
    }

    if report.invalid_frames > 0 {
        Err(RepformCliError::ValidationFailed(report.invalid_frames))
    } else {
        Ok(())
    }
}

fn cmd_doctor(json: bool) -> Result<(), RepformCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "engine_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Repform version {}", ENGINE_VERSION),
    });

    checks.push(DoctorCheck {
        name: "schema_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Input schema: {}", SCHEMA_VERSION),
    });

    checks.push(DoctorCheck {
        name: "exercises".to_string(),
        status: CheckStatus::Ok,
        message: "push_up, chin_up, plank".to_string(),
    });

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (streaming mode ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: ENGINE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Repform Doctor Report");
        println!("=====================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(RepformCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn cmd_schema(schema_type: SchemaType) -> Result<(), RepformCliError> {
    match schema_type {
        SchemaType::Input => {
            println!("Input Schema: {}", SCHEMA_VERSION);
            println!();
            println!("One JSON object per frame:");
            println!();
            println!("- landmarks: Array of up to 33 body points (pose model indices)");
            println!("  - x, y: Normalized image coordinates (0-1, y grows downward)");
            println!("  - z: Relative depth");
            println!("  - visibility: Optional per-point confidence (0-1)");
            println!("- confidence: Whole-frame detection confidence (0-1)");
            println!("- timestamp: Milliseconds, monotone within a session");
        }
        SchemaType::Output => {
            println!("Output Schema: {}", SUMMARY_VERSION);
            println!();
            println!("Per-frame results contain:");
            println!();
            println!("- is_valid: Smoothed form judgment for this frame");
            println!("- feedback: Human-readable coaching cues");
            println!("- completed_rep: True on the frame a rep (or plank milestone) lands");
            println!("- form_score: Fraction of form criteria met (0-1)");
            println!();
            println!("The session summary contains:");
            println!();
            println!("- summary_version: Schema version ({})", SUMMARY_VERSION);
            println!("- producer: {{ name, version, instance_id }}");
            println!("- provenance: {{ exercise, started_at_utc, ended_at_utc, duration_ms }}");
            println!("- quality: {{ frames, valid_frames, coverage, mean_form_score }}");
            println!("- totals: {{ reps }}");
        }
    }

    Ok(())
}

// Helper functions

fn format_output(
    results: &[ValidationResult],
    format: &OutputFormat,
) -> Result<String, RepformCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for result in results {
                lines.push(serde_json::to_string(result)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => Ok(serde_json::to_string(results)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(results)?),
    }
}

// Error types

#[derive(Debug)]
enum RepformCliError {
    Io(io::Error),
    Engine(repform::EngineError),
    Json(serde_json::Error),
    Schema(repform::schema::ValidationError),
    NoFrames,
    ValidationFailed(usize),
    DoctorFailed,
    ParseError(String),
}

impl From<io::Error> for RepformCliError {
    fn from(e: io::Error) -> Self {
        RepformCliError::Io(e)
    }
}

impl From<repform::EngineError> for RepformCliError {
    fn from(e: repform::EngineError) -> Self {
        RepformCliError::Engine(e)
    }
}

impl From<serde_json::Error> for RepformCliError {
    fn from(e: serde_json::Error) -> Self {
        RepformCliError::Json(e)
    }
}

impl From<repform::schema::ValidationError> for RepformCliError {
    fn from(e: repform::schema::ValidationError) -> Self {
        RepformCliError::Schema(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<RepformCliError> for CliError {
    fn from(e: RepformCliError) -> Self {
        match e {
            RepformCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            RepformCliError::Engine(e) => CliError {
                code: "ENGINE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Ensure input matches the pose.frame.v1 schema".to_string()),
            },
            RepformCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            RepformCliError::Schema(e) => CliError {
                code: "VALIDATION_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'repform validate' for details".to_string()),
            },
            RepformCliError::NoFrames => CliError {
                code: "NO_FRAMES".to_string(),
                message: "No frames found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            RepformCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} frames failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            RepformCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
            RepformCliError::ParseError(msg) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: msg,
                hint: Some("Check input format".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_frames: usize,
    valid_frames: usize,
    invalid_frames: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    error: String,
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
