//! Tourcast CLI - Command-line interface for Tourcast Survey
//!
//! Commands:
//! - encode: Encode submitted surveys into feature records (batch mode)
//! - decode: Decode prediction responses into ranked places
//! - validate: Validate survey response schema
//! - schema: Print schema information
//! - doctor: Diagnose codec health and configuration

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tourcast_survey::decoder::RecommendationDecoder;
use tourcast_survey::encoder::{FeatureEncoder, UnknownLabelPolicy};
use tourcast_survey::schema::{SurveyResponseAdapter, SCHEMA_ARITY, SCHEMA_VERSION};
use tourcast_survey::tables::EncoderTables;
use tourcast_survey::types::{FeatureEnvelope, FeatureRecord};
use tourcast_survey::{PRODUCER_NAME, TOURCAST_VERSION};

/// Tourcast - Survey answer codec for travel recommendations
#[derive(Parser)]
#[command(name = "tourcast")]
#[command(author = "Tourcast Labs")]
#[command(version = TOURCAST_VERSION)]
#[command(about = "Encode survey answers into prediction-ready features", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode submitted surveys into feature records (batch mode)
    Encode {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long)]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        /// Unknown-label policy
        #[arg(long, default_value = "default")]
        policy: PolicyArg,

        /// Emit bare feature records instead of survey.features.v1 envelopes
        #[arg(long)]
        bare: bool,
    },

    /// Decode prediction responses into ranked places
    Decode {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long)]
        output: PathBuf,

        /// Keep only the N best places
        #[arg(long)]
        top: Option<usize>,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,
    },

    /// Validate survey response schema
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,

        /// Output as JSON schema
        #[arg(long)]
        json_schema: bool,
    },

    /// Diagnose codec health and configuration
    Doctor {
        /// Sample survey response file to dry-run through the encoder
        #[arg(long)]
        sample: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// JSON envelope or JSON array of envelopes
    Json,
    /// Newline-delimited JSON (one envelope per line)
    Ndjson,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one record per line)
    Ndjson,
    /// JSON array
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, ValueEnum)]
enum PolicyArg {
    /// Substitute field defaults for unknown labels
    Default,
    /// Reject responses carrying unknown labels
    Reject,
}

impl From<PolicyArg> for UnknownLabelPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Default => UnknownLabelPolicy::Default,
            PolicyArg::Reject => UnknownLabelPolicy::Reject,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input schema (survey.response.v1)
    Input,
    /// Output schema (survey.features.v1)
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

fn run(cli: Cli) -> Result<(), TourcastCliError> {
    match cli.command {
        Commands::Encode {
            input,
            output,
            input_format,
            output_format,
            policy,
            bare,
        } => cmd_encode(&input, &output, input_format, output_format, policy, bare),

        Commands::Decode {
            input,
            output,
            top,
            output_format,
        } => cmd_decode(&input, &output, top, output_format),

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Schema {
            schema_type,
            json_schema,
        } => cmd_schema(schema_type, json_schema),

        Commands::Doctor { sample, json } => cmd_doctor(sample.as_deref(), json),
    }
}

fn cmd_encode(
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
    policy: PolicyArg,
    bare: bool,
) -> Result<(), TourcastCliError> {
    let input_data = read_input(input)?;

    let responses = match input_format {
        InputFormat::Json => SurveyResponseAdapter::parse_array(&input_data)?,
        InputFormat::Ndjson => SurveyResponseAdapter::parse_ndjson(&input_data)?,
    };

    if responses.is_empty() {
        return Err(TourcastCliError::NoResponses);
    }

    let encoder = FeatureEncoder::new().with_policy(policy.into());

    let mut envelopes: Vec<FeatureEnvelope> = Vec::with_capacity(responses.len());
    for response in &responses {
        envelopes.push(encoder.encode_response(response)?);
    }

    let output_data = if bare {
        let records: Vec<&FeatureRecord> = envelopes.iter().map(|e| &e.features).collect();
        format_output(&records, &output_format)?
    } else {
        format_output(&envelopes, &output_format)?
    };

    write_output(output, &output_data)
}

fn cmd_decode(
    input: &Path,
    output: &Path,
    top: Option<usize>,
    output_format: OutputFormat,
) -> Result<(), TourcastCliError> {
    let input_data = read_input(input)?;

    let mut decoder = RecommendationDecoder::new();
    if let Some(top_n) = top {
        decoder = decoder.with_top_n(top_n);
    }

    let places = decoder.decode_json(&input_data)?;
    let output_data = format_output(&places, &output_format)?;

    write_output(output, &output_data)
}

fn cmd_validate(
    input: &Path,
    input_format: InputFormat,
    json: bool,
) -> Result<(), TourcastCliError> {
    let input_data = read_input(input)?;

    let responses = match input_format {
        InputFormat::Json => SurveyResponseAdapter::parse_array(&input_data)?,
        InputFormat::Ndjson => SurveyResponseAdapter::parse_ndjson(&input_data)?,
    };

    let findings = SurveyResponseAdapter::validate_all(&responses);

    let report = ValidationReport {
        total_responses: responses.len(),
        valid_responses: responses.len() - findings.len(),
        invalid_responses: findings.len(),
        errors: findings
            .iter()
            .map(|f| ValidationErrorDetail {
                index: f.index,
                response_id: f.response_id.clone(),
                error: f.error.to_string(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total responses:   {}", report.total_responses);
        println!("Valid responses:   {}", report.valid_responses);
        println!("Invalid responses: {}", report.invalid_responses);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!(
                    "  - Response {} (index {}): {}",
                    err.response_id.as_deref().unwrap_or("unknown"),
                    err.index,
                    err.error
                );
            }
        }
    }

    if report.invalid_responses > 0 {
        Err(TourcastCliError::ValidationFailed(report.invalid_responses))
    } else {
        Ok(())
    }
}

fn cmd_schema(schema_type: SchemaType, json_schema: bool) -> Result<(), TourcastCliError> {
    match schema_type {
        SchemaType::Input => {
            if json_schema {
                println!("{}", get_input_json_schema());
            } else {
                println!("Input Schema: {}", SCHEMA_VERSION);
                println!();
                println!("A submitted survey envelope with {} position-significant answers:", SCHEMA_ARITY);
                println!();
                println!("  0. residence        - region/city name (open set)");
                println!("  1. gender           - 남성 | 여성");
                println!("  2. age bracket      - 10대 .. 70대 이상");
                println!("  3. companions       - 혼자 | 1명 .. 10명 | 11명 이상");
                println!("  4. travel styles    - one label, \"a;b\" joined, or an array");
                println!("  5. trip duration    - 당일치기 | 1박2일 | 2박3일 | 3박4일 | 그 이상");
                println!("  6. transport        - 자가용 | 기차 | 고속/시외버스 | 비행기 | 배/선박 | 버스+지하철");
                println!("  7. budget           - 10만원 이하 .. 100만원 이상");
                println!();
                println!("Envelope fields: schema_version (required), response_id,");
                println!("submitted_at (required, RFC3339), channel (web|mobile|kiosk|import),");
                println!("answers (required, at most {} entries).", SCHEMA_ARITY);
                println!();
                println!("Batch forms: JSON array of envelopes, or NDJSON (one per line).");
            }
        }
        SchemaType::Output => {
            if json_schema {
                println!("{}", get_output_json_schema());
            } else {
                println!("Output Schema: survey.features.v1");
                println!();
                println!("A feature envelope contains:");
                println!();
                println!("- feature_version: Schema version (1.0.0)");
                println!("- producer: {{ name, version, instance_id }}");
                println!("- provenance: {{ response_id, submitted_at_utc, computed_at_utc, model_region }}");
                println!("- quality: {{ coverage, fallbacks: [{{ field, reason }}] }}");
                println!("- features: the prediction-service record:");
                println!("  - LOTNO_ADDR: residence (string)");
                println!("  - GENDER: 남 | 여");
                println!("  - AGE_GRP: 10..70");
                println!("  - TRAVEL_COMPANIONS_NUM: 0..11");
                println!("  - TRAVEL_PURPOSE: semicolon-joined style codes, e.g. \"1;11\"");
                println!("  - Date: trip duration code 1..5");
                println!("  - MVMN_SE_NM: transport code (0..4 or 50)");
                println!("  - PAYMENT_AMT_WON: budget band 1..5");
            }
        }
    }

    Ok(())
}

fn cmd_doctor(sample: Option<&Path>, json: bool) -> Result<(), TourcastCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "tourcast_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Tourcast Survey version {}", TOURCAST_VERSION),
    });

    checks.push(DoctorCheck {
        name: "schema_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Input schema: {}", SCHEMA_VERSION),
    });

    // Table integrity: the built-in tables carry fixed contracts.
    let tables = EncoderTables::builtin();
    let tables_ok =
        tables.style_count() == 24 && tables.category_count() == 8 && tables.region_count() == 17;
    checks.push(DoctorCheck {
        name: "lookup_tables".to_string(),
        status: if tables_ok {
            CheckStatus::Ok
        } else {
            CheckStatus::Error
        },
        message: format!(
            "{} styles, {} categories, {} region routes",
            tables.style_count(),
            tables.category_count(),
            tables.region_count()
        ),
    });

    // Dry-run a sample response through the encoder if provided
    if let Some(sample_path) = sample {
        if sample_path.exists() {
            match fs::read_to_string(sample_path) {
                Ok(content) => match dry_run_sample(&content) {
                    Ok(coverage) => {
                        checks.push(DoctorCheck {
                            name: "sample_encode".to_string(),
                            status: CheckStatus::Ok,
                            message: format!("Sample encoded (coverage {:.2})", coverage),
                        });
                    }
                    Err(e) => {
                        checks.push(DoctorCheck {
                            name: "sample_encode".to_string(),
                            status: CheckStatus::Error,
                            message: format!("Sample does not encode: {}", e),
                        });
                    }
                },
                Err(e) => {
                    checks.push(DoctorCheck {
                        name: "sample_encode".to_string(),
                        status: CheckStatus::Error,
                        message: format!("Cannot read sample file: {}", e),
                    });
                }
            }
        } else {
            checks.push(DoctorCheck {
                name: "sample_encode".to_string(),
                status: CheckStatus::Warning,
                message: "Sample file does not exist".to_string(),
            });
        }
    }

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
            message: "stdin is a pipe (batch mode ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: TOURCAST_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Tourcast Doctor Report");
        println!("======================");
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
        Err(TourcastCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn dry_run_sample(content: &str) -> Result<f64, tourcast_survey::CodecError> {
    let response = SurveyResponseAdapter::parse(content)?;
    let envelope = FeatureEncoder::new().encode_response(&response)?;
    Ok(envelope.quality.coverage)
}

// Helper functions

fn read_input(input: &Path) -> Result<String, TourcastCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn write_output(output: &Path, data: &str) -> Result<(), TourcastCliError> {
    if output.to_string_lossy() == "-" {
        print!("{}", data);
        Ok(())
    } else {
        fs::write(output, data)?;
        Ok(())
    }
}

fn format_output<T: serde::Serialize>(
    records: &[T],
    format: &OutputFormat,
) -> Result<String, TourcastCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for record in records {
                lines.push(serde_json::to_string(record)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => Ok(serde_json::to_string(records)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(records)?),
    }
}

fn get_input_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "https://tourcast.dev/schemas/survey.response.v1.json",
        "title": "survey.response.v1",
        "description": "Tourcast submitted survey envelope",
        "type": "object",
        "required": ["schema_version", "submitted_at", "answers"],
        "properties": {
            "schema_version": {
                "type": "string",
                "const": "survey.response.v1"
            },
            "response_id": { "type": "string" },
            "submitted_at": { "type": "string", "format": "date-time" },
            "channel": {
                "type": "string",
                "enum": ["web", "mobile", "kiosk", "import"]
            },
            "answers": {
                "type": "array",
                "maxItems": SCHEMA_ARITY,
                "items": {
                    "oneOf": [
                        { "type": "string" },
                        { "type": "array", "items": { "type": "string" } }
                    ]
                }
            }
        }
    })
    .to_string()
}

fn get_output_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "https://tourcast.dev/schemas/survey.features.v1.json",
        "title": "survey.features.v1",
        "description": "Tourcast feature envelope",
        "type": "object",
        "required": ["feature_version", "producer", "provenance", "quality", "features"],
        "properties": {
            "feature_version": { "type": "string" },
            "producer": {
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "version": { "type": "string" },
                    "instance_id": { "type": "string" }
                }
            },
            "provenance": {
                "type": "object",
                "properties": {
                    "response_id": { "type": "string" },
                    "submitted_at_utc": { "type": "string" },
                    "computed_at_utc": { "type": "string" },
                    "model_region": {
                        "type": ["string", "null"],
                        "enum": ["capital", "west", "east", "jeju", null]
                    }
                }
            },
            "quality": {
                "type": "object",
                "properties": {
                    "coverage": { "type": "number" },
                    "fallbacks": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "field": { "type": "string" },
                                "reason": { "type": "string", "enum": ["unanswered", "unknown_label"] }
                            }
                        }
                    }
                }
            },
            "features": {
                "type": "object",
                "required": [
                    "LOTNO_ADDR", "GENDER", "AGE_GRP", "TRAVEL_COMPANIONS_NUM",
                    "TRAVEL_PURPOSE", "Date", "MVMN_SE_NM", "PAYMENT_AMT_WON"
                ],
                "properties": {
                    "LOTNO_ADDR": { "type": "string" },
                    "GENDER": { "type": "string", "enum": ["남", "여"] },
                    "AGE_GRP": { "type": "integer" },
                    "TRAVEL_COMPANIONS_NUM": { "type": "integer" },
                    "TRAVEL_PURPOSE": { "type": "string" },
                    "Date": { "type": "integer" },
                    "MVMN_SE_NM": { "type": "integer" },
                    "PAYMENT_AMT_WON": { "type": "integer" }
                }
            }
        }
    })
    .to_string()
}

// Error types

#[derive(Debug)]
enum TourcastCliError {
    Io(io::Error),
    Codec(tourcast_survey::CodecError),
    Json(serde_json::Error),
    NoResponses,
    ValidationFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for TourcastCliError {
    fn from(e: io::Error) -> Self {
        TourcastCliError::Io(e)
    }
}

impl From<tourcast_survey::CodecError> for TourcastCliError {
    fn from(e: tourcast_survey::CodecError) -> Self {
        TourcastCliError::Codec(e)
    }
}

impl From<serde_json::Error> for TourcastCliError {
    fn from(e: serde_json::Error) -> Self {
        TourcastCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<TourcastCliError> for CliError {
    fn from(e: TourcastCliError) -> Self {
        match e {
            TourcastCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            TourcastCliError::Codec(e) => CliError {
                code: "CODEC_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Ensure input matches the survey.response.v1 schema".to_string()),
            },
            TourcastCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            TourcastCliError::NoResponses => CliError {
                code: "NO_RESPONSES".to_string(),
                message: "No responses found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            TourcastCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} responses failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            TourcastCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_responses: usize,
    valid_responses: usize,
    invalid_responses: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    response_id: Option<String>,
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
