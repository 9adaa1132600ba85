// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use gaitcheck_core::{GaitError, Provenance, RunDiagnostics, RunWarning, Task};
use gaitcheck_extract::GaitTable;
use gaitcheck_spec::SpecificationStore;
use gaitcheck_tune::{Tuner, TuningMethod};
use gaitcheck_validate::{OutlierDetector, ReportBuilder, StepClassifier};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::time::{SystemTime, UNIX_EPOCH};

const FINGERPRINT_HEX_CHARS: usize = 16;

struct Cli {
    command: Command,
}

#[derive(Debug)]
enum Command {
    Validate(ValidateArgs),
    Tune(TuneArgs),
}

#[derive(Debug)]
struct ValidateArgs {
    input: PathBuf,
    spec: PathBuf,
    output: Option<PathBuf>,
    outlier_threshold: Option<f64>,
}

impl Default for ValidateArgs {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            spec: PathBuf::new(),
            output: None,
            outlier_threshold: None,
        }
    }
}

#[derive(Debug)]
struct TuneArgs {
    input: PathBuf,
    method: Option<TuningMethod>,
    task_filter: Option<String>,
    spec: Option<PathBuf>,
    output: PathBuf,
    dataset_name: Option<String>,
}

impl Default for TuneArgs {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            method: None,
            task_filter: None,
            spec: None,
            output: PathBuf::new(),
            dataset_name: None,
        }
    }
}

#[derive(Debug)]
enum CliError {
    Gait(GaitError),
    Io {
        context: String,
        source: std::io::Error,
    },
    InvalidInput(String),
}

impl CliError {
    fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Gait(err) => err.code(),
            Self::Io { .. } => "io_error",
            Self::InvalidInput(_) => "invalid_input",
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gait(err) => write!(f, "{err}"),
            Self::Io { context, source } => write!(f, "{context}: {source}"),
            Self::InvalidInput(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Gait(err) => Some(err),
            Self::Io { source, .. } => Some(source),
            Self::InvalidInput(_) => None,
        }
    }
}

impl From<GaitError> for CliError {
    fn from(value: GaitError) -> Self {
        Self::Gait(value)
    }
}

#[derive(Serialize)]
struct ErrorEnvelope {
    error: ErrorPayload,
}

#[derive(Serialize)]
struct ErrorPayload {
    code: String,
    message: String,
}

fn main() {
    if let Err(err) = run() {
        emit_structured_error(&err);
        process::exit(1);
    }
}

fn run() -> Result<(), CliError> {
    let Some(cli) = parse_cli_from_env()? else {
        return Ok(());
    };

    match cli.command {
        Command::Validate(args) => handle_validate(args),
        Command::Tune(args) => handle_tune(args),
    }
}

fn emit_structured_error(err: &CliError) {
    let envelope = ErrorEnvelope {
        error: ErrorPayload {
            code: err.code().to_string(),
            message: err.to_string(),
        },
    };
    match serde_json::to_string(&envelope) {
        Ok(encoded) => eprintln!("{encoded}"),
        Err(_) => eprintln!("{{\"error\":{{\"code\":\"internal\",\"message\":\"unrenderable\"}}}}"),
    }
}

fn parse_cli_from_env() -> Result<Option<Cli>, CliError> {
    let args = env::args().skip(1).collect::<Vec<_>>();
    parse_cli(args.as_slice())
}

fn parse_cli(args: &[String]) -> Result<Option<Cli>, CliError> {
    if args.is_empty() {
        print_root_help();
        return Ok(None);
    }

    if matches!(args[0].as_str(), "-h" | "--help") {
        print_root_help();
        return Ok(None);
    }
    if matches!(args[0].as_str(), "-V" | "--version") {
        print_version();
        return Ok(None);
    }

    let command_name = args[0].clone();
    let rest = &args[1..];

    if rest
        .iter()
        .any(|arg| matches!(arg.as_str(), "-h" | "--help"))
    {
        print_command_help(command_name.as_str())?;
        return Ok(None);
    }
    if rest
        .iter()
        .any(|arg| matches!(arg.as_str(), "-V" | "--version"))
    {
        print_version();
        return Ok(None);
    }

    let command = match command_name.as_str() {
        "validate" => Command::Validate(parse_validate_args(rest)?),
        "tune" => Command::Tune(parse_tune_args(rest)?),
        _ => {
            return Err(CliError::invalid_input(format!(
                "unknown command '{command_name}'; expected one of: validate, tune"
            )));
        }
    };

    Ok(Some(Cli { command }))
}

fn parse_validate_args(tokens: &[String]) -> Result<ValidateArgs, CliError> {
    let mut args = ValidateArgs::default();
    let mut idx = 0usize;
    while idx < tokens.len() {
        let (flag, inline_value) = split_flag(tokens[idx].as_str())?;
        match flag {
            "--input" => {
                let raw = take_flag_value(flag, inline_value, tokens, &mut idx)?;
                args.input = PathBuf::from(raw);
            }
            "--spec" => {
                let raw = take_flag_value(flag, inline_value, tokens, &mut idx)?;
                args.spec = PathBuf::from(raw);
            }
            "--output" => {
                let raw = take_flag_value(flag, inline_value, tokens, &mut idx)?;
                args.output = Some(PathBuf::from(raw));
            }
            "--outlier-threshold" => {
                let raw = take_flag_value(flag, inline_value, tokens, &mut idx)?;
                args.outlier_threshold = Some(parse_f64_arg(raw.as_str(), flag)?);
            }
            other => {
                return Err(CliError::invalid_input(format!(
                    "unknown validate option '{other}'"
                )));
            }
        }
        idx += 1;
    }

    if args.input.as_os_str().is_empty() {
        return Err(CliError::invalid_input("validate requires --input <path>"));
    }
    if args.spec.as_os_str().is_empty() {
        return Err(CliError::invalid_input("validate requires --spec <path>"));
    }

    Ok(args)
}

fn parse_tune_args(tokens: &[String]) -> Result<TuneArgs, CliError> {
    let mut args = TuneArgs::default();
    let mut idx = 0usize;
    while idx < tokens.len() {
        let (flag, inline_value) = split_flag(tokens[idx].as_str())?;
        match flag {
            "--input" => {
                let raw = take_flag_value(flag, inline_value, tokens, &mut idx)?;
                args.input = PathBuf::from(raw);
            }
            "--method" => {
                let raw = take_flag_value(flag, inline_value, tokens, &mut idx)?;
                args.method = Some(TuningMethod::parse(raw.as_str())?);
            }
            "--task" => {
                let raw = take_flag_value(flag, inline_value, tokens, &mut idx)?;
                args.task_filter = Some(raw);
            }
            "--spec" => {
                let raw = take_flag_value(flag, inline_value, tokens, &mut idx)?;
                args.spec = Some(PathBuf::from(raw));
            }
            "--output" => {
                let raw = take_flag_value(flag, inline_value, tokens, &mut idx)?;
                args.output = PathBuf::from(raw);
            }
            "--dataset-name" => {
                let raw = take_flag_value(flag, inline_value, tokens, &mut idx)?;
                args.dataset_name = Some(raw);
            }
            other => {
                return Err(CliError::invalid_input(format!(
                    "unknown tune option '{other}'"
                )));
            }
        }
        idx += 1;
    }

    if args.input.as_os_str().is_empty() {
        return Err(CliError::invalid_input("tune requires --input <path>"));
    }
    if args.method.is_none() {
        return Err(CliError::invalid_input("tune requires --method <name>"));
    }
    if args.output.as_os_str().is_empty() {
        return Err(CliError::invalid_input("tune requires --output <path>"));
    }

    Ok(args)
}

fn split_flag(token: &str) -> Result<(&str, Option<String>), CliError> {
    if !token.starts_with("--") {
        return Err(CliError::invalid_input(format!(
            "unexpected positional argument '{token}'; expected --flag value"
        )));
    }
    if let Some((flag, value)) = token.split_once('=') {
        return Ok((flag, Some(value.to_string())));
    }
    Ok((token, None))
}

fn take_flag_value(
    flag: &str,
    inline_value: Option<String>,
    tokens: &[String],
    idx: &mut usize,
) -> Result<String, CliError> {
    if let Some(value) = inline_value {
        return Ok(value);
    }

    *idx += 1;
    let value = tokens
        .get(*idx)
        .ok_or_else(|| CliError::invalid_input(format!("{flag} requires a value")))?;
    if value.starts_with("--") {
        return Err(CliError::invalid_input(format!(
            "{flag} requires a value, but got option '{value}'"
        )));
    }
    Ok(value.clone())
}

fn parse_f64_arg(raw: &str, flag: &str) -> Result<f64, CliError> {
    raw.parse::<f64>()
        .map_err(|_| CliError::invalid_input(format!("{flag} expects a number, got '{raw}'")))
}

fn print_version() {
    println!("gaitcheck {}", env!("CARGO_PKG_VERSION"));
}

fn print_root_help() {
    println!(
        "gaitcheck {}\n\nUSAGE:\n  gaitcheck <COMMAND> [OPTIONS]\n\nCOMMANDS:\n  validate   Classify every gait cycle of a dataset against a range spec\n  tune       Derive specification ranges from a dataset statistically\n\nGLOBAL OPTIONS:\n  -h, --help      Show help\n  -V, --version   Show version\n\nRun 'gaitcheck <COMMAND> --help' for subcommand options.",
        env!("CARGO_PKG_VERSION")
    );
}

fn print_command_help(command: &str) -> Result<(), CliError> {
    match command {
        "validate" => {
            println!(
                "USAGE:\n  gaitcheck validate --input <table.csv> --spec <spec.txt> [OPTIONS]\n\nOPTIONS:\n  --input <path>                 Required phase-normalized gait table (.csv)\n  --spec <path>                  Required validation range spec\n  --output <path>                Write the markdown report to a file (default: stdout)\n  --outlier-threshold <float>    Outlier flagging threshold in group stds (default: 2.0)"
            );
            Ok(())
        }
        "tune" => {
            println!(
                "USAGE:\n  gaitcheck tune --input <table.csv> --method <name> --output <spec.txt> [OPTIONS]\n\nOPTIONS:\n  --input <path>            Required phase-normalized gait table (.csv)\n  --method <name>           Required: percentile_95 | mean_3std | mean_2std |\n                            iqr_expansion | minmax_margin | mad_estimate\n  --task <name>             Only tune this task\n  --spec <path>             Existing spec to merge the tuned blocks into\n  --output <path>           Required destination spec file\n  --dataset-name <label>    Provenance label (default: sha256 fingerprint of --input)"
            );
            Ok(())
        }
        _ => Err(CliError::invalid_input(format!(
            "unknown command '{command}'; expected one of: validate, tune"
        ))),
    }
}

fn handle_validate(args: ValidateArgs) -> Result<(), CliError> {
    let table = GaitTable::load(args.input.as_path())?;
    let store = SpecificationStore::load(args.spec.as_path())?;
    let detector = match args.outlier_threshold {
        Some(threshold) => OutlierDetector::new(threshold)?,
        None => OutlierDetector::default(),
    };
    let classifier = StepClassifier::new(&store);

    let mut builder = ReportBuilder::new();
    let mut diagnostics = RunDiagnostics::default();
    diagnostics
        .notes
        .push("checkpoint-only validation (4 of 150 samples per cycle)".to_string());

    for (span, extracted) in table.groups() {
        diagnostics.groups_seen += 1;
        let cycles = match extracted {
            Ok(cycles) => cycles,
            Err(err) if err.is_recoverable() => {
                diagnostics.groups_skipped += 1;
                diagnostics.warn(RunWarning::group_skipped(err.to_string()));
                continue;
            }
            Err(err) => return Err(err.into()),
        };
        diagnostics.cycles_seen += cycles.n_cycles();

        let outcome = classifier.classify(&cycles)?;
        builder.add_all(&outcome.results);
        builder.warn_all(outcome.warnings);

        for cycle in detector.find_outliers(&cycles) {
            builder.warn(RunWarning::outlier_cycle(format!(
                "subject '{}', task '{}', cycle {cycle} deviates from the group mean pattern \
                 by more than {} stds",
                span.subject,
                span.task,
                detector.threshold()
            )));
        }
    }

    let text = builder.finish(diagnostics).render_markdown();
    write_text_output(text.as_str(), args.output.as_deref())
}

fn handle_tune(args: TuneArgs) -> Result<(), CliError> {
    let Some(method) = args.method else {
        return Err(CliError::invalid_input("tune requires --method <name>"));
    };
    let table = GaitTable::load(args.input.as_path())?;
    let mut store = match args.spec.as_deref() {
        Some(path) => SpecificationStore::load(path)?,
        None => SpecificationStore::new(),
    };

    let dataset = match args.dataset_name {
        Some(label) => label,
        None => fingerprint_file(args.input.as_path())?,
    };
    let generated_at_unix = unix_now();

    let mut per_task: BTreeMap<String, Vec<gaitcheck_core::CycleSet>> = BTreeMap::new();
    for (span, extracted) in table.groups() {
        if args
            .task_filter
            .as_deref()
            .is_some_and(|filter| filter != span.task)
        {
            continue;
        }
        match extracted {
            Ok(cycles) => per_task.entry(span.task.clone()).or_default().push(cycles),
            Err(err) if err.is_recoverable() => {
                eprintln!("warning: {err}");
            }
            Err(err) => return Err(err.into()),
        }
    }

    if per_task.is_empty() {
        return Err(CliError::invalid_input(match args.task_filter {
            Some(filter) => format!("no usable cycles for task '{filter}' in the input table"),
            None => "no usable cycles in the input table".to_string(),
        }));
    }

    let tuner = Tuner::new(method);
    let tuned_tasks = per_task.len();
    for (task_name, sets) in per_task {
        let ranges = tuner.tune_pooled(sets.as_slice())?;
        // An existing block's classification survives retuning; only the
        // ranges and provenance are replaced.
        let task = match store.task(task_name.as_str()) {
            Some(existing) => existing.task.clone(),
            None => Task::new(task_name.as_str())?,
        };
        store.upsert_task_ranges(
            task,
            ranges,
            Provenance {
                dataset: dataset.clone(),
                method: method.as_str().to_string(),
                generated_at_unix,
            },
        );
    }

    store.write(args.output.as_path())?;
    println!(
        "tuned {tuned_tasks} task(s) with {} into '{}'",
        method.as_str(),
        args.output.display()
    );
    Ok(())
}

/// Short sha256 fingerprint of the input file, used as the default
/// provenance dataset label.
fn fingerprint_file(path: &Path) -> Result<String, CliError> {
    let bytes = fs::read(path)
        .map_err(|source| CliError::io(format!("failed to read '{}'", path.display()), source))?;
    let digest = Sha256::digest(bytes.as_slice());
    let mut hex = String::with_capacity(FINGERPRINT_HEX_CHARS);
    for byte in digest.iter().take(FINGERPRINT_HEX_CHARS / 2) {
        let _ = std::fmt::Write::write_fmt(&mut hex, format_args!("{byte:02x}"));
    }
    Ok(format!("sha256:{hex}"))
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

fn write_text_output(text: &str, output: Option<&Path>) -> Result<(), CliError> {
    match output {
        Some(path) => fs::write(path, text).map_err(|source| {
            CliError::io(format!("failed to write '{}'", path.display()), source)
        }),
        None => {
            print!("{text}");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Cli, CliError, Command, parse_cli};
    use gaitcheck_core::GaitError;
    use gaitcheck_tune::TuningMethod;

    fn to_args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|arg| arg.to_string()).collect()
    }

    fn parse_command(raw: &[&str]) -> Result<Command, CliError> {
        let Cli { command } = parse_cli(&to_args(raw))?.expect("command should not be help/version");
        Ok(command)
    }

    #[test]
    fn parses_validate_with_all_flags() {
        let command = parse_command(&[
            "validate",
            "--input",
            "data.csv",
            "--spec=ranges.txt",
            "--output",
            "report.md",
            "--outlier-threshold",
            "2.5",
        ])
        .expect("validate args should parse");

        let Command::Validate(args) = command else {
            panic!("expected validate command");
        };
        assert_eq!(args.input.to_str(), Some("data.csv"));
        assert_eq!(args.spec.to_str(), Some("ranges.txt"));
        assert_eq!(args.output.as_deref().and_then(|p| p.to_str()), Some("report.md"));
        assert_eq!(args.outlier_threshold, Some(2.5));
    }

    #[test]
    fn validate_requires_input_and_spec() {
        let err = parse_command(&["validate", "--spec", "ranges.txt"])
            .expect_err("missing input must fail");
        assert!(err.to_string().contains("requires --input"));

        let err = parse_command(&["validate", "--input", "data.csv"])
            .expect_err("missing spec must fail");
        assert!(err.to_string().contains("requires --spec"));
    }

    #[test]
    fn parses_tune_with_method_and_filter() {
        let command = parse_command(&[
            "tune",
            "--input",
            "data.csv",
            "--method",
            "iqr_expansion",
            "--task",
            "level_walking",
            "--output",
            "ranges.txt",
            "--dataset-name",
            "umich_2021",
        ])
        .expect("tune args should parse");

        let Command::Tune(args) = command else {
            panic!("expected tune command");
        };
        assert_eq!(args.method, Some(TuningMethod::IqrExpansion));
        assert_eq!(args.task_filter.as_deref(), Some("level_walking"));
        assert_eq!(args.dataset_name.as_deref(), Some("umich_2021"));
        assert!(args.spec.is_none());
    }

    #[test]
    fn tune_requires_method_and_output() {
        let err = parse_command(&["tune", "--input", "data.csv", "--output", "s.txt"])
            .expect_err("missing method must fail");
        assert!(err.to_string().contains("requires --method"));

        let err = parse_command(&["tune", "--input", "data.csv", "--method", "mean_3std"])
            .expect_err("missing output must fail");
        assert!(err.to_string().contains("requires --output"));
    }

    #[test]
    fn unknown_command_and_unknown_flags_fail() {
        let err = parse_command(&["frobnicate"]).expect_err("unknown command must fail");
        assert!(err.to_string().contains("unknown command 'frobnicate'"));

        let err = parse_command(&["validate", "--inupt", "x"]) // typo
            .expect_err("unknown flag must fail");
        assert!(err.to_string().contains("unknown validate option '--inupt'"));
    }

    #[test]
    fn unknown_tuning_method_reports_alternatives() {
        let err = parse_command(&[
            "tune",
            "--input",
            "data.csv",
            "--method",
            "magic",
            "--output",
            "s.txt",
        ])
        .expect_err("unknown method must fail");
        assert!(err.to_string().contains("unknown tuning method 'magic'"));
        assert_eq!(err.code(), "invalid_input");
    }

    #[test]
    fn flag_without_value_fails() {
        let err = parse_command(&["validate", "--input"]).expect_err("dangling flag must fail");
        assert!(err.to_string().contains("--input requires a value"));

        let err = parse_command(&["validate", "--input", "--spec"])
            .expect_err("flag as value must fail");
        assert!(err.to_string().contains("but got option '--spec'"));
    }

    #[test]
    fn error_codes_map_through_from_gait_error() {
        let cli_err = CliError::from(GaitError::structural("boom"));
        assert_eq!(cli_err.code(), "structural");
        let cli_err = CliError::from(GaitError::spec_format("boom"));
        assert_eq!(cli_err.code(), "spec_format");
        assert_eq!(CliError::invalid_input("x").code(), "invalid_input");
    }

    #[test]
    fn help_and_version_consume_the_invocation() {
        assert!(parse_cli(&to_args(&["--help"])).expect("help should succeed").is_none());
        assert!(parse_cli(&to_args(&["-V"])).expect("version should succeed").is_none());
        assert!(
            parse_cli(&to_args(&["validate", "--help"]))
                .expect("command help should succeed")
                .is_none()
        );
        assert!(parse_cli(&to_args(&[])).expect("no args shows help").is_none());
    }
}
