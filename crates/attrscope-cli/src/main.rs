use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use attrscope_core::decode::{DecodeOptions, decode_report};
use attrscope_core::engine::{ByteOrder, DecodeContext};
use attrscope_core::protocols::Protocol;
use attrscope_core::protocols::netlink::NetlinkBus;
use attrscope_core::DecodeReport;
use clap::{Parser, Subcommand, ValueEnum};
use glob::glob;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("ATTRSCOPE_BUILD_COMMIT"),
    " ",
    env!("ATTRSCOPE_BUILD_DATE"),
    ")"
);

const EXAMPLES: &str = "Examples:\n  attrscope decode message.bin --protocol netlink -o report.json\n  attrscope decode dump.hex --hex --protocol llrp --stdout --pretty\n  attrscope decode 'exports/*.bin' --protocol netflow --exporter 192.0.2.1 --stdout";

#[derive(Parser, Debug)]
#[command(name = "attrscope")]
#[command(version, long_version = LONG_VERSION)]
#[command(
    about = "Offline decoder for self-describing binary records (Netlink / LLRP / NetFlow v9).",
    long_about = None,
    after_help = EXAMPLES
)]
struct Cli {
    /// Enable debug logging on stderr (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode one message and generate a versioned JSON report.
    #[command(alias = "dissect")]
    #[command(after_help = EXAMPLES)]
    Decode(DecodeArgs),
}

#[derive(clap::Args, Debug)]
struct DecodeArgs {
    /// Path to a file holding one message (a glob must match exactly one file)
    input: PathBuf,

    /// Protocol profile used to decode the message
    #[arg(short, long, value_enum)]
    protocol: ProtocolArg,

    /// Output report path (JSON)
    #[arg(short = 'o', long, required_unless_present = "stdout")]
    report: Option<PathBuf>,

    /// Write JSON report to stdout
    #[arg(long, conflicts_with = "report")]
    stdout: bool,

    /// Pretty-print JSON output
    #[arg(long, conflicts_with = "compact")]
    pretty: bool,

    /// Compact JSON output (default)
    #[arg(long)]
    compact: bool,

    /// Input is a hex dump (whitespace and `#` comments ignored)
    #[arg(long)]
    hex: bool,

    /// NetFlow exporter identity; templates are scoped to it
    #[arg(long, default_value = attrscope_core::decode::DEFAULT_EXPORTER)]
    exporter: String,

    /// Maximum depth of nested attribute groups
    #[arg(long, default_value_t = attrscope_core::engine::DEFAULT_MAX_NESTING_DEPTH)]
    max_depth: usize,

    /// Read Netlink headers and values little-endian
    #[arg(long, conflicts_with = "big_endian")]
    little_endian: bool,

    /// Read Netlink headers and values big-endian
    #[arg(long)]
    big_endian: bool,

    /// Netlink bus the message was captured on
    #[arg(long, value_enum, default_value_t = BusArg::Route)]
    netlink_bus: BusArg,

    /// Report records kept opaque because no handler knows their type
    #[arg(long)]
    report_unknown: bool,

    /// Suppress non-error output
    #[arg(long)]
    quiet: bool,

    /// Exit with a non-zero code if diagnostics are present
    #[arg(long)]
    strict: bool,

    /// List diagnostics after decoding
    #[arg(long)]
    list_diagnostics: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ProtocolArg {
    Netlink,
    Llrp,
    Netflow,
}

impl From<ProtocolArg> for Protocol {
    fn from(value: ProtocolArg) -> Self {
        match value {
            ProtocolArg::Netlink => Protocol::Netlink,
            ProtocolArg::Llrp => Protocol::Llrp,
            ProtocolArg::Netflow => Protocol::Netflow,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum BusArg {
    Route,
    Generic,
}

impl From<BusArg> for NetlinkBus {
    fn from(value: BusArg) -> Self {
        match value {
            BusArg::Route => NetlinkBus::Route,
            BusArg::Generic => NetlinkBus::Generic,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Decode(args) => cmd_decode(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{:#}", err), None)
    }
}

fn cmd_decode(args: DecodeArgs) -> Result<(), CliError> {
    let resolved_input = resolve_input_path(&args.input)?;
    validate_input_file(&resolved_input)?;
    let input_abs = fs::canonicalize(&resolved_input)
        .with_context(|| format!("Failed to resolve input path: {}", resolved_input.display()))?;
    let report = if args.stdout {
        None
    } else {
        Some(args.report.clone().ok_or_else(|| {
            CliError::new(
                "missing output path",
                Some("use -o/--report or --stdout".to_string()),
            )
        })?)
    };
    if let Some(report_path) = report.as_ref() {
        ensure_distinct_output(report_path, &input_abs)?;
    }

    let raw = fs::read(&resolved_input)
        .with_context(|| format!("Failed to read input file: {}", resolved_input.display()))?;
    let buffer = if args.hex {
        parse_hex(&String::from_utf8_lossy(&raw))?
    } else {
        raw
    };
    debug!(path = %resolved_input.display(), bytes = buffer.len(), "input loaded");

    let protocol = Protocol::from(args.protocol);
    let opts = decode_options(&args);
    let rep = decode_report(
        &resolved_input.display().to_string(),
        protocol,
        &buffer,
        &opts,
    )
    .with_context(|| format!("{} decoding failed", protocol))?;
    let json = serialize_report(&rep, args.pretty, args.compact)?;

    match report {
        None => print!("{}", json),
        Some(report) => {
            if let Some(parent) = report.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create output directory: {}", parent.display())
                    })?;
                }
            }
            fs::write(&report, json)
                .with_context(|| format!("Failed to write report: {}", report.display()))?;
            if !args.quiet {
                eprintln!("OK: report written -> {}", report.display());
            }
        }
    }

    if args.list_diagnostics && !args.quiet {
        print_diagnostics(&rep);
    }
    if args.strict && rep.has_diagnostics() {
        return Err(CliError::new(
            format!("{} diagnostic(s) reported", rep.diagnostics.len()),
            Some("use --list-diagnostics to inspect".to_string()),
        ));
    }
    Ok(())
}

fn decode_options(args: &DecodeArgs) -> DecodeOptions {
    let byte_order = if args.little_endian {
        ByteOrder::Little
    } else if args.big_endian {
        ByteOrder::Big
    } else {
        ByteOrder::native()
    };
    DecodeOptions {
        context: DecodeContext::new(byte_order)
            .max_nesting_depth(args.max_depth)
            .report_unknown(args.report_unknown),
        netlink_bus: args.netlink_bus.into(),
        exporter: args.exporter.clone(),
    }
}

fn ensure_distinct_output(report_path: &Path, input_abs: &Path) -> Result<(), CliError> {
    let report_abs = report_path
        .parent()
        .map(|parent| {
            if parent.as_os_str().is_empty() {
                fs::canonicalize(".")
            } else {
                fs::canonicalize(parent)
            }
        })
        .transpose()
        .with_context(|| format!("Failed to resolve output path: {}", report_path.display()))?;
    if let Some(report_dir) = report_abs {
        let report_target = report_dir.join(
            report_path
                .file_name()
                .ok_or_else(|| anyhow::anyhow!("Invalid report path"))?,
        );
        if report_target == input_abs {
            return Err(CliError::new(
                format!(
                    "report path must differ from input: {}",
                    report_path.display()
                ),
                Some("choose a different output path".to_string()),
            ));
        }
    }
    Ok(())
}

fn serialize_report(rep: &DecodeReport, pretty: bool, compact: bool) -> Result<String, CliError> {
    if pretty && compact {
        return Err(CliError::new(
            "cannot use --pretty and --compact together",
            Some("choose one output format".to_string()),
        ));
    }
    if pretty {
        serde_json::to_string_pretty(rep)
            .context("JSON serialization failed")
            .map_err(Into::into)
    } else {
        serde_json::to_string(rep)
            .context("JSON serialization failed")
            .map_err(Into::into)
    }
}

fn print_diagnostics(rep: &DecodeReport) {
    eprintln!("Diagnostics:");
    if rep.diagnostics.is_empty() {
        eprintln!("  (none)");
        return;
    }
    for diagnostic in &rep.diagnostics {
        eprintln!(
            "  {:>6} {} {}",
            diagnostic.offset, diagnostic.kind, diagnostic.detail
        );
    }
    let summary = rep
        .diagnostic_summary
        .iter()
        .map(|(kind, count)| format!("{}={}", kind, count))
        .collect::<Vec<_>>()
        .join(", ");
    eprintln!("  total: {}", summary);
}

fn parse_hex(text: &str) -> Result<Vec<u8>, CliError> {
    let digits: String = text
        .lines()
        .map(|line| line.split('#').next().unwrap_or(""))
        .flat_map(|line| line.split_whitespace())
        .map(|token| token.strip_prefix("0x").unwrap_or(token))
        .collect();
    hex::decode(&digits).map_err(|err| match err {
        hex::FromHexError::OddLength => CliError::new(
            format!("hex input has an odd number of digits ({})", digits.len()),
            Some("each byte needs two hex digits".to_string()),
        ),
        hex::FromHexError::InvalidHexCharacter { c, index } => CliError::new(
            format!("invalid hex digit '{}' at digit {}", c, index),
            Some("use digits 0-9 and a-f; `#` starts a comment".to_string()),
        ),
        other => CliError::new(format!("invalid hex input: {}", other), None),
    })
}

fn validate_input_file(input: &Path) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("pass a file holding one raw message, or a hex dump with --hex".to_string()),
        ));
    }
    if !input.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some("pass a file holding one raw message".to_string()),
        ));
    }
    Ok(())
}

fn resolve_input_path(input: &Path) -> Result<PathBuf, CliError> {
    let pattern = input.to_string_lossy();
    if !is_glob_pattern(&pattern) {
        return Ok(input.to_path_buf());
    }

    let mut matches = Vec::new();
    let paths = glob(&pattern).map_err(|err| {
        CliError::new(
            format!("invalid input pattern '{}'", pattern),
            Some(format!("pattern error: {}", err.msg)),
        )
    })?;
    for entry in paths {
        let path = entry.map_err(|err| {
            CliError::new(
                format!("invalid input pattern '{}'", pattern),
                Some(format!("pattern error: {}", err)),
            )
        })?;
        if path.is_file() {
            matches.push(path);
        }
    }

    if matches.is_empty() {
        return Err(CliError::new(
            format!("no files match pattern '{}'", pattern),
            Some("check the path or quote the pattern".to_string()),
        ));
    }
    if matches.len() > 1 {
        let hint = "pass a single message file, or run once per file".to_string();
        let mut message = format!(
            "multiple files match pattern '{}' ({} matches)",
            pattern,
            matches.len()
        );
        let listed = matches
            .iter()
            .take(3)
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>();
        message.push_str("; matches: ");
        message.push_str(&listed.join(", "));
        if matches.len() > 3 {
            message.push_str(", ...");
        }
        return Err(CliError::new(message, Some(hint)));
    }

    Ok(matches.remove(0))
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}

#[cfg(test)]
mod tests {
    use super::{is_glob_pattern, parse_hex};

    #[test]
    fn hex_ignores_whitespace_comments_and_prefixes() {
        let bytes = parse_hex("# header\n0x04 3e\n00 00 # len\n000a").expect("hex");
        assert_eq!(bytes, vec![0x04, 0x3e, 0x00, 0x00, 0x00, 0x0a]);
    }

    #[test]
    fn hex_rejects_odd_digits_and_junk() {
        let err = parse_hex("ab c").expect_err("odd");
        assert!(err.message.contains("odd number of digits (3)"));
        let err = parse_hex("00 zz").expect_err("junk");
        assert!(err.message.contains("'z' at digit 2"), "{}", err.message);
        assert!(err.hint.is_some());
    }

    #[test]
    fn glob_detection() {
        assert!(is_glob_pattern("dumps/*.bin"));
        assert!(!is_glob_pattern("dumps/one.bin"));
    }
}
