//! Adder parser CLI.
//!
//! Parses a file (or stdin) in one of the three input modes and prints the
//! syntax tree, or the diagnostics on failure.

use std::io::Read;
use std::process::ExitCode;

use adder_diagnostic::DiagnosticCollector;
use adder_parse::{parse, InputType, ParserFlags, DEFAULT_FEATURE_VERSION};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("unknown option '{0}'")]
    UnknownOption(String),
    #[error("invalid feature version '{0}'")]
    BadFeatureVersion(String),
}

struct Options {
    path: Option<String>,
    mode: InputType,
    flags: ParserFlags,
    feature_version: u32,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        print_usage();
        return ExitCode::SUCCESS;
    }

    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(err) => {
            eprintln!("error: {err}");
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    let source = match read_source(options.path.as_deref()) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let sink = DiagnosticCollector::new();
    let result = parse(
        &source,
        options.mode,
        &sink,
        options.flags,
        options.feature_version,
    );

    for warning in sink.warnings() {
        eprintln!("{warning}");
    }
    match result {
        Some(module) => {
            println!("{module:#?}");
            ExitCode::SUCCESS
        }
        None => {
            let errors = sink.errors();
            if let Some(diag) = errors.last() {
                eprintln!("{diag}");
            } else {
                eprintln!("error: parse failed");
            }
            ExitCode::FAILURE
        }
    }
}

fn parse_args(args: &[String]) -> Result<Options, CliError> {
    let mut options = Options {
        path: None,
        mode: InputType::Module,
        flags: ParserFlags::empty(),
        feature_version: DEFAULT_FEATURE_VERSION,
    };
    for arg in args {
        match arg.as_str() {
            "--single" => options.mode = InputType::Single,
            "--eval" => options.mode = InputType::Eval,
            "--module" => options.mode = InputType::Module,
            "--barry-as-bdfl" => options.flags |= ParserFlags::BARRY_AS_BDFL,
            "--type-comments" => options.flags |= ParserFlags::TYPE_COMMENTS,
            "--interactive" => options.flags |= ParserFlags::INTERACTIVE_TERMINAL,
            other => {
                if let Some(version) = other.strip_prefix("--feature-version=") {
                    options.feature_version = version
                        .parse()
                        .map_err(|_| CliError::BadFeatureVersion(version.to_string()))?;
                } else if other.starts_with('-') && other != "-" {
                    return Err(CliError::UnknownOption(other.to_string()));
                } else if options.path.is_none() {
                    options.path = Some(other.to_string());
                } else {
                    return Err(CliError::UnknownOption(other.to_string()));
                }
            }
        }
    }
    Ok(options)
}

fn read_source(path: Option<&str>) -> Result<String, CliError> {
    match path {
        None | Some("-") => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|source| CliError::Read {
                    path: "<stdin>".to_string(),
                    source,
                })?;
            Ok(buffer)
        }
        Some(path) => std::fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.to_string(),
            source,
        }),
    }
}

fn print_usage() {
    eprintln!("Usage: adderc [FILE|-] [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --module               Parse a whole module (default)");
    eprintln!("  --single               Parse one interactive statement");
    eprintln!("  --eval                 Parse a bare expression");
    eprintln!("  --barry-as-bdfl        Accept '<>' instead of '!='");
    eprintln!("  --type-comments        Recognize '# type:' comments");
    eprintln!("  --interactive          Treat single-statement input as a terminal");
    eprintln!("  --feature-version=N    Language feature version gate (default 12)");
}
