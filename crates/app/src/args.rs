use std::fmt;
use std::io::{self, Write};
use std::path::PathBuf;

use chrono::Duration;
use quiz_core::model::Category;
use services::{SampleMode, TimeLimit};

#[derive(Debug)]
pub enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidNumber { flag: &'static str, raw: String },
    InvalidTimeLimit { flag: &'static str, secs: i64 },
    EmptyCategory,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidTimeLimit { flag, secs } => {
                write!(f, "{flag} must be a positive number of seconds, got {secs}")
            }
            ArgsError::EmptyCategory => write!(f, "--category cannot be empty"),
        }
    }
}

impl std::error::Error for ArgsError {}

pub fn write_usage(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "Usage:")?;
    writeln!(out, "  quiz run  [--csv <path>] [--count <n>] [--category <label> | --uniform]")?;
    writeln!(out, "            [--time-limit <secs> | --timed | --untimed] [--seed <n>]")?;
    writeln!(out, "  quiz info [--csv <path>]")?;
    writeln!(out)?;
    writeln!(out, "Defaults:")?;
    writeln!(out, "  --csv quiz_data.csv  --count 50  --untimed")?;
    writeln!(
        out,
        "  --timed allows {} s per question",
        quiz_core::time::SECONDS_PER_QUESTION
    )?;
    writeln!(out)?;
    writeln!(out, "Categories:")?;
    writeln!(out, "  {}", Category::KNOWN.join(", "))?;
    writeln!(out)?;
    writeln!(out, "Environment:")?;
    writeln!(out, "  QUIZ_CSV, QUIZ_COUNT, QUIZ_TIME_LIMIT, QUIZ_SEED, RUST_LOG")?;
    Ok(())
}

/// Parse argv and write usage to `usage` on help or error.
///
/// The error itself is returned unprinted so the caller reports it once.
pub fn parse_or_usage(
    argv: impl IntoIterator<Item = String>,
    usage: &mut impl Write,
) -> Result<Option<Args>, ArgsError> {
    let parsed = Args::parse(argv);
    if !matches!(parsed, Ok(Some(_))) {
        write_usage(usage).ok();
    }
    parsed
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Run,
    Info,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "run" => Some(Self::Run),
            "info" => Some(Self::Info),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Args {
    pub command: Command,
    pub csv: PathBuf,
    pub count: usize,
    pub mode: SampleMode,
    pub time_limit: TimeLimit,
    pub seed: Option<u64>,
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_time_limit(flag: &'static str, raw: String) -> Result<TimeLimit, ArgsError> {
    let secs: i64 = parse_number(flag, raw)?;
    if secs <= 0 {
        return Err(ArgsError::InvalidTimeLimit { flag, secs });
    }
    Duration::try_seconds(secs)
        .map(TimeLimit::Fixed)
        .ok_or(ArgsError::InvalidTimeLimit { flag, secs })
}

fn parse_number<T: std::str::FromStr>(flag: &'static str, raw: String) -> Result<T, ArgsError> {
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidNumber { flag, raw })
}

impl Args {
    /// Parse argv (without the program name), falling back to `QUIZ_*` variables.
    ///
    /// Returns `Ok(None)` when help was requested.
    pub fn parse(argv: impl IntoIterator<Item = String>) -> Result<Option<Self>, ArgsError> {
        let mut args = argv.into_iter().peekable();

        // Default behavior: start a quiz when no subcommand is provided.
        let command = match args.peek().cloned() {
            None => Command::Run,
            Some(first) if first == "--help" || first == "-h" => return Ok(None),
            Some(first) if first.starts_with("--") => Command::Run,
            Some(first) => {
                let command =
                    Command::from_arg(&first).ok_or(ArgsError::UnknownCommand(first))?;
                args.next();
                command
            }
        };

        let mut parsed = Self::from_env(command)?;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--csv" => parsed.csv = PathBuf::from(require_value(&mut args, "--csv")?),
                "--count" => {
                    parsed.count = parse_number("--count", require_value(&mut args, "--count")?)?;
                }
                "--category" => {
                    let value = require_value(&mut args, "--category")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::EmptyCategory);
                    }
                    parsed.mode = SampleMode::Targeted(Category::new(value));
                }
                "--uniform" => parsed.mode = SampleMode::Uniform,
                "--time-limit" => {
                    let value = require_value(&mut args, "--time-limit")?;
                    parsed.time_limit = parse_time_limit("--time-limit", value)?;
                }
                "--timed" => parsed.time_limit = TimeLimit::PerQuestion,
                "--untimed" => parsed.time_limit = TimeLimit::Untimed,
                "--seed" => {
                    parsed.seed = Some(parse_number("--seed", require_value(&mut args, "--seed")?)?);
                }
                "--help" | "-h" => return Ok(None),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Some(parsed))
    }

    fn from_env(command: Command) -> Result<Self, ArgsError> {
        let csv = std::env::var("QUIZ_CSV")
            .map_or_else(|_| PathBuf::from("quiz_data.csv"), PathBuf::from);
        let count = match std::env::var("QUIZ_COUNT") {
            Ok(raw) => parse_number("QUIZ_COUNT", raw)?,
            Err(_) => 50,
        };
        let time_limit = match std::env::var("QUIZ_TIME_LIMIT") {
            Ok(raw) => parse_time_limit("QUIZ_TIME_LIMIT", raw)?,
            Err(_) => TimeLimit::Untimed,
        };
        let seed = match std::env::var("QUIZ_SEED") {
            Ok(raw) => Some(parse_number("QUIZ_SEED", raw)?),
            Err(_) => None,
        };

        Ok(Self {
            command,
            csv,
            count,
            mode: SampleMode::Balanced,
            time_limit,
            seed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Result<Option<Args>, ArgsError> {
        Args::parse(argv.iter().map(|s| (*s).to_owned()))
    }

    #[test]
    fn flags_override_defaults() {
        let args = parse(&[
            "run",
            "--csv",
            "sheet.csv",
            "--count",
            "30",
            "--category",
            "Clinical",
            "--time-limit",
            "1080",
            "--seed",
            "9",
        ])
        .unwrap()
        .unwrap();

        assert_eq!(args.command, Command::Run);
        assert_eq!(args.csv, PathBuf::from("sheet.csv"));
        assert_eq!(args.count, 30);
        assert_eq!(args.mode, SampleMode::Targeted(Category::new("clinical")));
        assert_eq!(args.time_limit, TimeLimit::Fixed(Duration::seconds(1080)));
        assert_eq!(args.seed, Some(9));
    }

    #[test]
    fn bare_flags_imply_run_and_help_short_circuits() {
        let args = parse(&["--timed", "--uniform"]).unwrap().unwrap();
        assert_eq!(args.command, Command::Run);
        assert_eq!(args.time_limit, TimeLimit::PerQuestion);
        assert_eq!(args.mode, SampleMode::Uniform);

        assert!(parse(&["info", "--help"]).unwrap().is_none());
        assert_eq!(parse(&["info"]).unwrap().unwrap().command, Command::Info);
    }

    #[test]
    fn bad_input_is_reported() {
        assert!(matches!(parse(&["--count"]), Err(ArgsError::MissingValue { .. })));
        assert!(matches!(
            parse(&["--count", "many"]),
            Err(ArgsError::InvalidNumber { flag: "--count", .. })
        ));
        assert!(matches!(
            parse(&["--time-limit", "9223372036854775807"]),
            Err(ArgsError::InvalidTimeLimit { .. })
        ));
        assert!(matches!(
            parse(&["--time-limit", "-5"]),
            Err(ArgsError::InvalidTimeLimit { secs: -5, .. })
        ));
        assert!(matches!(
            parse(&["--time-limit", "0"]),
            Err(ArgsError::InvalidTimeLimit { secs: 0, .. })
        ));
        assert!(matches!(parse(&["serve"]), Err(ArgsError::UnknownCommand(_))));
        assert!(matches!(parse(&["--nope"]), Err(ArgsError::UnknownArg(_))));
    }

    #[test]
    fn usage_is_written_without_the_error() {
        let mut usage = Vec::new();
        let err = parse_or_usage(vec!["--nope".to_owned()], &mut usage).unwrap_err();
        let usage = String::from_utf8(usage).unwrap();

        assert!(usage.starts_with("Usage:"));
        assert!(!usage.contains(&err.to_string()));

        let mut quiet = Vec::new();
        assert!(parse_or_usage(vec!["info".to_owned()], &mut quiet).unwrap().is_some());
        assert!(quiet.is_empty());
    }
}
