use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use temporal_validation::{
    SnoopingReport, TemporalDataSplitter, TemporalValidator, ValidationMode, ValidationReport,
    ValidatorConfig,
};

use analysis_core::{parse_timestamp, TimeSeriesFrame};

#[derive(Debug, Clone, PartialEq)]
struct AuditArgs {
    path: String,
    as_of: Option<DateTime<Utc>>,
    test_size: Option<f64>,
    gap_days: i64,
    strict: bool,
}

/// Flags that consume the following argument.
const VALUE_FLAGS: [&str; 3] = ["--as-of", "--test-size", "--gap-days"];

impl AuditArgs {
    fn parse(args: &[String]) -> Result<Self> {
        let value_of = |flag: &str| {
            args.iter()
                .position(|a| a == flag)
                .and_then(|i| args.get(i + 1))
                .map(|s| s.as_str())
        };

        let mut path = None;
        let mut skip_next = false;
        for arg in args.iter().skip(1) {
            if skip_next {
                skip_next = false;
                continue;
            }
            if VALUE_FLAGS.contains(&arg.as_str()) {
                skip_next = true;
            } else if !arg.starts_with("--") && path.is_none() {
                path = Some(arg.clone());
            }
        }
        let Some(path) = path else {
            bail!("missing <frame.json> argument");
        };

        let as_of = value_of("--as-of")
            .map(parse_timestamp)
            .transpose()
            .context("invalid --as-of")?;
        let test_size = value_of("--test-size")
            .map(|v| v.parse::<f64>())
            .transpose()
            .context("invalid --test-size")?;
        let gap_days = value_of("--gap-days")
            .map(|v| v.parse::<i64>())
            .transpose()
            .context("invalid --gap-days")?
            .unwrap_or(0);

        Ok(Self {
            path,
            as_of,
            test_size,
            gap_days,
            strict: args.iter().any(|a| a == "--strict"),
        })
    }
}

#[derive(Debug, Serialize)]
struct SplitSummary {
    train_rows: usize,
    test_rows: usize,
    gap_days: i64,
    snooping: SnoopingReport,
}

#[derive(Debug, Serialize)]
struct AuditOutput {
    path: String,
    mode: String,
    validation: ValidationReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    split: Option<SplitSummary>,
}

impl AuditOutput {
    fn has_errors(&self) -> bool {
        !self.validation.is_valid || self.split.as_ref().is_some_and(|s| !s.snooping.is_valid)
    }

    fn has_warnings(&self) -> bool {
        self.validation.has_warnings()
            || self
                .split
                .as_ref()
                .is_some_and(|s| !s.snooping.warnings.is_empty())
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  temporal-audit <frame.json> [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --as-of DATE       Analysis date (default: now)");
    eprintln!("  --test-size F      Also run a chronological split with this test fraction");
    eprintln!("  --gap-days N       Embargo between train and test (default: 0)");
    eprintln!("  --strict           Exit with status 1 when any check reports an error");
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "temporal_audit=info,temporal_validation=info".into());
    // Logs go to stderr so stdout stays a single JSON document.
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let raw_args: Vec<String> = std::env::args().collect();
    if raw_args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }
    let args = match AuditArgs::parse(&raw_args) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {:#}", e);
            print_usage();
            std::process::exit(2);
        }
    };

    let config = ValidatorConfig::from_env().context("invalid TEMPORAL_* configuration")?;
    let mode = if args.strict {
        ValidationMode::Strict
    } else {
        ValidationMode::Permissive
    };
    tracing::info!(path = %args.path, %mode, "Auditing frame");

    let contents = std::fs::read_to_string(&args.path)
        .with_context(|| format!("failed to read {}", args.path))?;
    let frame: TimeSeriesFrame = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse frame from {}", args.path))?;

    // The full report is always printed; strict mode decides the exit status.
    let validator = TemporalValidator::with_config(config, ValidationMode::Permissive);
    let validation = validator.validate_temporal_integrity(&frame, args.as_of)?;

    let split = match args.test_size {
        Some(test_size) => {
            let splitter = TemporalDataSplitter::new(validator);
            let result = splitter.temporal_train_test_split(&frame, test_size, args.gap_days)?;
            Some(SplitSummary {
                train_rows: result.train.len(),
                test_rows: result.test.len(),
                gap_days: result.gap_days,
                snooping: result.snooping,
            })
        }
        None => None,
    };

    let output = AuditOutput {
        path: args.path,
        mode: mode.to_string(),
        validation,
        split,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);

    if output.has_errors() {
        tracing::warn!("Temporal audit found errors");
        if args.strict {
            std::process::exit(1);
        }
    } else if output.has_warnings() {
        tracing::info!("Temporal audit passed with warnings");
    } else {
        tracing::info!("Temporal audit passed");
    }
    Ok(())
}
