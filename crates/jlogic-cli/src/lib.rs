use clap::{Parser, Subcommand};
use jlogic_core::{ConfigError, Engine, EngineConfig, EvalError, Value, uses_data};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Parser)]
#[command(name = "jlogic", author, version, about = "Evaluate and inspect JsonLogic rules", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Engine config file (JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the maximum rule nesting depth
    #[arg(long, global = true)]
    pub max_depth: Option<usize>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Evaluate a rule against data and print the result
    Apply {
        /// Rule as JSON text, or @path to a JSON file
        rule: String,
        /// Data as JSON text, or @path to a JSON file
        data: Option<String>,
    },

    /// Check whether a rule matches a pattern
    Like {
        rule: String,
        pattern: String,
        /// Print the named wildcard bindings instead of true/false
        #[arg(long)]
        captures: bool,
    },

    /// List the data paths a rule reads
    Uses { rule: String },

    /// Run a test-vector file
    Test {
        file: PathBuf,
        /// Vectors are [rule, pattern, expected] rule_like cases
        #[arg(long)]
        like: bool,
    },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{} ({})", .0, .0.code())]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("vector #{index}: {message}")]
    Vector { index: usize, message: String },

    #[error("{failed} of {total} vectors failed")]
    VectorsFailed { failed: usize, total: usize },
}

fn read_file(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse a JSON argument. A leading `@` names a file holding the JSON.
pub fn read_json_arg(arg: &str) -> Result<serde_json::Value, CliError> {
    let text = match arg.strip_prefix('@') {
        Some(path) => read_file(Path::new(path))?,
        None => arg.to_string(),
    };
    Ok(serde_json::from_str(&text)?)
}

/// Engine from `--config` and `--max-depth`.
pub fn build_engine(config: Option<&Path>, max_depth: Option<usize>) -> Result<Engine, CliError> {
    let mut config = match config {
        Some(path) => EngineConfig::from_json(&read_file(path)?)?,
        None => EngineConfig::default(),
    };
    if let Some(depth) = max_depth {
        config.max_depth = depth;
    }
    debug!(?config, "engine config");
    Ok(Engine::with_config(config)?)
}

#[derive(Debug, Clone, PartialEq)]
pub struct VectorFailure {
    pub index: usize,
    pub rule: serde_json::Value,
    pub expected: serde_json::Value,
    pub actual: String,
}

#[derive(Debug, Default)]
pub struct VectorReport {
    pub passed: usize,
    pub failures: Vec<VectorFailure>,
}

impl VectorReport {
    pub fn total(&self) -> usize {
        self.passed + self.failures.len()
    }
}

/// Run a vector file: a JSON array whose string entries are section
/// comments and whose array entries are `[rule, data, expected]`
/// (`[rule, pattern, expected]` with `like`).
pub fn run_vectors(engine: &Engine, path: &Path, like: bool) -> Result<VectorReport, CliError> {
    let document: serde_json::Value = serde_json::from_str(&read_file(path)?)?;
    let serde_json::Value::Array(entries) = document else {
        return Err(CliError::Vector {
            index: 0,
            message: "vector file must hold a JSON array".to_string(),
        });
    };

    let mut report = VectorReport::default();
    for (index, entry) in entries.iter().enumerate() {
        let case = match entry {
            serde_json::Value::String(section) => {
                debug!(%section, "vector section");
                continue;
            }
            serde_json::Value::Array(case) if case.len() == 3 => case,
            _ => {
                return Err(CliError::Vector {
                    index,
                    message: "expected a comment string or a 3-element array".to_string(),
                });
            }
        };
        let (rule, input, expected) = (&case[0], &case[1], &case[2]);
        let outcome = if like {
            let matched = engine.rule_like(&Value::from(rule), &Value::from(input));
            let ok = Some(matched) == expected.as_bool();
            (ok, matched.to_string())
        } else {
            match engine.apply_json(rule, input) {
                Ok(actual) => (Value::from(&actual) == Value::from(expected), actual.to_string()),
                Err(err) => (false, format!("error: {err}")),
            }
        };
        match outcome {
            (true, _) => report.passed += 1,
            (false, actual) => report.failures.push(VectorFailure {
                index,
                rule: rule.clone(),
                expected: expected.clone(),
                actual,
            }),
        }
    }
    info!(passed = report.passed, failed = report.failures.len(), "vectors done");
    Ok(report)
}

pub fn run(cli: Cli, out: &mut impl Write) -> Result<(), CliError> {
    let engine = build_engine(cli.config.as_deref(), cli.max_depth)?;

    match cli.command {
        Commands::Apply { rule, data } => {
            let rule = read_json_arg(&rule)?;
            let data = match data {
                Some(data) => read_json_arg(&data)?,
                None => serde_json::Value::Null,
            };
            let result = engine.apply_json(&rule, &data)?;
            writeln!(out, "{}", serde_json::to_string_pretty(&result)?)?;
        }
        Commands::Like {
            rule,
            pattern,
            captures,
        } => {
            let rule = Value::from(read_json_arg(&rule)?);
            let pattern = Value::from(read_json_arg(&pattern)?);
            if captures {
                let bound = engine
                    .rule_captures(&rule, &pattern)
                    .map(|map| Value::Object(map).to_json())
                    .unwrap_or(serde_json::Value::Null);
                writeln!(out, "{}", serde_json::to_string_pretty(&bound)?)?;
            } else {
                writeln!(out, "{}", engine.rule_like(&rule, &pattern))?;
            }
        }
        Commands::Uses { rule } => {
            let rule = Value::from(read_json_arg(&rule)?);
            let paths = uses_data(&rule);
            writeln!(out, "{}", serde_json::to_string_pretty(&paths)?)?;
        }
        Commands::Test { file, like } => {
            let report = run_vectors(&engine, &file, like)?;
            for failure in &report.failures {
                writeln!(
                    out,
                    "FAIL #{}: {} expected {} got {}",
                    failure.index, failure.rule, failure.expected, failure.actual
                )?;
            }
            writeln!(out, "{} passed, {} failed", report.passed, report.failures.len())?;
            if !report.failures.is_empty() {
                return Err(CliError::VectorsFailed {
                    failed: report.failures.len(),
                    total: report.total(),
                });
            }
        }
    }
    Ok(())
}
