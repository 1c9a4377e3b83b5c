//! Minimal CLI: infer | compare
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{info, warn};

use schema_drift::records::{RecordReader, RecordSettings, resolve_file_path_patterns};
use schema_drift::{CompareOptions, InferOptions, Side, compare, infer, render, wire};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// compare schemas from sampled JSON/NDJSON data and parsed schema documents
#[derive(Parser, Debug)]
#[command(version)]
pub struct CommandLineInterface {
    /// more logging on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// infer a side document from sampled records
    Infer(InferOut),
    /// diff two sides
    Compare(CompareOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON); implied by .ndjson/.jsonl
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select a subnode in each document (e.g. /data/items)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document.
    #[arg(long)]
    jq_expr: Option<String>,
}

#[derive(Args, Debug, Clone)]
struct SamplingSettings {
    /// records kept by the reservoir sample
    #[arg(long, default_value_t = schema_drift::inference::DEFAULT_SAMPLE_SIZE)]
    sample_size: usize,

    /// reservoir seed; same seed, same sample
    #[arg(long, default_value_t = schema_drift::inference::DEFAULT_SEED)]
    seed: u64,

    /// merge every record (up to the safety ceiling) instead of sampling
    #[arg(long, default_value_t = false)]
    all_records: bool,

    /// keep ISO-8601 looking strings as plain `str`
    #[arg(long, default_value_t = false)]
    no_datetime: bool,

    /// union members kept before collapsing to `any`
    #[arg(long, default_value_t = schema_drift::normalize::DEFAULT_UNION_CAP)]
    union_cap: usize,
}

#[derive(clap::Parser, Debug)]
struct InferOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    sampling: SamplingSettings,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,

    /// label stored in the side document (defaults to the first input)
    #[arg(long)]
    label: Option<String>,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(clap::Parser, Debug)]
struct CompareOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    sampling: SamplingSettings,

    /// left data inputs (paths or quoted globs)
    #[arg(long, num_args = 1.., required_unless_present = "left_schema", conflicts_with = "left_schema")]
    left: Vec<String>,

    /// left side document produced by a schema parser
    #[arg(long)]
    left_schema: Option<PathBuf>,

    /// right data inputs (paths or quoted globs)
    #[arg(long, num_args = 1.., required_unless_present = "right_schema", conflicts_with = "right_schema")]
    right: Vec<String>,

    /// right side document produced by a schema parser
    #[arg(long)]
    right_schema: Option<PathBuf>,

    /// only compare these fields (comma separated; `a.b` and `a[].b` are equivalent)
    #[arg(long, value_delimiter = ',')]
    fields: Vec<String>,

    /// also list paths whose types agree
    #[arg(long, default_value_t = false)]
    show_common: bool,

    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// write both normalized side documents into this directory
    #[arg(long)]
    dump_schemas: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    no_color: bool,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn record_settings(&self) -> RecordSettings {
        RecordSettings {
            ndjson: self.ndjson,
            json_pointer: self.json_pointer.clone(),
            jq_expr: self.jq_expr.clone(),
        }
    }

    /// Sample the records behind `patterns` into a data side.
    fn load_data_side(&self, patterns: &[String], sampling: &SamplingSettings, label: &str) -> Result<Side> {
        let paths = resolve_file_path_patterns(patterns).context("failed to resolve input file paths")?;
        let mut reader = RecordReader::new(paths, self.record_settings());
        let inference = infer(&mut reader, &sampling.infer_options());
        if let Some(failure) = reader.take_failure() {
            return Err(failure).context(format!("failed to read inputs for {label}"));
        }
        if inference.truncated {
            warn!(%label, "input exceeded the record ceiling; inferred from a truncated stream");
        }
        info!(%label, sampled = inference.sampled, skipped = inference.skipped, "inferred data side");
        Ok(Side::data(label, inference))
    }
}

impl SamplingSettings {
    fn infer_options(&self) -> InferOptions {
        InferOptions {
            sample_size: self.sample_size,
            seed: self.seed,
            all_records: self.all_records,
            infer_datetimes: !self.no_datetime,
            union_cap: self.union_cap,
            ..InferOptions::default()
        }
    }
}

impl CompareOut {
    fn load_side(&self, data: &[String], schema: Option<&Path>) -> Result<Side> {
        match schema {
            Some(path) => {
                let side = wire::load_side(path)?;
                info!(label = %side.label, required = side.required.len(), "loaded schema side");
                Ok(side)
            }
            None => self.input_settings.load_data_side(data, &self.sampling, &data.join(",")),
        }
    }

    fn options(&self) -> CompareOptions {
        CompareOptions {
            fields: (!self.fields.is_empty()).then(|| self.fields.clone()),
            include_common: self.show_common,
            union_cap: self.sampling.union_cap,
        }
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn init_logging(&self) {
        let level = match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };
        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_writer(std::io::stderr)
            .init();
    }

    pub fn run(&self) -> Result<ExitCode> {
        match &self.cmd {
            Command::Infer(target) => {
                let label = target.label.clone().unwrap_or_else(|| target.input.join(","));
                let side = target
                    .input_settings
                    .load_data_side(&target.input, &target.sampling, &label)?;
                write_or_print(target.out.as_deref(), &wire::to_pretty_string(&side))?;
                Ok(ExitCode::SUCCESS)
            }
            Command::Compare(target) => {
                if target.no_color {
                    colored::control::set_override(false);
                }

                // both sides are independent; load them concurrently
                let (left, right) = rayon::join(
                    || target.load_side(&target.left, target.left_schema.as_deref()),
                    || target.load_side(&target.right, target.right_schema.as_deref()),
                );
                let (left, right) = (left?, right?);

                if let Some(dir) = target.dump_schemas.as_ref() {
                    dump_schemas(dir, &left, &right)?;
                }

                let diff = compare(&left, &right, &target.options());
                let rendered = match target.format {
                    Format::Text => render::render_text(&diff, &left.label, &right.label),
                    Format::Json => render::render_json(&diff, &left.label, &right.label)?,
                };
                println!("{rendered}");

                Ok(if diff.is_empty() { ExitCode::SUCCESS } else { ExitCode::from(1) })
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn write_or_print(out: Option<&Path>, contents: &str) -> Result<()> {
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(out, contents).with_context(|| format!("failed to write {}", out.display()))
        }
        None => {
            println!("{contents}");
            Ok(())
        }
    }
}

fn dump_schemas(dir: &Path, left: &Side, right: &Side) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    for (name, side) in [("left.side.json", left), ("right.side.json", right)] {
        let path = dir.join(name);
        write_or_print(Some(&path), &wire::to_pretty_string(side))?;
        info!(path = %path.display(), "dumped normalized side");
    }
    Ok(())
}
