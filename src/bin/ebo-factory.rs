//! Command line driver for the application factory.
//!
//! # Usage
//!
//! One template, one workbook:
//! ```sh
//! ebo-factory generate --workbook items.xlsx --template vav.xml \
//!     --output vav_apps.xml --max-items 300 --group-by "{{Level}}"
//! ```
//!
//! One template per sheet, from the command line or a YAML job:
//! ```sh
//! ebo-factory batch --workbook items.xlsx --prefix out/apps \
//!     --map VAV=templates/vav.xml --map AHU=templates/ahu.xml
//! ebo-factory batch --job job.yaml
//! ```
//!
//! Blank input workbook for templates:
//! ```sh
//! ebo-factory scaffold templates/vav.xml templates/ahu.xml -o items.xlsx
//! ```

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use ebo_factory::document::DocumentOptions;
use ebo_factory::factory::{
    ApplicationFactory, FactoryManager, FactoryOptions, JobConfig, TracingProgress,
};
use ebo_factory::scaffold::scaffold_files;
use ebo_factory::table::{FactoryInputs, SheetSelector};
use ebo_factory::template::Template;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Generate EcoStruxure Building Operation import documents from templates
/// and spreadsheets
#[derive(Parser, Debug)]
#[command(name = "ebo-factory")]
struct Cli {
    /// Log more detail (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate documents from one template and the records of a workbook
    Generate(GenerateArgs),
    /// Generate documents per sheet, each sheet with its own template
    Batch(BatchArgs),
    /// Write a blank input workbook for templates
    Scaffold(ScaffoldArgs),
}

/// Envelope overrides for generated documents
#[derive(Args, Debug, Default)]
struct EnvelopeArgs {
    /// Platform version written into generated documents
    #[arg(long = "ebo-version", value_name = "VERSION")]
    version: Option<String>,

    /// Server full path written into generated documents
    #[arg(long, value_name = "PATH")]
    server_path: Option<String>,

    /// Export mode written into generated documents
    #[arg(long, value_name = "MODE")]
    export_mode: Option<String>,
}

impl EnvelopeArgs {
    fn apply(&self, mut options: DocumentOptions) -> DocumentOptions {
        if let Some(version) = &self.version {
            options = options.with_version(version.as_str());
        }
        if let Some(path) = &self.server_path {
            options = options.with_server_full_path(path.as_str());
        }
        if let Some(mode) = &self.export_mode {
            options = options.with_export_mode(mode.as_str());
        }
        options
    }
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Input workbook (.xlsx)
    #[arg(short, long)]
    workbook: PathBuf,

    /// Template document (.xml)
    #[arg(short, long)]
    template: PathBuf,

    /// Output document; numbered `<stem>_<n>.xml` when --max-items is set
    #[arg(short, long)]
    output: PathBuf,

    /// Sheets to read (default: every sheet but `meta`)
    #[arg(short, long = "sheet", value_name = "NAME")]
    sheets: Vec<String>,

    /// Instance objects per output document
    #[arg(long, value_name = "N")]
    max_items: Option<usize>,

    /// Group copies into one folder per value of this placeholder literal
    #[arg(long, value_name = "LITERAL")]
    group_by: Option<String>,

    #[command(flatten)]
    envelope: EnvelopeArgs,
}

#[derive(Args, Debug)]
struct BatchArgs {
    /// YAML job description
    #[arg(long, conflicts_with_all = ["workbook", "map", "prefix"])]
    job: Option<PathBuf>,

    /// Input workbook (.xlsx)
    #[arg(short, long, required_unless_present = "job")]
    workbook: Option<PathBuf>,

    /// Template of a sheet, as SHEET=TEMPLATE (repeatable)
    #[arg(short, long, value_name = "SHEET=TEMPLATE", value_parser = parse_mapping)]
    map: Vec<(String, PathBuf)>,

    /// Output prefix, files become `<prefix>_<sheet>_<n>.xml`
    #[arg(short, long, required_unless_present = "job")]
    prefix: Option<PathBuf>,

    /// Sheets to read (default: every sheet but `meta`)
    #[arg(short, long = "sheet", value_name = "NAME")]
    sheets: Vec<String>,

    /// Records per output document
    #[arg(long, value_name = "N")]
    max_items: Option<usize>,

    #[command(flatten)]
    envelope: EnvelopeArgs,
}

#[derive(Args, Debug)]
struct ScaffoldArgs {
    /// Template documents, one sheet each
    #[arg(value_name = "TEMPLATE", required = true)]
    templates: Vec<PathBuf>,

    /// Workbook to write
    #[arg(short, long)]
    output: PathBuf,
}

/// Parse `KEY=VALUE` mappings
fn parse_mapping(s: &str) -> std::result::Result<(String, PathBuf), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() && !value.is_empty() => {
            Ok((key.to_string(), PathBuf::from(value)))
        },
        _ => Err(format!("expected SHEET=TEMPLATE, got '{}'", s)),
    }
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| "ebo_factory=info".into()),
        1 => "ebo_factory=debug".into(),
        _ => "ebo_factory=trace".into(),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn generate(args: GenerateArgs) -> Result<Vec<PathBuf>> {
    let template = Template::open(&args.template)
        .with_context(|| format!("loading template {}", args.template.display()))?;
    let inputs = FactoryInputs::open(&args.workbook, &SheetSelector::from_names(args.sheets))
        .with_context(|| format!("reading workbook {}", args.workbook.display()))?;
    let records = inputs.to_records();
    let options = FactoryOptions::new()
        .with_document(args.envelope.apply(DocumentOptions::default()))
        .with_max_items_per_document(args.max_items.unwrap_or(0));

    let factory = ApplicationFactory::new(&template, inputs.placeholders(), &records, options)?;
    let written = factory.run(&args.output, args.group_by.as_deref(), &mut TracingProgress)?;
    Ok(written)
}

fn batch(args: BatchArgs) -> Result<Vec<PathBuf>> {
    let (mut job, base_dir) = match &args.job {
        Some(path) => {
            let job = JobConfig::load(path)
                .with_context(|| format!("loading job {}", path.display()))?;
            (job, path.parent().unwrap_or(Path::new("")).to_path_buf())
        },
        None => {
            let (Some(workbook), Some(prefix)) = (args.workbook, args.prefix) else {
                bail!("--workbook and --prefix are required without --job");
            };
            if args.map.is_empty() {
                bail!("at least one --map SHEET=TEMPLATE is required without --job");
            }
            let job = JobConfig {
                workbook,
                output_prefix: prefix,
                templates: args.map.into_iter().collect(),
                ..Default::default()
            };
            (job, PathBuf::new())
        },
    };

    if !args.sheets.is_empty() {
        job.sheets = args.sheets;
    }
    if args.max_items.is_some() {
        job.max_items_per_document = args.max_items;
    }
    job.document = args.envelope.apply(job.document);

    let manager = FactoryManager::from_job(&job, &base_dir)?;
    Ok(manager.make_documents(&mut TracingProgress)?)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let written = match cli.command {
        Command::Generate(args) => generate(args)?,
        Command::Batch(args) => batch(args)?,
        Command::Scaffold(args) => {
            scaffold_files(&args.templates, &args.output)
                .with_context(|| format!("scaffolding {}", args.output.display()))?;
            vec![args.output]
        },
    };

    for path in &written {
        println!("{}", path.display());
    }
    if written.is_empty() {
        tracing::warn!("no documents written");
    }
    Ok(())
}
