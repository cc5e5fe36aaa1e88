//! # lottie-studio
//!
//! Command-line front end for the studio's Lottie interchange.
//!
//! ## Commands
//! - `export`: Convert a project file to a Lottie document
//! - `import`: Convert a Lottie document to a project file
//! - `validate`: Check a Lottie document for structural problems
//! - `sample`: Print one property's value at a point in time
//! - `svg`: Turn SVG artwork into a project

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use lottie_studio::svg::{import_svg_with, SvgImportOptions};
use lottie_studio::{read_json, read_lottie, read_project, write_json};
use std::fs;
use std::path::PathBuf;
use studio_core::model::{AnimProperty, KeyframeValue};
use studio_lottie::{export_project, validate, ExportOptions, ValidationStatus};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lottie-studio")]
#[command(about = "Lottie import, export and inspection for studio projects")]
#[command(version)]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a project to Lottie JSON
    Export {
        /// Project file (.json)
        project: PathBuf,

        /// Output path (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Value written to the document's `v` field
        #[arg(long, default_value = studio_lottie::export::DEFAULT_LOTTIE_VERSION)]
        lottie_version: String,

        /// Document name (defaults to the project name)
        #[arg(long)]
        name: Option<String>,

        /// Stroke line cap
        #[arg(long, value_enum, default_value_t = LineCap::Round)]
        line_cap: LineCap,

        /// Stroke line join
        #[arg(long, value_enum, default_value_t = LineJoin::Round)]
        line_join: LineJoin,

        /// Stroke miter limit
        #[arg(long, default_value = "4")]
        miter_limit: f64,

        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },

    /// Import a Lottie document into a project
    Import {
        /// Lottie file (.json)
        lottie: PathBuf,

        /// Output path (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate the structure of a Lottie document
    Validate {
        /// Lottie file (.json)
        lottie: PathBuf,
    },

    /// Sample an animated property
    Sample {
        /// Project file (.json)
        project: PathBuf,

        /// Layer id
        #[arg(short, long)]
        layer: String,

        /// Property name, e.g. "x", "scaleY", "fill"
        #[arg(short, long)]
        property: String,

        /// Time in seconds
        #[arg(short, long)]
        time: f64,
    },

    /// Convert SVG artwork into a project
    Svg {
        /// SVG file
        file: PathBuf,

        /// Output path (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Project frame rate
        #[arg(long, default_value = "30")]
        fps: f64,

        /// Project duration in seconds
        #[arg(long, default_value = "2")]
        duration: f64,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LineCap {
    Butt,
    Round,
    Square,
}

impl LineCap {
    fn code(self) -> u8 {
        match self {
            LineCap::Butt => 1,
            LineCap::Round => 2,
            LineCap::Square => 3,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LineJoin {
    Miter,
    Round,
    Bevel,
}

impl LineJoin {
    fn code(self) -> u8 {
        match self {
            LineJoin::Miter => 1,
            LineJoin::Round => 2,
            LineJoin::Bevel => 3,
        }
    }
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_json);

    match cli.command {
        Commands::Export {
            project,
            output,
            lottie_version,
            name,
            line_cap,
            line_join,
            miter_limit,
            pretty,
        } => {
            let options = ExportOptions {
                version: lottie_version,
                name,
                line_cap: line_cap.code(),
                line_join: line_join.code(),
                miter_limit,
            };
            cmd_export(project, output, &options, pretty)
        }
        Commands::Import { lottie, output } => cmd_import(lottie, output),
        Commands::Validate { lottie } => cmd_validate(lottie),
        Commands::Sample {
            project,
            layer,
            property,
            time,
        } => cmd_sample(project, &layer, &property, time),
        Commands::Svg {
            file,
            output,
            fps,
            duration,
        } => cmd_svg(file, output, fps, duration),
    }
}

fn cmd_export(
    project: PathBuf,
    output: Option<PathBuf>,
    options: &ExportOptions,
    pretty: bool,
) -> Result<()> {
    if !(options.miter_limit.is_finite() && options.miter_limit >= 1.0) {
        bail!("Miter limit must be at least 1, got {}", options.miter_limit);
    }
    let project = read_project(&project)?;
    let doc = export_project(&project, options);
    write_json(&doc, output.as_deref(), pretty)
}

fn cmd_import(lottie: PathBuf, output: Option<PathBuf>) -> Result<()> {
    let imported = read_lottie(&lottie)?;
    for warning in &imported.warnings {
        eprintln!("warning: {warning}");
    }
    write_json(&imported.project, output.as_deref(), true)
}

fn cmd_validate(lottie: PathBuf) -> Result<()> {
    let doc = read_json(&lottie)?;
    let report = validate(&doc);

    for issue in &report.errors {
        println!("error: {issue}");
    }
    for issue in &report.warnings {
        println!("warning: {issue}");
    }
    match report.status {
        ValidationStatus::Valid => println!("{}: valid", lottie.display()),
        ValidationStatus::ValidWithWarnings => println!(
            "{}: valid with {} warning(s)",
            lottie.display(),
            report.warnings.len()
        ),
        ValidationStatus::Invalid => bail!(
            "{} is invalid: {} error(s)",
            lottie.display(),
            report.errors.len()
        ),
    }
    Ok(())
}

fn cmd_sample(project: PathBuf, layer: &str, property: &str, time: f64) -> Result<()> {
    let project = read_project(&project)?;
    let property: AnimProperty = property.parse()?;
    let value = project
        .sample(layer, property, time)
        .with_context(|| format!("Layer not found: {layer}"))?;
    match value {
        KeyframeValue::Number(n) => println!("{n}"),
        KeyframeValue::Color(c) => println!("{c}"),
    }
    Ok(())
}

fn cmd_svg(file: PathBuf, output: Option<PathBuf>, fps: f64, duration: f64) -> Result<()> {
    let text = fs::read_to_string(&file)
        .with_context(|| format!("Failed to read SVG {}", file.display()))?;
    let project = import_svg_with(&text, &SvgImportOptions { fps, duration })?;
    write_json(&project, output.as_deref(), true)
}
