//! yoloprep: dataset preparation for YOLO-style detection training.
//!
//! Two jobs, both run as single-threaded batch operations over a directory
//! tree:
//!
//! - **split**: partition `<source>/images` (plus matching labels) into
//!   reproducible train/val/test subsets under a destination directory.
//! - **convert**: rewrite label files between the axis-aligned `detect`,
//!   four-corner `obb`, and rotated `xywhr` row formats.
//!
//! # Modules
//!
//! - [`geometry`]: Box, quad, and rotated-box transforms
//! - [`label`]: Label file parsing and rendering
//! - [`batch`]: File transfer, atomic writes, and per-file failure tracking
//! - [`split`]: Dataset splitting
//! - [`convert`]: Label conversion
//! - [`error`]: Error types for yoloprep operations

pub mod batch;
pub mod convert;
pub mod error;
pub mod geometry;
pub mod label;
pub mod split;

use std::fmt;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use batch::{ConflictPolicy, TransferMode};
use convert::{ConversionMode, ConvertDestination, ConvertOptions};
use split::{SplitOptions, SplitPolicy};

pub use error::YoloprepError;

/// The yoloprep CLI application.
#[derive(Parser)]
#[command(name = "yoloprep")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Split an image corpus into train/val/test subsets.
    Split(SplitArgs),
    /// Convert label files between detect, obb, and xywhr formats.
    Convert(ConvertArgs),
}

#[derive(clap::Args)]
struct SplitArgs {
    /// Directory holding images/ and (optionally) labels/.
    #[arg(long, env = "YOLOPREP_SOURCE_DIR", default_value = "datas")]
    source_dir: PathBuf,

    /// Directory to create train/, val/ and test/ under.
    #[arg(long, env = "YOLOPREP_DEST_DIR", default_value = "datasets")]
    dest_dir: PathBuf,

    /// Train, val and test ratios; must sum to 1.0.
    #[arg(
        long,
        num_args = 3,
        value_names = ["TRAIN", "VAL", "TEST"],
        default_values_t = [0.8, 0.1, 0.1]
    )]
    ratios: Vec<f64>,

    /// Seed for the shuffle.
    #[arg(long, env = "YOLOPREP_SEED", default_value_t = 42)]
    seed: u64,

    /// Copy files instead of moving them out of the source tree.
    #[arg(long)]
    copy: bool,

    /// What to do when a destination file already exists.
    #[arg(long, value_enum, default_value_t = ConflictArg::Halt)]
    on_conflict: ConflictArg,

    /// Write <dest-dir>/data.yaml after splitting.
    #[arg(long)]
    data_yaml: bool,

    /// Comma-separated class names for data.yaml (default: <source-dir>/classes.txt).
    #[arg(long, value_delimiter = ',', requires = "data_yaml")]
    names: Option<Vec<String>>,

    /// Do not ask before moving files.
    #[arg(short = 'y', long)]
    yes: bool,

    /// Report format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    /// Hide progress bars.
    #[arg(long)]
    no_progress: bool,
}

#[derive(clap::Args)]
struct ConvertArgs {
    /// Conversion direction.
    #[arg(value_enum)]
    mode: ModeArg,

    /// Directory of label files (searched recursively).
    #[arg(long)]
    input_dir: PathBuf,

    /// Write converted files here, mirroring the input layout.
    #[arg(long, conflicts_with = "overwrite", required_unless_present = "overwrite")]
    output_dir: Option<PathBuf>,

    /// Rewrite the input files in place.
    #[arg(long)]
    overwrite: bool,

    /// Rotation in radians applied to synthesized quads (detect2obb only).
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    angle: f64,

    /// Do not ask before overwriting input files.
    #[arg(short = 'y', long)]
    yes: bool,

    /// Report format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    /// Hide progress bars.
    #[arg(long)]
    no_progress: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, ValueEnum)]
enum ConflictArg {
    /// Stop at the first existing destination file.
    Halt,
    /// Leave conflicting samples in place and continue.
    Skip,
}

impl From<ConflictArg> for ConflictPolicy {
    fn from(value: ConflictArg) -> Self {
        match value {
            ConflictArg::Halt => ConflictPolicy::Halt,
            ConflictArg::Skip => ConflictPolicy::Skip,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, ValueEnum)]
enum ModeArg {
    /// Axis-aligned boxes to four-corner quads.
    #[value(name = "detect2obb")]
    DetectToObb,
    /// Four-corner quads to axis-aligned bounding boxes (drops rotation).
    #[value(name = "obb2detect")]
    ObbToDetect,
    /// Rotated boxes (cx cy w h angle) to four-corner quads.
    #[value(name = "xywhr2obb")]
    XywhrToObb,
}

impl From<ModeArg> for ConversionMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::DetectToObb => ConversionMode::DetectToObb,
            ModeArg::ObbToDetect => ConversionMode::ObbToDetect,
            ModeArg::XywhrToObb => ConversionMode::XywhrToObb,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Run the yoloprep CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), YoloprepError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Split(args)) => run_split(args),
        Some(Commands::Convert(args)) => run_convert(args),
        None => {
            println!("yoloprep {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Dataset splitting and label conversion for YOLO-style datasets.");
            println!();
            println!("Run 'yoloprep --help' for usage information.");
            Ok(())
        }
    }
}

fn run_split(args: SplitArgs) -> Result<(), YoloprepError> {
    let ratios = <[f64; 3]>::try_from(args.ratios.as_slice()).map_err(|_| {
        YoloprepError::InvalidSplitPolicy {
            message: format!("expected 3 ratios, got {}", args.ratios.len()),
        }
    })?;
    let policy = SplitPolicy::new(ratios, args.seed);
    policy.validate()?;

    let mode = if args.copy {
        TransferMode::Copy
    } else {
        TransferMode::Move
    };
    if mode == TransferMode::Move && !args.yes {
        let prompt = format!(
            "Move files out of {} into {}? The source tree will be modified.",
            args.source_dir.display(),
            args.dest_dir.display()
        );
        if !confirm(&prompt)? {
            return Err(YoloprepError::Cancelled);
        }
    }

    let opts = SplitOptions {
        source_dir: args.source_dir,
        dest_dir: args.dest_dir,
        policy,
        mode,
        on_conflict: args.on_conflict.into(),
        data_yaml: args.data_yaml,
        class_names: args.names,
        progress: !args.no_progress,
    };

    let report = match split::split_dataset(&opts) {
        Ok(report) => report,
        Err(YoloprepError::SplitConflict { path, report }) => {
            print_report(report.as_ref(), args.output)?;
            return Err(YoloprepError::SplitConflict { path, report });
        }
        Err(err) => return Err(err),
    };
    print_report(&report, args.output)?;

    if report.failures.is_empty() {
        Ok(())
    } else {
        Err(YoloprepError::BatchFailed {
            failed: report.failures.len(),
            total: report.attempted(),
        })
    }
}

fn run_convert(args: ConvertArgs) -> Result<(), YoloprepError> {
    let destination = match args.output_dir {
        Some(dir) => ConvertDestination::Directory(dir),
        None => ConvertDestination::InPlace,
    };

    if destination == ConvertDestination::InPlace && !args.yes {
        let prompt = format!(
            "Overwrite label files under {} in place?",
            args.input_dir.display()
        );
        if !confirm(&prompt)? {
            return Err(YoloprepError::Cancelled);
        }
    }

    let opts = ConvertOptions {
        input_dir: args.input_dir,
        destination,
        mode: args.mode.into(),
        angle: args.angle,
        progress: !args.no_progress,
    };
    let report = convert::convert_labels(&opts)?;
    print_report(&report, args.output)?;

    if report.failures.is_empty() {
        Ok(())
    } else {
        Err(YoloprepError::BatchFailed {
            failed: report.files.failed,
            total: report.files.found,
        })
    }
}

/// Ask a yes/no question on stderr; anything but `y`/`yes` is a no.
fn confirm(prompt: &str) -> Result<bool, YoloprepError> {
    eprint!("{prompt} [y/N] ");
    io::stderr().flush()?;

    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}

fn print_report<R>(report: &R, output: OutputFormat) -> Result<(), YoloprepError>
where
    R: Serialize + fmt::Display,
{
    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Text => print!("{report}"),
    }
    Ok(())
}
