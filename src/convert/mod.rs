//! Batch conversion of label files between row formats.
//!
//! A conversion walks every `.txt` file under an input directory, parses it
//! in the source format, converts each record, and writes the result either
//! to a mirrored path under an output directory or back over the source.
//!
//! Failure handling is layered:
//!
//! - a malformed line fails its whole file and nothing is written for it;
//! - a record with unusable geometry is dropped with a warning and the rest
//!   of the file is still written;
//! - a file that cannot be read or written is recorded and the batch moves on.
//!
//! Every write is atomic, so an interrupted in-place run never leaves a
//! truncated label file.

mod report;

pub use report::{
    ConvertIssue, ConvertIssueCode, ConvertReport, ConvertSeverity, FileCounts, RecordCounts,
};

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::Serialize;

use crate::batch::{self, FailureLog};
use crate::error::YoloprepError;
use crate::geometry::{self, Converted, GeometryError};
use crate::label::{self, LabelFormat, LabelRecord, Shape};

const LABEL_EXTENSION: &str = "txt";
const CLASSES_TXT: &str = "classes.txt";

/// Direction of a conversion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ConversionMode {
    /// Axis-aligned boxes to four-corner quads.
    #[serde(rename = "detect2obb")]
    DetectToObb,
    /// Four-corner quads to enclosing axis-aligned boxes.
    #[serde(rename = "obb2detect")]
    ObbToDetect,
    /// Rotated boxes to four-corner quads.
    #[serde(rename = "xywhr2obb")]
    XywhrToObb,
}

impl ConversionMode {
    pub fn name(self) -> &'static str {
        match self {
            ConversionMode::DetectToObb => "detect2obb",
            ConversionMode::ObbToDetect => "obb2detect",
            ConversionMode::XywhrToObb => "xywhr2obb",
        }
    }

    pub fn source_format(self) -> LabelFormat {
        match self {
            ConversionMode::DetectToObb => LabelFormat::Detect,
            ConversionMode::ObbToDetect => LabelFormat::Obb,
            ConversionMode::XywhrToObb => LabelFormat::Xywhr,
        }
    }

    pub fn target_format(self) -> LabelFormat {
        match self {
            ConversionMode::DetectToObb | ConversionMode::XywhrToObb => LabelFormat::Obb,
            ConversionMode::ObbToDetect => LabelFormat::Detect,
        }
    }
}

impl fmt::Display for ConversionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where converted files go.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConvertDestination {
    /// Mirror the input tree under this directory.
    Directory(PathBuf),
    /// Replace each source file.
    InPlace,
}

/// Inputs for [`convert_labels`].
#[derive(Clone, Debug)]
pub struct ConvertOptions {
    pub input_dir: PathBuf,
    pub destination: ConvertDestination,
    pub mode: ConversionMode,
    /// Rotation in radians for `detect2obb`; must be 0 for other modes.
    pub angle: f64,
    pub progress: bool,
}

/// Convert one record's geometry.
///
/// The target follows from the shape: boxes and rotated boxes become quads,
/// quads become boxes. `angle` only applies to boxes.
pub fn convert_shape(shape: Shape, angle: f64) -> Result<Converted<Shape>, GeometryError> {
    match shape {
        Shape::Box(b) => geometry::detect_to_obb(b, angle).map(|c| c.map(Shape::Quad)),
        Shape::Quad(q) => geometry::obb_to_detect(&q).map(|c| c.map(Shape::Box)),
        Shape::Rotated(r) => geometry::rotated_to_obb(r).map(|c| c.map(Shape::Quad)),
    }
}

/// Outcome of converting a single file's text.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FileConversion {
    pub records: Vec<LabelRecord>,
    pub read: usize,
    pub clamped: usize,
    pub rotation_discarded: usize,
    /// `(line, error)` for each dropped record.
    pub skipped: Vec<(usize, GeometryError)>,
}

/// Parse `content` in the mode's source format and convert every record.
///
/// Fails only on a malformed line; geometry problems drop the record.
pub fn convert_text(
    content: &str,
    mode: ConversionMode,
    angle: f64,
    path: &Path,
) -> Result<FileConversion, YoloprepError> {
    let format = mode.source_format();
    let mut parsed = Vec::new();
    for (line_idx, line) in content.lines().enumerate() {
        if let Some(record) = label::parse_label_line(line, format, path, line_idx + 1)? {
            parsed.push((line_idx + 1, record));
        }
    }

    let mut out = FileConversion {
        records: Vec::with_capacity(parsed.len()),
        read: parsed.len(),
        ..Default::default()
    };
    for (line, record) in parsed {
        match convert_shape(record.shape, angle) {
            Ok(converted) => {
                out.clamped += usize::from(converted.clamped);
                out.rotation_discarded += usize::from(converted.rotation_discarded);
                out.records.push(LabelRecord::new(record.class_id, converted.value));
            }
            Err(err) => out.skipped.push((line, err)),
        }
    }
    Ok(out)
}

/// Convert every label file under `opts.input_dir`.
///
/// Invalid parameters and a missing input directory fail before anything
/// is written. Per-file failures are collected in the report.
pub fn convert_labels(opts: &ConvertOptions) -> Result<ConvertReport, YoloprepError> {
    validate_options(opts)?;

    let output_dir = match &opts.destination {
        ConvertDestination::Directory(dir) => Some(dir.clone()),
        ConvertDestination::InPlace => None,
    };
    let mut report = ConvertReport::new(opts.mode, &opts.input_dir, output_dir.clone());

    let mut failures = FailureLog::new();
    let mut files = batch::collect_files_recording_failures(
        &opts.input_dir,
        &[LABEL_EXTENSION],
        usize::MAX,
        &mut failures,
    )?;
    files.sort_by_cached_key(|path| batch::rel_string(&opts.input_dir, path));
    files.retain(|path| {
        let is_classes_txt = path.file_name().is_some_and(|name| name == CLASSES_TXT);
        if is_classes_txt {
            report.add(ConvertIssue::info(
                ConvertIssueCode::SkippedClassesFile,
                format!("skipped {}: class list, not a label file", path.display()),
            ));
        }
        !is_classes_txt
    });
    // Unreadable entries count as found files that failed.
    report.files.found = files.len() + failures.len();
    report.files.failed = failures.len();

    if output_dir.is_none() && !files.is_empty() {
        report.add(ConvertIssue::info(
            ConvertIssueCode::OverwroteInPlace,
            format!(
                "{} label file(s) rewritten in place as {}",
                files.len(),
                opts.mode.target_format()
            ),
        ));
    }
    info!(
        "converting {} label file(s) under {} ({})",
        files.len(),
        opts.input_dir.display(),
        opts.mode
    );

    let pb = batch::progress_bar(files.len() as u64, opts.mode.name(), opts.progress);
    for path in &files {
        pb.inc(1);
        let dst = match &output_dir {
            Some(dir) => dir.join(path.strip_prefix(&opts.input_dir).unwrap_or(path)),
            None => path.clone(),
        };

        match convert_file(path, &dst, opts, &mut report) {
            Ok(()) => report.files.converted += 1,
            Err(err) => {
                failures.record(path, &err);
                report.files.failed += 1;
            }
        }
    }
    pb.finish_and_clear();
    report.failures = failures;

    info!(
        "conversion complete: {} converted, {} failed, {} record(s) skipped",
        report.files.converted, report.files.failed, report.records.skipped
    );
    Ok(report)
}

fn convert_file(
    src: &Path,
    dst: &Path,
    opts: &ConvertOptions,
    report: &mut ConvertReport,
) -> Result<(), YoloprepError> {
    let content = fs::read_to_string(src)?;
    let converted = convert_text(&content, opts.mode, opts.angle, src)?;
    label::write_label_file(dst, &converted.records)?;

    report.records.read += converted.read;
    report.records.written += converted.records.len();
    report.records.skipped += converted.skipped.len();
    report.records.clamped += converted.clamped;
    report.records.rotation_discarded += converted.rotation_discarded;

    for (line, source) in converted.skipped {
        let err = YoloprepError::Geometry {
            path: src.to_path_buf(),
            line,
            source,
        };
        report.add(ConvertIssue::warning(
            ConvertIssueCode::SkippedRecord,
            format!("record skipped: {err}"),
        ));
    }
    if converted.clamped > 0 {
        report.add(ConvertIssue::warning(
            ConvertIssueCode::ClampedCoordinates,
            format!(
                "{}: {} record(s) clamped to the image bounds",
                src.display(),
                converted.clamped
            ),
        ));
    }
    if converted.rotation_discarded > 0 {
        report.add(ConvertIssue::warning(
            ConvertIssueCode::RotationDiscarded,
            format!(
                "{}: {} rotated record(s) reduced to bounding boxes",
                src.display(),
                converted.rotation_discarded
            ),
        ));
    }

    debug!("{} -> {}", src.display(), dst.display());
    Ok(())
}

fn validate_options(opts: &ConvertOptions) -> Result<(), YoloprepError> {
    if !opts.angle.is_finite() {
        return Err(YoloprepError::InvalidConvertParams {
            message: format!("angle must be a finite number of radians, got {}", opts.angle),
        });
    }
    if opts.angle != 0.0 && opts.mode != ConversionMode::DetectToObb {
        return Err(YoloprepError::InvalidConvertParams {
            message: format!("--angle only applies to detect2obb, not {}", opts.mode),
        });
    }
    if !opts.input_dir.is_dir() {
        return Err(YoloprepError::SourceLayout {
            path: opts.input_dir.clone(),
            message: "input directory does not exist".to_string(),
        });
    }
    if let ConvertDestination::Directory(dir) = &opts.destination {
        if same_dir(dir, &opts.input_dir) {
            return Err(YoloprepError::InvalidConvertParams {
                message: "output directory is the input directory; use --overwrite instead"
                    .to_string(),
            });
        }
    }
    Ok(())
}

fn same_dir(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
