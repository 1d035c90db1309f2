//! YOLO label file reader and writer.
//!
//! A label file holds one record per line, whitespace separated, in one of
//! three row formats:
//!
//! | format  | fields                                |
//! |---------|---------------------------------------|
//! | `detect`| `class cx cy w h`                     |
//! | `obb`   | `class x1 y1 x2 y2 x3 y3 x4 y4`       |
//! | `xywhr` | `class cx cy w h angle` (radians)     |
//!
//! Coordinates are normalized floats, `class` is a non-negative integer.
//! Blank lines are skipped. Any malformed line fails the whole file so a
//! half-parsed label set is never converted.

use std::fmt::{self, Write as _};
use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::batch;
use crate::error::YoloprepError;
use crate::geometry::{CxCyWh, Quad, RotatedBox};

/// Row format of a label file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelFormat {
    /// Axis-aligned `class cx cy w h`.
    Detect,
    /// Four-corner `class x1 y1 x2 y2 x3 y3 x4 y4`.
    Obb,
    /// Rotated box `class cx cy w h angle`.
    Xywhr,
}

impl LabelFormat {
    /// Number of whitespace-separated fields per row, class included.
    pub fn field_count(self) -> usize {
        match self {
            LabelFormat::Detect => 5,
            LabelFormat::Obb => 9,
            LabelFormat::Xywhr => 6,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            LabelFormat::Detect => "detect",
            LabelFormat::Obb => "obb",
            LabelFormat::Xywhr => "xywhr",
        }
    }
}

impl fmt::Display for LabelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Geometry payload of a record.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape {
    Box(CxCyWh),
    Quad(Quad),
    Rotated(RotatedBox),
}

impl Shape {
    /// The row format this shape is written in.
    pub fn format(&self) -> LabelFormat {
        match self {
            Shape::Box(_) => LabelFormat::Detect,
            Shape::Quad(_) => LabelFormat::Obb,
            Shape::Rotated(_) => LabelFormat::Xywhr,
        }
    }
}

/// One line of a label file.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LabelRecord {
    pub class_id: usize,
    pub shape: Shape,
}

impl LabelRecord {
    pub fn new(class_id: usize, shape: Shape) -> Self {
        Self { class_id, shape }
    }
}

const DETECT_FIELDS: [&str; 4] = ["x_center", "y_center", "width", "height"];
const OBB_FIELDS: [&str; 8] = ["x1", "y1", "x2", "y2", "x3", "y3", "x4", "y4"];
const XYWHR_FIELDS: [&str; 5] = ["x_center", "y_center", "width", "height", "angle"];

/// Read and parse a label file.
pub fn read_label_file(path: &Path, format: LabelFormat) -> Result<Vec<LabelRecord>, YoloprepError> {
    let content = fs::read_to_string(path).map_err(YoloprepError::Io)?;
    parse_labels(&content, format, path)
}

/// Parse the contents of a label file. `path` is only used in errors.
pub fn parse_labels(
    content: &str,
    format: LabelFormat,
    path: &Path,
) -> Result<Vec<LabelRecord>, YoloprepError> {
    let mut records = Vec::new();
    for (line_idx, line) in content.lines().enumerate() {
        if let Some(record) = parse_label_line(line, format, path, line_idx + 1)? {
            records.push(record);
        }
    }
    Ok(records)
}

/// Parse one label line. Blank lines yield `Ok(None)`.
pub fn parse_label_line(
    line: &str,
    format: LabelFormat,
    file_path: &Path,
    line_num: usize,
) -> Result<Option<LabelRecord>, YoloprepError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let expected = format.field_count();
    // One extra token is enough to tell "too many" apart without collecting the rest.
    let tokens: Vec<&str> = trimmed.split_whitespace().take(expected + 1).collect();
    if tokens.len() != expected {
        let found = if tokens.len() > expected {
            format!("more than {expected}")
        } else {
            tokens.len().to_string()
        };
        return Err(YoloprepError::LabelParse {
            path: file_path.to_path_buf(),
            line: line_num,
            message: format!("expected {expected} fields for {format} labels, found {found}"),
        });
    }

    let class_id = tokens[0]
        .parse::<usize>()
        .map_err(|_| YoloprepError::LabelParse {
            path: file_path.to_path_buf(),
            line: line_num,
            message: format!(
                "invalid class_id '{}'; expected non-negative integer",
                tokens[0]
            ),
        })?;

    let shape = match format {
        LabelFormat::Detect => {
            let [cx, cy, w, h] = parse_fields(&tokens[1..], DETECT_FIELDS, file_path, line_num)?;
            Shape::Box(CxCyWh::new(cx, cy, w, h))
        }
        LabelFormat::Obb => {
            let flat = parse_fields(&tokens[1..], OBB_FIELDS, file_path, line_num)?;
            Shape::Quad(Quad::from_flat(flat))
        }
        LabelFormat::Xywhr => {
            let [cx, cy, w, h, angle] =
                parse_fields(&tokens[1..], XYWHR_FIELDS, file_path, line_num)?;
            Shape::Rotated(RotatedBox::new(cx, cy, w, h, angle))
        }
    };

    Ok(Some(LabelRecord { class_id, shape }))
}

/// Fuzz-only entrypoint for single-line parsing in every format.
#[cfg(feature = "fuzzing")]
pub fn fuzz_parse_label_line(input: &str) -> Result<(), YoloprepError> {
    for format in [LabelFormat::Detect, LabelFormat::Obb, LabelFormat::Xywhr] {
        let _ = parse_label_line(input, format, Path::new("<fuzz>"), 1)?;
    }
    Ok(())
}

fn parse_fields<const N: usize>(
    tokens: &[&str],
    names: [&str; N],
    file_path: &Path,
    line_num: usize,
) -> Result<[f64; N], YoloprepError> {
    let mut values = [0.0; N];
    for (slot, (raw, name)) in values.iter_mut().zip(tokens.iter().zip(names)) {
        *slot = parse_f64_token(raw, name, file_path, line_num)?;
    }
    Ok(values)
}

fn parse_f64_token(
    raw: &str,
    field_name: &str,
    file_path: &Path,
    line_num: usize,
) -> Result<f64, YoloprepError> {
    raw.parse::<f64>()
        .map_err(|_| YoloprepError::LabelParse {
            path: file_path.to_path_buf(),
            line: line_num,
            message: format!("invalid {field_name} '{raw}'; expected floating-point number"),
        })
}

/// Render records as label-file text: one line per record, 6 decimal places.
pub fn render_labels(records: &[LabelRecord]) -> String {
    let mut out = String::new();
    for record in records {
        render_record(record, &mut out);
    }
    out
}

fn render_record(record: &LabelRecord, out: &mut String) {
    // Writing into a String cannot fail.
    let _ = write!(out, "{}", record.class_id);
    match record.shape {
        Shape::Box(b) => {
            let _ = write!(out, " {:.6} {:.6} {:.6} {:.6}", b.cx, b.cy, b.w, b.h);
        }
        Shape::Quad(q) => {
            for v in q.to_flat() {
                let _ = write!(out, " {:.6}", v);
            }
        }
        Shape::Rotated(r) => {
            let _ = write!(
                out,
                " {:.6} {:.6} {:.6} {:.6} {:.6}",
                r.cx, r.cy, r.w, r.h, r.angle
            );
        }
    }
    out.push('\n');
}

/// Write records to `path` atomically, creating parent directories.
///
/// The file is either fully replaced or left untouched.
pub fn write_label_file(path: &Path, records: &[LabelRecord]) -> Result<(), YoloprepError> {
    let text = render_labels(records);
    batch::write_atomic(path, text.as_bytes()).map_err(|source| YoloprepError::LabelWrite {
        path: path.to_path_buf(),
        source,
    })
}
