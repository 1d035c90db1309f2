//! Report types for label conversion runs.
//!
//! Counts are tracked per file and per record. Lossiness (clamping, dropped
//! rotation, skipped records) is surfaced as issues with stable codes so
//! JSON consumers can filter on them.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use super::ConversionMode;
use crate::batch::FailureLog;

/// A report generated by [`super::convert_labels`].
#[derive(Clone, Debug, Serialize)]
pub struct ConvertReport {
    pub mode: ConversionMode,
    pub input: PathBuf,
    /// Output directory; `None` when files were rewritten in place.
    pub output: Option<PathBuf>,
    pub files: FileCounts,
    pub records: RecordCounts,
    pub issues: Vec<ConvertIssue>,
    pub failures: FailureLog,
}

impl ConvertReport {
    pub fn new(mode: ConversionMode, input: impl Into<PathBuf>, output: Option<PathBuf>) -> Self {
        Self {
            mode,
            input: input.into(),
            output,
            files: FileCounts::default(),
            records: RecordCounts::default(),
            issues: Vec::new(),
            failures: FailureLog::new(),
        }
    }

    pub fn add(&mut self, issue: ConvertIssue) {
        if issue.severity == ConvertSeverity::Warning {
            log::warn!("{}", issue.message);
        } else {
            log::info!("{}", issue.message);
        }
        self.issues.push(issue);
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == ConvertSeverity::Warning)
            .count()
    }

    pub fn info_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == ConvertSeverity::Info)
            .count()
    }

    /// True if any record was clamped, skipped, or lost its rotation.
    pub fn is_lossy(&self) -> bool {
        self.warning_count() > 0
    }
}

impl fmt::Display for ConvertReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let target = match &self.output {
            Some(dir) => dir.display().to_string(),
            None => "in place".to_string(),
        };
        writeln!(
            f,
            "Converted {} ({}) -> {}",
            self.input.display(),
            self.mode,
            target
        )?;
        writeln!(
            f,
            "  files: {} found, {} converted, {} failed",
            self.files.found, self.files.converted, self.files.failed
        )?;
        writeln!(
            f,
            "  records: {} read, {} written, {} skipped",
            self.records.read, self.records.written, self.records.skipped
        )?;
        if self.records.clamped > 0 || self.records.rotation_discarded > 0 {
            writeln!(
                f,
                "  lossy: {} clamped, {} rotation discarded",
                self.records.clamped, self.records.rotation_discarded
            )?;
        }

        for (severity, title, count) in [
            (ConvertSeverity::Warning, "Warnings", self.warning_count()),
            (ConvertSeverity::Info, "Notes", self.info_count()),
        ] {
            if count == 0 {
                continue;
            }
            writeln!(f)?;
            writeln!(f, "{} ({}):", title, count)?;
            for issue in self.issues.iter().filter(|i| i.severity == severity) {
                writeln!(f, "  - {}", issue.message)?;
            }
        }

        if !self.failures.is_empty() {
            writeln!(f)?;
            writeln!(f, "Failures ({}):", self.failures.len())?;
            for failure in self.failures.iter() {
                writeln!(f, "  - {}", failure.message)?;
            }
        }

        Ok(())
    }
}

/// Label-file counters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FileCounts {
    /// `.txt` files found under the input directory, `classes.txt` excluded.
    pub found: usize,
    pub converted: usize,
    pub failed: usize,
}

/// Per-record counters across all converted files.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RecordCounts {
    pub read: usize,
    pub written: usize,
    /// Records dropped for invalid geometry.
    pub skipped: usize,
    /// Written records with at least one coordinate clamped into `[0, 1]`.
    pub clamped: usize,
    /// Rotated quads reduced to an axis-aligned box.
    pub rotation_discarded: usize,
}

/// A single issue noted during conversion.
#[derive(Clone, Debug, Serialize)]
pub struct ConvertIssue {
    pub severity: ConvertSeverity,
    pub code: ConvertIssueCode,
    pub message: String,
}

impl ConvertIssue {
    pub fn warning(code: ConvertIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: ConvertSeverity::Warning,
            code,
            message: message.into(),
        }
    }

    pub fn info(code: ConvertIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: ConvertSeverity::Info,
            code,
            message: message.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvertSeverity {
    /// Information was lost.
    Warning,
    /// A policy note.
    Info,
}

/// Stable issue codes; part of the JSON output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvertIssueCode {
    /// A record had degenerate, non-finite, or out-of-image geometry.
    SkippedRecord,
    /// Coordinates were clamped into the unit square.
    ClampedCoordinates,
    /// A rotated quad was reduced to its bounding box.
    RotationDiscarded,
    /// `classes.txt` is not a label file and was left alone.
    SkippedClassesFile,
    /// Source files were overwritten.
    OverwroteInPlace,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn display_groups_issues_by_severity() {
        let mut report = ConvertReport::new(ConversionMode::ObbToDetect, "labels", None);
        report.files.found = 2;
        report.files.converted = 2;
        report.records.read = 3;
        report.records.written = 3;
        report.records.rotation_discarded = 1;
        report.add(ConvertIssue::warning(
            ConvertIssueCode::RotationDiscarded,
            "1 rotated record(s) in a.txt reduced to bounding boxes",
        ));
        report.add(ConvertIssue::info(
            ConvertIssueCode::SkippedClassesFile,
            "skipped classes.txt",
        ));

        let text = report.to_string();
        assert!(text.starts_with("Converted labels (obb2detect) -> in place\n"));
        assert!(text.contains("files: 2 found, 2 converted, 0 failed"));
        assert!(text.contains("lossy: 0 clamped, 1 rotation discarded"));
        assert!(text.contains("Warnings (1):"));
        assert!(text.contains("Notes (1):"));
        assert!(report.is_lossy());
    }

    #[test]
    fn json_uses_snake_case_codes() {
        let mut report = ConvertReport::new(
            ConversionMode::DetectToObb,
            "in",
            Some(Path::new("out").to_path_buf()),
        );
        report.add(ConvertIssue::warning(
            ConvertIssueCode::ClampedCoordinates,
            "clamped",
        ));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["mode"], "detect2obb");
        assert_eq!(json["issues"][0]["code"], "clamped_coordinates");
        assert_eq!(json["issues"][0]["severity"], "warning");
        assert_eq!(json["output"], "out");
    }
}
