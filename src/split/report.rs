//! Summary of a split run.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use super::{SplitOptions, Subset};
use crate::batch::{FailureLog, TransferMode};

/// What a split run did, per subset.
#[derive(Clone, Debug, Serialize)]
pub struct SplitReport {
    pub source: PathBuf,
    pub dest: PathBuf,
    pub mode: TransferMode,
    pub seed: u64,
    pub ratios: [f64; 3],
    /// Images found under `<source>/images`.
    pub discovered: usize,
    /// Discovered images that had a label file.
    pub labeled: usize,
    /// Label files with no matching image.
    pub orphan_labels: usize,
    pub subsets: Vec<SubsetCounts>,
    /// True when the run stopped at a destination conflict.
    pub halted: bool,
    /// Path of the written `data.yaml`, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_yaml: Option<PathBuf>,
    pub warnings: Vec<String>,
    pub failures: FailureLog,
}

/// Per-subset counters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SubsetCounts {
    pub subset: Subset,
    pub assigned: usize,
    pub images: usize,
    pub labels: usize,
    /// Samples left in place because a destination already existed.
    pub skipped: usize,
}

impl SplitReport {
    pub(crate) fn new(opts: &SplitOptions) -> Self {
        Self {
            source: opts.source_dir.clone(),
            dest: opts.dest_dir.clone(),
            mode: opts.mode,
            seed: opts.policy.seed,
            ratios: opts.policy.ratios(),
            discovered: 0,
            labeled: 0,
            orphan_labels: 0,
            subsets: Subset::ALL
                .into_iter()
                .map(|subset| SubsetCounts {
                    subset,
                    assigned: 0,
                    images: 0,
                    labels: 0,
                    skipped: 0,
                })
                .collect(),
            halted: false,
            data_yaml: None,
            warnings: Vec::new(),
            failures: FailureLog::new(),
        }
    }

    pub(crate) fn warn(&mut self, message: String) {
        log::warn!("{message}");
        self.warnings.push(message);
    }

    pub fn subset(&self, subset: Subset) -> &SubsetCounts {
        &self.subsets[subset.index()]
    }

    pub(crate) fn subset_mut(&mut self, subset: Subset) -> &mut SubsetCounts {
        &mut self.subsets[subset.index()]
    }

    /// Images transferred across all subsets.
    pub fn transferred(&self) -> usize {
        self.subsets.iter().map(|s| s.images).sum()
    }

    /// Samples skipped because of destination conflicts.
    pub fn skipped(&self) -> usize {
        self.subsets.iter().map(|s| s.skipped).sum()
    }

    /// Files that were attempted: every assigned sample, plus labels.
    pub fn attempted(&self) -> usize {
        self.discovered + self.labeled
    }

    /// No failures, no skips, and not halted.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.skipped() == 0 && !self.halted
    }
}

impl fmt::Display for SplitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [train, val, test] = self.ratios;
        writeln!(
            f,
            "Split {} image(s) from {} into {} ({}, seed {}, ratios {:.2}/{:.2}/{:.2})",
            self.discovered,
            self.source.display(),
            self.dest.display(),
            self.mode.verb(),
            self.seed,
            train,
            val,
            test
        )?;
        writeln!(
            f,
            "  labeled: {}, orphan labels: {}",
            self.labeled, self.orphan_labels
        )?;
        for counts in &self.subsets {
            write!(
                f,
                "  {:<6} {} assigned, {} image(s), {} label(s)",
                format!("{}:", counts.subset),
                counts.assigned,
                counts.images,
                counts.labels
            )?;
            if counts.skipped > 0 {
                write!(f, ", {} skipped", counts.skipped)?;
            }
            writeln!(f)?;
        }

        if self.halted {
            writeln!(f, "  halted at the first destination conflict")?;
        }
        if let Some(path) = &self.data_yaml {
            writeln!(f, "  wrote {}", path.display())?;
        }

        if !self.warnings.is_empty() {
            writeln!(f)?;
            writeln!(f, "Warnings ({}):", self.warnings.len())?;
            for warning in &self.warnings {
                writeln!(f, "  - {}", warning)?;
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::ConflictPolicy;
    use crate::split::SplitPolicy;

    fn options() -> SplitOptions {
        SplitOptions {
            source_dir: "datas".into(),
            dest_dir: "datasets".into(),
            policy: SplitPolicy::default(),
            mode: TransferMode::Copy,
            on_conflict: ConflictPolicy::Halt,
            data_yaml: false,
            class_names: None,
            progress: false,
        }
    }

    #[test]
    fn display_lists_subsets() {
        let mut report = SplitReport::new(&options());
        report.discovered = 10;
        report.subset_mut(Subset::Train).assigned = 8;
        report.subset_mut(Subset::Train).images = 8;
        report.subset_mut(Subset::Val).skipped = 1;

        let text = report.to_string();
        assert!(text.contains("Split 10 image(s) from datas into datasets (copy, seed 42"));
        assert!(text.contains("train: 8 assigned, 8 image(s), 0 label(s)"));
        assert!(text.contains("1 skipped"));
        assert!(!report.is_clean());
    }

    #[test]
    fn serializes_subsets_and_mode() {
        let report = SplitReport::new(&options());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["mode"], "copy");
        assert_eq!(json["subsets"][1]["subset"], "val");
        assert!(json.get("data_yaml").is_none());
        assert_eq!(json["failures"], serde_json::json!([]));
    }
}
