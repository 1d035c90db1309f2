//! Reproducible train/val/test splitting of a flat image corpus.
//!
//! The source tree is `<source>/images/` holding `.jpg`, `.jpeg` and `.png`
//! files, with optional `<source>/labels/<stem>.txt` label files. Samples
//! are sorted by file name, shuffled with a seeded RNG, and cut into
//! contiguous train, val and test runs, so the same inputs, ratios and seed
//! always give the same assignment. The split is then materialized as
//! `<dest>/<subset>/images/` and `<dest>/<subset>/labels/`.
//!
//! Concurrent runs against the same destination are not coordinated; an
//! interrupted run can leave a partial split behind.

mod data_yaml;
mod report;

pub use data_yaml::{read_classes_txt, write_data_yaml, DATA_YAML};
pub use report::{SplitReport, SubsetCounts};

use std::collections::{BTreeMap, BTreeSet};
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use rand::seq::SliceRandom;
use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;

use crate::batch::{self, ConflictPolicy, FailureLog, TransferMode};
use crate::error::YoloprepError;

/// Image extensions picked up from the source tree (case-insensitive).
pub const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];
const LABEL_EXTENSION: &str = "txt";
const CLASSES_TXT: &str = "classes.txt";
const RATIO_TOLERANCE: f64 = 1e-6;

/// A named subset of the split, in materialization order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Subset {
    Train,
    Val,
    Test,
}

impl Subset {
    pub const ALL: [Subset; 3] = [Subset::Train, Subset::Val, Subset::Test];

    pub fn name(self) -> &'static str {
        match self {
            Subset::Train => "train",
            Subset::Val => "val",
            Subset::Test => "test",
        }
    }

    fn index(self) -> usize {
        match self {
            Subset::Train => 0,
            Subset::Val => 1,
            Subset::Test => 2,
        }
    }
}

impl fmt::Display for Subset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Split ratios plus the shuffle seed.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SplitPolicy {
    pub train: f64,
    pub val: f64,
    pub test: f64,
    pub seed: u64,
}

impl SplitPolicy {
    pub fn new([train, val, test]: [f64; 3], seed: u64) -> Self {
        Self {
            train,
            val,
            test,
            seed,
        }
    }

    pub fn ratios(&self) -> [f64; 3] {
        [self.train, self.val, self.test]
    }

    /// Ratios must be finite, non-negative, and sum to 1.0 (within 1e-6).
    pub fn validate(&self) -> Result<(), YoloprepError> {
        for (subset, ratio) in Subset::ALL.iter().zip(self.ratios()) {
            if !ratio.is_finite() || ratio < 0.0 {
                return Err(YoloprepError::InvalidSplitPolicy {
                    message: format!("{subset} ratio must be a non-negative number, got {ratio}"),
                });
            }
        }

        let sum: f64 = self.ratios().iter().sum();
        if (sum - 1.0).abs() > RATIO_TOLERANCE {
            return Err(YoloprepError::InvalidSplitPolicy {
                message: format!("ratios must sum to 1.0, got {sum}"),
            });
        }

        Ok(())
    }
}

impl Default for SplitPolicy {
    fn default() -> Self {
        Self::new([0.8, 0.1, 0.1], 42)
    }
}

/// An image and its optional label file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sample {
    /// Image file name, e.g. `cat_001.jpg`, for sorting and display.
    /// Lossy when the on-disk name is not UTF-8; `image` keeps the real one.
    pub file_name: String,
    /// File name without extension; the label file is `<stem>.txt`.
    pub stem: String,
    pub image: PathBuf,
    pub label: Option<PathBuf>,
}

/// What a scan of the source tree found.
#[derive(Clone, Debug, Default)]
pub struct Discovery {
    /// Samples sorted by image file name.
    pub samples: Vec<Sample>,
    /// Label files with no matching image; never transferred.
    pub orphan_labels: Vec<PathBuf>,
    /// Images whose stem was already taken by an earlier image; they are
    /// split without a label.
    pub shared_stems: Vec<String>,
    /// False when `<source>/labels` does not exist.
    pub has_labels_dir: bool,
}

/// Scan `<source>/images` and pair each image with `<source>/labels/<stem>.txt`.
pub fn discover_samples(source: &Path) -> Result<Discovery, YoloprepError> {
    let images_dir = source.join("images");
    let labels_dir = source.join("labels");

    if !images_dir.is_dir() {
        return Err(YoloprepError::SourceLayout {
            path: images_dir,
            message: "missing images/ directory".to_string(),
        });
    }

    let mut image_files = batch::collect_files_with_extensions(&images_dir, &IMAGE_EXTENSIONS, 1)?;
    image_files.sort_by_cached_key(|path| batch::rel_string(&images_dir, path));

    let has_labels_dir = labels_dir.is_dir();
    let mut stems: BTreeSet<OsString> = BTreeSet::new();
    let mut samples = Vec::with_capacity(image_files.len());
    let mut shared_stems = Vec::new();

    for image in image_files {
        let file_name = batch::rel_string(&images_dir, &image);
        let os_stem = image.file_stem().unwrap_or_default().to_os_string();
        let stem = os_stem.to_string_lossy().into_owned();

        let label = if !stems.insert(os_stem.clone()) {
            shared_stems.push(file_name.clone());
            None
        } else if has_labels_dir {
            let candidate = labels_dir.join(label_file_name(&os_stem));
            candidate.is_file().then_some(candidate)
        } else {
            None
        };

        samples.push(Sample {
            file_name,
            stem,
            image,
            label,
        });
    }

    let mut orphan_labels = Vec::new();
    if has_labels_dir {
        let mut label_files =
            batch::collect_files_with_extensions(&labels_dir, &[LABEL_EXTENSION], 1)?;
        label_files.sort();
        for label in label_files {
            let is_classes_txt = label.file_name().is_some_and(|name| name == CLASSES_TXT);
            let stem = label.file_stem().unwrap_or_default();
            if !is_classes_txt && !stems.contains(stem) {
                orphan_labels.push(label);
            }
        }
    }

    Ok(Discovery {
        samples,
        orphan_labels,
        shared_stems,
        has_labels_dir,
    })
}

fn label_file_name(stem: &OsStr) -> OsString {
    let mut name = stem.to_os_string();
    name.push(".");
    name.push(LABEL_EXTENSION);
    name
}

/// Samples per subset for `n` samples, in train, val, test order.
///
/// Train and val get `round(ratio * n)`, each capped by what is left; test
/// takes the remainder so the sizes always add up to `n`.
pub fn subset_sizes(n: usize, policy: &SplitPolicy) -> [usize; 3] {
    let mut remaining = n;
    let mut sizes = [0; 3];
    for (slot, ratio) in sizes.iter_mut().zip([policy.train, policy.val]) {
        let size = ((ratio * n as f64).round() as usize).min(remaining);
        *slot = size;
        remaining -= size;
    }
    sizes[2] = remaining;
    sizes
}

/// Subset membership for every sample.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SplitAssignment {
    subsets: [Vec<Sample>; 3],
}

impl SplitAssignment {
    /// Samples assigned to `subset`, sorted by file name.
    pub fn get(&self, subset: Subset) -> &[Sample] {
        &self.subsets[subset.index()]
    }

    pub fn len(&self) -> usize {
        self.subsets.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Which subset a file name was assigned to.
    pub fn subset_of(&self, file_name: &str) -> Option<Subset> {
        Subset::ALL
            .into_iter()
            .find(|subset| self.get(*subset).iter().any(|s| s.file_name == file_name))
    }

    /// File name to subset, for comparing assignments.
    pub fn membership(&self) -> BTreeMap<String, Subset> {
        self.iter()
            .map(|(subset, sample)| (sample.file_name.clone(), subset))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Subset, &Sample)> {
        Subset::ALL
            .into_iter()
            .flat_map(move |subset| self.get(subset).iter().map(move |s| (subset, s)))
    }
}

/// Assign samples to subsets.
///
/// Samples are sorted by file name first, so the result depends only on the
/// set of samples, the ratios, and the seed.
pub fn assign(mut samples: Vec<Sample>, policy: &SplitPolicy) -> Result<SplitAssignment, YoloprepError> {
    policy.validate()?;

    samples.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    let mut rng = StdRng::seed_from_u64(policy.seed);
    samples.shuffle(&mut rng);

    let [train_len, val_len, _] = subset_sizes(samples.len(), policy);
    let mut test = samples.split_off(train_len + val_len);
    let mut val = samples.split_off(train_len);
    let mut train = samples;

    for subset in [&mut train, &mut val, &mut test] {
        subset.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    }

    Ok(SplitAssignment {
        subsets: [train, val, test],
    })
}

/// Inputs for [`split_dataset`].
#[derive(Clone, Debug)]
pub struct SplitOptions {
    pub source_dir: PathBuf,
    pub dest_dir: PathBuf,
    pub policy: SplitPolicy,
    pub mode: TransferMode,
    pub on_conflict: ConflictPolicy,
    /// Write `<dest>/data.yaml` after materializing.
    pub data_yaml: bool,
    /// Class names for `data.yaml`; falls back to `<source>/classes.txt`.
    pub class_names: Option<Vec<String>>,
    pub progress: bool,
}

/// Split `source_dir` into `dest_dir`.
///
/// Policy and layout problems, an empty source, and an unreadable
/// `classes.txt` fail before anything is written. Per-file transfer failures are collected in the report. Under
/// [`ConflictPolicy::Halt`] the first existing destination stops the run
/// with [`YoloprepError::SplitConflict`], which carries the partial report.
pub fn split_dataset(opts: &SplitOptions) -> Result<SplitReport, YoloprepError> {
    opts.policy.validate()?;

    let discovery = discover_samples(&opts.source_dir)?;
    if discovery.samples.is_empty() {
        return Err(YoloprepError::EmptySource {
            path: opts.source_dir.join("images"),
        });
    }
    let class_names = if opts.data_yaml {
        Some(resolve_class_names(opts)?)
    } else {
        None
    };

    let mut report = SplitReport::new(opts);
    report.discovered = discovery.samples.len();
    report.labeled = discovery
        .samples
        .iter()
        .filter(|s| s.label.is_some())
        .count();
    report.orphan_labels = discovery.orphan_labels.len();

    if !discovery.has_labels_dir {
        report.warn(format!(
            "no labels/ directory in {}; splitting images only",
            opts.source_dir.display()
        ));
    }
    for orphan in &discovery.orphan_labels {
        report.warn(format!(
            "label {} has no matching image and was left in place",
            orphan.display()
        ));
    }
    for file_name in &discovery.shared_stems {
        report.warn(format!(
            "image {file_name} shares its stem with another image; split without a label"
        ));
    }

    let assignment = assign(discovery.samples, &opts.policy)?;
    for subset in Subset::ALL {
        report.subset_mut(subset).assigned = assignment.get(subset).len();
    }
    info!(
        "assigned {} sample(s): {} train, {} val, {} test",
        assignment.len(),
        assignment.get(Subset::Train).len(),
        assignment.get(Subset::Val).len(),
        assignment.get(Subset::Test).len()
    );

    for subset in Subset::ALL {
        for kind in ["images", "labels"] {
            batch::ensure_dir(&opts.dest_dir.join(subset.name()).join(kind))?;
        }
    }

    if opts.mode == TransferMode::Move {
        warn!(
            "moving files out of {}; the source tree will be modified",
            opts.source_dir.display()
        );
    }

    let mut failures = FailureLog::new();
    for subset in Subset::ALL {
        let samples = assignment.get(subset);
        if samples.is_empty() {
            continue;
        }

        let pb = batch::progress_bar(samples.len() as u64, subset.name(), opts.progress);
        let images_dir = opts.dest_dir.join(subset.name()).join("images");
        let labels_dir = opts.dest_dir.join(subset.name()).join("labels");

        for sample in samples {
            pb.inc(1);
            // Destinations keep the on-disk names, which need not be UTF-8.
            let image_dst = images_dir.join(sample.image.file_name().unwrap_or_default());
            let label_dst = sample
                .label
                .as_ref()
                .map(|label| labels_dir.join(label.file_name().unwrap_or_default()));

            let conflict = std::iter::once(&image_dst)
                .chain(label_dst.as_ref())
                .find(|path| batch::path_exists(path));
            if let Some(conflict) = conflict {
                match opts.on_conflict {
                    ConflictPolicy::Halt => {
                        pb.abandon();
                        report.halted = true;
                        report.failures = failures;
                        return Err(YoloprepError::SplitConflict {
                            path: conflict.clone(),
                            report: Box::new(report),
                        });
                    }
                    ConflictPolicy::Skip => {
                        warn!(
                            "skipping {}: {} already exists",
                            sample.file_name,
                            conflict.display()
                        );
                        report.subset_mut(subset).skipped += 1;
                        continue;
                    }
                }
            }

            if let Err(err) = batch::transfer(&sample.image, &image_dst, opts.mode) {
                failures.record(&sample.image, &err);
                continue;
            }
            report.subset_mut(subset).images += 1;

            if let (Some(label), Some(label_dst)) = (&sample.label, &label_dst) {
                match batch::transfer(label, label_dst, opts.mode) {
                    Ok(()) => report.subset_mut(subset).labels += 1,
                    Err(err) => failures.record(label, &err),
                }
            }
        }
        pb.finish_and_clear();
        debug!("{subset}: done");
    }
    report.failures = failures;

    if let Some(names) = class_names {
        let names = names.unwrap_or_else(|| {
            report.warn(format!(
                "no class names given and no {} found; data.yaml lists no names",
                opts.source_dir.join(CLASSES_TXT).display()
            ));
            Vec::new()
        });
        match write_data_yaml(&opts.dest_dir, &names) {
            Ok(path) => report.data_yaml = Some(path),
            Err(err) => report.failures.record(&opts.dest_dir.join(DATA_YAML), &err),
        }
    }

    info!(
        "split complete: {} transferred, {} skipped, {} failed",
        report.transferred(),
        report.skipped(),
        report.failures.len()
    );
    Ok(report)
}

/// Class names for `data.yaml`: the explicit list, else `<source>/classes.txt`.
///
/// `None` when neither exists. A malformed `classes.txt` is an error.
fn resolve_class_names(opts: &SplitOptions) -> Result<Option<Vec<String>>, YoloprepError> {
    if let Some(names) = &opts.class_names {
        return Ok(Some(names.clone()));
    }
    let classes_txt = opts.source_dir.join(CLASSES_TXT);
    if classes_txt.is_file() {
        read_classes_txt(&classes_txt).map(Some)
    } else {
        Ok(None)
    }
}
