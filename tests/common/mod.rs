#![allow(dead_code)]

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use yoloprep::batch::{ConflictPolicy, TransferMode};
use yoloprep::split::{SplitOptions, SplitPolicy};

pub const DETECT_ROW: &str = "0 0.500000 0.500000 0.100000 0.100000\n";

pub fn write_file(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, contents).expect("write file");
}

pub fn image_name(idx: usize) -> String {
    format!("img_{idx:03}.jpg")
}

/// `<root>/images/img_NNN.jpg` for `0..count`, with a label for each index
/// in `labeled`.
pub fn build_source(root: &Path, count: usize, labeled: impl Fn(usize) -> bool) {
    fs::create_dir_all(root.join("images")).expect("create images dir");
    fs::create_dir_all(root.join("labels")).expect("create labels dir");
    for idx in 0..count {
        write_file(
            &root.join("images").join(image_name(idx)),
            &format!("image {idx}"),
        );
        if labeled(idx) {
            write_file(
                &root.join("labels").join(format!("img_{idx:03}.txt")),
                DETECT_ROW,
            );
        }
    }
}

/// File names directly under `dir`; empty when `dir` is missing.
pub fn file_names(dir: &Path) -> BTreeSet<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return BTreeSet::new();
    };
    entries
        .filter_map(Result::ok)
        .filter(|entry| entry.path().is_file())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect()
}

pub fn split_options(source: &Path, dest: &Path, mode: TransferMode) -> SplitOptions {
    SplitOptions {
        source_dir: source.to_path_buf(),
        dest_dir: dest.to_path_buf(),
        policy: SplitPolicy::new([0.8, 0.1, 0.1], 42),
        mode,
        on_conflict: ConflictPolicy::Halt,
        data_yaml: false,
        class_names: None,
        progress: false,
    }
}
