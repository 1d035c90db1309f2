//! `data.yaml` dataset descriptor for Ultralytics-style training configs.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::batch;
use crate::error::YoloprepError;

pub const DATA_YAML: &str = "data.yaml";

#[derive(Debug, Serialize)]
struct DataYaml {
    path: String,
    train: &'static str,
    val: &'static str,
    test: &'static str,
    names: BTreeMap<usize, String>,
}

/// Write `<dest>/data.yaml` pointing at the split subsets.
///
/// `path` is the absolute destination. An existing file is replaced.
pub fn write_data_yaml(dest: &Path, names: &[String]) -> Result<PathBuf, YoloprepError> {
    let path = dest.join(DATA_YAML);
    let doc = DataYaml {
        path: std::path::absolute(dest)
            .unwrap_or_else(|_| dest.to_path_buf())
            .to_string_lossy()
            .replace('\\', "/"),
        train: "train/images",
        val: "val/images",
        test: "test/images",
        names: names.iter().cloned().enumerate().collect(),
    };

    let text = serde_yaml::to_string(&doc).map_err(|source| YoloprepError::DatasetYamlWrite {
        path: path.clone(),
        source,
    })?;
    batch::write_atomic(&path, text.as_bytes())?;

    log::info!("wrote {}", path.display());
    Ok(path)
}

/// Class names from a `classes.txt`, one per line.
pub fn read_classes_txt(path: &Path) -> Result<Vec<String>, YoloprepError> {
    let data = fs::read_to_string(path).map_err(YoloprepError::Io)?;
    let mut names = Vec::new();

    for (line_idx, line) in data.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Err(YoloprepError::SourceLayout {
                path: path.to_path_buf(),
                message: format!("line {} of classes.txt is empty", line_idx + 1),
            });
        }
        names.push(trimmed.to_string());
    }

    Ok(names)
}
