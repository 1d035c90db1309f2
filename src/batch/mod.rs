//! File-system primitives shared by the splitter and the label converter.
//!
//! Multi-file operations are best effort per file: callers record each
//! failure in a [`FailureLog`] and move on, then report the log at the end.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, warn};
use serde::Serialize;
use walkdir::WalkDir;

use crate::error::{ErrorKind, YoloprepError};

/// Whether sources are kept after a transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferMode {
    /// Rename into place; destructive on the source tree.
    Move,
    /// Copy; the source tree is left untouched.
    Copy,
}

impl TransferMode {
    pub fn verb(self) -> &'static str {
        match self {
            TransferMode::Move => "move",
            TransferMode::Copy => "copy",
        }
    }
}

/// What to do when a destination file already exists.
///
/// Existing files are never overwritten under either policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Stop at the first conflict.
    #[default]
    Halt,
    /// Warn, leave the sample where it is, and continue.
    Skip,
}

/// Move or copy a single file.
///
/// Fails when `src` is not a file or when anything already exists at
/// `dst`. Parent directories of `dst` are created as needed. A move that
/// cannot rename across devices falls back to copy then delete.
pub fn transfer(src: &Path, dst: &Path, mode: TransferMode) -> Result<(), YoloprepError> {
    if !src.is_file() {
        return Err(YoloprepError::MissingSource {
            path: src.to_path_buf(),
        });
    }
    if path_exists(dst) {
        return Err(YoloprepError::DestinationExists {
            path: dst.to_path_buf(),
        });
    }
    if let Some(parent) = dst.parent() {
        ensure_dir(parent)?;
    }

    let transfer_err = |source: io::Error| YoloprepError::Transfer {
        from: src.to_path_buf(),
        to: dst.to_path_buf(),
        source,
    };

    match mode {
        TransferMode::Copy => {
            fs::copy(src, dst).map_err(transfer_err)?;
        }
        TransferMode::Move => match fs::rename(src, dst) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::CrossesDevices => {
                debug!(
                    "rename across devices, copying instead: {} -> {}",
                    src.display(),
                    dst.display()
                );
                if let Err(err) = fs::copy(src, dst) {
                    let _ = fs::remove_file(dst);
                    return Err(transfer_err(err));
                }
                fs::remove_file(src).map_err(transfer_err)?;
            }
            Err(err) => return Err(transfer_err(err)),
        },
    }

    debug!("{} {} -> {}", mode.verb(), src.display(), dst.display());
    Ok(())
}

/// Create a directory and its parents. Succeeds if it already exists.
pub fn ensure_dir(path: &Path) -> Result<(), YoloprepError> {
    if path.as_os_str().is_empty() {
        return Ok(());
    }
    fs::create_dir_all(path).map_err(|source| YoloprepError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

/// Replace `path` with `bytes` atomically.
///
/// Writes a temporary file next to `path` and renames it over the target,
/// so readers see either the old content or the new content in full. An
/// existing target keeps its permissions.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".yoloprep-")
        .suffix(".tmp")
        .tempfile_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;

    if let Ok(meta) = fs::metadata(path) {
        fs::set_permissions(tmp.path(), meta.permissions())?;
    }

    tmp.persist(path).map_err(|err| err.error)?;
    Ok(())
}

/// True if anything (including a dangling symlink) exists at `path`.
pub fn path_exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// One file that could not be processed.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub kind: ErrorKind,
    pub message: String,
}

/// Per-file failures collected during a batch.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FailureLog {
    failures: Vec<FileFailure>,
}

impl FailureLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure for `path` and log it.
    pub fn record(&mut self, path: &Path, err: &YoloprepError) {
        warn!("{}: {}", path.display(), err);
        self.failures.push(FileFailure {
            path: path.to_path_buf(),
            kind: err.kind(),
            message: err.to_string(),
        });
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileFailure> {
        self.failures.iter()
    }
}

/// Progress bar for a batch of `len` files; hidden when disabled.
pub fn progress_bar(len: u64, label: &str, enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len);
    let style = ProgressStyle::with_template(&format!(
        "{{spinner:.green}} [{}] [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} ({{eta}})",
        label
    ))
    .map(|style| style.progress_chars("#>-"))
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}

/// Files under `root` whose extension matches one of `extensions`
/// (case-insensitive), searched at most `max_depth` levels deep.
pub(crate) fn collect_files_with_extensions(
    root: &Path,
    extensions: &[&str],
    max_depth: usize,
) -> Result<Vec<PathBuf>, YoloprepError> {
    walk_files(root, extensions, max_depth, |source| {
        Err(YoloprepError::SourceLayout {
            path: root.to_path_buf(),
            message: format!("failed while traversing directory: {source}"),
        })
    })
}

/// Like [`collect_files_with_extensions`], but an entry below `root` that
/// cannot be read is recorded in `failures` and the walk goes on. Only an
/// unreadable `root` is fatal.
///
/// Broken entries are recorded when they could hold matching files: a
/// path with a matching extension, or a directory.
pub(crate) fn collect_files_recording_failures(
    root: &Path,
    extensions: &[&str],
    max_depth: usize,
    failures: &mut FailureLog,
) -> Result<Vec<PathBuf>, YoloprepError> {
    walk_files(root, extensions, max_depth, |source| {
        let path = source.path().unwrap_or(root).to_path_buf();
        if source.depth() == 0 {
            return Err(YoloprepError::SourceLayout {
                path,
                message: format!("failed while traversing directory: {source}"),
            });
        }
        if has_extension(&path, extensions) || path.is_dir() {
            failures.record(&path, &YoloprepError::Io(io::Error::from(source)));
        } else {
            debug!("ignoring unreadable entry {}: {source}", path.display());
        }
        Ok(())
    })
}

fn walk_files(
    root: &Path,
    extensions: &[&str],
    max_depth: usize,
    mut on_error: impl FnMut(walkdir::Error) -> Result<(), YoloprepError>,
) -> Result<Vec<PathBuf>, YoloprepError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).max_depth(max_depth).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(source) => {
                on_error(source)?;
                continue;
            }
        };

        if entry.file_type().is_file() && has_extension(entry.path(), extensions) {
            files.push(entry.path().to_path_buf());
        }
    }

    Ok(files)
}

pub(crate) fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };

    allowed
        .iter()
        .any(|allowed_ext| ext.eq_ignore_ascii_case(allowed_ext))
}

pub(crate) fn rel_string(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.to_string_lossy().replace('\\', "/")
}
