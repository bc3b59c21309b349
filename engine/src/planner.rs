//! Path planning.
//!
//! Maps a source directory (by its path relative to the source root) onto
//! the destination tree, and builds the CopyTask for each file found there.
//! Everything here is pure path computation.

use std::path::{Path, PathBuf};

use crate::model::{BackupRequest, CopyTask};

/// Destination directory for files found at `relative_dir`.
///
/// Nested mode joins the relative path onto `dest_root` ("." maps to the
/// root itself); flatten mode always answers `dest_root`.
pub fn target_dir(dest_root: &Path, relative_dir: &Path, flatten: bool) -> PathBuf {
    if flatten || relative_dir.as_os_str().is_empty() || relative_dir == Path::new(".") {
        dest_root.to_path_buf()
    } else {
        dest_root.join(relative_dir)
    }
}

/// Plan the copy of `source_file`, which must lie under the request's source root.
pub fn plan_copy(request: &BackupRequest, source_file: &Path) -> CopyTask {
    let relative_dir = source_file
        .parent()
        .and_then(|parent| parent.strip_prefix(&request.source_root).ok())
        .unwrap_or_else(|| Path::new("."));
    let dir = target_dir(&request.dest_root, relative_dir, request.flatten);

    let planned_dest_file = match source_file.file_name() {
        Some(name) => dir.join(name),
        None => dir,
    };

    CopyTask {
        source_file: source_file.to_path_buf(),
        planned_dest_file,
    }
}
