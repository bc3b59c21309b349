//! Collision resolution.
//!
//! A destination that already exists is never overwritten: the new file gets
//! a UTC timestamp inserted between its stem and extension
//! (`report.txt` -> `report_20240131-235959.txt`). The format is fixed-width
//! so disambiguated names sort by creation time.
//!
//! The existence check and the later copy are separate steps. A file that
//! appears at the resolved path in between is overwritten, and two
//! collisions resolved within the same second produce the same name.

use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

/// `strftime` pattern of the disambiguation suffix.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Outcome of resolving one candidate destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Candidate was free
    Unchanged(PathBuf),
    /// Candidate was taken; this is the disambiguated path
    Renamed(PathBuf),
}

impl Resolution {
    pub fn path(&self) -> &Path {
        match self {
            Resolution::Unchanged(p) | Resolution::Renamed(p) => p,
        }
    }

    pub fn into_path(self) -> PathBuf {
        match self {
            Resolution::Unchanged(p) | Resolution::Renamed(p) => p,
        }
    }

    pub fn is_renamed(&self) -> bool {
        matches!(self, Resolution::Renamed(_))
    }
}

/// Resolve `candidate` against the filesystem using the current UTC time.
pub fn resolve(candidate: &Path) -> Resolution {
    resolve_at(candidate, Utc::now())
}

/// Resolve `candidate`, stamping any rename with `now`.
pub fn resolve_at(candidate: &Path, now: DateTime<Utc>) -> Resolution {
    resolve_planned(candidate, now, &HashSet::new())
}

/// Like [`resolve_at`], but paths in `planned` count as taken too.
///
/// A dry run writes nothing, so destinations it has already handed out must
/// be tracked here for later files to collide with them as they would live.
pub fn resolve_planned(
    candidate: &Path,
    now: DateTime<Utc>,
    planned: &HashSet<PathBuf>,
) -> Resolution {
    // symlink_metadata so a dangling link still counts as taken
    let taken = planned.contains(candidate) || fs::symlink_metadata(candidate).is_ok();
    if !taken {
        return Resolution::Unchanged(candidate.to_path_buf());
    }
    Resolution::Renamed(disambiguate(candidate, now))
}

/// Insert `_<timestamp>` between the stem and the extension of `path`.
///
/// Only the last extension is kept apart (`a.tar.gz` -> `a.tar_<ts>.gz`);
/// a lone leading dot belongs to the stem (`.bashrc` -> `.bashrc_<ts>`).
pub fn disambiguate(path: &Path, now: DateTime<Utc>) -> PathBuf {
    let stamp = now.format(TIMESTAMP_FORMAT).to_string();

    let mut name = OsString::new();
    if let Some(stem) = path.file_stem() {
        name.push(stem);
    }
    name.push("_");
    name.push(&stamp);
    if let Some(ext) = path.extension() {
        name.push(".");
        name.push(ext);
    }

    match path.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    }
}
