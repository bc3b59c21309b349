//! Filesystem operations module.
//!
//! This module provides low-level operations for:
//! - Copying file contents with best-effort metadata preservation
//! - Ensuring destination directories exist
//!
//! Content failures are errors; metadata failures are returned as warnings
//! alongside a successful copy.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use crate::error::EngineError;

/// Result of a successful content copy.
#[derive(Debug, Clone, Default)]
pub struct CopiedFile {
    /// Number of bytes written
    pub bytes: u64,

    /// Metadata that could not be applied to the destination
    pub metadata_warnings: Vec<String>,
}

/// Stat `src` (following symlinks) and require a regular file.
///
/// FIFOs, sockets and device nodes are rejected before anything opens them;
/// opening a FIFO with no writer would block indefinitely.
///
/// # Errors
/// Returns `ReadError` if the source is missing, unreadable, or not a regular file.
pub fn source_metadata(src: &Path) -> Result<fs::Metadata, EngineError> {
    let metadata = fs::metadata(src).map_err(|e| EngineError::ReadError {
        path: src.to_path_buf(),
        source: e,
    })?;
    if !metadata.is_file() {
        return Err(EngineError::ReadError {
            path: src.to_path_buf(),
            source: io::Error::new(
                io::ErrorKind::Unsupported,
                "unsupported file type (not a regular file)",
            ),
        });
    }
    Ok(metadata)
}

/// Remembers whether a failure came from the read side of `io::copy`.
struct SourceReader<R> {
    inner: R,
    failed: bool,
}

impl<R: Read> Read for SourceReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf).map_err(|e| {
            self.failed = true;
            e
        })
    }
}

/// Copy a file from source to destination with metadata preservation.
///
/// Content is copied byte for byte. Afterwards the source modification time
/// and permission bits are applied to the destination; failures there are
/// collected in `metadata_warnings` rather than failing the copy.
///
/// # Errors
/// Returns `ReadError` for source-side failures (including a source that is
/// not a regular file) and `WriteError` for destination-side failures.
pub fn copy_file_with_metadata(src: &Path, dst: &Path) -> Result<CopiedFile, EngineError> {
    let src_metadata = source_metadata(src)?;

    let src_file = fs::File::open(src).map_err(|e| EngineError::ReadError {
        path: src.to_path_buf(),
        source: e,
    })?;

    let mut dst_file = fs::File::create(dst).map_err(|e| EngineError::WriteError {
        path: dst.to_path_buf(),
        source: e,
    })?;

    let mut reader = SourceReader {
        inner: src_file,
        failed: false,
    };
    let bytes = match io::copy(&mut reader, &mut dst_file) {
        Ok(bytes) => bytes,
        Err(e) if reader.failed => {
            return Err(EngineError::ReadError {
                path: src.to_path_buf(),
                source: e,
            })
        }
        Err(e) => {
            return Err(EngineError::WriteError {
                path: dst.to_path_buf(),
                source: e,
            })
        }
    };

    drop(dst_file);

    let metadata_warnings = preserve_metadata(&src_metadata, dst);
    Ok(CopiedFile {
        bytes,
        metadata_warnings,
    })
}

/// Apply modification time and permission bits of `src_metadata` to `dst`.
fn preserve_metadata(src_metadata: &fs::Metadata, dst: &Path) -> Vec<String> {
    let mut warnings = Vec::new();

    match src_metadata.modified() {
        Ok(mtime) => {
            if let Err(e) =
                filetime::set_file_mtime(dst, filetime::FileTime::from_system_time(mtime))
            {
                warnings.push(format!(
                    "Could not preserve modification time on {}: {}",
                    dst.display(),
                    e
                ));
            }
        }
        Err(e) => warnings.push(format!(
            "Source modification time unavailable for {}: {}",
            dst.display(),
            e
        )),
    }

    // Permissions last: a read-only mode would block the mtime update on some platforms.
    if let Err(e) = fs::set_permissions(dst, src_metadata.permissions()) {
        warnings.push(format!(
            "Could not preserve permissions on {}: {}",
            dst.display(),
            e
        ));
    }

    warnings
}

/// Ensure `path` exists as a directory, creating it recursively if needed.
///
/// # Returns
/// `true` if the directory was created by this call, `false` if it was already there.
///
/// # Errors
/// Returns `DirectoryCreationFailed` if the path exists as something other
/// than a directory or cannot be created.
pub fn ensure_dir(path: &Path) -> Result<bool, EngineError> {
    match fs::metadata(path) {
        Ok(metadata) if metadata.is_dir() => Ok(false),
        Ok(_) => Err(EngineError::DirectoryCreationFailed {
            path: path.to_path_buf(),
            source: io::Error::new(
                io::ErrorKind::AlreadyExists,
                "Path exists but is not a directory",
            ),
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(path).map_err(|e| EngineError::DirectoryCreationFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
            Ok(true)
        }
        Err(e) => Err(EngineError::DirectoryCreationFailed {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}
