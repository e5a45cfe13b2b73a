//! Atomic I/O operations with file locking

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use sha2::{Digest, Sha256};

use crate::{Error, NormalizedPath, Result, checksum};

/// Result of a completed copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyOutcome {
    /// Bytes written to the destination
    pub bytes: u64,
    /// Checksum of the copied content (`sha256:<hex>`)
    pub checksum: String,
}

/// Temp file next to `target` so the final rename stays on one filesystem.
fn temp_path_for(target: &Path) -> PathBuf {
    let temp_name = format!(
        ".{}.{}.tmp",
        target
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    target.with_file_name(temp_name)
}

fn open_locked_temp(temp_path: &Path, target: &Path) -> Result<File> {
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(temp_path)
        .map_err(|e| Error::io(temp_path, e))?;
    file.lock_exclusive().map_err(|_| Error::LockFailed {
        path: target.to_path_buf(),
    })?;
    Ok(file)
}

fn ensure_parent(target: &Path) -> Result<()> {
    if let Some(parent) = target.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    Ok(())
}

/// Flush, unlock and rename the temp file over the target.
fn commit(file: File, temp_path: &Path, target: &Path) -> Result<()> {
    file.sync_all().map_err(|e| Error::io(temp_path, e))?;
    file.unlock().map_err(|_| Error::LockFailed {
        path: target.to_path_buf(),
    })?;
    drop(file);

    if let Err(e) = fs::rename(temp_path, target) {
        let _ = fs::remove_file(temp_path);
        return Err(Error::io(target, e));
    }
    Ok(())
}

/// Write content atomically to a file with locking.
///
/// Uses write-to-temp-then-rename strategy to prevent partial writes.
pub fn write_atomic(path: &NormalizedPath, content: &[u8]) -> Result<()> {
    let native_path = path.to_native();
    ensure_parent(&native_path)?;

    let temp_path = temp_path_for(&native_path);
    let mut temp_file = open_locked_temp(&temp_path, &native_path)?;
    if let Err(e) = temp_file.write_all(content) {
        let _ = fs::remove_file(&temp_path);
        return Err(Error::io(&temp_path, e));
    }
    commit(temp_file, &temp_path, &native_path)
}

/// Copy `source` over `target`, overwriting it if present.
///
/// The content streams through a temp file beside the target and is hashed
/// on the way, so a failed copy never leaves a truncated database behind.
pub fn copy_atomic(source: &NormalizedPath, target: &NormalizedPath) -> Result<CopyOutcome> {
    let source_path = source.to_native();
    let target_path = target.to_native();

    let mut reader = File::open(&source_path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::SourceMissing {
                path: source_path.clone(),
            }
        } else {
            Error::io(&source_path, e)
        }
    })?;

    ensure_parent(&target_path)?;
    let temp_path = temp_path_for(&target_path);
    let mut writer = open_locked_temp(&temp_path, &target_path)?;

    let streamed = stream_hashed(&mut reader, &mut writer);
    let (bytes, hasher) = match streamed {
        Ok(done) => done,
        Err((path_is_source, e)) => {
            let _ = fs::remove_file(&temp_path);
            let at = if path_is_source { &source_path } else { &temp_path };
            return Err(Error::io(at, e));
        }
    };

    commit(writer, &temp_path, &target_path)?;

    let outcome = CopyOutcome {
        bytes,
        checksum: checksum::finish(hasher),
    };
    tracing::debug!(
        source = %source,
        target = %target,
        bytes = outcome.bytes,
        checksum = %outcome.checksum,
        "Copied file"
    );
    Ok(outcome)
}

/// Returns `(is_read_side, error)` on failure.
fn stream_hashed(
    reader: &mut File,
    writer: &mut File,
) -> std::result::Result<(u64, Sha256), (bool, std::io::Error)> {
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 256 * 1024];
    let mut total = 0u64;
    loop {
        let n = reader.read(&mut buf).map_err(|e| (true, e))?;
        if n == 0 {
            break;
        }
        writer.write_all(&buf[..n]).map_err(|e| (false, e))?;
        hasher.update(&buf[..n]);
        total += n as u64;
    }
    Ok((total, hasher))
}

/// Remove a file, treating "already gone" as success.
///
/// Returns whether a file was actually removed.
pub fn remove_if_exists(path: &NormalizedPath) -> Result<bool> {
    let native_path = path.to_native();
    match fs::remove_file(&native_path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::io(native_path, e)),
    }
}

/// Create a directory and its parents.
pub fn ensure_dir(path: &NormalizedPath) -> Result<()> {
    let native_path = path.to_native();
    fs::create_dir_all(&native_path).map_err(|e| Error::io(native_path, e))
}

/// Read text content from a file.
pub fn read_text(path: &NormalizedPath) -> Result<String> {
    let native_path = path.to_native();
    fs::read_to_string(&native_path).map_err(|e| Error::io(&native_path, e))
}
