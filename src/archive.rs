//! Blueprint archive staging.
//!
//! The blueprint directory is packed into a deflated zip whose entries all
//! live under a single top-level directory named after the blueprint id. The
//! archive is written to a scratch directory and removed again when the
//! returned [`StagedArchive`] is dropped.

use std::io::{self, Write};

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8::Dir};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;
use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

/// Errors raised while staging a blueprint archive.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ArchiveError {
    /// Raised when the blueprint directory does not exist.
    #[error("blueprint directory not found: {path}")]
    MissingSource {
        /// Directory that was requested.
        path: Utf8PathBuf,
    },
    /// Raised when reading the blueprint or writing the archive fails.
    #[error("failed to stage archive at {path}: {message}")]
    Io {
        /// Path being read or written.
        path: Utf8PathBuf,
        /// I/O error message.
        message: String,
    },
    /// Raised when the zip encoder fails.
    #[error("failed to write zip archive {path}: {message}")]
    Zip {
        /// Archive being written.
        path: Utf8PathBuf,
        /// Encoder error message.
        message: String,
    },
}

/// A zip archive on disk that is deleted when dropped.
#[derive(Debug)]
pub struct StagedArchive {
    path: Utf8PathBuf,
}

impl StagedArchive {
    /// Location of the archive.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl Drop for StagedArchive {
    fn drop(&mut self) {
        std::fs::remove_file(&self.path).ok();
    }
}

/// Packs `source` into an archive in the system temp directory.
///
/// # Errors
///
/// Returns [`ArchiveError`] when the source directory is missing, when the
/// temp directory path is not UTF-8, or when reading or writing fails.
pub fn stage_blueprint(
    source: &Utf8Path,
    blueprint_id: &str,
) -> Result<StagedArchive, ArchiveError> {
    let scratch = Utf8PathBuf::from_path_buf(std::env::temp_dir()).map_err(|path| {
        ArchiveError::Io {
            path: Utf8PathBuf::from(path.to_string_lossy().into_owned()),
            message: String::from("temporary directory path is not valid UTF-8"),
        }
    })?;
    stage_blueprint_in(source, blueprint_id, &scratch)
}

/// Packs `source` into `<scratch>/<blueprint_id>-<uuid>.zip`.
///
/// # Errors
///
/// Returns [`ArchiveError`] when the source directory is missing or when
/// reading or writing fails.
pub fn stage_blueprint_in(
    source: &Utf8Path,
    blueprint_id: &str,
    scratch: &Utf8Path,
) -> Result<StagedArchive, ArchiveError> {
    let source_dir = match Dir::open_ambient_dir(source, ambient_authority()) {
        Ok(dir) => dir,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(ArchiveError::MissingSource {
                path: source.to_owned(),
            });
        }
        Err(err) => return Err(io_error(source, &err)),
    };

    let mut files = Vec::new();
    collect_files(&source_dir, source, "", &mut files)?;
    files.sort();

    let scratch_dir =
        Dir::open_ambient_dir(scratch, ambient_authority()).map_err(|err| io_error(scratch, &err))?;
    let file_name = format!("{blueprint_id}-{}.zip", Uuid::new_v4());
    let staged = StagedArchive {
        path: scratch.join(&file_name),
    };
    let file = scratch_dir
        .create(&file_name)
        .map_err(|err| io_error(staged.path(), &err))?;

    let mut writer = ZipWriter::new(file.into_std());
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for relative in &files {
        let contents = source_dir
            .read(relative)
            .map_err(|err| io_error(&source.join(relative), &err))?;
        writer
            .start_file(format!("{blueprint_id}/{relative}"), options)
            .map_err(|err| zip_error(staged.path(), &err))?;
        writer
            .write_all(&contents)
            .map_err(|err| io_error(staged.path(), &err))?;
    }
    writer
        .finish()
        .map_err(|err| zip_error(staged.path(), &err))?;

    debug!(archive = %staged.path(), files = files.len(), "staged blueprint archive");
    Ok(staged)
}

/// Appends every regular file below `dir` to `files` as a `/`-separated path
/// relative to the blueprint root. Directory symlinks are not followed.
fn collect_files(
    dir: &Dir,
    root: &Utf8Path,
    prefix: &str,
    files: &mut Vec<String>,
) -> Result<(), ArchiveError> {
    let location = root.join(prefix);
    let entries = dir.entries().map_err(|err| io_error(&location, &err))?;
    for entry in entries {
        let entry = entry.map_err(|err| io_error(&location, &err))?;
        let name = entry.file_name().map_err(|err| io_error(&location, &err))?;
        let relative = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}/{name}")
        };
        let file_type = entry
            .file_type()
            .map_err(|err| io_error(&root.join(&relative), &err))?;

        if file_type.is_dir() {
            let child = entry
                .open_dir()
                .map_err(|err| io_error(&root.join(&relative), &err))?;
            collect_files(&child, root, &relative, files)?;
        } else if file_type.is_file() {
            files.push(relative);
        } else if file_type.is_symlink() {
            let target = dir
                .metadata(&name)
                .map_err(|err| io_error(&root.join(&relative), &err))?;
            if target.is_file() {
                files.push(relative);
            }
        }
    }
    Ok(())
}

fn io_error(path: &Utf8Path, err: &io::Error) -> ArchiveError {
    ArchiveError::Io {
        path: path.to_owned(),
        message: err.to_string(),
    }
}

fn zip_error(path: &Utf8Path, err: &zip::result::ZipError) -> ArchiveError {
    ArchiveError::Zip {
        path: path.to_owned(),
        message: err.to_string(),
    }
}
