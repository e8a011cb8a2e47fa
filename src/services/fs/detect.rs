//! Archive classification by file name.
//!
//! Content is never inspected. A directory is never an archive, whatever it
//! is called.

use std::path::Path;

pub fn is_zip(path: &Path) -> bool {
    has_suffix(path, ".zip")
}

pub fn is_tar_gz(path: &Path) -> bool {
    has_suffix(path, ".tar.gz")
}

/// Also true for `.tar.gz`; check [`is_tar_gz`] first where it matters.
pub fn is_gz(path: &Path) -> bool {
    has_suffix(path, ".gz")
}

pub fn is_archive(path: &Path) -> bool {
    is_zip(path) || is_tar_gz(path) || is_gz(path)
}

fn has_suffix(path: &Path, suffix: &str) -> bool {
    let Some(file_name) = path.file_name() else {
        return false;
    };
    file_name.to_string_lossy().ends_with(suffix) && !path.is_dir()
}
