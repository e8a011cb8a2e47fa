use std::borrow::Cow;
use std::ffi::{OsStr, OsString};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use time::OffsetDateTime;

use super::{system_time, FileProvider};
use crate::core::errors::{Error, Result};
use crate::models::file_entry::{decode_name_bytes, FileEntry, FileKind};
use crate::services::fs::detect::is_archive;
use crate::services::fs::tail::{tail_lines, write_lines};

/// Serves the direct children of a plain directory.
pub struct FileSystemProvider;

impl FileSystemProvider {
    /// Finds the child designated by `name`, trying the decoded identifier
    /// first and the raw name second.
    fn resolve(&self, folder: &Path, name: &str) -> Result<PathBuf> {
        let candidates = [os_name(decode_name_bytes(name)), OsString::from(name)];
        candidates
            .iter()
            .filter(|candidate| is_plain_segment(Path::new(candidate)))
            .map(|candidate| folder.join(candidate))
            .find(|path| path.is_file())
            .ok_or_else(|| Error::not_found(folder, name))
    }

    fn open(&self, folder: &Path, name: &str) -> Result<File> {
        let path = self.resolve(folder, name)?;
        File::open(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::not_found(folder, name),
            _ => Error::Io(e),
        })
    }

    fn entry(&self, path: &Path, now: OffsetDateTime) -> Result<FileEntry> {
        let metadata = fs::metadata(path)?;
        let modified = system_time(metadata.modified())?;
        let kind = if metadata.is_dir() {
            FileKind::Directory
        } else if is_archive(path) {
            FileKind::Archive
        } else {
            FileKind::File
        };
        let size = if metadata.is_dir() { 0 } else { metadata.len() };
        let name = path.file_name().unwrap_or(path.as_os_str());

        Ok(FileEntry::from_raw_bytes(
            &name_bytes(name),
            kind,
            size,
            modified,
            now,
        ))
    }
}

/// Only direct children are served: `name` must be exactly one normal path
/// component.
fn is_plain_segment(name: &Path) -> bool {
    let mut components = name.components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

#[cfg(unix)]
fn name_bytes(name: &OsStr) -> Cow<'_, [u8]> {
    use std::os::unix::ffi::OsStrExt;
    Cow::Borrowed(name.as_bytes())
}

// Names that are not valid Unicode cannot round-trip here.
#[cfg(not(unix))]
fn name_bytes(name: &OsStr) -> Cow<'_, [u8]> {
    Cow::Owned(name.to_string_lossy().into_owned().into_bytes())
}

#[cfg(unix)]
fn os_name(bytes: Vec<u8>) -> OsString {
    use std::os::unix::ffi::OsStringExt;
    OsString::from_vec(bytes)
}

#[cfg(not(unix))]
fn os_name(bytes: Vec<u8>) -> OsString {
    OsString::from(String::from_utf8_lossy(&bytes).into_owned())
}

impl FileProvider for FileSystemProvider {
    fn name(&self) -> &'static str {
        "filesystem"
    }

    fn can_handle(&self, location: &Path) -> bool {
        location.is_dir()
    }

    fn entries(&self, location: &Path, now: OffsetDateTime) -> Result<Vec<FileEntry>> {
        let mut entries = Vec::new();
        for child in fs::read_dir(location)? {
            let child = child?;
            entries.push(self.entry(&child.path(), now)?);
        }
        tracing::debug!(
            folder = %location.display(),
            count = entries.len(),
            "listed directory"
        );
        Ok(entries)
    }

    fn stream_content(&self, location: &Path, name: &str, sink: &mut dyn Write) -> Result<()> {
        let mut file = self.open(location, name)?;
        io::copy(&mut file, sink)?;
        Ok(())
    }

    fn tail_content(
        &self,
        location: &Path,
        name: &str,
        sink: &mut dyn Write,
        lines: usize,
    ) -> Result<()> {
        let file = self.open(location, name)?;
        let content = tail_lines(file, lines)?;
        write_lines(&content, sink)?;
        Ok(())
    }
}
