use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use tar::Archive;
use time::OffsetDateTime;

use super::{unsupported, FileProvider};
use crate::core::errors::{Error, Result};
use crate::models::file_entry::{is_identifier_of, FileEntry, FileKind};
use crate::services::fs::detect::is_tar_gz;

/// Serves the members of a gzip-compressed tar archive.
///
/// Tar has no index, so both listing and lookup walk the archive from its
/// first header. Nothing is cached between calls.
pub struct TarGzProvider;

impl TarGzProvider {
    fn open(&self, location: &Path) -> Result<Archive<GzDecoder<File>>> {
        let file = File::open(location)?;
        Ok(Archive::new(GzDecoder::new(file)))
    }

    /// Copies the first member whose raw path satisfies `wanted`.
    fn copy_first(
        &self,
        location: &Path,
        sink: &mut dyn Write,
        wanted: impl Fn(&[u8]) -> bool,
    ) -> Result<bool> {
        let mut archive = self.open(location)?;
        for member in archive.entries()? {
            let mut member = member?;
            if wanted(&*member.path_bytes()) {
                io::copy(&mut member, sink)?;
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl FileProvider for TarGzProvider {
    fn name(&self) -> &'static str {
        "tar.gz"
    }

    fn can_handle(&self, location: &Path) -> bool {
        is_tar_gz(location)
    }

    fn entries(&self, location: &Path, now: OffsetDateTime) -> Result<Vec<FileEntry>> {
        let mut archive = self.open(location)?;
        let mut entries = Vec::new();
        for member in archive.entries()? {
            let member = member?;
            let header = member.header();
            let raw_name = member.path_bytes().into_owned();
            let kind = if header.entry_type().is_dir() {
                FileKind::Directory
            } else {
                FileKind::File
            };
            let modified = mtime(header.mtime()?, &raw_name);
            entries.push(FileEntry::from_raw_bytes(
                &raw_name,
                kind,
                header.size()?,
                modified,
                now,
            ));
        }
        tracing::debug!(
            archive = %location.display(),
            count = entries.len(),
            "scanned tar.gz archive"
        );
        Ok(entries)
    }

    fn stream_content(&self, location: &Path, name: &str, sink: &mut dyn Write) -> Result<()> {
        // Identifiers first; a second pass accepts the raw member name.
        if self.copy_first(location, sink, |raw| is_identifier_of(raw, name))?
            || self.copy_first(location, sink, |raw| raw == name.as_bytes())?
        {
            return Ok(());
        }
        Err(Error::not_found(location, name))
    }

    fn tail_content(
        &self,
        _location: &Path,
        _name: &str,
        _sink: &mut dyn Write,
        _lines: usize,
    ) -> Result<()> {
        Err(unsupported(self.name()))
    }
}

fn mtime(seconds: u64, member: &[u8]) -> OffsetDateTime {
    i64::try_from(seconds)
        .ok()
        .and_then(|secs| OffsetDateTime::from_unix_timestamp(secs).ok())
        .unwrap_or_else(|| {
            tracing::warn!(
                "tar member {} has an out-of-range mtime {}",
                String::from_utf8_lossy(member),
                seconds
            );
            OffsetDateTime::UNIX_EPOCH
        })
}
