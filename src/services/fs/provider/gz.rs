use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use time::OffsetDateTime;

use super::{system_time, unsupported, FileProvider};
use crate::core::errors::Result;
use crate::models::file_entry::{FileEntry, FileKind};
use crate::services::fs::detect::{is_gz, is_tar_gz};

/// Serves a single gzip-compressed file as a folder with one entry.
pub struct GzProvider;

impl GzProvider {
    fn open(&self, location: &Path) -> Result<MultiGzDecoder<File>> {
        Ok(MultiGzDecoder::new(File::open(location)?))
    }
}

impl FileProvider for GzProvider {
    fn name(&self) -> &'static str {
        "gz"
    }

    fn can_handle(&self, location: &Path) -> bool {
        is_gz(location) && !is_tar_gz(location)
    }

    fn entries(&self, location: &Path, now: OffsetDateTime) -> Result<Vec<FileEntry>> {
        let mut decoder = self.open(location)?;
        // The ISIZE footer wraps at 4 GiB and only covers the last member.
        let size = io::copy(&mut decoder, &mut io::sink())?;

        let header = decoder.header();
        let name = header
            .and_then(|h| h.filename())
            .map(|raw| String::from_utf8_lossy(raw).into_owned())
            .unwrap_or_else(|| stripped_name(location));
        let modified = match header.map(|h| h.mtime()).filter(|mtime| *mtime != 0) {
            Some(mtime) => OffsetDateTime::from_unix_timestamp(i64::from(mtime))
                .unwrap_or(OffsetDateTime::UNIX_EPOCH),
            None => system_time(fs::metadata(location)?.modified())?,
        };

        tracing::debug!(archive = %location.display(), member = %name, size, "decompressed gz archive");
        Ok(vec![FileEntry::new(&name, FileKind::File, size, modified, now)])
    }

    /// There is exactly one member, so `name` is not consulted.
    fn stream_content(&self, location: &Path, _name: &str, sink: &mut dyn Write) -> Result<()> {
        let mut decoder = self.open(location)?;
        io::copy(&mut decoder, sink)?;
        Ok(())
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

fn stripped_name(location: &Path) -> String {
    let file_name = location
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    match file_name.strip_suffix(".gz") {
        Some(stem) => stem.to_string(),
        None => file_name,
    }
}
