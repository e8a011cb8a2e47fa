use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time};

use super::{unsupported, FileProvider};
use crate::core::errors::{Error, Result};
use crate::models::file_entry::{find_member, FileEntry, FileKind};
use crate::services::fs::detect::is_zip;

/// Serves the members of a `.zip` archive.
pub struct ZipProvider;

impl ZipProvider {
    fn open(&self, location: &Path) -> Result<::zip::ZipArchive<File>> {
        let file = File::open(location)?;
        Ok(::zip::ZipArchive::new(file)?)
    }
}

impl FileProvider for ZipProvider {
    fn name(&self) -> &'static str {
        "zip"
    }

    fn can_handle(&self, location: &Path) -> bool {
        is_zip(location)
    }

    fn entries(&self, location: &Path, now: OffsetDateTime) -> Result<Vec<FileEntry>> {
        let mut archive = self.open(location)?;
        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let member = archive.by_index(i)?;
            let kind = if member.is_dir() {
                FileKind::Directory
            } else {
                FileKind::File
            };
            let modified = dos_time(member.last_modified());
            entries.push(FileEntry::new(
                member.name(),
                kind,
                member.size(),
                modified,
                now,
            ));
        }
        tracing::debug!(
            archive = %location.display(),
            count = entries.len(),
            "listed zip archive"
        );
        Ok(entries)
    }

    fn stream_content(&self, location: &Path, name: &str, sink: &mut dyn Write) -> Result<()> {
        let mut archive = self.open(location)?;
        let raw = find_member(archive.file_names(), name)
            .map(str::to_owned)
            .ok_or_else(|| Error::not_found(location, name))?;
        let mut member = archive.by_name(&raw)?;
        io::copy(&mut member, sink)?;
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

/// Zip stores local wall-clock time without a zone; it is read as UTC.
fn dos_time(stamp: ::zip::DateTime) -> OffsetDateTime {
    let date = Month::try_from(stamp.month())
        .and_then(|month| Date::from_calendar_date(i32::from(stamp.year()), month, stamp.day()));
    let time = Time::from_hms(stamp.hour(), stamp.minute(), stamp.second());
    match (date, time) {
        (Ok(date), Ok(time)) => PrimitiveDateTime::new(date, time).assume_utc(),
        _ => {
            tracing::warn!("invalid zip timestamp {:?}, using epoch", stamp);
            OffsetDateTime::UNIX_EPOCH
        }
    }
}
