use std::borrow::Cow;
use std::cmp::Ordering;
use std::str::FromStr;

use percent_encoding::{percent_decode_str, percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;
use time::OffsetDateTime;

use crate::core::errors::Error;
use crate::services::fs::age::format_relative_age;

/// Bytes left untouched when turning a raw name into an entry identifier.
const ENTRY_NAME: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'.')
    .remove(b'-')
    .remove(b'_')
    .remove(b'~');

/// One browsable item of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    /// URL-safe identifier, unique within one listing.
    pub name: String,
    pub display_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub modified: OffsetDateTime,
    pub modified_pretty: String,
    pub size: u64,
    pub kind: FileKind,
}

impl FileEntry {
    pub fn new(
        raw_name: &str,
        kind: FileKind,
        size: u64,
        modified: OffsetDateTime,
        now: OffsetDateTime,
    ) -> Self {
        Self::from_raw_bytes(raw_name.as_bytes(), kind, size, modified, now)
    }

    /// Builds an entry from a name that need not be valid UTF-8. The
    /// identifier keeps every byte; only `display_name` is lossy.
    pub fn from_raw_bytes(
        raw_name: &[u8],
        kind: FileKind,
        size: u64,
        modified: OffsetDateTime,
        now: OffsetDateTime,
    ) -> Self {
        Self {
            name: encode_name_bytes(raw_name),
            display_name: String::from_utf8_lossy(raw_name).into_owned(),
            modified,
            modified_pretty: format_relative_age(modified, now),
            size,
            kind,
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind == FileKind::File
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    File,
    Directory,
    Archive,
}

impl FileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::File => "file",
            FileKind::Directory => "dir",
            FileKind::Archive => "archive",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortBy {
    #[default]
    Filename,
    Size,
    Modified,
}

impl SortBy {
    pub fn compare(&self, a: &FileEntry, b: &FileEntry) -> Ordering {
        match self {
            SortBy::Filename => a.display_name.cmp(&b.display_name),
            SortBy::Size => a.size.cmp(&b.size),
            SortBy::Modified => a.modified.cmp(&b.modified),
        }
    }
}

impl FromStr for SortBy {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "filename" | "name" => Ok(SortBy::Filename),
            "size" => Ok(SortBy::Size),
            "modified" | "date" => Ok(SortBy::Modified),
            other => Err(Error::Other(format!("unknown sort order: {other}"))),
        }
    }
}

/// Sorts ascending by `sort_by`, reversed when `desc` is set.
pub fn sort_entries(entries: &mut [FileEntry], sort_by: SortBy, desc: bool) {
    entries.sort_by(|a, b| sort_by.compare(a, b));
    if desc {
        entries.reverse();
    }
}

pub fn encode_name(raw: &str) -> String {
    encode_name_bytes(raw.as_bytes())
}

pub fn encode_name_bytes(raw: &[u8]) -> String {
    percent_encode(raw, ENTRY_NAME).to_string()
}

/// Inverse of [`encode_name`]. Invalid UTF-8 sequences are replaced lossily.
pub fn decode_name(name: &str) -> Cow<'_, str> {
    percent_decode_str(name).decode_utf8_lossy()
}

/// Inverse of [`encode_name_bytes`].
pub fn decode_name_bytes(name: &str) -> Vec<u8> {
    percent_decode_str(name).collect()
}

/// True when `requested` is the identifier a listing hands out for `raw`.
pub fn is_identifier_of(raw: &[u8], requested: &str) -> bool {
    encode_name_bytes(raw) == requested
}

/// Picks the member designated by `requested`.
///
/// Identifiers win over raw names: a member literally called `x%20y` is only
/// chosen for the request `x%20y` when no member has that identifier.
pub fn find_member<'a, I>(names: I, requested: &str) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut raw_match = None;
    for raw in names {
        if is_identifier_of(raw.as_bytes(), requested) {
            return Some(raw);
        }
        if raw_match.is_none() && raw == requested {
            raw_match = Some(raw);
        }
    }
    raw_match
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn entry(name: &str, size: u64, modified: OffsetDateTime) -> FileEntry {
        FileEntry::new(
            name,
            FileKind::File,
            size,
            modified,
            datetime!(2024-01-01 12:00 UTC),
        )
    }

    #[test]
    fn plain_names_are_not_encoded() {
        let e = entry("A.log", 1, datetime!(2024-01-01 12:00 UTC));
        assert_eq!(e.name, "A.log");
        assert_eq!(e.display_name, "A.log");
        assert_eq!(e.modified_pretty, "moments ago");
    }

    #[test]
    fn reserved_characters_are_encoded() {
        let e = entry("logs/app 1.log", 1, datetime!(2024-01-01 12:00 UTC));
        assert_eq!(e.name, "logs%2Fapp%201.log");
        assert_eq!(e.display_name, "logs/app 1.log");
        assert_eq!(decode_name(&e.name), "logs/app 1.log");
    }

    #[test]
    fn member_lookup_accepts_encoded_and_raw() {
        let names = ["logs/app.log", "100%.log"];
        assert_eq!(find_member(names, "logs%2Fapp.log"), Some("logs/app.log"));
        assert_eq!(find_member(names, "logs/app.log"), Some("logs/app.log"));
        assert_eq!(find_member(names, "100%25.log"), Some("100%.log"));
        assert_eq!(find_member(names, "100%.log"), Some("100%.log"));
        assert_eq!(find_member(names, "B.log"), None);
    }

    #[test]
    fn member_lookup_prefers_identifier_over_literal_name() {
        // Either order in the archive.
        for names in [["x%20y", "x y"], ["x y", "x%20y"]] {
            assert_eq!(find_member(names, &encode_name("x y")), Some("x y"));
            assert_eq!(find_member(names, &encode_name("x%20y")), Some("x%20y"));
        }
    }

    #[test]
    fn raw_bytes_survive_encoding() {
        let e = FileEntry::from_raw_bytes(
            b"app\xff.log",
            FileKind::File,
            1,
            datetime!(2024-01-01 12:00 UTC),
            datetime!(2024-01-01 12:00 UTC),
        );
        assert_eq!(e.name, "app%FF.log");
        assert_eq!(e.display_name, "app\u{FFFD}.log");
        assert_eq!(decode_name_bytes(&e.name), b"app\xff.log");
    }

    #[test]
    fn filename_sort_uses_display_name() {
        let at = datetime!(2024-01-01 12:00 UTC);
        let mut entries = vec![
            entry("\u{fc}ber.log", 1, at),
            entry("b.log", 1, at),
            entry("app@1.log", 1, at),
            entry("app-1.log", 1, at),
        ];
        sort_entries(&mut entries, SortBy::Filename, false);
        let order: Vec<&str> = entries.iter().map(|e| e.display_name.as_str()).collect();
        assert_eq!(order, vec!["app-1.log", "app@1.log", "b.log", "\u{fc}ber.log"]);
    }

    #[test]
    fn sorts_by_each_key() {
        let mut entries = vec![
            entry("A.log", 2, datetime!(2024-01-01 11:00 UTC)),
            entry("B.log", 1, datetime!(2024-01-01 10:00 UTC)),
            entry("C.log", 3, datetime!(2024-01-01 10:30 UTC)),
        ];

        sort_entries(&mut entries, SortBy::Size, false);
        let sizes: Vec<u64> = entries.iter().map(|e| e.size).collect();
        assert_eq!(sizes, vec![1, 2, 3]);

        sort_entries(&mut entries, SortBy::Modified, false);
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["B.log", "C.log", "A.log"]);

        sort_entries(&mut entries, SortBy::Filename, true);
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["C.log", "B.log", "A.log"]);
    }

    #[test]
    fn parses_sort_keys() {
        assert_eq!("SIZE".parse::<SortBy>().unwrap(), SortBy::Size);
        assert_eq!("date".parse::<SortBy>().unwrap(), SortBy::Modified);
        assert_eq!("name".parse::<SortBy>().unwrap(), SortBy::Filename);
        assert!("weight".parse::<SortBy>().is_err());
    }

    #[test]
    fn serializes_kind_and_timestamp() {
        let e = entry("A.log", 7, datetime!(2024-01-01 11:55 UTC));
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["kind"], "file");
        assert_eq!(json["modified"], "2024-01-01T11:55:00Z");
        assert_eq!(json["modified_pretty"], "5 minutes ago");
    }
}
