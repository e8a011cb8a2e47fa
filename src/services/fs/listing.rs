use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use time::OffsetDateTime;
use tokio::task;

use crate::core::errors::{Error, Result};
use crate::models::file_entry::{decode_name, encode_name, sort_entries, FileEntry, SortBy};
use crate::services::fs::provider::ProviderSelector;
use crate::services::fs::tail::LINE_ENDING;

#[derive(Debug, Clone, Default)]
pub struct ListParams<'a> {
    /// Folder or archive below the root; `None` lists the root itself.
    pub base: Option<&'a str>,
    pub sort_by: SortBy,
    pub desc: bool,
}

#[derive(Debug, Serialize, Clone)]
pub struct ListResult {
    pub entries: Vec<FileEntry>,
    pub current_folder: PathBuf,
    /// Percent-encoded `base`, empty at the root.
    pub base: String,
    /// Parent folder relative to the root, empty when the parent is the root.
    pub parent: String,
}

/// Read-only view over a log root: resolves request paths below the root
/// and dispatches to the matching provider.
pub struct LogBrowser {
    root: PathBuf,
    selector: ProviderSelector,
}

impl LogBrowser {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_selector(root, ProviderSelector::default())
    }

    pub fn with_selector(root: impl Into<PathBuf>, selector: ProviderSelector) -> Self {
        Self {
            root: root.into(),
            selector,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Joins `base` onto the root. Parent segments are rejected, and leading
    /// separators are dropped so an absolute `base` stays below the root.
    pub fn resolve(&self, base: Option<&str>) -> Result<PathBuf> {
        let Some(base) = base.filter(|b| !b.is_empty()) else {
            return Ok(self.root.clone());
        };
        security_check(base)?;
        let relative = base.trim_start_matches(['/', '\\']);
        Ok(self.root.join(relative))
    }

    pub fn list(&self, params: &ListParams<'_>, now: OffsetDateTime) -> Result<ListResult> {
        let folder = self.resolve(params.base)?;
        let provider = self.selector.select(&folder)?;
        let mut entries = provider.entries(&folder, now)?;
        sort_entries(&mut entries, params.sort_by, params.desc);

        Ok(ListResult {
            entries,
            parent: self.parent(&folder),
            base: params.base.map(encode_name).unwrap_or_default(),
            current_folder: folder,
        })
    }

    /// Streams an entry, or only its last `tail_lines` lines when given.
    pub fn view(
        &self,
        filename: &str,
        base: Option<&str>,
        tail_lines: Option<usize>,
        sink: &mut dyn Write,
    ) -> Result<()> {
        security_check(filename)?;
        let folder = self.resolve(base)?;
        let provider = self.selector.select(&folder)?;
        match tail_lines {
            Some(lines) => provider.tail_content(&folder, filename, sink, lines),
            None => provider.stream_content(&folder, filename, sink),
        }
    }

    /// Writes every line containing `term` from the plain files of the root,
    /// oldest file first, as `[<file>] <line>`.
    pub fn search(&self, term: &str, sink: &mut dyn Write) -> Result<()> {
        let provider = self.selector.select(&self.root)?;
        let mut files = provider.entries(&self.root, OffsetDateTime::now_utc())?;
        sort_entries(&mut files, SortBy::Modified, false);

        for file in files.iter().filter(|f| f.is_file()) {
            let mut matcher = LineMatcher::new(term, &file.display_name, &mut *sink);
            provider.stream_content(&self.root, &file.name, &mut matcher)?;
            let matched = matcher.finish()?;
            tracing::debug!(file = %file.display_name, matched, "searched file");
        }
        Ok(())
    }

    fn parent(&self, folder: &Path) -> String {
        if folder == self.root {
            return String::new();
        }
        let Some(parent) = folder.parent() else {
            return String::new();
        };
        match parent.strip_prefix(&self.root) {
            Ok(relative) => relative
                .components()
                .map(|c| format!("/{}", c.as_os_str().to_string_lossy()))
                .collect(),
            Err(_) => parent.to_string_lossy().into_owned(),
        }
    }
}

fn security_check(value: &str) -> Result<()> {
    let decoded = decode_name(value);
    let has_parent_segment = [value, decoded.as_ref()]
        .iter()
        .any(|candidate| candidate.split(['/', '\\']).any(|segment| segment == ".."));
    if has_parent_segment {
        tracing::warn!("rejected path with parent segment: {}", value);
        return Err(Error::InvalidPath(value.to_string()));
    }
    Ok(())
}

/// Write adapter that forwards matching lines, prefixed with the file name.
struct LineMatcher<'a, W: Write + ?Sized> {
    term: &'a str,
    label: &'a str,
    sink: &'a mut W,
    partial: Vec<u8>,
    matched: usize,
}

impl<'a, W: Write + ?Sized> LineMatcher<'a, W> {
    fn new(term: &'a str, label: &'a str, sink: &'a mut W) -> Self {
        Self {
            term,
            label,
            sink,
            partial: Vec::new(),
            matched: 0,
        }
    }

    fn emit(&mut self, line: &[u8]) -> io::Result<()> {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        let text = String::from_utf8_lossy(line);
        if text.contains(self.term) {
            self.matched += 1;
            write!(self.sink, "[{}] {}{}", self.label, text, LINE_ENDING)?;
        }
        Ok(())
    }

    /// Flushes an unterminated last line and returns the number of matches.
    fn finish(mut self) -> io::Result<usize> {
        if !self.partial.is_empty() {
            let last = std::mem::take(&mut self.partial);
            self.emit(&last)?;
        }
        Ok(self.matched)
    }
}

impl<W: Write + ?Sized> Write for LineMatcher<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut rest = buf;
        while let Some(idx) = rest.iter().position(|b| *b == b'\n') {
            let mut line = std::mem::take(&mut self.partial);
            line.extend_from_slice(&rest[..idx]);
            self.emit(&line)?;
            rest = &rest[idx + 1..];
        }
        self.partial.extend_from_slice(rest);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.sink.flush()
    }
}

/// Owned form of [`ListParams`] for moving into a blocking task.
fn owned(params: &ListParams<'_>) -> (Option<String>, SortBy, bool) {
    (params.base.map(str::to_string), params.sort_by, params.desc)
}

pub async fn list_dir(
    browser: Arc<LogBrowser>,
    params: ListParams<'_>,
    now: OffsetDateTime,
) -> Result<ListResult> {
    // Use a blocking task for filesystem IO to avoid blocking async executors.
    let (base, sort_by, desc) = owned(&params);
    run_blocking(move || {
        let params = ListParams {
            base: base.as_deref(),
            sort_by,
            desc,
        };
        browser.list(&params, now)
    })
    .await
}

/// Streams into `sink` on a blocking thread and hands the sink back.
pub async fn view_file<W>(
    browser: Arc<LogBrowser>,
    filename: String,
    base: Option<String>,
    tail_lines: Option<usize>,
    mut sink: W,
) -> Result<W>
where
    W: Write + Send + 'static,
{
    run_blocking(move || {
        browser.view(&filename, base.as_deref(), tail_lines, &mut sink)?;
        sink.flush()?;
        Ok(sink)
    })
    .await
}

pub async fn search_files<W>(browser: Arc<LogBrowser>, term: String, mut sink: W) -> Result<W>
where
    W: Write + Send + 'static,
{
    run_blocking(move || {
        browser.search(&term, &mut sink)?;
        sink.flush()?;
        Ok(sink)
    })
    .await
}

async fn run_blocking<T, F>(work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    task::spawn_blocking(work)
        .await
        .map_err(|e| Error::Other(format!("blocking task failed: {e}")))?
}
