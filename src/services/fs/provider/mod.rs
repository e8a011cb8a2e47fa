//! Uniform access to log folders, whether they are directories or archives.

use std::io::Write;
use std::path::Path;

use time::OffsetDateTime;

use crate::core::errors::{Error, Result};
use crate::models::file_entry::FileEntry;

pub mod filesystem;
pub mod gz;
pub mod tar_gz;
pub mod zip;

pub use self::filesystem::FileSystemProvider;
pub use self::gz::GzProvider;
pub use self::tar_gz::TarGzProvider;
pub use self::zip::ZipProvider;

/// Lists and reads the entries of one kind of log location.
///
/// Implementations keep no state between calls; every call opens and closes
/// its own handles, so a single instance can serve concurrent callers.
pub trait FileProvider: Send + Sync {
    /// Short identifier used in logs and errors.
    fn name(&self) -> &'static str;

    /// Decides from the name and metadata alone, without reading content.
    fn can_handle(&self, location: &Path) -> bool;

    /// Every entry of `location` as of now. Ages are computed against `now`.
    fn entries(&self, location: &Path, now: OffsetDateTime) -> Result<Vec<FileEntry>>;

    /// Copies the raw bytes of the entry called `name` into `sink`.
    ///
    /// `name` may be either the identifier from [`FileEntry::name`] or the raw
    /// member name.
    fn stream_content(&self, location: &Path, name: &str, sink: &mut dyn Write) -> Result<()>;

    /// Writes the last `lines` lines of the entry, each followed by the
    /// platform line terminator. Providers that cannot seek inside their
    /// entries return [`Error::Unsupported`].
    fn tail_content(
        &self,
        location: &Path,
        name: &str,
        sink: &mut dyn Write,
        lines: usize,
    ) -> Result<()>;
}

/// Picks the provider responsible for a location.
pub struct ProviderSelector {
    providers: Vec<Box<dyn FileProvider>>,
}

impl Default for ProviderSelector {
    fn default() -> Self {
        // A directory must be claimed before any archive predicate runs, and
        // `.tar.gz` before plain `.gz`.
        Self::new(vec![
            Box::new(FileSystemProvider),
            Box::new(ZipProvider),
            Box::new(TarGzProvider),
            Box::new(GzProvider),
        ])
    }
}

impl ProviderSelector {
    pub fn new(providers: Vec<Box<dyn FileProvider>>) -> Self {
        Self { providers }
    }

    pub fn select(&self, location: &Path) -> Result<&dyn FileProvider> {
        let provider = self
            .providers
            .iter()
            .find(|provider| provider.can_handle(location))
            .ok_or_else(|| Error::NoProvider(location.to_path_buf()))?;
        tracing::debug!(
            provider = provider.name(),
            location = %location.display(),
            "selected file provider"
        );
        Ok(provider.as_ref())
    }
}

pub(crate) fn unsupported(provider: &'static str) -> Error {
    Error::Unsupported {
        provider,
        operation: "tail",
    }
}

pub(crate) fn system_time(time: std::io::Result<std::time::SystemTime>) -> Result<OffsetDateTime> {
    Ok(OffsetDateTime::from(time?))
}
