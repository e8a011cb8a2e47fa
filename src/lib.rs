//! Browse and read log files stored in plain directories or inside zip,
//! tar.gz and gz archives.

pub mod core;
pub mod models;
pub mod services;

pub use crate::core::config::LogViewConfig;
pub use crate::core::errors::{Error, Result};
pub use crate::models::file_entry::{FileEntry, FileKind, SortBy};
pub use crate::services::fs::listing::{ListParams, ListResult, LogBrowser};
pub use crate::services::fs::provider::{FileProvider, ProviderSelector};
