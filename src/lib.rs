//! Terminal client for a detection service's violation and verified
//! personnel logs: fetch once, filter and page in memory, export CSV,
//! preview images, and poll live stats.

pub mod browser;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod interactive;
pub mod models;
pub mod notify;
pub mod poll;
pub mod session;
pub mod source;
pub mod view;

pub use browser::{LogBrowser, Mount, ViewState};
pub use error::{ExportError, SourceError};
pub use models::{LogKind, LogRecord, VerifiedRecord, ViolationRecord};
pub use source::{HttpSource, LogSource};
