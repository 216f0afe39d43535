//! Turning the displayed month into a PDF and delivering it.

pub mod capability;
pub mod page;
pub mod pdf;
pub mod platform;
pub mod raster;
pub mod snapshot;

use std::path::PathBuf;

use chrono::{Datelike, NaiveDateTime, Timelike};

use crate::config::Labels;
use crate::month::DisplayedMonth;

pub use capability::{Capability, ExportBackend};
pub use platform::Platform;

/// The most recently generated document.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub pages: usize,
    /// Session revision the document was generated from.
    pub revision: u64,
    /// Where the document was saved, once it has been.
    pub downloaded: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportState {
    Idle,
    Generating,
    Ready,
    Failed,
}

impl Default for ExportState {
    fn default() -> Self {
        ExportState::Idle
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareOutcome {
    Shared,
    /// Files cannot be shared here; the document was saved to `path` instead.
    /// `downloaded_now` is false if it had already been saved earlier.
    Unsupported {
        path: PathBuf,
        downloaded_now: bool,
    },
}

/// `<prefix>-<YYYY-MM-DD>-<SS>.pdf`, dated on `now`'s day within `month`.
pub fn file_name(prefix: &str, month: DisplayedMonth, now: NaiveDateTime) -> String {
    let date = month.day(now.day());
    format!(
        "{}-{}-{:02}.pdf",
        prefix,
        date.format("%Y-%m-%d"),
        now.second()
    )
}

pub fn share_title(labels: &Labels, month: DisplayedMonth) -> String {
    format!("Calendar - {} {}", labels.month(month.index()), month.year())
}

pub fn share_text(labels: &Labels, month: DisplayedMonth) -> String {
    format!(
        "My {} {} calendar with notes.",
        labels.month(month.index()),
        month.year()
    )
}
