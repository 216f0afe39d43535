use std::fmt;
use std::sync::mpsc;
use std::thread;

use super::pdf::{DocumentWriter, PrintPdfWriter};
use super::raster::{CanvasRasterizer, Rasterizer};
use crate::config::ExportConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::events::Event;

/// The collaborators needed to turn a print layout into a document.
pub struct ExportBackend {
    pub rasterizer: Box<dyn Rasterizer>,
    pub writer: Box<dyn DocumentWriter>,
}

impl ExportBackend {
    pub fn new(rasterizer: Box<dyn Rasterizer>, writer: Box<dyn DocumentWriter>) -> Self {
        ExportBackend { rasterizer, writer }
    }

    /// Sets up the bundled rasterizer and PDF writer for `config`.
    pub fn load(config: &ExportConfig) -> Result<Self> {
        config.validate()?;

        let dir = config.download_dir();
        if dir.exists() && !dir.is_dir() {
            return Err(Error::new(
                ErrorKind::CapabilityUnavailable,
                &format!("download location '{}' is not a directory", dir.display()),
            ));
        }

        Ok(ExportBackend::new(
            Box::new(CanvasRasterizer::new()),
            Box::new(PrintPdfWriter::new()),
        ))
    }
}

impl fmt::Debug for ExportBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportBackend")
            .field("attached", &self.rasterizer.attached())
            .finish()
    }
}

#[derive(Debug)]
pub enum Capability {
    Unloaded,
    Loading,
    Ready(ExportBackend),
    LoadFailed(String),
}

impl Default for Capability {
    fn default() -> Self {
        Capability::Unloaded
    }
}

impl Capability {
    pub fn is_ready(&self) -> bool {
        matches!(self, Capability::Ready(_))
    }

    pub fn backend_mut(&mut self) -> Result<&mut ExportBackend> {
        match self {
            Capability::Ready(backend) => Ok(backend),
            Capability::LoadFailed(reason) => {
                Err(Error::new(ErrorKind::CapabilityUnavailable, reason))
            }
            _ => Err(Error::from(ErrorKind::CapabilityUnavailable)),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Capability::Unloaded => "not loaded",
            Capability::Loading => "loading",
            Capability::Ready(_) => "ready",
            Capability::LoadFailed(_) => "unavailable",
        }
    }
}

/// Loads the export backend on a worker thread. The outcome arrives as
/// [`Event::CapabilityLoaded`] on `event_sink`.
pub fn spawn_loader(config: ExportConfig, event_sink: &mpsc::Sender<Event>) -> Result<()> {
    let tx = event_sink.clone();
    thread::Builder::new()
        .name("export-loader".to_owned())
        .spawn(move || {
            let result = ExportBackend::load(&config);
            if let Err(err) = &result {
                log::error!("Could not load PDF export: {}", err);
            } else {
                log::info!("PDF export ready");
            }
            if tx.send(Event::CapabilityLoaded(result)).is_err() {
                log::warn!("Export backend loaded after shutdown");
            }
        })?;
    Ok(())
}
