use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

use crate::config::{ExportConfig, ShareConfig};
use crate::error::{Error, ErrorKind, Result};

/// Stores a document under a file name, returning where it ended up.
pub trait Downloader {
    fn save(&mut self, file_name: &str, bytes: &[u8]) -> Result<PathBuf>;
}

/// Hands a document to some other program.
pub trait ShareTarget {
    /// Whether this target accepts files at all.
    fn supports_files(&self) -> bool;
    fn share(&mut self, file_name: &str, bytes: &[u8], title: &str, text: &str) -> Result<()>;
}

pub struct DirectoryDownloader {
    dir: PathBuf,
}

impl DirectoryDownloader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DirectoryDownloader { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Downloader for DirectoryDownloader {
    fn save(&mut self, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(file_name);
        fs::write(&path, bytes)?;
        log::info!("Saved {} bytes to {}", bytes.len(), path.display());
        Ok(path)
    }
}

const FILE_PLACEHOLDER: &str = "{file}";
const TITLE_PLACEHOLDER: &str = "{title}";
const TEXT_PLACEHOLDER: &str = "{text}";

/// Shares by running an external program on a temporary copy of the document.
///
/// Copies live in a private directory that is removed together with the
/// `CommandShare`, so programs that read the file after exiting still find it.
pub struct CommandShare {
    argv: Option<Vec<String>>,
    parent: PathBuf,
    staging: Option<TempDir>,
}

impl CommandShare {
    pub fn new(argv: Option<Vec<String>>) -> Self {
        CommandShare {
            argv: argv.filter(|argv| !argv.is_empty()),
            parent: std::env::temp_dir(),
            staging: None,
        }
    }

    /// Creates the private staging directory below `parent` instead of the system
    /// temporary directory.
    pub fn with_staging(mut self, parent: impl Into<PathBuf>) -> Self {
        self.parent = parent.into();
        self
    }

    fn staging_dir(&mut self) -> Result<&Path> {
        if self.staging.is_none() {
            fs::create_dir_all(&self.parent)?;
            let dir = tempfile::Builder::new()
                .prefix("notecal-share-")
                .tempdir_in(&self.parent)?;
            log::debug!("Staging shared documents in {}", dir.path().display());
            self.staging = Some(dir);
        }
        self.staging
            .as_ref()
            .map(TempDir::path)
            .ok_or_else(|| Error::from(ErrorKind::ShareCancelledOrFailed))
    }

    fn substitute(arg: &str, file: &Path, title: &str, text: &str) -> String {
        arg.replace(FILE_PLACEHOLDER, &file.to_string_lossy())
            .replace(TITLE_PLACEHOLDER, title)
            .replace(TEXT_PLACEHOLDER, text)
    }
}

impl ShareTarget for CommandShare {
    fn supports_files(&self) -> bool {
        self.argv.is_some()
    }

    fn share(&mut self, file_name: &str, bytes: &[u8], title: &str, text: &str) -> Result<()> {
        if self.argv.is_none() {
            return Err(Error::from(ErrorKind::ShareUnsupported));
        }

        let file = self.staging_dir()?.join(file_name);
        fs::write(&file, bytes)?;

        let argv = self
            .argv
            .as_ref()
            .ok_or_else(|| Error::from(ErrorKind::ShareUnsupported))?;

        let mut args = argv.iter().map(|arg| Self::substitute(arg, &file, title, text));
        let program = args
            .next()
            .ok_or_else(|| Error::from(ErrorKind::ShareUnsupported))?;

        log::debug!("Sharing {} with '{}'", file.display(), program);

        let status = Command::new(&program).args(args).status().map_err(|err| {
            Error::new(
                ErrorKind::ShareCancelledOrFailed,
                &format!("could not run '{}': {}", program, err),
            )
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(Error::new(
                ErrorKind::ShareCancelledOrFailed,
                &format!("'{}' exited with {}", program, status),
            ))
        }
    }
}

/// The host facilities a session delivers documents through.
pub struct Platform {
    pub downloader: Box<dyn Downloader>,
    pub share: Box<dyn ShareTarget>,
}

impl Platform {
    pub fn new(downloader: Box<dyn Downloader>, share: Box<dyn ShareTarget>) -> Self {
        Platform { downloader, share }
    }

    pub fn from_config(export: &ExportConfig, share: &ShareConfig) -> Self {
        Platform::new(
            Box::new(DirectoryDownloader::new(export.download_dir())),
            Box::new(CommandShare::new(share.command.clone())),
        )
    }
}
