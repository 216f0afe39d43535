use serde::Deserialize;
use std::env;
use std::fs;
use std::io;
use std::iter::FromIterator;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, ErrorKind, Result};

const CONFIG_PATH_ENV_VAR: &str = "NOTECAL_CONFIG_FILE";

pub(crate) fn find_configfile_locations() -> io::Result<Vec<PathBuf>> {
    let config_env: Option<PathBuf> = env::var(CONFIG_PATH_ENV_VAR).ok().map(PathBuf::from);

    let home = if let Some(dir) = dirs::home_dir() {
        dir
    } else {
        return Err(io::Error::new(
            io::ErrorKind::Other,
            "Unable to find home directory",
        ));
    };

    let home_config = PathBuf::from_iter([&home, &PathBuf::from(".notecal.toml")].iter());

    let config_xdg = if let Ok(dir) = env::var("XDG_CONFIG_HOME") {
        PathBuf::from_iter([dir, "notecal".to_string(), "config.toml".to_string()].iter())
    } else {
        PathBuf::from_iter(
            [
                home.as_path(),
                Path::new(".config"),
                Path::new("notecal"),
                Path::new("config.toml"),
            ]
            .iter(),
        )
    };

    let mut locations = vec![config_xdg, home_config];

    if let Some(path) = config_env {
        locations.insert(0, path);
    }

    Ok(locations)
}

/// Loads the config at `path` or, without one, the first existing default location.
/// Falls back to the built-in defaults when no file exists at all.
pub fn load_suitable_config(path: Option<&Path>) -> Result<Config> {
    if let Some(path) = path {
        return Config::from_path(path);
    }

    let locations = find_configfile_locations().unwrap_or_else(|err| {
        log::warn!("{}", err);
        Vec::new()
    });

    match locations.iter().find(|location| location.is_file()) {
        Some(location) => {
            log::info!("Using config file '{}'", location.display());
            Config::from_path(location)
        }
        None => {
            log::info!("No config file found, using defaults");
            Ok(Config::default())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
}

/// How the rasterized month is placed on the page(s).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitPolicy {
    /// Fit the whole image onto a single page.
    Page,
    /// Fit the image width; continue on further pages when it is too tall.
    Width,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub file_prefix: String,
    pub download_dir: Option<PathBuf>,
    pub orientation: Orientation,
    pub fit: FitPolicy,
    pub magnification: u32,
    pub page_fill: f32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            file_prefix: "calendario".to_owned(),
            download_dir: None,
            orientation: Orientation::Landscape,
            fit: FitPolicy::Page,
            magnification: 2,
            page_fill: 0.95,
        }
    }
}

impl ExportConfig {
    pub const MAX_MAGNIFICATION: u32 = 4;

    pub fn validate(&self) -> Result<()> {
        if self.magnification == 0 || self.magnification > Self::MAX_MAGNIFICATION {
            return Err(Error::new(
                ErrorKind::InvalidConfig,
                &format!(
                    "magnification must be between 1 and {}, got {}",
                    Self::MAX_MAGNIFICATION,
                    self.magnification
                ),
            ));
        }
        if !(self.page_fill > 0.0 && self.page_fill <= 1.0) {
            return Err(Error::new(
                ErrorKind::InvalidConfig,
                &format!("page_fill must be in (0, 1], got {}", self.page_fill),
            ));
        }
        if self.file_prefix.is_empty() || self.file_prefix.contains(std::path::MAIN_SEPARATOR) {
            return Err(Error::new(
                ErrorKind::InvalidConfig,
                &format!("'{}' is not a valid file prefix", self.file_prefix),
            ));
        }
        Ok(())
    }

    /// Configured download directory, else the user's download directory, else `.`.
    pub fn download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ShareConfig {
    /// Program and arguments; `{file}`, `{title}` and `{text}` are substituted.
    pub command: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Labels {
    pub months: Vec<String>,
    pub weekdays: Vec<String>,
}

impl Default for Labels {
    fn default() -> Self {
        Labels {
            months: [
                "January",
                "February",
                "March",
                "April",
                "May",
                "June",
                "July",
                "August",
                "September",
                "October",
                "November",
                "December",
            ]
            .iter()
            .map(|&m| m.to_owned())
            .collect(),
            weekdays: ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"]
                .iter()
                .map(|&d| d.to_owned())
                .collect(),
        }
    }
}

impl Labels {
    /// Name of the month with zero-based `index`.
    pub fn month(&self, index: u32) -> &str {
        self.months
            .get(index as usize)
            .map(String::as_str)
            .unwrap_or("?")
    }

    /// Name of the weekday `index` days from Sunday.
    pub fn weekday(&self, index: usize) -> &str {
        self.weekdays.get(index).map(String::as_str).unwrap_or("?")
    }

    pub fn validate(&self) -> Result<()> {
        if self.months.len() != 12 || self.weekdays.len() != 7 {
            return Err(Error::new(
                ErrorKind::InvalidConfig,
                &format!(
                    "expected 12 month and 7 weekday labels, got {} and {}",
                    self.months.len(),
                    self.weekdays.len()
                ),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(with = "millis")]
    pub tick_rate: Duration,
    pub export: ExportConfig,
    pub share: ShareConfig,
    pub labels: Labels,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            tick_rate: Duration::from_millis(500),
            export: ExportConfig::default(),
            share: ShareConfig::default(),
            labels: Labels::default(),
        }
    }
}

impl Config {
    pub fn from_path(path: &Path) -> Result<Config> {
        let content = fs::read_to_string(path)?;
        content
            .parse::<Config>()
            .map_err(|err| {
                let msg = format!(
                    "{} (in '{}')",
                    err.message.as_deref().unwrap_or_default(),
                    path.display()
                );
                err.with_msg(&msg)
            })
    }

    pub fn validate(&self) -> Result<()> {
        self.export.validate()?;
        self.labels.validate()
    }
}

impl std::str::FromStr for Config {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }
}

mod millis {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_config_uses_defaults() {
        let config: Config = "".parse().unwrap();
        assert_eq!(config.tick_rate, Duration::from_millis(500));
        assert_eq!(config.export.magnification, 2);
        assert_eq!(config.export.orientation, Orientation::Landscape);
        assert_eq!(config.export.fit, FitPolicy::Page);
        assert_eq!(config.labels.month(1), "February");
        assert_eq!(config.labels.weekday(0), "Sun");
        assert!(config.share.command.is_none());
    }

    #[test]
    fn full_config() {
        let config: Config = r#"
            tick_rate = 250

            [export]
            file_prefix = "month"
            download_dir = "/tmp/pdfs"
            orientation = "portrait"
            fit = "width"
            magnification = 3
            page_fill = 0.9

            [share]
            command = ["xdg-email", "--attach", "{file}", "--subject", "{title}"]

            [labels]
            months = ["Janeiro", "Fevereiro", "Março", "Abril", "Maio", "Junho",
                      "Julho", "Agosto", "Setembro", "Outubro", "Novembro", "Dezembro"]
            weekdays = ["Dom", "Seg", "Ter", "Qua", "Qui", "Sex", "Sáb"]
        "#
        .parse()
        .unwrap();

        assert_eq!(config.tick_rate, Duration::from_millis(250));
        assert_eq!(config.export.file_prefix, "month");
        assert_eq!(config.export.download_dir(), PathBuf::from("/tmp/pdfs"));
        assert_eq!(config.export.orientation, Orientation::Portrait);
        assert_eq!(config.export.fit, FitPolicy::Width);
        assert_eq!(config.export.magnification, 3);
        assert_eq!(config.share.command.as_ref().map(Vec::len), Some(5));
        assert_eq!(config.labels.month(2), "Março");
        assert_eq!(config.labels.weekday(6), "Sáb");
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = "[export]\nmagnification = 0".parse::<Config>().unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidConfig));

        let err = "[export]\npage_fill = 1.5".parse::<Config>().unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidConfig));

        let err = "[labels]\nweekdays = [\"Mo\"]".parse::<Config>().unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidConfig));

        let err = "[export]\norientation = \"diagonal\"".parse::<Config>().unwrap_err();
        assert!(matches!(err.kind, ErrorKind::ConfigParse));
    }

    #[test]
    fn explicit_path_is_loaded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[export]\nfile_prefix = \"cal\"").unwrap();

        let config = load_suitable_config(Some(file.path())).unwrap();
        assert_eq!(config.export.file_prefix, "cal");

        let missing = file.path().with_extension("missing");
        assert!(load_suitable_config(Some(&missing)).is_err());
    }
}
