//! Runtime settings.
//!
//! Settings are read from an optional JSON file. Missing keys fall back to
//! their defaults, so an empty object is a valid configuration:
//!
//! ```json
//! { "inactivity_threshold_hours": 24, "sweep_interval_secs": 300, "page_size": 50 }
//! ```

use std::path::{Path, PathBuf};

use jiff::SignedDuration;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, TrackerError},
    models::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE},
};

const DEFAULT_INACTIVITY_HOURS: u32 = 24;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;

/// Tunable behavior of the tracker and the abandonment sweeper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Hours without activity after which an in-progress record is abandoned
    pub inactivity_threshold_hours: u32,

    /// Seconds between two sweeps when running periodically
    pub sweep_interval_secs: u64,

    /// Page size used when a listing does not ask for one
    pub page_size: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            inactivity_threshold_hours: DEFAULT_INACTIVITY_HOURS,
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Settings {
    /// Loads settings from `path`, or from the default location when `None`.
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::FileSystem` if the file exists but cannot be read,
    /// `TrackerError::Serialization` if it is not valid JSON, and
    /// `TrackerError::Configuration` if a value is out of range.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::find_default_path() {
                Some(path) => path,
                None => {
                    log::debug!("No settings file in the config directories, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        if !path.exists() {
            log::debug!("No settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&path).map_err(|e| TrackerError::FileSystem {
            path: path.clone(),
            source: e,
        })?;
        let settings: Settings = serde_json::from_str(&contents)?;
        settings.validate()?;
        log::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Existing `formflow/config.json` in the XDG config directories, without
    /// creating any of them.
    pub fn find_default_path() -> Option<PathBuf> {
        xdg::BaseDirectories::with_prefix("formflow").find_config_file("config.json")
    }

    /// Checks that every value is usable.
    pub fn validate(&self) -> Result<()> {
        if self.inactivity_threshold_hours == 0 {
            return Err(TrackerError::Configuration {
                message: "inactivity_threshold_hours must be at least 1".to_string(),
            });
        }
        if self.sweep_interval_secs == 0 {
            return Err(TrackerError::Configuration {
                message: "sweep_interval_secs must be at least 1".to_string(),
            });
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(TrackerError::Configuration {
                message: format!("page_size must be between 1 and {MAX_PAGE_SIZE}"),
            });
        }
        Ok(())
    }

    pub fn inactivity_threshold(&self) -> SignedDuration {
        SignedDuration::from_hours(i64::from(self.inactivity_threshold_hours))
    }

    pub fn sweep_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.sweep_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "inactivity_threshold_hours": 48 }}"#).unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.inactivity_threshold_hours, 48);
        assert_eq!(settings.sweep_interval_secs, DEFAULT_SWEEP_INTERVAL_SECS);
        assert_eq!(settings.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(settings.inactivity_threshold(), SignedDuration::from_hours(48));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(Some(&dir.path().join("absent.json"))).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_default_lookup_creates_no_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::env::set_var("XDG_CONFIG_HOME", dir.path());

        let settings = Settings::load(None).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(!dir.path().join("formflow").exists());

        std::fs::create_dir(dir.path().join("formflow")).unwrap();
        std::fs::write(
            dir.path().join("formflow/config.json"),
            r#"{ "page_size": 10 }"#,
        )
        .unwrap();
        assert_eq!(Settings::load(None).unwrap().page_size, 10);
    }

    #[test]
    fn test_zero_threshold_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "inactivity_threshold_hours": 0 }}"#).unwrap();

        let err = Settings::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, TrackerError::Configuration { .. }));
    }
}
