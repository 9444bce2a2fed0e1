use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::data::aggregate::{AggregateSettings, DEFAULT_HISTOGRAM_BINS, DEFAULT_ROLLING_WINDOW};
use crate::data::dates::{DISPLAY_DATE_FORMAT, SOURCE_DATE_FORMAT, check_date_format};
use crate::data::loader::DateFormats;

/// Optional config file looked up in the working directory.
pub const CONFIG_FILE: &str = "sales-dashboard.json";

/// Public CSV export of the supermarket sales dataset.
pub const DEFAULT_SOURCE: &str =
    "https://drive.google.com/uc?export=download&id=1Dy_75hdwKS1fG4YtEtfB-Dp3SBLXa9H0";

// ---------------------------------------------------------------------------
// Dashboard configuration
// ---------------------------------------------------------------------------

/// Every field is optional in the file; missing ones take the defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// URL or local path of the dataset loaded at startup.
    pub source: String,
    /// chrono format of the `Date` column.
    pub date_format: String,
    /// chrono format used for displayed dates.
    pub display_date_format: String,
    pub rolling_window: usize,
    pub histogram_bins: usize,
    /// Initial window size in points.
    pub window_size: [f32; 2],
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            source: DEFAULT_SOURCE.to_string(),
            date_format: SOURCE_DATE_FORMAT.to_string(),
            display_date_format: DISPLAY_DATE_FORMAT.to_string(),
            rolling_window: DEFAULT_ROLLING_WINDOW,
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
            window_size: [1280.0, 900.0],
        }
    }
}

impl DashboardConfig {
    /// Read `path` if it exists, otherwise return the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text).context("invalid dashboard config")?;
        check_date_format(&config.date_format).context("date_format")?;
        check_date_format(&config.display_date_format).context("display_date_format")?;
        Ok(config)
    }

    /// [`DashboardConfig::load`], falling back to defaults on a bad file.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            log::warn!("Ignoring config: {e:#}");
            Self::default()
        })
    }

    pub fn date_formats(&self) -> DateFormats<'_> {
        DateFormats {
            source: &self.date_format,
            display: &self.display_date_format,
        }
    }

    pub fn aggregate_settings(&self) -> AggregateSettings {
        AggregateSettings {
            rolling_window: self.rolling_window.max(1),
            histogram_bins: self.histogram_bins.max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_other_defaults() {
        let cfg = DashboardConfig::from_json(r#"{ "source": "data/sales.csv", "rolling_window": 3 }"#)
            .unwrap();
        assert_eq!(cfg.source, "data/sales.csv");
        assert_eq!(cfg.rolling_window, 3);
        assert_eq!(cfg.histogram_bins, DEFAULT_HISTOGRAM_BINS);
        assert_eq!(cfg.date_format, "%m/%d/%Y");
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(DashboardConfig::from_json("{ not json").is_err());
        assert!(DashboardConfig::from_json(r#"{ "rolling_window": "seven" }"#).is_err());
    }

    #[test]
    fn unknown_date_specifier_falls_back_to_defaults() {
        assert!(DashboardConfig::from_json(r#"{ "display_date_format": "%Q" }"#).is_err());
        assert!(DashboardConfig::from_json(r#"{ "date_format": "%m/%d/%" }"#).is_err());

        let path = std::env::temp_dir().join("sales-dashboard-bad-format.json");
        std::fs::write(&path, r#"{ "display_date_format": "%d/%Q/%Y" }"#).unwrap();
        let cfg = DashboardConfig::load_or_default(&path);
        std::fs::remove_file(&path).ok();
        assert_eq!(cfg, DashboardConfig::default());
    }

    #[test]
    fn missing_file_gives_defaults() {
        let cfg = DashboardConfig::load(Path::new("/nonexistent/sales-dashboard.json")).unwrap();
        assert_eq!(cfg, DashboardConfig::default());
    }

    #[test]
    fn zero_window_is_clamped() {
        let cfg = DashboardConfig {
            rolling_window: 0,
            histogram_bins: 0,
            ..Default::default()
        };
        assert_eq!(
            cfg.aggregate_settings(),
            AggregateSettings {
                rolling_window: 1,
                histogram_bins: 1,
            }
        );
    }
}
