use anyhow::{Context, Result};
use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::data::{Cadence, DeliveryOptions, LookbackDays, ReportType};

/// Initial values for a freshly mounted builder
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderDefaults {
    pub report_type: ReportType,
    pub lookback_days: LookbackDays,
    pub cadence: Cadence,
    pub weekly_day_of_week: Weekday,
    pub monthly_day_of_month: u32,
    pub send_hour: u32,
    pub send_minute: u32,
    pub timezone: String,
    pub delivery: DeliveryOptions,
}

impl Default for BuilderDefaults {
    fn default() -> Self {
        Self {
            report_type: ReportType::MarketSnapshot,
            lookback_days: LookbackDays::D30,
            cadence: Cadence::Weekly,
            weekly_day_of_week: Weekday::Mon,
            monthly_day_of_month: 1,
            send_hour: 9,
            send_minute: 0,
            timezone: "America/Los_Angeles".to_string(),
            delivery: DeliveryOptions {
                view_in_browser: true,
                download_pdf: true,
                download_social_image: false,
                send_via_email: false,
            },
        }
    }
}

impl BuilderDefaults {
    /// Reads defaults from a JSON file. Missing keys keep their built-in value.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {:?}", path))?;
        let defaults: BuilderDefaults = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config JSON: {:?}", path))?;
        Ok(defaults)
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_sends_monday_morning() {
        let defaults = BuilderDefaults::default();
        assert_eq!(defaults.cadence, Cadence::Weekly);
        assert_eq!(defaults.weekly_day_of_week, Weekday::Mon);
        assert_eq!(defaults.send_hour, 9);
        assert_eq!(defaults.send_minute, 0);
        assert!(defaults.delivery.any_enabled());
        assert!(!defaults.delivery.send_via_email);
    }

    #[test]
    fn test_load_partial_config_keeps_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("defaults.json");
        fs::write(&path, r#"{"timezone": "America/Chicago", "lookback_days": 90}"#).unwrap();

        let loaded = BuilderDefaults::load(&path).unwrap();
        assert_eq!(loaded.timezone, "America/Chicago");
        assert_eq!(loaded.lookback_days, LookbackDays::D90);
        assert_eq!(loaded.send_hour, 9);
    }

    #[test]
    fn test_load_rejects_bad_lookback() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("defaults.json");
        fs::write(&path, r#"{"lookback_days": 45}"#).unwrap();

        assert!(BuilderDefaults::load(&path).is_err());
    }

    #[test]
    fn test_load_or_default_without_path() {
        let defaults = BuilderDefaults::load_or_default(None).unwrap();
        assert_eq!(defaults.report_type, ReportType::MarketSnapshot);
    }
}
