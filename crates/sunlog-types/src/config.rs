use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{skin::SkinClass, Result, SunlogError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub min_buffer_bytes: usize,
    /// Scan window bounds as percentages of the buffer length.
    pub window_start_pct: u8,
    pub window_end_pct: u8,
    pub stride: usize,
    pub min_samples: usize,
    pub max_samples: usize,
    pub processing_delay_ms: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            min_buffer_bytes: 1000,
            window_start_pct: 20,
            window_end_pct: 80,
            stride: 4,
            min_samples: 3000,
            max_samples: 20000,
            processing_delay_ms: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// UV index assumed when neither the session nor the context carries one.
    pub default_uv_index: f64,
    /// Daily UV-minute budget per skin class, lightest first. A day that
    /// reaches the budget scores 100.
    pub dose_limits: [f64; 6],
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            default_uv_index: 5.0,
            dose_limits: [100.0, 150.0, 250.0, 350.0, 500.0, 700.0],
        }
    }
}

impl ScoringConfig {
    pub fn dose_limit(&self, skin_class: SkinClass) -> f64 {
        self.dose_limits[skin_class.index()]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    pub streak_lookback_days: u32,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            streak_lookback_days: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpsConfig {
    pub log_level: String,
}

impl Default for OpsConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SunlogConfig {
    pub classifier: ClassifierConfig,
    pub scoring: ScoringConfig,
    pub stats: StatsConfig,
    pub ops: OpsConfig,
}

impl SunlogConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref).map_err(|err| {
            SunlogError::Configuration(format!(
                "unable to read config file {}: {err}",
                path_ref.display()
            ))
        })?;
        toml::from_str(&contents).map_err(|err| {
            SunlogError::Configuration(format!(
                "failed to parse config file {}: {err}",
                path_ref.display()
            ))
        })
    }

    pub fn validate(&self) -> Result<()> {
        let classifier = &self.classifier;
        if classifier.stride < 3 {
            return Err(SunlogError::Configuration(
                "classifier.stride must cover a full RGB triplet (>= 3)".into(),
            ));
        }
        if classifier.window_start_pct >= classifier.window_end_pct
            || classifier.window_end_pct > 100
        {
            return Err(SunlogError::Configuration(
                "classifier window must satisfy start < end <= 100".into(),
            ));
        }
        if classifier.min_samples > classifier.max_samples {
            return Err(SunlogError::Configuration(
                "classifier.min_samples must not exceed classifier.max_samples".into(),
            ));
        }
        if !self.scoring.default_uv_index.is_finite() || self.scoring.default_uv_index < 0.0 {
            return Err(SunlogError::Configuration(
                "scoring.default_uv_index must be a non-negative number".into(),
            ));
        }
        if self
            .scoring
            .dose_limits
            .iter()
            .any(|limit| !limit.is_finite() || *limit <= 0.0)
        {
            return Err(SunlogError::Configuration(
                "scoring.dose_limits must all be positive".into(),
            ));
        }
        if self.stats.streak_lookback_days == 0 {
            return Err(SunlogError::Configuration(
                "stats.streak_lookback_days must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn load_sunlog_config_from_file() {
        let temp_path = std::env::temp_dir().join("sunlog-config-test.toml");
        let mut config = SunlogConfig::default();
        config.classifier.processing_delay_ms = 1200;
        config.scoring.default_uv_index = 7.5;
        config.stats.streak_lookback_days = 14;
        config.ops.log_level = "debug".into();

        let doc = toml::to_string(&config).expect("serialize config");
        fs::write(&temp_path, doc).expect("write temp config");

        let loaded = SunlogConfig::from_file(&temp_path).expect("load config");
        assert_eq!(loaded, config);
        fs::remove_file(&temp_path).expect("cleanup temp config");
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let loaded: SunlogConfig = toml::from_str("[stats]\nstreak_lookback_days = 7\n").unwrap();
        assert_eq!(loaded.stats.streak_lookback_days, 7);
        assert_eq!(loaded.classifier, ClassifierConfig::default());
        assert_eq!(loaded.ops.log_level, "info");
    }

    #[test]
    fn missing_file_is_configuration_error() {
        let err = SunlogConfig::from_file("/nonexistent/sunlog.toml").unwrap_err();
        assert!(matches!(err, SunlogError::Configuration(_)));
    }

    #[test]
    fn validate_configuration_rules() {
        let mut config = SunlogConfig::default();
        assert!(config.validate().is_ok());

        config.classifier.stride = 2;
        assert!(config.validate().is_err());
        config.classifier.stride = 4;
        config.classifier.window_start_pct = 80;
        assert!(config.validate().is_err());
        config.classifier.window_start_pct = 20;
        config.classifier.min_samples = 50_000;
        assert!(config.validate().is_err());
        config.classifier.min_samples = 3000;
        config.scoring.default_uv_index = f64::NAN;
        assert!(config.validate().is_err());
        config.scoring.default_uv_index = 5.0;
        config.scoring.dose_limits[2] = 0.0;
        assert!(config.validate().is_err());
        config.scoring.dose_limits[2] = 250.0;
        config.stats.streak_lookback_days = 0;
        assert!(config.validate().is_err());
        config.stats.streak_lookback_days = 30;
        assert!(config.validate().is_ok());
    }
}
