//! Configuration system
//!
//! Read-only settings consumed by the engine: currency symbol, target
//! hours per workday, and the optional project/budget configuration.
//! Loaded from a TOML file with environment variable overrides.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,

    #[serde(default = "default_hours_per_workday")]
    pub hours_per_workday: f64,

    #[serde(default)]
    pub project: Option<ProjectConfig>,
}

fn default_currency_symbol() -> String {
    "€".to_string()
}

fn default_hours_per_workday() -> f64 {
    8.0
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            currency_symbol: default_currency_symbol(),
            hours_per_workday: default_hours_per_workday(),
            project: None,
        }
    }
}

/// Per-project configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,

    #[serde(default)]
    pub kind: ProjectKind,

    /// Total hour budget; only meaningful for fixed-budget projects.
    #[serde(default)]
    pub budget_hours: Option<f64>,
}

/// Billing mode of a project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectKind {
    /// Open-ended hourly billing.
    #[default]
    Hourly,
    /// A fixed pool of budgeted hours.
    FixedBudget,
}

impl Settings {
    /// The active hour budget, if any.
    ///
    /// Budget-derived fields are produced only when the project is in
    /// fixed-budget mode with a positive budget.
    pub fn budget_hours(&self) -> Option<f64> {
        let project = self.project.as_ref()?;
        if project.kind != ProjectKind::FixedBudget {
            return None;
        }
        project.budget_hours.filter(|h| *h > 0.0)
    }

    /// Load settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let settings: Settings = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(settings)
    }

    /// Load settings from a file with environment variable overrides.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut settings = Self::load(path)?;
        settings.apply_env_overrides();
        Ok(settings)
    }

    /// Load from default locations, falling back to defaults plus
    /// environment overrides.
    pub fn load_default() -> Self {
        let candidates = [
            dirs::config_dir().map(|p| p.join("worklog").join("config.toml")),
            Some(PathBuf::from("./worklog.toml")),
        ];

        for path in candidates.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(settings) => {
                        tracing::info!("Loaded settings from {:?}", path);
                        return settings;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load settings from {:?}: {}", path, e);
                    }
                }
            }
        }

        let mut settings = Self::default();
        settings.apply_env_overrides();
        settings
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(symbol) = std::env::var("WORKLOG_CURRENCY") {
            self.currency_symbol = symbol;
        }
        if let Ok(hours) = std::env::var("WORKLOG_HOURS_PER_WORKDAY") {
            if let Ok(h) = hours.parse() {
                self.hours_per_workday = h;
            }
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read settings file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse settings file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content.
pub fn generate_default_config() -> String {
    r#"# worklog configuration
#
# Environment variables override these settings:
# - WORKLOG_CURRENCY
# - WORKLOG_HOURS_PER_WORKDAY

# Symbol used when printing invoiced amounts
currency_symbol = "€"

# Target hours per working day, used for utilization
hours_per_workday = 8.0

# Optional project configuration. Budget fields in reports appear only
# for fixed-budget projects with a positive budget.
#
# [project]
# name = "Acme Redesign"
# kind = "fixed-budget"
# budget_hours = 120.0
"#
    .to_string()
}
