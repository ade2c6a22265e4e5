use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::token::DEFAULT_TOKEN_LENGTH;

/// Directory holding the config file and the default store.
pub const PROJECT_DIR: &str = ".hotellyx";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotelConfig {
    #[serde(default)]
    pub sla: SlaConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub rooms: RoomsConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlaConfig {
    /// Minutes an active request may age before it counts as at risk.
    #[serde(default = "default_sla_minutes")]
    pub threshold_minutes: u32,
}

impl Default for SlaConfig {
    fn default() -> Self {
        Self {
            threshold_minutes: default_sla_minutes(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Trailing window for average response and completion times.
    #[serde(default = "default_response_window_hours")]
    pub response_window_hours: u32,
    /// Trailing window for the request-rate metric.
    #[serde(default = "default_rate_window_minutes")]
    pub rate_window_minutes: u32,
    /// How far back the point-in-time baselines (active, SLA risk) are taken.
    #[serde(default = "default_comparison_offset_minutes")]
    pub comparison_offset_minutes: u32,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            response_window_hours: default_response_window_hours(),
            rate_window_minutes: default_rate_window_minutes(),
            comparison_offset_minutes: default_comparison_offset_minutes(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomsConfig {
    #[serde(default = "default_token_length")]
    pub token_length: usize,
}

impl Default for RoomsConfig {
    fn default() -> Self {
        Self {
            token_length: default_token_length(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Services viewed fewer times than this are reported as unused.
    #[serde(default = "default_unused_view_threshold")]
    pub unused_view_threshold: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            unused_view_threshold: default_unused_view_threshold(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store database path; relative paths resolve against the project root.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl HotelConfig {
    /// Absolute store path for a project rooted at `project_root`.
    #[must_use]
    pub fn store_path(&self, project_root: &Path) -> PathBuf {
        match &self.store.path {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => project_root.join(path),
            None => project_root.join(PROJECT_DIR).join("hotellyx.db"),
        }
    }
}

/// Per-user preferences shared by every property on this machine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    /// Preferred output mode (`pretty`, `text`, or `json`).
    #[serde(default)]
    pub output: Option<String>,
}

/// Load the user config from `<config dir>/hotellyx/config.toml`.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };
    load_user_config_from(&config_dir.join("hotellyx/config.toml"))
}

fn load_user_config_from(path: &Path) -> Result<UserConfig> {
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load `.hotellyx/config.toml`, or defaults when absent.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config(project_root: &Path) -> Result<HotelConfig> {
    let path = project_root.join(PROJECT_DIR).join("config.toml");
    if !path.exists() {
        return Ok(HotelConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<HotelConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Pure override resolution, separated from the environment for testability.
///
/// # Errors
///
/// Returns an error if `sla_minutes` is not a positive integer.
pub fn apply_overrides(
    mut config: HotelConfig,
    sla_minutes: Option<String>,
    store_path: Option<String>,
) -> Result<HotelConfig> {
    if let Some(raw) = sla_minutes {
        let minutes: u32 = raw
            .trim()
            .parse()
            .with_context(|| format!("HOTELLYX_SLA_MINUTES is not a number: '{raw}'"))?;
        if minutes == 0 {
            bail!("HOTELLYX_SLA_MINUTES must be positive");
        }
        config.sla.threshold_minutes = minutes;
    }

    if let Some(path) = store_path.map(|p| p.trim().to_string()).filter(|p| !p.is_empty()) {
        config.store.path = Some(PathBuf::from(path));
    }

    Ok(config)
}

const fn default_sla_minutes() -> u32 {
    25
}

const fn default_response_window_hours() -> u32 {
    24
}

const fn default_rate_window_minutes() -> u32 {
    60
}

const fn default_comparison_offset_minutes() -> u32 {
    60
}

const fn default_token_length() -> usize {
    DEFAULT_TOKEN_LENGTH
}

const fn default_unused_view_threshold() -> u64 {
    5
}
