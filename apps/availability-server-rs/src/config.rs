use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_FLEET_CONCURRENCY: u64 = 8;
const DEFAULT_OFFENDERS_LIMIT: u64 = 10;
const DEFAULT_MAX_WINDOW_DAYS: u32 = 366;

fn setup_config_path() -> Option<PathBuf> {
    env_optional_string("UPTIME_CONFIG_PATH").map(PathBuf::from)
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SetupConfigOverrides {
    #[serde(default)]
    database_url: Option<String>,
    #[serde(default)]
    stale_after_seconds: Option<u64>,
    #[serde(default)]
    fleet_concurrency: Option<u64>,
    #[serde(default)]
    offenders_limit: Option<u64>,
    #[serde(default)]
    max_window_days: Option<u32>,
}

fn load_setup_config_overrides(path: &Path) -> Option<SetupConfigOverrides> {
    if !path.exists() {
        return None;
    }
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "failed to read setup config; using env defaults"
            );
            return None;
        }
    };
    match serde_json::from_str(&contents) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "failed to parse setup config; using env defaults"
            );
            None
        }
    }
}

#[derive(Debug, Clone)]
pub struct AvailabilityConfig {
    pub database_url: String,
    pub stale_after_seconds: u64,
    pub fleet_concurrency: usize,
    pub offenders_limit: usize,
    pub max_window_days: u32,
}

impl AvailabilityConfig {
    pub fn from_env() -> Result<Self> {
        let overrides = setup_config_path()
            .and_then(|path| load_setup_config_overrides(&path))
            .unwrap_or_default();

        let database_url = env_optional_string("UPTIME_DATABASE_URL")
            .or_else(|| {
                overrides
                    .database_url
                    .as_deref()
                    .map(str::trim)
                    .filter(|value| !value.is_empty())
                    .map(|value| value.to_string())
            })
            .context(
                "UPTIME_DATABASE_URL must be set (or present as database_url in the setup config)",
            )?;
        let database_url = normalize_database_url(database_url);

        // No built-in default; must be configured.
        let stale_after_seconds = env_optional_u64("UPTIME_STALE_AFTER_SECONDS")
            .or(overrides.stale_after_seconds)
            .filter(|value| *value > 0)
            .context(
                "UPTIME_STALE_AFTER_SECONDS must be set to a positive number of seconds \
                 (or present as stale_after_seconds in the setup config)",
            )?;

        let fleet_concurrency = env_optional_u64("UPTIME_FLEET_CONCURRENCY")
            .or(overrides.fleet_concurrency)
            .unwrap_or(DEFAULT_FLEET_CONCURRENCY)
            .clamp(1, 64) as usize;
        let offenders_limit = env_optional_u64("UPTIME_OFFENDERS_LIMIT")
            .or(overrides.offenders_limit)
            .unwrap_or(DEFAULT_OFFENDERS_LIMIT)
            .clamp(1, 500) as usize;
        let max_window_days = env_optional_u32("UPTIME_MAX_WINDOW_DAYS")
            .or(overrides.max_window_days)
            .unwrap_or(DEFAULT_MAX_WINDOW_DAYS)
            .clamp(1, 3650);

        Ok(Self {
            database_url,
            stale_after_seconds,
            fleet_concurrency,
            offenders_limit,
            max_window_days,
        })
    }

    pub fn stale_after(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.stale_after_seconds.min(u64::from(u32::MAX)) as i64)
    }

    pub fn max_window(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.max_window_days))
    }
}

fn env_optional_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_optional_u64(key: &str) -> Option<u64> {
    env_optional_string(key).and_then(|value| value.parse::<u64>().ok())
}

fn env_optional_u32(key: &str) -> Option<u32> {
    env_optional_string(key).and_then(|value| value.parse::<u32>().ok())
}

fn normalize_database_url(url: String) -> String {
    if let Some(stripped) = url.strip_prefix("postgresql+psycopg://") {
        return format!("postgresql://{stripped}");
    }
    if let Some(stripped) = url.strip_prefix("postgresql+asyncpg://") {
        return format!("postgresql://{stripped}");
    }
    url
}
