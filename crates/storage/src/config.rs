#![forbid(unsafe_code)]

use crate::StoreError;
use serde::{Deserialize, Serialize};
use sg_core::{PinLimits, TargetKind};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

pub const PINNED_POST_LIMIT_ENV: &str = "SOCIALGRAPH_PINNED_POST_LIMIT";
pub const PINNED_COMMENT_LIMIT_ENV: &str = "SOCIALGRAPH_PINNED_COMMENT_LIMIT";
pub const BUSY_TIMEOUT_MS_ENV: &str = "SOCIALGRAPH_BUSY_TIMEOUT_MS";

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Settings the surrounding application supplies to the store.
///
/// Layering, lowest precedence first: [`StoreConfig::default`], a JSON
/// document, then `SOCIALGRAPH_*` environment variables.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    pub pin_limits: PinLimits,
    pub busy_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            pin_limits: PinLimits::default(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

impl StoreConfig {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    pub fn with_pin_limit(mut self, kind: TargetKind, limit: u32) -> Self {
        self.pin_limits.set_limit(kind, limit);
        self
    }

    pub fn from_json_str(raw: &str) -> Result<Self, StoreError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Result<Self, StoreError> {
        Self::default().with_env_overrides()
    }

    pub fn with_env_overrides(self) -> Result<Self, StoreError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup`; blank values are ignored.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, StoreError> {
        if let Some(limit) =
            parse_override::<u32>(PINNED_POST_LIMIT_ENV, lookup(PINNED_POST_LIMIT_ENV))?
        {
            self.pin_limits.post = limit;
        }
        if let Some(limit) =
            parse_override::<u32>(PINNED_COMMENT_LIMIT_ENV, lookup(PINNED_COMMENT_LIMIT_ENV))?
        {
            self.pin_limits.comment = limit;
        }
        if let Some(timeout) =
            parse_override::<u64>(BUSY_TIMEOUT_MS_ENV, lookup(BUSY_TIMEOUT_MS_ENV))?
        {
            self.busy_timeout_ms = timeout;
        }
        Ok(self)
    }
}

fn parse_override<T: FromStr>(key: &str, raw: Option<String>) -> Result<Option<T>, StoreError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed.parse::<T>().map(Some).map_err(|_| {
        StoreError::Config(format!(
            "{key} must be a non-negative integer, got {trimmed:?}"
        ))
    })
}
