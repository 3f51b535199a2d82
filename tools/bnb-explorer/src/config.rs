use crate::errors::ExplorerError;
use crate::replay::ReplayOptions;
use crate::runtime::FileSystem;
use crate::search::SearchOptions;
use crate::types::BestPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_path: Option<PathBuf>,
    pub tolerance: Option<u64>,
    pub max_steps: Option<u64>,
    pub best_policy: Option<BestPolicy>,
    pub include_pending: bool,
    pub clamp_cursor: bool,
    pub log_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    pub search: SearchConfig,
    pub replay: ReplayConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchConfig {
    pub tolerance: u64,
    /// Zero leaves the search unbounded.
    pub max_steps: u64,
    pub best_policy: BestPolicy,
    pub emit_start_marker: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReplayConfig {
    pub include_pending: bool,
    pub clamp_cursor: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Empty disables the JSONL event log.
    pub path: String,
    pub max_payload_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            search: SearchConfig {
                tolerance: 0,
                max_steps: 0,
                best_policy: BestPolicy::LastFound,
                emit_start_marker: true,
            },
            replay: ReplayConfig {
                include_pending: false,
                clamp_cursor: false,
            },
            logging: LoggingConfig {
                path: String::new(),
                max_payload_bytes: 4096,
            },
        }
    }
}

impl AppConfig {
    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            tolerance: self.search.tolerance,
            max_steps: (self.search.max_steps > 0).then_some(self.search.max_steps),
            best_policy: self.search.best_policy,
            emit_start_marker: self.search.emit_start_marker,
        }
    }

    pub fn replay_options(&self) -> ReplayOptions {
        ReplayOptions {
            include_pending: self.replay.include_pending,
        }
    }

    pub fn log_path(&self) -> Option<PathBuf> {
        let trimmed = self.logging.path.trim();
        (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct PartialAppConfig {
    search: Option<PartialSearchConfig>,
    replay: Option<PartialReplayConfig>,
    logging: Option<PartialLoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct PartialSearchConfig {
    tolerance: Option<u64>,
    max_steps: Option<u64>,
    best_policy: Option<BestPolicy>,
    emit_start_marker: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct PartialReplayConfig {
    include_pending: Option<bool>,
    clamp_cursor: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct PartialLoggingConfig {
    path: Option<String>,
    max_payload_bytes: Option<usize>,
}

pub fn load_config(
    overrides: &CliOverrides,
    fs: &dyn FileSystem,
) -> Result<AppConfig, ExplorerError> {
    let mut cfg = AppConfig::default();

    if let Some(path) = &overrides.config_path {
        let file_contents = fs.read_to_string(path)?;
        let partial: PartialAppConfig = toml::from_str(&file_contents)
            .map_err(|e| ExplorerError::ConfigParse(e.to_string()))?;
        merge_partial_config(&mut cfg, partial);
    }

    apply_cli_overrides(&mut cfg, overrides);
    validate_config(&cfg)?;
    Ok(cfg)
}

fn merge_partial_config(cfg: &mut AppConfig, partial: PartialAppConfig) {
    if let Some(search) = partial.search {
        if let Some(value) = search.tolerance {
            cfg.search.tolerance = value;
        }
        if let Some(value) = search.max_steps {
            cfg.search.max_steps = value;
        }
        if let Some(value) = search.best_policy {
            cfg.search.best_policy = value;
        }
        if let Some(value) = search.emit_start_marker {
            cfg.search.emit_start_marker = value;
        }
    }

    if let Some(replay) = partial.replay {
        if let Some(value) = replay.include_pending {
            cfg.replay.include_pending = value;
        }
        if let Some(value) = replay.clamp_cursor {
            cfg.replay.clamp_cursor = value;
        }
    }

    if let Some(logging) = partial.logging {
        if let Some(value) = logging.path {
            cfg.logging.path = value;
        }
        if let Some(value) = logging.max_payload_bytes {
            cfg.logging.max_payload_bytes = value;
        }
    }
}

fn apply_cli_overrides(cfg: &mut AppConfig, overrides: &CliOverrides) {
    if let Some(tolerance) = overrides.tolerance {
        cfg.search.tolerance = tolerance;
    }
    if let Some(max_steps) = overrides.max_steps {
        cfg.search.max_steps = max_steps;
    }
    if let Some(policy) = overrides.best_policy {
        cfg.search.best_policy = policy;
    }
    if overrides.include_pending {
        cfg.replay.include_pending = true;
    }
    if overrides.clamp_cursor {
        cfg.replay.clamp_cursor = true;
    }
    if let Some(path) = &overrides.log_path {
        cfg.logging.path = path.display().to_string();
    }
}

fn validate_config(cfg: &AppConfig) -> Result<(), ExplorerError> {
    if cfg.logging.max_payload_bytes == 0 {
        return Err(ExplorerError::InvalidConfig(
            "logging.max_payload_bytes must be greater than zero".to_string(),
        ));
    }
    Ok(())
}
