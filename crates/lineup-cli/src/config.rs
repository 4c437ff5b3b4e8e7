// Configuration loading and validation (lineup.toml).

use lineup_core::selection::role_key;
use lineup_core::strategy::StrategyParams;
use lineup_core::valuation::contributors::PredictionWeights;
use lineup_core::valuation::ValuationParams;
use lineup_core::{Constraints, LineupError, Role, SelectionMode};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

const CONFIG_FILE: &str = "lineup.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub constraints: Constraints,
    pub valuation: ValuationParams,
    pub strategy: StrategyParams,
    pub selection_mode: SelectionMode,
    pub jitter: JitterConfig,
    pub matchup: MatchupConfig,
    pub external: ExternalConfig,
    pub data_paths: DataPaths,
}

// ---------------------------------------------------------------------------
// lineup.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the whole lineup.toml file.
#[derive(Debug, Clone, Deserialize)]
struct LineupFile {
    constraints: Constraints,
    #[serde(default)]
    valuation: ValuationParams,
    #[serde(default)]
    strategy: StrategyParams,
    #[serde(default)]
    selection: SelectionSection,
    #[serde(default)]
    jitter: JitterConfig,
    #[serde(default)]
    matchup: MatchupConfig,
    #[serde(default)]
    external: ExternalConfig,
    data_paths: DataPaths,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SelectionSection {
    #[serde(default)]
    mode: SelectionMode,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JitterConfig {
    pub enabled: bool,
    pub seed: u64,
}

impl Default for JitterConfig {
    fn default() -> Self {
        JitterConfig {
            enabled: false,
            seed: 42,
        }
    }
}

/// Venue / opposition ratings and pitch factors.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MatchupConfig {
    pub enabled: bool,
    pub venue_weight: f64,
    pub opposition_weight: f64,
}

impl Default for MatchupConfig {
    fn default() -> Self {
        MatchupConfig {
            enabled: true,
            venue_weight: 20.0,
            opposition_weight: 25.0,
        }
    }
}

/// Blending of external performance forecasts.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExternalConfig {
    pub blend_weight: f64,
    pub weights: PredictionWeights,
}

impl Default for ExternalConfig {
    fn default() -> Self {
        ExternalConfig {
            blend_weight: 0.3,
            weights: PredictionWeights::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataPaths {
    pub roster: String,
    pub batting: String,
    pub bowling: String,
    #[serde(default)]
    pub form: Option<String>,
    #[serde(default)]
    pub ratings: Option<String>,
    #[serde(default)]
    pub predictions: Option<String>,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/lineup.toml` relative to `base_dir`.
///
/// Does not copy defaults. Prefer `load_config_in()`.
pub(crate) fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = read_file(&path)?;
    parse_config(&text, &path)
}

fn parse_config(text: &str, path: &Path) -> Result<Config, ConfigError> {
    let file: LineupFile = toml::from_str(text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config = Config {
        constraints: file.constraints,
        valuation: file.valuation,
        strategy: file.strategy,
        selection_mode: file.selection.mode,
        jitter: file.jitter,
        matchup: file.matchup,
        external: file.external,
        data_paths: file.data_paths,
    };

    validate(&config)?;

    Ok(config)
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the project root or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    let mut copied = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }
        let target = config_dir.join(file_name);

        // create_new never clobbers a user's edited copy
        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Load config relative to `base_dir`, copying defaults first.
pub fn load_config_in(base_dir: &Path) -> Result<Config, ConfigError> {
    ensure_config_files(base_dir)?;
    load_config_from(base_dir)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

/// Re-home a core validation error under its config section.
fn core_error(section: &str, err: LineupError) -> ConfigError {
    match err {
        LineupError::InvalidConstraints { field, message }
        | LineupError::InvalidParams { field, message } => ConfigError::ValidationError {
            field: format!("{section}.{field}"),
            message,
        },
        other => ConfigError::ValidationError {
            field: section.to_string(),
            message: other.to_string(),
        },
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    config
        .constraints
        .validate()
        .map_err(|e| core_error("constraints", e))?;
    config
        .valuation
        .validate()
        .map_err(|e| core_error("valuation", e))?;
    config
        .strategy
        .validate()
        .map_err(|e| core_error("strategy", e))?;

    let blend = config.external.blend_weight;
    if !(0.0..=1.0).contains(&blend) {
        return Err(ConfigError::ValidationError {
            field: "external.blend_weight".into(),
            message: format!("must be between 0.0 and 1.0 inclusive, got {blend}"),
        });
    }

    let w = &config.external.weights;
    let weight_fields: &[(&str, f64)] = &[
        ("external.weights.batting_high", w.batting_high),
        ("external.weights.batting_medium", w.batting_medium),
        (
            "external.weights.points_per_predicted_wicket",
            w.points_per_predicted_wicket,
        ),
        ("external.weights.bowling_high", w.bowling_high),
        ("external.weights.bowling_medium", w.bowling_medium),
        ("matchup.venue_weight", config.matchup.venue_weight),
        ("matchup.opposition_weight", config.matchup.opposition_weight),
    ];
    for (name, val) in weight_fields {
        if !val.is_finite() || *val < 0.0 {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: format!("must be >= 0, got {val}"),
            });
        }
    }

    let paths = &config.data_paths;
    for (name, val) in [
        ("data_paths.roster", &paths.roster),
        ("data_paths.batting", &paths.batting),
        ("data_paths.bowling", &paths.bowling),
    ] {
        if val.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: "must not be empty".into(),
            });
        }
    }

    Ok(())
}

/// Human-readable role bounds, e.g. for startup logging.
pub fn describe_roles(constraints: &Constraints) -> String {
    Role::ALL
        .iter()
        .map(|r| {
            let b = constraints.roles.get(*r);
            format!("{}={}-{}", role_key(*r), b.min, b.max)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
