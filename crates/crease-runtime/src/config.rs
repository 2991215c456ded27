//! Configuration loading
//!
//! Engine configs are plain structs owned by their crates. This module maps
//! a JSON document (every field optional) onto them, applies environment
//! overrides and validates the result.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crease_core::{CreaseError, CreaseResult};
use crease_intake::{IntakeConfig, ProgressConfig};
use crease_media::{PlaybackConfig, TimelineConfig};
use crease_pose::{default_readouts, AngleReadoutSpec, CadenceConfig, KeypointLabel};
use crease_score::{EfficiencyRule, ScoringConfig, ThresholdPolicy};

/// Environment variable overriding the progress step interval
pub const ENV_PROGRESS_INTERVAL: &str = "CREASE_PROGRESS_INTERVAL";
/// Environment variable overriding the overlay tick period
pub const ENV_OVERLAY_PERIOD: &str = "CREASE_OVERLAY_PERIOD";
/// Environment variable overriding the overlay jitter
pub const ENV_OVERLAY_JITTER: &str = "CREASE_OVERLAY_JITTER";
/// Environment variable seeding every random source in a session
pub const ENV_SEED: &str = "CREASE_SEED";

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Bad duration for {field}: {source}")]
    Duration {
        field: &'static str,
        #[source]
        source: humantime::DurationError,
    },

    #[error("Bad value for {field}: {value}")]
    Value { field: &'static str, value: String },

    #[error(transparent)]
    Invalid(#[from] CreaseError),
}

impl From<ConfigError> for CreaseError {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::Invalid(inner) => inner,
            other => CreaseError::InvalidConfig(other.to_string()),
        }
    }
}

/// Async runtime configuration
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    /// Base tick of the runtime loop
    pub tick_interval: Duration,
    /// Bound on queued intents
    pub intent_capacity: usize,
    /// Seed for the session id and overlay randomness (`None` = entropy)
    pub seed: Option<u64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            tick_interval: Duration::from_millis(20),
            intent_capacity: 32,
            seed: None,
        }
    }
}

impl RuntimeConfig {
    pub fn validate(&self) -> CreaseResult<()> {
        if self.tick_interval.is_zero() {
            return Err(CreaseError::InvalidConfig(
                "runtime tick interval must be non-zero".into(),
            ));
        }
        if self.intent_capacity == 0 {
            return Err(CreaseError::InvalidConfig(
                "intent capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Full session configuration
#[derive(Clone, Debug)]
pub struct CreaseConfig {
    pub intake: IntakeConfig,
    pub progress: ProgressConfig,
    pub cadence: CadenceConfig,
    pub readouts: Vec<AngleReadoutSpec>,
    /// Overlay visibility at the start of a session
    pub overlay_visible: bool,
    pub scoring: ScoringConfig,
    pub playback: PlaybackConfig,
    pub timeline: TimelineConfig,
    pub runtime: RuntimeConfig,
}

impl Default for CreaseConfig {
    fn default() -> Self {
        CreaseConfig {
            intake: IntakeConfig::default(),
            progress: ProgressConfig::default(),
            cadence: CadenceConfig::default(),
            readouts: default_readouts(),
            overlay_visible: true,
            scoring: ScoringConfig::default(),
            playback: PlaybackConfig::default(),
            timeline: TimelineConfig::default(),
            runtime: RuntimeConfig::default(),
        }
    }
}

impl CreaseConfig {
    /// Default timers with every random source seeded, for tests and replays
    pub fn deterministic(seed: u64) -> Self {
        let mut config = Self::default();
        config.cadence.seed = Some(seed);
        config.runtime.seed = Some(seed);
        config
    }

    pub fn validate(&self) -> CreaseResult<()> {
        self.progress.validate()?;
        self.cadence.validate()?;
        self.scoring.validate()?;
        self.timeline.validate()?;
        self.runtime.validate()?;
        if !self.playback.frame_rate.is_finite() || self.playback.frame_rate <= 0.0 {
            return Err(CreaseError::InvalidConfig(format!(
                "frame rate must be positive, got {}",
                self.playback.frame_rate
            )));
        }
        Ok(())
    }

    /// Parse a JSON document over the defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = serde_json::from_str(json)?;
        let mut config = Self::default();
        file.apply(&mut config)?;
        Ok(config)
    }

    /// Load from a JSON file, apply environment overrides and validate
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut config = Self::from_json(&json)?;
        config.apply_env()?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Apply `CREASE_*` overrides from the process environment
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_PROGRESS_INTERVAL) {
            self.progress.interval = parse_duration(ENV_PROGRESS_INTERVAL, &value)?;
        }
        if let Some(value) = lookup(ENV_OVERLAY_PERIOD) {
            self.cadence.period = parse_duration(ENV_OVERLAY_PERIOD, &value)?;
        }
        if let Some(value) = lookup(ENV_OVERLAY_JITTER) {
            self.cadence.jitter = value.trim().parse().map_err(|_| ConfigError::Value {
                field: ENV_OVERLAY_JITTER,
                value: value.clone(),
            })?;
        }
        if let Some(value) = lookup(ENV_SEED) {
            let seed: u64 = value.trim().parse().map_err(|_| ConfigError::Value {
                field: ENV_SEED,
                value: value.clone(),
            })?;
            self.cadence.seed = Some(seed);
            self.runtime.seed = Some(seed);
        }
        Ok(())
    }
}

fn parse_duration(field: &'static str, value: &str) -> Result<Duration, ConfigError> {
    humantime::parse_duration(value.trim()).map_err(|source| ConfigError::Duration { field, source })
}

fn parse_opt_duration(field: &'static str, value: &Option<String>) -> Result<Option<Duration>, ConfigError> {
    value.as_deref().map(|v| parse_duration(field, v)).transpose()
}

// ============================================================================
// File form
// ============================================================================

/// On-disk shape of the configuration. Durations are humantime strings
/// (`"100ms"`, `"5s"`); anything absent keeps its default.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub intake: IntakeSection,
    pub progress: ProgressSection,
    pub overlay: OverlaySection,
    pub scoring: ScoringSection,
    pub playback: PlaybackSection,
    pub runtime: RuntimeSection,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IntakeSection {
    pub media_types: Option<Vec<String>>,
    pub extensions: Option<Vec<String>>,
    pub max_size: Option<u64>,
    pub enforce_size_limit: Option<bool>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProgressSection {
    pub step: Option<u8>,
    pub interval: Option<String>,
    pub completion_delay: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OverlaySection {
    pub period: Option<String>,
    pub jitter: Option<f32>,
    pub seed: Option<u64>,
    pub visible: Option<bool>,
    pub readouts: Option<Vec<ReadoutEntry>>,
}

/// Angle readout by keypoint names, e.g. `R-Shoulder`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReadoutEntry {
    pub name: String,
    pub proximal: String,
    pub joint: String,
    pub distal: String,
}

impl ReadoutEntry {
    fn resolve(&self) -> Result<AngleReadoutSpec, ConfigError> {
        let label = |name: &str| {
            KeypointLabel::from_name(name).ok_or_else(|| ConfigError::Value {
                field: "overlay.readouts",
                value: name.to_string(),
            })
        };
        Ok(AngleReadoutSpec::new(
            self.name.clone(),
            label(&self.proximal)?,
            label(&self.joint)?,
            label(&self.distal)?,
        ))
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoringSection {
    pub good: Option<u8>,
    pub average: Option<u8>,
    pub efficiency: Option<EfficiencyEntry>,
}

/// `"mean"`, `"weighted"` or `{"supplied": 87}`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EfficiencyEntry {
    Mean,
    Weighted,
    Supplied(u8),
}

impl From<EfficiencyEntry> for EfficiencyRule {
    fn from(entry: EfficiencyEntry) -> Self {
        match entry {
            EfficiencyEntry::Mean => EfficiencyRule::Mean,
            EfficiencyEntry::Weighted => EfficiencyRule::Weighted,
            EfficiencyEntry::Supplied(p) => EfficiencyRule::Supplied(p),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlaybackSection {
    pub looping: Option<bool>,
    pub muted: Option<bool>,
    pub autoplay: Option<bool>,
    pub frame_rate: Option<f64>,
    pub sweep_period: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeSection {
    pub tick_interval: Option<String>,
    pub intent_capacity: Option<usize>,
    pub seed: Option<u64>,
}

impl ConfigFile {
    /// Overlay the present fields onto `config`
    pub fn apply(&self, config: &mut CreaseConfig) -> Result<(), ConfigError> {
        let intake = &self.intake;
        if let Some(v) = &intake.media_types {
            config.intake.accepted_media_types = v.clone();
        }
        if let Some(v) = &intake.extensions {
            config.intake.accepted_extensions = v.iter().map(|e| e.to_ascii_lowercase()).collect();
        }
        if let Some(v) = intake.max_size {
            config.intake.max_size = v;
        }
        if let Some(v) = intake.enforce_size_limit {
            config.intake.enforce_size_limit = v;
        }

        if let Some(v) = self.progress.step {
            config.progress.step = v;
        }
        if let Some(v) = parse_opt_duration("progress.interval", &self.progress.interval)? {
            config.progress.interval = v;
        }
        if let Some(v) = parse_opt_duration("progress.completion_delay", &self.progress.completion_delay)? {
            config.progress.completion_delay = v;
        }

        let overlay = &self.overlay;
        if let Some(v) = parse_opt_duration("overlay.period", &overlay.period)? {
            config.cadence.period = v;
        }
        if let Some(v) = overlay.jitter {
            config.cadence.jitter = v;
        }
        if overlay.seed.is_some() {
            config.cadence.seed = overlay.seed;
        }
        if let Some(v) = overlay.visible {
            config.overlay_visible = v;
        }
        if let Some(entries) = &overlay.readouts {
            config.readouts = entries
                .iter()
                .map(ReadoutEntry::resolve)
                .collect::<Result<_, _>>()?;
        }

        let scoring = &self.scoring;
        if scoring.good.is_some() || scoring.average.is_some() {
            let defaults = ThresholdPolicy::default();
            config.scoring.thresholds = ThresholdPolicy {
                good: scoring.good.unwrap_or(defaults.good),
                average: scoring.average.unwrap_or(defaults.average),
            };
        }
        if let Some(v) = scoring.efficiency {
            config.scoring.efficiency = v.into();
        }

        let playback = &self.playback;
        if let Some(v) = playback.looping {
            config.playback.looping = v;
        }
        if let Some(v) = playback.muted {
            config.playback.muted = v;
        }
        if let Some(v) = playback.autoplay {
            config.playback.autoplay = v;
        }
        if let Some(v) = playback.frame_rate {
            config.playback.frame_rate = v;
        }
        if let Some(v) = parse_opt_duration("playback.sweep_period", &playback.sweep_period)? {
            config.timeline.sweep_period = v;
        }

        let runtime = &self.runtime;
        if let Some(v) = parse_opt_duration("runtime.tick_interval", &runtime.tick_interval)? {
            config.runtime.tick_interval = v;
        }
        if let Some(v) = runtime.intent_capacity {
            config.runtime.intent_capacity = v;
        }
        if runtime.seed.is_some() {
            config.runtime.seed = runtime.seed;
        }
        Ok(())
    }
}
