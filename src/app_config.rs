use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::default::Default;
use url::Url;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Playback settings
    #[serde(default)]
    pub playback: PlaybackConfig,

    /// Speech synthesis config
    #[serde(default)]
    pub synthesis: SynthesisConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Speech synthesis provider type
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SynthesisProvider {
    // @provider: HTTP speech service (OpenAI-compatible /v1/speech)
    #[default]
    Http,
    // @provider: Deterministic in-process synthesizer, no network
    Mock,
}

impl SynthesisProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Http => "HTTP",
            Self::Mock => "Mock",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Http => "http".to_string(),
            Self::Mock => "mock".to_string(),
        }
    }
}

// Implement Display trait for SynthesisProvider
impl std::fmt::Display for SynthesisProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

// Implement FromStr trait for SynthesisProvider
impl std::str::FromStr for SynthesisProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "mock" => Ok(Self::Mock),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Playback pacing and input handling
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlaybackConfig {
    /// Playback speed multiplier (1.0 = authored pace)
    #[serde(default = "default_speed")]
    pub speed: f64,

    /// Minimum milliseconds between scrub renders while dragging
    #[serde(default = "default_scrub_frame_ms")]
    pub scrub_frame_ms: u64,

    /// Seconds a followed group scene stays up when no cached audio
    /// length is resolvable
    #[serde(default = "default_group_dwell_fallback_secs")]
    pub group_dwell_fallback_secs: f64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            speed: default_speed(),
            scrub_frame_ms: default_scrub_frame_ms(),
            group_dwell_fallback_secs: default_group_dwell_fallback_secs(),
        }
    }
}

/// Speech synthesis service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SynthesisConfig {
    /// Synthesis provider to use
    #[serde(default)]
    pub provider: SynthesisProvider,

    // @field: Service URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Parts synthesized per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Base delay in milliseconds between consecutive batches
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,

    /// Ceiling the inter-batch delay may grow to under rate limiting
    #[serde(default = "default_batch_delay_max_ms")]
    pub batch_delay_max_ms: u64,

    /// Retry count for failed requests
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Backoff multiplier for retries (in milliseconds)
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            provider: SynthesisProvider::default(),
            endpoint: default_endpoint(),
            api_key: String::new(),
            model: default_model(),
            batch_size: default_batch_size(),
            batch_delay_ms: default_batch_delay_ms(),
            batch_delay_max_ms: default_batch_delay_max_ms(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_speed() -> f64 {
    1.0
}

fn default_scrub_frame_ms() -> u64 {
    16 // One render per frame at 60 Hz
}

fn default_group_dwell_fallback_secs() -> f64 {
    1.0
}

fn default_endpoint() -> String {
    "http://localhost:8880".to_string()
}

fn default_model() -> String {
    "tts-1".to_string()
}

fn default_batch_size() -> usize {
    4
}

fn default_batch_delay_ms() -> u64 {
    250 // 250ms default delay between batches
}

fn default_batch_delay_max_ms() -> u64 {
    8000
}

fn default_retry_count() -> u32 {
    3 // Default to 3 retries
}

fn default_retry_backoff_ms() -> u64 {
    1000 // 1 second base backoff time, doubled on each retry
}

fn default_timeout_secs() -> u64 {
    30
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if !self.playback.speed.is_finite() || self.playback.speed <= 0.0 {
            return Err(anyhow!(
                "Playback speed must be positive, got {}",
                self.playback.speed
            ));
        }
        if self.playback.scrub_frame_ms == 0 {
            return Err(anyhow!("Scrub frame interval must be at least 1ms"));
        }
        if !self.playback.group_dwell_fallback_secs.is_finite()
            || self.playback.group_dwell_fallback_secs <= 0.0
        {
            return Err(anyhow!("Group dwell fallback must be positive"));
        }

        if self.synthesis.batch_size == 0 {
            return Err(anyhow!("Synthesis batch size must be at least 1"));
        }
        if self.synthesis.batch_delay_max_ms < self.synthesis.batch_delay_ms {
            return Err(anyhow!(
                "Max batch delay ({}ms) is below the base delay ({}ms)",
                self.synthesis.batch_delay_max_ms,
                self.synthesis.batch_delay_ms
            ));
        }

        // The HTTP provider needs a well-formed endpoint; mock runs offline
        if self.synthesis.provider == SynthesisProvider::Http {
            if self.synthesis.endpoint.is_empty() {
                return Err(anyhow!("Synthesis endpoint is required for HTTP provider"));
            }
            Url::parse(&self.synthesis.endpoint).map_err(|e| {
                anyhow!(
                    "Invalid synthesis endpoint '{}': {}",
                    self.synthesis.endpoint,
                    e
                )
            })?;
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            playback: PlaybackConfig::default(),
            synthesis: SynthesisConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
