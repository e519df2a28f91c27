//! Configuration loading and validation

use crate::error::{HistoryError, Result};
use crate::history::{
    CompactionEngine, CompactionPolicy, HeuristicEstimator, LlmSummarizer, Summarizer,
    SummarizerConfig, TiktokenEstimator, TokenEstimator,
};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Top-level configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub compaction: CompactionSettings,
    #[serde(default)]
    pub summarizer: SummarizerSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Compaction policy settings
#[derive(Debug, Clone, Deserialize)]
pub struct CompactionSettings {
    pub max_token_limit: usize,
    pub recent_message_count: usize,
    pub summarization_ratio: f32,
    /// Use the tiktoken estimator instead of the chars/4 heuristic
    pub tiktoken_estimator: bool,
}

impl Default for CompactionSettings {
    fn default() -> Self {
        Self {
            max_token_limit: 4000,
            recent_message_count: 5,
            summarization_ratio: 0.3,
            tiktoken_estimator: false,
        }
    }
}

/// External summarizer settings
#[derive(Debug, Clone, Deserialize)]
pub struct SummarizerSettings {
    pub enabled: bool,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
    pub max_retries: usize,
}

impl Default for SummarizerSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: "http://localhost:8080/v1/chat/completions".to_string(),
            api_key: None,
            model: "gpt-3.5-turbo".to_string(),
            timeout_secs: 30,
            max_retries: 3,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            compaction: CompactionSettings::default(),
            summarizer: SummarizerSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Config {
    /// Load configuration from an optional file plus `HISTORY_`-prefixed
    /// environment variables (env wins)
    pub fn load(path: Option<&str>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }
        let settings = builder
            .add_source(config::Environment::with_prefix("HISTORY").separator("__"))
            .build()
            .map_err(|e| HistoryError::Configuration(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| HistoryError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.policy().validate()?;
        if self.summarizer.enabled && self.summarizer.endpoint.is_empty() {
            return Err(HistoryError::Configuration(
                "summarizer enabled but endpoint is empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn policy(&self) -> CompactionPolicy {
        CompactionPolicy {
            max_token_limit: self.compaction.max_token_limit,
            recent_message_count: self.compaction.recent_message_count,
            summarization_ratio: self.compaction.summarization_ratio,
        }
    }

    /// Build a compaction engine from this configuration
    pub fn build_engine(&self) -> Result<CompactionEngine> {
        self.validate()?;

        let estimator: Arc<dyn TokenEstimator> = if self.compaction.tiktoken_estimator {
            match TiktokenEstimator::new() {
                Ok(estimator) => Arc::new(estimator),
                Err(e) => {
                    warn!(error = %e, "tiktoken init failed, using heuristic estimator");
                    Arc::new(HeuristicEstimator)
                }
            }
        } else {
            Arc::new(HeuristicEstimator)
        };

        let timeout = Duration::from_secs(self.summarizer.timeout_secs);
        let external: Option<Arc<dyn Summarizer>> = if self.summarizer.enabled {
            let summarizer = LlmSummarizer::new(SummarizerConfig {
                endpoint: self.summarizer.endpoint.clone(),
                api_key: self.summarizer.api_key.clone(),
                model: self.summarizer.model.clone(),
                timeout,
                max_retries: self.summarizer.max_retries,
            })?;
            Some(Arc::new(summarizer))
        } else {
            None
        };

        CompactionEngine::new(self.policy(), estimator, external, timeout)
    }
}

/// Initialize tracing with an env-filter level, for binaries and tests
pub fn init_logging(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
