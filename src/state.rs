use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::Level;

use crate::action::Policy;

/// Scoring constants.
#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    /// Knowledge confidence above which lookups are skipped.
    pub knowledge_trust: f32,
    /// Best per-candidate similarity a rule match must exceed.
    pub min_similarity: f32,
    /// Search confidence below which the knowledge result is used instead.
    pub search_floor: f32,
    pub verbatim_points: u32,
    pub token_points: u32,
    /// Minimum token length (chars) that earns token points.
    pub min_token_len: usize,
    /// Score that maps to full confidence.
    pub score_scale: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            knowledge_trust: 0.8,
            min_similarity: 0.3,
            search_floor: 0.3,
            verbatim_points: 10,
            token_points: 2,
            min_token_len: 3,
            score_scale: 10.0,
        }
    }
}

impl Thresholds {
    /// Defaults overridden by `QUIZ_KNOWLEDGE_TRUST`, `QUIZ_MIN_SIMILARITY`,
    /// `QUIZ_SEARCH_FLOOR`, `QUIZ_VERBATIM_POINTS`, `QUIZ_TOKEN_POINTS`,
    /// `QUIZ_MIN_TOKEN_LEN` and `QUIZ_SCORE_SCALE`.
    fn from_vars(get: &impl Fn(&str) -> Option<String>) -> Result<Self> {
        let d = Self::default();
        let thresholds = Self {
            knowledge_trust: parse_var(get, "QUIZ_KNOWLEDGE_TRUST", d.knowledge_trust)?,
            min_similarity: parse_var(get, "QUIZ_MIN_SIMILARITY", d.min_similarity)?,
            search_floor: parse_var(get, "QUIZ_SEARCH_FLOOR", d.search_floor)?,
            verbatim_points: parse_var(get, "QUIZ_VERBATIM_POINTS", d.verbatim_points)?,
            token_points: parse_var(get, "QUIZ_TOKEN_POINTS", d.token_points)?,
            min_token_len: parse_var(get, "QUIZ_MIN_TOKEN_LEN", d.min_token_len)?,
            score_scale: parse_var(get, "QUIZ_SCORE_SCALE", d.score_scale)?,
        };

        for (key, value) in [
            ("QUIZ_KNOWLEDGE_TRUST", thresholds.knowledge_trust),
            ("QUIZ_MIN_SIMILARITY", thresholds.min_similarity),
            ("QUIZ_SEARCH_FLOOR", thresholds.search_floor),
        ] {
            if !(0.0..=1.0).contains(&value) {
                bail!("{} must be within [0, 1], got {}", key, value);
            }
        }
        if thresholds.score_scale.is_nan() || thresholds.score_scale <= 0.0 {
            bail!("QUIZ_SCORE_SCALE must be positive, got {}", thresholds.score_scale);
        }
        Ok(thresholds)
    }
}

/// Everything the engine reads from the host environment.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub document: PathBuf,
    pub auto_act: bool,
    pub continuous: bool,
    pub confidence_threshold: f32,
    pub settle_delay: Duration,
    pub debounce: Duration,
    pub action_delay: Duration,
    pub lookup_timeout: Duration,
    pub request_interval: Duration,
    pub rules_path: Option<PathBuf>,
    pub log_level: Level,
    pub thresholds: Thresholds,
}

impl EngineConfig {
    /// Read `QUIZ_*` variables (after `.env` loading). The document path may
    /// also come from the first command-line argument.
    pub fn from_env() -> Result<Self> {
        let arg_document = std::env::args().nth(1);
        Self::from_vars(|key| match key {
            "QUIZ_DOCUMENT" => dotenv::var(key).ok().or_else(|| arg_document.clone()),
            _ => dotenv::var(key).ok(),
        })
    }

    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let document = get("QUIZ_DOCUMENT")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .context("QUIZ_DOCUMENT (or a document path argument) is required")?;

        let confidence_threshold: f32 = parse_var(&get, "QUIZ_CONFIDENCE_THRESHOLD", 0.3)?;
        if !(0.0..=1.0).contains(&confidence_threshold) {
            bail!(
                "QUIZ_CONFIDENCE_THRESHOLD must be within [0, 1], got {}",
                confidence_threshold
            );
        }

        let log_level = match get("QUIZ_LOG_LEVEL") {
            Some(raw) => Level::from_str(raw.trim())
                .map_err(|e| anyhow::anyhow!("invalid QUIZ_LOG_LEVEL '{}': {}", raw, e))?,
            None => Level::INFO,
        };

        Ok(Self {
            document,
            auto_act: parse_flag(&get, "QUIZ_AUTO_ACT", false)?,
            continuous: parse_flag(&get, "QUIZ_CONTINUOUS", true)?,
            confidence_threshold,
            settle_delay: Duration::from_millis(parse_var(&get, "QUIZ_SETTLE_DELAY_MS", 1500)?),
            debounce: Duration::from_millis(parse_var(&get, "QUIZ_DEBOUNCE_MS", 100)?),
            action_delay: Duration::from_millis(parse_var(&get, "QUIZ_ACTION_DELAY_MS", 500)?),
            lookup_timeout: Duration::from_secs(parse_var(&get, "QUIZ_LOOKUP_TIMEOUT_SECS", 5)?),
            request_interval: Duration::from_millis(parse_var(
                &get,
                "QUIZ_REQUEST_INTERVAL_MS",
                1000,
            )?),
            rules_path: get("QUIZ_RULES_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            log_level,
            thresholds: Thresholds::from_vars(&get)?,
        })
    }

    pub fn policy(&self) -> Policy {
        Policy {
            auto_act: self.auto_act,
            threshold: self.confidence_threshold,
        }
    }
}

fn parse_var<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("invalid {} '{}': {}", key, raw, e)),
        None => Ok(default),
    }
}

fn parse_flag(get: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> Result<bool> {
    let Some(raw) = get(key) else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("invalid {} '{}': expected true/false", key, other),
    }
}
