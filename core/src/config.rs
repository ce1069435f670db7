use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Early-accept threshold for text matching.
pub const TEXT_EARLY_ACCEPT: f32 = 0.5;
/// Early-accept threshold for feature vectors, where a hit means "near duplicate".
pub const FEATURE_EARLY_ACCEPT: f32 = 0.98;

pub const DEFAULT_TOP_RATIO: f64 = 0.95;
pub const DEFAULT_BOTTOM_RATIO: f64 = 0.05;

/// How the lower stopword cutoff is derived from the frequency table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BottomCutoff {
    /// `floor(max_count * ratio)`
    RelativeToMax { ratio: f64 },
    /// `floor(min_count * factor)`
    RelativeToMin { factor: f64 },
}

impl Default for BottomCutoff {
    fn default() -> Self {
        BottomCutoff::RelativeToMax { ratio: DEFAULT_BOTTOM_RATIO }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StopwordConfig {
    /// Tokens counted more than `floor(max_count * top_ratio)` times are stopwords.
    pub top_ratio: f64,
    pub bottom: BottomCutoff,
}

impl Default for StopwordConfig {
    fn default() -> Self {
        Self { top_ratio: DEFAULT_TOP_RATIO, bottom: BottomCutoff::default() }
    }
}

impl StopwordConfig {
    pub fn validate(&self) -> Result<()> {
        check_ratio("stopwords.top_ratio", self.top_ratio)?;
        match self.bottom {
            BottomCutoff::RelativeToMax { ratio } => check_ratio("stopwords.bottom.ratio", ratio),
            BottomCutoff::RelativeToMin { factor } if factor.is_finite() && factor >= 0.0 => Ok(()),
            BottomCutoff::RelativeToMin { factor } => Err(Error::InvalidConfig(format!(
                "stopwords.bottom.factor must be a non-negative number, got {factor}"
            ))),
        }
    }
}

/// Settings of the text matching engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// A non-exhaustive best-result scan stops at the first entry scoring above this.
    pub early_accept: f32,
    pub stopwords: StopwordConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { early_accept: TEXT_EARLY_ACCEPT, stopwords: StopwordConfig::default() }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        check_ratio("early_accept", f64::from(self.early_accept))?;
        self.stopwords.validate()
    }

    /// Parses and validates a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig =
            serde_json::from_str(json).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureIndexConfig {
    pub early_accept: f32,
}

impl Default for FeatureIndexConfig {
    fn default() -> Self {
        Self { early_accept: FEATURE_EARLY_ACCEPT }
    }
}

impl FeatureIndexConfig {
    pub fn validate(&self) -> Result<()> {
        check_ratio("early_accept", f64::from(self.early_accept))
    }
}

fn check_ratio(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!("{name} must be within 0.0..=1.0, got {value}")))
    }
}
