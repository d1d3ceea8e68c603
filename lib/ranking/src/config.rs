use crate::encoder::SlotLayout;
use crate::query::DEFAULT_LIMIT;
use carematch_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Ranking engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub default_limit: usize,
    /// Upper bound on one call to the embedding generator.
    pub embed_timeout_ms: u64,
    pub max_highlights: usize,
    /// Query terms shorter than this are not used for highlights.
    pub min_term_len: usize,
    pub layout: SlotLayout,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            embed_timeout_ms: 2000,
            max_highlights: 5,
            min_term_len: 3,
            layout: SlotLayout::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn embed_timeout(&self) -> Duration {
        Duration::from_millis(self.embed_timeout_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_limit == 0 {
            return Err(Error::InvalidConfig("default_limit must be at least 1".to_string()));
        }
        if self.layout.dim == 0 || self.layout.required_dim() > self.layout.dim {
            return Err(Error::InvalidConfig(format!(
                "slot layout needs {} dimensions, layout dim is {}",
                self.layout.required_dim(),
                self.layout.dim
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.embed_timeout(), Duration::from_secs(2));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"embed_timeout_ms": 250, "layout": {{"urgency_slot": 64}}}}"#).unwrap();
        let config = EngineConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.embed_timeout_ms, 250);
        assert_eq!(config.layout.urgency_slot, 64);
        assert_eq!(config.layout.dim, 128);
        assert_eq!(config.default_limit, 10);
    }

    #[test]
    fn test_layout_larger_than_dim_rejected() {
        let mut config = EngineConfig::default();
        config.layout.dim = 40;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }
}
