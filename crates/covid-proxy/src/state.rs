use std::sync::Arc;

use crate::config::{Config, ConfigError};
use crate::provider::{covid193::Covid193Provider, StatsProvider};

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Where statistics come from.
    pub provider: Arc<dyn StatsProvider>,
}

impl AppState {
    /// State backed by the covid-193 API described in `config`.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let provider = Covid193Provider::new(config)?;
        Ok(Self {
            provider: Arc::new(provider),
        })
    }
}
