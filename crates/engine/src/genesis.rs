//! Genesis configuration for the auction engine.

use serde::{Deserialize, Serialize};

use empa_types::BPS_DENOMINATOR;

/// Engine-wide configuration applied to every lot.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Minimum duration from start to conclusion (seconds)
    pub min_lot_duration: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_lot_duration: 3600, // 1 hour
        }
    }
}

/// Genesis configuration for the auction engine.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineGenesisConfig {
    /// Engine-wide limits
    pub engine: EngineConfig,

    /// Defaults suggested to lot creators
    pub default_params: DefaultLotParams,
}

/// Default parameters for new lots.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DefaultLotParams {
    /// Default minimum bid size (quote tokens)
    pub min_bid_size: u64,
    /// Default minimum fill fraction, basis points
    pub min_fill_bps: u16,
}

impl Default for DefaultLotParams {
    fn default() -> Self {
        Self {
            min_bid_size: 1,
            min_fill_bps: 5_000, // half the capacity
        }
    }
}

impl Default for EngineGenesisConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            default_params: DefaultLotParams::default(),
        }
    }
}

impl EngineGenesisConfig {
    /// Validate the genesis configuration.
    pub fn validate(&self) -> Result<(), GenesisValidationError> {
        if self.engine.min_lot_duration == 0 {
            return Err(GenesisValidationError::InvalidEngineConfig(
                "Minimum lot duration cannot be zero".into(),
            ));
        }

        if self.default_params.min_fill_bps > BPS_DENOMINATOR {
            return Err(GenesisValidationError::InvalidDefaultParams(
                "Minimum fill fraction exceeds 100%".into(),
            ));
        }

        Ok(())
    }
}

/// Errors that can occur during genesis validation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GenesisValidationError {
    #[error("Invalid engine configuration: {0}")]
    InvalidEngineConfig(String),

    #[error("Invalid default parameters: {0}")]
    InvalidDefaultParams(String),
}
