//! Error types for surface construction.
//!
//! Two of the variants are recoverable and meant to be shown to the user
//! (`NoData`, `InvalidInput`); the rest are propagated failures of the
//! collaborators around the core (provider, renderer, configuration).

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chain::OptionSide;

/// Convenience type alias for results in this crate.
pub type SurfaceResult<T> = std::result::Result<T, SurfaceError>;

/// Pipeline stage at which an observation set turned out empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataStage {
    /// Nothing came back from the provider for the requested side.
    Fetch,
    /// Observations existed but none survived the active filters.
    Filter,
    /// The set or grid handed to the emitter was empty.
    Emit,
}

impl fmt::Display for DataStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataStage::Fetch => write!(f, "fetch"),
            DataStage::Filter => write!(f, "filter"),
            DataStage::Emit => write!(f, "emit"),
        }
    }
}

/// Errors raised while building or emitting a volatility surface.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SurfaceError {
    /// The observation set is empty; nothing can be drawn.
    #[error("no data available for {ticker} {side} options (empty after {stage})")]
    NoData {
        ticker: String,
        side: OptionSide,
        stage: DataStage,
    },

    /// A user-facing parameter was rejected before any provider call.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// The data provider failed or returned malformed records.
    #[error("provider error: {message}")]
    Provider { message: String },

    /// The rendering sink failed to draw or write its output.
    #[error("render error: {message}")]
    Render { message: String },

    /// A configuration file could not be read or parsed.
    #[error("config error: {message}")]
    Config { message: String },
}

impl SurfaceError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: msg.into(),
        }
    }

    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider {
            message: msg.into(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// `true` for conditions the user can fix by changing the request.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SurfaceError::NoData { .. } | SurfaceError::InvalidInput { .. }
        )
    }

    /// `true` when the error signals an empty observation set.
    pub fn is_no_data(&self) -> bool {
        matches!(self, SurfaceError::NoData { .. })
    }
}
