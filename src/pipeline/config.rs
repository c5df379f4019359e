use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SurfaceError, SurfaceResult};
use crate::render::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::surface::{
    EmitMode, MoneynessBounds, DEFAULT_LOWER_PCT, DEFAULT_MIN_DAYS, DEFAULT_UPPER_PCT,
};

/// Which filters run and with what bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Drop strikes outside `[spot * lower_pct, spot * upper_pct]`
    #[serde(default = "default_enabled")]
    pub moneyness_enabled: bool,

    #[serde(default = "default_lower_pct")]
    pub lower_pct: f64,

    #[serde(default = "default_upper_pct")]
    pub upper_pct: f64,

    /// Drop contracts with fewer than `min_days` days to expiry
    #[serde(default = "default_enabled")]
    pub maturity_enabled: bool,

    #[serde(default = "default_min_days")]
    pub min_days: u32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            moneyness_enabled: default_enabled(),
            lower_pct: default_lower_pct(),
            upper_pct: default_upper_pct(),
            maturity_enabled: default_enabled(),
            min_days: default_min_days(),
        }
    }
}

/// How the surface is emitted and drawn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub mode: EmitMode,

    #[serde(default = "default_width")]
    pub width: u32,

    #[serde(default = "default_height")]
    pub height: u32,

    /// Camera yaw in radians
    #[serde(default = "default_yaw")]
    pub yaw: f64,

    /// Camera pitch in radians
    #[serde(default = "default_pitch")]
    pub pitch: f64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            mode: EmitMode::default(),
            width: default_width(),
            height: default_height(),
            yaw: default_yaw(),
            pitch: default_pitch(),
        }
    }
}

/// Main configuration struct for surface builds
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SurfaceConfig {
    #[serde(default)]
    pub filters: FilterConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

impl SurfaceConfig {
    /// Both filters on with the bounds of the interactive app (50%-150% of
    /// spot, at least one day to expiry)
    pub fn standard() -> Self {
        Self::default()
    }

    /// Tight band around spot, skipping the first week of expiries
    pub fn near_the_money() -> Self {
        Self {
            filters: FilterConfig {
                lower_pct: 0.9,
                upper_pct: 1.1,
                min_days: 7,
                ..FilterConfig::default()
            },
            output: OutputConfig::default(),
        }
    }

    /// Every contract the provider returns, including expired ones
    pub fn unfiltered() -> Self {
        Self {
            filters: FilterConfig {
                moneyness_enabled: false,
                maturity_enabled: false,
                ..FilterConfig::default()
            },
            output: OutputConfig::default(),
        }
    }

    /// Quarterly and longer expiries, drawn as raw points
    pub fn long_dated() -> Self {
        Self {
            filters: FilterConfig {
                lower_pct: 0.7,
                upper_pct: 1.3,
                min_days: 90,
                ..FilterConfig::default()
            },
            output: OutputConfig {
                mode: EmitMode::Scatter,
                ..OutputConfig::default()
            },
        }
    }

    pub fn from_toml_str(text: &str) -> SurfaceResult<Self> {
        let config: SurfaceConfig =
            toml::from_str(text).map_err(|e| SurfaceError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> SurfaceResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| SurfaceError::config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> SurfaceResult<String> {
        toml::to_string_pretty(self).map_err(|e| SurfaceError::config(e.to_string()))
    }

    pub fn validate(&self) -> SurfaceResult<()> {
        if self.filters.moneyness_enabled {
            MoneynessBounds::new(self.filters.lower_pct, self.filters.upper_pct)?;
        }
        if self.output.width == 0 || self.output.height == 0 {
            return Err(SurfaceError::invalid_input(format!(
                "output size must be non-zero, got {}x{}",
                self.output.width, self.output.height
            )));
        }
        Ok(())
    }

    /// Active moneyness bounds, if that filter is enabled.
    pub fn moneyness(&self) -> Option<MoneynessBounds> {
        self.filters.moneyness_enabled.then(|| MoneynessBounds {
            lower_pct: self.filters.lower_pct,
            upper_pct: self.filters.upper_pct,
        })
    }

    /// Active minimum days to expiry, if that filter is enabled.
    pub fn min_days(&self) -> Option<u32> {
        self.filters
            .maturity_enabled
            .then_some(self.filters.min_days)
    }
}

/// Annotated TOML template with the standard settings.
pub fn default_config_template() -> &'static str {
    r#"# iv-surface configuration

[filters]
# Keep strikes within [spot * lower_pct, spot * upper_pct].
# Skipped when the data source has no spot price.
moneyness_enabled = true
lower_pct = 0.5          # 0.0 ..= 1.0
upper_pct = 1.5          # >= 1.0

# Keep contracts with at least min_days to expiry (1 drops same-day/expired).
maturity_enabled = true
min_days = 1

[output]
mode = "surface"         # "surface" (strike x maturity grid) or "scatter" (raw points)
width = 1200
height = 800
yaw = 0.6
pitch = 0.35
"#
}

fn default_enabled() -> bool {
    true
}

fn default_lower_pct() -> f64 {
    DEFAULT_LOWER_PCT
}

fn default_upper_pct() -> f64 {
    DEFAULT_UPPER_PCT
}

fn default_min_days() -> u32 {
    DEFAULT_MIN_DAYS
}

fn default_width() -> u32 {
    DEFAULT_WIDTH
}

fn default_height() -> u32 {
    DEFAULT_HEIGHT
}

fn default_yaw() -> f64 {
    0.6
}

fn default_pitch() -> f64 {
    0.35
}
