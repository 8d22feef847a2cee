// Global configuration for the geometry kernel
use crate::error::{GeometryError, Result};
use once_cell::sync::Lazy;
use std::sync::Mutex;

/// Distance below which a point is treated as lying on a surface
pub const FP_COINCIDENT: f64 = 1e-12;
/// Relative precision used when comparing boundary distances
pub const FP_PRECISION: f64 = 1e-14;
/// Boltzmann constant in eV/K
pub const K_BOLTZMANN: f64 = 8.617333262e-5;

pub static CONFIG: Lazy<Mutex<Config>> = Lazy::new(|| Mutex::new(Config::new()));

/// Global configuration container for cell bookkeeping.
///
/// New cells pick up `default_temperature` when they are built. When
/// `temperature_bounds` is set (typically the range covered by the loaded
/// nuclear data), temperature writes outside the bounds widened by
/// `temperature_tolerance` are rejected.
///
/// A single global instance is exposed via the `CONFIG` static; use
/// [`Config::global`] to obtain a guard.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Temperature in K assigned to cells that have not been given one
    pub default_temperature: f64,
    /// Optional (min, max) temperature range in K
    pub temperature_bounds: Option<(f64, f64)>,
    /// Tolerance in K applied on both sides of `temperature_bounds`
    pub temperature_tolerance: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Config {
            default_temperature: 293.6,
            temperature_bounds: None,
            temperature_tolerance: 10.0,
        }
    }

    /// Restrict accepted temperatures to `[min, max]` (plus tolerance)
    pub fn set_temperature_bounds(&mut self, min: f64, max: f64) -> Result<()> {
        if !(min <= max) {
            return Err(GeometryError::InvalidArgument(format!(
                "temperature bounds must satisfy min <= max, got ({}, {})",
                min, max
            )));
        }
        self.temperature_bounds = Some((min, max));
        Ok(())
    }

    /// Check a temperature against the configured bounds
    pub fn check_temperature(&self, temperature: f64) -> Result<()> {
        if !temperature.is_finite() || temperature < 0.0 {
            return Err(GeometryError::InvalidArgument(format!(
                "temperature must be a non-negative number, got {}",
                temperature
            )));
        }
        if let Some((min, max)) = self.temperature_bounds {
            if temperature < min - self.temperature_tolerance {
                return Err(GeometryError::InvalidArgument(format!(
                    "temperature {} K is below the minimum available temperature {} K",
                    temperature, min
                )));
            }
            if temperature > max + self.temperature_tolerance {
                return Err(GeometryError::InvalidArgument(format!(
                    "temperature {} K is above the maximum available temperature {} K",
                    temperature, max
                )));
            }
        }
        Ok(())
    }

    /// Reset every setting to its default
    pub fn clear(&mut self) {
        *self = Config::new();
    }

    /// Get the global configuration instance
    pub fn global() -> std::sync::MutexGuard<'static, Self> {
        CONFIG
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
