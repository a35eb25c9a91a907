// Threshold policy - where the removal threshold comes from.
//
// The orchestrator asks for the threshold on every evaluation, so any of
// these may change between calls. Bad values are rejected when a policy is
// built or reconfigured; `current_threshold` itself never fails.

use super::moderation_error::ModerationError;
use super::moderation_models::{from_cents, to_cents, MAX_THRESHOLD_CENTS};
use bigdecimal::BigDecimal;
use std::str::FromStr;
use std::sync::{PoisonError, RwLock};

/// Environment variable the default policy reads.
pub const THRESHOLD_ENV_VAR: &str = "MODERATION_REMOVAL_THRESHOLD";

/// Threshold used when nothing is configured (5.0).
pub const DEFAULT_THRESHOLD_CENTS: i64 = 500;

pub fn default_threshold() -> BigDecimal {
    from_cents(DEFAULT_THRESHOLD_CENTS)
}

/// Source of the removal threshold.
pub trait ThresholdPolicy: Send + Sync {
    fn current_threshold(&self) -> BigDecimal;
}

/// Validate a threshold: positive, two decimal places at most, at most 9999.99.
///
/// The returned value is rescaled to two places.
pub fn validate_threshold(value: &BigDecimal) -> Result<BigDecimal, ModerationError> {
    let cents = to_cents(value).ok_or_else(|| {
        ModerationError::ConfigError(format!(
            "removal threshold {} must have at most two decimal places",
            value
        ))
    })?;

    if cents <= 0 {
        return Err(ModerationError::ConfigError(format!(
            "removal threshold must be positive, got {}",
            value
        )));
    }
    if cents > MAX_THRESHOLD_CENTS {
        return Err(ModerationError::ConfigError(format!(
            "removal threshold {} exceeds the maximum of {}",
            value,
            from_cents(MAX_THRESHOLD_CENTS)
        )));
    }

    Ok(from_cents(cents))
}

/// Parse and validate a threshold from its textual form.
pub fn parse_threshold(raw: &str) -> Result<BigDecimal, ModerationError> {
    let value = BigDecimal::from_str(raw.trim()).map_err(|e| {
        ModerationError::ConfigError(format!("invalid removal threshold '{}': {}", raw, e))
    })?;
    validate_threshold(&value)
}

/// A threshold that never changes.
#[derive(Debug, Clone)]
pub struct FixedThreshold(BigDecimal);

impl FixedThreshold {
    pub fn new(value: BigDecimal) -> Result<Self, ModerationError> {
        Ok(Self(validate_threshold(&value)?))
    }
}

impl Default for FixedThreshold {
    fn default() -> Self {
        Self(default_threshold())
    }
}

impl ThresholdPolicy for FixedThreshold {
    fn current_threshold(&self) -> BigDecimal {
        self.0.clone()
    }
}

/// A threshold that can be swapped at runtime from inside the process.
#[derive(Debug)]
pub struct SharedThreshold {
    value: RwLock<BigDecimal>,
}

impl SharedThreshold {
    pub fn new(value: BigDecimal) -> Result<Self, ModerationError> {
        Ok(Self {
            value: RwLock::new(validate_threshold(&value)?),
        })
    }

    /// Replace the threshold. Later evaluations see the new value.
    pub fn set(&self, value: BigDecimal) -> Result<(), ModerationError> {
        let value = validate_threshold(&value)?;
        tracing::info!(threshold = %value, "Removal threshold reconfigured");
        *self.value.write().unwrap_or_else(PoisonError::into_inner) = value;
        Ok(())
    }
}

impl ThresholdPolicy for SharedThreshold {
    fn current_threshold(&self) -> BigDecimal {
        self.value
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Reads the threshold from an environment variable on every call.
///
/// An unset variable means the default. A value that stops parsing after
/// start-up is ignored in favour of the last good one.
#[derive(Debug)]
pub struct EnvThreshold {
    var: String,
    last_good: RwLock<BigDecimal>,
}

impl EnvThreshold {
    /// Build the policy, failing fast if the variable is set but invalid.
    pub fn from_env(var: impl Into<String>) -> Result<Self, ModerationError> {
        let var = var.into();
        let initial = match std::env::var(&var) {
            Ok(raw) => parse_threshold(&raw)?,
            Err(_) => default_threshold(),
        };
        tracing::debug!(var = %var, threshold = %initial, "Loaded removal threshold");

        Ok(Self {
            var,
            last_good: RwLock::new(initial),
        })
    }
}

impl ThresholdPolicy for EnvThreshold {
    fn current_threshold(&self) -> BigDecimal {
        let fresh = match std::env::var(&self.var) {
            Ok(raw) => match parse_threshold(&raw) {
                Ok(value) => value,
                Err(e) => {
                    tracing::warn!(var = %self.var, "Ignoring reconfigured threshold: {}", e);
                    return self
                        .last_good
                        .read()
                        .unwrap_or_else(PoisonError::into_inner)
                        .clone();
                }
            },
            Err(_) => default_threshold(),
        };

        *self.last_good.write().unwrap_or_else(PoisonError::into_inner) = fresh.clone();
        fresh
    }
}
