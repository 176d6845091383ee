use serde::{Deserialize, Serialize};

use crate::ConfigurationError;

/// Drawdown thresholds separating the escalation tiers.
///
/// Must satisfy `0 < critical < emergency < recovery <= 1`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub critical: f64,
    pub emergency: f64,
    pub recovery: f64,
}

impl Thresholds {
    pub fn new(critical: f64, emergency: f64, recovery: f64) -> Self {
        Self {
            critical,
            emergency,
            recovery,
        }
    }

    /// Strict tier ordering (also rejects NaN, since every comparison fails).
    pub fn is_ordered(&self) -> bool {
        0.0 < self.critical
            && self.critical < self.emergency
            && self.emergency < self.recovery
            && self.recovery <= 1.0
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.is_ordered() {
            Ok(())
        } else {
            Err(ConfigurationError::ThresholdOrdering {
                critical: self.critical,
                emergency: self.emergency,
                recovery: self.recovery,
            })
        }
    }
}

/// Recovery protocol constants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecoveryConfig {
    /// Converts drawdown into stress energy.
    pub regeneration_factor: f64,
    /// Converts stress energy into a resilience boost.
    pub stress_amplifier: f64,
    /// A boost at or above this value also bumps the evolution level.
    pub evolution_boost_threshold: f64,
}

/// Resilience tracker constants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResilienceConfig {
    /// Resilience score at session start; decay pulls back toward it.
    pub baseline: f64,
    /// Anti-fragility index at session start.
    pub anti_fragility_baseline: f64,
    /// Fraction of the gap to `baseline` closed on every evolution tick.
    pub decay_rate: f64,
    /// Time after which the time factor of momentum saturates at 1.
    pub evolution_window_ms: u64,
    /// Momentum strictly above this triggers an evolve step.
    pub momentum_trigger: f64,
    /// Max relative drift of critical/emergency thresholds from their loaded values.
    pub max_threshold_drift: f64,
}

/// Leverage limits requested from the external leverage controller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeverageConfig {
    pub max_leverage: u32,
    /// EMERGENCY never requests less than this (unless `max_leverage` itself is lower).
    pub emergency_floor: u32,
    /// EMERGENCY requests `max_leverage * emergency_scale`.
    pub emergency_scale: f64,
}

impl LeverageConfig {
    /// Leverage requested on EMERGENCY entry:
    /// `min(max, max(floor, floor(max * scale)))`.
    pub fn emergency_target(&self) -> u32 {
        let scaled = (self.max_leverage as f64 * self.emergency_scale).floor();
        let scaled = if scaled.is_finite() && scaled > 0.0 {
            scaled as u32
        } else {
            0
        };
        scaled.max(self.emergency_floor).min(self.max_leverage)
    }
}

/// Scheduling cadence for the three periodic tasks plus the provider timeout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingConfig {
    pub monitoring_interval_ms: u64,
    pub evolution_interval_ms: u64,
    pub metrics_interval_ms: u64,
    pub provider_timeout_ms: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureFlags {
    pub adaptive_leverage: bool,
    pub evolution: bool,
}

/// Full engine configuration (immutable per session, except the bounded
/// threshold self-adjustment applied by the resilience tracker).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub thresholds: Thresholds,
    pub recovery: RecoveryConfig,
    pub resilience: ResilienceConfig,
    pub leverage: LeverageConfig,
    pub timing: TimingConfig,
    /// Per-category alert ledger capacity.
    pub alert_capacity: usize,
    pub features: FeatureFlags,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::sane_defaults()
    }
}

impl EngineConfig {
    pub fn sane_defaults() -> Self {
        Self {
            thresholds: Thresholds::new(0.03, 0.045, 0.07),
            recovery: RecoveryConfig {
                regeneration_factor: 2.718,
                stress_amplifier: 1.618,
                evolution_boost_threshold: 0.10,
            },
            resilience: ResilienceConfig {
                baseline: 0.85,
                anti_fragility_baseline: 0.5,
                decay_rate: 0.05,
                evolution_window_ms: 300_000,
                momentum_trigger: 0.7,
                max_threshold_drift: 0.10,
            },
            leverage: LeverageConfig {
                max_leverage: 20,
                emergency_floor: 10,
                emergency_scale: 0.5,
            },
            timing: TimingConfig {
                monitoring_interval_ms: 1_000,
                evolution_interval_ms: 30_000,
                metrics_interval_ms: 10_000,
                provider_timeout_ms: 3_000,
            },
            alert_capacity: 50,
            features: FeatureFlags {
                adaptive_leverage: true,
                evolution: true,
            },
        }
    }

    /// Fail-fast validation, run once before the engine starts.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.thresholds.validate()?;

        unit_range("resilience.baseline", self.resilience.baseline)?;
        unit_range(
            "resilience.anti_fragility_baseline",
            self.resilience.anti_fragility_baseline,
        )?;
        unit_range("resilience.decay_rate", self.resilience.decay_rate)?;
        unit_range("resilience.momentum_trigger", self.resilience.momentum_trigger)?;
        in_range(
            "resilience.max_threshold_drift",
            self.resilience.max_threshold_drift,
            0.0,
            0.5,
        )?;
        positive("recovery.regeneration_factor", self.recovery.regeneration_factor)?;
        positive("recovery.stress_amplifier", self.recovery.stress_amplifier)?;
        in_range(
            "recovery.evolution_boost_threshold",
            self.recovery.evolution_boost_threshold,
            0.0,
            f64::MAX,
        )?;
        unit_range("leverage.emergency_scale", self.leverage.emergency_scale)?;

        if self.leverage.max_leverage == 0 {
            return Err(ConfigurationError::Invalid {
                field: "leverage.max",
                reason: "must be >= 1".to_string(),
            });
        }
        if self.resilience.evolution_window_ms == 0 {
            return Err(ConfigurationError::Invalid {
                field: "resilience.evolution_window_ms",
                reason: "must be > 0".to_string(),
            });
        }
        for (field, v) in [
            ("timing.monitoring_interval_ms", self.timing.monitoring_interval_ms),
            ("timing.evolution_interval_ms", self.timing.evolution_interval_ms),
            ("timing.metrics_interval_ms", self.timing.metrics_interval_ms),
            ("timing.provider_timeout_ms", self.timing.provider_timeout_ms),
        ] {
            if v == 0 {
                return Err(ConfigurationError::Invalid {
                    field,
                    reason: "must be > 0".to_string(),
                });
            }
        }
        if self.alert_capacity == 0 {
            return Err(ConfigurationError::Invalid {
                field: "alerts.capacity",
                reason: "must be >= 1".to_string(),
            });
        }
        Ok(())
    }
}

fn in_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigurationError> {
    // NaN fails both comparisons and lands here too.
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigurationError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

fn unit_range(field: &'static str, value: f64) -> Result<(), ConfigurationError> {
    in_range(field, value, 0.0, 1.0)
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigurationError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigurationError::OutOfRange {
            field,
            value,
            min: f64::MIN_POSITIVE,
            max: f64::MAX,
        })
    }
}
