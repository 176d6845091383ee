//! Error taxonomy.
//!
//! Only [`ConfigurationError`] at startup is allowed to stop the engine. Every
//! other variant is recovered locally by the caller and surfaced through the
//! alert ledger.

use std::fmt;

// ---------------------------------------------------------------------------
// ProviderError
// ---------------------------------------------------------------------------

/// Account sampling failure. The tick is skipped; state is not touched.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Network or transport failure.
    Transport(String),
    /// The provider did not answer within the configured timeout.
    Timeout { after_ms: u64 },
    /// A response payload could not be decoded.
    Decode(String),
    /// The provider has been closed or is otherwise not serving.
    Unavailable(String),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Transport(msg) => write!(f, "transport error: {msg}"),
            ProviderError::Timeout { after_ms } => {
                write!(f, "provider timed out after {after_ms}ms")
            }
            ProviderError::Decode(msg) => write!(f, "decode error: {msg}"),
            ProviderError::Unavailable(msg) => write!(f, "provider unavailable: {msg}"),
        }
    }
}

impl std::error::Error for ProviderError {}

// ---------------------------------------------------------------------------
// ComputationError
// ---------------------------------------------------------------------------

/// NaN / overflow / bad input inside drawdown or recovery math.
///
/// The staged update that produced it is discarded in full.
#[derive(Debug, Clone, PartialEq)]
pub enum ComputationError {
    /// A balance sample below zero.
    NegativeBalance { balance_micros: i64 },
    /// An intermediate value came out NaN or infinite.
    NonFinite { stage: &'static str, value: f64 },
    /// Integer arithmetic overflowed.
    Overflow { stage: &'static str },
}

impl fmt::Display for ComputationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComputationError::NegativeBalance { balance_micros } => {
                write!(f, "negative balance sample: {balance_micros} micros")
            }
            ComputationError::NonFinite { stage, value } => {
                write!(f, "non-finite value at {stage}: {value}")
            }
            ComputationError::Overflow { stage } => write!(f, "arithmetic overflow at {stage}"),
        }
    }
}

impl std::error::Error for ComputationError {}

/// Reject NaN / infinity for a named computation stage.
pub fn ensure_finite(stage: &'static str, value: f64) -> Result<f64, ComputationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ComputationError::NonFinite { stage, value })
    }
}

// ---------------------------------------------------------------------------
// ConfigurationError
// ---------------------------------------------------------------------------

/// Invalid configuration. Fatal at startup.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    /// `critical < emergency < recovery` does not hold.
    ThresholdOrdering {
        critical: f64,
        emergency: f64,
        recovery: f64,
    },
    /// A numeric field lies outside its permitted range.
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    /// Any other invalid value.
    Invalid { field: &'static str, reason: String },
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationError::ThresholdOrdering {
                critical,
                emergency,
                recovery,
            } => write!(
                f,
                "CONFIG_THRESHOLD_ORDERING: require critical < emergency < recovery \
                 (got {critical} / {emergency} / {recovery})"
            ),
            ConfigurationError::OutOfRange {
                field,
                value,
                min,
                max,
            } => write!(
                f,
                "CONFIG_OUT_OF_RANGE: {field}={value} not in [{min}, {max}]"
            ),
            ConfigurationError::Invalid { field, reason } => {
                write!(f, "CONFIG_INVALID: {field}: {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigurationError {}

// ---------------------------------------------------------------------------
// ExternalActionError
// ---------------------------------------------------------------------------

/// A collaborator refused or failed a requested risk action.
#[derive(Debug, Clone, PartialEq)]
pub enum ExternalActionError {
    Rejected { action: &'static str, reason: String },
    Timeout { action: &'static str, after_ms: u64 },
}

impl fmt::Display for ExternalActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExternalActionError::Rejected { action, reason } => {
                write!(f, "{action} rejected: {reason}")
            }
            ExternalActionError::Timeout { action, after_ms } => {
                write!(f, "{action} timed out after {after_ms}ms")
            }
        }
    }
}

impl std::error::Error for ExternalActionError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_finite_passes_finite_and_rejects_nan() {
        assert_eq!(ensure_finite("x", 0.5), Ok(0.5));
        assert!(matches!(
            ensure_finite("boost", f64::NAN),
            Err(ComputationError::NonFinite { stage: "boost", .. })
        ));
        assert!(ensure_finite("boost", f64::INFINITY).is_err());
    }

    #[test]
    fn threshold_ordering_display_is_greppable() {
        let e = ConfigurationError::ThresholdOrdering {
            critical: 0.05,
            emergency: 0.04,
            recovery: 0.07,
        };
        assert!(e.to_string().starts_with("CONFIG_THRESHOLD_ORDERING"));
    }

    #[test]
    fn provider_error_display_timeout() {
        let e = ProviderError::Timeout { after_ms: 3000 };
        assert_eq!(e.to_string(), "provider timed out after 3000ms");
    }
}
