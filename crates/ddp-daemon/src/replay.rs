//! CSV balance replay for the daemon binary.
//!
//! ## CSV column contract
//!
//! | Column      | Example    | Notes                                  |
//! |-------------|------------|----------------------------------------|
//! | `balance`   | `10000.00` | Decimal string, at most 6 decimals     |
//! | `positions` | `3`        | Optional open-position count           |
//!
//! One row is served per monitoring tick. Once the series is exhausted the
//! provider reports `Unavailable` and fires [`CsvReplayProvider::exhausted`].

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use ddp_risk::{ExternalActionError, ProviderError, MICROS_SCALE};
use serde::Deserialize;
use tokio::sync::Notify;
use tracing::info;

use crate::{AccountProvider, AccountSnapshot, LeverageController, Position};

#[derive(Debug, Deserialize)]
struct ReplayRow {
    balance: String,
    #[serde(default)]
    positions: Option<usize>,
}

/// One replayed observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySample {
    pub balance_micros: i64,
    pub positions: usize,
}

/// Serves a pre-loaded balance series, one sample per call.
pub struct CsvReplayProvider {
    samples: Mutex<VecDeque<ReplaySample>>,
    initial_balance_micros: i64,
    exhausted: Arc<Notify>,
}

impl CsvReplayProvider {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let rdr = csv::Reader::from_path(path)
            .with_context(|| format!("open replay csv: {}", path.display()))?;
        Self::from_reader(rdr)
    }

    pub fn from_csv_str(csv_text: &str) -> Result<Self> {
        Self::from_reader(csv::Reader::from_reader(csv_text.as_bytes()))
    }

    fn from_reader<R: std::io::Read>(mut rdr: csv::Reader<R>) -> Result<Self> {
        let mut samples = VecDeque::new();
        for (i, row) in rdr.deserialize::<ReplayRow>().enumerate() {
            // Header is line 1.
            let line = i + 2;
            let row = row.with_context(|| format!("replay csv line {line}"))?;
            let balance_micros = decimal_to_micros(&row.balance)
                .with_context(|| format!("replay csv line {line}: balance"))?;
            samples.push_back(ReplaySample {
                balance_micros,
                positions: row.positions.unwrap_or(0),
            });
        }

        let Some(first) = samples.front() else {
            bail!("replay csv has no rows");
        };
        let initial_balance_micros = first.balance_micros;

        Ok(Self {
            samples: Mutex::new(samples),
            initial_balance_micros,
            exhausted: Arc::new(Notify::new()),
        })
    }

    /// Balance of the first row; used as the session's initial balance.
    pub fn initial_balance_micros(&self) -> i64 {
        self.initial_balance_micros
    }

    pub fn remaining(&self) -> usize {
        self.samples.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    /// Notified once when the last sample has been served.
    pub fn exhausted(&self) -> Arc<Notify> {
        Arc::clone(&self.exhausted)
    }
}

#[async_trait]
impl AccountProvider for CsvReplayProvider {
    fn name(&self) -> &'static str {
        "csv-replay"
    }

    async fn get_account_snapshot(&self) -> Result<AccountSnapshot, ProviderError> {
        let (next, now_empty) = {
            let mut q = self.samples.lock().unwrap_or_else(|p| p.into_inner());
            let next = q.pop_front();
            (next, q.is_empty())
        };
        let Some(sample) = next else {
            return Err(ProviderError::Unavailable("replay series exhausted".to_string()));
        };
        if now_empty {
            // Permit is stored if nobody is waiting yet.
            self.exhausted.notify_one();
        }

        let positions = (0..sample.positions)
            .map(|i| Position {
                symbol: format!("REPLAY{i}"),
                qty: 0,
                avg_price_micros: 0,
            })
            .collect();
        Ok(AccountSnapshot {
            captured_at_utc: Utc::now(),
            total_balance_micros: sample.balance_micros,
            positions,
        })
    }
}

/// Accepts every request and logs it.
#[derive(Debug, Default)]
pub struct LoggingLeverageController {
    last: AtomicU32,
}

impl LoggingLeverageController {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LeverageController for LoggingLeverageController {
    async fn set_max_leverage(&self, value: u32) -> Result<(), ExternalActionError> {
        let previous = self.last.swap(value, Ordering::Relaxed);
        info!(leverage = value, previous, "max leverage set");
        Ok(())
    }
}

/// Decimal string to micros without going through floats.
///
/// Accepts an optional sign and at most 6 fractional digits.
pub fn decimal_to_micros(raw: &str) -> Result<i64> {
    let s = raw.trim();
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };

    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));
    let all_digits = |p: &str| p.chars().all(|c| c.is_ascii_digit());
    if (int_part.is_empty() && frac_part.is_empty()) || !all_digits(int_part) || !all_digits(frac_part)
    {
        bail!("invalid decimal '{raw}'");
    }
    if frac_part.len() > 6 {
        bail!("more than 6 decimal places in '{raw}'");
    }

    let int_val: i64 = if int_part.is_empty() {
        0
    } else {
        int_part
            .parse()
            .with_context(|| format!("integer part out of range in '{raw}'"))?
    };
    let frac_val: i64 = format!("{frac_part:0<6}")
        .parse()
        .with_context(|| format!("invalid fraction in '{raw}'"))?;

    let micros = int_val
        .checked_mul(MICROS_SCALE)
        .and_then(|v| v.checked_add(frac_val))
        .with_context(|| format!("'{raw}' overflows i64 micros"))?;
    Ok(if negative { -micros } else { micros })
}
