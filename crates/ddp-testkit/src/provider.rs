use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use ddp_daemon::{AccountProvider, AccountSnapshot, Position};
use ddp_risk::ProviderError;

/// Account provider fed from a script.
///
/// Each call pops one step: a balance or an error. With the script empty the
/// last served balance is repeated. An optional delay is applied before the
/// step is popped, so a slow call can be overlapped deterministically.
pub struct ScriptedAccountProvider {
    script: Mutex<VecDeque<Result<i64, ProviderError>>>,
    last_balance: Mutex<i64>,
    positions: AtomicUsize,
    delay_ms: AtomicU64,
    calls: AtomicUsize,
    closed: AtomicBool,
}

impl ScriptedAccountProvider {
    pub fn new(initial_balance_micros: i64) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            last_balance: Mutex::new(initial_balance_micros),
            positions: AtomicUsize::new(0),
            delay_ms: AtomicU64::new(0),
            calls: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
        }
    }

    pub fn push_balance(&self, balance_micros: i64) {
        self.script_mut().push_back(Ok(balance_micros));
    }

    pub fn push_balances(&self, balances: &[i64]) {
        let mut q = self.script_mut();
        q.extend(balances.iter().copied().map(Ok));
    }

    pub fn push_error(&self, err: ProviderError) {
        self.script_mut().push_back(Err(err));
    }

    /// Open positions reported with every snapshot.
    pub fn set_positions(&self, n: usize) {
        self.positions.store(n, Ordering::Relaxed);
    }

    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms
            .store(delay.as_millis() as u64, Ordering::Relaxed);
    }

    /// Calls started, including ones that timed out or failed.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn script_mut(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<i64, ProviderError>>> {
        self.script.lock().unwrap_or_else(|p| p.into_inner())
    }
}

#[async_trait]
impl AccountProvider for ScriptedAccountProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn get_account_snapshot(&self) -> Result<AccountSnapshot, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let delay_ms = self.delay_ms.load(Ordering::Relaxed);
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }
        if self.is_closed() {
            return Err(ProviderError::Unavailable("provider closed".to_string()));
        }

        let step = self.script_mut().pop_front();
        let balance = {
            let mut last = self.last_balance.lock().unwrap_or_else(|p| p.into_inner());
            match step {
                Some(Ok(b)) => {
                    *last = b;
                    b
                }
                Some(Err(e)) => return Err(e),
                None => *last,
            }
        };

        let positions = (0..self.positions.load(Ordering::Relaxed))
            .map(|i| Position {
                symbol: format!("SYM{i}"),
                qty: 1,
                avg_price_micros: 1_000_000,
            })
            .collect();
        Ok(AccountSnapshot {
            captured_at_utc: Utc::now(),
            total_balance_micros: balance,
            positions,
        })
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
