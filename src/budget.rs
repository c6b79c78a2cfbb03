//! Client-side admission control.
//!
//! Every [`Client`](crate::Client) holds two independent token buckets, one
//! per operation class the remote service limits.
//!
//! Buckets are evaluated lazily: tokens are recomputed from the elapsed time on
//! each acquisition attempt. No background timer runs.

use crate::error::{Error, Result};
use log::trace;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Capacity and window of a [`RateBudget`]: at most `capacity` operations per
/// `window`, all of which may be spent in one burst after an idle period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetConfig {
    pub capacity: u32,
    pub window: Duration,
}

impl BudgetConfig {
    /// Lookups and searches: 10 requests per 5 seconds.
    pub const QUERY: Self = Self::new(10, Duration::from_secs(5));
    /// Stats updates: 20 requests per second.
    pub const UPDATE: Self = Self::new(20, Duration::from_secs(1));

    /// A zero `capacity` is treated as one. Refills never come faster than one
    /// token per nanosecond, so a zero or sub-`capacity`-nanosecond `window`
    /// still limits the rate.
    pub const fn new(capacity: u32, window: Duration) -> Self {
        let capacity = if capacity == 0 { 1 } else { capacity };
        Self { capacity, window }
    }

    /// Time between two single-token refills.
    pub fn refill_every(&self) -> Duration {
        (self.window / self.capacity).max(Duration::from_nanos(1))
    }
}

#[derive(Debug)]
struct State {
    tokens: u32,
    last_refill: Instant,
}

/// A token bucket shared by every concurrent caller of one operation class.
///
/// No fairness is provided between waiters: whichever task observes a fresh
/// token first takes it.
#[derive(Debug)]
pub struct RateBudget {
    name: &'static str,
    capacity: u32,
    refill_every: Duration,
    state: Mutex<State>,
    closed: CancellationToken,
}

impl RateBudget {
    /// Creates a full bucket.
    pub fn new(name: &'static str, config: BudgetConfig) -> Self {
        Self {
            name,
            capacity: config.capacity,
            refill_every: config.refill_every(),
            state: Mutex::new(State {
                tokens: config.capacity,
                last_refill: Instant::now(),
            }),
            closed: CancellationToken::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Tokens that could be taken right now without waiting.
    pub fn available(&self) -> u32 {
        let mut state = self.lock();
        self.refill(&mut state, Instant::now());
        state.tokens
    }

    /// Waits for a token and takes it.
    ///
    /// Returns [`Error::RateLimitCancelled`] if `cancel` fires first, and
    /// [`Error::Closed`] once [`close`](Self::close) has been called. Neither
    /// outcome consumes a token.
    pub async fn acquire(&self, cancel: Option<&CancellationToken>) -> Result<()> {
        loop {
            if self.closed.is_cancelled() {
                return Err(Error::Closed);
            }
            if cancel.is_some_and(CancellationToken::is_cancelled) {
                return Err(Error::RateLimitCancelled);
            }
            let wait = match self.try_take() {
                Ok(()) => return Ok(()),
                Err(wait) => wait,
            };
            trace!("{} budget exhausted; next token in {:?}", self.name, wait);
            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = self.closed.cancelled() => return Err(Error::Closed),
                _ = cancelled(cancel) => return Err(Error::RateLimitCancelled),
            }
        }
    }

    /// Rejects all pending and future acquisitions.
    pub fn close(&self) {
        self.closed.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Takes a token if one is available, otherwise reports how long until the next refill.
    fn try_take(&self) -> std::result::Result<(), Duration> {
        let now = Instant::now();
        let mut state = self.lock();
        self.refill(&mut state, now);
        if state.tokens > 0 {
            state.tokens -= 1;
            return Ok(());
        }
        let since = now.saturating_duration_since(state.last_refill);
        Err(self.refill_every.saturating_sub(since))
    }

    fn refill(&self, state: &mut State, now: Instant) {
        if state.tokens >= self.capacity {
            // A full bucket does not bank time towards the next token.
            state.tokens = self.capacity;
            state.last_refill = now;
            return;
        }
        let elapsed = now.saturating_duration_since(state.last_refill);
        let earned = elapsed.as_nanos() / self.refill_every.as_nanos();
        if earned == 0 {
            return;
        }
        let earned = u32::try_from(earned).unwrap_or(u32::MAX);
        state.tokens = state.tokens.saturating_add(earned).min(self.capacity);
        if state.tokens == self.capacity {
            state.last_refill = now;
        } else {
            // Keep the remainder so partial intervals are not lost.
            state.last_refill += self.refill_every * earned;
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn cancelled(token: Option<&CancellationToken>) {
    match token {
        Some(token) => token.cancelled().await,
        None => std::future::pending().await,
    }
}
