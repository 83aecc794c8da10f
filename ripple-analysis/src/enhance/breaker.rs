//! Circuit breaker for the fitting boundary.
//!
//! Counts consecutive fitting failures; at the threshold the breaker opens
//! and fitting is skipped entirely until an explicit `reset()`. The
//! counter is atomic so one enhancer instance can be shared across
//! concurrent callers.

use std::sync::atomic::{AtomicU32, Ordering};

/// Breaker state: `Closed → Open` on the failure threshold, `Closed`
/// again only on manual reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
}

#[derive(Debug)]
pub struct CircuitBreaker {
    failures: AtomicU32,
    threshold: u32,
}

impl CircuitBreaker {
    pub fn new(threshold: u32) -> Self {
        Self {
            failures: AtomicU32::new(0),
            threshold: threshold.max(1),
        }
    }

    pub fn state(&self) -> BreakerState {
        if self.is_open() {
            BreakerState::Open
        } else {
            BreakerState::Closed
        }
    }

    pub fn is_open(&self) -> bool {
        self.failures.load(Ordering::Relaxed) >= self.threshold
    }

    pub fn failures(&self) -> u32 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Record one fitting failure; returns the new consecutive count.
    pub fn record_failure(&self) -> u32 {
        self.failures.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Record a fitting success. Clears the consecutive count while the
    /// breaker is closed; an open breaker stays open until `reset()`.
    pub fn record_success(&self) {
        let mut current = self.failures.load(Ordering::Relaxed);
        while current < self.threshold {
            match self.failures.compare_exchange_weak(
                current,
                0,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return,
                Err(observed) => current = observed,
            }
        }
    }

    /// Manually close the breaker.
    pub fn reset(&self) {
        self.failures.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opens_at_threshold() {
        let breaker = CircuitBreaker::new(3);
        assert_eq!(breaker.state(), BreakerState::Closed);
        breaker.record_failure();
        breaker.record_failure();
        assert_eq!(breaker.state(), BreakerState::Closed);
        breaker.record_failure();
        assert_eq!(breaker.state(), BreakerState::Open);
    }

    #[test]
    fn test_success_clears_consecutive_count() {
        let breaker = CircuitBreaker::new(3);
        breaker.record_failure();
        breaker.record_failure();
        breaker.record_success();
        assert_eq!(breaker.failures(), 0);
        breaker.record_failure();
        assert_eq!(breaker.state(), BreakerState::Closed);
    }

    #[test]
    fn test_open_breaker_requires_manual_reset() {
        let breaker = CircuitBreaker::new(1);
        breaker.record_failure();
        assert!(breaker.is_open());

        // Success while open does not close it.
        breaker.record_success();
        assert!(breaker.is_open());

        breaker.reset();
        assert_eq!(breaker.state(), BreakerState::Closed);
    }

    #[test]
    fn test_concurrent_failures_all_counted() {
        use std::sync::Arc;
        let breaker = Arc::new(CircuitBreaker::new(1000));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let breaker = Arc::clone(&breaker);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        breaker.record_failure();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(breaker.failures(), 800);
    }
}
