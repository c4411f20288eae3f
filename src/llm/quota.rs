//! Process-wide call ceiling for metered providers.

use std::sync::atomic::{AtomicU64, Ordering};

use super::LlmError;

/// Counts admitted calls and refuses new ones once `limit` is reached.
#[derive(Debug)]
pub struct CallQuota {
    limit: u64,
    used: AtomicU64,
}

impl CallQuota {
    pub fn new(limit: u64) -> Self {
        Self {
            limit,
            used: AtomicU64::new(0),
        }
    }

    /// Admit one call, or fail with `QuotaExceeded` without counting it.
    pub fn acquire(&self) -> Result<(), LlmError> {
        self.used
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |used| {
                (used < self.limit).then_some(used + 1)
            })
            .map(|_| ())
            .map_err(|_| LlmError::quota_exceeded(self.limit))
    }

    pub fn used(&self) -> u64 {
        self.used.load(Ordering::SeqCst)
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refuses_after_limit_without_counting() {
        let quota = CallQuota::new(2);
        assert!(quota.acquire().is_ok());
        assert!(quota.acquire().is_ok());

        let err = quota.acquire().unwrap_err();
        assert!(err.is_quota_exceeded());
        assert_eq!(quota.used(), 2);
    }

    #[test]
    fn zero_limit_refuses_everything() {
        let quota = CallQuota::new(0);
        assert!(quota.acquire().is_err());
        assert_eq!(quota.used(), 0);
    }
}
