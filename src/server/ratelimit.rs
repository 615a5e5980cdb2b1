//! Token-bucket rate limiter keyed by client IP (§4.11).
//!
//! Sharded `Mutex<HashMap<IpAddr, Bucket>>` rather than a single lock or
//! `dashmap`: the teacher already reaches for plain `std::sync::Mutex` around
//! its shared state (see `server/connection.rs`'s socket guard) rather than a
//! lock-free map, and a handful of shards is enough to keep contention off
//! the hot accept path without pulling in a second concurrent-map crate.

use crate::config::RateLimiterConfig;
use std::{
    collections::HashMap,
    net::IpAddr,
    sync::Mutex,
    time::{Duration, Instant},
};

const SHARDS: usize = 16;

struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

impl Bucket {
    fn new(capacity: f64) -> Self {
        Bucket { tokens: capacity, last_refill: Instant::now() }
    }

    fn refill(&mut self, config: &RateLimiterConfig) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * config.refill_per_sec).min(config.capacity);
        self.last_refill = now;
    }
}

/// The outcome of a rate-limit check: either the request is let through, or
/// it is rejected with a `Retry-After` hint in whole seconds.
pub(crate) enum Decision {
    Allow,
    Reject { retry_after: u64 },
}

pub(crate) struct RateLimiter {
    config: RateLimiterConfig,
    shards: Vec<Mutex<HashMap<IpAddr, Bucket>>>,
}

impl RateLimiter {
    pub(crate) fn new(config: RateLimiterConfig) -> Self {
        RateLimiter {
            config,
            shards: (0..SHARDS).map(|_| Mutex::new(HashMap::new())).collect(),
        }
    }

    fn shard_for(&self, addr: IpAddr) -> &Mutex<HashMap<IpAddr, Bucket>> {
        let hash = match addr {
            IpAddr::V4(v4) => u32::from(v4) as usize,
            IpAddr::V6(v6) => v6.segments().iter().map(|&s| s as usize).sum(),
        };
        &self.shards[hash % SHARDS]
    }

    /// Charges one token to `addr`'s bucket, creating it on first sight.
    pub(crate) fn check(&self, addr: IpAddr) -> Decision {
        let shard = self.shard_for(addr);
        let mut buckets = shard.lock().unwrap_or_else(|e| e.into_inner());

        let bucket = buckets
            .entry(addr)
            .or_insert_with(|| Bucket::new(self.config.capacity));
        bucket.refill(&self.config);

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            Decision::Allow
        } else {
            let deficit = 1.0 - bucket.tokens;
            let wait = Duration::from_secs_f64(deficit / self.config.refill_per_sec);
            Decision::Reject { retry_after: wait.as_secs().max(1) }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn addr(a: u8, b: u8, c: u8, d: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(a, b, c, d))
    }

    #[test]
    fn allows_within_capacity() {
        let limiter = RateLimiter::new(RateLimiterConfig { capacity: 3.0, refill_per_sec: 1.0 });
        let ip = addr(127, 0, 0, 1);

        assert!(matches!(limiter.check(ip), Decision::Allow));
        assert!(matches!(limiter.check(ip), Decision::Allow));
        assert!(matches!(limiter.check(ip), Decision::Allow));
    }

    #[test]
    fn rejects_once_exhausted() {
        let limiter = RateLimiter::new(RateLimiterConfig { capacity: 1.0, refill_per_sec: 1.0 });
        let ip = addr(10, 0, 0, 1);

        assert!(matches!(limiter.check(ip), Decision::Allow));
        match limiter.check(ip) {
            Decision::Reject { retry_after } => assert!(retry_after >= 1),
            Decision::Allow => panic!("expected rejection"),
        }
    }

    #[test]
    fn separate_ips_have_separate_buckets() {
        let limiter = RateLimiter::new(RateLimiterConfig { capacity: 1.0, refill_per_sec: 1.0 });

        assert!(matches!(limiter.check(addr(1, 1, 1, 1)), Decision::Allow));
        assert!(matches!(limiter.check(addr(2, 2, 2, 2)), Decision::Allow));
    }
}
