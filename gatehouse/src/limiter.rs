//! Per-client token-bucket rate limiting with a background sweeper.
//!
//! Buckets are keyed by client IP in a sharded concurrent map and each
//! bucket carries its own lock, so a hot client never serializes cold ones.
//! A background task reclaims buckets that have been idle longer than the
//! stale duration, keeping the map proportional to the active-client count
//! rather than the all-time-seen count.

use dashmap::DashMap;
use parking_lot::Mutex;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::debug;

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Steady-state refill rate, tokens per second
    pub rps: f64,
    /// Maximum instantaneous admission count
    pub burst: f64,
    /// How often the sweeper scans for stale buckets
    pub sweep_interval: Duration,
    /// Idle time after which a bucket is reclaimed
    pub stale_duration: Duration,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            rps: 10.0,
            burst: 20.0,
            sweep_interval: Duration::from_secs(60),
            stale_duration: Duration::from_secs(300),
        }
    }
}

/// Outcome of an admission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Request admitted; one token consumed
    Admitted,
    /// Bucket exhausted; retry after the given number of seconds
    Throttled { retry_after: u64 },
}

struct Bucket {
    tokens: f64,
    last_seen: Instant,
}

struct Inner {
    buckets: DashMap<IpAddr, Mutex<Bucket>>,
    config: RateLimiterConfig,
    shutdown: watch::Sender<bool>,
    sweeper: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

/// Token-bucket rate limiter keyed by client IP.
///
/// Cloning is cheap; all clones share the same bucket map.
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Inner>,
}

impl RateLimiter {
    /// Create a limiter with the given configuration. The sweeper is not
    /// running until [`start`](Self::start) is called.
    pub fn new(config: RateLimiterConfig) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                buckets: DashMap::new(),
                config,
                shutdown,
                sweeper: Mutex::new(None),
            }),
        }
    }

    /// Run an admission check for `ip`, creating its bucket on first sight.
    pub fn check(&self, ip: IpAddr) -> Decision {
        let config = &self.inner.config;
        let now = Instant::now();

        let entry = self.inner.buckets.entry(ip).or_insert_with(|| {
            Mutex::new(Bucket {
                tokens: config.burst,
                last_seen: now,
            })
        });

        let mut bucket = entry.lock();
        let elapsed = now.duration_since(bucket.last_seen).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * config.rps).min(config.burst);
        bucket.last_seen = now;

        if bucket.tokens < 1.0 {
            let retry_after = ((1.0 - bucket.tokens) / config.rps).ceil() as u64;
            Decision::Throttled {
                retry_after: retry_after.max(1),
            }
        } else {
            bucket.tokens -= 1.0;
            Decision::Admitted
        }
    }

    /// Launch the background sweeper. Calling `start` while the sweeper is
    /// already running is a no-op.
    pub fn start(&self) {
        let mut slot = self.inner.sweeper.lock();
        if slot.is_some() {
            return;
        }

        let inner = Arc::clone(&self.inner);
        let mut shutdown = self.inner.shutdown.subscribe();
        *slot = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(inner.config.sweep_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick of a tokio interval fires immediately.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let stale = inner.config.stale_duration;
                        let now = Instant::now();
                        let before = inner.buckets.len();
                        inner.buckets.retain(|_, bucket| {
                            let bucket = bucket.lock();
                            now.duration_since(bucket.last_seen) <= stale
                        });
                        let reclaimed = before.saturating_sub(inner.buckets.len());
                        if reclaimed > 0 {
                            debug!(reclaimed, remaining = inner.buckets.len(), "swept stale buckets");
                        }
                    }
                    _ = shutdown.changed() => break,
                }
            }
        }));
    }

    /// Signal the sweeper to exit and wait for it.
    pub async fn stop(&self) {
        let _ = self.inner.shutdown.send(true);
        let handle = self.inner.sweeper.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    /// Number of buckets currently tracked.
    pub fn bucket_count(&self) -> usize {
        self.inner.buckets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(last: u8) -> IpAddr {
        IpAddr::from([127, 0, 0, last])
    }

    fn config(rps: f64, burst: f64) -> RateLimiterConfig {
        RateLimiterConfig {
            rps,
            burst,
            ..RateLimiterConfig::default()
        }
    }

    #[test]
    fn test_burst_admitted_then_throttled() {
        let limiter = RateLimiter::new(config(1.0, 3.0));

        for i in 0..3 {
            assert_eq!(limiter.check(ip(1)), Decision::Admitted, "request {i}");
        }

        match limiter.check(ip(1)) {
            Decision::Throttled { retry_after } => assert!(retry_after >= 1),
            other => panic!("expected throttle, got {other:?}"),
        }
    }

    #[test]
    fn test_clients_are_independent() {
        let limiter = RateLimiter::new(config(1.0, 2.0));

        assert_eq!(limiter.check(ip(1)), Decision::Admitted);
        assert_eq!(limiter.check(ip(1)), Decision::Admitted);
        assert!(matches!(limiter.check(ip(1)), Decision::Throttled { .. }));

        // A different client has a fresh bucket.
        assert_eq!(limiter.check(ip(2)), Decision::Admitted);
    }

    #[test]
    fn test_tokens_refill_over_time() {
        let limiter = RateLimiter::new(config(20.0, 1.0));

        assert_eq!(limiter.check(ip(1)), Decision::Admitted);
        assert!(matches!(limiter.check(ip(1)), Decision::Throttled { .. }));

        // 20 rps refills a full token within 50ms.
        std::thread::sleep(Duration::from_millis(80));
        assert_eq!(limiter.check(ip(1)), Decision::Admitted);
    }

    #[test]
    fn test_admission_bound_over_window() {
        // From a cold bucket, a window of t seconds admits at most
        // burst + floor(t * rps) requests.
        let limiter = RateLimiter::new(config(10.0, 5.0));
        let window = Duration::from_millis(500);
        let deadline = Instant::now() + window;

        let mut admitted = 0;
        while Instant::now() < deadline {
            if limiter.check(ip(1)) == Decision::Admitted {
                admitted += 1;
            }
        }

        // 5 burst + 0.5s * 10 rps = 10, plus one for timer slop.
        assert!(admitted <= 11, "admitted {admitted} requests");
        assert!(admitted >= 5);
    }

    #[tokio::test]
    async fn test_sweeper_reclaims_idle_buckets() {
        let limiter = RateLimiter::new(RateLimiterConfig {
            rps: 1.0,
            burst: 1.0,
            sweep_interval: Duration::from_millis(50),
            stale_duration: Duration::from_millis(100),
        });
        limiter.start();

        limiter.check(ip(1));
        assert_eq!(limiter.bucket_count(), 1);

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(limiter.bucket_count(), 0);

        limiter.stop().await;
    }

    #[tokio::test]
    async fn test_sweeper_keeps_active_buckets() {
        let limiter = RateLimiter::new(RateLimiterConfig {
            rps: 100.0,
            burst: 100.0,
            sweep_interval: Duration::from_millis(40),
            stale_duration: Duration::from_millis(200),
        });
        limiter.start();

        for _ in 0..5 {
            limiter.check(ip(1));
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert_eq!(limiter.bucket_count(), 1, "active bucket must survive sweeps");

        limiter.stop().await;
    }

    #[tokio::test]
    async fn test_stop_is_idempotent_enough() {
        let limiter = RateLimiter::new(RateLimiterConfig::default());
        limiter.start();
        limiter.start();
        limiter.stop().await;
        limiter.stop().await;
    }
}
