//! Pacing of generator calls.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

/// Gate awaited before every generator call.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Wait until one more call is allowed.
    async fn acquire(&self);
}

#[async_trait]
impl<R: RateLimiter + ?Sized> RateLimiter for Arc<R> {
    async fn acquire(&self) {
        (**self).acquire().await
    }
}

/// No pacing at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unlimited;

#[async_trait]
impl RateLimiter for Unlimited {
    async fn acquire(&self) {}
}

#[derive(Debug)]
struct Bucket {
    tokens: u32,
    last_refill: Instant,
}

/// Token bucket: up to `capacity` calls in a burst, then one call per
/// `interval`.
///
/// Runs on the tokio clock, so tests with paused time see virtual delays.
#[derive(Debug)]
pub struct TokenBucket {
    capacity: u32,
    interval: Duration,
    bucket: Mutex<Bucket>,
}

impl TokenBucket {
    /// A full bucket. `capacity` is raised to at least one.
    pub fn new(capacity: u32, interval: Duration) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            interval,
            bucket: Mutex::new(Bucket {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    /// One call per `interval`, no burst.
    pub fn per_interval(interval: Duration) -> Self {
        Self::new(1, interval)
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    fn refill(&self, bucket: &mut Bucket, now: Instant) {
        if self.interval.is_zero() {
            bucket.tokens = self.capacity;
            bucket.last_refill = now;
            return;
        }

        let elapsed = now.saturating_duration_since(bucket.last_refill);
        let earned = elapsed.as_nanos() / self.interval.as_nanos();
        if earned == 0 {
            return;
        }

        let earned = u32::try_from(earned).unwrap_or(u32::MAX);
        bucket.tokens = bucket.tokens.saturating_add(earned).min(self.capacity);
        if bucket.tokens == self.capacity {
            bucket.last_refill = now;
        } else {
            bucket.last_refill += self.interval * earned;
        }
    }
}

#[async_trait]
impl RateLimiter for TokenBucket {
    async fn acquire(&self) {
        loop {
            let wait = {
                let mut bucket = self.bucket.lock().await;
                let now = Instant::now();
                self.refill(&mut bucket, now);

                if bucket.tokens > 0 {
                    bucket.tokens -= 1;
                    return;
                }

                (bucket.last_refill + self.interval).saturating_duration_since(now)
            };
            sleep(wait).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_token_bucket_paces_calls() {
        let limiter = TokenBucket::per_interval(Duration::from_secs(1));
        let start = Instant::now();

        for _ in 0..12 {
            limiter.acquire().await;
        }

        // First call is free, the other eleven wait one interval each
        assert_eq!(start.elapsed(), Duration::from_secs(11));
    }

    #[tokio::test(start_paused = true)]
    async fn test_token_bucket_burst_then_refill() {
        let limiter = TokenBucket::new(3, Duration::from_secs(2));
        let start = Instant::now();

        for _ in 0..3 {
            limiter.acquire().await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);

        limiter.acquire().await;
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_time_refills_bucket() {
        let limiter = TokenBucket::new(2, Duration::from_secs(1));
        limiter.acquire().await;
        limiter.acquire().await;

        sleep(Duration::from_secs(10)).await;
        let start = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shared_limiter_holds_global_rate() {
        let limiter = Arc::new(TokenBucket::per_interval(Duration::from_secs(1)));
        let start = Instant::now();

        let tasks: Vec<_> = (0..3)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move {
                    for _ in 0..2 {
                        limiter.acquire().await;
                    }
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_unlimited_never_waits() {
        let limiter = Unlimited;
        for _ in 0..100 {
            limiter.acquire().await;
        }
    }
}
