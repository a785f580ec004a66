//! Token bucket rate limiter shared by concurrent lookups.

use tokio::sync::Mutex;
use tokio::time::{sleep, Duration, Instant};
use tracing::trace;

/// Token bucket: tokens refill at a constant rate and each request spends one.
#[derive(Debug)]
pub struct TokenBucket {
    /// Max tokens (= requests per minute).
    capacity: f32,
    tokens: f32,
    /// Tokens added per second.
    refill_rate: f32,
    last_refill: Instant,
}

impl TokenBucket {
    /// Create a full bucket.
    pub fn new(requests_per_minute: u32) -> Self {
        let capacity = requests_per_minute.max(1) as f32;
        Self {
            capacity,
            tokens: capacity,
            refill_rate: capacity / 60.0,
            last_refill: Instant::now(),
        }
    }

    /// Take a token, or return how long until one is available.
    pub fn try_acquire(&mut self) -> Result<(), Duration> {
        self.refill();

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else {
            let tokens_needed = 1.0 - self.tokens;
            Err(Duration::from_secs_f32(tokens_needed / self.refill_rate))
        }
    }

    pub fn available(&mut self) -> f32 {
        self.refill();
        self.tokens
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f32();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.capacity);
        self.last_refill = now;
    }
}

/// Async wrapper that waits for a token instead of failing.
#[derive(Debug)]
pub struct RateLimiter {
    bucket: Mutex<TokenBucket>,
}

impl RateLimiter {
    pub fn new(requests_per_minute: u32) -> Self {
        Self {
            bucket: Mutex::new(TokenBucket::new(requests_per_minute)),
        }
    }

    /// Wait until a request may be sent.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut bucket = self.bucket.lock().await;
                match bucket.try_acquire() {
                    Ok(()) => return,
                    Err(wait) => wait,
                }
            };
            trace!(wait_ms = wait.as_millis() as u64, "Rate limited, waiting");
            sleep(wait).await;
        }
    }

    pub async fn available(&self) -> f32 {
        self.bucket.lock().await.available()
    }
}
