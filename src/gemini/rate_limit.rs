use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Fixed-window request counter for the model API.
///
/// When the window's budget is spent, `acquire` sleeps until the window
/// closes and then opens a new one.
pub struct RequestRateLimiter {
    limit: u32,
    window: Duration,
    state: Mutex<Window>,
}

struct Window {
    start: Instant,
    count: u32,
}

impl RequestRateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            state: Mutex::new(Window {
                start: Instant::now(),
                count: 0,
            }),
        }
    }

    pub fn per_minute(limit: u32) -> Self {
        Self::new(limit, Duration::from_secs(60))
    }

    pub async fn acquire(&self) {
        // zero disables limiting
        if self.limit == 0 {
            return;
        }

        let mut window = self.state.lock().await;
        let elapsed = window.start.elapsed();
        if elapsed >= self.window {
            if window.count > 0 {
                tracing::info!(
                    "Rate limit window reset: {} calls in last window",
                    window.count
                );
            }
            window.start = Instant::now();
            window.count = 0;
        } else if window.count >= self.limit {
            let wait = self.window - elapsed;
            tracing::warn!(
                "RPM limit reached ({}), waiting {:.1}s",
                self.limit,
                wait.as_secs_f64()
            );
            tokio::time::sleep(wait).await;
            window.start = Instant::now();
            window.count = 0;
        }
        window.count += 1;
    }

    pub async fn used_in_window(&self) -> u32 {
        self.state.lock().await.count
    }
}
