use std::time::Duration;
use tokio::time::interval;

use crate::limiter::rate_limiter::RateLimiter;

/// Periodically drop quota records whose window has closed.
pub async fn start_sweep_task(limiter: RateLimiter, every: Duration) {
    let mut interval = interval(every);

    loop {
        interval.tick().await;

        let removed = limiter.sweep().await;
        if removed > 0 {
            tracing::info!("Swept {} expired rate limit records", removed);
        } else {
            tracing::debug!("Rate limit sweep found nothing to evict");
        }
    }
}
