use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Enforces a minimum gap between consecutive requests to one endpoint
#[derive(Debug)]
pub struct Throttle {
    spacing: Duration,
    last: Option<Instant>,
}

impl Throttle {
    pub fn new(spacing: Duration) -> Self {
        Self { spacing, last: None }
    }

    pub fn spacing(&self) -> Duration {
        self.spacing
    }

    /// Sleep until `spacing` has passed since the previous call returned
    pub async fn wait(&mut self) {
        if let Some(last) = self.last {
            let elapsed = last.elapsed();
            if elapsed < self.spacing {
                sleep(self.spacing - elapsed).await;
            }
        }
        self.last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_call_does_not_wait() {
        let mut throttle = Throttle::new(Duration::from_secs(5));
        let start = Instant::now();
        throttle.wait().await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_consecutive_calls_are_spaced() {
        let mut throttle = Throttle::new(Duration::from_millis(60));
        let start = Instant::now();
        throttle.wait().await;
        throttle.wait().await;
        throttle.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(120));
    }
}
