use std::time::Duration;
use tracing::debug;

use crate::browser::jitter_ms;
use crate::core::config::PacingSettings;

/// Pause between postings, drawn uniformly from `[min_secs, max_secs]`.
#[derive(Debug, Clone, Copy)]
pub struct PostingDelay {
    pub min_secs: u64,
    pub max_secs: u64,
    /// A posting that already took longer than this earns no extra pause.
    pub skip_after: Duration,
}

impl PostingDelay {
    pub fn new(min_secs: u64, max_secs: u64, skip_after: Duration) -> Self {
        Self {
            min_secs,
            max_secs: max_secs.max(min_secs),
            skip_after,
        }
    }

    pub fn from_settings(settings: &PacingSettings) -> Self {
        let (min, max) = settings.resolve_range();
        Self::new(min, max, settings.resolve_skip_after())
    }

    pub fn random_delay(&self) -> Duration {
        Duration::from_millis(jitter_ms(self.min_secs * 1000, self.max_secs * 1000))
    }

    /// Delay owed after a posting that took `last_posting`, if any.
    pub fn delay_after(&self, last_posting: Duration) -> Option<Duration> {
        if last_posting > self.skip_after {
            None
        } else {
            Some(self.random_delay())
        }
    }

    /// Sleep in one-second slices. Returns `false` as soon as
    /// `is_cancelled` reports true.
    pub async fn wait(&self, last_posting: Duration, is_cancelled: impl Fn() -> bool) -> bool {
        let Some(total) = self.delay_after(last_posting) else {
            debug!("pacing: skipped, last posting took {:?}", last_posting);
            return !is_cancelled();
        };
        debug!("⏳ pacing {:?} before next posting", total);
        let slice = Duration::from_secs(1);
        let mut left = total;
        while !left.is_zero() {
            if is_cancelled() {
                return false;
            }
            let step = left.min(slice);
            tokio::time::sleep(step).await;
            left -= step;
        }
        !is_cancelled()
    }
}

impl Default for PostingDelay {
    fn default() -> Self {
        Self::new(15, 25, Duration::from_secs(30))
    }
}
