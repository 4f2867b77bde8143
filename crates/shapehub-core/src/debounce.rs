//! Trailing-edge debounce for keystroke-driven input

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Lets only the last of a burst of calls through.
///
/// Each call to [`settle`](Debouncer::settle) waits for the delay and then
/// reports whether it is still the most recent call. Earlier calls in the
/// burst return `false` and their input should be dropped.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    generation: AtomicU64,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: AtomicU64::new(0),
        }
    }

    pub async fn settle(&self) -> bool {
        let mine = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.generation.load(Ordering::Acquire) == mine
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_last_call_wins() {
        let debouncer = Debouncer::new(Duration::from_millis(350));

        let (first, second) = tokio::join!(debouncer.settle(), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            debouncer.settle().await
        });

        assert!(!first);
        assert!(second);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spaced_calls_both_settle() {
        let debouncer = Debouncer::new(Duration::from_millis(350));
        assert!(debouncer.settle().await);
        assert!(debouncer.settle().await);
    }
}
