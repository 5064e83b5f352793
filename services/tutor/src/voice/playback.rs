//! Completion tracking for audio playback.

use anyhow::{Result, bail};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Extra time allowed past the audio's own length before playback is abandoned.
pub const PLAYBACK_GRACE: Duration = Duration::from_secs(2);

/// Flags shared between an output stream's callbacks and the thread waiting on it.
#[derive(Debug, Clone, Default)]
pub struct PlaybackWatch {
    finished: Arc<AtomicBool>,
    failed: Arc<AtomicBool>,
}

impl PlaybackWatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_finished(&self) {
        self.finished.store(true, Ordering::Release);
    }

    pub fn mark_failed(&self) {
        self.failed.store(true, Ordering::Release);
    }

    /// Blocks until playback finishes, the stream reports an error, or `limit` passes.
    pub fn wait(&self, limit: Duration) -> Result<()> {
        let deadline = Instant::now() + limit;
        loop {
            if self.failed.load(Ordering::Acquire) {
                bail!("Playback stream failed");
            }
            if self.finished.load(Ordering::Acquire) {
                return Ok(());
            }
            if Instant::now() >= deadline {
                bail!("Playback did not finish within {:.1}s", limit.as_secs_f32());
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }
}

/// How long to wait for `samples` mono samples at `sample_rate` to play.
pub fn playback_limit(samples: usize, sample_rate: u32) -> Duration {
    Duration::from_secs_f64(samples as f64 / sample_rate.max(1) as f64) + PLAYBACK_GRACE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wait_returns_once_finished() {
        let watch = PlaybackWatch::new();
        let callback_side = watch.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            callback_side.mark_finished();
        });
        watch.wait(Duration::from_secs(5)).unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn test_stream_error_ends_wait() {
        let watch = PlaybackWatch::new();
        watch.clone().mark_failed();
        let started = Instant::now();
        let err = watch.wait(Duration::from_secs(5)).unwrap_err();
        assert!(err.to_string().contains("failed"));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_silent_stream_times_out() {
        let watch = PlaybackWatch::new();
        let started = Instant::now();
        let err = watch.wait(Duration::from_millis(120)).unwrap_err();
        assert!(err.to_string().contains("did not finish"));
        assert!(started.elapsed() >= Duration::from_millis(120));
    }

    #[test]
    fn test_playback_limit() {
        assert_eq!(playback_limit(48_000, 24_000), Duration::from_secs(4));
        assert_eq!(playback_limit(0, 0), PLAYBACK_GRACE);
    }
}
