use std::time::Duration;

use anyhow::{Context, Result};

/// Download policy: 3 attempts, exponential backoff from 400 ms.
pub const DOWNLOAD_ATTEMPTS: usize = 3;
pub const DOWNLOAD_BASE_DELAY: Duration = Duration::from_millis(400);

/// Clipboard policy: one extra retry after a short fixed delay.
pub const CLIPBOARD_ATTEMPTS: usize = 2;
pub const CLIPBOARD_BASE_DELAY: Duration = Duration::from_millis(250);

/// Runs `op` up to `max_attempts` times, sleeping `base_delay * 2^attempt`
/// between failures (no jitter). The operation receives the zero-based
/// attempt index; the final failure propagates with the attempt count
/// attached.
pub fn with_retry<T>(
    max_attempts: usize,
    base_delay: Duration,
    op: impl FnMut(usize) -> Result<T>,
) -> Result<T> {
    with_retry_using(&mut ThreadSleeper, max_attempts, base_delay, op)
}

pub(crate) fn with_retry_using<T>(
    sleeper: &mut dyn Sleeper,
    max_attempts: usize,
    base_delay: Duration,
    mut op: impl FnMut(usize) -> Result<T>,
) -> Result<T> {
    let max_attempts = max_attempts.max(1);
    let mut last_err = None;
    for attempt in 0..max_attempts {
        match op(attempt) {
            Ok(value) => return Ok(value),
            Err(err) => {
                last_err = Some(err);
                if attempt + 1 < max_attempts {
                    sleeper.sleep(base_delay * 2u32.pow(attempt as u32));
                }
            }
        }
    }
    Err(last_err.unwrap_or_else(|| anyhow::anyhow!("retry loop without attempts")))
        .with_context(|| format!("operation failed after {max_attempts} attempts"))
}

pub(crate) trait Sleeper {
    fn sleep(&mut self, duration: Duration);
}

struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
