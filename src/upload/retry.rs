use crate::s3::UploadError;
use std::{future::Future, time::Duration};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

/// Bounded exponential backoff: `base * 2^(attempt - 1)`, capped at `max`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retry {
    attempts: u32,
    base: Duration,
    max: Duration,
}

impl Default for Retry {
    fn default() -> Self {
        Self::new(3)
    }
}

impl Retry {
    #[must_use]
    pub const fn new(attempts: u32) -> Self {
        Self {
            attempts,
            base: Duration::from_secs(1),
            max: Duration::from_secs(30),
        }
    }

    #[must_use]
    pub const fn with_backoff(mut self, base: Duration, max: Duration) -> Self {
        self.base = base;
        self.max = max;
        self
    }

    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
            .min(self.max)
    }

    /// Run `op` until it succeeds, fails with a non-retryable error or the
    /// attempts are exhausted; the last error is returned. Once `cancel`
    /// fires no further attempt is made.
    ///
    /// # Errors
    ///
    /// Will return the error of the last attempt, or `Cancelled`
    pub async fn run<T, F, Fut>(
        &self,
        what: &str,
        cancel: &CancellationToken,
        mut op: F,
    ) -> Result<T, UploadError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, UploadError>>,
    {
        let attempts = self.attempts.max(1);
        let mut attempt = 1;

        loop {
            if cancel.is_cancelled() {
                return Err(UploadError::Cancelled);
            }

            match op().await {
                Ok(rs) => return Ok(rs),

                Err(e) if e.is_retryable() && attempt < attempts => {
                    let backoff_time = self.backoff(attempt);

                    log::warn!(
                        "{what}, attempt {attempt}/{attempts} failed: {e}, retrying in {backoff_time:?}"
                    );

                    tokio::select! {
                        () = cancel.cancelled() => return Err(UploadError::Cancelled),
                        () = sleep(backoff_time) => (),
                    }

                    attempt += 1;
                }

                Err(e) => {
                    log::error!("{what}, attempt {attempt}/{attempts} failed: {e}");

                    return Err(e);
                }
            }
        }
    }
}
