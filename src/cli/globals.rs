use crate::upload::Retry;
use std::{convert::TryFrom, time::Duration};

// Define the global arguments
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub retries: u32,
    // files uploaded at the same time
    pub max_uploads: usize,
    // first retry delay, doubles on every attempt
    pub backoff: Duration,
}

impl Default for GlobalArgs {
    fn default() -> Self {
        Self::new()
    }
}

impl GlobalArgs {
    #[must_use]
    pub fn new() -> Self {
        Self {
            retries: 3,
            max_uploads: num_cpus::get_physical().max(1),
            backoff: Duration::from_secs(1),
        }
    }

    pub fn set_retries(&mut self, retries: usize) {
        self.retries = u32::try_from(retries).unwrap_or(3);
    }

    pub fn set_max_uploads(&mut self, max_uploads: usize) {
        self.max_uploads = max_uploads.max(1);
    }

    #[must_use]
    pub fn retry(&self) -> Retry {
        Retry::new(self.retries).with_backoff(self.backoff, Duration::from_secs(30))
    }
}
