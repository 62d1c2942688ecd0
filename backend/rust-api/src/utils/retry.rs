//! Bounded retry with exponential backoff for store operations.
//!
//! Core ledger/gate/engine operations never retry; only the document-store
//! transport uses this.

use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub backoff_multiplier: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(50),
            backoff_multiplier: 2,
        }
    }
}

pub async fn retry_async_with_config<F, Fut, T, E>(config: RetryConfig, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut backoff = config.initial_backoff;
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < config.max_attempts => {
                tracing::warn!(
                    "Operation failed (attempt {}/{}): {}, retrying in {:?}",
                    attempt,
                    config.max_attempts,
                    err,
                    backoff
                );
                tokio::time::sleep(backoff).await;
                backoff *= config.backoff_multiplier;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
