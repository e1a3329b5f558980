use anyhow::Result;
use log::info;
use std::future::Future;
use std::time::{Duration, Instant};

/// Sleep-and-recheck loop for remote operations that finish asynchronously.
///
/// `condition` returns `Ok(Some(value))` once a terminal state is reached and
/// `Ok(None)` while still waiting. Condition errors abort the loop at once;
/// reaching `timeout` is reported as an error. `interval` must be non-zero.
pub async fn poll_until<F, Fut, T>(
    operation_name: &str,
    interval: Duration,
    timeout: Duration,
    mut condition: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    if interval.is_zero() {
        anyhow::bail!("Poll interval for {} must be non-zero", operation_name);
    }

    let started = Instant::now();
    let mut checks = 0u32;

    loop {
        checks += 1;
        if let Some(value) = condition().await? {
            if checks > 1 {
                info!("{} ready after {} checks", operation_name, checks);
            }
            return Ok(value);
        }

        let elapsed = started.elapsed();
        if elapsed >= timeout {
            anyhow::bail!(
                "Timed out after {:?} waiting for {} ({} checks)",
                timeout,
                operation_name,
                checks
            );
        }

        let delay = interval.min(timeout - elapsed);
        info!(
            "{} not ready (check {}), rechecking in {:?}",
            operation_name, checks, delay
        );
        tokio::time::sleep(delay).await;
    }
}
