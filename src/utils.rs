use std::future::Future;
use std::time::Duration;

use anyhow::Result;

#[cfg(test)]
#[path = "utils_test.rs"]
mod utils_test;

/// Generate a payload value which is unique across scenario runs.
pub fn unique_payload() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// The outcome of a single poll iteration.
pub enum Poll<T> {
    /// Polling is finished with the given value.
    Ready(T),
    /// The awaited condition has not yet been reached.
    Pending,
}

/// Repeatedly invoke `f` every `interval` until it returns `Poll::Ready` or an error.
///
/// Returns `Ok(None)` if `budget` elapses first.
pub async fn poll_until<T, F, Fut>(budget: Duration, interval: Duration, mut f: F) -> Result<Option<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Poll<T>>>,
{
    let poll = async {
        loop {
            match f().await {
                Ok(Poll::Ready(val)) => return Ok(val),
                Ok(Poll::Pending) => tokio::time::sleep(interval).await,
                Err(err) => return Err(err),
            }
        }
    };
    match tokio::time::timeout(budget, poll).await {
        Ok(res) => res.map(Some),
        Err(_elapsed) => Ok(None),
    }
}
