use crate::{Error, Result};
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Awaits `fut` unless `shutdown` is cancelled first, in which case [`Error::Cancelled`] is
/// returned and `fut` is dropped.
pub async fn cancelable<F: Future>(shutdown: &CancellationToken, fut: F) -> Result<F::Output> {
    tokio::select! {
        biased;
        _ = shutdown.cancelled() => Err(Error::Cancelled),
        output = fut => Ok(output),
    }
}
