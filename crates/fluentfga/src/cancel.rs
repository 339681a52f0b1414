use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::error::{EngineResult, FgaError, FgaResult};

/// Runs an engine call unless `token` is cancelled first.
///
/// An already-cancelled token never polls `call`, so no request is sent.
pub(crate) async fn cancellable<T, F>(token: &CancellationToken, call: F) -> FgaResult<T>
where
    F: Future<Output = EngineResult<T>>,
{
    if token.is_cancelled() {
        return Err(FgaError::Cancelled);
    }

    tokio::select! {
        biased;
        _ = token.cancelled() => Err(FgaError::Cancelled),
        result = call => result.map_err(FgaError::from),
    }
}
