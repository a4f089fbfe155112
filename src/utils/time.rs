//! Cancellable sleeping.

use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Sleeps for `duration` unless `token` is cancelled first
///
/// Returns `true` when the sleep was interrupted by cancellation.
pub async fn sleep_with_cancel(token: &CancellationToken, duration: Duration) -> bool {
	tokio::select! {
		_ = token.cancelled() => true,
		_ = tokio::time::sleep(duration) => false,
	}
}
