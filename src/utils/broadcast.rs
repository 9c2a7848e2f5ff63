//! Broadcast Receiving
//!
//! Subscribers that only display events can afford to miss some; they must
//! not stop listening because of it.

use tokio::sync::broadcast::{error::RecvError, Receiver};

/// Next value from `rx`. Skips over values lost to a full channel and
/// returns `None` once every sender is gone.
pub async fn recv_skipping_lag<T: Clone>(rx: &mut Receiver<T>) -> Option<T> {
    loop {
        match rx.recv().await {
            Ok(value) => return Some(value),
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Subscriber fell behind; skipped events");
            }
            Err(RecvError::Closed) => return None,
        }
    }
}
