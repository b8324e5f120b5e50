//! Cooperative cancellation for long-running extractions.
//!
//! A [`CancelHandle`] stays with the caller; the paired [`CancelToken`] is
//! passed into the pipeline, which checks it between pages and races every
//! render, network call and backoff sleep against it. Built on a
//! `tokio::sync::watch` channel so any number of token clones observe one
//! flag.

use tokio::sync::watch;

/// Caller side: flips the flag.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

/// Pipeline side: observes the flag.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

/// Create a connected handle/token pair.
pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelToken { rx })
}

impl CancelHandle {
    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// A token observing this handle.
    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: self.tx.subscribe(),
        }
    }
}

impl CancelToken {
    /// A token that is never cancelled.
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is requested; pends forever if the handle
    /// is dropped without cancelling.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::never()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn cancel_wakes_waiters() {
        let (handle, token) = cancel_pair();
        assert!(!token.is_cancelled());

        let waiter = tokio::spawn({
            let token = token.clone();
            async move { token.cancelled().await }
        });
        handle.cancel();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake")
            .unwrap();
        assert!(token.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn never_token_stays_pending() {
        let token = CancelToken::never();
        let r = tokio::time::timeout(Duration::from_secs(60), token.cancelled()).await;
        assert!(r.is_err());
        assert!(!token.is_cancelled());
    }

    #[tokio::test]
    async fn token_from_handle_sees_cancellation() {
        let (handle, _first) = cancel_pair();
        let second = handle.token();
        handle.cancel();
        handle.cancel();
        second.cancelled().await;
        assert!(second.is_cancelled());
    }
}
