//! Plumbing between the background reader and the consumer.
//!
//! Inbound events travel over a bounded channel of capacity one, so the
//! reader blocks until the consumer takes the previous event. The terminal
//! state is latched: an atomic flag for the fast-path check plus a `watch`
//! value every waiter observes, however late it arrives.

use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use tokio::sync::{mpsc, watch};

/// Capacity of the inbound handoff.
pub(crate) const HANDOFF_CAPACITY: usize = 1;

/// One event produced by the reader.
#[derive(Debug)]
pub(crate) enum Inbound {
    /// Exactly the bytes of one successful read.
    Message(Bytes),
    /// A non-terminal read failure.
    Failure(std::io::Error),
}

pub(crate) fn handoff() -> (mpsc::Sender<Inbound>, mpsc::Receiver<Inbound>) {
    mpsc::channel(HANDOFF_CAPACITY)
}

/// Latched Open→Closed state shared by the reader and the handle.
#[derive(Debug)]
pub(crate) struct Terminal {
    closed: AtomicBool,
    notify: watch::Sender<bool>,
}

impl Terminal {
    pub(crate) fn new() -> Self {
        Self {
            closed: AtomicBool::new(false),
            notify: watch::Sender::new(false),
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Latch the closed state. Returns true only for the call that made the
    /// transition.
    pub(crate) fn close(&self) -> bool {
        if self.closed.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.notify.send_replace(true);
        true
    }

    /// Resolve once the closed state is latched. Never consumes it.
    pub(crate) async fn closed(&self) {
        let mut rx = self.notify.subscribe();
        // The sender lives as long as `self`, so `wait_for` cannot fail here.
        let _ = rx.wait_for(|closed| *closed).await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    #[test]
    fn close_transitions_once() {
        let terminal = Terminal::new();
        assert!(!terminal.is_closed());
        assert!(terminal.close());
        assert!(!terminal.close());
        assert!(terminal.is_closed());
    }

    #[tokio::test]
    async fn every_waiter_observes_close() {
        let terminal = Arc::new(Terminal::new());

        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let terminal = Arc::clone(&terminal);
                tokio::spawn(async move { terminal.closed().await })
            })
            .collect();

        terminal.close();
        for waiter in waiters {
            tokio::time::timeout(Duration::from_secs(1), waiter)
                .await
                .expect("waiter should wake")
                .expect("waiter task should not panic");
        }

        // Late arrivals return immediately.
        tokio::time::timeout(Duration::from_millis(100), terminal.closed())
            .await
            .expect("latched state should be visible to late waiters");
    }

    #[tokio::test]
    async fn handoff_holds_one_event() {
        let (tx, mut rx) = handoff();
        tx.send(Inbound::Message(Bytes::from_static(b"a")))
            .await
            .unwrap();
        assert!(tx
            .try_send(Inbound::Message(Bytes::from_static(b"b")))
            .is_err());

        match rx.recv().await {
            Some(Inbound::Message(bytes)) => assert_eq!(bytes.as_ref(), b"a"),
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
