//! Single-consumer event channel for one session.

use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;

use crate::error::StakeError;
use crate::event::StakeEvent;

type Sender = mpsc::UnboundedSender<StakeEvent>;

/// Producer half of a session's event channel.
///
/// Sends are serialized through an internal lock; once [`close`](Self::close)
/// returns, no further event reaches the consumer, including events that
/// were buffered but not yet read.
#[derive(Debug)]
pub struct EventSink {
    tx: Mutex<Option<Sender>>,
    closed: Arc<AtomicBool>,
}

/// Consumer half of a session's event channel.
///
/// Yields `None` as soon as the sink is closed.
#[derive(Debug)]
pub struct EventStream {
    rx: mpsc::UnboundedReceiver<StakeEvent>,
    closed: Arc<AtomicBool>,
}

impl EventSink {
    /// Create a connected sink/stream pair.
    pub fn channel() -> (EventSink, EventStream) {
        let (tx, rx) = mpsc::unbounded_channel();
        let closed = Arc::new(AtomicBool::new(false));
        (
            EventSink {
                tx: Mutex::new(Some(tx)),
                closed: closed.clone(),
            },
            EventStream { rx, closed },
        )
    }

    /// Push one event to the consumer.
    ///
    /// Fails with [`StakeError::SinkClosed`] after `close`, or when the
    /// consumer dropped its stream (the sink then closes itself).
    pub fn emit(&self, event: StakeEvent) -> Result<(), StakeError> {
        let mut tx = self.lock();
        let Some(sender) = tx.as_ref() else {
            return Err(StakeError::SinkClosed);
        };
        if sender.send(event).is_err() {
            tracing::debug!("event stream dropped by consumer");
            *tx = None;
            return Err(StakeError::SinkClosed);
        }
        Ok(())
    }

    /// Close the sink. Returns `true` if this call performed the close.
    pub fn close(&self) -> bool {
        let mut tx = self.lock();
        self.closed.store(true, Ordering::Release);
        tx.take().is_some()
    }

    /// `true` after `close`, or once the consumer has dropped its stream.
    pub fn is_closed(&self) -> bool {
        self.lock().as_ref().map_or(true, |tx| tx.is_closed())
    }

    fn lock(&self) -> MutexGuard<'_, Option<Sender>> {
        self.tx.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EventStream {
    /// Wait for the next event. `None` once the sink is closed or every
    /// producer is gone.
    pub async fn recv(&mut self) -> Option<StakeEvent> {
        futures::future::poll_fn(|cx| self.poll_event(cx)).await
    }

    /// Non-blocking receive; `None` when nothing is buffered.
    pub fn try_recv(&mut self) -> Option<StakeEvent> {
        if self.is_closed() {
            return None;
        }
        self.rx.try_recv().ok()
    }

    /// Returns `true` once the producing sink has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn poll_event(&mut self, cx: &mut Context<'_>) -> Poll<Option<StakeEvent>> {
        if self.is_closed() {
            return Poll::Ready(None);
        }
        self.rx.poll_recv(cx)
    }
}

impl Stream for EventStream {
    type Item = StakeEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<StakeEvent>> {
        self.poll_event(cx)
    }
}
