use std::future::poll_fn;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, Waker};

use bytes::Bytes;
use tokio::task::JoinHandle;

use crate::error::{BridgeError, SendError};
use crate::source::ChunkSource;

/// Create a connected producer/consumer pair.
///
/// The producer pushes chunks through the [`ChunkSink`]; the consumer
/// pulls them from the [`ChunkBridge`]. There is no queue between the
/// two: a chunk changes hands only when the consumer is asking for one,
/// and the producer's `send` resolves only after that handoff.
///
/// ```text
///   producer                 slots                  consumer
///   ────────                 ─────                  ────────
///   send(c1) ──────────▶  chunk: c1
///                         request: ◀────────────── next_chunk()
///            ◀── ack ───  (both full: hand off, clear) ──▶ Some(c1)
///   send(c2) ──────────▶  chunk: c2
///   ...
/// ```
#[must_use]
pub fn channel() -> (ChunkSink, ChunkBridge) {
    let shared = Arc::new(Shared::default());
    (
        ChunkSink {
            shared: Arc::clone(&shared),
        },
        ChunkBridge { shared, pump: None },
    )
}

/// Rendezvous state shared by one sink and one bridge.
///
/// The mutex is held only for bookkeeping; wakers are always fired after
/// the guard is dropped.
#[derive(Default)]
struct Shared {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    /// Chunk emitted by the producer and not yet taken by the consumer.
    chunk: Option<Bytes>,
    /// Sequence number of the last chunk placed in the slot.
    sent: u64,
    /// Sequence number of the last chunk handed to the consumer.
    delivered: u64,
    /// Latched producer error, waiting to be handed out.
    error: Option<io::Error>,
    /// The latched error has been handed out.
    failed: bool,
    finished: bool,
    cancelled: bool,
    /// Consumer waiting in `next_chunk`.
    consumer: Option<Waker>,
    /// Send waiting for the slot to clear.
    slot_waiter: Option<Waker>,
    /// Send waiting for its chunk to be handed off.
    ack_waiter: Option<Waker>,
    /// Producer watching for cancellation.
    cancel_watch: Option<Waker>,
}

fn register(slot: &mut Option<Waker>, waker: &Waker) {
    match slot {
        Some(current) if current.will_wake(waker) => {}
        _ => *slot = Some(waker.clone()),
    }
}

fn wake(waker: Option<Waker>) {
    if let Some(waker) = waker {
        waker.wake();
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Consumer side of the rendezvous.
    ///
    /// Priority: cancellation, then a latched error, then a waiting chunk,
    /// then clean completion.
    fn poll_take(&self, cx: &mut Context<'_>) -> Poll<Result<Option<Bytes>, BridgeError>> {
        let mut state = self.lock();

        if state.cancelled {
            return Poll::Ready(Err(BridgeError::Cancelled));
        }

        if let Some(err) = state.error.take() {
            state.failed = true;
            // A chunk still in the slot is never handed out after an error.
            state.chunk = None;
            let waiters = [state.slot_waiter.take(), state.ack_waiter.take()];
            drop(state);
            waiters.into_iter().for_each(wake);
            return Poll::Ready(Err(BridgeError::Source(err)));
        }

        if state.failed {
            return Poll::Ready(Err(BridgeError::SourceFailed));
        }

        if let Some(chunk) = state.chunk.take() {
            state.delivered = state.sent;
            log::trace!("handed off chunk #{} ({} bytes)", state.delivered, chunk.len());
            let waiters = [state.slot_waiter.take(), state.ack_waiter.take()];
            drop(state);
            waiters.into_iter().for_each(wake);
            return Poll::Ready(Ok(Some(chunk)));
        }

        if state.finished {
            return Poll::Ready(Ok(None));
        }

        register(&mut state.consumer, cx.waker());
        Poll::Pending
    }

    /// Place a chunk in the empty slot. Returns the chunk's sequence number.
    fn poll_put(
        &self,
        cx: &mut Context<'_>,
        chunk: &mut Option<Bytes>,
    ) -> Poll<Result<u64, SendError>> {
        let mut state = self.lock();

        if state.cancelled {
            return Poll::Ready(Err(SendError::Cancelled));
        }
        if state.finished || state.failed || state.error.is_some() {
            return Poll::Ready(Err(SendError::Closed));
        }
        if state.chunk.is_some() {
            register(&mut state.slot_waiter, cx.waker());
            return Poll::Pending;
        }

        state.chunk = chunk.take();
        state.sent += 1;
        let seq = state.sent;
        let consumer = state.consumer.take();
        drop(state);
        wake(consumer);
        Poll::Ready(Ok(seq))
    }

    /// Wait until chunk `seq` has been handed to the consumer.
    fn poll_ack(&self, cx: &mut Context<'_>, seq: u64) -> Poll<Result<(), SendError>> {
        let mut state = self.lock();

        if state.delivered >= seq {
            return Poll::Ready(Ok(()));
        }
        if state.cancelled {
            return Poll::Ready(Err(SendError::Cancelled));
        }
        if state.failed {
            return Poll::Ready(Err(SendError::Closed));
        }

        register(&mut state.ack_waiter, cx.waker());
        Poll::Pending
    }

    fn poll_cancelled(&self, cx: &mut Context<'_>) -> Poll<()> {
        let mut state = self.lock();
        if state.cancelled {
            return Poll::Ready(());
        }
        register(&mut state.cancel_watch, cx.waker());
        Poll::Pending
    }

    fn fail(&self, err: io::Error) {
        let mut state = self.lock();
        if state.cancelled || state.failed || state.error.is_some() {
            return;
        }
        state.error = Some(err);
        let consumer = state.consumer.take();
        drop(state);
        wake(consumer);
    }

    fn finish(&self) {
        let mut state = self.lock();
        if state.finished {
            return;
        }
        state.finished = true;
        let consumer = state.consumer.take();
        drop(state);
        wake(consumer);
    }

    /// Returns `true` if this call performed the cancellation.
    fn cancel(&self) -> bool {
        let mut state = self.lock();
        if state.cancelled {
            return false;
        }
        state.cancelled = true;
        state.chunk = None;
        let wakers = [
            state.slot_waiter.take(),
            state.ack_waiter.take(),
            state.cancel_watch.take(),
            state.consumer.take(),
        ];
        drop(state);
        wakers.into_iter().for_each(wake);
        true
    }

    fn is_cancelled(&self) -> bool {
        self.lock().cancelled
    }
}

/// Producer half of a chunk bridge.
///
/// A `send` waiting for the slot and a `send` waiting for its ack are
/// woken independently, so the next chunk may be offered from another
/// task while the previous one is still unacknowledged. Dropping the sink
/// without calling [`fail`](Self::fail) counts as a clean
/// [`finish`](Self::finish).
pub struct ChunkSink {
    shared: Arc<Shared>,
}

impl ChunkSink {
    /// Push one chunk and wait until the consumer has taken it.
    ///
    /// If the previous chunk is still in the slot (its `send` future was
    /// dropped before the handoff), this first waits for the slot to clear.
    ///
    /// # Errors
    ///
    /// - [`SendError::Cancelled`] if the consumer cancelled or dropped the
    ///   bridge; the chunk is discarded.
    /// - [`SendError::Closed`] if this sink already finished or failed.
    pub async fn send(&self, chunk: impl Into<Bytes>) -> Result<(), SendError> {
        let mut chunk = Some(chunk.into());
        let seq = poll_fn(|cx| self.shared.poll_put(cx, &mut chunk)).await?;
        poll_fn(|cx| self.shared.poll_ack(cx, seq)).await
    }

    /// Report an unrecoverable producer error.
    ///
    /// The error is handed to the consumer's current or next pull, ahead of
    /// any chunk still waiting in the slot. Only the first error is kept.
    pub fn fail(&self, err: io::Error) {
        self.shared.fail(err);
    }

    /// Signal that no more chunks will be sent.
    pub fn finish(&self) {
        self.shared.finish();
    }

    /// Resolves once the consumer cancels (or drops) the bridge.
    pub async fn cancelled(&self) {
        poll_fn(|cx| self.shared.poll_cancelled(cx)).await;
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.shared.is_cancelled()
    }
}

impl Drop for ChunkSink {
    fn drop(&mut self) {
        self.shared.finish();
    }
}

/// Consumer half of a chunk bridge.
///
/// Turns a push-based producer into a pull primitive with exactly one
/// chunk in flight. Dropping the bridge cancels it.
pub struct ChunkBridge {
    shared: Arc<Shared>,
    /// Task driving the producer, when the bridge owns one (see `pump`).
    pub(crate) pump: Option<JoinHandle<()>>,
}

impl ChunkBridge {
    /// Wait for the next chunk from the producer.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::Source`] with the producer's own error, delivered
    ///   once and ahead of any chunk waiting in the slot.
    /// - [`BridgeError::SourceFailed`] on every pull after that.
    /// - [`BridgeError::Cancelled`] after [`cancel`](Self::cancel).
    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>, BridgeError> {
        poll_fn(|cx| self.shared.poll_take(cx)).await
    }

    /// Detach from the producer and release it.
    ///
    /// Any chunk waiting in the slot is dropped, a pending `send` resolves
    /// with [`SendError::Cancelled`], and an owned pump task is aborted so
    /// its reader is dropped. Later calls are no-ops.
    pub fn cancel(&mut self) {
        if !self.shared.cancel() {
            return;
        }
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
        log::debug!("chunk bridge cancelled");
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.shared.is_cancelled()
    }
}

impl Drop for ChunkBridge {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl ChunkSource for ChunkBridge {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, BridgeError> {
        ChunkBridge::next_chunk(self).await
    }

    fn cancel(&mut self) {
        ChunkBridge::cancel(self);
    }
}

#[cfg(test)]
mod tests {
    use futures::poll;

    use super::*;

    fn stream_error() -> io::Error {
        io::Error::other("stream error")
    }

    #[test_log::test(tokio::test)]
    async fn chunks_arrive_in_order_then_none() {
        let (sink, mut bridge) = channel();
        let producer = tokio::spawn(async move {
            for chunk in ["a", "bc", "def"] {
                sink.send(chunk).await.unwrap();
            }
            sink.finish();
        });

        assert_eq!(bridge.next_chunk().await.unwrap().unwrap(), "a");
        assert_eq!(bridge.next_chunk().await.unwrap().unwrap(), "bc");
        assert_eq!(bridge.next_chunk().await.unwrap().unwrap(), "def");
        assert!(bridge.next_chunk().await.unwrap().is_none());
        // Completion is sticky
        assert!(bridge.next_chunk().await.unwrap().is_none());
        producer.await.unwrap();
    }

    #[tokio::test]
    async fn send_resolves_only_after_handoff() {
        let (sink, mut bridge) = channel();
        let mut send = Box::pin(sink.send("chunk"));

        // Chunk is in the slot but nobody has asked for it yet
        assert!(poll!(&mut send).is_pending());
        assert!(poll!(&mut send).is_pending());

        assert_eq!(bridge.next_chunk().await.unwrap().unwrap(), "chunk");
        assert_eq!(send.await, Ok(()));
    }

    #[tokio::test]
    async fn second_send_waits_for_slot() {
        let (sink, mut bridge) = channel();
        let mut first = Box::pin(sink.send("a"));
        let mut second = Box::pin(sink.send("b"));

        assert!(poll!(&mut first).is_pending());
        assert!(poll!(&mut second).is_pending());

        assert_eq!(bridge.next_chunk().await.unwrap().unwrap(), "a");
        assert_eq!(first.await, Ok(()));

        // "b" only enters the slot once its send is polled again
        assert!(poll!(&mut second).is_pending());
        assert_eq!(bridge.next_chunk().await.unwrap().unwrap(), "b");
        assert_eq!(second.await, Ok(()));
    }

    #[tokio::test]
    async fn sends_from_two_tasks_are_both_woken() {
        let (sink, mut bridge) = channel();
        let sink = Arc::new(sink);

        let first = tokio::spawn({
            let sink = Arc::clone(&sink);
            async move { sink.send("a").await }
        });
        tokio::task::yield_now().await;
        // "a" sits in the slot; this send waits for the slot to clear
        let second = tokio::spawn({
            let sink = Arc::clone(&sink);
            async move { sink.send("b").await }
        });
        tokio::task::yield_now().await;

        assert_eq!(bridge.next_chunk().await.unwrap().unwrap(), "a");
        assert_eq!(bridge.next_chunk().await.unwrap().unwrap(), "b");

        let both = tokio::time::timeout(std::time::Duration::from_secs(1), async {
            (first.await.unwrap(), second.await.unwrap())
        });
        assert_eq!(both.await.unwrap(), (Ok(()), Ok(())));
    }

    #[tokio::test]
    async fn request_waits_for_chunk() {
        let (sink, mut bridge) = channel();
        {
            let mut pull = Box::pin(bridge.next_chunk());
            assert!(poll!(&mut pull).is_pending());

            let mut send = Box::pin(sink.send("late"));
            assert!(poll!(&mut send).is_pending());

            assert_eq!(pull.await.unwrap().unwrap(), "late");
            assert_eq!(send.await, Ok(()));
        }
    }

    #[tokio::test]
    async fn error_takes_priority_over_waiting_chunk() {
        let (sink, mut bridge) = channel();
        let mut send = Box::pin(sink.send("never delivered"));
        assert!(poll!(&mut send).is_pending());

        sink.fail(stream_error());

        match bridge.next_chunk().await {
            Err(BridgeError::Source(err)) => assert_eq!(err.to_string(), "stream error"),
            other => panic!("expected source error, got {other:?}"),
        }
        assert_eq!(send.await, Err(SendError::Closed));
        assert!(matches!(
            bridge.next_chunk().await,
            Err(BridgeError::SourceFailed)
        ));
    }

    #[tokio::test]
    async fn error_latched_until_next_request() {
        let (sink, mut bridge) = channel();
        sink.fail(stream_error());
        // A second error is ignored
        sink.fail(io::Error::other("second"));
        drop(sink);

        match bridge.next_chunk().await {
            Err(BridgeError::Source(err)) => assert_eq!(err.to_string(), "stream error"),
            other => panic!("expected source error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn error_wakes_waiting_request() {
        let (sink, mut bridge) = channel();
        let consumer = tokio::spawn(async move { bridge.next_chunk().await });
        tokio::task::yield_now().await;

        sink.fail(stream_error());
        let result = consumer.await.unwrap();
        assert!(matches!(result, Err(BridgeError::Source(_))));
    }

    #[tokio::test]
    async fn dropped_sink_finishes() {
        let (sink, mut bridge) = channel();
        let consumer = tokio::spawn(async move { bridge.next_chunk().await });
        tokio::task::yield_now().await;

        drop(sink);
        assert!(consumer.await.unwrap().unwrap().is_none());
    }

    #[tokio::test]
    async fn send_after_finish_is_closed() {
        let (sink, _bridge) = channel();
        sink.finish();
        assert_eq!(sink.send("x").await, Err(SendError::Closed));
    }

    #[test_log::test(tokio::test)]
    async fn cancel_releases_producer_and_is_idempotent() {
        let (sink, mut bridge) = channel();
        let mut send = Box::pin(sink.send("pending"));
        assert!(poll!(&mut send).is_pending());

        bridge.cancel();
        bridge.cancel();

        assert!(bridge.is_cancelled());
        assert!(sink.is_cancelled());
        assert_eq!(send.await, Err(SendError::Cancelled));
        sink.cancelled().await;
        assert_eq!(sink.send("more").await, Err(SendError::Cancelled));
        assert!(matches!(
            bridge.next_chunk().await,
            Err(BridgeError::Cancelled)
        ));
    }

    #[tokio::test]
    async fn dropping_bridge_cancels() {
        let (sink, bridge) = channel();
        let watcher = tokio::spawn(async move {
            sink.cancelled().await;
            sink.is_cancelled()
        });
        tokio::task::yield_now().await;

        drop(bridge);
        assert!(watcher.await.unwrap());
    }
}
