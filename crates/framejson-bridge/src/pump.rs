//! Tasks that drive a [`ChunkSink`] from an async byte source.
//!
//! The pump owns the source. When the consumer cancels, the pump task is
//! aborted and the source is dropped with it, which closes files and
//! sockets.

use std::io;
use std::pin::pin;

use bytes::{BufMut, Bytes, BytesMut};
use futures::{Stream, StreamExt};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::bridge::{ChunkBridge, ChunkSink, channel};

/// Default number of bytes requested per read.
pub const DEFAULT_READ_CAPACITY: usize = 8 * 1024;

impl ChunkBridge {
    /// Bridge an [`AsyncRead`] source. Must be called within a tokio runtime.
    ///
    /// ```rust,no_run
    /// use framejson_bridge::ChunkBridge;
    ///
    /// # async fn demo() -> std::io::Result<()> {
    /// let file = tokio::fs::File::open("responses.log").await?;
    /// let mut bridge = ChunkBridge::from_reader(file);
    /// while let Some(chunk) = bridge.next_chunk().await.map_err(std::io::Error::other)? {
    ///     println!("{} bytes", chunk.len());
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_reader<R>(reader: R) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        Self::from_reader_with_capacity(reader, DEFAULT_READ_CAPACITY)
    }

    /// Like [`from_reader`](Self::from_reader), reading at most `capacity`
    /// bytes per chunk.
    pub fn from_reader_with_capacity<R>(reader: R, capacity: usize) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let (sink, mut bridge) = channel();
        bridge.pump = Some(tokio::spawn(pump_reader(reader, sink, capacity.max(1))));
        bridge
    }

    /// Bridge a stream of byte chunks. Must be called within a tokio runtime.
    ///
    /// The first `Err` item fails the bridge; the end of the stream
    /// finishes it.
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = io::Result<Bytes>> + Send + 'static,
    {
        let (sink, mut bridge) = channel();
        bridge.pump = Some(tokio::spawn(pump_stream(stream, sink)));
        bridge
    }
}

async fn pump_reader<R>(mut reader: R, sink: ChunkSink, capacity: usize)
where
    R: AsyncRead + Unpin,
{
    let mut buf = BytesMut::with_capacity(capacity);
    loop {
        buf.reserve(capacity);
        // `reserve` may leave more spare room than asked for
        let mut window = (&mut buf).limit(capacity);
        let read = tokio::select! {
            () = sink.cancelled() => return,
            read = reader.read_buf(&mut window) => read,
        };

        match read {
            Ok(0) => {
                log::trace!("reader exhausted");
                sink.finish();
                return;
            }
            Ok(_) => {
                if sink.send(buf.split().freeze()).await.is_err() {
                    return;
                }
            }
            Err(err) => {
                log::warn!("chunk reader failed: {err}");
                sink.fail(err);
                return;
            }
        }
    }
}

async fn pump_stream<S>(stream: S, sink: ChunkSink)
where
    S: Stream<Item = io::Result<Bytes>>,
{
    let mut stream = pin!(stream);
    loop {
        let item = tokio::select! {
            () = sink.cancelled() => return,
            item = stream.next() => item,
        };

        match item {
            Some(Ok(chunk)) => {
                if sink.send(chunk).await.is_err() {
                    return;
                }
            }
            Some(Err(err)) => {
                log::warn!("chunk stream failed: {err}");
                sink.fail(err);
                return;
            }
            None => {
                sink.finish();
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::pin::Pin;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::task::{Context, Poll};

    use tokio::io::ReadBuf;

    use super::*;
    use crate::error::BridgeError;

    /// Reader that never produces data and records when it is dropped.
    struct PendingReader {
        dropped: Arc<AtomicBool>,
    }

    impl AsyncRead for PendingReader {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            Poll::Pending
        }
    }

    impl Drop for PendingReader {
        fn drop(&mut self) {
            self.dropped.store(true, Ordering::SeqCst);
        }
    }

    #[test_log::test(tokio::test)]
    async fn reader_chunks_respect_capacity() {
        let mut bridge = ChunkBridge::from_reader_with_capacity(&b"hello world"[..], 4);

        let mut collected = Vec::new();
        while let Some(chunk) = bridge.next_chunk().await.unwrap() {
            assert!((1..=4).contains(&chunk.len()), "chunk of {} bytes", chunk.len());
            collected.extend_from_slice(&chunk);
        }
        assert_eq!(collected, b"hello world");
    }

    #[tokio::test]
    async fn stream_error_is_passed_through() {
        let items = vec![
            Ok(Bytes::from_static(b"12")),
            Err(io::Error::other("stream error")),
        ];
        let mut bridge = ChunkBridge::from_stream(futures::stream::iter(items));

        assert_eq!(bridge.next_chunk().await.unwrap().unwrap(), "12");
        match bridge.next_chunk().await {
            Err(BridgeError::Source(err)) => assert_eq!(err.to_string(), "stream error"),
            other => panic!("expected source error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn cancel_drops_reader() {
        let dropped = Arc::new(AtomicBool::new(false));
        let mut bridge = ChunkBridge::from_reader(PendingReader {
            dropped: Arc::clone(&dropped),
        });
        tokio::task::yield_now().await;
        assert!(!dropped.load(Ordering::SeqCst));

        bridge.cancel();
        bridge.cancel();

        // The aborted task drops its future on the next scheduler turn
        for _ in 0..10 {
            if dropped.load(Ordering::SeqCst) {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(dropped.load(Ordering::SeqCst));
    }
}
