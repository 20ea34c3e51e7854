use bytes::Bytes;
use framejson_wire::charclass::run_length;

/// The decoder's view of the current chunk.
///
/// ```text
///   base              base + pos              base + chunk.len()
///    │ consumed bytes   │ unread bytes            │
///    ▼                  ▼                         ▼
///    ├──────────────────┼─────────────────────────┤
/// ```
///
/// Invariant: `pos <= chunk.len()`. Bytes before `pos` are never read
/// again. When `pos == chunk.len()` the buffer is exhausted and the next
/// chunk has to be pulled before any byte can be classified.
#[derive(Debug, Default)]
pub(crate) struct RollingBuffer {
    chunk: Bytes,
    pos: usize,
    /// Stream offset of `chunk[0]`.
    base: u64,
}

impl RollingBuffer {
    pub(crate) fn is_exhausted(&self) -> bool {
        self.pos == self.chunk.len()
    }

    pub(crate) fn remaining(&self) -> usize {
        self.chunk.len() - self.pos
    }

    /// Absolute stream offset of the next unread byte.
    pub(crate) fn offset(&self) -> u64 {
        self.base + self.pos as u64
    }

    /// Replace the (exhausted) chunk with the next one.
    pub(crate) fn refill(&mut self, chunk: Bytes) {
        debug_assert!(self.is_exhausted());
        self.base += self.chunk.len() as u64;
        self.chunk = chunk;
        self.pos = 0;
    }

    /// Drop the current chunk without moving the stream offset.
    pub(crate) fn release(&mut self) {
        self.base = self.offset();
        self.chunk = Bytes::new();
        self.pos = 0;
    }

    /// Consume the longest run of bytes in `class` and return it.
    pub(crate) fn take_run(&mut self, class: fn(u8) -> bool) -> &[u8] {
        let start = self.pos;
        self.pos += run_length(&self.chunk[start..], class);
        &self.chunk[start..self.pos]
    }

    /// Consume exactly `n` bytes. The returned `Bytes` shares the chunk's
    /// allocation.
    ///
    /// # Panics
    ///
    /// Panics if `n > self.remaining()`.
    pub(crate) fn take(&mut self, n: usize) -> Bytes {
        let out = self.chunk.slice(self.pos..self.pos + n);
        self.pos += n;
        out
    }
}

#[cfg(test)]
mod tests {
    use framejson_wire::charclass::{is_digit, is_whitespace};

    use super::*;

    #[test]
    fn offsets_accumulate_across_chunks() {
        let mut buf = RollingBuffer::default();
        assert!(buf.is_exhausted());

        buf.refill(Bytes::from_static(b"  37"));
        assert_eq!(buf.take_run(is_whitespace), b"  ");
        assert_eq!(buf.take_run(is_digit), b"37");
        assert!(buf.is_exhausted());
        assert_eq!(buf.offset(), 4);

        buf.refill(Bytes::from_static(b"{}"));
        assert_eq!(buf.offset(), 4);
        assert_eq!(buf.take(2), "{}");
        assert_eq!(buf.offset(), 6);
    }

    #[test]
    fn take_run_stops_inside_chunk() {
        let mut buf = RollingBuffer::default();
        buf.refill(Bytes::from_static(b"13 {"));
        assert_eq!(buf.take_run(is_digit), b"13");
        assert!(!buf.is_exhausted());
        assert_eq!(buf.remaining(), 2);
        assert!(buf.take_run(is_digit).is_empty());
    }

    #[test]
    fn release_keeps_offset() {
        let mut buf = RollingBuffer::default();
        buf.refill(Bytes::from_static(b"abcdef"));
        buf.take(2);
        buf.release();
        assert!(buf.is_exhausted());
        assert_eq!(buf.offset(), 2);
    }
}
