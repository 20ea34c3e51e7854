use bytes::{Bytes, BytesMut};
use framejson_bridge::{ChunkBridge, ChunkSource};
use framejson_wire::charclass::{is_digit, is_whitespace};
use framejson_wire::length::{MAX_LENGTH_DIGITS, extend_digits, parse_length};
use framejson_wire::{Token, WireError};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::buffer::RollingBuffer;
use crate::config::{DecoderConfig, EndOfStream};
use crate::error::DecodeError;

/// Result of one successful pull from a [`FrameDecoder`].
///
/// `Value` carries a decoded message. `Done` means the stream ended
/// cleanly at a frame boundary and no further values will follow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Next<T> {
  Value(T),
  Done,
}

impl<T> Next<T> {
  #[must_use]
  pub fn is_done(&self) -> bool {
    matches!(self, Self::Done)
  }

  pub fn into_option(self) -> Option<T> {
    match self {
      Self::Value(value) => Some(value),
      Self::Done => None,
    }
  }

  pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Next<U> {
    match self {
      Self::Value(value) => Next::Value(f(value)),
      Self::Done => Next::Done,
    }
  }
}

impl<T> From<Next<T>> for Option<T> {
  fn from(next: Next<T>) -> Self {
    next.into_option()
  }
}

/// Asynchronous decoder for a stream of length-prefixed JSON messages.
///
/// Pulls chunks from a [`ChunkSource`] only when the caller awaits the
/// next value, so a slow consumer holds the producer back to at most
/// one chunk in flight.
///
/// Each call to [`next`](Self::next) runs the framing state machine once:
///
/// ```text
///   SkipLeadingWs ──▶ ReadLength ──▶ SkipSeparatorWs ──▶ ReadPayload ──▶ value
///        │ EOF            │ EOF              │ EOF              │ EOF
///        ▼                ▼                  ▼                  ▼
///      Done            error              error              error
/// ```
///
/// A payload may straddle any number of chunks, and one chunk may hold
/// pieces of several frames.
///
/// # Example
///
/// ```rust,no_run
/// use framejson_decoder::{FrameDecoder, Next};
/// use tokio::io::AsyncRead;
///
/// async fn print_all(reader: impl AsyncRead + Send + Unpin + 'static) {
///   let mut decoder = FrameDecoder::from_reader(reader);
///   while let Next::Value(value) = decoder.next().await.unwrap() {
///     println!("{value}");
///   }
/// }
/// ```
pub struct FrameDecoder<S = ChunkBridge> {
  source: S,
  buf: RollingBuffer,
  /// Digits of the length prefix being collected. Reused across frames.
  digits: Vec<u8>,
  config: DecoderConfig,
  state: SessionState,
  frames: u64,
}

/// Lifecycle of one decoding session.
///
/// ```text
///   Ready ⇄ InFrame ──▶ Failed
///     │                  ▲
///     ├──▶ Done          │ (next() after a dropped InFrame call)
///     └──▶ Cancelled
/// ```
///
/// `InFrame` begins at the first byte of a length prefix. It is only
/// observable from a later call if an earlier call was dropped after that
/// point; a call dropped while skipping whitespace leaves `Ready`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SessionState {
  Ready,
  InFrame,
  Done,
  Failed,
  Cancelled,
}

impl FrameDecoder<ChunkBridge> {
  /// Decode frames read from an async reader.
  ///
  /// Spawns the reader pump, so this must run inside a tokio runtime.
  pub fn from_reader<R>(reader: R) -> Self
  where
    R: tokio::io::AsyncRead + Send + Unpin + 'static,
  {
    Self::new(ChunkBridge::from_reader(reader))
  }

  /// Decode frames from a stream of byte chunks.
  ///
  /// Spawns the stream pump, so this must run inside a tokio runtime.
  pub fn from_stream<St>(stream: St) -> Self
  where
    St: futures::Stream<Item = std::io::Result<Bytes>> + Send + 'static,
  {
    Self::new(ChunkBridge::from_stream(stream))
  }
}

impl<S: ChunkSource> FrameDecoder<S> {
  #[must_use]
  pub fn new(source: S) -> Self {
    Self::with_config(source, DecoderConfig::default())
  }

  #[must_use]
  pub fn with_config(source: S, config: DecoderConfig) -> Self {
    Self {
      source,
      buf: RollingBuffer::default(),
      digits: Vec::with_capacity(MAX_LENGTH_DIGITS),
      config,
      state: SessionState::Ready,
      frames: 0,
    }
  }

  /// Read and parse the next message as a JSON value.
  ///
  /// Returns `Next::Value` for each message, `Next::Done` once the stream
  /// ended at a frame boundary (and on every call after that), or `Err`
  /// on any decode error.
  ///
  /// # Errors
  ///
  /// - [`DecodeError::Wire`] with [`WireError::InvalidLength`] if the
  ///   length prefix is empty or unparsable.
  /// - [`DecodeError::Wire`] with [`WireError::UnexpectedEof`] if the
  ///   stream ends inside a frame.
  /// - [`DecodeError::InvalidUtf8`] / [`DecodeError::InvalidJson`] for a
  ///   malformed payload.
  /// - [`DecodeError::PayloadTooLarge`] if the length exceeds the limit.
  /// - [`DecodeError::Bridge`] with the producer's error.
  /// - [`DecodeError::Terminated`] if an earlier call failed.
  pub async fn next(&mut self) -> Result<Next<Value>, DecodeError> {
    self.next_as().await
  }

  /// Like [`next`](Self::next), deserializing the payload into `T`.
  ///
  /// # Errors
  ///
  /// See [`next`](Self::next). A payload that is valid JSON but does not
  /// fit `T` is reported as [`DecodeError::InvalidJson`].
  pub async fn next_as<T: DeserializeOwned>(&mut self) -> Result<Next<T>, DecodeError> {
    let Some((offset, payload)) = self.next_frame().await? else {
      return Ok(Next::Done);
    };
    match parse_payload(&payload, offset) {
      Ok(value) => Ok(Next::Value(value)),
      Err(e) => {
        self.state = SessionState::Failed;
        Err(e)
      }
    }
  }

  /// Read the next frame's raw payload without parsing it.
  ///
  /// # Errors
  ///
  /// Framing and source errors as for [`next`](Self::next).
  pub async fn next_payload(&mut self) -> Result<Option<Bytes>, DecodeError> {
    Ok(self.next_frame().await?.map(|(_, payload)| payload))
  }

  /// Convenience accessor: the next value, or `None` at end of stream.
  ///
  /// # Errors
  ///
  /// See [`next`](Self::next).
  pub async fn read_value(&mut self) -> Result<Option<Value>, DecodeError> {
    Ok(self.next().await?.into_option())
  }

  /// Stop decoding and release the source.
  ///
  /// Safe to call at any point, including mid-frame, and more than once.
  /// Afterwards [`next`](Self::next) returns `Next::Done`, unless the
  /// session had already failed: that stays reported as
  /// [`DecodeError::Terminated`].
  pub fn cancel(&mut self) {
    if self.state == SessionState::Cancelled {
      return;
    }
    self.source.cancel();
    self.buf.release();
    if self.state != SessionState::Failed {
      self.state = SessionState::Cancelled;
    }
    log::debug!("decoder cancelled after {} frames", self.frames);
  }

  /// Number of frames decoded so far.
  #[must_use]
  pub fn frames_decoded(&self) -> u64 {
    self.frames
  }

  /// Stream offset of the next unread byte.
  #[must_use]
  pub fn offset(&self) -> u64 {
    self.buf.offset()
  }

  #[must_use]
  pub fn config(&self) -> &DecoderConfig {
    &self.config
  }

  /// Run the state machine once, tracking the session state around it.
  ///
  /// Returns the frame's start offset alongside its payload.
  async fn next_frame(&mut self) -> Result<Option<(u64, Bytes)>, DecodeError> {
    match self.state {
      SessionState::Ready => {}
      SessionState::Done | SessionState::Cancelled => return Ok(None),
      SessionState::Failed => return Err(DecodeError::Terminated),
      SessionState::InFrame => {
        self.state = SessionState::Failed;
        return Err(DecodeError::Interrupted);
      }
    }

    match self.read_frame().await {
      Ok(Some(frame)) => {
        self.state = SessionState::Ready;
        self.frames += 1;
        log::debug!(
          "decoded frame #{} ({} bytes at offset {})",
          self.frames,
          frame.1.len(),
          frame.0
        );
        Ok(Some(frame))
      }
      Ok(None) => {
        self.state = SessionState::Done;
        log::debug!("stream ended cleanly after {} frames", self.frames);
        Ok(None)
      }
      Err(e) => {
        self.state = SessionState::Failed;
        Err(e)
      }
    }
  }

  async fn read_frame(&mut self) -> Result<Option<(u64, Bytes)>, DecodeError> {
    // 1. Leading whitespace: the only place the stream may end
    if !self.skip_whitespace().await? {
      return match self.config.end_of_stream {
        EndOfStream::Lenient => Ok(None),
        EndOfStream::Strict => Err(self.eof(Token::Boundary)),
      };
    }
    // Only whitespace has been consumed so far; a call dropped before
    // this point leaves the session at a clean boundary
    self.state = SessionState::InFrame;
    let start = self.buf.offset();

    // 2. Length prefix
    let length = self.read_length().await?;
    if length > self.config.max_payload_len {
      return Err(DecodeError::PayloadTooLarge {
        length,
        limit: self.config.max_payload_len,
      });
    }

    // 3. Separator whitespace
    if !self.skip_whitespace().await? {
      return Err(self.eof(Token::Separator));
    }

    // 4. Payload
    let payload = self.read_payload(length).await?;
    Ok(Some((start, payload)))
  }

  /// Pull the next non-empty chunk. Returns `false` at end of input.
  async fn pull(&mut self) -> Result<bool, DecodeError> {
    loop {
      match self.source.next_chunk().await? {
        Some(chunk) if chunk.is_empty() => {}
        Some(chunk) => {
          log::trace!("pulled {} bytes at offset {}", chunk.len(), self.buf.offset());
          self.buf.refill(chunk);
          return Ok(true);
        }
        None => return Ok(false),
      }
    }
  }

  /// Skip whitespace, pulling as needed. Returns `false` if input ended
  /// before a non-whitespace byte was seen.
  async fn skip_whitespace(&mut self) -> Result<bool, DecodeError> {
    loop {
      self.buf.take_run(is_whitespace);
      if !self.buf.is_exhausted() {
        return Ok(true);
      }
      if !self.pull().await? {
        return Ok(false);
      }
    }
  }

  /// Collect the digit run, pulling as needed, and parse it.
  async fn read_length(&mut self) -> Result<usize, DecodeError> {
    let start = self.buf.offset();
    self.digits.clear();

    loop {
      let run = self.buf.take_run(is_digit);
      extend_digits(&mut self.digits, run);
      if self.digits.len() > MAX_LENGTH_DIGITS {
        return Err(
          WireError::InvalidLength {
            digits: String::from_utf8_lossy(&self.digits).into_owned(),
            offset: start,
          }
          .into(),
        );
      }
      if !self.buf.is_exhausted() {
        break;
      }
      if !self.pull().await? {
        return Err(self.eof(Token::LengthPrefix));
      }
    }

    Ok(parse_length(&self.digits, start)?)
  }

  /// Read exactly `length` payload bytes.
  ///
  /// A payload that lies inside the current chunk is returned without
  /// copying; otherwise the pieces are concatenated.
  async fn read_payload(&mut self, length: usize) -> Result<Bytes, DecodeError> {
    if self.buf.remaining() >= length {
      return Ok(self.buf.take(length));
    }

    let mut payload = BytesMut::with_capacity(length);
    while payload.len() < length {
      if self.buf.is_exhausted() && !self.pull().await? {
        return Err(self.eof(Token::Payload));
      }
      let n = (length - payload.len()).min(self.buf.remaining());
      payload.extend_from_slice(&self.buf.take(n));
    }
    Ok(payload.freeze())
  }

  fn eof(&self, token: Token) -> DecodeError {
    WireError::UnexpectedEof {
      token,
      offset: self.buf.offset(),
    }
    .into()
  }
}

/// Decode a payload as UTF-8 JSON. `offset` is where the frame started.
pub(crate) fn parse_payload<T: DeserializeOwned>(
  payload: &[u8],
  offset: u64,
) -> Result<T, DecodeError> {
  let text = std::str::from_utf8(payload).map_err(|_| DecodeError::InvalidUtf8 { offset })?;
  Ok(serde_json::from_str(text)?)
}
