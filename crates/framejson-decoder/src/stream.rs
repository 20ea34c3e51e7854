use futures::Stream;
use serde::de::DeserializeOwned;
use serde_json::Value;

use framejson_bridge::ChunkSource;

use crate::decoder::{FrameDecoder, Next};
use crate::error::DecodeError;

impl<S: ChunkSource> FrameDecoder<S> {
  /// Turn the decoder into a [`Stream`] of JSON values.
  ///
  /// The stream ends after the last value or after the first error,
  /// which is yielded as the final item. Values are only pulled from the
  /// source as the stream is polled.
  ///
  /// ```rust,no_run
  /// use futures::TryStreamExt;
  /// use framejson_decoder::FrameDecoder;
  ///
  /// # async fn demo() -> Result<(), framejson_decoder::DecodeError> {
  /// let file = tokio::fs::File::open("responses.log").await.unwrap();
  /// let values: Vec<_> = FrameDecoder::from_reader(file).into_stream().try_collect().await?;
  /// # Ok(())
  /// # }
  /// ```
  pub fn into_stream(self) -> impl Stream<Item = Result<Value, DecodeError>> {
    self.into_typed_stream()
  }

  /// Like [`into_stream`](Self::into_stream), deserializing each payload
  /// into `T`.
  pub fn into_typed_stream<T: DeserializeOwned>(self) -> impl Stream<Item = Result<T, DecodeError>> {
    futures::stream::unfold(Some(self), |decoder| async move {
      let mut decoder = decoder?;
      match decoder.next_as::<T>().await {
        Ok(Next::Value(value)) => Some((Ok(value), Some(decoder))),
        Ok(Next::Done) => None,
        Err(e) => Some((Err(e), None)),
      }
    })
  }
}
