#![warn(clippy::pedantic)]

pub mod config;
pub mod decoder;
pub mod error;
pub mod slice;
pub mod stream;

mod buffer;

pub use config::{DecoderConfig, EndOfStream};
pub use decoder::{FrameDecoder, Next};
pub use error::DecodeError;
pub use slice::{decode_slice, decode_slice_as};

pub use framejson_bridge::{
    BridgeError, ChunkBridge, ChunkSink, ChunkSource, MemoryChunks, SendError, channel,
};
pub use framejson_wire::{Frame, Token, WireError};
