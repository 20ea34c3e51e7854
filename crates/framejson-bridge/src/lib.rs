#![warn(clippy::pedantic)]

pub mod bridge;
pub mod error;
pub mod memory;
pub mod pump;
pub mod source;

pub use bridge::{ChunkBridge, ChunkSink, channel};
pub use error::{BridgeError, SendError};
pub use memory::MemoryChunks;
pub use source::ChunkSource;
