#![warn(clippy::pedantic)]

pub mod charclass;
pub mod error;
pub mod frame;
pub mod length;

pub use error::{Token, WireError};
pub use frame::Frame;
