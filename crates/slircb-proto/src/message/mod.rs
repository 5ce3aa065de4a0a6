//! IRC message model: type, parsing, serialization, and constructors.

mod parse;
mod serialize;
mod types;

pub use types::Message;
