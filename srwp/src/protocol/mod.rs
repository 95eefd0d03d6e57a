//! SRWP wire protocol.

pub mod frame;
pub mod response;

// Re-export common types
pub use frame::{Command, CommandFrame, MODE_ESCAPE};
pub use response::{Response, decode_size};
