//! # srwp
//!
//! Host-side client for the Serial Read/Write Protocol (SRWP) spoken by
//! FRAM-backed USB devices such as Blaustahl and Kaltstahl.
//!
//! The crate is layered bottom-up:
//!
//! - [`port`]: byte transport with flush, write and best-effort read
//! - [`device`]: finding the device path
//! - [`protocol`]: command frames and response classification
//! - [`client`]: one request/response exchange per command
//! - [`transfer`]: chunked whole-device reads with retries, writes, verify
//! - [`session`]: an opened device with a known memory size
//!
//! ## Features
//!
//! - `native` (default): serial ports via the `serialport` crate
//!
//! ## Example
//!
//! ```rust,no_run
//! use srwp::{Session, SessionConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut session = Session::open(&SessionConfig::default())?;
//!
//!     let backup = session.read_whole_device()?;
//!     std::fs::write("fram.bin", &backup)?;
//!
//!     session.write(0, b"hello")?;
//!     println!("Empty: {}", session.is_empty()?);
//!
//!     session.close()?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

use std::sync::{Arc, OnceLock};

pub mod client;
pub mod device;
pub mod error;
pub mod port;
pub mod protocol;
pub mod session;
pub mod transfer;

static INTERRUPT_CHECKER: OnceLock<Arc<dyn Fn() -> bool + Send + Sync>> = OnceLock::new();

/// Register a global interruption checker polled between transfer chunks.
///
/// The checker should return `true` when the current operation should stop
/// (for example after receiving Ctrl-C in CLI applications). Only the first
/// registration takes effect.
pub fn set_interrupt_checker<F>(checker: F)
where
    F: Fn() -> bool + Send + Sync + 'static,
{
    let _ = INTERRUPT_CHECKER.set(Arc::new(checker));
}

/// Returns whether interruption was requested by the embedding application.
#[must_use]
pub fn is_interrupted_requested() -> bool {
    INTERRUPT_CHECKER
        .get()
        .is_some_and(|checker| checker())
}

#[cfg(feature = "native")]
pub use port::NativePort;
pub use {
    client::Srwp,
    device::{Discovery, GlobDiscovery, discover, discover_with, select_single},
    error::{Error, Result},
    port::{Port, SerialConfig},
    protocol::{Command, CommandFrame, Response},
    session::{Session, SessionConfig, model_name},
    transfer::{ChunkedWriteReport, FailedChunk, Mismatch, Transfer, TransferConfig},
};
