//! Port abstraction for serial communication with SRWP devices.
//!
//! The protocol layers above only talk to the [`Port`] trait, so the same
//! command and transfer code runs against a real serial device
//! ([`NativePort`]) or any other byte stream that can report pending input.
//!
//! ```text
//! +------------------+
//! | Session / Bulk   |
//! +--------+---------+
//!          |
//! +--------+---------+
//! | Command ops      |
//! +--------+---------+
//!          |
//! +--------+---------+
//! |   Port Trait     |
//! +--------+---------+
//!          |
//! +--------+---------+
//! | Native SerialPort|
//! |   (serialport)   |
//! +------------------+
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use srwp::port::Port;
//!
//! fn example<P: Port>(port: &mut P) -> srwp::Result<()> {
//!     port.flush_input()?;
//!     port.write_all_bytes(&[0x00, 0x0A])?;
//!     let reply = port.read_available(4)?;
//!     println!("Received: {reply:02X?}");
//!     Ok(())
//! }
//! ```

#[cfg(feature = "native")]
pub mod native;

#[cfg(test)]
pub(crate) mod sim;

use {
    crate::error::Result,
    log::{debug, trace},
    std::{
        io::{ErrorKind, Read, Write},
        time::{Duration, Instant},
    },
};

/// Baud rate used by SRWP devices.
pub const DEFAULT_BAUD: u32 = 115200;

/// Read timeout for a single response.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);

/// Maximum number of stale bytes discarded per read while flushing input.
const FLUSH_BLOCK_SIZE: usize = 4096;

/// Serial port configuration.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Port name/path (e.g., "/dev/ttyACM0", "COM3").
    pub port_name: String,
    /// Baud rate.
    pub baud_rate: u32,
    /// Read/write timeout.
    pub timeout: Duration,
    /// Data bits (typically 8).
    pub data_bits: DataBits,
    /// Parity (typically None).
    pub parity: Parity,
    /// Stop bits (typically One).
    pub stop_bits: StopBits,
    /// Flow control (typically None).
    pub flow_control: FlowControl,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port_name: String::new(),
            baud_rate: DEFAULT_BAUD,
            timeout: DEFAULT_TIMEOUT,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            flow_control: FlowControl::None,
        }
    }
}

impl SerialConfig {
    /// Create a new configuration for the given port with SRWP line settings.
    pub fn new(port_name: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            ..Default::default()
        }
    }

    /// Set the timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the baud rate.
    #[must_use]
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }
}

/// Number of data bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataBits {
    /// 7 data bits.
    Seven,
    /// 8 data bits.
    #[default]
    Eight,
}

/// Parity checking mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Parity {
    /// No parity.
    #[default]
    None,
    /// Odd parity.
    Odd,
    /// Even parity.
    Even,
}

/// Number of stop bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopBits {
    /// 1 stop bit.
    #[default]
    One,
    /// 2 stop bits.
    Two,
}

/// Flow control mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlowControl {
    /// No flow control.
    #[default]
    None,
    /// Hardware flow control (RTS/CTS).
    Hardware,
}

/// Byte transport used by the SRWP command layer.
///
/// Implementors provide raw I/O through [`Read`]/[`Write`] plus a way to ask
/// how many bytes are already waiting. The provided methods build the
/// transport contract on top of that: flushing stale input, writing a whole
/// request and reading a best-effort response within the timeout window.
pub trait Port: Read + Write + Send {
    /// Set the read timeout.
    fn set_timeout(&mut self, timeout: Duration) -> Result<()>;

    /// Get the current read timeout.
    fn timeout(&self) -> Duration;

    /// Get the current baud rate.
    fn baud_rate(&self) -> u32;

    /// Number of bytes received but not yet read.
    fn bytes_to_read(&mut self) -> Result<usize>;

    /// Get the port name/path.
    fn name(&self) -> &str;

    /// Close the port and release resources.
    ///
    /// After calling this method, the port cannot be used for further I/O.
    fn close(&mut self) -> Result<()>;

    /// Write all bytes and flush them onto the line.
    fn write_all_bytes(&mut self, buf: &[u8]) -> Result<()> {
        trace!("TX {} bytes: {:02X?}", buf.len(), buf);
        Write::write_all(self, buf)?;
        Write::flush(self)?;
        Ok(())
    }

    /// Drain and discard everything currently buffered on the input side.
    ///
    /// Returns the number of discarded bytes.
    fn flush_input(&mut self) -> Result<usize> {
        let mut discarded = 0;
        loop {
            let pending = self.bytes_to_read()?;
            if pending == 0 {
                break;
            }

            let mut buf = vec![0u8; pending.min(FLUSH_BLOCK_SIZE)];
            match self.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    debug!("Flushed stale data: {:02X?}", &buf[..n]);
                    discarded += n;
                },
                Err(e) if e.kind() == ErrorKind::TimedOut => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => {},
                Err(e) => return Err(e.into()),
            }
        }
        Ok(discarded)
    }

    /// Read up to `len` bytes, returning whatever arrived before the timeout.
    ///
    /// The result may be shorter than `len`; callers must check its length.
    fn read_available(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        let mut filled = 0;
        let deadline = Instant::now() + self.timeout();

        while filled < len && Instant::now() < deadline {
            match self.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::TimedOut => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => {},
                Err(e) => return Err(e.into()),
            }
        }

        buf.truncate(filled);
        trace!("RX {filled}/{len} bytes");
        Ok(buf)
    }
}

impl<P: Port + ?Sized> Port for Box<P> {
    fn set_timeout(&mut self, timeout: Duration) -> Result<()> {
        (**self).set_timeout(timeout)
    }

    fn timeout(&self) -> Duration {
        (**self).timeout()
    }

    fn baud_rate(&self) -> u32 {
        (**self).baud_rate()
    }

    fn bytes_to_read(&mut self) -> Result<usize> {
        (**self).bytes_to_read()
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

// Re-export the native implementation
#[cfg(feature = "native")]
pub use native::NativePort;
