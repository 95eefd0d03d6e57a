//! SRWP command frames.
//!
//! ## Frame Format
//!
//! ```text
//! +--------+-----+----------------------------------+
//! | Escape | CMD |            Parameters            |
//! +--------+-----+----------------------------------+
//! | 1 byte | 1   | u32 LE fields, then payload      |
//! +--------+-----+----------------------------------+
//! |  0x00  | id  | see table below                  |
//! +--------+-----+----------------------------------+
//! ```
//!
//! | Command     | Bytes                         | Response            |
//! |-------------|-------------------------------|---------------------|
//! | Echo        | `00 00 <len:4> <ascii bytes>` | `len` bytes         |
//! | Read        | `00 01 <addr:4> <size:4>`     | up to `size` bytes  |
//! | Write       | `00 02 <addr:4> <len:4> <data>` | none              |
//! | Read size   | `00 0A`                       | 4 bytes, LE size    |
//! | Update mode | `19`                          | none                |

use {
    crate::error::{Error, Result},
    byteorder::{LittleEndian, WriteBytesExt},
};

/// Byte that switches the device into SRWP command mode.
pub const MODE_ESCAPE: u8 = 0x00;

/// Length of the size reply.
pub const SIZE_RESPONSE_LEN: usize = 4;

/// SRWP command set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    /// Echo the payload back (0x00).
    Echo = 0x00,
    /// Read a memory region (0x01).
    Read = 0x01,
    /// Write a memory region (0x02).
    Write = 0x02,
    /// Query the memory size (0x0A).
    ReadSize = 0x0A,
    /// Enter firmware update mode (0x19), sent without escape.
    EnterUpdateMode = 0x19,
}

impl Command {
    /// Get the command id byte.
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Whether the command is prefixed with [`MODE_ESCAPE`].
    pub fn is_escaped(self) -> bool {
        !matches!(self, Self::EnterUpdateMode)
    }
}

/// Encoded request ready to be put on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFrame {
    cmd: Command,
    params: Vec<u8>,
    response_len: usize,
}

impl CommandFrame {
    fn new(cmd: Command) -> Self {
        Self {
            cmd,
            params: Vec::new(),
            response_len: 0,
        }
    }

    fn push_u32(&mut self, value: u32) {
        // Writing to Vec<u8> cannot fail
        let _ = self
            .params
            .write_u32::<LittleEndian>(value);
    }

    /// Create an echo frame.
    ///
    /// The message must be ASCII.
    pub fn echo(message: &str) -> Result<Self> {
        if !message.is_ascii() {
            return Err(Error::invalid_input("echo message must be ASCII"));
        }
        let len = wire_len(message.len())?;

        let mut frame = Self::new(Command::Echo);
        frame.push_u32(len);
        frame
            .params
            .extend_from_slice(message.as_bytes());
        frame.response_len = message.len();
        Ok(frame)
    }

    /// Create a read frame for `size` bytes at `address`.
    pub fn read(address: u32, size: u32) -> Self {
        let mut frame = Self::new(Command::Read);
        frame.push_u32(address);
        frame.push_u32(size);
        frame.response_len = size as usize;
        frame
    }

    /// Create a write frame storing `data` at `address`.
    pub fn write(address: u32, data: &[u8]) -> Result<Self> {
        let len = wire_len(data.len())?;

        let mut frame = Self::new(Command::Write);
        frame.push_u32(address);
        frame.push_u32(len);
        frame
            .params
            .extend_from_slice(data);
        Ok(frame)
    }

    /// Create a size query frame.
    pub fn read_size() -> Self {
        let mut frame = Self::new(Command::ReadSize);
        frame.response_len = SIZE_RESPONSE_LEN;
        frame
    }

    /// Create the update-mode frame.
    pub fn enter_update_mode() -> Self {
        Self::new(Command::EnterUpdateMode)
    }

    /// Build the complete frame data.
    pub fn build(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(2 + self.params.len());
        if self.cmd.is_escaped() {
            buf.push(MODE_ESCAPE);
        }
        buf.push(self.cmd.id());
        buf.extend_from_slice(&self.params);
        buf
    }

    /// Get the command type.
    pub fn command(&self) -> Command {
        self.cmd
    }

    /// Number of bytes the device answers with (0 when no reply is expected).
    pub fn response_len(&self) -> usize {
        self.response_len
    }
}

fn wire_len(len: usize) -> Result<u32> {
    u32::try_from(len)
        .map_err(|_| Error::invalid_input(format!("{len} bytes do not fit a 32-bit length field")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_echo_frame() {
        let data = CommandFrame::echo("hi").unwrap().build();
        assert_eq!(data, [0x00, 0x00, 0x02, 0x00, 0x00, 0x00, b'h', b'i']);
    }

    #[test]
    fn test_echo_rejects_non_ascii() {
        assert!(matches!(
            CommandFrame::echo("grüße"),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_read_frame() {
        let frame = CommandFrame::read(0x0000_1234, 100);
        assert_eq!(
            frame.build(),
            [0x00, 0x01, 0x34, 0x12, 0x00, 0x00, 0x64, 0x00, 0x00, 0x00]
        );
        assert_eq!(frame.response_len(), 100);
    }

    #[test]
    fn test_write_frame() {
        let frame = CommandFrame::write(8, &[0xDE, 0xAD]).unwrap();
        assert_eq!(
            frame.build(),
            [0x00, 0x02, 0x08, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0xDE, 0xAD]
        );
        assert_eq!(frame.response_len(), 0);
    }

    #[test]
    fn test_read_size_frame() {
        let frame = CommandFrame::read_size();
        assert_eq!(frame.build(), [0x00, 0x0A]);
        assert_eq!(frame.response_len(), 4);
    }

    #[test]
    fn test_update_mode_frame_has_no_escape() {
        let frame = CommandFrame::enter_update_mode();
        assert_eq!(frame.build(), [0x19]);
        assert_eq!(frame.response_len(), 0);
    }

    #[test]
    fn test_escape_byte_leads_every_multi_byte_frame() {
        let frames = [
            CommandFrame::echo("x").unwrap(),
            CommandFrame::read(0, 1),
            CommandFrame::write(0, &[1]).unwrap(),
            CommandFrame::read_size(),
        ];
        for frame in frames {
            let data = frame.build();
            assert!(data.len() >= 2);
            assert_eq!(data[0], MODE_ESCAPE, "{:?}", frame.command());
            assert_eq!(data[1], frame.command().id());
        }
    }

    #[test]
    fn test_command_ids() {
        assert_eq!(Command::Echo.id(), 0x00);
        assert_eq!(Command::Read.id(), 0x01);
        assert_eq!(Command::Write.id(), 0x02);
        assert_eq!(Command::ReadSize.id(), 0x0A);
        assert_eq!(Command::EnterUpdateMode.id(), 0x19);
        assert!(!Command::EnterUpdateMode.is_escaped());
    }
}
