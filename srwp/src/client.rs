//! Single-exchange SRWP commands.
//!
//! Every method performs exactly one flush → encode → send → receive cycle.
//! The protocol has no request identifiers, so the client must own its port
//! exclusively and requests are never interleaved.

use {
    crate::{
        error::{Error, Result},
        port::Port,
        protocol::{CommandFrame, Response, decode_size},
    },
    log::{debug, trace},
};

/// SRWP command client over a port.
pub struct Srwp<P: Port> {
    port: P,
}

impl<P: Port> Srwp<P> {
    /// Create a client over an opened port.
    pub fn new(port: P) -> Self {
        Self { port }
    }

    /// Get a reference to the underlying port.
    pub fn port(&self) -> &P {
        &self.port
    }

    /// Get a mutable reference to the underlying port.
    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    /// Consume the client and return the underlying port.
    pub fn into_port(self) -> P {
        self.port
    }

    /// Send a frame and collect its reply.
    fn exchange(&mut self, frame: &CommandFrame) -> Result<Response> {
        let stale = self.port.flush_input()?;
        if stale > 0 {
            debug!("Discarded {stale} stale bytes before {:?}", frame.command());
        }

        let data = frame.build();
        trace!(
            "Sending command {:?}: {} bytes",
            frame.command(),
            data.len()
        );
        self.port.write_all_bytes(&data)?;

        let expected = frame.response_len();
        if expected == 0 {
            return Ok(Response::Complete(Vec::new()));
        }

        let reply = self.port.read_available(expected)?;
        Ok(Response::from_read(reply, expected))
    }

    /// Send an ASCII message and read back what the device echoes.
    pub fn echo(&mut self, message: &str) -> Result<Response> {
        self.exchange(&CommandFrame::echo(message)?)
    }

    /// Read `size` bytes starting at `address`.
    ///
    /// A short reply is returned as [`Response::Partial`]; deciding whether
    /// to retry is up to the caller.
    pub fn read(&mut self, address: u32, size: u32) -> Result<Response> {
        self.exchange(&CommandFrame::read(address, size))
    }

    /// Store `data` at `address`.
    ///
    /// The device sends no acknowledgment; the write is considered done once
    /// the bytes are on the wire.
    pub fn write(&mut self, address: u32, data: &[u8]) -> Result<()> {
        self.exchange(&CommandFrame::write(address, data)?)?;
        Ok(())
    }

    /// Ask the device for its memory size in bytes.
    pub fn query_size(&mut self) -> Result<u32> {
        let frame = CommandFrame::read_size();
        let reply = self.exchange(&frame)?;
        decode_size(reply.data()).ok_or(Error::IncompleteRead {
            address: 0,
            expected: frame.response_len(),
            actual: reply.len(),
            attempts: 1,
        })
    }

    /// Hand the device over to its firmware update mode.
    pub fn enter_update_mode(&mut self) -> Result<()> {
        self.exchange(&CommandFrame::enter_update_mode())?;
        Ok(())
    }
}
