//! Whole-device transfers built from single SRWP exchanges.
//!
//! A device read is split into chunks because a read is best-effort within the
//! port timeout: large replies risk arriving short. Each chunk is retried
//! until it arrives complete, which is what makes a bulk read reliable.
//! Chunks are issued strictly in address order; the device cannot pipeline.

use {
    crate::{
        client::Srwp,
        error::{Error, Result},
        is_interrupted_requested,
        port::Port,
    },
    log::{debug, error, info, warn},
};

/// Default chunk size for bulk reads and chunked writes.
pub const DEFAULT_CHUNK_SIZE: u32 = 100;

/// Default number of attempts per chunk.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Tunables for bulk transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferConfig {
    /// Bytes requested per read exchange.
    pub chunk_size: u32,
    /// Attempts per chunk before giving up.
    pub max_retries: u32,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

/// One differing byte found by [`Transfer::verify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mismatch {
    /// Byte offset on the device.
    pub address: usize,
    /// Value read from the device.
    pub device: u8,
    /// Value in the reference buffer.
    pub expected: u8,
}

/// A chunk the chunked writer could not send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedChunk {
    /// Start address of the chunk.
    pub address: u32,
    /// Chunk length.
    pub len: usize,
    /// Transport error message.
    pub error: String,
}

/// Outcome of [`Transfer::write_whole_device_chunked`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkedWriteReport {
    /// Chunks handed to the transport successfully.
    pub written: usize,
    /// Chunks that failed and left a gap on the device.
    pub failed: Vec<FailedChunk>,
}

impl ChunkedWriteReport {
    /// Whether every chunk was sent.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Bulk operations over a client with a known device size.
pub struct Transfer<'a, P: Port> {
    client: &'a mut Srwp<P>,
    device_size: u32,
    config: TransferConfig,
    interrupted: fn() -> bool,
}

impl<'a, P: Port> Transfer<'a, P> {
    /// Create a transfer over `client` for a device of `device_size` bytes.
    pub fn new(client: &'a mut Srwp<P>, device_size: u32) -> Self {
        Self {
            client,
            device_size,
            config: TransferConfig::default(),
            interrupted: is_interrupted_requested,
        }
    }

    /// Set chunk size and retry budget.
    #[must_use]
    pub fn with_config(mut self, config: TransferConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the check polled between chunks.
    ///
    /// Defaults to [`is_interrupted_requested`].
    #[must_use]
    pub fn with_interrupt_check(mut self, check: fn() -> bool) -> Self {
        self.interrupted = check;
        self
    }

    /// Device size in bytes.
    pub fn device_size(&self) -> u32 {
        self.device_size
    }

    /// Read a region, reissuing the request until it arrives complete.
    ///
    /// A `max_retries` of zero still makes one attempt.
    pub fn read_region_with_retry(
        &mut self,
        address: u32,
        size: u32,
        max_retries: u32,
    ) -> Result<Vec<u8>> {
        let attempts = max_retries.max(1);
        let mut last_len = 0;

        for attempt in 1..=attempts {
            let resp = self.client.read(address, size)?;
            if resp.is_complete() {
                return Ok(resp.into_data());
            }

            last_len = resp.len();
            warn!(
                "Incomplete read at 0x{address:08X}: expected {size}, got {last_len} (attempt {attempt}/{attempts})"
            );
        }

        Err(Error::IncompleteRead {
            address,
            expected: size as usize,
            actual: last_len,
            attempts,
        })
    }

    /// Read the whole device in chunks of `chunk_size` bytes.
    pub fn read_whole_device(&mut self, chunk_size: u32) -> Result<Vec<u8>> {
        self.read_whole_device_with_progress(chunk_size, |_, _| {})
    }

    /// Read the whole device, reporting `(bytes_done, bytes_total)` after each chunk.
    pub fn read_whole_device_with_progress<F>(
        &mut self,
        chunk_size: u32,
        mut progress: F,
    ) -> Result<Vec<u8>>
    where
        F: FnMut(usize, usize),
    {
        if chunk_size == 0 {
            return Err(Error::invalid_input("chunk size must be greater than zero"));
        }

        let total = self.device_size as usize;
        let mut data = Vec::with_capacity(total);
        let mut offset = 0u32;

        debug!(
            "Reading {} bytes in chunks of {chunk_size}",
            self.device_size
        );

        while offset < self.device_size {
            if (self.interrupted)() {
                return Err(Error::Interrupted);
            }

            let len = chunk_size.min(self.device_size - offset);
            let chunk = self.read_region_with_retry(offset, len, self.config.max_retries)?;
            data.extend_from_slice(&chunk);
            offset += len;

            progress(data.len(), total);
        }

        Ok(data)
    }

    /// Write `data` to the device in one command at address 0.
    ///
    /// `data` must be exactly the device size; see
    /// [`pad_to_device_size`](Self::pad_to_device_size).
    pub fn write_whole_device(&mut self, data: &[u8]) -> Result<()> {
        if data.len() != self.device_size as usize {
            return Err(Error::SizeMismatch {
                expected: self.device_size as usize,
                actual: data.len(),
            });
        }

        info!("Writing {} bytes", data.len());
        self.client.write(0, data)
    }

    /// Write `data` in independent chunks at increasing addresses.
    ///
    /// Experimental. A transport failure on one chunk is logged and the
    /// remaining chunks are still written, so the device can end up with gaps.
    /// Check [`ChunkedWriteReport::failed`] before trusting the result.
    pub fn write_whole_device_chunked(
        &mut self,
        data: &[u8],
        chunk_size: u32,
    ) -> Result<ChunkedWriteReport> {
        if chunk_size == 0 {
            return Err(Error::invalid_input("chunk size must be greater than zero"));
        }

        let mut report = ChunkedWriteReport::default();
        let mut address = 0u32;

        for chunk in data.chunks(chunk_size as usize) {
            if (self.interrupted)() {
                return Err(Error::Interrupted);
            }

            match self.client.write(address, chunk) {
                Ok(()) => report.written += 1,
                Err(e) => {
                    error!(
                        "Failed to write chunk 0x{address:08X}..0x{:08X}: {e}",
                        address as usize + chunk.len()
                    );
                    report.failed.push(FailedChunk {
                        address,
                        len: chunk.len(),
                        error: e.to_string(),
                    });
                },
            }

            address = address.wrapping_add(chunk_size);
        }

        Ok(report)
    }

    /// Fill the whole device with zeros.
    pub fn clear(&mut self) -> Result<()> {
        let zeros = vec![0u8; self.device_size as usize];
        self.write_whole_device(&zeros)
    }

    /// Check whether every byte on the device is zero.
    pub fn is_empty(&mut self) -> Result<bool> {
        let data = self.read_whole_device(self.config.chunk_size)?;
        Ok(data.iter().all(|&b| b == 0))
    }

    /// Compare the device against `expected`, logging every mismatch.
    pub fn verify(&mut self, expected: &[u8]) -> Result<bool> {
        let device = self.read_whole_device(self.config.chunk_size)?;

        for m in compare(&device, expected) {
            error!(
                "Mismatch at byte {}: FRAM={:02x}, Data/File={:02x}",
                m.address, m.device, m.expected
            );
        }
        if device.len() != expected.len() {
            error!(
                "Length mismatch: FRAM holds {} bytes, reference has {}",
                device.len(),
                expected.len()
            );
        }

        Ok(device == expected)
    }

    /// Right-pad `data` with zeros up to the device size.
    pub fn pad_to_device_size(&self, data: &[u8]) -> Vec<u8> {
        pad_to_size(data, self.device_size as usize)
    }
}

/// Right-pad `data` with zeros to `size`; longer input is returned unchanged.
pub fn pad_to_size(data: &[u8], size: usize) -> Vec<u8> {
    let mut out = data.to_vec();
    if out.len() < size {
        out.resize(size, 0);
    }
    out
}

/// List every differing byte over the common length of both buffers.
pub fn compare(device: &[u8], expected: &[u8]) -> Vec<Mismatch> {
    device
        .iter()
        .zip(expected)
        .enumerate()
        .filter(|(_, (d, e))| d != e)
        .map(|(address, (&device, &expected))| Mismatch {
            address,
            device,
            expected,
        })
        .collect()
}
