//! Device session: one opened port, one known memory size.

#[cfg(feature = "native")]
use crate::{
    device::{self, Discovery},
    port::{NativePort, SerialConfig},
};
use {
    crate::{
        client::Srwp,
        error::Result,
        port::{DEFAULT_TIMEOUT, Port},
        protocol::Response,
        transfer::{
            ChunkedWriteReport, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_RETRIES, Transfer, TransferConfig,
        },
    },
    log::{debug, info},
    std::time::Duration,
};

/// Memory size of a Blaustahl device.
pub const BLAUSTAHL_SIZE: u32 = 8192;

/// Memory size of a Kaltstahl device.
pub const KALTSTAHL_SIZE: u32 = 262_144;

/// Name of the device model with `size` bytes of FRAM, if known.
pub fn model_name(size: u32) -> Option<&'static str> {
    match size {
        BLAUSTAHL_SIZE => Some("Blaustahl"),
        KALTSTAHL_SIZE => Some("Kaltstahl"),
        _ => None,
    }
}

/// Settings for opening a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Device path; discovered when `None`.
    pub device: Option<String>,
    /// Memory size override; queried from the device when `None` or zero.
    pub fram_size: Option<u32>,
    /// Per-exchange read timeout.
    pub timeout: Duration,
    /// Chunk size for bulk reads.
    pub chunk_size: u32,
    /// Attempts per chunk.
    pub max_retries: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            device: None,
            fram_size: None,
            timeout: DEFAULT_TIMEOUT,
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl SessionConfig {
    fn transfer(&self) -> TransferConfig {
        TransferConfig {
            chunk_size: self.chunk_size,
            max_retries: self.max_retries,
        }
    }
}

/// An open connection to one SRWP device.
pub struct Session<P: Port> {
    client: Srwp<P>,
    device_size: u32,
    transfer: TransferConfig,
}

#[cfg(feature = "native")]
impl Session<NativePort> {
    /// Open the configured device, discovering it when no path is given.
    pub fn open(config: &SessionConfig) -> Result<Self> {
        let discovery = device::platform_discovery();
        Self::open_with(config, discovery.as_ref())
    }

    /// Open a session using `discovery` when no device path is configured.
    pub fn open_with(config: &SessionConfig, discovery: &dyn Discovery) -> Result<Self> {
        let path = match &config.device {
            Some(path) => path.clone(),
            None => device::discover_with(discovery)?,
        };

        let port = NativePort::open(&SerialConfig::new(&path).with_timeout(config.timeout))?;
        let mut session = Self::new(port, config.fram_size)?;
        session.transfer = config.transfer();
        Ok(session)
    }
}

impl<P: Port> Session<P> {
    /// Wrap an opened port; the size is queried unless `fram_size` is given.
    pub fn new(port: P, fram_size: Option<u32>) -> Result<Self> {
        let mut client = Srwp::new(port);

        let device_size = match fram_size.filter(|&size| size > 0) {
            Some(size) => {
                debug!("Using configured FRAM size {size}");
                size
            },
            None => client.query_size()?,
        };

        info!(
            "Connected to {} ({} bytes{})",
            client.port().name(),
            device_size,
            model_name(device_size)
                .map(|m| format!(", {m}"))
                .unwrap_or_default()
        );

        Ok(Self {
            client,
            device_size,
            transfer: TransferConfig::default(),
        })
    }

    /// Override chunk size and retry budget for bulk operations.
    #[must_use]
    pub fn with_transfer_config(mut self, config: TransferConfig) -> Self {
        self.transfer = config;
        self
    }

    /// Memory size in bytes.
    pub fn device_size(&self) -> u32 {
        self.device_size
    }

    /// Name of the underlying port.
    pub fn port_name(&self) -> &str {
        self.client.port().name()
    }

    /// Chunk size and retry budget in use.
    pub fn transfer_config(&self) -> TransferConfig {
        self.transfer
    }

    /// Command client for single exchanges.
    pub fn client(&mut self) -> &mut Srwp<P> {
        &mut self.client
    }

    fn bulk(&mut self) -> Transfer<'_, P> {
        Transfer::new(&mut self.client, self.device_size).with_config(self.transfer)
    }

    /// See [`Srwp::echo`].
    pub fn echo(&mut self, message: &str) -> Result<Response> {
        self.client.echo(message)
    }

    /// See [`Srwp::read`].
    pub fn read(&mut self, address: u32, size: u32) -> Result<Response> {
        self.client.read(address, size)
    }

    /// See [`Srwp::write`].
    pub fn write(&mut self, address: u32, data: &[u8]) -> Result<()> {
        self.client.write(address, data)
    }

    /// Query the device for its size; does not change [`device_size`](Self::device_size).
    pub fn query_size(&mut self) -> Result<u32> {
        self.client.query_size()
    }

    /// See [`Srwp::enter_update_mode`].
    pub fn enter_update_mode(&mut self) -> Result<()> {
        self.client.enter_update_mode()
    }

    /// See [`Transfer::read_region_with_retry`].
    pub fn read_region_with_retry(
        &mut self,
        address: u32,
        size: u32,
        max_retries: u32,
    ) -> Result<Vec<u8>> {
        self.bulk()
            .read_region_with_retry(address, size, max_retries)
    }

    /// Read the whole device using the configured chunk size.
    pub fn read_whole_device(&mut self) -> Result<Vec<u8>> {
        let chunk_size = self.transfer.chunk_size;
        self.bulk().read_whole_device(chunk_size)
    }

    /// Read the whole device, reporting `(bytes_done, bytes_total)` per chunk.
    pub fn read_whole_device_with_progress<F>(&mut self, progress: F) -> Result<Vec<u8>>
    where
        F: FnMut(usize, usize),
    {
        let chunk_size = self.transfer.chunk_size;
        self.bulk()
            .read_whole_device_with_progress(chunk_size, progress)
    }

    /// See [`Transfer::write_whole_device`].
    pub fn write_whole_device(&mut self, data: &[u8]) -> Result<()> {
        self.bulk().write_whole_device(data)
    }

    /// See [`Transfer::write_whole_device_chunked`].
    pub fn write_whole_device_chunked(&mut self, data: &[u8]) -> Result<ChunkedWriteReport> {
        let chunk_size = self.transfer.chunk_size;
        self.bulk()
            .write_whole_device_chunked(data, chunk_size)
    }

    /// See [`Transfer::clear`].
    pub fn clear(&mut self) -> Result<()> {
        self.bulk().clear()
    }

    /// See [`Transfer::is_empty`].
    pub fn is_empty(&mut self) -> Result<bool> {
        self.bulk().is_empty()
    }

    /// See [`Transfer::verify`].
    pub fn verify(&mut self, expected: &[u8]) -> Result<bool> {
        self.bulk().verify(expected)
    }

    /// Right-pad `data` with zeros up to the device size.
    pub fn pad_to_device_size(&self, data: &[u8]) -> Vec<u8> {
        crate::transfer::pad_to_size(data, self.device_size as usize)
    }

    /// Close the port. Later exchanges fail.
    pub fn close(&mut self) -> Result<()> {
        debug!("Closing {}", self.port_name());
        self.client.port_mut().close()
    }

    /// Consume the session and return the port.
    pub fn into_port(self) -> P {
        self.client.into_port()
    }
}
