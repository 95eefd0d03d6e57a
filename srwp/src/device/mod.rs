//! Device auto-discovery.
//!
//! SRWP devices enumerate as USB CDC-ACM serial ports. Discovery lists the
//! candidate paths for the current platform and then insists on exactly one
//! match: with several boards attached there is no safe way to guess which
//! one the user meant.
//!
//! Enumeration sits behind the [`Discovery`] trait so that the platform
//! strategy can be swapped (or faked in tests):
//!
//! - [`GlobDiscovery`]: filesystem patterns such as `/dev/ttyACM*`
//! - [`UsbSerialDiscovery`]: USB serial ports reported by the OS (native only)

use {
    crate::error::{Error, Result},
    log::{debug, info, trace},
};

/// Device naming pattern on Linux.
pub const LINUX_ACM_PATTERN: &str = "/dev/ttyACM*";

/// Device naming pattern on macOS.
pub const MACOS_USBMODEM_PATTERN: &str = "/dev/cu.usbmodem*";

/// Source of candidate device paths.
pub trait Discovery {
    /// List every path that could be an SRWP device.
    fn discover_candidates(&self) -> Result<Vec<String>>;

    /// Short description of what is searched, used in error messages.
    fn describe(&self) -> String;
}

/// Discovery by filesystem glob patterns.
#[derive(Debug, Clone)]
pub struct GlobDiscovery {
    patterns: Vec<String>,
}

impl GlobDiscovery {
    /// Create a discovery over the given patterns.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(Into::into)
                .collect(),
        }
    }

    /// Linux CDC-ACM devices.
    pub fn linux_acm() -> Self {
        Self::new([LINUX_ACM_PATTERN])
    }

    /// macOS USB modem devices.
    pub fn macos_usbmodem() -> Self {
        Self::new([MACOS_USBMODEM_PATTERN])
    }
}

impl Discovery for GlobDiscovery {
    fn discover_candidates(&self) -> Result<Vec<String>> {
        let mut found = Vec::new();

        for pattern in &self.patterns {
            for entry in glob::glob(pattern)? {
                match entry {
                    Ok(path) => {
                        let name = path.to_string_lossy().into_owned();
                        trace!("Candidate device: {name}");
                        if !found.contains(&name) {
                            found.push(name);
                        }
                    },
                    Err(e) => debug!("Skipping unreadable path: {e}"),
                }
            }
        }

        Ok(found)
    }

    fn describe(&self) -> String {
        self.patterns.join(", ")
    }
}

/// Discovery through the OS serial port list, keeping USB ports only.
#[cfg(feature = "native")]
#[derive(Debug, Clone, Copy, Default)]
pub struct UsbSerialDiscovery;

#[cfg(feature = "native")]
impl Discovery for UsbSerialDiscovery {
    fn discover_candidates(&self) -> Result<Vec<String>> {
        let ports = serialport::available_ports()?;

        Ok(ports
            .into_iter()
            .filter_map(|p| match p.port_type {
                serialport::SerialPortType::UsbPort(info) => {
                    trace!(
                        "Found USB port: {} (VID: {:04X}, PID: {:04X})",
                        p.port_name, info.vid, info.pid
                    );
                    Some(p.port_name)
                },
                _ => None,
            })
            .collect())
    }

    fn describe(&self) -> String {
        "USB serial ports".to_string()
    }
}

/// Discovery strategy for the platform this binary was built for.
pub fn platform_discovery() -> Box<dyn Discovery> {
    if cfg!(target_os = "linux") {
        Box::new(GlobDiscovery::linux_acm())
    } else if cfg!(target_os = "macos") {
        Box::new(GlobDiscovery::macos_usbmodem())
    } else {
        fallback_discovery()
    }
}

#[cfg(feature = "native")]
fn fallback_discovery() -> Box<dyn Discovery> {
    Box::new(UsbSerialDiscovery)
}

#[cfg(not(feature = "native"))]
fn fallback_discovery() -> Box<dyn Discovery> {
    Box::new(GlobDiscovery::linux_acm())
}

/// Reduce a candidate list to the single device it must contain.
pub fn select_single(candidates: Vec<String>, searched: &str) -> Result<String> {
    let mut candidates = candidates;
    match candidates.len() {
        0 => Err(Error::NotFound {
            pattern: searched.to_string(),
        }),
        1 => Ok(candidates.remove(0)),
        _ => Err(Error::Ambiguous { candidates }),
    }
}

/// Find the one device reachable through `discovery`.
pub fn discover_with(discovery: &dyn Discovery) -> Result<String> {
    let candidates = discovery.discover_candidates()?;
    let device = select_single(candidates, &discovery.describe())?;
    info!("Auto-detected device: {device}");
    Ok(device)
}

/// Find the one device reachable through the platform discovery.
pub fn discover() -> Result<String> {
    discover_with(platform_discovery().as_ref())
}
