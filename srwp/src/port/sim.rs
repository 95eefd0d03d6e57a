//! In-memory ports used by the unit tests.

use {
    crate::{error::Result, port::Port},
    std::{
        collections::{HashSet, VecDeque},
        io::{self, Read, Write},
        time::Duration,
    },
};

/// Port that reflects every written byte back to the reader.
pub(crate) struct Loopback {
    line: VecDeque<u8>,
    timeout: Duration,
}

impl Loopback {
    pub(crate) fn new() -> Self {
        Self {
            line: VecDeque::new(),
            timeout: Duration::from_millis(50),
        }
    }

    /// Put bytes on the line as if the device had sent them.
    pub(crate) fn inject(&mut self, data: &[u8]) {
        self.line.extend(data);
    }
}

impl Read for Loopback {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        pop_into(&mut self.line, buf)
    }
}

impl Write for Loopback {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.line.extend(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Port for Loopback {
    fn set_timeout(&mut self, timeout: Duration) -> Result<()> {
        self.timeout = timeout;
        Ok(())
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn baud_rate(&self) -> u32 {
        crate::port::DEFAULT_BAUD
    }

    fn bytes_to_read(&mut self) -> Result<usize> {
        Ok(self.line.len())
    }

    fn name(&self) -> &str {
        "loopback"
    }

    fn close(&mut self) -> Result<()> {
        self.line.clear();
        Ok(())
    }
}

/// Simulated FRAM device that understands SRWP frames.
pub(crate) struct SimulatedFram {
    memory: Vec<u8>,
    rx: Vec<u8>,
    tx: VecDeque<u8>,
    /// Every buffer handed to `write`, in order.
    pub(crate) sent: Vec<Vec<u8>>,
    /// Lengths to truncate the next read responses to.
    short_reads: VecDeque<usize>,
    /// Write addresses whose frames fail on the transport.
    failing_writes: HashSet<u32>,
    pub(crate) update_mode: bool,
    pub(crate) closed: bool,
    timeout: Duration,
}

impl SimulatedFram {
    pub(crate) fn new(size: usize) -> Self {
        Self::with_contents(vec![0u8; size])
    }

    pub(crate) fn with_contents(memory: Vec<u8>) -> Self {
        Self {
            memory,
            rx: Vec::new(),
            tx: VecDeque::new(),
            sent: Vec::new(),
            short_reads: VecDeque::new(),
            failing_writes: HashSet::new(),
            update_mode: false,
            closed: false,
            timeout: Duration::from_millis(50),
        }
    }

    pub(crate) fn memory(&self) -> &[u8] {
        &self.memory
    }

    /// Truncate the next read response to `len` bytes.
    pub(crate) fn queue_short_read(&mut self, len: usize) {
        self.short_reads.push_back(len);
    }

    /// Make the write frame targeting `address` fail.
    pub(crate) fn fail_write_at(&mut self, address: u32) {
        self.failing_writes.insert(address);
    }

    /// Leave garbage on the line, as a timed-out exchange would.
    pub(crate) fn inject_stale(&mut self, data: &[u8]) {
        self.tx.extend(data);
    }

    fn process(&mut self) {
        loop {
            let Some(&first) = self.rx.first() else {
                return;
            };

            if first == 0x19 {
                self.update_mode = true;
                self.rx.drain(..1);
                continue;
            }

            if first != 0x00 {
                self.rx.drain(..1);
                continue;
            }

            let Some(&cmd) = self.rx.get(1) else {
                return;
            };

            let consumed = match cmd {
                0x00 => self.handle_echo(),
                0x01 => self.handle_read(),
                0x02 => self.handle_write(),
                0x0A => {
                    let size = u32::try_from(self.memory.len()).unwrap_or(u32::MAX);
                    self.tx.extend(size.to_le_bytes());
                    Some(2)
                },
                _ => Some(2),
            };

            match consumed {
                Some(n) => {
                    self.rx.drain(..n);
                },
                None => return,
            }
        }
    }

    fn u32_at(&self, offset: usize) -> Option<u32> {
        let bytes = self.rx.get(offset..offset + 4)?;
        Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn handle_echo(&mut self) -> Option<usize> {
        let len = self.u32_at(2)? as usize;
        let payload = self.rx.get(6..6 + len)?.to_vec();
        self.tx.extend(payload);
        Some(6 + len)
    }

    fn handle_read(&mut self) -> Option<usize> {
        let addr = self.u32_at(2)? as usize;
        let size = self.u32_at(6)? as usize;

        let start = addr.min(self.memory.len());
        let end = addr.saturating_add(size).min(self.memory.len());
        let mut reply = self.memory[start..end].to_vec();
        if let Some(limit) = self.short_reads.pop_front() {
            reply.truncate(limit);
        }
        self.tx.extend(reply);
        Some(10)
    }

    fn handle_write(&mut self) -> Option<usize> {
        let addr = self.u32_at(2)? as usize;
        let len = self.u32_at(6)? as usize;
        let data = self.rx.get(10..10 + len)?.to_vec();

        for (i, byte) in data.into_iter().enumerate() {
            if let Some(cell) = self.memory.get_mut(addr + i) {
                *cell = byte;
            }
        }
        Some(10 + len)
    }
}

impl Read for SimulatedFram {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        pop_into(&mut self.tx, buf)
    }
}

impl Write for SimulatedFram {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.closed {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "port closed"));
        }

        if buf.len() >= 6 && buf[0] == 0x00 && buf[1] == 0x02 {
            let addr = u32::from_le_bytes([buf[2], buf[3], buf[4], buf[5]]);
            if self.failing_writes.contains(&addr) {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "line dropped"));
            }
        }

        self.sent.push(buf.to_vec());
        self.rx.extend_from_slice(buf);
        self.process();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Port for SimulatedFram {
    fn set_timeout(&mut self, timeout: Duration) -> Result<()> {
        self.timeout = timeout;
        Ok(())
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn baud_rate(&self) -> u32 {
        crate::port::DEFAULT_BAUD
    }

    fn bytes_to_read(&mut self) -> Result<usize> {
        Ok(self.tx.len())
    }

    fn name(&self) -> &str {
        "sim"
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

fn pop_into(queue: &mut VecDeque<u8>, buf: &mut [u8]) -> io::Result<usize> {
    if queue.is_empty() {
        return Err(io::Error::new(io::ErrorKind::TimedOut, "no data"));
    }
    let n = buf.len().min(queue.len());
    for (slot, byte) in buf.iter_mut().zip(queue.drain(..n)) {
        *slot = byte;
    }
    Ok(n)
}
