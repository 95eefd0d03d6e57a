//! Response classification.
//!
//! SRWP replies carry no header: the caller knows how many bytes to expect
//! and the device either delivers them within the timeout or it doesn't.

use {
    crate::protocol::frame::SIZE_RESPONSE_LEN,
    byteorder::{ByteOrder, LittleEndian},
};

/// Bytes received for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Exactly the requested number of bytes arrived.
    Complete(Vec<u8>),
    /// The timeout expired first.
    Partial {
        /// Bytes that did arrive.
        data: Vec<u8>,
        /// Number of bytes requested.
        requested: usize,
    },
}

impl Response {
    /// Classify `data` against the expected length.
    ///
    /// Extra bytes are not possible with a bounded read, so anything that is
    /// not short counts as complete.
    pub fn from_read(data: Vec<u8>, requested: usize) -> Self {
        if data.len() >= requested {
            Self::Complete(data)
        } else {
            Self::Partial { data, requested }
        }
    }

    /// Whether every requested byte arrived.
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete(_))
    }

    /// Received bytes.
    pub fn data(&self) -> &[u8] {
        match self {
            Self::Complete(data) | Self::Partial { data, .. } => data,
        }
    }

    /// Number of received bytes.
    pub fn len(&self) -> usize {
        self.data().len()
    }

    /// Whether nothing arrived.
    pub fn is_empty(&self) -> bool {
        self.data().is_empty()
    }

    /// Number of requested bytes.
    pub fn requested(&self) -> usize {
        match self {
            Self::Complete(data) => data.len(),
            Self::Partial { requested, .. } => *requested,
        }
    }

    /// Take the received bytes.
    pub fn into_data(self) -> Vec<u8> {
        match self {
            Self::Complete(data) | Self::Partial { data, .. } => data,
        }
    }
}

/// Decode the read-size reply.
pub fn decode_size(data: &[u8]) -> Option<u32> {
    (data.len() >= SIZE_RESPONSE_LEN).then(|| LittleEndian::read_u32(data))
}
