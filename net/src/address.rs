use std::fmt;

/// A six-byte peer address: a 4-byte node id and a 2-byte port (§3).
///
/// Two addresses are equal iff all six bytes are equal. Ordering is
/// byte order on `(id, port)`, used to break hash ties on the ring (§3)
/// deterministically rather than by insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address {
    pub id: u32,
    pub port: u16,
}

impl Address {
    pub const fn new(id: u32, port: u16) -> Self {
        Self { id, port }
    }

    /// The fixed introducer address used to bootstrap a cluster (§3).
    pub const INTRODUCER: Address = Address::new(1, 0);

    pub(crate) fn to_bytes(self) -> [u8; 6] {
        let mut buf = [0u8; 6];
        buf[0..4].copy_from_slice(&self.id.to_le_bytes());
        buf[4..6].copy_from_slice(&self.port.to_le_bytes());
        buf
    }

    pub(crate) fn from_bytes(buf: [u8; 6]) -> Self {
        let id = u32::from_le_bytes(buf[0..4].try_into().unwrap());
        let port = u16::from_le_bytes(buf[4..6].try_into().unwrap());
        Self { id, port }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.id, self.port)
    }
}
