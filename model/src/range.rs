// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Inclusive IPv4 and port ranges with their prefix encodings.

use crate::PrefixBits;
use crate::ports::service_name;
use std::fmt;
use std::net::Ipv4Addr;

/// Errors from range construction and prefix conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    /// An IPv4 range with `start > stop`.
    #[error("inverted address range: {start} > {stop}")]
    InvertedIpRange {
        /// range start
        start: Ipv4Addr,
        /// range stop
        stop: Ipv4Addr,
    },
    /// A port range with `start > stop`.
    #[error("inverted port range: {start} > {stop}")]
    InvertedPortRange {
        /// range start
        start: u16,
        /// range stop
        stop: u16,
    },
    /// A prefix longer than the dimension it is applied to.
    #[error("prefix of {len} bits does not fit a {width}-bit dimension")]
    PrefixTooLong {
        /// prefix length in bits
        len: u8,
        /// dimension width in bits
        width: u8,
    },
}

/// An ordered inclusive range of IPv4 addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Range {
    start: Ipv4Addr,
    stop: Ipv4Addr,
}

impl Ipv4Range {
    /// The universal range, 0.0.0.0 through 255.255.255.255.
    pub const ANY: Ipv4Range = Ipv4Range {
        start: Ipv4Addr::new(0, 0, 0, 0),
        stop: Ipv4Addr::new(255, 255, 255, 255),
    };

    /// Create a range.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError::InvertedIpRange`] if `start > stop`.
    pub fn new(start: Ipv4Addr, stop: Ipv4Addr) -> Result<Ipv4Range, RangeError> {
        if start > stop {
            return Err(RangeError::InvertedIpRange { start, stop });
        }
        Ok(Ipv4Range { start, stop })
    }

    /// Create a range from numeric bounds.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError::InvertedIpRange`] if `start > stop`.
    pub fn from_u32(start: u32, stop: u32) -> Result<Ipv4Range, RangeError> {
        Ipv4Range::new(Ipv4Addr::from(start), Ipv4Addr::from(stop))
    }

    /// A single-address range.
    #[must_use]
    pub fn host(addr: Ipv4Addr) -> Ipv4Range {
        Ipv4Range {
            start: addr,
            stop: addr,
        }
    }

    /// The range covered by a prefix: remaining bits zero through remaining
    /// bits one.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError::PrefixTooLong`] for prefixes past 32 bits
    /// (unreachable with a well-formed [`PrefixBits`]).
    pub fn from_prefix(prefix: &PrefixBits) -> Result<Ipv4Range, RangeError> {
        if prefix.len() > 32 {
            return Err(RangeError::PrefixTooLong {
                len: prefix.len(),
                width: 32,
            });
        }
        Ipv4Range::from_u32(prefix.floor32(), prefix.ceil32())
    }

    /// Range start.
    #[must_use]
    pub fn start(&self) -> Ipv4Addr {
        self.start
    }

    /// Range stop.
    #[must_use]
    pub fn stop(&self) -> Ipv4Addr {
        self.stop
    }

    /// Range start as a number.
    #[must_use]
    pub fn start_u32(&self) -> u32 {
        u32::from(self.start)
    }

    /// Range stop as a number.
    #[must_use]
    pub fn stop_u32(&self) -> u32 {
        u32::from(self.stop)
    }

    /// True for the universal range.
    #[must_use]
    pub fn is_any(&self) -> bool {
        *self == Ipv4Range::ANY
    }

    /// Longest common binary prefix of the bounds; empty for the universal
    /// range.
    #[must_use]
    pub fn prefix(&self) -> PrefixBits {
        PrefixBits::common32(self.start_u32(), self.stop_u32())
    }
}

impl fmt::Display for Ipv4Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_any() {
            write!(f, "any")
        } else if self.start == self.stop {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.stop)
        }
    }
}

/// An ordered inclusive port range with an optional negation.
///
/// A negated spec denotes the complement of the range within `[0, 65535]`.
/// Negation is carried here for classification; rendering of the `not(...)`
/// wrapper is the report writer's concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortSpec {
    start: u16,
    stop: u16,
    negated: bool,
}

impl PortSpec {
    /// The universal spec, 0 through 65535.
    pub const ANY: PortSpec = PortSpec {
        start: 0,
        stop: u16::MAX,
        negated: false,
    };

    /// Create a port spec.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError::InvertedPortRange`] if `start > stop`.
    pub fn new(start: u16, stop: u16, negated: bool) -> Result<PortSpec, RangeError> {
        if start > stop {
            return Err(RangeError::InvertedPortRange { start, stop });
        }
        Ok(PortSpec {
            start,
            stop,
            negated,
        })
    }

    /// A single-port spec.
    #[must_use]
    pub fn eq(port: u16) -> PortSpec {
        PortSpec {
            start: port,
            stop: port,
            negated: false,
        }
    }

    /// The spec covered by a prefix.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError::PrefixTooLong`] for prefixes past 16 bits.
    pub fn from_prefix(prefix: &PrefixBits) -> Result<PortSpec, RangeError> {
        if prefix.len() > 16 {
            return Err(RangeError::PrefixTooLong {
                len: prefix.len(),
                width: 16,
            });
        }
        PortSpec::new(prefix.floor16(), prefix.ceil16(), false)
    }

    /// Range start.
    #[must_use]
    pub fn start(&self) -> u16 {
        self.start
    }

    /// Range stop.
    #[must_use]
    pub fn stop(&self) -> u16 {
        self.stop
    }

    /// True if the spec denotes the complement of its range.
    #[must_use]
    pub fn negated(&self) -> bool {
        self.negated
    }

    /// True for the universal, non-negated spec.
    #[must_use]
    pub fn is_any(&self) -> bool {
        *self == PortSpec::ANY
    }

    /// Longest common binary prefix of the bounds. A negated spec cannot be
    /// captured by a single prefix and encodes as the empty prefix.
    #[must_use]
    pub fn prefix(&self) -> PrefixBits {
        if self.negated {
            PrefixBits::EMPTY
        } else {
            PrefixBits::common16(self.start, self.stop)
        }
    }
}

/// Render one port, preferring the well-known service name.
fn write_port(f: &mut fmt::Formatter<'_>, port: u16) -> fmt::Result {
    match service_name(port) {
        Some(name) => write!(f, "{name}"),
        None => write!(f, "{port}"),
    }
}

impl fmt::Display for PortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == 0 && self.stop == u16::MAX {
            write!(f, "any")
        } else if self.start == self.stop {
            write_port(f, self.start)
        } else {
            write_port(f, self.start)?;
            write!(f, "-")?;
            write_port(f, self.stop)
        }
    }
}
