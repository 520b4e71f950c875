// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! IP protocol model and the fixed protocol-to-prefix table.

use crate::PrefixBits;
use std::fmt;

/// An IP protocol constraint.
///
/// Two synthetic values sit above the IANA number space: [`Protocol::Any`]
/// places no constraint at all, and [`Protocol::Ip`] matches every concrete
/// IPv4-payload protocol (the superset of all [`Protocol::Num`] values).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// No protocol constraint.
    Any,
    /// Any IPv4-payload protocol.
    Ip,
    /// A concrete IANA protocol number.
    Num(u8),
}

/// A protocol code outside `[-2, 255]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("protocol code {0} outside [-2, 255]")]
pub struct InvalidProtocol(pub i32);

impl Protocol {
    /// ICMP for IPv4.
    pub const ICMP: Protocol = Protocol::Num(1);
    /// IGMP.
    pub const IGMP: Protocol = Protocol::Num(2);
    /// IP in IP encapsulation.
    pub const IP_IN_IP: Protocol = Protocol::Num(4);
    /// TCP.
    pub const TCP: Protocol = Protocol::Num(6);
    /// UDP.
    pub const UDP: Protocol = Protocol::Num(17);
    /// GRE.
    pub const GRE: Protocol = Protocol::Num(47);
    /// ESP.
    pub const ESP: Protocol = Protocol::Num(50);
    /// Authentication Header.
    pub const AH: Protocol = Protocol::Num(51);
    /// EIGRP.
    pub const EIGRP: Protocol = Protocol::Num(88);
    /// OSPF.
    pub const OSPF: Protocol = Protocol::Num(89);
    /// PIM.
    pub const PIM: Protocol = Protocol::Num(103);
    /// VRRP.
    pub const VRRP: Protocol = Protocol::Num(112);
    /// L2TP.
    pub const L2TP: Protocol = Protocol::Num(115);
    /// SCTP.
    pub const SCTP: Protocol = Protocol::Num(132);

    /// Decode a numeric protocol code: -2 = any, -1 = ip, 0-255 concrete.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidProtocol`] outside `[-2, 255]`.
    pub fn from_code(code: i32) -> Result<Protocol, InvalidProtocol> {
        match code {
            -2 => Ok(Protocol::Any),
            -1 => Ok(Protocol::Ip),
            0..=255 => {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                Ok(Protocol::Num(code as u8))
            }
            other => Err(InvalidProtocol(other)),
        }
    }

    /// The numeric code of this protocol.
    #[must_use]
    pub fn code(&self) -> i32 {
        match self {
            Protocol::Any => -2,
            Protocol::Ip => -1,
            Protocol::Num(n) => i32::from(*n),
        }
    }

    /// True for TCP and UDP, the protocols that carry port ranges.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Protocol::Num(6 | 17))
    }

    /// The protocol's position in the prefix lattice.
    ///
    /// `Any` is the empty prefix; `Ip` is `1`; the protocols with dedicated
    /// short codes sit under `11`; every other concrete protocol `p` gets
    /// `10` followed by `p`'s eight bits, which keeps all concrete prefixes
    /// pairwise incomparable and strictly below `1`.
    #[must_use]
    pub fn prefix(&self) -> PrefixBits {
        match *self {
            Protocol::Any => PrefixBits::EMPTY,
            Protocol::Ip => PrefixBits::new(0x8000_0000, 1),
            Protocol::Num(p) => match p {
                1 => PrefixBits::new(0b11_0000 << 26, 6),  // icmp
                2 => PrefixBits::new(0b11_0001 << 26, 6),  // igmp
                4 => PrefixBits::new(0b11_0010 << 26, 6),  // ipinip
                6 => PrefixBits::new(0b1111 << 28, 4),     // tcp
                17 => PrefixBits::new(0b1110 << 28, 4),    // udp
                47 => PrefixBits::new(0b11_0011 << 26, 6), // gre
                88 => PrefixBits::new(0b11_0100 << 26, 6), // eigrp
                89 => PrefixBits::new(0b11_0101 << 26, 6), // ospf
                103 => PrefixBits::new(0b11_0110 << 26, 6), // pim
                _ => PrefixBits::new(0x8000_0000 | (u32::from(p) << 22), 10),
            },
        }
    }

    /// The canonical short name, if there is one.
    #[must_use]
    fn name(&self) -> Option<&'static str> {
        match *self {
            Protocol::Any => Some("any"),
            Protocol::Ip => Some("ip"),
            Protocol::Num(p) => match p {
                1 => Some("icmp"),
                2 => Some("igmp"),
                4 => Some("ipinip"),
                6 => Some("tcp"),
                17 => Some("udp"),
                47 => Some("gre"),
                50 => Some("esp"),
                51 => Some("ahp"),
                88 => Some("eigrp"),
                89 => Some("ospf"),
                103 => Some("pim"),
                112 => Some("vrrp"),
                115 => Some("l2tp"),
                132 => Some("sctp"),
                _ => None,
            },
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "{}", self.code()),
        }
    }
}
