// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! ACL rules: the five-dimensional predicate plus an action.

use crate::proto::{InvalidProtocol, Protocol};
use crate::range::{Ipv4Range, PortSpec, RangeError};
use crate::PrefixBits;
use std::fmt;

/// What a matching rule does with the packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Permit matching packets.
    Permit,
    /// Deny matching packets.
    Deny,
}

/// An action code other than 0 (permit) or 1 (deny).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("action code {0} is neither 0 (permit) nor 1 (deny)")]
pub struct InvalidAction(pub i32);

impl Action {
    /// Decode a numeric action code.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidAction`] for codes other than 0 and 1.
    pub fn from_code(code: i32) -> Result<Action, InvalidAction> {
        match code {
            0 => Ok(Action::Permit),
            1 => Ok(Action::Deny),
            other => Err(InvalidAction(other)),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Permit => write!(f, "permit"),
            Action::Deny => write!(f, "deny"),
        }
    }
}

/// One of the five rule dimensions, in classification order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    /// IP protocol.
    Protocol,
    /// Source IPv4 range.
    SrcIp,
    /// Destination IPv4 range.
    DstIp,
    /// Source port spec.
    SrcPort,
    /// Destination port spec.
    DstPort,
}

impl Dimension {
    /// All dimensions in their fixed order.
    pub const ALL: [Dimension; 5] = [
        Dimension::Protocol,
        Dimension::SrcIp,
        Dimension::DstIp,
        Dimension::SrcPort,
        Dimension::DstPort,
    ];
}

/// One ACL rule.
///
/// Besides the five dimension values, a rule caches each dimension's prefix
/// encoding. The setters keep both views coherent: changing a range or the
/// protocol recomputes its prefix, changing a prefix recomputes the range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    position: u32,
    name: String,
    protocol: Protocol,
    src_ip: Ipv4Range,
    dst_ip: Ipv4Range,
    src_port: PortSpec,
    dst_port: PortSpec,
    action: Action,
    protocol_prefix: PrefixBits,
    src_ip_prefix: PrefixBits,
    dst_ip_prefix: PrefixBits,
    src_port_prefix: PrefixBits,
    dst_port_prefix: PrefixBits,
}

impl Rule {
    /// A rule at `position` matching everything, named by its position,
    /// permitting.
    #[must_use]
    pub fn new(position: u32) -> Rule {
        Rule::with_name(position, position.to_string())
    }

    /// A rule at `position` with an explicit name.
    #[must_use]
    pub fn with_name(position: u32, name: impl Into<String>) -> Rule {
        Rule {
            position,
            name: name.into(),
            protocol: Protocol::Any,
            src_ip: Ipv4Range::ANY,
            dst_ip: Ipv4Range::ANY,
            src_port: PortSpec::ANY,
            dst_port: PortSpec::ANY,
            action: Action::Permit,
            protocol_prefix: PrefixBits::EMPTY,
            src_ip_prefix: PrefixBits::EMPTY,
            dst_ip_prefix: PrefixBits::EMPTY,
            src_port_prefix: PrefixBits::EMPTY,
            dst_port_prefix: PrefixBits::EMPTY,
        }
    }

    /// 0-based position within the owning ACL.
    #[must_use]
    pub fn position(&self) -> u32 {
        self.position
    }

    /// Rule name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Protocol constraint.
    #[must_use]
    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// Source address range.
    #[must_use]
    pub fn src_ip(&self) -> &Ipv4Range {
        &self.src_ip
    }

    /// Destination address range.
    #[must_use]
    pub fn dst_ip(&self) -> &Ipv4Range {
        &self.dst_ip
    }

    /// Source port spec.
    #[must_use]
    pub fn src_port(&self) -> &PortSpec {
        &self.src_port
    }

    /// Destination port spec.
    #[must_use]
    pub fn dst_port(&self) -> &PortSpec {
        &self.dst_port
    }

    /// Rule action.
    #[must_use]
    pub fn action(&self) -> Action {
        self.action
    }

    /// The cached prefix encoding of one dimension.
    #[must_use]
    pub fn prefix(&self, dimension: Dimension) -> &PrefixBits {
        match dimension {
            Dimension::Protocol => &self.protocol_prefix,
            Dimension::SrcIp => &self.src_ip_prefix,
            Dimension::DstIp => &self.dst_ip_prefix,
            Dimension::SrcPort => &self.src_port_prefix,
            Dimension::DstPort => &self.dst_port_prefix,
        }
    }

    /// Set the protocol, recomputing its prefix.
    pub fn set_protocol(&mut self, protocol: Protocol) {
        self.protocol = protocol;
        self.protocol_prefix = protocol.prefix();
    }

    /// Set the protocol from a numeric code in `[-2, 255]`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidProtocol`] and leaves the rule unchanged for codes
    /// outside the accepted window.
    pub fn set_protocol_code(&mut self, code: i32) -> Result<(), InvalidProtocol> {
        self.set_protocol(Protocol::from_code(code)?);
        Ok(())
    }

    /// Set the action.
    pub fn set_action(&mut self, action: Action) {
        self.action = action;
    }

    /// Set the source address range, recomputing its prefix.
    pub fn set_src_ip(&mut self, range: Ipv4Range) {
        self.src_ip = range;
        self.src_ip_prefix = range.prefix();
    }

    /// Set the destination address range, recomputing its prefix.
    pub fn set_dst_ip(&mut self, range: Ipv4Range) {
        self.dst_ip = range;
        self.dst_ip_prefix = range.prefix();
    }

    /// Set the source address prefix, recomputing the range.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError::PrefixTooLong`] and leaves the rule unchanged
    /// if the prefix does not fit the dimension.
    pub fn set_src_ip_prefix(&mut self, prefix: PrefixBits) -> Result<(), RangeError> {
        self.src_ip = Ipv4Range::from_prefix(&prefix)?;
        self.src_ip_prefix = prefix;
        Ok(())
    }

    /// Set the destination address prefix, recomputing the range.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError::PrefixTooLong`] and leaves the rule unchanged
    /// if the prefix does not fit the dimension.
    pub fn set_dst_ip_prefix(&mut self, prefix: PrefixBits) -> Result<(), RangeError> {
        self.dst_ip = Ipv4Range::from_prefix(&prefix)?;
        self.dst_ip_prefix = prefix;
        Ok(())
    }

    /// Set the source port spec, recomputing its prefix.
    pub fn set_src_port(&mut self, spec: PortSpec) {
        self.src_port = spec;
        self.src_port_prefix = spec.prefix();
    }

    /// Set the destination port spec, recomputing its prefix.
    pub fn set_dst_port(&mut self, spec: PortSpec) {
        self.dst_port = spec;
        self.dst_port_prefix = spec.prefix();
    }

    /// Set the source port prefix, recomputing the spec.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError::PrefixTooLong`] and leaves the rule unchanged
    /// if the prefix does not fit the dimension.
    pub fn set_src_port_prefix(&mut self, prefix: PrefixBits) -> Result<(), RangeError> {
        self.src_port = PortSpec::from_prefix(&prefix)?;
        self.src_port_prefix = prefix;
        Ok(())
    }

    /// Set the destination port prefix, recomputing the spec.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError::PrefixTooLong`] and leaves the rule unchanged
    /// if the prefix does not fit the dimension.
    pub fn set_dst_port_prefix(&mut self, prefix: PrefixBits) -> Result<(), RangeError> {
        self.dst_port = PortSpec::from_prefix(&prefix)?;
        self.dst_port_prefix = prefix;
        Ok(())
    }
}

impl fmt::Display for Rule {
    /// `permit proto="tcp" srcIP="any" srcPort="any" dstIP="any"
    /// dstPort="any"` — port fields only for TCP/UDP, negated specs wrapped
    /// in `not(...)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} proto=\"{}\" ", self.action, self.protocol)?;
        write!(f, "srcIP=\"{}\" ", self.src_ip)?;
        if self.protocol.is_transport() {
            if self.src_port.negated() {
                write!(f, "srcPort=\"not({})\" ", self.src_port)?;
            } else {
                write!(f, "srcPort=\"{}\" ", self.src_port)?;
            }
        }
        write!(f, "dstIP=\"{}\"", self.dst_ip)?;
        if self.protocol.is_transport() {
            if self.dst_port.negated() {
                write!(f, " dstPort=\"not({})\"", self.dst_port)?;
            } else {
                write!(f, " dstPort=\"{}\"", self.dst_port)?;
            }
        }
        Ok(())
    }
}
