// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Entity model for packet-filter access control lists.
//!
//! A [`Rule`] is a five-dimensional predicate (protocol, source and
//! destination IPv4 ranges, source and destination port specs) plus an
//! [`Action`]; an [`Acl`] is an ordered, owning sequence of rules. Each
//! dimension also carries a derived [`PrefixBits`] view (the longest common
//! binary prefix of the range bounds) which the anomaly analysis indexes;
//! range setters recompute the prefix and prefix setters recompute the
//! range, so both views are always coherent.

#![forbid(unsafe_code)]
#![deny(clippy::all)]

mod acl;
mod ports;
mod prefix;
mod proto;
mod range;
mod rule;

pub use acl::Acl;
pub use ports::{port_number, service_name};
pub use prefix::{InvalidPrefixBits, PrefixBits};
pub use proto::{InvalidProtocol, Protocol};
pub use range::{Ipv4Range, PortSpec, RangeError};
pub use rule::{Action, Dimension, InvalidAction, Rule};
