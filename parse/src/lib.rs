// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Input parsers producing the abstract ACL model.
//!
//! Two input families are supported: device-configuration text in the
//! Cisco style (`access-list` / `ip access-list` commands) and flat
//! ClassBench filter tables. The analysis core is oblivious to formats;
//! parsers only talk to it through [`model::Acl`].

#![forbid(unsafe_code)]
#![deny(clippy::all)]

use model::Acl;
use std::io::BufRead;
use std::str::FromStr;

mod cisco;
mod classbench;

/// Supported input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// Cisco-style device configuration.
    Cisco,
    /// ClassBench filter set.
    ClassBench,
}

/// An unrecognized `--format` value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("\"{0}\" is not a valid input format.  Must be cisco or bench")]
pub struct UnknownFormat(String);

impl FromStr for InputFormat {
    type Err = UnknownFormat;

    fn from_str(input: &str) -> Result<InputFormat, UnknownFormat> {
        match input {
            "cisco" => Ok(InputFormat::Cisco),
            "bench" | "classbench" => Ok(InputFormat::ClassBench),
            other => Err(UnknownFormat(other.to_string())),
        }
    }
}

/// Parse failures. Line numbers are 1-based; a failure aborts the whole
/// input it occurred in.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The input could not be read.
    #[error("failed to read input")]
    Io(#[from] std::io::Error),
    /// A token that should have been an IPv4 address or mask.
    #[error("line {line}: invalid IPv4 address '{text}'")]
    BadAddress {
        /// 1-based input line
        line: usize,
        /// the offending token
        text: String,
    },
    /// A token that should have been a port number or service name.
    #[error("line {line}: unknown port '{text}'")]
    BadPort {
        /// 1-based input line
        line: usize,
        /// the offending token
        text: String,
    },
    /// A token that should have been a protocol keyword or number.
    #[error("line {line}: unknown protocol '{text}'")]
    BadProtocol {
        /// 1-based input line
        line: usize,
        /// the offending token
        text: String,
    },
    /// A structurally broken rule line.
    #[error("line {line}: malformed rule: {reason}")]
    Malformed {
        /// 1-based input line
        line: usize,
        /// what was missing or unexpected
        reason: String,
    },
}

/// Parse a whole input into ACLs in the given format.
///
/// # Errors
///
/// Returns [`ParseError`] on I/O failure or on the first malformed rule.
pub fn parse_acls(format: InputFormat, input: impl BufRead) -> Result<Vec<Acl>, ParseError> {
    match format {
        InputFormat::Cisco => cisco::parse(input),
        InputFormat::ClassBench => classbench::parse(input),
    }
}
