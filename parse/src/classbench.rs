// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! ClassBench filter-set parser.
//!
//! One rule per line:
//!
//! ```text
//! @sip/len  dip/len  lo : hi  lo : hi  proto/mask  [flags...]
//! ```
//!
//! The whole input forms one anonymous ACL; every rule permits. Protocol
//! `0x00/0x00` means any IPv4-payload protocol, otherwise the constraint is
//! `number & mask`. Lines not starting with `@` are skipped, trailing
//! fields past the protocol are ignored.

use crate::ParseError;
use model::{Acl, Action, Ipv4Range, PortSpec, Protocol, Rule};
use std::io::BufRead;
use std::net::Ipv4Addr;
use tracing::debug;

pub(crate) fn parse(input: impl BufRead) -> Result<Vec<Acl>, ParseError> {
    let mut acl = Acl::new("no-ID");

    for (index, line) in input.lines().enumerate() {
        let line = line?;
        let number = index + 1;
        let Some(body) = line.strip_prefix('@') else {
            if !line.trim().is_empty() {
                debug!(line = number, "line does not start with '@', skipped");
            }
            continue;
        };

        let tokens: Vec<&str> = body.split_whitespace().collect();
        if tokens.len() < 9 || tokens[3] != ":" || tokens[6] != ":" {
            return Err(ParseError::Malformed {
                line: number,
                reason: "expected sip/len dip/len lo : hi lo : hi proto/mask".to_string(),
            });
        }

        #[allow(clippy::cast_possible_truncation)] // a filter set cannot reach 2^32 rules
        let mut rule = Rule::new(acl.len() as u32);
        rule.set_action(Action::Permit);
        rule.set_src_ip(parse_prefixed_address(number, tokens[0])?);
        rule.set_dst_ip(parse_prefixed_address(number, tokens[1])?);
        rule.set_src_port(parse_port_range(number, tokens[2], tokens[4])?);
        rule.set_dst_port(parse_port_range(number, tokens[5], tokens[7])?);
        rule.set_protocol(parse_protocol(number, tokens[8])?);
        acl.push(rule);
    }

    Ok(vec![acl])
}

/// `A.B.C.D/len` clamped to the masked network range.
fn parse_prefixed_address(line: usize, token: &str) -> Result<Ipv4Range, ParseError> {
    let bad = || ParseError::BadAddress {
        line,
        text: token.to_string(),
    };
    let (addr, len) = token.split_once('/').ok_or_else(bad)?;
    let addr: Ipv4Addr = addr.parse().map_err(|_| bad())?;
    let len: u32 = len.parse().map_err(|_| bad())?;
    if len > 32 {
        return Err(bad());
    }
    let mask = if len == 0 {
        0
    } else {
        u32::MAX << (32 - len)
    };
    let start = u32::from(addr) & mask;
    let stop = start | !mask;
    Ipv4Range::from_u32(start, stop).map_err(|_| bad())
}

fn parse_port_range(line: usize, lo: &str, hi: &str) -> Result<PortSpec, ParseError> {
    let bad = |text: &str| ParseError::BadPort {
        line,
        text: text.to_string(),
    };
    let start: u16 = lo.parse().map_err(|_| bad(lo))?;
    let stop: u16 = hi.parse().map_err(|_| bad(hi))?;
    PortSpec::new(start, stop, false).map_err(|_| bad(hi))
}

/// `0xNN/0xMM` hex pair; `0/0` is the unconstrained IPv4 protocol.
fn parse_protocol(line: usize, token: &str) -> Result<Protocol, ParseError> {
    let bad = || ParseError::BadProtocol {
        line,
        text: token.to_string(),
    };
    let (number, mask) = token.split_once('/').ok_or_else(bad)?;
    let number = u8::from_str_radix(number.trim_start_matches("0x"), 16).map_err(|_| bad())?;
    let mask = u8::from_str_radix(mask.trim_start_matches("0x"), 16).map_err(|_| bad())?;
    if number == 0 && mask == 0 {
        Ok(Protocol::Ip)
    } else {
        Ok(Protocol::Num(number & mask))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    #[test]
    fn test_single_filter_line() {
        let text = "@192.168.0.0/24\t10.0.0.0/8\t0 : 65535\t80 : 80\t0x06/0xFF\n";
        let acls = parse(Cursor::new(text)).unwrap();
        assert_eq!(acls.len(), 1);
        let acl = &acls[0];
        assert_eq!(acl.name(), "no-ID");
        assert_eq!(acl.len(), 1);

        let rule = &acl.rules()[0];
        assert_eq!(rule.action(), Action::Permit);
        assert_eq!(rule.protocol(), Protocol::TCP);
        assert_eq!(rule.src_ip().start(), Ipv4Addr::new(192, 168, 0, 0));
        assert_eq!(rule.src_ip().stop(), Ipv4Addr::new(192, 168, 0, 255));
        assert_eq!(rule.dst_ip().stop(), Ipv4Addr::new(10, 255, 255, 255));
        assert!(rule.src_port().is_any());
        assert_eq!(rule.dst_port().start(), 80);
        assert_eq!(rule.dst_port().stop(), 80);
    }

    #[test]
    fn test_zero_protocol_means_ip() {
        let text = "@0.0.0.0/0\t0.0.0.0/0\t0 : 65535\t0 : 65535\t0x00/0x00\n";
        let acls = parse(Cursor::new(text)).unwrap();
        let rule = &acls[0].rules()[0];
        assert_eq!(rule.protocol(), Protocol::Ip);
        assert!(rule.src_ip().is_any());
    }

    #[test]
    fn test_trailing_flag_fields_are_ignored() {
        let text =
            "@1.2.3.4/32\t0.0.0.0/0\t0 : 65535\t1000 : 2000\t0x11/0xFF\t0x0000/0x0200\n";
        let acls = parse(Cursor::new(text)).unwrap();
        let rule = &acls[0].rules()[0];
        assert_eq!(rule.protocol(), Protocol::UDP);
        assert_eq!(rule.dst_port().stop(), 2000);
    }

    #[test]
    fn test_non_rule_lines_are_skipped() {
        let text = "# generated by db_generator\n\
                    @1.0.0.0/8\t2.0.0.0/8\t0 : 65535\t0 : 65535\t0x06/0xFF\n";
        let acls = parse(Cursor::new(text)).unwrap();
        assert_eq!(acls[0].len(), 1);
    }

    #[test]
    fn test_malformed_line_aborts() {
        let text = "@1.0.0.0/8\t2.0.0.0/8\t0 : 65535\n";
        assert!(matches!(
            parse(Cursor::new(text)),
            Err(ParseError::Malformed { line: 1, .. })
        ));
    }

    #[test]
    fn test_mask_past_32_bits_is_rejected() {
        let text = "@1.0.0.0/40\t2.0.0.0/8\t0 : 65535\t0 : 65535\t0x06/0xFF\n";
        assert!(matches!(
            parse(Cursor::new(text)),
            Err(ParseError::BadAddress { line: 1, .. })
        ));
    }
}
