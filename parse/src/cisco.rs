// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Cisco-style configuration parser.
//!
//! Recognized commands:
//!
//! - `access-list <id> permit|deny ...` — the numbered form; consecutive
//!   lines with one id form one ACL. Ids 1-99 and 1300-1999 are standard
//!   lists (source constraint only), everything else is extended.
//! - `ip access-list extended|standard <name>` — opens a named list whose
//!   `permit`/`deny` lines follow.
//! - `remark` lines and unrecognized commands are skipped.

use crate::ParseError;
use model::{Acl, Action, Ipv4Range, PortSpec, Protocol, Rule, port_number};
use std::io::BufRead;
use std::net::Ipv4Addr;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Standard,
    Extended,
}

/// A named block opened by `ip access-list`, if any.
struct Block {
    acl: usize,
    kind: ListKind,
}

pub(crate) fn parse(input: impl BufRead) -> Result<Vec<Acl>, ParseError> {
    let mut acls: Vec<Acl> = Vec::new();
    let mut block: Option<Block> = None;

    for (index, line) in input.lines().enumerate() {
        let line = line?;
        let number = index + 1;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let mut cursor = Cursor {
            tokens: &tokens,
            at: 0,
            line: number,
        };

        match cursor.peek() {
            Some("access-list") => {
                block = None;
                cursor.advance();
                let id = cursor.expect("list id")?;
                let kind = numbered_kind(id);
                let Some(action) = parse_action(cursor.peek()) else {
                    // remark or unsupported feature on a numbered list
                    debug!(line = number, "skipping non-rule access-list line");
                    continue;
                };
                cursor.advance();
                let acl = acl_index(&mut acls, id);
                let rule = parse_rule(&mut cursor, rule_position(&acls[acl]), kind, action)?;
                acls[acl].push(rule);
            }
            Some("ip") if tokens.get(1) == Some(&"access-list") => {
                let kind = match tokens.get(2) {
                    Some(&"standard") => ListKind::Standard,
                    Some(&"extended") => ListKind::Extended,
                    other => {
                        return Err(ParseError::Malformed {
                            line: number,
                            reason: format!("unsupported access-list kind {other:?}"),
                        });
                    }
                };
                let Some(name) = tokens.get(3) else {
                    return Err(ParseError::Malformed {
                        line: number,
                        reason: "ip access-list without a name".to_string(),
                    });
                };
                block = Some(Block {
                    acl: acl_index(&mut acls, name),
                    kind,
                });
            }
            Some(token @ ("permit" | "deny")) => {
                let Some(open) = &block else {
                    debug!(line = number, "rule line outside any access-list, skipped");
                    continue;
                };
                let action = if token == "permit" {
                    Action::Permit
                } else {
                    Action::Deny
                };
                cursor.advance();
                let rule = parse_rule(
                    &mut cursor,
                    rule_position(&acls[open.acl]),
                    open.kind,
                    action,
                )?;
                acls[open.acl].push(rule);
            }
            _ => {
                // comments, interface statements, blank lines
            }
        }
    }

    Ok(acls)
}

/// Token cursor over one line.
struct Cursor<'a> {
    tokens: &'a [&'a str],
    at: usize,
    line: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.at).copied()
    }

    fn advance(&mut self) {
        self.at += 1;
    }

    fn bump(&mut self) -> Option<&'a str> {
        let token = self.peek();
        self.at += 1;
        token
    }

    fn expect(&mut self, what: &str) -> Result<&'a str, ParseError> {
        self.bump().ok_or_else(|| ParseError::Malformed {
            line: self.line,
            reason: format!("missing {what}"),
        })
    }
}

/// Cisco numbers standard lists 1-99 and 1300-1999.
fn numbered_kind(id: &str) -> ListKind {
    match id.parse::<u32>() {
        Ok(n) if (1..=99).contains(&n) || (1300..=1999).contains(&n) => ListKind::Standard,
        _ => ListKind::Extended,
    }
}

fn parse_action(token: Option<&str>) -> Option<Action> {
    match token {
        Some("permit") => Some(Action::Permit),
        Some("deny") => Some(Action::Deny),
        _ => None,
    }
}

/// Index of the ACL named `name`, creating it at the back if new.
fn acl_index(acls: &mut Vec<Acl>, name: &str) -> usize {
    match acls.iter().position(|acl| acl.name() == name) {
        Some(index) => index,
        None => {
            acls.push(Acl::new(name));
            acls.len() - 1
        }
    }
}

#[allow(clippy::cast_possible_truncation)] // an ACL cannot reach 2^32 rules
fn rule_position(acl: &Acl) -> u32 {
    acl.len() as u32
}

/// Parse the remainder of a `permit`/`deny` line into a rule.
fn parse_rule(
    cursor: &mut Cursor<'_>,
    position: u32,
    kind: ListKind,
    action: Action,
) -> Result<Rule, ParseError> {
    let mut rule = Rule::new(position);
    rule.set_action(action);

    match kind {
        ListKind::Standard => {
            // standard lists constrain the source address only
            rule.set_protocol(Protocol::Ip);
            rule.set_src_ip(parse_address(cursor)?);
        }
        ListKind::Extended => {
            let protocol = parse_protocol(cursor)?;
            rule.set_protocol(protocol);
            rule.set_src_ip(parse_address(cursor)?);
            if protocol.is_transport() {
                if let Some(spec) = parse_ports(cursor)? {
                    rule.set_src_port(spec);
                }
            }
            rule.set_dst_ip(parse_address(cursor)?);
            if protocol.is_transport() {
                if let Some(spec) = parse_ports(cursor)? {
                    rule.set_dst_port(spec);
                }
            }
        }
    }
    Ok(rule)
}

fn parse_protocol(cursor: &mut Cursor<'_>) -> Result<Protocol, ParseError> {
    let token = cursor.expect("protocol")?;
    let protocol = match token {
        "ip" => Protocol::Ip,
        "icmp" => Protocol::ICMP,
        "igmp" => Protocol::IGMP,
        "ipinip" | "nos" => Protocol::IP_IN_IP,
        "tcp" => Protocol::TCP,
        "udp" => Protocol::UDP,
        "gre" => Protocol::GRE,
        "esp" => Protocol::ESP,
        "ahp" => Protocol::AH,
        "eigrp" => Protocol::EIGRP,
        "ospf" => Protocol::OSPF,
        "pim" => Protocol::PIM,
        other => match other.parse::<u8>() {
            Ok(number) => Protocol::Num(number),
            Err(_) => {
                return Err(ParseError::BadProtocol {
                    line: cursor.line,
                    text: other.to_string(),
                });
            }
        },
    };
    Ok(protocol)
}

fn parse_ipv4(cursor: &Cursor<'_>, token: &str) -> Result<Ipv4Addr, ParseError> {
    token.parse().map_err(|_| ParseError::BadAddress {
        line: cursor.line,
        text: token.to_string(),
    })
}

/// `any`, `host A.B.C.D`, or `A.B.C.D [W.W.W.W]` with a wildcard mask.
/// A missing wildcard means a host match.
fn parse_address(cursor: &mut Cursor<'_>) -> Result<Ipv4Range, ParseError> {
    match cursor.expect("address")? {
        "any" => Ok(Ipv4Range::ANY),
        "host" => {
            let token = cursor.expect("host address")?;
            Ok(Ipv4Range::host(parse_ipv4(cursor, token)?))
        }
        token => {
            let addr = parse_ipv4(cursor, token)?;
            let wildcard = match cursor.peek().map(str::parse::<Ipv4Addr>) {
                Some(Ok(mask)) => {
                    cursor.advance();
                    u32::from(mask)
                }
                _ => 0,
            };
            let start = u32::from(addr) & !wildcard;
            let stop = start | wildcard;
            Ipv4Range::from_u32(start, stop).map_err(|_| ParseError::BadAddress {
                line: cursor.line,
                text: token.to_string(),
            })
        }
    }
}

fn parse_port_token(cursor: &mut Cursor<'_>) -> Result<u16, ParseError> {
    let token = cursor.expect("port")?;
    if let Ok(number) = token.parse::<u16>() {
        return Ok(number);
    }
    port_number(token).ok_or_else(|| ParseError::BadPort {
        line: cursor.line,
        text: token.to_string(),
    })
}

/// An optional port operator: `eq`, `neq`, `lt`, `gt` or `range`.
fn parse_ports(cursor: &mut Cursor<'_>) -> Result<Option<PortSpec>, ParseError> {
    let operator = match cursor.peek() {
        Some(op @ ("eq" | "neq" | "lt" | "gt" | "range")) => op,
        _ => return Ok(None),
    };
    cursor.advance();
    let port = parse_port_token(cursor)?;
    let spec = match operator {
        "eq" => PortSpec::eq(port),
        "neq" => PortSpec::new(port, port, true).expect("single port is ordered"),
        "lt" => PortSpec::new(0, port.saturating_sub(1), false).expect("0 <= port - 1"),
        "gt" => PortSpec::new(port.saturating_add(1), u16::MAX, false)
            .expect("port + 1 <= 65535"),
        "range" => {
            let stop = parse_port_token(cursor)?;
            PortSpec::new(port, stop, false).map_err(|_| ParseError::Malformed {
                line: cursor.line,
                reason: format!("inverted port range {port}-{stop}"),
            })?
        }
        _ => unreachable!("operator matched above"),
    };
    Ok(Some(spec))
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::Dimension;
    use pretty_assertions::assert_eq;
    use std::io::Cursor as IoCursor;

    fn parse_text(text: &str) -> Vec<Acl> {
        parse(IoCursor::new(text)).expect("test input parses")
    }

    #[test]
    fn test_numbered_extended_rules() {
        let acls = parse_text(
            "access-list 101 permit tcp any host 10.0.0.1 eq http\n\
             access-list 101 deny ip any any\n",
        );
        assert_eq!(acls.len(), 1);
        let acl = &acls[0];
        assert_eq!(acl.name(), "101");
        assert_eq!(acl.len(), 2);

        let first = &acl.rules()[0];
        assert_eq!(first.action(), Action::Permit);
        assert_eq!(first.protocol(), Protocol::TCP);
        assert!(first.src_ip().is_any());
        assert_eq!(first.dst_ip().start(), Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(first.dst_ip().stop(), Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(first.dst_port().start(), 80);
        assert_eq!(first.dst_port().stop(), 80);

        let second = &acl.rules()[1];
        assert_eq!(second.action(), Action::Deny);
        assert_eq!(second.protocol(), Protocol::Ip);
        assert_eq!(second.position(), 1);
    }

    #[test]
    fn test_wildcard_mask_becomes_range() {
        let acls = parse_text("access-list 102 permit ip 10.0.0.0 0.0.0.255 any\n");
        let rule = &acls[0].rules()[0];
        assert_eq!(rule.src_ip().start(), Ipv4Addr::new(10, 0, 0, 0));
        assert_eq!(rule.src_ip().stop(), Ipv4Addr::new(10, 0, 0, 255));
        assert_eq!(rule.prefix(Dimension::SrcIp).len(), 24);
    }

    #[test]
    fn test_port_operators() {
        let acls = parse_text(
            "access-list 103 permit tcp any lt 1024 any gt 4000\n\
             access-list 103 permit udp any neq domain any range 5000 6000\n",
        );
        let rules = acls[0].rules();
        assert_eq!(rules[0].src_port().start(), 0);
        assert_eq!(rules[0].src_port().stop(), 1023);
        assert_eq!(rules[0].dst_port().start(), 4001);
        assert_eq!(rules[0].dst_port().stop(), u16::MAX);

        assert_eq!(rules[1].src_port().start(), 53);
        assert!(rules[1].src_port().negated());
        assert_eq!(rules[1].dst_port().start(), 5000);
        assert_eq!(rules[1].dst_port().stop(), 6000);
    }

    #[test]
    fn test_named_extended_block() {
        let acls = parse_text(
            "ip access-list extended edge-in\n\
             remark block telnet from the lab\n\
             deny tcp 192.168.1.0 0.0.0.255 any eq telnet\n\
             permit ip any any\n",
        );
        assert_eq!(acls.len(), 1);
        assert_eq!(acls[0].name(), "edge-in");
        assert_eq!(acls[0].len(), 2);
        assert_eq!(acls[0].rules()[0].dst_port().start(), 23);
    }

    #[test]
    fn test_named_standard_block_constrains_source_only() {
        let acls = parse_text(
            "ip access-list standard mgmt\n\
             permit 10.1.0.0 0.0.255.255\n\
             deny any\n",
        );
        let rules = acls[0].rules();
        assert_eq!(rules[0].protocol(), Protocol::Ip);
        assert_eq!(rules[0].src_ip().stop(), Ipv4Addr::new(10, 1, 255, 255));
        assert!(rules[0].dst_ip().is_any());
        assert!(rules[1].src_ip().is_any());
    }

    #[test]
    fn test_numbered_standard_list() {
        let acls = parse_text("access-list 10 permit 172.16.0.0 0.0.255.255\n");
        let rule = &acls[0].rules()[0];
        assert_eq!(rule.protocol(), Protocol::Ip);
        assert_eq!(rule.src_ip().start(), Ipv4Addr::new(172, 16, 0, 0));
    }

    #[test]
    fn test_interleaved_numbered_lists_group_by_id() {
        let acls = parse_text(
            "access-list 101 permit tcp any any\n\
             access-list 102 deny udp any any\n\
             access-list 101 deny ip any any\n",
        );
        assert_eq!(acls.len(), 2);
        assert_eq!(acls[0].name(), "101");
        assert_eq!(acls[0].len(), 2);
        assert_eq!(acls[1].name(), "102");
        assert_eq!(acls[1].len(), 1);
        // positions stay per-ACL
        assert_eq!(acls[0].rules()[1].position(), 1);
    }

    #[test]
    fn test_unknown_lines_are_skipped() {
        let acls = parse_text(
            "hostname edge-router\n\
             !\n\
             access-list 101 permit tcp any any\n\
             interface GigabitEthernet0/0\n",
        );
        assert_eq!(acls.len(), 1);
        assert_eq!(acls[0].len(), 1);
    }

    #[test]
    fn test_numeric_protocol() {
        let acls = parse_text("access-list 104 permit 89 any any\n");
        assert_eq!(acls[0].rules()[0].protocol(), Protocol::OSPF);
    }

    #[test]
    fn test_bad_port_name_is_an_error() {
        let result = parse(IoCursor::new("access-list 105 permit tcp any eq bogus any\n"));
        assert!(matches!(
            result,
            Err(ParseError::BadPort { line: 1, .. })
        ));
    }

    #[test]
    fn test_bad_address_is_an_error() {
        let result = parse(IoCursor::new("access-list 105 permit tcp host 10.0.0 any\n"));
        assert!(matches!(result, Err(ParseError::BadAddress { line: 1, .. })));
    }
}
