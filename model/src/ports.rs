// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Well-known TCP/UDP service names.
//!
//! One fixed table serves both directions: the renderer maps numbers to
//! canonical names, the device-config parser maps names (and a few vendor
//! spellings) back to numbers.

/// Canonical service names, ordered by port number.
const SERVICES: &[(u16, &str)] = &[
    (7, "echo"),
    (9, "discard"),
    (13, "daytime"),
    (19, "chargen"),
    (20, "ftp-data"),
    (21, "ftp"),
    (22, "ssh"),
    (23, "telnet"),
    (25, "smtp"),
    (37, "time"),
    (42, "nameserver"),
    (43, "whois"),
    (49, "tacacs"),
    (53, "domain"),
    (67, "bootps"),
    (68, "bootpc"),
    (69, "tftp"),
    (70, "gopher"),
    (79, "finger"),
    (80, "http"),
    (88, "kerberos-sec"),
    (101, "hostname"),
    (109, "pop2"),
    (110, "pop3"),
    (111, "sunrpc"),
    (113, "ident"),
    (119, "nntp"),
    (123, "ntp"),
    (137, "netbios-ns"),
    (138, "netbios-dgm"),
    (139, "netbios-ss"),
    (143, "imap"),
    (161, "snmp"),
    (162, "snmptrap"),
    (177, "xdmcp"),
    (179, "bgp"),
    (194, "irc"),
    (195, "dnsix"),
    (389, "ldap"),
    (434, "mobile-ip"),
    (443, "https"),
    (496, "pim-auto-rp"),
    (500, "isakmp"),
    (512, "exec"),
    (513, "login"),
    (514, "syslog"),
    (515, "lpd"),
    (517, "talk"),
    (520, "rip"),
    (540, "uucp"),
    (543, "klogin"),
    (544, "kshell"),
    (1080, "socks"),
    (1723, "pptp"),
    (1812, "radius"),
    (2049, "nfsd"),
    (2401, "cvspserver"),
    (4500, "non500-isakmp"),
];

/// Vendor spellings accepted on input only.
const ALIASES: &[(&str, u16)] = &[
    ("www", 80),
    ("dns", 53),
    ("biff", 512),
    ("who", 513),
    ("rwho", 513),
    ("cmd", 514),
    ("router", 520),
];

/// The canonical name of a well-known port, if any.
#[must_use]
pub fn service_name(port: u16) -> Option<&'static str> {
    SERVICES
        .binary_search_by_key(&port, |&(number, _)| number)
        .ok()
        .map(|i| SERVICES[i].1)
}

/// The port number for a service name, accepting canonical names and vendor
/// aliases. Matching is case-sensitive; device configs are lower-case.
#[must_use]
pub fn port_number(name: &str) -> Option<u16> {
    SERVICES
        .iter()
        .find(|&&(_, n)| n == name)
        .map(|&(number, _)| number)
        .or_else(|| {
            ALIASES
                .iter()
                .find(|&&(n, _)| n == name)
                .map(|&(_, number)| number)
        })
}
