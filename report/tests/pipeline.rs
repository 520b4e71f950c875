// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Whole-pipeline checks: input text through parsing, analysis and XML
//! rendering.

use classify::analyze;
use parse::{InputFormat, parse_acls};
use report::{DetailLevel, XmlReport};
use std::io::Cursor;

fn run(format: InputFormat, text: &str, detail: DetailLevel) -> (usize, String) {
    let acls = parse_acls(format, Cursor::new(text)).expect("input parses");
    let mut report = XmlReport::new(detail);
    for acl in &acls {
        analyze(acl, &mut report).expect("analysis succeeds");
    }
    let mut out = Vec::new();
    report.flush(&mut out).expect("report renders");
    (report.conflict_count(), String::from_utf8(out).expect("utf-8"))
}

#[test]
fn test_cisco_config_to_xml() {
    let config = "\
        ip access-list extended edge-in\n\
        remark lab may not telnet out\n\
        deny tcp 192.168.1.0 0.0.0.255 any eq telnet\n\
        permit tcp 192.168.1.0 0.0.0.255 any\n\
        permit ip any any\n";
    let (conflicts, xml) = run(InputFormat::Cisco, config, DetailLevel::Two);

    // the wider permits generalize the telnet deny; the final permit-any
    // makes the earlier permit redundant
    assert_eq!(conflicts, 3);
    assert!(xml.contains("<access-list id=\"edge-in\">"));
    assert!(xml.contains("<conflict type=\"generalization\">"));
    assert!(xml.contains("<conflict type=\"redundancy\">"));
    assert!(xml.contains("srcIP=\"192.168.1.0-192.168.1.255\""));
}

#[test]
fn test_cisco_disjoint_lists_stay_quiet() {
    let config = "\
        access-list 101 permit tcp 10.0.0.0 0.0.0.255 any\n\
        access-list 101 permit tcp 192.168.0.0 0.0.0.255 any\n";
    let (conflicts, xml) = run(InputFormat::Cisco, config, DetailLevel::One);
    assert_eq!(conflicts, 0);
    assert!(xml.contains("<access-list id=\"101\"/>"));
}

#[test]
fn test_classbench_to_xml_with_relations() {
    let filters = "\
        @10.0.0.0/24\t0.0.0.0/0\t1000 : 2000\t0 : 65535\t0x11/0xFF\n\
        @10.0.0.0/24\t0.0.0.0/0\t1500 : 2500\t0 : 65535\t0x11/0xFF\n";
    let (conflicts, xml) = run(InputFormat::ClassBench, filters, DetailLevel::Four);
    assert_eq!(conflicts, 1);
    assert!(xml.contains("<access-list id=\"no-ID\">"));
    assert!(xml.contains("<conflict type=\"superimposing\">"));
    assert!(xml.contains("srcPort=\"Y_interleaving_X\""));
    assert!(xml.contains("dstPort=\"Y_equivalent_X\""));
}

#[test]
fn test_shadowed_rule_is_reported_cross_action() {
    let config = "\
        access-list 102 permit tcp any any\n\
        access-list 102 deny tcp any any\n";
    let (conflicts, xml) = run(InputFormat::Cisco, config, DetailLevel::Three);
    assert_eq!(conflicts, 1);
    assert!(xml.contains("<conflict type=\"shadowing\">"));
    assert!(xml.contains("action=\"permit\""));
    assert!(xml.contains("action=\"deny\""));
}
