// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The per-ACL analysis driver.

use crate::conflict::{Conflict, classify};
use model::Acl;
use tracing::debug;
use trie::PrefixForest;
use wah::BitmapError;

/// Consumer of analysis results.
///
/// The driver announces each ACL once, then hands over every conflict it
/// finds, in discovery order (ascending Y position, ascending X position
/// within one Y).
pub trait ConflictSink {
    /// A new ACL's analysis begins.
    fn begin_acl(&mut self, name: &str);
    /// One classified conflict. The record borrows the ACL's rules and is
    /// only valid during the call.
    fn conflict(&mut self, conflict: &Conflict<'_>);
}

/// Counters for one ACL's analysis.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisStats {
    /// Rules processed.
    pub rules: usize,
    /// Candidate pairs the tries let through to the classifier.
    pub candidate_pairs: usize,
    /// Conflicts emitted.
    pub conflicts: usize,
}

/// Analysis failures.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// An ACL too large for the bitmap index space, or an internal index
    /// contract violation.
    #[error("bitmap failure during analysis")]
    Bitmap(#[from] BitmapError),
    /// More rules than positions addressable by the candidate bitmaps.
    #[error("ACL '{name}' has {rules} rules, more than the analyzer can index")]
    TooManyRules {
        /// the ACL's name
        name: String,
        /// its rule count
        rules: usize,
    },
}

/// Analyze one ACL: feed each rule to the prefix forest, classify the
/// surviving candidate pairs, and emit conflicts to `sink`.
///
/// The forest lives exactly as long as this call; ACLs are independent of
/// each other.
///
/// # Errors
///
/// Returns [`AnalysisError`] if the ACL cannot be indexed. The sink has
/// already been handed `begin_acl` and any conflicts found up to the
/// failure.
pub fn analyze(acl: &Acl, sink: &mut dyn ConflictSink) -> Result<AnalysisStats, AnalysisError> {
    let rule_count = u32::try_from(acl.len()).map_err(|_| AnalysisError::TooManyRules {
        name: acl.name().to_string(),
        rules: acl.len(),
    })?;

    let mut forest = PrefixForest::new(rule_count);
    let mut stats = AnalysisStats {
        rules: acl.len(),
        ..AnalysisStats::default()
    };

    sink.begin_acl(acl.name());
    for rule in acl.rules() {
        let candidates = forest.add_rule(rule)?;
        for position in candidates.iter_ones(0, rule.position())? {
            stats.candidate_pairs += 1;
            let earlier = &acl.rules()[position as usize];
            if let Some(conflict) = classify(earlier, rule) {
                debug!(
                    acl = acl.name(),
                    x = earlier.name(),
                    y = rule.name(),
                    kind = %conflict.kind(),
                    "conflict"
                );
                sink.conflict(&conflict);
                stats.conflicts += 1;
            }
        }
    }

    debug!(
        acl = acl.name(),
        rules = stats.rules,
        pairs = stats.candidate_pairs,
        conflicts = stats.conflicts,
        "analysis finished"
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflict::ConflictKind;
    use crate::relation::DimRelation;
    use model::{Acl, Action, Dimension, Ipv4Range, PortSpec, Protocol, Rule};
    use pretty_assertions::assert_eq;
    use std::net::Ipv4Addr;
    use tracing_test::traced_test;

    /// Records everything the analyzer emits, by value.
    #[derive(Default)]
    struct Recorder {
        acls: Vec<String>,
        found: Vec<(u32, u32, ConflictKind, [DimRelation; 5])>,
    }

    impl ConflictSink for Recorder {
        fn begin_acl(&mut self, name: &str) {
            self.acls.push(name.to_string());
        }

        fn conflict(&mut self, conflict: &Conflict<'_>) {
            self.found.push((
                conflict.rule_x().position(),
                conflict.rule_y().position(),
                conflict.kind(),
                [
                    conflict.relation(Dimension::Protocol),
                    conflict.relation(Dimension::SrcIp),
                    conflict.relation(Dimension::DstIp),
                    conflict.relation(Dimension::SrcPort),
                    conflict.relation(Dimension::DstPort),
                ],
            ));
        }
    }

    fn ip(a: u8, b: u8, c: u8, d: u8) -> Ipv4Addr {
        Ipv4Addr::new(a, b, c, d)
    }

    fn rule(
        position: u32,
        action: Action,
        protocol: Protocol,
        src: Option<Ipv4Range>,
        src_port: Option<PortSpec>,
    ) -> Rule {
        let mut rule = Rule::new(position);
        rule.set_action(action);
        rule.set_protocol(protocol);
        if let Some(range) = src {
            rule.set_src_ip(range);
        }
        if let Some(spec) = src_port {
            rule.set_src_port(spec);
        }
        rule
    }

    fn run(acl: &Acl) -> Recorder {
        let mut recorder = Recorder::default();
        analyze(acl, &mut recorder).expect("analysis succeeds");
        recorder
    }

    const EQ5: [DimRelation; 5] = [DimRelation::Equiv; 5];

    #[traced_test]
    #[test]
    fn test_same_rule_opposite_action_shadows() {
        let mut acl = Acl::new("t1");
        acl.push(rule(0, Action::Permit, Protocol::TCP, None, None));
        acl.push(rule(1, Action::Deny, Protocol::TCP, None, None));
        let recorder = run(&acl);
        assert_eq!(recorder.acls, vec!["t1"]);
        assert_eq!(
            recorder.found,
            vec![(0, 1, ConflictKind::Shadowing, EQ5)]
        );
        assert!(logs_contain("analysis finished"));
    }

    #[test]
    fn test_contained_source_range_is_redundancy() {
        let mut acl = Acl::new("t2");
        acl.push(rule(
            0,
            Action::Permit,
            Protocol::Ip,
            Some(Ipv4Range::new(ip(10, 0, 0, 0), ip(10, 0, 0, 255)).unwrap()),
            None,
        ));
        acl.push(rule(
            1,
            Action::Permit,
            Protocol::Ip,
            Some(Ipv4Range::new(ip(10, 0, 0, 50), ip(10, 0, 0, 60)).unwrap()),
            None,
        ));
        let recorder = run(&acl);
        let mut relations = EQ5;
        relations[Dimension::SrcIp as usize] = DimRelation::Subset;
        assert_eq!(
            recorder.found,
            vec![(0, 1, ConflictKind::Redundancy, relations)]
        );
    }

    #[test]
    fn test_wider_cross_action_rule_is_generalization() {
        let mut acl = Acl::new("t3");
        acl.push(rule(
            0,
            Action::Deny,
            Protocol::TCP,
            Some(Ipv4Range::host(ip(10, 0, 0, 5))),
            None,
        ));
        acl.push(rule(
            1,
            Action::Permit,
            Protocol::TCP,
            Some(Ipv4Range::new(ip(10, 0, 0, 0), ip(10, 0, 0, 255)).unwrap()),
            None,
        ));
        let recorder = run(&acl);
        let mut relations = EQ5;
        relations[Dimension::SrcIp as usize] = DimRelation::Superset;
        assert_eq!(
            recorder.found,
            vec![(0, 1, ConflictKind::Generalization, relations)]
        );
    }

    #[test]
    fn test_disjoint_sources_never_reach_the_classifier() {
        let mut acl = Acl::new("t4");
        acl.push(rule(
            0,
            Action::Permit,
            Protocol::TCP,
            Some(Ipv4Range::new(ip(10, 0, 0, 0), ip(10, 0, 0, 255)).unwrap()),
            None,
        ));
        acl.push(rule(
            1,
            Action::Permit,
            Protocol::TCP,
            Some(Ipv4Range::new(ip(192, 168, 0, 0), ip(192, 168, 0, 255)).unwrap()),
            None,
        ));
        let recorder = run(&acl);
        assert_eq!(recorder.found, vec![]);

        // the pruning itself rejects the pair: candidate bit 0 is clear
        let mut forest = PrefixForest::new(2);
        forest.add_rule(&acl.rules()[0]).unwrap();
        let candidates = forest.add_rule(&acl.rules()[1]).unwrap();
        assert!(!candidates.get(0).unwrap());
    }

    #[test]
    fn test_interleaving_ports_same_action_superimpose() {
        let mut acl = Acl::new("t5");
        acl.push(rule(
            0,
            Action::Permit,
            Protocol::UDP,
            None,
            Some(PortSpec::new(1000, 2000, false).unwrap()),
        ));
        acl.push(rule(
            1,
            Action::Permit,
            Protocol::UDP,
            None,
            Some(PortSpec::new(1500, 2500, false).unwrap()),
        ));
        let recorder = run(&acl);
        let mut relations = EQ5;
        relations[Dimension::SrcPort as usize] = DimRelation::Interleaving;
        assert_eq!(
            recorder.found,
            vec![(0, 1, ConflictKind::Superimposing, relations)]
        );
    }

    #[test]
    fn test_protocol_widening_same_action_is_redundancy() {
        let mut acl = Acl::new("t6");
        acl.push(rule(0, Action::Permit, Protocol::TCP, None, None));
        acl.push(rule(1, Action::Permit, Protocol::Ip, None, None));
        let recorder = run(&acl);
        let mut relations = EQ5;
        relations[Dimension::Protocol as usize] = DimRelation::Superset;
        assert_eq!(
            recorder.found,
            vec![(0, 1, ConflictKind::Redundancy, relations)]
        );
    }

    #[test]
    fn test_conflicts_come_out_in_discovery_order() {
        let mut acl = Acl::new("order");
        acl.push(rule(0, Action::Permit, Protocol::TCP, None, None));
        acl.push(rule(1, Action::Deny, Protocol::TCP, None, None));
        acl.push(rule(2, Action::Permit, Protocol::TCP, None, None));
        let recorder = run(&acl);
        let pairs: Vec<(u32, u32)> = recorder.found.iter().map(|f| (f.0, f.1)).collect();
        assert_eq!(pairs, vec![(0, 1), (0, 2), (1, 2)]);
    }

    #[test]
    fn test_empty_acl_reports_nothing() {
        let acl = Acl::new("empty");
        let mut recorder = Recorder::default();
        let stats = analyze(&acl, &mut recorder).unwrap();
        assert_eq!(stats, AnalysisStats::default());
        assert_eq!(recorder.acls, vec!["empty"]);
    }

    #[test]
    fn test_stats_count_pruned_and_classified_pairs() {
        let mut acl = Acl::new("stats");
        acl.push(rule(0, Action::Permit, Protocol::TCP, None, None));
        acl.push(rule(1, Action::Deny, Protocol::TCP, None, None));
        acl.push(rule(
            2,
            Action::Permit,
            Protocol::UDP,
            None,
            None,
        ));
        let mut recorder = Recorder::default();
        let stats = analyze(&acl, &mut recorder).unwrap();
        assert_eq!(stats.rules, 3);
        // rule 2 is disjoint from both in the protocol dimension, so only
        // the (0, 1) pair reaches the classifier
        assert_eq!(stats.candidate_pairs, 1);
        assert_eq!(stats.conflicts, 1);
    }
}
