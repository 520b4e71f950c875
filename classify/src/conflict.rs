// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Conflict records and the relation-to-conflict mapping.

use crate::relation::{DimRelation, combine, ipv4_ranges, port_specs, protocols};
use model::{Dimension, Rule};
use std::fmt;

/// The anomaly between an ordered pair of rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConflictKind {
    /// Y never matches anything X doesn't already handle the same way.
    Redundancy,
    /// Y can never fire: X catches all of Y's packets with the other action.
    Shadowing,
    /// Y is a broader cross-action exception around X.
    Generalization,
    /// Partial same-action overlap.
    Superimposing,
    /// Partial cross-action overlap.
    Correlation,
}

impl ConflictKind {
    /// Stable label used in reports.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ConflictKind::Redundancy => "redundancy",
            ConflictKind::Shadowing => "shadowing",
            ConflictKind::Generalization => "generalization",
            ConflictKind::Superimposing => "superimposing",
            ConflictKind::Correlation => "correlation",
        }
    }
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Map the combined relation and the two actions to a conflict kind.
///
/// `None` means the pair is anomaly-free (some dimension is disjoint).
/// The earlier rule X wins under first-match: Y ⊆ X with equal actions is
/// dead-but-harmless redundancy, with differing actions Y is shadowed;
/// Y ⊃ X with differing actions makes Y a generalization exception; partial
/// overlap is superimposing (same action) or correlation (cross action).
#[must_use]
pub fn resolve_kind(
    combined: DimRelation,
    y_action: model::Action,
    x_action: model::Action,
) -> Option<ConflictKind> {
    let same_action = y_action == x_action;
    match combined {
        DimRelation::Disjoint => None,
        DimRelation::Equiv | DimRelation::Subset => Some(if same_action {
            ConflictKind::Redundancy
        } else {
            ConflictKind::Shadowing
        }),
        DimRelation::Superset => Some(if same_action {
            ConflictKind::Redundancy
        } else {
            ConflictKind::Generalization
        }),
        DimRelation::Interleaving => Some(if same_action {
            ConflictKind::Superimposing
        } else {
            ConflictKind::Correlation
        }),
    }
}

/// A classified pair: rule X (earlier), rule Y (later), the conflict kind
/// and the five per-dimension relations, all expressed as Y relative to X.
#[derive(Debug, Clone)]
pub struct Conflict<'a> {
    x: &'a Rule,
    y: &'a Rule,
    kind: ConflictKind,
    relations: [DimRelation; 5],
}

impl<'a> Conflict<'a> {
    /// The earlier rule of the pair.
    #[must_use]
    pub fn rule_x(&self) -> &'a Rule {
        self.x
    }

    /// The later rule of the pair.
    #[must_use]
    pub fn rule_y(&self) -> &'a Rule {
        self.y
    }

    /// The resolved conflict kind.
    #[must_use]
    pub fn kind(&self) -> ConflictKind {
        self.kind
    }

    /// The relation in one dimension.
    #[must_use]
    pub fn relation(&self, dimension: Dimension) -> DimRelation {
        self.relations[dimension as usize]
    }
}

/// Classify an ordered rule pair; `None` when the rules cannot conflict.
///
/// Dimensions are folded in their fixed order (the combination is
/// commutative, so the order is immaterial).
#[must_use]
pub fn classify<'a>(x: &'a Rule, y: &'a Rule) -> Option<Conflict<'a>> {
    let relations = [
        protocols(y.protocol(), x.protocol()),
        ipv4_ranges(y.src_ip(), x.src_ip()),
        ipv4_ranges(y.dst_ip(), x.dst_ip()),
        port_specs(y.src_port(), x.src_port()),
        port_specs(y.dst_port(), x.dst_port()),
    ];
    let combined = relations
        .iter()
        .fold(DimRelation::Equiv, |global, &partial| {
            combine(global, partial)
        });
    let kind = resolve_kind(combined, y.action(), x.action())?;
    Some(Conflict {
        x,
        y,
        kind,
        relations,
    })
}
