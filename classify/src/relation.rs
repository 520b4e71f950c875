// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Per-dimension set relations and their combination.

use model::{Ipv4Range, PortSpec, Protocol};
use std::fmt;

/// How one dimension of rule Y relates to the same dimension of rule X.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DimRelation {
    /// The sets share nothing.
    Disjoint,
    /// The sets are identical.
    Equiv,
    /// Y's set is a proper subset of X's.
    Subset,
    /// Y's set is a proper superset of X's.
    Superset,
    /// The sets overlap without containment.
    Interleaving,
}

impl DimRelation {
    /// The relation seen from the other side of the pair.
    #[must_use]
    pub fn inverse(self) -> DimRelation {
        match self {
            DimRelation::Subset => DimRelation::Superset,
            DimRelation::Superset => DimRelation::Subset,
            other => other,
        }
    }

    /// Stable label used in detail-4 reports.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            DimRelation::Disjoint => "no_relation",
            DimRelation::Equiv => "Y_equivalent_X",
            DimRelation::Subset => "Y_subset_of_X",
            DimRelation::Superset => "Y_superset_of_X",
            DimRelation::Interleaving => "Y_interleaving_X",
        }
    }
}

impl fmt::Display for DimRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Relation of the inclusive interval `[y_start, y_stop]` to
/// `[x_start, x_stop]`.
fn intervals<T: Ord>(y_start: T, y_stop: T, x_start: T, x_stop: T) -> DimRelation {
    if y_stop < x_start || x_stop < y_start {
        DimRelation::Disjoint
    } else if y_start == x_start && y_stop == x_stop {
        DimRelation::Equiv
    } else if y_start >= x_start && y_stop <= x_stop {
        DimRelation::Subset
    } else if y_start <= x_start && y_stop >= x_stop {
        DimRelation::Superset
    } else {
        DimRelation::Interleaving
    }
}

/// Relation of Y's address range to X's.
#[must_use]
pub fn ipv4_ranges(y: &Ipv4Range, x: &Ipv4Range) -> DimRelation {
    intervals(y.start_u32(), y.stop_u32(), x.start_u32(), x.stop_u32())
}

/// Relation of Y's port spec to X's, accounting for negation.
///
/// The raw interval relation is first computed on the stored ranges, then
/// adjusted for the two negation flags: negating a side complements its set
/// within `[0, 65535]`, which permutes the relation.
#[must_use]
pub fn port_specs(y: &PortSpec, x: &PortSpec) -> DimRelation {
    let raw = intervals(y.start(), y.stop(), x.start(), x.stop());
    match (raw, y.negated(), x.negated()) {
        (raw, false, false) => raw,

        // disjoint ranges: each complement swallows the other range
        (DimRelation::Disjoint, true, false) => DimRelation::Superset,
        (DimRelation::Disjoint, false, true) => DimRelation::Subset,
        (DimRelation::Disjoint, true, true) => DimRelation::Interleaving,

        // equal ranges: equal complements; range vs complement is disjoint
        (DimRelation::Equiv, true, true) => DimRelation::Equiv,
        (DimRelation::Equiv, _, _) => DimRelation::Disjoint,

        (DimRelation::Subset, true, false) => DimRelation::Interleaving,
        (DimRelation::Subset, false, true) => DimRelation::Disjoint,
        (DimRelation::Subset, true, true) => DimRelation::Superset,

        (DimRelation::Superset, true, false) => DimRelation::Disjoint,
        (DimRelation::Superset, false, true) => DimRelation::Interleaving,
        (DimRelation::Superset, true, true) => DimRelation::Subset,

        (DimRelation::Interleaving, _, _) => DimRelation::Interleaving,
    }
}

/// Relation of Y's protocol constraint to X's.
///
/// `Any` contains everything, `Ip` contains every concrete protocol, and two
/// distinct concrete protocols share nothing.
#[must_use]
pub fn protocols(y: Protocol, x: Protocol) -> DimRelation {
    if y == x {
        DimRelation::Equiv
    } else if y == Protocol::Any {
        DimRelation::Superset
    } else if x == Protocol::Any {
        DimRelation::Subset
    } else if y == Protocol::Ip {
        DimRelation::Superset
    } else if x == Protocol::Ip {
        DimRelation::Subset
    } else {
        DimRelation::Disjoint
    }
}

/// Fold one dimension's relation into the running global relation.
///
/// Commutative and associative over any ordering of the dimensions:
/// `Equiv` is the identity, `Disjoint` is absorbing, and mixing containment
/// directions degrades to `Interleaving`.
#[must_use]
pub fn combine(global: DimRelation, partial: DimRelation) -> DimRelation {
    match partial {
        DimRelation::Equiv => global,
        DimRelation::Subset => match global {
            DimRelation::Equiv | DimRelation::Subset => DimRelation::Subset,
            DimRelation::Superset | DimRelation::Interleaving => DimRelation::Interleaving,
            DimRelation::Disjoint => DimRelation::Disjoint,
        },
        DimRelation::Superset => match global {
            DimRelation::Equiv | DimRelation::Superset => DimRelation::Superset,
            DimRelation::Subset | DimRelation::Interleaving => DimRelation::Interleaving,
            DimRelation::Disjoint => DimRelation::Disjoint,
        },
        DimRelation::Interleaving => match global {
            DimRelation::Disjoint => DimRelation::Disjoint,
            _ => DimRelation::Interleaving,
        },
        DimRelation::Disjoint => DimRelation::Disjoint,
    }
}
