// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Pairwise rule classification and the ACL analyzer.
//!
//! For an ordered pair of rules (X earlier, Y later) each of the five
//! dimensions yields a [`DimRelation`] of Y's set relative to X's. The five
//! relations combine into one global relation, which together with the two
//! actions resolves to a [`ConflictKind`]. The [`analyze`] driver walks an
//! ACL in order, uses the prefix forest to prune the pairs worth
//! classifying, and emits [`Conflict`] records to a [`ConflictSink`].

#![forbid(unsafe_code)]
#![deny(clippy::all)]

mod analyzer;
mod conflict;
mod relation;

pub use analyzer::{AnalysisError, AnalysisStats, ConflictSink, analyze};
pub use conflict::{Conflict, ConflictKind, classify, resolve_kind};
pub use relation::{DimRelation, combine, ipv4_ranges, port_specs, protocols};
