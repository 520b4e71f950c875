// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The forest of per-dimension prefix tries.

use crate::PrefixTrie;
use model::{Dimension, Rule};
use wah::{BitmapError, WahBitmap};

/// One prefix trie per rule dimension, scoped to a single ACL analysis.
#[derive(Debug)]
pub struct PrefixForest {
    tries: Vec<PrefixTrie>,
    rule_count: u32,
}

impl PrefixForest {
    /// A forest for an ACL of `rule_count` rules.
    #[must_use]
    pub fn new(rule_count: u32) -> PrefixForest {
        PrefixForest {
            tries: Dimension::ALL
                .iter()
                .map(|_| PrefixTrie::new(rule_count))
                .collect(),
            rule_count,
        }
    }

    /// Index `rule` in every dimension and return the intersection of the
    /// per-dimension candidate bitmaps: the earlier rules comparable with
    /// `rule` in *all* five dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`BitmapError`] if the rule's position is not below the
    /// forest's rule count.
    pub fn add_rule(&mut self, rule: &Rule) -> Result<WahBitmap, BitmapError> {
        let mut candidates = WahBitmap::new(self.rule_count, true);
        for (trie, dimension) in self.tries.iter_mut().zip(Dimension::ALL) {
            candidates &= &trie.insert(rule.prefix(dimension), rule.position())?;
        }
        Ok(candidates)
    }
}
