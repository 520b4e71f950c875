// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Per-dimension prefix tries and the forest that combines them.
//!
//! A [`PrefixTrie`] indexes the prefix encoding of one rule dimension.
//! Inserting a rule returns the set of earlier rules whose prefix in this
//! dimension is *comparable* with the new rule's — equal, a proper prefix of
//! it, or a proper extension of it — as a compressed bitmap over rule
//! positions. The [`PrefixForest`] keeps one trie per dimension and ANDs the
//! five candidate bitmaps: only rules comparable in every dimension can
//! conflict, all others are disjoint somewhere and need no classification.

#![forbid(unsafe_code)]
#![deny(clippy::all)]

use model::PrefixBits;
use wah::{BitmapError, WahBitmap};

mod forest;
pub use forest::PrefixForest;

type NodeId = u32;

const ROOT: NodeId = 0;

/// One trie node. Bitmaps exist only on *valid* nodes — nodes where at
/// least one inserted prefix ends.
#[derive(Debug, Default)]
struct Node {
    /// Children for bit 0 and bit 1.
    children: [Option<NodeId>; 2],
    /// Marks a node where some rule's prefix ends exactly.
    valid: bool,
    /// Positions of rules whose prefix ends exactly here.
    exact: Option<WahBitmap>,
    /// Positions of rules whose prefix ends in this subtree.
    subtree: Option<WahBitmap>,
}

/// Prefix trie for one rule dimension.
///
/// Nodes live in an index arena owned by the trie; the trie is sized for one
/// ACL and lives for exactly one analysis pass.
#[derive(Debug)]
pub struct PrefixTrie {
    nodes: Vec<Node>,
    rule_count: u32,
}

impl PrefixTrie {
    /// An empty trie for an ACL of `rule_count` rules.
    #[must_use]
    pub fn new(rule_count: u32) -> PrefixTrie {
        PrefixTrie {
            nodes: vec![Node::default()],
            rule_count,
        }
    }

    /// Index `rule`'s `prefix` and return the candidate bitmap: the
    /// positions of previously inserted rules with a comparable prefix.
    ///
    /// Ancestors of the final node contribute their exact-match sets (the
    /// new prefix extends theirs), the final node contributes its whole
    /// subtree (their prefixes extend or equal the new one). Along the walk
    /// every valid ancestor's subtree set learns the new rule.
    ///
    /// # Errors
    ///
    /// Returns [`BitmapError`] if `rule` is not below the trie's rule count.
    pub fn insert(&mut self, prefix: &PrefixBits, rule: u32) -> Result<WahBitmap, BitmapError> {
        let mut candidates = WahBitmap::new(self.rule_count, false);

        let mut node = ROOT;
        for i in 0..prefix.len() {
            let entry = &mut self.nodes[node as usize];
            if entry.valid {
                if let Some(subtree) = entry.subtree.as_mut() {
                    subtree.set(rule)?;
                }
                if let Some(exact) = entry.exact.as_ref() {
                    candidates |= exact;
                }
            }
            node = self.descend(node, prefix.bit(i));
        }

        let entry = &mut self.nodes[node as usize];
        if entry.valid {
            if let Some(exact) = entry.exact.as_mut() {
                exact.set(rule)?;
            }
            if let Some(subtree) = entry.subtree.as_mut() {
                subtree.set(rule)?;
            }
        } else {
            let mut exact = WahBitmap::new(self.rule_count, false);
            exact.set(rule)?;
            let mut subtree = exact.clone();
            self.collect_subtree(node, &mut subtree);
            let entry = &mut self.nodes[node as usize];
            entry.exact = Some(exact);
            entry.subtree = Some(subtree);
            entry.valid = true;
        }

        if let Some(subtree) = self.nodes[node as usize].subtree.as_ref() {
            candidates |= subtree;
        }
        Ok(candidates)
    }

    /// Move to the child for `bit`, growing the arena if absent.
    fn descend(&mut self, node: NodeId, bit: bool) -> NodeId {
        let slot = usize::from(bit);
        if let Some(child) = self.nodes[node as usize].children[slot] {
            return child;
        }
        #[allow(clippy::cast_possible_truncation)] // node count is bounded by 32 * rule count
        let child = self.nodes.len() as NodeId;
        self.nodes.push(Node::default());
        self.nodes[node as usize].children[slot] = Some(child);
        child
    }

    /// OR into `into` the subtree sets of all valid descendants of `from`,
    /// pruning below valid nodes (their subtree sets already aggregate
    /// everything beneath them).
    fn collect_subtree(&self, from: NodeId, into: &mut WahBitmap) {
        let mut stack: Vec<NodeId> = self.nodes[from as usize]
            .children
            .iter()
            .flatten()
            .copied()
            .collect();
        while let Some(node) = stack.pop() {
            let entry = &self.nodes[node as usize];
            if entry.valid {
                if let Some(subtree) = entry.subtree.as_ref() {
                    *into |= subtree;
                }
            } else {
                stack.extend(entry.children.iter().flatten().copied());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn prefix(s: &str) -> PrefixBits {
        s.parse().expect("test prefix")
    }

    fn comparable(a: &PrefixBits, b: &PrefixBits) -> bool {
        a.is_prefix_of(b) || b.is_prefix_of(a)
    }

    fn ones(bitmap: &WahBitmap) -> Vec<u32> {
        bitmap.iter_ones(0, bitmap.size()).unwrap().collect()
    }

    #[test]
    fn test_exact_match_is_candidate() {
        let mut trie = PrefixTrie::new(4);
        assert_eq!(ones(&trie.insert(&prefix("1010"), 0).unwrap()), vec![]);
        assert_eq!(ones(&trie.insert(&prefix("1010"), 1).unwrap()), vec![0]);
        assert_eq!(ones(&trie.insert(&prefix("1010"), 2).unwrap()), vec![0, 1]);
    }

    #[test]
    fn test_ancestor_and_descendant_are_candidates() {
        let mut trie = PrefixTrie::new(4);
        trie.insert(&prefix("10"), 0).unwrap();
        trie.insert(&prefix("1011"), 1).unwrap();
        // "101" extends rule 0's prefix and is extended by rule 1's
        let candidates = trie.insert(&prefix("101"), 2).unwrap();
        assert_eq!(ones(&candidates), vec![0, 1]);
    }

    #[test]
    fn test_incomparable_prefixes_are_not_candidates() {
        let mut trie = PrefixTrie::new(3);
        trie.insert(&prefix("00001010"), 0).unwrap();
        let candidates = trie.insert(&prefix("11000000"), 1).unwrap();
        assert_eq!(ones(&candidates), vec![]);
    }

    #[test]
    fn test_empty_prefix_matches_everything() {
        let mut trie = PrefixTrie::new(4);
        trie.insert(&prefix("0"), 0).unwrap();
        trie.insert(&prefix("111"), 1).unwrap();
        // the empty prefix ends at the root and sees the whole tree
        let candidates = trie.insert(&PrefixBits::EMPTY, 2).unwrap();
        assert_eq!(ones(&candidates), vec![0, 1]);
        // every later insertion passes the root and sees rule 2
        let candidates = trie.insert(&prefix("10"), 3).unwrap();
        assert_eq!(ones(&candidates), vec![2]);
    }

    #[test]
    fn test_subtree_aggregation_on_late_validation() {
        let mut trie = PrefixTrie::new(5);
        // two long prefixes first, their common ancestor "1" is not valid yet
        trie.insert(&prefix("100"), 0).unwrap();
        trie.insert(&prefix("101"), 1).unwrap();
        trie.insert(&prefix("11"), 2).unwrap();
        // validating "1" must pick up the whole subtree under it
        let candidates = trie.insert(&prefix("1"), 3).unwrap();
        assert_eq!(ones(&candidates), vec![0, 1, 2]);
    }

    #[test]
    fn test_candidates_match_brute_force_comparability() {
        let prefixes = [
            "", "1", "10", "11", "101", "0", "00", "1111", "10", "", "0000000011", "1",
        ];
        let mut trie = PrefixTrie::new(u32::try_from(prefixes.len()).unwrap());
        for (position, text) in prefixes.iter().enumerate() {
            let position = u32::try_from(position).unwrap();
            let inserted = prefix(text);
            let candidates = trie.insert(&inserted, position).unwrap();
            let expected: Vec<u32> = (0..position)
                .filter(|&earlier| comparable(&prefix(prefixes[earlier as usize]), &inserted))
                .collect();
            assert_eq!(ones(&candidates), expected, "inserting '{text}' at {position}");
        }
    }
}
