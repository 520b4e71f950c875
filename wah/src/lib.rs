// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Word-Aligned Hybrid compressed bit vector.
//!
//! [`WahBitmap`] is a fixed-size boolean vector tuned for long runs of equal
//! bits. The vector is split into 31-bit groups; the body is a sequence of
//! 32-bit *runs* where the MSB distinguishes a literal (31 verbatim bits)
//! from a fill (next bit = fill polarity, low 30 bits = group count). Bits
//! past the last full group live right-aligned from the top of a separate
//! *active word*.
//!
//! The type supports point updates, elementwise AND/OR between equal-sized
//! bitmaps without decompression, and an ordered iterator over set positions
//! that steps over zero fills in constant time.

#![forbid(unsafe_code)]
#![deny(clippy::all)]

use std::ops::{BitAndAssign, BitOrAssign};

mod iter;
pub use iter::OnesIter;

/// Number of payload bits per group.
const GROUP_BITS: u32 = 31;
/// MSB flag: the run is a fill.
const FILL_FLAG: u32 = 0x8000_0000;
/// Second bit: the fill is made of ones.
const FILL_ONES: u32 = 0x4000_0000;
/// Group count of a fill run.
const COUNT_MASK: u32 = 0x3FFF_FFFF;
/// A literal with all 31 payload bits set.
const LITERAL_ALL_ONES: u32 = 0x7FFF_FFFF;

/// Errors surfaced by bitmap operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BitmapError {
    /// A bit position at or past the bitmap's logical size.
    #[error("bit index {index} out of range for bitmap of {size} bits")]
    IndexOutOfRange {
        /// the offending position
        index: u32,
        /// the bitmap's logical size in bits
        size: u32,
    },
    /// An iteration window with `stop < start`.
    #[error("invalid iteration window: stop {stop} < start {start}")]
    InvalidRange {
        /// window start (inclusive)
        start: u32,
        /// window stop (exclusive)
        stop: u32,
    },
}

/// A compressed, fixed-size bit vector.
///
/// The size is set at construction and never changes. Bitwise composition
/// requires both operands to have the same logical size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WahBitmap {
    /// Fill and literal runs covering `size / 31` groups, maximally
    /// coalesced: no adjacent same-polarity fills, no all-zero or all-one
    /// literals.
    runs: Vec<u32>,
    /// Tail bits, aligned from the top: position `p` of the tail maps to
    /// `0x8000_0000 >> (p % 31)`.
    active_word: u32,
    /// Number of valid bits in the active word (`size % 31`).
    active_bits: u32,
    /// Logical size in bits.
    size: u32,
}

impl WahBitmap {
    /// Create a bitmap of `size` bits, all set to `fill`.
    #[must_use]
    pub fn new(size: u32, fill: bool) -> WahBitmap {
        let groups = size / GROUP_BITS;
        let mut runs = Vec::new();
        if groups > 0 {
            let polarity = if fill { FILL_ONES } else { 0 };
            runs.push(FILL_FLAG | polarity | groups);
        }
        WahBitmap {
            runs,
            active_word: if fill { u32::MAX } else { 0 },
            active_bits: size % GROUP_BITS,
            size,
        }
    }

    /// Logical size in bits.
    #[must_use]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// First bit index of the active word (one past the last body bit).
    fn body_end(&self) -> u32 {
        self.size - self.active_bits
    }

    /// Set bit `index` to one. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`BitmapError::IndexOutOfRange`] if `index >= size`.
    pub fn set(&mut self, index: u32) -> Result<(), BitmapError> {
        if index >= self.size {
            return Err(BitmapError::IndexOutOfRange {
                index,
                size: self.size,
            });
        }
        if index >= self.body_end() {
            self.active_word |= 0x8000_0000 >> (index % GROUP_BITS);
            return Ok(());
        }

        let mut run_start = 0;
        let mut i = 0;
        while i < self.runs.len() {
            let run = self.runs[i];
            if run & FILL_FLAG != 0 {
                let groups = run & COUNT_MASK;
                let span = groups * GROUP_BITS;
                if index < run_start + span {
                    if run & FILL_ONES != 0 {
                        // already set
                        return Ok(());
                    }
                    self.split_zero_fill(i, groups, (index - run_start) / GROUP_BITS, index);
                    return Ok(());
                }
                run_start += span;
            } else {
                if index < run_start + GROUP_BITS {
                    self.runs[i] |= FILL_ONES >> (index % GROUP_BITS);
                    if self.runs[i] == LITERAL_ALL_ONES {
                        self.promote_ones_literal(i);
                    }
                    return Ok(());
                }
                run_start += GROUP_BITS;
            }
            i += 1;
        }
        unreachable!("runs cover every body index");
    }

    /// Carve the target group out of a zero fill at `at` and set the bit.
    fn split_zero_fill(&mut self, at: usize, groups: u32, offset: u32, index: u32) {
        let literal = FILL_ONES >> (index % GROUP_BITS);
        let before = offset;
        let after = groups - offset - 1;
        let mut replacement = Vec::with_capacity(3);
        if before > 0 {
            replacement.push(FILL_FLAG | before);
        }
        replacement.push(literal);
        if after > 0 {
            replacement.push(FILL_FLAG | after);
        }
        self.runs.splice(at..=at, replacement);
    }

    /// Replace the all-ones literal at `at` with a fill, absorbing any
    /// neighbouring fills of ones.
    fn promote_ones_literal(&mut self, at: usize) {
        let prev_ones = at > 0 && is_ones_fill(self.runs[at - 1]);
        let next_ones = at + 1 < self.runs.len() && is_ones_fill(self.runs[at + 1]);
        match (prev_ones, next_ones) {
            (true, true) => {
                self.runs[at - 1] += (self.runs[at + 1] & COUNT_MASK) + 1;
                self.runs.drain(at..=at + 1);
            }
            (true, false) => {
                self.runs[at - 1] += 1;
                self.runs.remove(at);
            }
            (false, true) => {
                self.runs[at + 1] += 1;
                self.runs.remove(at);
            }
            (false, false) => {
                self.runs[at] = FILL_FLAG | FILL_ONES | 1;
            }
        }
    }

    /// Read bit `index`.
    ///
    /// # Errors
    ///
    /// Returns [`BitmapError::IndexOutOfRange`] if `index >= size`.
    pub fn get(&self, index: u32) -> Result<bool, BitmapError> {
        if index >= self.size {
            return Err(BitmapError::IndexOutOfRange {
                index,
                size: self.size,
            });
        }
        if index >= self.body_end() {
            let mask = 0x8000_0000 >> (index % GROUP_BITS);
            return Ok(self.active_word & mask != 0);
        }

        let mut run_start = 0;
        for &run in &self.runs {
            if run & FILL_FLAG != 0 {
                let span = (run & COUNT_MASK) * GROUP_BITS;
                if index < run_start + span {
                    return Ok(run & FILL_ONES != 0);
                }
                run_start += span;
            } else {
                if index < run_start + GROUP_BITS {
                    let mask = FILL_ONES >> (index % GROUP_BITS);
                    return Ok(run & mask != 0);
                }
                run_start += GROUP_BITS;
            }
        }
        unreachable!("runs cover every body index");
    }

    /// Iterate the set bit positions in `[start, min(stop, size))`, ascending.
    ///
    /// # Errors
    ///
    /// Returns [`BitmapError::InvalidRange`] if `stop < start`.
    pub fn iter_ones(&self, start: u32, stop: u32) -> Result<OnesIter<'_>, BitmapError> {
        if stop < start {
            return Err(BitmapError::InvalidRange { start, stop });
        }
        Ok(OnesIter::new(self, start, stop.min(self.size)))
    }

    /// Combine the bodies of two equal-sized bitmaps with `op`, maintaining
    /// the coalescing invariant in the output run sequence.
    fn merge_runs(&self, other: &WahBitmap, op: impl Fn(u32, u32) -> u32) -> Vec<u32> {
        let mut out = Vec::new();
        let mut a = RunCursor::new(&self.runs);
        let mut b = RunCursor::new(&other.runs);
        while !a.exhausted() && !b.exhausted() {
            if a.remaining == 0 {
                a.decode();
            }
            if b.remaining == 0 {
                b.decode();
            }
            if a.is_fill && b.is_fill {
                let groups = a.remaining.min(b.remaining);
                append_fill(&mut out, groups, op(a.word, b.word));
                a.remaining -= groups;
                b.remaining -= groups;
            } else {
                append_literal(&mut out, op(a.word, b.word) & LITERAL_ALL_ONES);
                a.remaining -= 1;
                b.remaining -= 1;
            }
        }
        out
    }

    fn combine(&mut self, other: &WahBitmap, op: impl Fn(u32, u32) -> u32) {
        assert_eq!(
            self.size, other.size,
            "bitwise op on bitmaps of different sizes"
        );
        if !self.runs.is_empty() && !other.runs.is_empty() {
            self.runs = self.merge_runs(other, &op);
        }
        self.active_word = op(self.active_word, other.active_word);
    }

    /// Decompress into one `bool` per logical bit. Intended for tests and
    /// diagnostics.
    #[must_use]
    pub fn to_bools(&self) -> Vec<bool> {
        let mut out = Vec::with_capacity(self.size as usize);
        for &run in &self.runs {
            if run & FILL_FLAG != 0 {
                let bit = run & FILL_ONES != 0;
                let span = (run & COUNT_MASK) * GROUP_BITS;
                out.extend(std::iter::repeat_n(bit, span as usize));
            } else {
                for offset in 0..GROUP_BITS {
                    out.push(run & (FILL_ONES >> offset) != 0);
                }
            }
        }
        for offset in 0..self.active_bits {
            out.push(self.active_word & (0x8000_0000 >> offset) != 0);
        }
        out
    }

    /// Build a compressed bitmap from one `bool` per bit.
    ///
    /// # Panics
    ///
    /// Panics if `bits` holds more than `u32::MAX` entries.
    #[must_use]
    pub fn from_bools(bits: &[bool]) -> WahBitmap {
        let size = u32::try_from(bits.len()).expect("bitmap size exceeds u32");
        let mut bitmap = WahBitmap::new(size, false);
        for (index, &bit) in bits.iter().enumerate() {
            if bit {
                #[allow(clippy::cast_possible_truncation)] // bounded by `size` above
                bitmap
                    .set(index as u32)
                    .expect("index bounded by bitmap size");
            }
        }
        bitmap
    }
}

/// AND with another bitmap of the same size.
///
/// # Panics
///
/// Panics if the operands have different logical sizes.
impl BitAndAssign<&WahBitmap> for WahBitmap {
    fn bitand_assign(&mut self, rhs: &WahBitmap) {
        self.combine(rhs, |a, b| a & b);
    }
}

/// OR with another bitmap of the same size.
///
/// # Panics
///
/// Panics if the operands have different logical sizes.
impl BitOrAssign<&WahBitmap> for WahBitmap {
    fn bitor_assign(&mut self, rhs: &WahBitmap) {
        self.combine(rhs, |a, b| a | b);
    }
}

fn is_ones_fill(run: u32) -> bool {
    run & FILL_FLAG != 0 && run & FILL_ONES != 0
}

fn is_zero_fill(run: u32) -> bool {
    run & FILL_FLAG != 0 && run & FILL_ONES == 0
}

/// Append one group's literal content, folding uniform groups into fills.
fn append_literal(out: &mut Vec<u32>, value: u32) {
    if value == 0 {
        match out.last_mut() {
            Some(last) if is_zero_fill(*last) => *last += 1,
            _ => out.push(FILL_FLAG | 1),
        }
    } else if value == LITERAL_ALL_ONES {
        match out.last_mut() {
            Some(last) if is_ones_fill(*last) => *last += 1,
            _ => out.push(FILL_FLAG | FILL_ONES | 1),
        }
    } else {
        out.push(value);
    }
}

/// Append `groups` uniform groups whose 31-bit content is `word`.
fn append_fill(out: &mut Vec<u32>, groups: u32, word: u32) {
    if groups == 1 {
        append_literal(out, word);
        return;
    }
    if word == 0 {
        match out.last_mut() {
            Some(last) if is_zero_fill(*last) => *last += groups,
            _ => out.push(FILL_FLAG | groups),
        }
    } else {
        match out.last_mut() {
            Some(last) if is_ones_fill(*last) => *last += groups,
            _ => out.push(FILL_FLAG | FILL_ONES | groups),
        }
    }
}

/// Decoding cursor over a run sequence: the current run's 31-bit content and
/// how many groups of it remain.
struct RunCursor<'a> {
    runs: &'a [u32],
    next: usize,
    word: u32,
    remaining: u32,
    is_fill: bool,
}

impl<'a> RunCursor<'a> {
    fn new(runs: &'a [u32]) -> RunCursor<'a> {
        RunCursor {
            runs,
            next: 0,
            word: 0,
            remaining: 0,
            is_fill: false,
        }
    }

    fn exhausted(&self) -> bool {
        self.next == self.runs.len() && self.remaining == 0
    }

    fn decode(&mut self) {
        let run = self.runs[self.next];
        if run & FILL_FLAG != 0 {
            self.word = if run & FILL_ONES != 0 {
                LITERAL_ALL_ONES
            } else {
                0
            };
            self.remaining = run & COUNT_MASK;
            self.is_fill = true;
        } else {
            self.word = run;
            self.remaining = 1;
            self.is_fill = false;
        }
        self.next += 1;
    }
}
