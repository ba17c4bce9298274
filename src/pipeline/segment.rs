//! Block segmentation: find start and end markers and pair them.
//!
//! ## Pairing rule
//!
//! Start markers are visited in ascending order. Each one claims the first
//! end marker that lies strictly after it and has not been claimed by an
//! earlier start. A start marker that finds nothing is reported as unpaired
//! and contributes no block.
//!
//! This is greedy, not nearest-match: if an earlier start consumed the end
//! marker nearest to a later start, the later start pairs with the next free
//! one, however far away. With balanced, well-formed documents this makes no
//! difference; with a missing end marker it can attach one block's serials to
//! the next block's brand. No two blocks ever share an end marker.

use crate::config::ExtractionRules;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A paired region of a text stream, as byte offsets.
///
/// `start` is the offset of a start-marker match and `end` the offset of the
/// end-marker match it claimed; `end > start` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub start: usize,
    pub end: usize,
}

impl Block {
    /// The block's text: from the start marker up to (not including) the end marker.
    pub fn text<'a>(&self, stream: &'a str) -> &'a str {
        &stream[self.start..self.end]
    }
}

/// Result of pairing one stream's markers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segmentation {
    /// Paired blocks in start-offset order.
    pub blocks: Vec<Block>,
    /// Start offsets that found no unclaimed end marker, ascending.
    pub unpaired: Vec<usize>,
    pub start_markers: usize,
    pub end_markers: usize,
}

/// Offsets of every non-overlapping match of `marker`, ascending.
pub fn marker_offsets(marker: &Regex, text: &str) -> Vec<usize> {
    marker.find_iter(text).map(|m| m.start()).collect()
}

/// Pair sorted start offsets with sorted end offsets under the greedy claim rule.
pub fn pair_markers(starts: &[usize], ends: &[usize]) -> Segmentation {
    let mut claimed = vec![false; ends.len()];
    let mut blocks = Vec::with_capacity(starts.len().min(ends.len()));
    let mut unpaired = Vec::new();

    for &start in starts {
        let free = ends
            .iter()
            .enumerate()
            .find(|&(i, &end)| end > start && !claimed[i]);

        match free {
            Some((i, &end)) => {
                claimed[i] = true;
                blocks.push(Block { start, end });
            }
            None => unpaired.push(start),
        }
    }

    Segmentation {
        blocks,
        unpaired,
        start_markers: starts.len(),
        end_markers: ends.len(),
    }
}

/// Locate both marker sets in `text` and pair them.
pub fn segment(text: &str, rules: &ExtractionRules) -> Segmentation {
    let starts = marker_offsets(rules.start_regex(), text);
    let ends = marker_offsets(rules.end_regex(), text);
    let segmentation = pair_markers(&starts, &ends);
    debug!(
        "Found {} start / {} end markers → {} blocks, {} unpaired",
        segmentation.start_markers,
        segmentation.end_markers,
        segmentation.blocks.len(),
        segmentation.unpaired.len()
    );
    segmentation
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(start: usize, end: usize) -> Block {
        Block { start, end }
    }

    #[test]
    fn test_greedy_pairing_leaves_extra_end_unused() {
        let seg = pair_markers(&[10, 40], &[20, 60, 90]);
        assert_eq!(seg.blocks, vec![block(10, 20), block(40, 60)]);
        assert!(seg.unpaired.is_empty());
    }

    #[test]
    fn test_shared_end_marker_is_claimed_once() {
        let seg = pair_markers(&[10, 40], &[15]);
        assert_eq!(seg.blocks, vec![block(10, 15)]);
        assert_eq!(seg.unpaired, vec![40]);
    }

    #[test]
    fn test_both_starts_before_single_end() {
        // Both precede the end marker, but only the first may claim it.
        let seg = pair_markers(&[10, 12], &[50]);
        assert_eq!(seg.blocks, vec![block(10, 50)]);
        assert_eq!(seg.unpaired, vec![12]);
    }

    #[test]
    fn test_later_start_is_pushed_to_distant_end() {
        // Start 5 takes 30 (the first end after it); start 20 cannot reuse
        // 30 and skips to 100 even though it is far away.
        let seg = pair_markers(&[5, 20], &[30, 100]);
        assert_eq!(seg.blocks, vec![block(5, 30), block(20, 100)]);
    }

    #[test]
    fn test_end_before_every_start_is_ignored() {
        let seg = pair_markers(&[50], &[10, 20]);
        assert!(seg.blocks.is_empty());
        assert_eq!(seg.unpaired, vec![50]);
    }

    #[test]
    fn test_end_equal_to_start_does_not_pair() {
        let seg = pair_markers(&[10], &[10]);
        assert!(seg.blocks.is_empty());
        assert_eq!(seg.unpaired, vec![10]);
    }

    #[test]
    fn test_no_start_markers_means_no_blocks_and_no_unpaired() {
        let seg = pair_markers(&[], &[5, 10]);
        assert!(seg.blocks.is_empty());
        assert!(seg.unpaired.is_empty());
        assert_eq!(seg.end_markers, 2);
    }

    #[test]
    fn test_well_formed_pairs_yield_one_block_each() {
        for n in 0..20 {
            let starts: Vec<usize> = (0..n).map(|i| i * 100).collect();
            let ends: Vec<usize> = (0..n).map(|i| i * 100 + 50).collect();
            let seg = pair_markers(&starts, &ends);
            assert_eq!(seg.blocks.len(), n);
            assert!(seg.unpaired.is_empty());
            assert!(seg.blocks.windows(2).all(|w| w[0].start < w[1].start));
            assert!(seg.blocks.iter().all(|b| b.end > b.start));
        }
    }

    #[test]
    fn test_segment_finds_literal_markers() {
        let rules = ExtractionRules::default();
        let text = "FRAZIL\nShipped Serial Numbers/Asset Numbers\nULT0000001\n58000.0605\n\
                    Shipped Serial Numbers/Asset Numbers\nULT0000002\n58000.0605\n";
        let seg = segment(text, &rules);
        assert_eq!(seg.start_markers, 2);
        assert_eq!(seg.end_markers, 2);
        assert_eq!(seg.blocks.len(), 2);
        assert!(seg.blocks[0].text(text).contains("ULT0000001"));
        assert!(!seg.blocks[0].text(text).contains("ULT0000002"));
    }

    #[test]
    fn test_marker_offsets_are_non_overlapping() {
        let re = Regex::new("aa").unwrap();
        assert_eq!(marker_offsets(&re, "aaaaa"), vec![0, 2]);
    }
}
