//! Code folding: fold regions and the per-document fold state.
//!
//! Regions are line ranges that may nest but never partially overlap. A
//! folded region hides its interior lines while the start line stays
//! visible. Region lists are re-derived after edits (from a syntax provider
//! or the brace heuristic); re-derivation preserves the folded flag of any
//! region whose start line is unchanged.

use crate::text::split_lines;

/// A contiguous line range collapsible to its start line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FoldRegion {
    /// First line (stays visible when folded).
    pub start_line: usize,
    /// Last line (inclusive, hidden when folded).
    pub end_line: usize,
    /// Whether the region is currently folded.
    pub folded: bool,
}

impl FoldRegion {
    /// Create an unfolded region.
    pub fn new(start_line: usize, end_line: usize) -> Self {
        Self {
            start_line,
            end_line,
            folded: false,
        }
    }

    /// Whether `line` falls within `[start_line, end_line]`.
    pub fn contains(&self, line: usize) -> bool {
        self.start_line <= line && line <= self.end_line
    }

    /// Number of lines spanned.
    pub fn span(&self) -> usize {
        self.end_line - self.start_line
    }
}

/// Heuristic fold-region detection from brace structure.
///
/// Maintains a stack of opening-brace line indices; a closing brace pops
/// the stack and emits a region when it spans at least two lines. Syntax
/// provider detection, when available, supersedes this.
pub fn detect_fold_regions(text: &str) -> Vec<FoldRegion> {
    let mut stack: Vec<usize> = Vec::new();
    let mut regions: Vec<FoldRegion> = Vec::new();

    for (line_idx, line) in split_lines(text).iter().enumerate() {
        for ch in line.chars() {
            match ch {
                '{' => stack.push(line_idx),
                '}' => {
                    if let Some(start) = stack.pop()
                        && line_idx - start >= 2
                    {
                        regions.push(FoldRegion::new(start, line_idx));
                    }
                }
                _ => {}
            }
        }
    }

    regions.sort_by_key(|r| (r.start_line, r.end_line));
    regions
}

/// Per-document fold state: regions sorted by start line.
#[derive(Debug, Clone, Default)]
pub struct FoldState {
    regions: Vec<FoldRegion>,
}

impl FoldState {
    /// Create an empty fold state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current regions, sorted by start line.
    pub fn regions(&self) -> &[FoldRegion] {
        &self.regions
    }

    /// Replace the region list with a fresh parse.
    ///
    /// The folded flag survives for any new region whose `start_line`
    /// matches a previously folded region.
    pub fn update_regions(&mut self, mut regions: Vec<FoldRegion>) {
        for region in &mut regions {
            if self
                .regions
                .iter()
                .any(|old| old.folded && old.start_line == region.start_line)
            {
                region.folded = true;
            }
        }
        regions.sort_by_key(|r| (r.start_line, r.end_line));
        self.regions = regions;
    }

    /// Flip the region starting exactly at `line`. Returns whether a region
    /// was toggled.
    pub fn toggle(&mut self, line: usize) -> bool {
        for region in &mut self.regions {
            if region.start_line == line {
                region.folded = !region.folded;
                return true;
            }
        }
        false
    }

    /// Fold the smallest unfolded region containing `line`, preferring a
    /// region that starts exactly at `line`. Returns whether one was folded.
    pub fn fold_at(&mut self, line: usize) -> bool {
        let candidate = self
            .regions
            .iter()
            .enumerate()
            .filter(|(_, r)| !r.folded && r.contains(line))
            .min_by_key(|(_, r)| (r.start_line != line, r.span()))
            .map(|(i, _)| i);

        if let Some(index) = candidate {
            self.regions[index].folded = true;
            true
        } else {
            false
        }
    }

    /// Unfold the innermost folded region containing `line`. Returns whether
    /// one was unfolded.
    pub fn unfold_at(&mut self, line: usize) -> bool {
        let candidate = self
            .regions
            .iter()
            .enumerate()
            .filter(|(_, r)| r.folded && r.contains(line))
            .min_by_key(|(_, r)| r.span())
            .map(|(i, _)| i);

        if let Some(index) = candidate {
            self.regions[index].folded = false;
            true
        } else {
            false
        }
    }

    /// Unfold every folded region whose interior hides `line`.
    ///
    /// Used by goto-line so the target becomes visible.
    pub fn unfold_containing(&mut self, line: usize) {
        for region in &mut self.regions {
            if region.folded && region.start_line < line && line <= region.end_line {
                region.folded = false;
            }
        }
    }

    /// Fold every region.
    pub fn fold_all(&mut self) {
        for region in &mut self.regions {
            region.folded = true;
        }
    }

    /// Unfold every region.
    pub fn unfold_all(&mut self) {
        for region in &mut self.regions {
            region.folded = false;
        }
    }

    /// Whether `line` is hidden by some folded region.
    ///
    /// The start line of a folded region remains visible; lines strictly
    /// inside `(start_line, end_line]` are hidden.
    pub fn is_line_hidden(&self, line: usize) -> bool {
        self.regions
            .iter()
            .any(|r| r.folded && r.start_line < line && line <= r.end_line)
    }

    /// The ordered original line indices not hidden, out of `total` lines.
    pub fn visible_lines(&self, total: usize) -> Vec<usize> {
        (0..total).filter(|&l| !self.is_line_hidden(l)).collect()
    }
}
