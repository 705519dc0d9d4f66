//! Multi-cursor engine.
//!
//! A [`MultiCursor`] owns an ordered list of [`Cursor`]s whose first element
//! is the primary. All offsets are char offsets into the document text.
//! Coordinated edits are computed per cursor, sorted, deduplicated,
//! overlap-resolved (first wins), applied right-to-left, and then every
//! cursor is shifted through the accumulated deltas.

use crate::text::CharIndex;

/// Caret plus optional selection anchor, both in char offsets.
///
/// `offset == anchor` means a caret with no selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    /// The moving end of the selection (where the caret is).
    pub offset: usize,
    /// The fixed end of the selection.
    pub anchor: usize,
}

impl Cursor {
    /// A caret without a selection.
    pub fn caret(offset: usize) -> Self {
        Self {
            offset,
            anchor: offset,
        }
    }

    /// A selection from `start` (anchor) to `end` (caret).
    pub fn selection(start: usize, end: usize) -> Self {
        Self {
            offset: end,
            anchor: start,
        }
    }

    /// The normalized `(min, max)` range of this cursor.
    pub fn range(&self) -> (usize, usize) {
        (
            self.offset.min(self.anchor),
            self.offset.max(self.anchor),
        )
    }

    /// Whether this cursor has no selection.
    pub fn is_caret(&self) -> bool {
        self.offset == self.anchor
    }
}

/// A pending replacement of char range `[start, end)` with `insert`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingEdit {
    start: usize,
    end: usize,
    insert: String,
}

impl PendingEdit {
    fn insert_chars(&self) -> usize {
        self.insert.chars().count()
    }
}

/// Ordered set of cursors coordinating simultaneous edits.
///
/// Invariants: the primary (first) cursor always exists; no two cursors
/// share the same normalized range; every cursor stays within
/// `[0, char_count]` after any edit.
#[derive(Debug, Clone)]
pub struct MultiCursor {
    cursors: Vec<Cursor>,
}

impl MultiCursor {
    /// Create with a single primary caret at offset 0.
    pub fn new() -> Self {
        Self {
            cursors: vec![Cursor::caret(0)],
        }
    }

    /// The primary cursor.
    pub fn primary(&self) -> Cursor {
        self.cursors[0]
    }

    /// All cursors, primary first.
    pub fn cursors(&self) -> &[Cursor] {
        &self.cursors
    }

    /// Number of cursors.
    pub fn count(&self) -> usize {
        self.cursors.len()
    }

    /// Whether more than one cursor exists.
    pub fn is_multi(&self) -> bool {
        self.cursors.len() > 1
    }

    /// Collapse to a single caret at the primary's offset.
    pub fn reset(&mut self) {
        let offset = self.cursors[0].offset;
        self.cursors.clear();
        self.cursors.push(Cursor::caret(offset));
    }

    /// Set the primary cursor, dropping any secondary cursor that would
    /// duplicate its range.
    pub fn set_primary(&mut self, offset: usize, anchor: usize) {
        self.cursors[0] = Cursor { offset, anchor };
        self.dedupe_keeping_first();
    }

    /// Add a caret at `offset` unless a cursor with that range exists.
    pub fn add_cursor(&mut self, offset: usize) {
        if !self.has_range(offset, offset) {
            self.cursors.push(Cursor::caret(offset));
        }
    }

    /// Add a selection `[start, end)` unless a cursor with that range exists.
    pub fn add_selection(&mut self, start: usize, end: usize) {
        let cursor = Cursor::selection(start, end);
        let (min, max) = cursor.range();
        if !self.has_range(min, max) {
            self.cursors.push(cursor);
        }
    }

    fn has_range(&self, min: usize, max: usize) -> bool {
        self.cursors.iter().any(|c| c.range() == (min, max))
    }

    fn dedupe_keeping_first(&mut self) {
        let mut seen: Vec<(usize, usize)> = Vec::with_capacity(self.cursors.len());
        self.cursors.retain(|c| {
            let range = c.range();
            if seen.contains(&range) {
                false
            } else {
                seen.push(range);
                true
            }
        });
    }

    /// Clamp every cursor into `[0, char_count]`.
    pub fn clamp(&mut self, char_count: usize) {
        for cursor in &mut self.cursors {
            cursor.offset = cursor.offset.min(char_count);
            cursor.anchor = cursor.anchor.min(char_count);
        }
        self.dedupe_keeping_first();
    }

    /// Select the next occurrence of the last cursor's selected text.
    ///
    /// Searches forward from the last cursor's end, skipping candidates whose
    /// range is already held; when the end of the document is reached the
    /// search wraps to `[0, last cursor start)`. Returns `false` when the
    /// last cursor has no selection or no further occurrence exists.
    pub fn add_next_occurrence(&mut self, text: &str) -> bool {
        let Some(last) = self.cursors.last().copied() else {
            return false;
        };
        let (sel_start, sel_end) = last.range();
        if sel_start == sel_end {
            return false;
        }

        let index = CharIndex::new(text);
        let query = &text[index.char_to_byte(sel_start)..index.char_to_byte(sel_end)];
        let query_chars = sel_end - sel_start;

        // Forward from the end of the last cursor.
        let mut from_byte = index.char_to_byte(sel_end);
        while let Some(pos) = text[from_byte..].find(query) {
            let start_byte = from_byte + pos;
            let start = index.byte_to_char(start_byte);
            let end = start + query_chars;
            if self.has_range(start, end) {
                from_byte = start_byte + query.len();
                continue;
            }
            self.cursors.push(Cursor::selection(start, end));
            return true;
        }

        // Wrap: search the region before the last cursor's start.
        let region = &text[..index.char_to_byte(sel_start)];
        let mut from_byte = 0;
        while let Some(pos) = region[from_byte..].find(query) {
            let start_byte = from_byte + pos;
            let start = index.byte_to_char(start_byte);
            let end = start + query_chars;
            if self.has_range(start, end) {
                from_byte = start_byte + query.len();
                continue;
            }
            self.cursors.push(Cursor::selection(start, end));
            return true;
        }

        false
    }

    /// Replace each cursor's selection with `insert`, returning the new text.
    ///
    /// Each cursor ends as a caret at the right edge of its inserted copy.
    pub fn insert_at_all(&mut self, text: &str, insert: &str) -> String {
        let edits = self
            .cursors
            .iter()
            .map(|c| {
                let (start, end) = c.range();
                PendingEdit {
                    start,
                    end,
                    insert: insert.to_string(),
                }
            })
            .collect();
        self.apply_edits(text, edits)
    }

    /// Backspace at every cursor: selections are deleted; a caret deletes
    /// the char before it (no-op at offset 0).
    pub fn delete_backspace(&mut self, text: &str) -> String {
        let edits = self
            .cursors
            .iter()
            .filter_map(|c| {
                let (start, end) = c.range();
                if start != end {
                    Some(PendingEdit {
                        start,
                        end,
                        insert: String::new(),
                    })
                } else if start > 0 {
                    Some(PendingEdit {
                        start: start - 1,
                        end,
                        insert: String::new(),
                    })
                } else {
                    None
                }
            })
            .collect();
        self.apply_edits(text, edits)
    }

    /// Forward-delete at every cursor: selections are deleted; a caret
    /// deletes the char after it (no-op at end of text).
    pub fn delete_forward(&mut self, text: &str) -> String {
        let char_count = text.chars().count();
        let edits = self
            .cursors
            .iter()
            .filter_map(|c| {
                let (start, end) = c.range();
                if start != end {
                    Some(PendingEdit {
                        start,
                        end,
                        insert: String::new(),
                    })
                } else if end < char_count {
                    Some(PendingEdit {
                        start,
                        end: end + 1,
                        insert: String::new(),
                    })
                } else {
                    None
                }
            })
            .collect();
        self.apply_edits(text, edits)
    }

    /// Coordinated-edit pipeline shared by insert and delete operations.
    fn apply_edits(&mut self, text: &str, mut edits: Vec<PendingEdit>) -> String {
        edits.sort_by_key(|e| (e.start, e.end));
        edits.dedup();

        // Overlap resolution: first wins.
        let mut kept: Vec<PendingEdit> = Vec::with_capacity(edits.len());
        for edit in edits {
            match kept.last() {
                Some(prev) if edit.start < prev.end => {}
                _ => kept.push(edit),
            }
        }

        // Apply right-to-left so earlier byte offsets stay valid.
        let index = CharIndex::new(text);
        let mut result = text.to_string();
        for edit in kept.iter().rev() {
            let start = index.char_to_byte(edit.start);
            let end = index.char_to_byte(edit.end);
            result.replace_range(start..end, &edit.insert);
        }

        // Shift every cursor through the accumulated deltas.
        for cursor in &mut self.cursors {
            cursor.offset = map_position(cursor.offset, &kept);
            cursor.anchor = map_position(cursor.anchor, &kept);
        }
        self.dedupe_keeping_first();
        self.clamp(result.chars().count());

        result
    }
}

impl Default for MultiCursor {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a pre-edit char position through a sorted list of applied edits.
///
/// Positions inside a replaced range land at the right edge of the inserted
/// text; positions after it shift by the edit's length delta.
fn map_position(p: usize, edits: &[PendingEdit]) -> usize {
    let mut acc: isize = 0;
    for edit in edits {
        if p < edit.start {
            break;
        }
        let inserted = edit.insert_chars() as isize;
        if p <= edit.end {
            return (edit.start as isize + acc + inserted) as usize;
        }
        acc += inserted - (edit.end - edit.start) as isize;
    }
    (p as isize + acc) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_primary_always_exists() {
        let mut mc = MultiCursor::new();
        assert_eq!(mc.count(), 1);
        mc.reset();
        assert_eq!(mc.count(), 1);
        assert!(!mc.is_multi());
    }

    #[test]
    fn test_no_duplicate_ranges() {
        let mut mc = MultiCursor::new();
        mc.set_primary(3, 0);
        mc.add_selection(0, 3);
        assert_eq!(mc.count(), 1);
        // Reversed direction still duplicates the normalized range.
        mc.add_selection(3, 0);
        assert_eq!(mc.count(), 1);
        mc.add_cursor(5);
        mc.add_cursor(5);
        assert_eq!(mc.count(), 2);
    }

    #[test]
    fn test_insert_at_all_two_selections() {
        // Scenario: "foo bar foo", selections [0,3] and [8,11] -> "X bar X".
        let mut mc = MultiCursor::new();
        mc.set_primary(3, 0);
        mc.add_selection(8, 11);

        let result = mc.insert_at_all("foo bar foo", "X");
        assert_eq!(result, "X bar X");
        assert_eq!(mc.cursors()[0], Cursor::caret(1));
        assert_eq!(mc.cursors()[1], Cursor::caret(7));
    }

    #[test]
    fn test_insert_multiline_across_cursors() {
        // Scenario: "foo bar", selections [0,3] and [4,7] -> "x\ny x\ny".
        let mut mc = MultiCursor::new();
        mc.set_primary(3, 0);
        mc.add_selection(4, 7);

        let result = mc.insert_at_all("foo bar", "x\ny");
        assert_eq!(result, "x\ny x\ny");
    }

    #[test]
    fn test_insert_at_carets() {
        let mut mc = MultiCursor::new();
        mc.set_primary(0, 0);
        mc.add_cursor(4);

        let result = mc.insert_at_all("ab cd", "-");
        assert_eq!(result, "-ab c-d");
        assert_eq!(mc.cursors()[0], Cursor::caret(1));
        assert_eq!(mc.cursors()[1], Cursor::caret(6));
    }

    #[test]
    fn test_overlapping_edits_first_wins() {
        let mut mc = MultiCursor::new();
        mc.set_primary(4, 0);
        mc.add_selection(2, 6);

        let result = mc.insert_at_all("abcdef", "X");
        // The [2,6] edit overlaps [0,4] and is dropped.
        assert_eq!(result, "Xef");
    }

    #[test]
    fn test_backspace_carets() {
        let mut mc = MultiCursor::new();
        mc.set_primary(2, 2);
        mc.add_cursor(5);

        let result = mc.delete_backspace("abcde");
        assert_eq!(result, "acd");
        assert_eq!(mc.cursors()[0], Cursor::caret(1));
        assert_eq!(mc.cursors()[1], Cursor::caret(3));
    }

    #[test]
    fn test_backspace_at_zero_is_skipped() {
        let mut mc = MultiCursor::new();
        mc.set_primary(0, 0);
        mc.add_cursor(1);

        let result = mc.delete_backspace("ab");
        assert_eq!(result, "b");
        // Both cursors collapse to offset 0 and dedupe.
        assert_eq!(mc.count(), 1);
    }

    #[test]
    fn test_forward_delete() {
        let mut mc = MultiCursor::new();
        mc.set_primary(0, 0);
        mc.add_cursor(2);

        let result = mc.delete_forward("abcd");
        assert_eq!(result, "bd");
    }

    #[test]
    fn test_forward_delete_at_end_is_skipped() {
        let mut mc = MultiCursor::new();
        mc.set_primary(2, 2);
        let result = mc.delete_forward("ab");
        assert_eq!(result, "ab");
    }

    #[test]
    fn test_selection_delete_via_backspace() {
        let mut mc = MultiCursor::new();
        mc.set_primary(3, 0);
        let result = mc.delete_backspace("abcdef");
        assert_eq!(result, "def");
        assert_eq!(mc.primary(), Cursor::caret(0));
    }

    #[test]
    fn test_add_next_occurrence_walks_forward() {
        // Scenario: "foo foo foo" starting from [0,3].
        let mut mc = MultiCursor::new();
        mc.set_primary(3, 0);

        assert!(mc.add_next_occurrence("foo foo foo"));
        assert_eq!(mc.count(), 2);
        assert_eq!(mc.cursors()[1].range(), (4, 7));

        assert!(mc.add_next_occurrence("foo foo foo"));
        assert_eq!(mc.count(), 3);
        assert_eq!(mc.cursors()[2].range(), (8, 11));

        assert!(!mc.add_next_occurrence("foo foo foo"));
        assert_eq!(mc.count(), 3);
    }

    #[test]
    fn test_add_next_occurrence_wraps() {
        let mut mc = MultiCursor::new();
        mc.set_primary(7, 4); // middle "foo"

        assert!(mc.add_next_occurrence("foo foo foo"));
        assert_eq!(mc.cursors()[1].range(), (8, 11));

        assert!(mc.add_next_occurrence("foo foo foo"));
        assert_eq!(mc.cursors()[2].range(), (0, 3));
    }

    #[test]
    fn test_add_next_occurrence_empty_selection() {
        let mut mc = MultiCursor::new();
        assert!(!mc.add_next_occurrence("foo foo"));
    }

    #[test]
    fn test_add_next_occurrence_multibyte() {
        let mut mc = MultiCursor::new();
        mc.set_primary(2, 0); // "你好"

        assert!(mc.add_next_occurrence("你好 你好"));
        assert_eq!(mc.cursors()[1].range(), (3, 5));
    }

    #[test]
    fn test_cursors_within_bounds_after_edit() {
        let mut mc = MultiCursor::new();
        mc.set_primary(6, 0);
        let result = mc.delete_backspace("abcdef");
        assert_eq!(result, "");
        for cursor in mc.cursors() {
            assert!(cursor.offset == 0 && cursor.anchor == 0);
        }
    }

    #[test]
    fn test_map_position_shifts() {
        let edits = vec![
            PendingEdit {
                start: 0,
                end: 3,
                insert: "x".to_string(),
            },
            PendingEdit {
                start: 8,
                end: 11,
                insert: "x".to_string(),
            },
        ];
        assert_eq!(map_position(0, &edits), 1);
        assert_eq!(map_position(3, &edits), 1);
        assert_eq!(map_position(5, &edits), 3);
        assert_eq!(map_position(11, &edits), 7);
    }
}
