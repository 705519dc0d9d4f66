//! End-to-end editing flows through the `Editor` binding: multi-cursor
//! paste, next-occurrence selection, find/replace, and undo/redo.

use mane_editor::Editor;
use pretty_assertions::assert_eq;
use std::path::PathBuf;

fn editor_with_file(name: &str, text: &str) -> (Editor, tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(name);
    std::fs::write(&path, text).unwrap();
    let mut editor = Editor::new(dir.path().to_path_buf());
    editor.open_file(&path).unwrap();
    let canonical = path.canonicalize().unwrap();
    (editor, dir, canonical)
}

fn active_text(editor: &Editor) -> String {
    editor.tabs().active_buffer().unwrap().text().to_string()
}

#[test]
fn test_multi_cursor_paste_replaces_both_selections() {
    let (mut editor, _dir, _path) = editor_with_file("a.txt", "foo bar foo");
    editor.set_selection(0, 3).unwrap();
    editor.add_selection(8, 11).unwrap();

    editor.apply_paste("X").unwrap();
    assert_eq!(active_text(&editor), "X bar X");

    // Each cursor collapses to a caret after its inserted copy.
    let cursors = editor.cursors().unwrap();
    assert_eq!(cursors.count(), 2);
    assert!(cursors.cursors().iter().all(|c| c.is_caret()));
    assert_eq!(cursors.cursors()[0].offset, 1);
    assert_eq!(cursors.cursors()[1].offset, 7);
}

#[test]
fn test_multi_line_paste_across_cursors() {
    let (mut editor, _dir, _path) = editor_with_file("a.txt", "foo bar");
    editor.set_selection(0, 3).unwrap();
    editor.add_selection(4, 7).unwrap();

    editor.apply_paste("x\ny").unwrap();
    assert_eq!(active_text(&editor), "x\ny x\ny");
}

#[test]
fn test_add_next_occurrence_walks_then_stops() {
    let (mut editor, _dir, _path) = editor_with_file("a.txt", "foo foo foo");
    editor.set_selection(0, 3).unwrap();

    assert!(editor.add_next_occurrence().unwrap());
    let cursors = editor.cursors().unwrap();
    assert_eq!(cursors.count(), 2);
    assert_eq!(cursors.cursors()[1].range(), (4, 7));

    assert!(editor.add_next_occurrence().unwrap());
    let cursors = editor.cursors().unwrap();
    assert_eq!(cursors.count(), 3);
    assert_eq!(cursors.cursors()[2].range(), (8, 11));

    assert!(!editor.add_next_occurrence().unwrap());
    assert_eq!(editor.cursors().unwrap().count(), 3);
}

#[test]
fn test_replace_all_then_undo_twice_restores() {
    let (mut editor, _dir, _path) = editor_with_file("a.txt", "aa bb aa");

    let count = editor.replace_all("aa", "cc").unwrap();
    assert_eq!(count, 2);
    assert_eq!(active_text(&editor), "cc bb cc");

    assert!(editor.undo().unwrap());
    assert!(editor.undo().unwrap());
    assert_eq!(active_text(&editor), "aa bb aa");
}

#[test]
fn test_find_selects_first_match() {
    let (mut editor, _dir, _path) = editor_with_file("a.txt", "one two one");
    let count = editor.find("one").unwrap();
    assert_eq!(count, 2);
    assert_eq!(editor.cursors().unwrap().primary().range(), (0, 3));
}

#[test]
fn test_replace_current_replaces_one_match() {
    let (mut editor, _dir, _path) = editor_with_file("a.txt", "one two one");
    editor.find("one").unwrap();
    assert!(editor.replace_current("three").unwrap());
    assert_eq!(active_text(&editor), "three two one");

    // The remembered match list was recomputed against the new text.
    assert!(editor.replace_current("four").unwrap());
    assert_eq!(active_text(&editor), "three two four");
    assert!(!editor.replace_current("five").unwrap());
}

#[test]
fn test_backspace_at_every_cursor() {
    let (mut editor, _dir, _path) = editor_with_file("a.txt", "ab ab");
    editor.set_selection(1, 1).unwrap();
    editor.add_cursor(4).unwrap();

    editor.delete_backspace().unwrap();
    assert_eq!(active_text(&editor), "b b");
}

#[test]
fn test_block_insert_preserves_shape() {
    let (mut editor, _dir, _path) = editor_with_file("a.txt", "aaaa\nbbbb\ncccc");
    editor.set_block(0, 2, 2, 2).unwrap();
    editor.block_insert("--").unwrap();
    assert_eq!(active_text(&editor), "aa--aa\nbb--bb\ncc--cc");
    // Block mode survives the edit; a following delete removes a column.
    assert!(editor.block().unwrap().active);
}

#[test]
fn test_block_delete_via_backspace() {
    let (mut editor, _dir, _path) = editor_with_file("a.txt", "abcd\nefgh");
    editor.set_block(0, 1, 1, 3).unwrap();
    editor.delete_backspace().unwrap();
    assert_eq!(active_text(&editor), "ad\neh");
}

#[test]
fn test_block_expansion_through_editor() {
    let (mut editor, _dir, _path) = editor_with_file("a.txt", "aaaa\nbbbb\ncccc");
    editor.set_block(0, 0, 1, 1).unwrap();
    editor.expand_block_down().unwrap();
    editor.expand_block_down().unwrap();
    editor.expand_block_right().unwrap();

    let block = editor.block().unwrap();
    assert_eq!((block.start_line, block.end_line), (0, 2));
    assert_eq!((block.start_col, block.end_col), (1, 2));

    editor.block_insert("|").unwrap();
    assert_eq!(active_text(&editor), "a|aaa\nb|bbb\nc|ccc");
}

#[test]
fn test_block_expansion_requires_block_mode() {
    let (mut editor, _dir, _path) = editor_with_file("a.txt", "ab\ncd");
    assert!(editor.expand_block_down().is_err());
    assert!(editor.expand_block_right().is_err());
}

#[test]
fn test_matching_bracket_at_cursor() {
    let (mut editor, _dir, _path) = editor_with_file("a.txt", "((a))");
    editor.set_selection(0, 0).unwrap();
    assert_eq!(editor.matching_bracket_at_cursor(), Some(4));

    editor.set_selection(4, 4).unwrap();
    assert_eq!(editor.matching_bracket_at_cursor(), Some(0));

    // On a non-bracket char there is nothing to match.
    editor.set_selection(2, 2).unwrap();
    assert_eq!(editor.matching_bracket_at_cursor(), None);
}

#[test]
fn test_block_and_multi_cursor_are_exclusive() {
    let (mut editor, _dir, _path) = editor_with_file("a.txt", "ab\ncd");
    editor.set_selection(0, 1).unwrap();
    editor.add_selection(3, 4).unwrap();
    assert_eq!(editor.cursors().unwrap().count(), 2);

    // Entering block mode collapses the cursor set.
    editor.set_block(0, 1, 0, 1).unwrap();
    assert_eq!(editor.cursors().unwrap().count(), 1);
    assert!(editor.block().unwrap().active);

    // Adding a cursor leaves block mode.
    editor.add_cursor(3).unwrap();
    assert!(!editor.block().unwrap().active);
}

#[test]
fn test_switch_tab_resets_cursors_and_block() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("one.txt");
    let second = dir.path().join("two.txt");
    std::fs::write(&first, "alpha beta").unwrap();
    std::fs::write(&second, "gamma").unwrap();

    let mut editor = Editor::new(dir.path().to_path_buf());
    editor.open_file(&first).unwrap();
    editor.set_selection(0, 5).unwrap();
    editor.add_selection(6, 10).unwrap();
    editor.open_file(&second).unwrap();

    editor.switch_tab(0);
    let cursors = editor.cursors().unwrap();
    assert_eq!(cursors.count(), 1);
    assert!(cursors.primary().is_caret());
    assert!(!editor.block().unwrap().active);
}

#[test]
fn test_untitled_tab_edits_and_save_fails() {
    let dir = tempfile::tempdir().unwrap();
    let mut editor = Editor::new(dir.path().to_path_buf());
    editor.new_untitled();

    editor.apply_paste("hello").unwrap();
    assert_eq!(active_text(&editor), "hello");
    assert!(editor.save_active().is_err());
}
