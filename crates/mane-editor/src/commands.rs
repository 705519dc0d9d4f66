//! The closed command set the shell can invoke by id.

/// Commands reachable through `run_command`.
///
/// Ids outside this set are rejected; shells must not invent their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Save the active buffer.
    Save,
    /// Open a new untitled tab.
    New,
    /// Close the active tab.
    Close,
    /// Undo the last edit.
    Undo,
    /// Redo the last undone edit.
    Redo,
    /// Ask the shell to open its find prompt.
    Find,
    /// Ask the shell to open its replace prompt.
    Replace,
    /// Ask the shell to open its goto-line prompt.
    Goto,
    /// Fold at the cursor.
    Fold,
    /// Unfold at the cursor.
    Unfold,
    /// Fold every region.
    FoldAll,
    /// Unfold every region.
    UnfoldAll,
    /// Ask the shell to toggle its sidebar.
    ToggleSidebar,
    /// Toggle word wrap.
    ToggleWrap,
}

impl Command {
    /// Parse a command id. Unknown ids yield `None`.
    pub fn parse(id: &str) -> Option<Self> {
        match id {
            "save" => Some(Self::Save),
            "new" => Some(Self::New),
            "close" => Some(Self::Close),
            "undo" => Some(Self::Undo),
            "redo" => Some(Self::Redo),
            "find" => Some(Self::Find),
            "replace" => Some(Self::Replace),
            "goto" => Some(Self::Goto),
            "fold" => Some(Self::Fold),
            "unfold" => Some(Self::Unfold),
            "foldall" => Some(Self::FoldAll),
            "unfoldall" => Some(Self::UnfoldAll),
            "toggle-sidebar" => Some(Self::ToggleSidebar),
            "toggle-wrap" => Some(Self::ToggleWrap),
            _ => None,
        }
    }
}
