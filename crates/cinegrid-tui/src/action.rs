use cinegrid_core::SortMode;

/// Everything a key press, mouse event or timer can ask the app to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Quit,
    MoveDown,
    MoveUp,
    PageDown,
    PageUp,
    GoTop,
    GoBottom,
    /// Open the row under the cursor.
    Select,
    NavigateBack,
    CycleSort,
    ChooseSort(SortMode),
    ToggleFavorite,
    LoadMore,
    Reload,
    ToggleHelp,
    Resize(u16, u16),
    Tick,
    None,
}
