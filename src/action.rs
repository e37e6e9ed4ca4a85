use crate::system::process::SortKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Quit,
    Navigate(Direction),
    SetSort(SortKey),
    CycleSort,
    EnterSearchMode,
    CommitSearch,
    ClearSearch,
    UpdateSearch(String),
    SlowerRefresh,
    FasterRefresh,
    ToggleHelp,
    Refresh,
    None,
}
