//! Turns the current process list plus user preferences into what the
//! process panel shows. Everything here is a pure function of its inputs;
//! only the control loop owns and mutates [`ViewState`].

use std::time::Duration;

use crate::action::Direction;
use crate::system::process::{ProcessRecord, SortKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    Search,
    Help,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub sort_key: SortKey,
    /// Remembered by pid. Row indices are recomputed on every render.
    pub selected_pid: Option<u32>,
    pub input_mode: InputMode,
    pub query: String,
    pub refresh_interval: Duration,
}

impl ViewState {
    pub fn new(sort_key: SortKey, refresh_interval: Duration) -> Self {
        ViewState {
            sort_key,
            selected_pid: None,
            input_mode: InputMode::Normal,
            query: String::new(),
            refresh_interval,
        }
    }

    pub fn searching(&self) -> bool {
        self.input_mode == InputMode::Search
    }
}

/// The filtered rows and the row to highlight, for one render.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessView<'a> {
    pub rows: Vec<&'a ProcessRecord>,
    pub selected: Option<usize>,
}

pub fn process_view<'a>(processes: &'a [ProcessRecord], state: &ViewState) -> ProcessView<'a> {
    let rows = filter_processes(processes, &state.query);
    let selected = resolve_selection(&rows, state.selected_pid);
    ProcessView { rows, selected }
}

/// Case-insensitive substring match on the name. Order is preserved and an
/// empty query passes everything through.
pub fn filter_processes<'a>(processes: &'a [ProcessRecord], query: &str) -> Vec<&'a ProcessRecord> {
    if query.is_empty() {
        return processes.iter().collect();
    }
    let needle = query.to_lowercase();
    processes
        .iter()
        .filter(|p| p.name.to_lowercase().contains(&needle))
        .collect()
}

/// Row to highlight for the remembered pid.
///
/// A pid that is no longer listed falls back to row 0 without being
/// forgotten, so it is looked up again on the next render.
pub fn resolve_selection(rows: &[&ProcessRecord], selected_pid: Option<u32>) -> Option<usize> {
    let pid = selected_pid?;
    if rows.is_empty() {
        return None;
    }
    Some(rows.iter().position(|p| p.pid == pid).unwrap_or(0))
}

/// Moves one row in `direction`, clamped at both ends. Returns the pid to
/// remember next; with no rows the remembered pid is kept as is.
pub fn navigate(
    rows: &[&ProcessRecord],
    selected_pid: Option<u32>,
    direction: Direction,
) -> Option<u32> {
    if rows.is_empty() {
        return selected_pid;
    }
    let last = rows.len() - 1;
    let next = match (resolve_selection(rows, selected_pid), direction) {
        // Nothing chosen yet: either key lands on the first row.
        (None, _) => 0,
        (Some(index), Direction::Down) => (index + 1).min(last),
        (Some(index), Direction::Up) => index.saturating_sub(1),
    };
    Some(rows[next].pid)
}
