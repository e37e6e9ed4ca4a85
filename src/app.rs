use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::debug;

use crate::action::{Action, Direction};
use crate::config::{Config, KeybindsConfig, MIN_REFRESH_RATE_MS, parse_key};
use crate::system::collector::CycleParams;
use crate::system::process::SortKey;
use crate::system::snapshot::Snapshot;
use crate::ui::theme::{Theme, resolve_color_support};
use crate::view::{self, InputMode, ProcessView, ViewState};

/// How long the refresh interval stays highlighted after it was changed.
pub const FLASH_DURATION: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone)]
pub struct ResolvedKeybinds {
    pub quit: KeyCode,
    pub search: KeyCode,
    pub sort_cpu: KeyCode,
    pub sort_memory: KeyCode,
    pub sort_pid: KeyCode,
    pub cycle_sort: KeyCode,
    pub slower: KeyCode,
    pub faster: KeyCode,
    pub help: KeyCode,
    pub refresh: KeyCode,
}

impl Default for ResolvedKeybinds {
    fn default() -> Self {
        Self::from_config(&KeybindsConfig::default())
    }
}

impl ResolvedKeybinds {
    pub fn from_config(kb: &KeybindsConfig) -> Self {
        Self {
            quit: parse_key(&kb.quit).unwrap_or(KeyCode::Char('q')),
            search: parse_key(&kb.search).unwrap_or(KeyCode::Char('/')),
            sort_cpu: parse_key(&kb.sort_cpu).unwrap_or(KeyCode::Char('c')),
            sort_memory: parse_key(&kb.sort_memory).unwrap_or(KeyCode::Char('m')),
            sort_pid: parse_key(&kb.sort_pid).unwrap_or(KeyCode::Char('p')),
            cycle_sort: parse_key(&kb.cycle_sort).unwrap_or(KeyCode::Char('s')),
            slower: parse_key(&kb.slower).unwrap_or(KeyCode::Char('+')),
            faster: parse_key(&kb.faster).unwrap_or(KeyCode::Char('-')),
            help: parse_key(&kb.help).unwrap_or(KeyCode::Char('?')),
            refresh: parse_key(&kb.refresh).unwrap_or(KeyCode::Char('r')),
        }
    }

    /// Returns (key_label, description) pairs for the help overlay.
    pub fn help_entries(&self) -> Vec<(String, &'static str)> {
        vec![
            (key_label(self.quit), "Quit"),
            (key_label(self.sort_cpu), "Sort by CPU"),
            (key_label(self.sort_memory), "Sort by memory"),
            (key_label(self.sort_pid), "Sort by PID"),
            (key_label(self.cycle_sort), "Cycle sort"),
            (key_label(self.slower), "Slower refresh"),
            (key_label(self.faster), "Faster refresh"),
            (key_label(self.search), "Search processes"),
            (key_label(self.refresh), "Refresh now"),
            (key_label(self.help), "Toggle help"),
            ("↑↓".to_string(), "Select process"),
            ("Esc".to_string(), "Clear search"),
            ("Ctrl+C".to_string(), "Quit (always)"),
        ]
    }
}

pub fn key_label(code: KeyCode) -> String {
    match code {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::Backspace => "Bksp".to_string(),
        KeyCode::Delete => "Del".to_string(),
        KeyCode::Home => "Home".to_string(),
        KeyCode::End => "End".to_string(),
        KeyCode::PageUp => "PgUp".to_string(),
        KeyCode::PageDown => "PgDn".to_string(),
        _ => "?".to_string(),
    }
}

/// Work the control loop has to start after a state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Collect(CycleRequest),
    /// The ticker must switch to `interval`; `flash` is the generation to
    /// clear once [`FLASH_DURATION`] has passed.
    Retime { interval: Duration, flash: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleRequest {
    pub seq: u64,
    pub params: CycleParams,
}

pub struct App {
    pub running: bool,
    pub snapshot: Snapshot,
    pub view: ViewState,
    pub keybinds: ResolvedKeybinds,
    pub theme: Theme,
    /// Set while the refresh interval is highlighted after a change.
    pub interval_flash: Option<u64>,
    process_limit: usize,
    cpu_window: Duration,
    interval_step: Duration,
    next_cycle: u64,
    applied_cycle: u64,
    flash_generation: u64,
}

impl App {
    pub fn new(config: &Config) -> Self {
        let general = &config.general;
        let color_support = resolve_color_support(&general.color_support);

        App {
            running: true,
            snapshot: Snapshot::default(),
            view: ViewState::new(
                SortKey::from_str_config(&general.default_sort),
                general.refresh_interval(),
            ),
            keybinds: ResolvedKeybinds::from_config(&config.keybinds),
            theme: Theme::from_config(&config.colors.theme, color_support),
            interval_flash: None,
            process_limit: general.process_limit,
            cpu_window: general.cpu_window(),
            interval_step: general.interval_step(),
            next_cycle: 0,
            applied_cycle: 0,
            flash_generation: 0,
        }
    }

    pub fn cycle_params(&self) -> CycleParams {
        CycleParams {
            cpu_window: self.cpu_window,
            sort_key: self.view.sort_key,
            process_limit: self.process_limit,
        }
    }

    /// Hands out the next cycle number together with the parameters the
    /// cycle has to run with.
    pub fn begin_cycle(&mut self) -> CycleRequest {
        self.next_cycle += 1;
        CycleRequest {
            seq: self.next_cycle,
            params: self.cycle_params(),
        }
    }

    /// Replaces the displayed snapshot unless a newer cycle already landed.
    pub fn apply_snapshot(&mut self, seq: u64, snapshot: Snapshot) -> bool {
        if seq <= self.applied_cycle {
            debug!(seq, applied = self.applied_cycle, "dropping stale snapshot");
            return false;
        }
        self.applied_cycle = seq;
        self.snapshot = snapshot;
        true
    }

    pub fn clear_interval_flash(&mut self, generation: u64) -> bool {
        if self.interval_flash == Some(generation) {
            self.interval_flash = None;
            true
        } else {
            false
        }
    }

    pub fn process_view(&self) -> ProcessView<'_> {
        view::process_view(&self.snapshot.processes, &self.view)
    }

    pub fn map_key(&self, key: KeyEvent) -> Action {
        // Ctrl+C always quits (hardwired safety)
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Action::Quit;
        }

        match self.view.input_mode {
            InputMode::Normal => self.map_key_normal(key),
            InputMode::Search => self.map_key_search(key),
            InputMode::Help => self.map_key_help(key),
        }
    }

    fn map_key_normal(&self, key: KeyEvent) -> Action {
        let code = key.code;
        let kb = &self.keybinds;

        match code {
            KeyCode::Up => return Action::Navigate(Direction::Up),
            KeyCode::Down => return Action::Navigate(Direction::Down),
            KeyCode::Esc if !self.view.query.is_empty() => return Action::ClearSearch,
            _ => {}
        }

        if code == kb.quit {
            Action::Quit
        } else if code == kb.sort_cpu {
            Action::SetSort(SortKey::Cpu)
        } else if code == kb.sort_memory {
            Action::SetSort(SortKey::Memory)
        } else if code == kb.sort_pid {
            Action::SetSort(SortKey::Pid)
        } else if code == kb.cycle_sort {
            Action::CycleSort
        } else if code == kb.slower || code == KeyCode::Char('=') {
            Action::SlowerRefresh
        } else if code == kb.faster || code == KeyCode::Char('_') {
            Action::FasterRefresh
        } else if code == kb.search {
            Action::EnterSearchMode
        } else if code == kb.help {
            Action::ToggleHelp
        } else if code == kb.refresh {
            Action::Refresh
        } else {
            Action::None
        }
    }

    fn map_key_search(&self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Esc => Action::ClearSearch,
            KeyCode::Enter => Action::CommitSearch,
            KeyCode::Up => Action::Navigate(Direction::Up),
            KeyCode::Down => Action::Navigate(Direction::Down),
            KeyCode::Backspace => {
                let mut text = self.view.query.clone();
                text.pop();
                Action::UpdateSearch(text)
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                let mut text = self.view.query.clone();
                text.push(c);
                Action::UpdateSearch(text)
            }
            _ => Action::None,
        }
    }

    fn map_key_help(&self, key: KeyEvent) -> Action {
        // In help mode, only the help key and Esc dismiss, everything else is ignored
        if key.code == self.keybinds.help || key.code == KeyCode::Esc {
            return Action::ToggleHelp;
        }
        Action::None
    }

    pub fn dispatch(&mut self, action: Action) -> Option<Effect> {
        match action {
            Action::Quit => {
                self.running = false;
                None
            }
            Action::Navigate(direction) => {
                let rows = view::filter_processes(&self.snapshot.processes, &self.view.query);
                self.view.selected_pid = view::navigate(&rows, self.view.selected_pid, direction);
                None
            }
            Action::SetSort(key) => {
                self.view.sort_key = key;
                Some(Effect::Collect(self.begin_cycle()))
            }
            Action::CycleSort => {
                self.view.sort_key = self.view.sort_key.next();
                Some(Effect::Collect(self.begin_cycle()))
            }
            Action::EnterSearchMode => {
                self.view.input_mode = InputMode::Search;
                None
            }
            Action::CommitSearch => {
                self.view.input_mode = InputMode::Normal;
                None
            }
            Action::ClearSearch => {
                self.view.query.clear();
                self.view.input_mode = InputMode::Normal;
                None
            }
            Action::UpdateSearch(text) => {
                self.view.query = text;
                None
            }
            Action::SlowerRefresh => {
                let next = self.view.refresh_interval + self.interval_step;
                self.retime(next)
            }
            Action::FasterRefresh => {
                let floor = self
                    .interval_step
                    .max(Duration::from_millis(MIN_REFRESH_RATE_MS));
                let current = self.view.refresh_interval;
                // Already at or under the floor: faster never means slower.
                let next = current.saturating_sub(self.interval_step).max(floor).min(current);
                self.retime(next)
            }
            Action::ToggleHelp => {
                self.view.input_mode = if self.view.input_mode == InputMode::Help {
                    InputMode::Normal
                } else {
                    InputMode::Help
                };
                None
            }
            Action::Refresh => Some(Effect::Collect(self.begin_cycle())),
            Action::None => None,
        }
    }

    fn retime(&mut self, interval: Duration) -> Option<Effect> {
        if interval == self.view.refresh_interval {
            return None;
        }
        self.view.refresh_interval = interval;
        self.flash_generation += 1;
        self.interval_flash = Some(self.flash_generation);
        debug!(interval_ms = interval.as_millis() as u64, "refresh interval changed");
        Some(Effect::Retime {
            interval,
            flash: self.flash_generation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::process::ProcessRecord;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app_with_processes(processes: Vec<ProcessRecord>) -> App {
        let mut app = App::new(&Config::default());
        let mut snapshot = Snapshot::default();
        snapshot.processes = processes;
        app.apply_snapshot(1, snapshot);
        app
    }

    fn sample() -> Vec<ProcessRecord> {
        vec![
            ProcessRecord::new(10, "postgres", 40.0, 8.0),
            ProcessRecord::new(20, "nginx", 20.0, 2.0),
            ProcessRecord::new(30, "bash", 1.0, 0.1),
        ]
    }

    fn press(app: &mut App, code: KeyCode) -> Option<Effect> {
        let action = app.map_key(key(code));
        app.dispatch(action)
    }

    #[test]
    fn defaults_come_from_config() {
        let app = App::new(&Config::default());
        assert!(app.running);
        assert_eq!(app.view.sort_key, SortKey::Cpu);
        assert_eq!(app.view.refresh_interval, Duration::from_secs(1));
        assert_eq!(app.view.input_mode, InputMode::Normal);
        assert_eq!(app.view.selected_pid, None);
        assert_eq!(app.cycle_params().process_limit, 50);
    }

    #[test]
    fn quit_keys() {
        let mut app = App::new(&Config::default());
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.running);

        let app = App::new(&Config::default());
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(app.map_key(ctrl_c), Action::Quit);
    }

    #[test]
    fn sort_keys_request_a_collection() {
        let mut app = App::new(&Config::default());
        let effect = press(&mut app, KeyCode::Char('m'));
        assert_eq!(app.view.sort_key, SortKey::Memory);
        match effect {
            Some(Effect::Collect(req)) => assert_eq!(req.params.sort_key, SortKey::Memory),
            other => panic!("expected collect, got {other:?}"),
        }

        press(&mut app, KeyCode::Char('p'));
        assert_eq!(app.view.sort_key, SortKey::Pid);
        press(&mut app, KeyCode::Char('s'));
        assert_eq!(app.view.sort_key, SortKey::Cpu);
        press(&mut app, KeyCode::Char('s'));
        assert_eq!(app.view.sort_key, SortKey::Memory);
        press(&mut app, KeyCode::Char('c'));
        assert_eq!(app.view.sort_key, SortKey::Cpu);
    }

    #[test]
    fn cycle_numbers_increase() {
        let mut app = App::new(&Config::default());
        let a = app.begin_cycle();
        let b = app.begin_cycle();
        assert!(b.seq > a.seq);
    }

    #[test]
    fn late_result_from_older_cycle_is_dropped() {
        let mut app = App::new(&Config::default());
        let first = app.begin_cycle();
        let second = app.begin_cycle();

        let mut newer = Snapshot::default();
        newer.processes = vec![ProcessRecord::new(2, "newer", 0.0, 0.0)];
        let mut older = Snapshot::default();
        older.processes = vec![ProcessRecord::new(1, "older", 0.0, 0.0)];

        assert!(app.apply_snapshot(second.seq, newer.clone()));
        assert!(!app.apply_snapshot(first.seq, older));
        assert_eq!(app.snapshot, newer);
    }

    #[test]
    fn slower_and_faster_adjust_by_step() {
        let mut app = App::new(&Config::default());
        let effect = press(&mut app, KeyCode::Char('+'));
        assert_eq!(app.view.refresh_interval, Duration::from_millis(1250));
        assert!(matches!(effect, Some(Effect::Retime { .. })));

        press(&mut app, KeyCode::Char('='));
        assert_eq!(app.view.refresh_interval, Duration::from_millis(1500));

        press(&mut app, KeyCode::Char('-'));
        press(&mut app, KeyCode::Char('_'));
        assert_eq!(app.view.refresh_interval, Duration::from_millis(1000));
    }

    #[test]
    fn faster_never_goes_below_step() {
        let mut app = App::new(&Config::default());
        for _ in 0..10 {
            press(&mut app, KeyCode::Char('-'));
        }
        assert_eq!(app.view.refresh_interval, Duration::from_millis(250));
        assert_eq!(press(&mut app, KeyCode::Char('-')), None);
    }

    #[test]
    fn faster_at_a_configured_fast_rate_keeps_the_interval() {
        let mut config = Config::default();
        config.general.refresh_rate_ms = 100;
        let mut app = App::new(&config);
        assert_eq!(press(&mut app, KeyCode::Char('-')), None);
        assert_eq!(app.view.refresh_interval, Duration::from_millis(100));
        assert_eq!(app.interval_flash, None);
    }

    #[test]
    fn faster_from_just_above_the_floor_stops_at_it() {
        let mut config = Config::default();
        config.general.refresh_rate_ms = 300;
        let mut app = App::new(&config);
        press(&mut app, KeyCode::Char('-'));
        assert_eq!(app.view.refresh_interval, Duration::from_millis(250));
        assert_eq!(press(&mut app, KeyCode::Char('-')), None);
    }

    #[test]
    fn only_latest_flash_generation_clears() {
        let mut app = App::new(&Config::default());
        let Some(Effect::Retime { flash: first, .. }) = press(&mut app, KeyCode::Char('+')) else {
            panic!("expected retime");
        };
        let Some(Effect::Retime { flash: second, .. }) = press(&mut app, KeyCode::Char('+')) else {
            panic!("expected retime");
        };

        assert!(!app.clear_interval_flash(first));
        assert_eq!(app.interval_flash, Some(second));
        assert!(app.clear_interval_flash(second));
        assert_eq!(app.interval_flash, None);
    }

    #[test]
    fn search_mode_edits_query() {
        let mut app = app_with_processes(sample());
        press(&mut app, KeyCode::Char('/'));
        assert!(app.view.searching());

        press(&mut app, KeyCode::Char('n'));
        press(&mut app, KeyCode::Char('g'));
        press(&mut app, KeyCode::Char('x'));
        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.view.query, "ng");

        // Keybinds are plain text while searching.
        press(&mut app, KeyCode::Char('q'));
        assert!(app.running);
        assert_eq!(app.view.query, "ngq");
    }

    #[test]
    fn enter_commits_and_esc_cancels() {
        let mut app = app_with_processes(sample());
        press(&mut app, KeyCode::Char('/'));
        press(&mut app, KeyCode::Char('b'));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.view.input_mode, InputMode::Normal);
        assert_eq!(app.view.query, "b");

        // Esc in normal mode clears the committed query.
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.view.query, "");

        press(&mut app, KeyCode::Char('/'));
        press(&mut app, KeyCode::Char('z'));
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.view.input_mode, InputMode::Normal);
        assert_eq!(app.view.query, "");
    }

    #[test]
    fn navigation_remembers_pid() {
        let mut app = app_with_processes(sample());
        press(&mut app, KeyCode::Down);
        assert_eq!(app.view.selected_pid, Some(10));
        press(&mut app, KeyCode::Down);
        assert_eq!(app.view.selected_pid, Some(20));

        let mut reordered = Snapshot::default();
        reordered.processes = vec![
            ProcessRecord::new(20, "nginx", 50.0, 2.0),
            ProcessRecord::new(10, "postgres", 10.0, 8.0),
        ];
        app.apply_snapshot(2, reordered);
        assert_eq!(app.process_view().selected, Some(0));
    }

    #[test]
    fn arrows_navigate_filtered_rows_in_search_mode() {
        let mut app = app_with_processes(sample());
        press(&mut app, KeyCode::Char('/'));
        press(&mut app, KeyCode::Char('s'));
        // "postgres" and "bash" match
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.view.selected_pid, Some(30));
    }

    #[test]
    fn help_mode_blocks_other_keys() {
        let mut app = App::new(&Config::default());
        press(&mut app, KeyCode::Char('?'));
        assert_eq!(app.view.input_mode, InputMode::Help);

        assert_eq!(app.map_key(key(KeyCode::Char('q'))), Action::None);
        assert_eq!(app.map_key(key(KeyCode::Char('m'))), Action::None);

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.view.input_mode, InputMode::Normal);
    }

    #[test]
    fn refresh_key_requests_collection() {
        let mut app = App::new(&Config::default());
        assert!(matches!(
            press(&mut app, KeyCode::Char('r')),
            Some(Effect::Collect(_))
        ));
    }

    #[test]
    fn custom_keybinds_apply() {
        let mut config = Config::default();
        config.keybinds.quit = "x".to_string();
        let mut app = App::new(&config);
        assert_eq!(app.map_key(key(KeyCode::Char('q'))), Action::None);
        press(&mut app, KeyCode::Char('x'));
        assert!(!app.running);
    }

    #[test]
    fn help_entries_use_key_labels() {
        let entries = ResolvedKeybinds::default().help_entries();
        assert!(entries.iter().any(|(k, d)| k == "q" && *d == "Quit"));
        assert!(entries.iter().any(|(k, _)| k == "Ctrl+C"));
    }
}
