use insta::assert_snapshot;
use ratatui::Terminal;
use ratatui::backend::TestBackend;

use crate::action::{Action, Direction};
use crate::app::App;
use crate::config::Config;
use crate::system::process::ProcessRecord;
use crate::system::snapshot::{
    Accelerator, AcceleratorStats, CpuStats, EngineStats, LoadAvg, MemoryStats, Snapshot,
};
use crate::ui::layout::{MIN_PROCESS_ROWS, Panel};
use crate::ui::theme::Theme;
use crate::ui::{compose, draw, header, statusbar};
use crate::view::InputMode;

fn buffer_to_string(buf: &ratatui::buffer::Buffer) -> String {
    let area = buf.area;
    let mut out = String::new();
    for y in 0..area.height {
        for x in 0..area.width {
            let cell = buf.cell((x, y)).unwrap();
            out.push_str(cell.symbol());
        }
        if y + 1 < area.height {
            out.push('\n');
        }
    }
    out
}

fn render_to_string(app: &App, width: u16, height: u16) -> String {
    let backend = TestBackend::new(width, height);
    let mut terminal = Terminal::new(backend).unwrap();
    terminal.draw(|frame| draw(frame, app)).unwrap();
    buffer_to_string(terminal.backend().buffer())
}

fn line_text(panel: &Panel) -> String {
    panel.lines()[0]
        .spans
        .iter()
        .map(|s| s.content.as_ref())
        .collect()
}

fn make_snapshot(process_count: u32) -> Snapshot {
    Snapshot {
        cpu: CpuStats::from_per_core(vec![12.0, 64.0, 3.0, 91.0]),
        memory: MemoryStats {
            total_bytes: 16 << 30,
            used_bytes: 6 << 30,
            available_bytes: 10 << 30,
            percent: 37.5,
            swap_total_bytes: 2 << 30,
            swap_used_bytes: 1 << 29,
            swap_percent: 25.0,
        },
        load: LoadAvg {
            one: 1.25,
            five: 0.75,
            fifteen: 0.5,
        },
        processes: (0..process_count)
            .map(|i| ProcessRecord::new(100 + i, format!("proc-{i}"), 50.0 - i as f32, 1.0))
            .collect(),
        accelerator: Accelerator::Unavailable,
    }
}

fn make_app(process_count: u32) -> App {
    let mut app = App::new(&Config::default());
    app.theme = Theme::dark();
    app.apply_snapshot(1, make_snapshot(process_count));
    app
}

fn process_rows(app: &App, width: u16, height: u16) -> usize {
    // panels: header, cpu, memory, [accelerator], processes, help bar
    let panels = compose(app, width, height);
    let processes = &panels[panels.len() - 2];
    processes.lines().len() - 2
}

#[test]
fn header_line() {
    let panel = header::panel(
        std::time::Duration::from_millis(1250),
        false,
        crate::system::process::SortKey::Memory,
        &Theme::dark(),
    );
    assert_snapshot!(line_text(&panel).trim(), @"hidetop   refresh 1.25s  sort Memory");
}

#[test]
fn help_bar_pills() {
    let app = make_app(0);
    let panel = statusbar::panel(&app.view, &app.keybinds, &app.theme);
    assert_snapshot!(
        line_text(&panel).trim(),
        @"q  quit  c  sort cpu  m  sort mem  p  sort pid  +/-  interval  /  search  ?  help"
    );
}

#[test]
fn full_frame_shows_every_panel() {
    let app = make_app(5);
    let out = render_to_string(&app, 100, 40);
    assert!(out.contains("hidetop"));
    assert!(out.contains("CPU"));
    assert!(out.contains("4 cores"));
    assert!(out.contains("TOTAL  42.5%"));
    assert!(out.contains("Memory"));
    assert!(out.contains("swap"));
    assert!(out.contains("1m: 1.25"));
    assert!(out.contains("Processes"));
    assert!(out.contains("proc-4"));
    assert!(!out.contains("GPU"));
}

#[test]
fn process_rows_fill_remaining_height() {
    let app = make_app(100);
    let panels = compose(&app, 100, 40);
    let total: u16 = panels.iter().map(Panel::height).sum();
    assert_eq!(total, 40);
}

#[test]
fn short_list_does_not_pad_rows() {
    let app = make_app(2);
    assert_eq!(process_rows(&app, 100, 40), 2);
}

#[test]
fn tiny_terminal_keeps_row_floor() {
    let app = make_app(20);
    assert_eq!(process_rows(&app, 80, 1), MIN_PROCESS_ROWS as usize);
    // Rendering into the tiny area must not panic.
    let _ = render_to_string(&app, 80, 1);
}

#[test]
fn accelerator_panel_takes_rows_from_processes() {
    let mut app = make_app(100);
    let without = process_rows(&app, 100, 40);

    let mut snapshot = make_snapshot(100);
    snapshot.accelerator = Accelerator::Available(AcceleratorStats {
        utilization: 30.0,
        engines: vec![EngineStats {
            name: "Renderer".to_string(),
            utilization: 20.0,
        }],
        energy: Some(21.0),
        ..AcceleratorStats::default()
    });
    app.apply_snapshot(2, snapshot);

    // Panel chrome (2) + total bar + one engine
    assert_eq!(process_rows(&app, 100, 40), without - 4);
    let out = render_to_string(&app, 100, 40);
    assert!(out.contains("GPU"));
    assert!(out.contains("Renderer"));
}

#[test]
fn selection_stays_visible_when_scrolling() {
    let mut app = make_app(100);
    for _ in 0..60 {
        app.dispatch(Action::Navigate(Direction::Down));
    }
    assert_eq!(app.view.selected_pid, Some(159));
    let out = render_to_string(&app, 100, 40);
    assert!(out.contains("\u{258e} 159"));
    assert!(!out.contains(" 100 "));
}

#[test]
fn search_filters_rendered_rows() {
    let mut app = make_app(20);
    app.dispatch(Action::EnterSearchMode);
    app.dispatch(Action::UpdateSearch("proc-1".to_string()));
    let out = render_to_string(&app, 100, 40);
    assert!(out.contains("/proc-1\u{2588}"));
    assert!(out.contains("proc-10"));
    assert!(!out.contains("proc-2 "));
    assert!(out.contains("Esc"));
}

#[test]
fn help_overlay_lists_keys() {
    let mut app = make_app(5);
    app.dispatch(Action::ToggleHelp);
    assert_eq!(app.view.input_mode, InputMode::Help);
    let out = render_to_string(&app, 100, 40);
    assert!(out.contains("Keys"));
    assert!(out.contains("Sort by memory"));
    assert!(out.contains("Ctrl+C"));
}

#[test]
fn quit_blanks_the_frame() {
    let mut app = make_app(5);
    app.dispatch(Action::Quit);
    let out = render_to_string(&app, 40, 5);
    assert!(out.chars().all(|c| c == ' ' || c == '\n'));
}
