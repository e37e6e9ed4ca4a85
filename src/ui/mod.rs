pub mod accelerator;
pub mod cpu;
pub mod gauge;
pub mod header;
pub mod help;
pub mod layout;
pub mod memory;
pub mod processes;
pub mod statusbar;
pub mod theme;

use ratatui::Frame;
use ratatui::widgets::Clear;

use crate::app::App;
use crate::ui::layout::{Panel, available_rows, stack, visible_window};
use crate::view::InputMode;

pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();
    // After quit the frame is blanked instead of drawn one last time.
    if !app.running {
        frame.render_widget(Clear, area);
        return;
    }

    let panels = compose(app, area.width, area.height);
    let heights: Vec<u16> = panels.iter().map(Panel::height).collect();
    for (panel, rect) in panels.into_iter().zip(stack(area, &heights)) {
        panel.render(frame, rect, &app.theme);
    }

    // Help overlay, rendered last to appear on top
    if app.view.input_mode == InputMode::Help {
        help::render(frame, area, &app.keybinds.help_entries(), &app.theme);
    }
}

/// Builds every panel for a `width` x `height` frame, top to bottom.
///
/// Fixed panels are built first and measured; the process panel gets the
/// rows that remain.
pub fn compose(app: &App, width: u16, height: u16) -> Vec<Panel> {
    let theme = &app.theme;
    let snapshot = &app.snapshot;

    let mut fixed = vec![
        header::panel(
            app.view.refresh_interval,
            app.interval_flash.is_some(),
            app.view.sort_key,
            theme,
        ),
        cpu::panel(&snapshot.cpu, width, theme),
        memory::panel(&snapshot.memory, &snapshot.load, width, theme),
    ];
    fixed.extend(accelerator::panel(&snapshot.accelerator, width, theme));
    let help_bar = statusbar::panel(&app.view, &app.keybinds, theme);

    let fixed_heights: Vec<u16> = fixed
        .iter()
        .chain(std::iter::once(&help_bar))
        .map(Panel::height)
        .collect();
    let overhead = processes::panel(&[], None, &app.view, width, theme).height();
    let rows = available_rows(height, &fixed_heights, overhead) as usize;

    let view = app.process_view();
    let window = visible_window(view.rows.len(), view.selected, rows);
    let selected = view
        .selected
        .filter(|i| window.contains(i))
        .map(|i| i - window.start);
    let process_panel = processes::panel(&view.rows[window], selected, &app.view, width, theme);

    fixed.push(process_panel);
    fixed.push(help_bar);
    fixed
}

#[cfg(test)]
mod tests;
