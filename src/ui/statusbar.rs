use ratatui::layout::Alignment;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

use crate::app::{ResolvedKeybinds, key_label};
use crate::ui::layout::Panel;
use crate::ui::theme::Theme;
use crate::view::{InputMode, ViewState};

/// The one-line key hint bar at the bottom of the dashboard.
pub fn panel(view: &ViewState, keybinds: &ResolvedKeybinds, theme: &Theme) -> Panel {
    let line = match view.input_mode {
        InputMode::Search => {
            let mut spans = vec![
                Span::styled(
                    " / ",
                    Style::default()
                        .fg(theme.pill_key_fg)
                        .bg(theme.pill_key_bg)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!(" {}", view.query),
                    Style::default().fg(theme.pill_desc_fg),
                ),
                Span::styled("\u{2588}", Style::default().fg(theme.pill_key_bg)),
            ];
            spans.extend(pill_spans("Esc".to_string(), "cancel", theme));
            spans.extend(pill_spans("Enter".to_string(), "apply", theme));
            Line::from(spans)
        }
        InputMode::Normal | InputMode::Help => {
            let kb = keybinds;
            let mut spans = Vec::new();
            spans.extend(pill_spans(key_label(kb.quit), "quit", theme));
            spans.extend(pill_spans(key_label(kb.sort_cpu), "sort cpu", theme));
            spans.extend(pill_spans(key_label(kb.sort_memory), "sort mem", theme));
            spans.extend(pill_spans(key_label(kb.sort_pid), "sort pid", theme));
            spans.extend(pill_spans(
                format!("{}/{}", key_label(kb.slower), key_label(kb.faster)),
                "interval",
                theme,
            ));
            spans.extend(pill_spans(key_label(kb.search), "search", theme));
            if !view.query.is_empty() {
                spans.extend(pill_spans("Esc".to_string(), "clear", theme));
            }
            spans.extend(pill_spans(key_label(kb.help), "help", theme));
            Line::from(spans)
        }
    };

    Panel::bare(vec![line.alignment(Alignment::Center)])
}

fn pill_spans(key: String, desc: &'static str, theme: &Theme) -> [Span<'static>; 3] {
    [
        Span::raw(" "),
        Span::styled(
            format!(" {key} "),
            Style::default()
                .fg(theme.pill_key_fg)
                .bg(theme.pill_key_bg)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!(" {desc}"), Style::default().fg(theme.pill_desc_fg)),
    ]
}
