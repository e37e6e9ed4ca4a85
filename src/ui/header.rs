use std::time::Duration;

use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

use crate::format::format_interval;
use crate::system::process::SortKey;
use crate::ui::layout::Panel;
use crate::ui::theme::Theme;

/// One bare line: the name badge, the refresh interval (highlighted right
/// after it changed) and the active sort key.
pub fn panel(interval: Duration, flashing: bool, sort_key: SortKey, theme: &Theme) -> Panel {
    let interval_style = if flashing {
        Style::default().fg(theme.flash).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.text_secondary)
    };

    let line = Line::from(vec![
        Span::styled(
            " hidetop ",
            Style::default()
                .fg(theme.selected_fg)
                .bg(theme.title)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("  refresh ", Style::default().fg(theme.text_secondary)),
        Span::styled(format_interval(interval), interval_style),
        Span::styled("  sort ", Style::default().fg(theme.text_secondary)),
        Span::styled(sort_key.label(), Style::default().fg(theme.accent)),
    ]);
    Panel::bare(vec![line])
}
