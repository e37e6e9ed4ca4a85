use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

use crate::format::format_gib;
use crate::system::snapshot::{LoadAvg, MemoryStats};
use crate::ui::gauge::bar_line;
use crate::ui::layout::Panel;
use crate::ui::theme::Theme;

/// RAM bar, a swap bar when the host has swap, then the load averages.
pub fn panel(memory: &MemoryStats, load: &LoadAvg, width: u16, theme: &Theme) -> Panel {
    let inner = Panel::inner_width(width);
    let mut lines = vec![bar_line(
        format!(
            "used  {:5.1}%  {} / {} GiB   avail {} GiB",
            memory.percent,
            format_gib(memory.used_bytes),
            format_gib(memory.total_bytes),
            format_gib(memory.available_bytes),
        ),
        memory.percent,
        inner,
        false,
        theme,
    )];

    if memory.swap_total_bytes > 0 {
        lines.push(bar_line(
            format!(
                "swap  {:5.1}%  {} / {} GiB",
                memory.swap_percent,
                format_gib(memory.swap_used_bytes),
                format_gib(memory.swap_total_bytes),
            ),
            memory.swap_percent,
            inner,
            false,
            theme,
        ));
    }

    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "Load Average",
        Style::default()
            .fg(theme.text_primary)
            .add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(Span::styled(
        format!(
            "  1m: {:.2}   5m: {:.2}   15m: {:.2}",
            load.one, load.five, load.fifteen
        ),
        Style::default().fg(theme.text_secondary),
    )));

    Panel::bordered(Line::from("Memory"), lines)
}
