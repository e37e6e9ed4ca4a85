use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

use crate::ui::theme::Theme;

/// Narrowest bar drawn, even when the label leaves no room for it.
pub const MIN_BAR_WIDTH: usize = 4;

const FILLED: &str = "\u{2588}";
const EMPTY: &str = "\u{2591}";

/// `label [████░░░░]` sized to `width` columns, colored by utilization.
pub fn bar_line(label: String, percent: f64, width: usize, bold: bool, theme: &Theme) -> Line<'static> {
    // " [" before the bar and "]" after it
    let bar_width = width
        .saturating_sub(label.width() + 3)
        .max(MIN_BAR_WIDTH);
    let label_style = if bold {
        Style::default()
            .fg(theme.text_primary)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.text_primary)
    };

    let mut spans = vec![Span::styled(label, label_style), Span::raw(" [")];
    spans.extend(bar_spans(percent, bar_width, theme));
    spans.push(Span::raw("]"));
    Line::from(spans)
}

pub fn bar_spans(percent: f64, bar_width: usize, theme: &Theme) -> [Span<'static>; 2] {
    let filled = filled_cells(percent, bar_width);
    [
        Span::styled(
            FILLED.repeat(filled),
            Style::default().fg(theme.heat(percent)),
        ),
        Span::styled(
            EMPTY.repeat(bar_width - filled),
            Style::default().fg(theme.gauge_empty),
        ),
    ]
}

fn filled_cells(percent: f64, bar_width: usize) -> usize {
    if !percent.is_finite() || percent <= 0.0 {
        return 0;
    }
    ((percent / 100.0 * bar_width as f64) as usize).min(bar_width)
}
