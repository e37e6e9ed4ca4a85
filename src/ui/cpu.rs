use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

use crate::system::snapshot::CpuStats;
use crate::ui::gauge::bar_line;
use crate::ui::layout::Panel;
use crate::ui::theme::Theme;

const COLUMN_GAP: &str = "  ";

/// Total bar followed by the cores in two columns: the first half down the
/// left, the rest down the right.
pub fn panel(cpu: &CpuStats, width: u16, theme: &Theme) -> Panel {
    let inner = Panel::inner_width(width);
    let cores = cpu.per_core.len();

    let mut title = vec![Span::from("CPU")];
    if cores > 0 {
        title.push(Span::styled(
            format!("  {cores} cores"),
            Style::default()
                .fg(theme.text_secondary)
                .remove_modifier(Modifier::BOLD),
        ));
    }

    let mut lines = vec![bar_line(
        format!("TOTAL {:5.1}%", cpu.total),
        cpu.total,
        inner,
        true,
        theme,
    )];

    let half = cores.div_ceil(2);
    let column = inner.saturating_sub(COLUMN_GAP.len()) / 2;
    for row in 0..half {
        let mut spans = core_bar(row, cpu.per_core[row], column, theme).spans;
        if let Some(&usage) = cpu.per_core.get(row + half) {
            spans.push(Span::raw(COLUMN_GAP));
            spans.extend(core_bar(row + half, usage, column, theme).spans);
        }
        lines.push(Line::from(spans));
    }

    Panel::bordered(Line::from(title), lines)
}

fn core_bar(index: usize, usage: f64, width: usize, theme: &Theme) -> Line<'static> {
    bar_line(format!("cpu{index:<2} {usage:5.1}%"), usage, width, false, theme)
}
