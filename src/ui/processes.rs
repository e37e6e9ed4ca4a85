use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

use crate::format::{pad_left, pad_right};
use crate::system::process::{ProcessRecord, SortKey};
use crate::ui::layout::Panel;
use crate::ui::theme::Theme;
use crate::view::ViewState;

const PID_WIDTH: usize = 7;
const NAME_WIDTH: usize = 24;
const PERCENT_WIDTH: usize = 8;

const SELECTED_MARKER: &str = "\u{258e} ";
const SEARCH_CURSOR: &str = "\u{2588}";

/// Builds the process table for `rows`, which is already the visible window.
/// `selected` indexes into `rows`.
///
/// With an empty `rows` this is exactly the panel's fixed overhead, which is
/// how the layout measures it.
pub fn panel(
    rows: &[&ProcessRecord],
    selected: Option<usize>,
    view: &ViewState,
    width: u16,
    theme: &Theme,
) -> Panel {
    let inner = Panel::inner_width(width);

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(column_header(view.sort_key, theme));
    lines.push(Line::from(Span::styled(
        "\u{2500}".repeat(inner),
        Style::default().fg(theme.border),
    )));
    lines.extend(
        rows.iter()
            .enumerate()
            .map(|(i, p)| row(p, selected == Some(i), inner, theme)),
    );

    Panel::bordered(title(view, theme), lines)
}

fn title(view: &ViewState, theme: &Theme) -> Line<'static> {
    let mut spans = vec![Span::from("Processes")];
    if !view.query.is_empty() || view.searching() {
        let cursor = if view.searching() { SEARCH_CURSOR } else { "" };
        spans.push(Span::styled(
            format!("  /{}{cursor}", view.query),
            Style::default()
                .fg(theme.text_secondary)
                .remove_modifier(Modifier::BOLD),
        ));
    }
    Line::from(spans)
}

fn column_header(sort_key: SortKey, theme: &Theme) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        column("PID", PID_WIDTH, false, sort_key, Some(SortKey::Pid), theme),
        Span::raw(" "),
        column("NAME", NAME_WIDTH, false, sort_key, None, theme),
        Span::raw(" "),
        column("CPU%", PERCENT_WIDTH, true, sort_key, Some(SortKey::Cpu), theme),
        Span::raw(" "),
        column("MEM%", PERCENT_WIDTH, true, sort_key, Some(SortKey::Memory), theme),
    ])
}

fn column(
    label: &str,
    width: usize,
    right_align: bool,
    sort_key: SortKey,
    target: Option<SortKey>,
    theme: &Theme,
) -> Span<'static> {
    let active = target == Some(sort_key);
    let text = match (active, sort_key) {
        (false, _) => label.to_string(),
        // PID sorts ascending, the percentages descending.
        (true, SortKey::Pid) => format!("{label} \u{25b2}"),
        (true, _) => format!("{label} \u{25bc}"),
    };
    let text = if right_align {
        pad_left(&text, width)
    } else {
        pad_right(&text, width)
    };

    let mut style = Style::default()
        .fg(theme.text_primary)
        .add_modifier(Modifier::BOLD);
    if active {
        style = style.add_modifier(Modifier::UNDERLINED);
    }
    Span::styled(text, style)
}

fn row(process: &ProcessRecord, selected: bool, inner: usize, theme: &Theme) -> Line<'static> {
    let cpu = pad_left(&format!("{:.1}", process.cpu_percent), PERCENT_WIDTH);
    let mem = pad_left(&format!("{:.1}", process.memory_percent), PERCENT_WIDTH);
    let pid = pad_right(&process.pid.to_string(), PID_WIDTH);
    let name = pad_right(&process.name, NAME_WIDTH);

    if selected {
        let mut text = format!("{SELECTED_MARKER}{pid} {name} {cpu} {mem}");
        let used = text.width();
        text.extend(std::iter::repeat_n(' ', inner.saturating_sub(used)));
        return Line::from(Span::styled(
            text,
            Style::default()
                .fg(theme.selected_fg)
                .bg(theme.selected_bg)
                .add_modifier(Modifier::BOLD),
        ));
    }

    let text_style = Style::default().fg(theme.text_primary);
    Line::from(vec![
        Span::styled(format!("  {pid} {name} "), text_style),
        Span::styled(
            cpu,
            Style::default().fg(theme.heat(f64::from(process.cpu_percent))),
        ),
        Span::raw(" "),
        Span::styled(
            mem,
            Style::default().fg(theme.heat(f64::from(process.memory_percent))),
        ),
    ])
}
