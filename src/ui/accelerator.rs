use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

use crate::system::snapshot::{Accelerator, AcceleratorStats, ThermalState};
use crate::ui::gauge::bar_line;
use crate::ui::layout::Panel;
use crate::ui::theme::Theme;

/// `None` when the host has no accelerator telemetry; the panel is left out.
pub fn panel(accelerator: &Accelerator, width: u16, theme: &Theme) -> Option<Panel> {
    let stats = accelerator.stats()?;
    let inner = Panel::inner_width(width);

    let mut lines = vec![bar_line(
        format!("{:<8} {:5.1}%", "TOTAL", stats.utilization),
        stats.utilization,
        inner,
        true,
        theme,
    )];
    for engine in &stats.engines {
        lines.push(bar_line(
            format!("{:<8} {:5.1}%", engine.name, engine.utilization),
            engine.utilization,
            inner,
            false,
            theme,
        ));
    }
    if let Some(mhz) = stats.frequency_mhz.filter(|&mhz| mhz > 0) {
        lines.push(Line::from(Span::styled(
            format!("  freq: {mhz} MHz"),
            Style::default().fg(theme.text_secondary),
        )));
    }

    Some(Panel::bordered(title(stats, theme), lines))
}

fn title(stats: &AcceleratorStats, theme: &Theme) -> Line<'static> {
    let subtle = Style::default()
        .fg(theme.text_secondary)
        .remove_modifier(Modifier::BOLD);

    let mut spans = vec![Span::from("GPU")];
    if let Some(cores) = stats.core_count.filter(|&n| n > 0) {
        spans.push(Span::styled(format!("  {cores} cores"), subtle));
    }
    // Nominal is the normal case and is not worth a badge.
    if let Some(thermal) = stats.thermal.filter(|&t| t > ThermalState::Nominal) {
        let style = match thermal {
            ThermalState::Critical => Style::default().fg(theme.critical),
            ThermalState::Serious => Style::default().fg(theme.warn),
            _ => subtle,
        };
        spans.push(Span::raw("  "));
        spans.push(Span::styled(format!("thermal:{}", thermal.label()), style));
    }
    if let Some(energy) = stats.energy {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            format!("energy {energy:.0}"),
            Style::default()
                .fg(theme.heat(energy))
                .remove_modifier(Modifier::BOLD),
        ));
    }
    Line::from(spans)
}
