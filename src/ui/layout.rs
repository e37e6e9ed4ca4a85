//! Sizing for the stacked dashboard.
//!
//! Every fixed panel is built first as a [`Panel`], a list of lines already
//! cut to the panel's inner width, so its height is exact. The process panel
//! then gets whatever height is left, never less than [`MIN_PROCESS_ROWS`].

use std::ops::Range;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, BorderType, Borders, Padding, Paragraph};

use crate::ui::theme::Theme;

/// The process panel keeps at least this many data rows, even when the
/// terminal is too short to show them.
pub const MIN_PROCESS_ROWS: u16 = 3;

/// Border plus one column of padding on each side.
const BORDERED_CHROME: u16 = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    title: Option<Line<'static>>,
    lines: Vec<Line<'static>>,
    bordered: bool,
}

impl Panel {
    pub fn bordered(title: Line<'static>, lines: Vec<Line<'static>>) -> Self {
        Panel {
            title: Some(title),
            lines,
            bordered: true,
        }
    }

    pub fn bare(lines: Vec<Line<'static>>) -> Self {
        Panel {
            title: None,
            lines,
            bordered: false,
        }
    }

    /// Columns available to content inside a bordered panel `width` wide.
    pub fn inner_width(width: u16) -> usize {
        width.saturating_sub(BORDERED_CHROME) as usize
    }

    pub fn height(&self) -> u16 {
        let content = u16::try_from(self.lines.len()).unwrap_or(u16::MAX);
        if self.bordered {
            content.saturating_add(2)
        } else {
            content
        }
    }

    pub fn lines(&self) -> &[Line<'static>] {
        &self.lines
    }

    pub fn render(self, frame: &mut Frame, area: Rect, theme: &Theme) {
        if area.height == 0 || area.width == 0 {
            return;
        }
        let mut paragraph = Paragraph::new(self.lines);
        if self.bordered {
            let mut block = Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(theme.border))
                .padding(Padding::horizontal(1));
            if let Some(title) = self.title {
                block = block.title(title.style(
                    Style::default()
                        .fg(theme.text_primary)
                        .add_modifier(Modifier::BOLD),
                ));
            }
            paragraph = paragraph.block(block);
        }
        frame.render_widget(paragraph, area);
    }
}

/// Rows left for process data once the fixed panels and the process panel's
/// own chrome are accounted for.
pub fn available_rows(height: u16, fixed: &[u16], overhead: u16) -> u16 {
    let used = fixed
        .iter()
        .fold(overhead, |acc, h| acc.saturating_add(*h));
    height.saturating_sub(used).max(MIN_PROCESS_ROWS)
}

/// Slice of a `len`-row list that fits in `rows` and keeps `selected` on
/// screen. The window stays full whenever the list is long enough.
pub fn visible_window(len: usize, selected: Option<usize>, rows: usize) -> Range<usize> {
    if rows == 0 {
        return 0..0;
    }
    let mut start = match selected {
        Some(index) if index >= rows => index + 1 - rows,
        _ => 0,
    };
    let mut end = start.saturating_add(rows);
    if end > len {
        end = len;
        start = end.saturating_sub(rows);
    }
    start..end
}

/// Lays `heights` out top to bottom inside `area`. Panels that do not fit are
/// clipped; those entirely below the bottom get an empty rect.
pub fn stack(area: Rect, heights: &[u16]) -> Vec<Rect> {
    let bottom = area.y.saturating_add(area.height);
    let mut y = area.y;
    heights
        .iter()
        .map(|&h| {
            let height = h.min(bottom.saturating_sub(y));
            let rect = Rect::new(area.x, y, area.width, height);
            y = y.saturating_add(height);
            rect
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bordered_height_includes_frame() {
        let panel = Panel::bordered(Line::from("CPU"), vec![Line::from("a"), Line::from("b")]);
        assert_eq!(panel.height(), 4);
        assert_eq!(Panel::bare(vec![Line::from("x")]).height(), 1);
        assert_eq!(Panel::bordered(Line::from("empty"), Vec::new()).height(), 2);
    }

    #[test]
    fn inner_width_saturates() {
        assert_eq!(Panel::inner_width(80), 76);
        assert_eq!(Panel::inner_width(3), 0);
    }

    #[test]
    fn rows_are_what_is_left() {
        // 40 rows: header 1, cpu 8, memory 7, help 1, process chrome 4
        assert_eq!(available_rows(40, &[1, 8, 7, 1], 4), 19);
    }

    #[test]
    fn rows_have_a_floor() {
        assert_eq!(available_rows(1, &[1, 8, 7, 1], 4), MIN_PROCESS_ROWS);
        assert_eq!(available_rows(0, &[], 0), MIN_PROCESS_ROWS);
        assert_eq!(available_rows(10, &[u16::MAX, u16::MAX], 4), MIN_PROCESS_ROWS);
    }

    #[test]
    fn window_starts_at_top_without_selection() {
        assert_eq!(visible_window(10, None, 4), 0..4);
        assert_eq!(visible_window(2, None, 4), 0..2);
        assert_eq!(visible_window(0, Some(0), 4), 0..0);
    }

    #[test]
    fn window_follows_selection() {
        assert_eq!(visible_window(10, Some(3), 4), 0..4);
        assert_eq!(visible_window(10, Some(4), 4), 1..5);
        assert_eq!(visible_window(10, Some(9), 4), 6..10);
    }

    #[test]
    fn window_with_zero_rows_is_empty() {
        assert_eq!(visible_window(10, Some(5), 0), 0..0);
    }

    #[test]
    fn stack_clips_at_bottom() {
        let rects = stack(Rect::new(0, 0, 20, 10), &[3, 4, 5, 2]);
        assert_eq!(rects[0], Rect::new(0, 0, 20, 3));
        assert_eq!(rects[1], Rect::new(0, 3, 20, 4));
        assert_eq!(rects[2], Rect::new(0, 7, 20, 3));
        assert_eq!(rects[3].height, 0);
    }
}
