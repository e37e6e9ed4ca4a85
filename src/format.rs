use std::time::Duration;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Cuts `s` to at most `max_width` columns, ending in `…` when shortened.
pub fn truncate_unicode(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    let mut result = String::new();
    let mut width = 0;
    for ch in s.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if width + ch_width > max_width.saturating_sub(1) {
            break;
        }
        result.push(ch);
        width += ch_width;
    }
    if max_width > 0 {
        result.push('\u{2026}');
    }
    result
}

/// Truncates, then pads with spaces to exactly `width` columns.
pub fn pad_right(s: &str, width: usize) -> String {
    let mut out = truncate_unicode(s, width);
    let used = out.width();
    out.extend(std::iter::repeat_n(' ', width.saturating_sub(used)));
    out
}

pub fn pad_left(s: &str, width: usize) -> String {
    let cut = truncate_unicode(s, width);
    let used = cut.width();
    let mut out: String = std::iter::repeat_n(' ', width.saturating_sub(used)).collect();
    out.push_str(&cut);
    out
}

pub fn format_gib(bytes: u64) -> String {
    const GIB: f64 = 1024.0 * 1024.0 * 1024.0;
    format!("{:.1}", bytes as f64 / GIB)
}

/// `750ms`, `1s`, `1.25s`.
pub fn format_interval(interval: Duration) -> String {
    let ms = interval.as_millis();
    if ms < 1000 {
        return format!("{ms}ms");
    }
    if ms % 1000 == 0 {
        return format!("{}s", ms / 1000);
    }
    let secs = format!("{:.3}", interval.as_secs_f64());
    format!("{}s", secs.trim_end_matches('0'))
}
