use ratatui::style::Color;

/// Utilization above this is drawn in the critical color.
pub const CRITICAL_THRESHOLD: f64 = 80.0;
/// Utilization above this is drawn in the warning color.
pub const WARNING_THRESHOLD: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSupport {
    Auto,
    Truecolor,
    Color256,
    Mono,
}

impl ColorSupport {
    pub fn from_config_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "truecolor" | "24bit" => ColorSupport::Truecolor,
            "256" | "256color" => ColorSupport::Color256,
            "mono" | "monochrome" => ColorSupport::Mono,
            _ => ColorSupport::Auto,
        }
    }
}

pub fn detect_color_support() -> ColorSupport {
    if std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty()) {
        return ColorSupport::Mono;
    }
    let colorterm = std::env::var("COLORTERM")
        .unwrap_or_default()
        .to_lowercase();
    if colorterm.contains("truecolor") || colorterm.contains("24bit") {
        return ColorSupport::Truecolor;
    }
    ColorSupport::Color256
}

pub fn resolve_color_support(config: &str) -> ColorSupport {
    match ColorSupport::from_config_str(config) {
        ColorSupport::Auto => detect_color_support(),
        parsed => parsed,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub name: &'static str,
    pub text_primary: Color,
    pub text_secondary: Color,
    pub title: Color,
    pub border: Color,
    pub accent: Color,
    pub ok: Color,
    pub warn: Color,
    pub critical: Color,
    pub gauge_empty: Color,
    pub selected_fg: Color,
    pub selected_bg: Color,
    pub pill_key_bg: Color,
    pub pill_key_fg: Color,
    pub pill_desc_fg: Color,
    pub flash: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Theme::dark()
    }
}

impl Theme {
    pub fn from_config(theme_name: &str, support: ColorSupport) -> Self {
        if support == ColorSupport::Mono {
            return Self::mono();
        }
        let mut theme = match theme_name.to_lowercase().as_str() {
            "light" => Self::light(),
            _ => Self::dark(),
        };
        theme.apply_color_support(support);
        theme
    }

    /// Traffic-light color for a 0-100 utilization value.
    pub fn heat(&self, percent: f64) -> Color {
        if percent > CRITICAL_THRESHOLD {
            self.critical
        } else if percent > WARNING_THRESHOLD {
            self.warn
        } else {
            self.ok
        }
    }

    fn apply_color_support(&mut self, support: ColorSupport) {
        let map = |c: Color| adapt_color(c, support);

        self.text_primary = map(self.text_primary);
        self.text_secondary = map(self.text_secondary);
        self.title = map(self.title);
        self.border = map(self.border);
        self.accent = map(self.accent);
        self.ok = map(self.ok);
        self.warn = map(self.warn);
        self.critical = map(self.critical);
        self.gauge_empty = map(self.gauge_empty);
        self.selected_fg = map(self.selected_fg);
        self.selected_bg = map(self.selected_bg);
        self.pill_key_bg = map(self.pill_key_bg);
        self.pill_key_fg = map(self.pill_key_fg);
        self.pill_desc_fg = map(self.pill_desc_fg);
        self.flash = map(self.flash);
    }

    pub fn dark() -> Self {
        Theme {
            name: "dark",
            text_primary: Color::White,
            text_secondary: Color::Gray,
            title: Color::Rgb(103, 232, 249),
            border: Color::DarkGray,
            accent: Color::Rgb(192, 132, 252),
            ok: Color::Rgb(16, 185, 129),
            warn: Color::Rgb(250, 204, 21),
            critical: Color::Rgb(239, 68, 68),
            gauge_empty: Color::DarkGray,
            selected_fg: Color::Black,
            selected_bg: Color::Rgb(103, 232, 249),
            pill_key_bg: Color::Yellow,
            pill_key_fg: Color::Black,
            pill_desc_fg: Color::White,
            flash: Color::Rgb(251, 146, 60),
        }
    }

    pub fn light() -> Self {
        Theme {
            name: "light",
            text_primary: Color::Black,
            text_secondary: Color::DarkGray,
            title: Color::Blue,
            border: Color::Rgb(150, 150, 150),
            accent: Color::Rgb(126, 34, 206),
            ok: Color::Rgb(0, 120, 0),
            warn: Color::Rgb(180, 120, 0),
            critical: Color::Red,
            gauge_empty: Color::Rgb(200, 200, 200),
            selected_fg: Color::White,
            selected_bg: Color::Blue,
            pill_key_bg: Color::Blue,
            pill_key_fg: Color::White,
            pill_desc_fg: Color::Black,
            flash: Color::Rgb(200, 100, 0),
        }
    }

    pub fn mono() -> Self {
        Theme {
            name: "mono",
            text_primary: Color::White,
            text_secondary: Color::Gray,
            title: Color::White,
            border: Color::White,
            accent: Color::White,
            ok: Color::White,
            warn: Color::White,
            critical: Color::White,
            gauge_empty: Color::DarkGray,
            selected_fg: Color::Black,
            selected_bg: Color::White,
            pill_key_bg: Color::White,
            pill_key_fg: Color::Black,
            pill_desc_fg: Color::White,
            flash: Color::White,
        }
    }
}

/// Mono never gets here; `Theme::from_config` hands out the mono palette.
fn adapt_color(color: Color, support: ColorSupport) -> Color {
    match (support, color) {
        (ColorSupport::Color256, Color::Rgb(r, g, b)) => Color::Indexed(rgb_to_ansi256(r, g, b)),
        _ => color,
    }
}

fn rgb_to_ansi256(r: u8, g: u8, b: u8) -> u8 {
    let scale = |v: u8| (v as f32 / 255.0 * 5.0).round() as u8;
    16 + 36 * scale(r) + 6 * scale(g) + scale(b)
}
