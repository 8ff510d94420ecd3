use ratatui::style::{Color, Modifier, Style};

use cinegrid_core::SortMode;

/// Color theme for the TUI.
pub struct Theme {
    pub favorite: Color,
    pub rating: Color,
    pub error: Color,

    pub header_fg: Color,
    pub header_bg: Color,
    pub border: Color,
    pub text: Color,
    pub dim: Color,
    pub highlight_bg: Color,
    pub active: Color,
    pub spinner: Color,
    pub footer_fg: Color,
    pub footer_bg: Color,
}

impl Theme {
    /// Dark theme: amber accents on a near-black header, like a cinema marquee.
    pub fn dark() -> Self {
        Self {
            favorite: Color::Rgb(255, 90, 120),
            rating: Color::Rgb(255, 200, 0),
            error: Color::Red,

            header_fg: Color::Black,
            header_bg: Color::Rgb(255, 176, 0),
            border: Color::DarkGray,
            text: Color::White,
            dim: Color::DarkGray,
            highlight_bg: Color::Rgb(60, 45, 10),
            active: Color::Rgb(255, 176, 0),
            spinner: Color::Cyan,
            footer_fg: Color::DarkGray,
            footer_bg: Color::Reset,
        }
    }

    /// Light theme for bright terminals.
    pub fn light() -> Self {
        Self {
            favorite: Color::Rgb(200, 20, 80),
            rating: Color::Rgb(160, 100, 0),
            error: Color::Rgb(190, 0, 0),

            header_fg: Color::White,
            header_bg: Color::Rgb(30, 60, 120),
            border: Color::Rgb(150, 150, 170),
            text: Color::Black,
            dim: Color::Rgb(110, 110, 130),
            highlight_bg: Color::Rgb(210, 225, 250),
            active: Color::Rgb(30, 90, 200),
            spinner: Color::Rgb(30, 90, 200),
            footer_fg: Color::Rgb(110, 110, 130),
            footer_bg: Color::Reset,
        }
    }

    /// Theme by config name; unknown names get the dark theme.
    pub fn by_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "light" => Self::light(),
            _ => Self::dark(),
        }
    }

    pub fn sort_tab_style(&self, mode: SortMode, active: SortMode) -> Style {
        if mode == active {
            Style::default()
                .fg(self.header_fg)
                .bg(self.active)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(self.dim)
        }
    }

    pub fn header_style(&self) -> Style {
        Style::default()
            .fg(self.header_fg)
            .bg(self.header_bg)
            .add_modifier(Modifier::BOLD)
    }

    pub fn highlight_style(&self) -> Style {
        Style::default()
            .bg(self.highlight_bg)
            .add_modifier(Modifier::BOLD)
    }

    pub fn border_style(&self) -> Style {
        Style::default().fg(self.border)
    }

    pub fn footer_style(&self) -> Style {
        Style::default().fg(self.footer_fg).bg(self.footer_bg)
    }
}
