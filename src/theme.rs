use ratatui::style::{Color, Modifier, Style};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeVariant {
    #[default]
    Dark,
    Light,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTheme {
    pub variant: ThemeVariant,
    pub foreground: Color,
    pub foreground_dim: Color,
    pub border: Color,
    pub primary: Color,
    pub error: Color,
    pub success: Color,
    pub post_title: Color,
    pub post_author: Color,
    pub post_score: Color,
    pub post_time: Color,
    pub post_body: Color,
    pub skeleton: Color,
    pub status_bar_bg: Color,
    pub status_bar_fg: Color,
    pub spinner: Color,
}

impl ResolvedTheme {
    pub fn dark() -> Self {
        Self {
            variant: ThemeVariant::Dark,
            foreground: Color::Rgb(0xF8, 0xF8, 0xF2),
            foreground_dim: Color::Rgb(0x75, 0x71, 0x5E),
            border: Color::Rgb(0x75, 0x71, 0x5E),
            primary: Color::Rgb(0xE6, 0xDB, 0x74),
            error: Color::Rgb(0xF9, 0x26, 0x72),
            success: Color::Rgb(0xA6, 0xE2, 0x2E),
            post_title: Color::Rgb(0xF8, 0xF8, 0xF2),
            post_author: Color::Rgb(0x66, 0xD9, 0xEF),
            post_score: Color::Rgb(0xFD, 0x97, 0x1F),
            post_time: Color::Rgb(0x75, 0x71, 0x5E),
            post_body: Color::Rgb(0xCF, 0xCF, 0xC2),
            skeleton: Color::Rgb(0x3E, 0x3D, 0x32),
            status_bar_bg: Color::Rgb(0x49, 0x48, 0x3E),
            status_bar_fg: Color::Rgb(0xF8, 0xF8, 0xF2),
            spinner: Color::Rgb(0xE6, 0xDB, 0x74),
        }
    }

    pub fn light() -> Self {
        Self {
            variant: ThemeVariant::Light,
            foreground: Color::Black,
            foreground_dim: Color::DarkGray,
            border: Color::Gray,
            primary: Color::Blue,
            error: Color::Red,
            success: Color::Green,
            post_title: Color::Black,
            post_author: Color::Blue,
            post_score: Color::Rgb(0xB3, 0x58, 0x00),
            post_time: Color::DarkGray,
            post_body: Color::Rgb(0x30, 0x30, 0x30),
            skeleton: Color::Rgb(0xDD, 0xDD, 0xDD),
            status_bar_bg: Color::Blue,
            status_bar_fg: Color::White,
            spinner: Color::Blue,
        }
    }

    pub fn for_variant(variant: ThemeVariant) -> Self {
        match variant {
            ThemeVariant::Dark => Self::dark(),
            ThemeVariant::Light => Self::light(),
        }
    }

    pub fn border_style(&self) -> Style {
        Style::default().fg(self.border)
    }

    pub fn dim_style(&self) -> Style {
        Style::default().fg(self.foreground_dim)
    }

    pub fn title_style(&self) -> Style {
        Style::default()
            .fg(self.post_title)
            .add_modifier(Modifier::BOLD)
    }

    pub fn error_style(&self) -> Style {
        Style::default().fg(self.error)
    }

    pub fn spinner_style(&self) -> Style {
        Style::default().fg(self.spinner)
    }

    pub fn skeleton_style(&self) -> Style {
        Style::default().fg(self.skeleton)
    }

    pub fn status_bar_style(&self) -> Style {
        Style::default()
            .bg(self.status_bar_bg)
            .fg(self.status_bar_fg)
    }
}

impl Default for ResolvedTheme {
    fn default() -> Self {
        Self::dark()
    }
}

/// Guess the terminal background from its luma. Falls back to dark when
/// the terminal does not answer.
pub fn detect_terminal_theme() -> ThemeVariant {
    match terminal_light::luma() {
        Ok(luma) if luma > 0.6 => ThemeVariant::Light,
        Ok(luma) => {
            debug!(luma, "dark terminal background");
            ThemeVariant::Dark
        }
        Err(err) => {
            debug!(%err, "terminal background detection failed");
            ThemeVariant::Dark
        }
    }
}
