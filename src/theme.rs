//! Light/dark color theme shared by the TUI and the chart renderer.

use std::fmt;

use ratatui::style::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// Parse a stored preference. Only the exact words `light` and `dark` count.
    pub fn parse(value: &str) -> Option<Theme> {
        match value.trim() {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn palette(self) -> Palette {
        match self {
            Theme::Light => Palette {
                background: Color::Rgb(0xff, 0xff, 0xff),
                text: Color::Rgb(0x11, 0x18, 0x27),
                muted: Color::Rgb(0x55, 0x55, 0x55),
                border: Color::Rgb(0xcc, 0xcc, 0xcc),
                accent: Color::Rgb(0x29, 0x62, 0xff),
                highlight: Color::Rgb(0xe3, 0xf2, 0xfd),
                warn: Color::Rgb(0xb4, 0x53, 0x09),
                series: (0x29, 0x62, 0xff),
                axis: (0x33, 0x33, 0x33),
            },
            Theme::Dark => Palette {
                background: Color::Rgb(0x02, 0x06, 0x17),
                text: Color::Rgb(0xe5, 0xe7, 0xeb),
                muted: Color::Rgb(0x9c, 0xa3, 0xaf),
                border: Color::Rgb(0x33, 0x41, 0x55),
                accent: Color::Rgb(0x60, 0xa5, 0xfa),
                highlight: Color::Rgb(0x1e, 0x29, 0x3b),
                warn: Color::Rgb(0xfb, 0xbf, 0x24),
                series: (0x60, 0xa5, 0xfa),
                axis: (0xe5, 0xe7, 0xeb),
            },
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Colors for one theme. `series` and `axis` are raw RGB for the plotting backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: Color,
    pub text: Color,
    pub muted: Color,
    pub border: Color,
    pub accent: Color,
    pub highlight: Color,
    pub warn: Color,
    pub series: (u8, u8, u8),
    pub axis: (u8, u8, u8),
}

/// Current theme for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ThemeContext {
    theme: Theme,
}

impl ThemeContext {
    /// A valid stored preference wins; otherwise follow the system preference.
    pub fn init(stored: Option<&str>, prefers_dark: bool) -> Self {
        let theme = stored.and_then(Theme::parse).unwrap_or(if prefers_dark {
            Theme::Dark
        } else {
            Theme::Light
        });
        Self { theme }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn palette(&self) -> Palette {
        self.theme.palette()
    }

    pub fn toggle(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        tracing::debug!(theme = %self.theme, "theme toggled");
        self.theme
    }
}

/// Best-effort guess at whether the terminal uses a dark background.
///
/// Reads `COLORFGBG` (`fg;bg`), where a background index below 7 (or 8) means dark.
/// Defaults to dark when unset, which is the common terminal case.
pub fn terminal_prefers_dark(colorfgbg: Option<&str>) -> bool {
    let Some(value) = colorfgbg else {
        return true;
    };
    match value.rsplit(';').next().and_then(|bg| bg.trim().parse::<u8>().ok()) {
        Some(bg) => bg < 7 || bg == 8,
        None => true,
    }
}
