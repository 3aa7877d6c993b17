//! Theme system with colour palettes

use std::str::FromStr;

use palette::Srgb;
use ratatui::style::{Color, Modifier, Style};

use crate::config::ThresholdsConfig;
use crate::integrations::latency::Latency;

/// Theme keys in cycling order.
pub const THEME_NAMES: [&str; 3] = ["graphite", "tokyo-night", "nord"];

/// Complete theme definition
#[derive(Debug, Clone)]
pub struct Theme {
    pub key: &'static str,
    pub name: String,
    pub colors: ThemeColors,
    pub styles: ThemeStyles,
}

#[derive(Debug, Clone)]
pub struct ThemeColors {
    // Base colors
    pub bg_primary: Color,
    pub bg_secondary: Color,
    pub bg_tertiary: Color,

    pub fg_primary: Color,
    pub fg_muted: Color,

    // Accent colors
    pub accent_primary: Color,
    pub accent_secondary: Color,

    // Semantic colors
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,

    pub border: Color,
    pub gauge_track: Color,
}

#[derive(Debug, Clone)]
pub struct ThemeStyles {
    pub header: Style,
    pub header_title: Style,
    pub footer: Style,
    pub panel_title: Style,
    pub panel_border: Style,
    pub panel_border_focused: Style,
    pub label: Style,
    pub value: Style,
    pub highlight: Style,
    pub gauge_track: Style,
    pub sparkline: Style,
    pub keybind: Style,
    pub keybind_key: Style,
    pub status_good: Style,
    pub status_warning: Style,
    pub status_critical: Style,
    pub notification_info: Style,
    pub notification_success: Style,
    pub notification_error: Style,
}

impl Theme {
    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "tokyo-night" | "tokyonight" => Self::tokyo_night(),
            "nord" => Self::nord(),
            "graphite" => Self::graphite(),
            other => {
                tracing::warn!(theme = other, "unknown theme, using graphite");
                Self::graphite()
            }
        }
    }

    /// The theme after this one in [`THEME_NAMES`].
    pub fn next(&self) -> Self {
        let idx = THEME_NAMES.iter().position(|k| *k == self.key).unwrap_or(0);
        Self::from_name(THEME_NAMES[(idx + 1) % THEME_NAMES.len()])
    }

    /// Graphite theme (default): dark grey panels with a blue header accent
    pub fn graphite() -> Self {
        let colors = ThemeColors {
            bg_primary: Color::Rgb(26, 26, 26),
            bg_secondary: Color::Rgb(43, 43, 43),
            bg_tertiary: Color::Rgb(56, 56, 56),

            fg_primary: Color::Rgb(235, 235, 235),
            fg_muted: Color::Rgb(160, 160, 160),

            accent_primary: Color::Rgb(59, 142, 208),
            accent_secondary: Color::Rgb(93, 165, 218),

            success: Color::Rgb(44, 201, 133),
            warning: Color::Rgb(242, 163, 60),
            error: Color::Rgb(224, 79, 95),
            info: Color::Rgb(93, 165, 218),

            border: Color::Rgb(64, 64, 64),
            gauge_track: Color::Rgb(56, 56, 56),
        };

        Self::from_colors("graphite", "Graphite", colors)
    }

    /// Tokyo Night theme
    pub fn tokyo_night() -> Self {
        let colors = ThemeColors {
            bg_primary: Color::Rgb(26, 27, 38),
            bg_secondary: Color::Rgb(36, 40, 59),
            bg_tertiary: Color::Rgb(41, 46, 66),

            fg_primary: Color::Rgb(192, 202, 245),
            fg_muted: Color::Rgb(86, 95, 137),

            accent_primary: Color::Rgb(122, 162, 247),
            accent_secondary: Color::Rgb(187, 154, 247),

            success: Color::Rgb(158, 206, 106),
            warning: Color::Rgb(224, 175, 104),
            error: Color::Rgb(247, 118, 142),
            info: Color::Rgb(125, 207, 255),

            border: Color::Rgb(41, 46, 66),
            gauge_track: Color::Rgb(52, 59, 88),
        };

        Self::from_colors("tokyo-night", "Tokyo Night", colors)
    }

    /// Nord theme
    pub fn nord() -> Self {
        let colors = ThemeColors {
            bg_primary: Color::Rgb(46, 52, 64),
            bg_secondary: Color::Rgb(59, 66, 82),
            bg_tertiary: Color::Rgb(67, 76, 94),

            fg_primary: Color::Rgb(236, 239, 244),
            fg_muted: Color::Rgb(216, 222, 233),

            accent_primary: Color::Rgb(136, 192, 208),
            accent_secondary: Color::Rgb(129, 161, 193),

            success: Color::Rgb(163, 190, 140),
            warning: Color::Rgb(235, 203, 139),
            error: Color::Rgb(191, 97, 106),
            info: Color::Rgb(136, 192, 208),

            border: Color::Rgb(67, 76, 94),
            gauge_track: Color::Rgb(76, 86, 106),
        };

        Self::from_colors("nord", "Nord", colors)
    }

    /// Replace the primary accent with a `#RRGGBB` colour. Invalid input
    /// leaves the theme untouched.
    pub fn with_accent(self, hex: &str) -> Self {
        match parse_hex(hex) {
            Some(accent) => {
                let mut colors = self.colors;
                colors.accent_primary = accent;
                Self::from_colors(self.key, &self.name, colors)
            }
            None => {
                tracing::warn!(accent = hex, "ignoring invalid accent colour");
                self
            }
        }
    }

    /// Colour for a utilisation percentage.
    pub fn usage_style(&self, percent: f64, thresholds: &ThresholdsConfig) -> Style {
        if percent < thresholds.usage_warning {
            self.styles.status_good
        } else if percent < thresholds.usage_critical {
            self.styles.status_warning
        } else {
            self.styles.status_critical
        }
    }

    pub fn latency_style(&self, latency: Latency, thresholds: &ThresholdsConfig) -> Style {
        match latency {
            Latency::Pending => self.styles.label,
            Latency::Offline => self.styles.status_critical,
            Latency::Online(_) => match latency.millis() {
                Some(ms) if ms < thresholds.ping_warning_ms => self.styles.status_good,
                _ => self.styles.status_warning,
            },
        }
    }

    pub fn health_style(&self, score: u8) -> Style {
        match score {
            60.. => self.styles.status_good,
            40..=59 => self.styles.status_warning,
            _ => self.styles.status_critical,
        }
    }

    fn from_colors(key: &'static str, name: &str, colors: ThemeColors) -> Self {
        let styles = ThemeStyles {
            header: Style::default()
                .bg(colors.bg_secondary)
                .fg(colors.fg_primary),
            header_title: Style::default()
                .fg(colors.accent_primary)
                .add_modifier(Modifier::BOLD),
            footer: Style::default().bg(colors.bg_secondary).fg(colors.fg_muted),
            panel_title: Style::default()
                .fg(colors.accent_primary)
                .add_modifier(Modifier::BOLD),
            panel_border: Style::default().fg(colors.border),
            panel_border_focused: Style::default().fg(colors.accent_primary),
            label: Style::default().fg(colors.fg_muted),
            value: Style::default().fg(colors.fg_primary),
            highlight: Style::default()
                .fg(colors.accent_secondary)
                .add_modifier(Modifier::BOLD),
            gauge_track: Style::default().fg(colors.gauge_track),
            sparkline: Style::default().fg(colors.accent_primary),
            keybind: Style::default().fg(colors.fg_muted),
            keybind_key: Style::default()
                .fg(colors.accent_secondary)
                .add_modifier(Modifier::BOLD),
            status_good: Style::default().fg(colors.success),
            status_warning: Style::default().fg(colors.warning),
            status_critical: Style::default().fg(colors.error),
            notification_info: Style::default().fg(colors.info),
            notification_success: Style::default().fg(colors.success),
            notification_error: Style::default().fg(colors.error),
        };

        Self {
            key,
            name: name.to_string(),
            colors,
            styles,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::graphite()
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    let rgb = Srgb::<u8>::from_str(hex.trim()).ok()?;
    Some(Color::Rgb(rgb.red, rgb.green, rgb.blue))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn themes_cycle_through_all_names() {
        let mut theme = Theme::default();
        let mut seen = vec![theme.key];
        for _ in 0..THEME_NAMES.len() {
            theme = theme.next();
            seen.push(theme.key);
        }
        assert_eq!(seen, vec!["graphite", "tokyo-night", "nord", "graphite"]);
    }

    #[test]
    fn unknown_theme_falls_back_to_graphite() {
        assert_eq!(Theme::from_name("solarized").key, "graphite");
        assert_eq!(Theme::from_name("Nord").key, "nord");
    }

    #[test]
    fn accent_override_parses_hex() {
        let theme = Theme::nord().with_accent("#FF8800");
        assert_eq!(theme.colors.accent_primary, Color::Rgb(255, 136, 0));
        assert_eq!(theme.styles.panel_title.fg, Some(Color::Rgb(255, 136, 0)));

        let untouched = Theme::nord().with_accent("not-a-colour");
        assert_eq!(untouched.colors.accent_primary, Theme::nord().colors.accent_primary);
    }

    #[test]
    fn usage_colours_follow_thresholds() {
        let theme = Theme::default();
        let t = ThresholdsConfig::default();
        assert_eq!(theme.usage_style(49.9, &t), theme.styles.status_good);
        assert_eq!(theme.usage_style(50.0, &t), theme.styles.status_warning);
        assert_eq!(theme.usage_style(80.0, &t), theme.styles.status_critical);
    }

    #[test]
    fn latency_colours() {
        let theme = Theme::default();
        let t = ThresholdsConfig::default();
        let fast = Latency::Online(Duration::from_millis(30));
        let slow = Latency::Online(Duration::from_millis(250));
        assert_eq!(theme.latency_style(fast, &t), theme.styles.status_good);
        assert_eq!(theme.latency_style(slow, &t), theme.styles.status_warning);
        assert_eq!(theme.latency_style(Latency::Offline, &t), theme.styles.status_critical);
    }
}
