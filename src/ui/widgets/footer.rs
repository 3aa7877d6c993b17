//! Footer widget with keybindings

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::Widget,
};

use crate::core::state::{AppMode, AppState};
use crate::ui::theme::Theme;

pub struct Footer<'a> {
    state: &'a AppState,
    theme: &'a Theme,
}

impl<'a> Footer<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }
}

impl<'a> Widget for Footer<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 {
            return;
        }
        buf.set_style(area, self.theme.styles.footer);

        let cores = if self.state.show_cores {
            "Hide cores"
        } else {
            "Show cores"
        };

        let bindings = match self.state.mode {
            AppMode::Dashboard => vec![
                ("r", "Re-probe"),
                ("t", "Theme"),
                ("c", cores),
                ("?", "Help"),
                ("q", "Quit"),
            ],
            AppMode::Help => vec![("Esc", "Close"), ("q", "Close")],
        };

        let mut spans = Vec::new();
        for (i, (key, action)) in bindings.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled("  ", self.theme.styles.keybind));
            }
            spans.push(Span::styled(
                format!("[{}]", key),
                self.theme.styles.keybind_key,
            ));
            spans.push(Span::styled(
                format!(" {}", action),
                self.theme.styles.keybind,
            ));
        }

        let line = Line::from(spans);
        buf.set_line(area.x + 1, area.y, &line, area.width.saturating_sub(2));

        let theme_name = format!("{} ", self.theme.name);
        let x = area.x + area.width.saturating_sub(theme_name.len() as u16);
        buf.set_span(
            x,
            area.y,
            &Span::styled(&theme_name, self.theme.styles.keybind),
            theme_name.len() as u16,
        );
    }
}
