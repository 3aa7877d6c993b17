//! Help overlay widget

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Widget},
};

use crate::ui::theme::Theme;

pub struct HelpOverlay<'a> {
    theme: &'a Theme,
}

impl<'a> HelpOverlay<'a> {
    pub fn new(theme: &'a Theme) -> Self {
        Self { theme }
    }
}

impl<'a> Widget for HelpOverlay<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }
        Clear.render(area, buf);

        let block = Block::default()
            .title(Span::styled(" Rigscope Help ", self.theme.styles.panel_title))
            .borders(Borders::ALL)
            .border_style(self.theme.styles.panel_border_focused)
            .style(Style::default().bg(self.theme.colors.bg_secondary));

        let inner = block.inner(area);
        block.render(area, buf);

        let keybindings = [
            ("General", vec![
                ("q", "Quit"),
                ("Ctrl-C", "Quit"),
                ("?", "Toggle help"),
                ("Esc", "Close overlay"),
            ]),
            ("Hardware", vec![
                ("r", "Re-run hardware identity probe"),
            ]),
            ("View", vec![
                ("t", "Cycle colour theme"),
                ("c", "Toggle per-core grid"),
            ]),
        ];

        let mut y = inner.y;

        for (section, bindings) in &keybindings {
            if y >= inner.y + inner.height {
                break;
            }

            let header = Line::from(vec![Span::styled(
                format!("─── {} ", section),
                Style::default()
                    .fg(self.theme.colors.accent_primary)
                    .add_modifier(Modifier::BOLD),
            )]);
            buf.set_line(inner.x + 1, y, &header, inner.width.saturating_sub(2));
            y += 1;

            for (key, desc) in bindings {
                if y >= inner.y + inner.height {
                    break;
                }

                let line = Line::from(vec![
                    Span::styled(
                        format!("  {:>8}  ", key),
                        self.theme.styles.keybind_key,
                    ),
                    Span::styled(*desc, self.theme.styles.keybind),
                ]);
                buf.set_line(inner.x + 1, y, &line, inner.width.saturating_sub(2));
                y += 1;
            }

            y += 1;
        }

        let hint = " Press Esc or ? to close ";
        let hint_width = (hint.len() as u16).min(area.width);
        buf.set_span(
            area.x + area.width.saturating_sub(hint_width) / 2,
            area.y + area.height.saturating_sub(1),
            &Span::styled(hint, Style::default().fg(self.theme.colors.fg_muted)),
            hint_width,
        );
    }
}
