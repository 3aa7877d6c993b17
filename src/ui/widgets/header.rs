//! Header widget

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::Widget,
};
use unicode_width::UnicodeWidthStr;

use crate::core::health::health_label;
use crate::core::state::AppState;
use crate::format::format_uptime;
use crate::ui::theme::Theme;

pub struct Header<'a> {
    state: &'a AppState,
    theme: &'a Theme,
}

impl<'a> Header<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    fn separator(&self) -> Span<'static> {
        Span::styled(" │ ", self.theme.styles.label)
    }

    fn identity_line(&self) -> Line<'a> {
        let styles = &self.theme.styles;
        match &self.state.identity {
            Some(identity) => Line::from(vec![
                Span::styled(" Board: ", styles.label),
                Span::styled(identity.board.clone(), styles.value),
                self.separator(),
                Span::styled("Display: ", styles.label),
                Span::styled(identity.monitor.clone(), styles.value),
            ]),
            None => Line::from(Span::styled(" Detecting hardware…", styles.label)),
        }
    }
}

impl<'a> Widget for Header<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 {
            return;
        }
        buf.set_style(area, self.theme.styles.header);
        let styles = &self.theme.styles;

        let mut title = vec![
            Span::styled(" ◉ RIGSCOPE", styles.header_title),
            self.separator(),
            Span::styled(self.state.host.hostname.clone(), styles.value),
            self.separator(),
            Span::styled(self.state.host.os.clone(), styles.value),
            self.separator(),
            Span::styled("Uptime: ", styles.label),
            Span::styled(format_uptime(self.state.uptime_secs), styles.value),
        ];
        if self.state.probing {
            title.push(self.separator());
            title.push(Span::styled("probing…", styles.highlight));
        }
        buf.set_line(area.x, area.y, &Line::from(title), area.width);

        let time = chrono::Local::now().format("%H:%M:%S ").to_string();
        let time_x = area.x + area.width.saturating_sub(time.width() as u16);
        buf.set_span(time_x, area.y, &Span::styled(&time, styles.label), time.width() as u16);

        if area.height < 2 {
            return;
        }

        let health = format!(
            "System Health: {}% ({}) ",
            self.state.health,
            health_label(self.state.health)
        );
        let health_width = health.width() as u16;
        let left_width = area.width.saturating_sub(health_width + 1);

        buf.set_line(area.x, area.y + 1, &self.identity_line(), left_width);
        buf.set_span(
            area.x + area.width.saturating_sub(health_width),
            area.y + 1,
            &Span::styled(&health, self.theme.health_style(self.state.health)),
            health_width,
        );
    }
}
