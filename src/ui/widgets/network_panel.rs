//! Network panel: latency, throughput and hardware rating

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Sparkline, Widget},
};

use super::{gauge_line, panel_block};
use crate::core::state::AppState;
use crate::format::{format_latency, rate};
use crate::integrations::latency::Latency;
use crate::ui::theme::Theme;

pub struct NetworkPanel<'a> {
    state: &'a AppState,
    theme: &'a Theme,
}

impl<'a> NetworkPanel<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }
}

impl<'a> Widget for NetworkPanel<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = panel_block("NETWORK", self.theme);
        let inner = block.inner(area);
        block.render(area, buf);
        if inner.height == 0 {
            return;
        }

        let net = &self.state.panels.network;
        let styles = &self.theme.styles;
        let width = inner.width as usize;

        let ping = match net.latency {
            Latency::Offline => "Offline ❌".to_string(),
            other => format_latency(other),
        };
        let latency_style = self.theme.latency_style(net.latency, &self.state.thresholds);

        let mut lines = vec![
            Line::from(vec![
                Span::styled(format!("{:<6}", "Ping"), styles.label),
                Span::styled(ping, latency_style),
            ]),
            Line::from(vec![
                Span::styled(format!("{:<6}", "Down"), styles.label),
                Span::styled(format!("{:<14}", rate(net.throughput.down)), styles.status_good),
                Span::styled("Up ", styles.label),
                Span::styled(rate(net.throughput.up), styles.notification_info),
            ]),
        ];

        if let Some(identity) = &self.state.identity {
            let caption = format!("{}/100", identity.rating);
            let bar_width = width.saturating_sub(6 + caption.len() + 1).min(30);
            lines.push(gauge_line(
                "Rig",
                f64::from(identity.rating),
                bar_width,
                caption,
                styles.highlight,
                self.theme,
            ));
        }

        for (i, line) in lines.iter().enumerate().take(inner.height as usize) {
            buf.set_line(inner.x, inner.y + i as u16, line, inner.width);
        }

        let used = lines.len() as u16;
        if inner.height > used + 1 && !net.down_history.is_empty() {
            let data: Vec<u64> = net.down_history.iter().copied().collect();
            let visible = &data[data.len().saturating_sub(width)..];
            Sparkline::default()
                .data(visible)
                .style(styles.status_good)
                .render(
                    Rect::new(inner.x, inner.y + used + 1, inner.width, inner.height - used - 1),
                    buf,
                );
        }
    }
}
