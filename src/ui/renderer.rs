//! Main UI renderer

use ratatui::{
    layout::Rect,
    style::Style,
    text::Span,
    widgets::{Block, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::core::state::{AppMode, AppState, NotificationLevel};
use crate::ui::layout::LayoutManager;
use crate::ui::widgets::*;

pub struct Renderer;

impl Renderer {
    pub fn render(frame: &mut Frame, state: &AppState) {
        let area = frame.area();
        let theme = &state.theme;

        // Clear background
        frame.render_widget(
            Block::default().style(Style::default().bg(theme.colors.bg_primary)),
            area,
        );

        let layout = LayoutManager::compute(area);

        frame.render_widget(Header::new(state, theme), layout.header);
        frame.render_widget(Footer::new(state, theme), layout.footer);

        frame.render_widget(CpuPanel::new(state, theme), layout.cpu_panel);
        frame.render_widget(MemoryPanel::new(state, theme), layout.memory_panel);
        frame.render_widget(StoragePanel::new(state, theme), layout.storage_panel);
        frame.render_widget(NetworkPanel::new(state, theme), layout.network_panel);

        if state.mode == AppMode::Help {
            frame.render_widget(HelpOverlay::new(theme), layout.overlay_area);
        }

        Self::render_notifications(frame, state);
    }

    fn render_notifications(frame: &mut Frame, state: &AppState) {
        let theme = &state.theme;
        let area = frame.area();

        // Top-right corner, below the header
        let mut y = 3;
        for notification in state.notifications.iter().take(3) {
            if y >= area.height {
                break;
            }

            let (style, icon) = match notification.level {
                NotificationLevel::Info => (theme.styles.notification_info, "ℹ"),
                NotificationLevel::Success => (theme.styles.notification_success, "✓"),
                NotificationLevel::Warning => (theme.styles.status_warning, "⚠"),
                NotificationLevel::Error => (theme.styles.notification_error, "✗"),
            };

            let msg = format!(" {} {} ", icon, notification.message);
            let width = (msg.width() as u16).min(48).min(area.width);
            let x = area.width.saturating_sub(width + 2);

            frame.render_widget(
                Paragraph::new(Span::styled(msg, style))
                    .style(Style::default().bg(theme.colors.bg_tertiary)),
                Rect {
                    x,
                    y,
                    width,
                    height: 1,
                },
            );

            y += 2;
        }
    }
}
