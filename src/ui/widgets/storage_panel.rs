//! Storage panel: physical drives followed by mounted partitions

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::Widget,
};

use super::{gauge_line, panel_block, truncate};
use crate::core::state::AppState;
use crate::format::human_size;
use crate::ui::theme::Theme;

pub struct StoragePanel<'a> {
    state: &'a AppState,
    theme: &'a Theme,
}

impl<'a> StoragePanel<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }
}

impl<'a> Widget for StoragePanel<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = panel_block("STORAGE", self.theme);
        let inner = block.inner(area);
        block.render(area, buf);
        if inner.height == 0 {
            return;
        }

        let width = inner.width as usize;
        let mut lines: Vec<Line> = Vec::new();

        match &self.state.identity {
            Some(identity) => lines.extend(identity.disk_labels().into_iter().map(|label| {
                Line::from(Span::styled(truncate(&label, width), self.theme.styles.value))
            })),
            None => lines.push(Line::from(Span::styled("Detecting…", self.theme.styles.label))),
        }

        for disk in self.state.panels.storage.partitions.values() {
            let pct = disk.percent();
            let caption = format!(
                "{:.0}% ({} / {})",
                pct,
                human_size(disk.used),
                human_size(disk.total)
            );
            let mount = truncate(&disk.mount_point, 5);
            let bar_width = width.saturating_sub(6 + caption.len() + 1).min(30);
            let style = self.theme.usage_style(pct, &self.state.thresholds);
            lines.push(gauge_line(&mount, pct, bar_width, caption, style, self.theme));
        }

        for (i, line) in lines.iter().enumerate().take(inner.height as usize) {
            buf.set_line(inner.x, inner.y + i as u16, line, inner.width);
        }
    }
}
