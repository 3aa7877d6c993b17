//! Memory panel: module name, RAM and swap gauges

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::Widget,
};

use super::{gauge_line, panel_block, truncate};
use crate::core::state::AppState;
use crate::format::{human_size, percent};
use crate::ui::theme::Theme;

pub struct MemoryPanel<'a> {
    state: &'a AppState,
    theme: &'a Theme,
}

impl<'a> MemoryPanel<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    fn usage_line(&self, label: &str, used: u64, total: u64, width: usize) -> Line<'a> {
        let pct = percent(used, total);
        let caption = format!(
            "{} / {} ({:.0}%)",
            human_size(used),
            human_size(total),
            pct
        );
        let bar_width = width.saturating_sub(6 + caption.len() + 1).min(40);
        let style = self.theme.usage_style(pct, &self.state.thresholds);
        gauge_line(label, pct, bar_width, caption, style, self.theme)
    }
}

impl<'a> Widget for MemoryPanel<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = panel_block("MEMORY", self.theme);
        let inner = block.inner(area);
        block.render(area, buf);
        if inner.height == 0 {
            return;
        }

        let mem = &self.state.panels.memory;
        let width = inner.width as usize;

        let module = self
            .state
            .identity
            .as_ref()
            .map(|i| i.ram.as_str())
            .unwrap_or("Detecting…");

        let mut lines = vec![
            Line::from(Span::styled(truncate(module, width), self.theme.styles.highlight)),
            self.usage_line("RAM", mem.used, mem.total, width),
        ];
        if mem.swap_total > 0 {
            lines.push(self.usage_line("Swap", mem.swap_used, mem.swap_total, width));
        } else {
            lines.push(Line::from(vec![
                Span::styled(format!("{:<6}", "Swap"), self.theme.styles.label),
                Span::styled("none", self.theme.styles.label),
            ]));
        }

        for (i, line) in lines.iter().enumerate().take(inner.height as usize) {
            buf.set_line(inner.x, inner.y + i as u16, line, inner.width);
        }
    }
}
