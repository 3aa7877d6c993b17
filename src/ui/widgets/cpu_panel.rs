//! CPU panel: model, load gauge, clock, temperature, history and per-core grid

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Sparkline, Widget},
};

use super::{gauge_line, panel_block, truncate};
use crate::core::state::AppState;
use crate::format::format_temperature;
use crate::ui::theme::Theme;

/// Cores shown in the grid.
const MAX_CORES: usize = 32;
const CORE_CELL_WIDTH: u16 = 11;

pub struct CpuPanel<'a> {
    state: &'a AppState,
    theme: &'a Theme,
}

impl<'a> CpuPanel<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    fn render_cores(&self, area: Rect, buf: &mut Buffer) {
        let per_core = &self.state.panels.cpu.per_core;
        let columns = (area.width / CORE_CELL_WIDTH).max(1) as usize;

        for (i, load) in per_core.iter().take(MAX_CORES).enumerate() {
            let row = (i / columns) as u16;
            let col = (i % columns) as u16;
            if row >= area.height {
                break;
            }
            let style = self.theme.usage_style(f64::from(*load), &self.state.thresholds);
            let line = Line::from(vec![
                Span::styled(format!("C{:<2} ", i), self.theme.styles.label),
                Span::styled(format!("{:>3.0}%", load), style),
            ]);
            buf.set_line(
                area.x + col * CORE_CELL_WIDTH,
                area.y + row,
                &line,
                CORE_CELL_WIDTH,
            );
        }
    }
}

impl<'a> Widget for CpuPanel<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = panel_block("CPU", self.theme);
        let inner = block.inner(area);
        block.render(area, buf);
        if inner.height == 0 || inner.width < 10 {
            return;
        }

        let cpu = &self.state.panels.cpu;
        let styles = &self.theme.styles;
        let width = inner.width as usize;
        let mut y = inner.y;
        let bottom = inner.y + inner.height;

        let model = self
            .state
            .identity
            .as_ref()
            .map(|i| i.cpu.as_str())
            .unwrap_or("Detecting…");
        buf.set_line(
            inner.x,
            y,
            &Line::from(Span::styled(truncate(model, width), styles.highlight)),
            inner.width,
        );
        y += 1;

        if y < bottom {
            let percent = f64::from(cpu.percent);
            let caption = format!("{:.0}% | Free: {:.0}%", percent, (100.0 - percent).max(0.0));
            let bar_width = width.saturating_sub(6 + caption.len() + 1).min(40);
            let style = self.theme.usage_style(percent, &self.state.thresholds);
            let line = gauge_line("Load", percent, bar_width, caption, style, self.theme);
            buf.set_line(inner.x, y, &line, inner.width);
            y += 1;
        }

        if y < bottom {
            let mut spans = vec![
                Span::styled("Clock ", styles.label),
                Span::styled(format!("{} MHz", cpu.frequency_mhz), styles.value),
                Span::styled("   Temp ", styles.label),
                Span::styled(format_temperature(cpu.temperature), styles.value),
            ];
            if let Some(reading) = cpu.temperature {
                spans.push(Span::styled(format!(" ({})", reading.source), styles.label));
            }
            buf.set_line(inner.x, y, &Line::from(spans), inner.width);
            y += 1;
        }

        let core_rows = if self.state.show_cores {
            let columns = (inner.width / CORE_CELL_WIDTH).max(1) as usize;
            cpu.per_core.len().min(MAX_CORES).div_ceil(columns) as u16
        } else {
            0
        };

        // History sparkline takes whatever the core grid leaves over.
        let spark_height = bottom
            .saturating_sub(y)
            .saturating_sub(core_rows + u16::from(core_rows > 0))
            .min(4);
        if spark_height > 0 && !cpu.history.is_empty() {
            let data: Vec<u64> = cpu.history.iter().map(|v| v.round() as u64).collect();
            let visible = &data[data.len().saturating_sub(width)..];
            Sparkline::default()
                .data(visible)
                .max(100)
                .style(styles.sparkline)
                .render(Rect::new(inner.x, y, inner.width, spark_height), buf);
            y += spark_height;
        }

        if core_rows > 0 && y < bottom {
            y += 1;
            if y < bottom {
                self.render_cores(Rect::new(inner.x, y, inner.width, bottom - y), buf);
            }
        }
    }
}
