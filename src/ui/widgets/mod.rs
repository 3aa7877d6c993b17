//! UI Widgets

pub mod cpu_panel;
pub mod footer;
pub mod header;
pub mod help_overlay;
pub mod memory_panel;
pub mod network_panel;
pub mod storage_panel;

pub use cpu_panel::CpuPanel;
pub use footer::Footer;
pub use header::Header;
pub use help_overlay::HelpOverlay;
pub use memory_panel::MemoryPanel;
pub use network_panel::NetworkPanel;
pub use storage_panel::StoragePanel;

use ratatui::{
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::ui::theme::Theme;

/// Bordered panel block with the theme's title style.
pub(crate) fn panel_block<'a>(title: &'a str, theme: &Theme) -> Block<'a> {
    Block::default()
        .title(Span::styled(format!(" {title} "), theme.styles.panel_title))
        .borders(Borders::ALL)
        .border_style(theme.styles.panel_border)
        .style(Style::default().bg(theme.colors.bg_primary))
}

/// Horizontal bar: `width` cells, the filled part in `fill`.
pub(crate) fn gauge<'a>(percent: f64, width: usize, fill: Style, theme: &Theme) -> Vec<Span<'a>> {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    let filled = filled.min(width);
    vec![
        Span::styled("█".repeat(filled), fill),
        Span::styled("░".repeat(width - filled), theme.styles.gauge_track),
    ]
}

/// `label` followed by a gauge and a trailing caption.
pub(crate) fn gauge_line<'a>(
    label: &str,
    percent: f64,
    width: usize,
    caption: String,
    fill: Style,
    theme: &Theme,
) -> Line<'a> {
    let mut spans = vec![Span::styled(format!("{label:<6}"), theme.styles.label)];
    spans.extend(gauge(percent, width, fill, theme));
    spans.push(Span::styled(format!(" {caption}"), fill));
    Line::from(spans)
}

/// Clip `text` to `max` terminal cells, marking the cut with an ellipsis.
pub(crate) fn truncate(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > max - 1 {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}
