//! Layout management system

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Computed layout rects for all panels
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComputedLayout {
    pub header: Rect,
    pub footer: Rect,
    pub cpu_panel: Rect,
    pub memory_panel: Rect,
    pub storage_panel: Rect,
    pub network_panel: Rect,
    pub overlay_area: Rect,
}

pub struct LayoutManager;

impl LayoutManager {
    /// Header, a 2x2 panel grid and footer. Narrow terminals stack the
    /// panels in a single column.
    pub fn compute(area: Rect) -> ComputedLayout {
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2), // Header
                Constraint::Min(8),    // Body
                Constraint::Length(1), // Footer
            ])
            .split(area);

        let body = main_chunks[1];
        let [cpu_panel, memory_panel, storage_panel, network_panel] = if area.width >= 100 {
            Self::grid(body)
        } else {
            Self::stacked(body)
        };

        ComputedLayout {
            header: main_chunks[0],
            footer: main_chunks[2],
            cpu_panel,
            memory_panel,
            storage_panel,
            network_panel,
            overlay_area: Self::centered_rect(60, 70, area),
        }
    }

    fn grid(body: Rect) -> [Rect; 4] {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(body);

        let halves = |row: Rect| {
            Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
                .split(row)
        };
        let top = halves(rows[0]);
        let bottom = halves(rows[1]);

        [top[0], top[1], bottom[0], bottom[1]]
    }

    fn stacked(body: Rect) -> [Rect; 4] {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(8),
                Constraint::Length(5),
                Constraint::Min(5),
                Constraint::Length(6),
            ])
            .split(body);

        [chunks[0], chunks[1], chunks[2], chunks[3]]
    }

    /// Create a centered rect with given percentage width/height
    pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
        let popup_layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ])
            .split(area);

        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ])
            .split(popup_layout[1])[1]
    }
}
