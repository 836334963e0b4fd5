use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};

use crate::report::{STATUS_CANCELLED, STATUS_ERROR, STATUS_SUCCESS};

/// Table and cell creation helpers
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn cyan_header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| Cell::new(*label).fg(TableColor::Cyan))
        .collect()
}

pub fn status_color(label: &str) -> TableColor {
    match label {
        STATUS_SUCCESS => TableColor::Green,
        STATUS_ERROR => TableColor::Red,
        STATUS_CANCELLED => TableColor::Yellow,
        _ => TableColor::DarkGrey,
    }
}

pub fn color_coded_status_cell(label: &str) -> Cell {
    Cell::new(label).fg(status_color(label))
}
