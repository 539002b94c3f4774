//! Final upload report

use comfy_table::{presets, Cell, CellAlignment, ContentArrangement, Table};
use serde::Serialize;
use sup_core::Inventory;

/// A payload that did not make it into the inventory
#[derive(Debug, Clone, Serialize)]
pub struct SkippedFile {
    pub path: String,
    pub error: String,
}

/// JSON form of the upload report
#[derive(Debug, Serialize)]
pub struct UploadReport<'a> {
    pub bucket: &'a str,
    pub objects: &'a Inventory,
    pub count: usize,
    pub total_size_bytes: u64,
    pub skipped: Vec<SkippedFile>,
}

impl<'a> UploadReport<'a> {
    pub fn new(bucket: &'a str, inventory: &'a Inventory, skipped: Vec<SkippedFile>) -> Self {
        Self {
            bucket,
            objects: inventory,
            count: inventory.len(),
            total_size_bytes: inventory.total_size(),
            skipped,
        }
    }
}

/// Render the inventory as a table followed by the object count
pub fn render_table(inventory: &Inventory) -> String {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_HORIZONTAL_ONLY)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Object Key", "Last Modified", "Size", "Type"]);

    for record in inventory {
        let date = record
            .modified_date
            .map(|d| d.strftime("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            Cell::new(&record.key),
            Cell::new(date),
            Cell::new(record.size).set_alignment(CellAlignment::Right),
            Cell::new(&record.kind),
        ]);
    }

    let total = humansize::format_size(inventory.total_size(), humansize::BINARY);
    if inventory.is_empty() {
        format!("Objects: 0 ({total})")
    } else {
        format!("{table}\n\nObjects: {} ({total})", inventory.len())
    }
}
