//! End-to-end orchestration: snapshot every sheet of a workbook, plan the
//! colour-preview writes, and emit a styled copy.

use std::collections::HashMap;

use log::info;

use crate::{
    Result,
    preview::PreviewRule,
    workbook::{Workbook, cell::CellValue, reader::WorkbookReader, style::Style},
};

/// Per-sheet recoloured-cell counts from one pass.
#[derive(Debug, Default)]
pub struct RecolorSummary {
    pub sheets: Vec<(String, usize)>,
}

impl RecolorSummary {
    pub fn total_recolored(&self) -> usize {
        self.sheets.iter().map(|(_, n)| n).sum()
    }
}

/// Copy `input` to `output`, colouring every cell whose value is a CSS
/// hex code: background = the literal value, foreground = the rule's
/// readable variant. Every other cell is carried over untouched. Each
/// sheet is read fully before any of its rows are written.
pub fn recolor_workbook(input: &str, output: &str, rule: &PreviewRule) -> Result<RecolorSummary> {
    let reader = WorkbookReader::open(input)?;
    let mut workbook = Workbook::create(output);
    let mut summary = RecolorSummary::default();

    for sheet_name in reader.sheet_names() {
        let range = reader.read_range(sheet_name)?;
        let writes = rule.plan(&range);

        // interning is workbook-wide, so repeated colours share one style
        let mut styled: HashMap<(u32, u32), usize> = HashMap::new();
        for write in &writes {
            let idx = workbook.register_style(
                &Style::new()
                    .bg(&write.background)
                    .font_color(&write.foreground),
            );
            styled.insert((write.row, write.col), idx);
        }

        let sheet = workbook.add_sheet(sheet_name)?;
        for (row_idx, cells) in range.rows().enumerate() {
            let row: Vec<(CellValue, Option<usize>)> = cells
                .iter()
                .enumerate()
                .map(|(col_idx, value)| {
                    (
                        CellValue::from_raw(value),
                        styled.get(&(row_idx as u32, col_idx as u32)).copied(),
                    )
                })
                .collect();
            sheet.write_styled_row(&row)?;
        }

        info!(
            "sheet '{sheet_name}': recoloured {} of {} cells",
            writes.len(),
            range.row_count() * range.col_count()
        );
        summary.sheets.push((sheet_name.clone(), writes.len()));
    }

    workbook.finish()?;
    Ok(summary)
}
