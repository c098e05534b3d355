use std::io::{BufWriter, Write};

use tempfile::NamedTempFile;

use crate::{
    Result,
    workbook::{cell::CellValue, make_cell_ref, write_cell},
};

/// Streams one worksheet's rows into a spooled temp file; the workbook
/// copies it into the zip package on `finish`. Rows are written once, in
/// order, and cells may carry a registered style index.
pub struct SheetWriter {
    name: String,
    pub(crate) temp: BufWriter<NamedTempFile>,
    current_row: u32,
    max_col: u32,
}

impl SheetWriter {
    pub(crate) fn new(name: &str) -> Result<Self> {
        let temp_file = NamedTempFile::new()?;
        let mut writer = BufWriter::new(temp_file);

        write!(
            writer,
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
                r#"<sheetViews><sheetView workbookViewId="0"/></sheetViews>"#,
                r#"<sheetFormatPr defaultRowHeight="15"/>"#,
                r#"<sheetData>"#,
            )
        )?;

        Ok(SheetWriter {
            name: name.to_string(),
            temp: writer,
            current_row: 0,
            max_col: 0,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn write_row(&mut self, cells: &[CellValue]) -> Result<()> {
        let unstyled: Vec<(CellValue, Option<usize>)> =
            cells.iter().map(|cell| (*cell, None)).collect();
        self.write_styled_row(&unstyled)
    }

    /// Write one row; each cell is (value, registered xf index). An empty
    /// slice still consumes a row number.
    pub fn write_styled_row(&mut self, cells: &[(CellValue, Option<usize>)]) -> Result<()> {
        self.current_row += 1;
        let row = self.current_row;

        if cells.is_empty() {
            return Ok(());
        }

        if cells.len() as u32 > self.max_col {
            self.max_col = cells.len() as u32;
        }

        write!(self.temp, "<row r=\"{row}\">")?;
        for (col_idx, (cell, style_idx)) in cells.iter().enumerate() {
            let cell_ref = make_cell_ref(row, col_idx as u32);
            write_cell(&mut self.temp, &cell_ref, cell, *style_idx)?;
        }
        writeln!(self.temp, "</row>")?;

        Ok(())
    }

    pub(crate) fn finalize(&mut self) -> Result<()> {
        write!(
            self.temp,
            "</sheetData>\
                <pageMargins left=\"0.75\" right=\"0.75\" top=\"1\" bottom=\"1\" header=\"0.5\" footer=\"0.5\"/>\
             </worksheet>"
        )?;
        self.temp.flush()?;
        Ok(())
    }
}
