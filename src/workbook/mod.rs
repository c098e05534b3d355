use std::{
    collections::HashMap,
    fs::File,
    io::{Seek, SeekFrom, Write},
};

use zip::{ZipWriter, write::SimpleFileOptions};

use crate::{
    Result,
    error::HexSheetError,
    workbook::{
        cell::CellValue,
        sheet::SheetWriter,
        style::{Style, StyleRegistry},
    },
};

pub mod cell;
pub mod reader;
pub mod sheet;
pub mod style;

const RELS_DOT_RELS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>"#,
    r#"</Relationships>"#,
);

fn workbook_xml(order: &[String]) -> String {
    let mut sheets = String::new();
    for (i, name) in order.iter().enumerate() {
        let sheet_id = i + 1;
        let r_id = format!("rId{}", i + 1);
        let escaped_name = xml_escape(name);
        sheets.push_str(&format!(
            r#"<sheet name="{escaped_name}" sheetId="{sheet_id}" r:id="{r_id}"/>"#
        ));
    }

    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" "#,
            r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
            r#"<bookViews><workbookView activeTab="0"/></bookViews>"#,
            r#"<sheets>{}</sheets>"#,
            r#"</workbook>"#,
        ),
        sheets
    )
}

fn workbook_rels_xml(sheet_count: usize) -> String {
    let mut rels = String::new();

    for i in 1..=sheet_count {
        rels.push_str(&format!(
            r#"<Relationship Id="rId{i}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{i}.xml"/>"#
        ));
    }

    let styles_id = sheet_count + 1;
    rels.push_str(&format!(
        r#"<Relationship Id="rId{styles_id}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#
    ));

    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
            r#"{}"#,
            r#"</Relationships>"#,
        ),
        rels
    )
}

fn content_types_xml(sheet_count: usize) -> String {
    let mut overrides = String::new();

    for i in 1..=sheet_count {
        overrides.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{i}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
        ));
    }

    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
            r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
            r#"<Default Extension="xml" ContentType="application/xml"/>"#,
            r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
            r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#,
            r#"{}"#,
            r#"</Types>"#,
        ),
        overrides
    )
}

/// Writes an xlsx package. Styles are registered on the workbook first;
/// sheet rows then carry the returned xf indices, so sheets never need a
/// back-reference into the registry.
pub struct Workbook {
    output_path: String,
    sheets: HashMap<String, SheetWriter>,
    insertion_order: Vec<String>,
    styles: StyleRegistry,
}

impl Workbook {
    pub fn create(path: impl Into<String>) -> Self {
        Workbook {
            output_path: path.into(),
            sheets: HashMap::new(),
            insertion_order: Vec::new(),
            styles: StyleRegistry::new(),
        }
    }

    /// Intern a style and return the xf index to pass to
    /// `write_styled_row`. Registering an identical style is free.
    pub fn register_style(&mut self, style: &Style) -> usize {
        self.styles.register(style)
    }

    pub fn add_sheet(&mut self, name: &str) -> Result<&mut SheetWriter> {
        if self.sheets.contains_key(name) {
            return Err(HexSheetError::AlreadyExists(format!(
                "sheet '{name}' already exists"
            )));
        }
        let writer = SheetWriter::new(name)?;
        self.sheets.insert(name.to_string(), writer);
        self.insertion_order.push(name.to_string());
        match self.sheets.get_mut(name) {
            Some(sheet) => Ok(sheet),
            None => Err(HexSheetError::NotFound(format!("sheet '{name}'"))),
        }
    }

    pub fn get_sheet(&mut self, name: &str) -> Option<&mut SheetWriter> {
        self.sheets.get_mut(name)
    }

    pub fn finish(mut self) -> Result<()> {
        for name in &self.insertion_order {
            match self.sheets.get_mut(name) {
                Some(sheet) => sheet.finalize()?,
                None => return Err(HexSheetError::NotFound(format!("sheet '{name}'"))),
            }
        }

        let output_file = File::create(&self.output_path)?;
        let mut zip = ZipWriter::new(output_file);
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        zip_write_str(
            &mut zip,
            "[Content_Types].xml",
            &content_types_xml(self.insertion_order.len()),
            options,
        )?;
        zip_write_str(&mut zip, "_rels/.rels", RELS_DOT_RELS, options)?;
        zip_write_str(
            &mut zip,
            "xl/workbook.xml",
            &workbook_xml(&self.insertion_order),
            options,
        )?;
        zip_write_str(
            &mut zip,
            "xl/_rels/workbook.xml.rels",
            &workbook_rels_xml(self.insertion_order.len()),
            options,
        )?;
        zip_write_str(&mut zip, "xl/styles.xml", &self.styles.to_xml(), options)?;

        for (i, name) in self.insertion_order.iter().enumerate() {
            let sheet = match self.sheets.get_mut(name) {
                Some(sheet) => sheet,
                None => return Err(HexSheetError::NotFound(format!("sheet '{name}'"))),
            };
            zip.start_file(format!("xl/worksheets/sheet{}.xml", i + 1), options)?;

            let temp_file = sheet.temp.get_mut();
            temp_file.seek(SeekFrom::Start(0))?;
            std::io::copy(temp_file, &mut zip)?;
        }

        zip.finish()?;
        Ok(())
    }
}

/// `A1`-style reference from a 1-indexed row and 0-indexed column.
pub(crate) fn make_cell_ref(row: u32, col: u32) -> String {
    format!("{}{}", col_to_letters(col), row)
}

pub(crate) fn col_to_letters(mut col: u32) -> String {
    let mut result = Vec::new();
    loop {
        result.push(b'A' + (col % 26) as u8);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    result.reverse();
    String::from_utf8(result).unwrap_or_default()
}

pub(crate) fn xml_escape(s: &str) -> String {
    if !s.contains(['&', '<', '>', '"', '\'']) {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len() + 8);
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

pub(crate) fn write_cell<W: Write>(
    w: &mut W,
    cell_ref: &str,
    value: &CellValue,
    style_idx: Option<usize>,
) -> Result<()> {
    let s = match style_idx {
        Some(0) | None => String::new(),
        Some(n) => format!(" s=\"{n}\""),
    };

    match value {
        CellValue::Blank => {
            write!(w, "<c r=\"{cell_ref}\"{s}/>")?;
        }
        CellValue::Number(n) => {
            write!(w, "<c r=\"{cell_ref}\"{s}><v>{n}</v></c>")?;
        }
        CellValue::Text(text) => {
            let escaped = xml_escape(text);
            write!(
                w,
                "<c r=\"{cell_ref}\"{s} t=\"inlineStr\"><is><t>{escaped}</t></is></c>"
            )?;
        }
        CellValue::Bool(b) => {
            let val = if *b { 1 } else { 0 };
            write!(w, "<c r=\"{cell_ref}\"{s} t=\"b\"><v>{val}</v></c>")?;
        }
    }
    Ok(())
}

fn zip_write_str<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    path: &str,
    content: &str,
    options: SimpleFileOptions,
) -> Result<()> {
    zip.start_file(path, options)?;
    zip.write_all(content.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_letters_roll_over_like_excel() {
        assert_eq!(col_to_letters(0), "A");
        assert_eq!(col_to_letters(25), "Z");
        assert_eq!(col_to_letters(26), "AA");
        assert_eq!(col_to_letters(27), "AB");
        assert_eq!(col_to_letters(701), "ZZ");
        assert_eq!(col_to_letters(702), "AAA");
    }

    #[test]
    fn cell_refs_use_one_indexed_rows() {
        assert_eq!(make_cell_ref(1, 0), "A1");
        assert_eq!(make_cell_ref(3, 2), "C3");
    }

    #[test]
    fn escapes_markup_in_values() {
        assert_eq!(xml_escape("a&b<c>"), "a&amp;b&lt;c&gt;");
        assert_eq!(xml_escape("plain"), "plain");
    }

    #[test]
    fn styled_cells_carry_the_xf_attribute() {
        let mut buf = Vec::new();
        write_cell(&mut buf, "B2", &CellValue::text("#336699"), Some(2)).unwrap();
        let xml = String::from_utf8(buf).unwrap();
        assert_eq!(
            xml,
            "<c r=\"B2\" s=\"2\" t=\"inlineStr\"><is><t>#336699</t></is></c>"
        );
    }

    #[test]
    fn unstyled_and_default_styled_cells_omit_the_attribute() {
        for idx in [None, Some(0)] {
            let mut buf = Vec::new();
            write_cell(&mut buf, "A1", &CellValue::num(1.5), idx).unwrap();
            assert_eq!(String::from_utf8(buf).unwrap(), "<c r=\"A1\"><v>1.5</v></c>");
        }
    }
}
