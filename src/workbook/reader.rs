//! Reads cell values back out of an xlsx package, one sheet at a time,
//! into the row-major snapshots the planner consumes.

use std::collections::HashMap;
use std::fs::File;
use std::io;

use quick_xml::Reader as XmlReader;
use quick_xml::events::{BytesStart, BytesText, Event};
use zip::ZipArchive;

use crate::{Result, error::HexSheetError, preview::RangeSnapshot};

#[inline]
fn attr_text(attr: &quick_xml::events::attributes::Attribute) -> String {
    let raw = std::str::from_utf8(attr.value.as_ref()).unwrap_or("");
    quick_xml::escape::unescape(raw)
        .unwrap_or_default()
        .into_owned()
}

#[inline]
fn event_text(e: &BytesText) -> String {
    let raw = std::str::from_utf8(e.as_ref()).unwrap_or("");
    quick_xml::escape::unescape(raw)
        .unwrap_or_default()
        .into_owned()
}

/// How a `<c>` element encodes its value.
#[derive(Clone, Copy)]
enum CellKind {
    /// Number, cached formula result or error text in `<v>`.
    Plain,
    /// Index into sharedStrings.xml.
    Shared,
    /// `<is><t>...</t></is>`.
    Inline,
    Bool,
}

pub struct WorkbookReader {
    path: String,
    sheet_paths: HashMap<String, String>,
    sheet_order: Vec<String>,
    shared_strings: Vec<String>,
}

impl WorkbookReader {
    pub fn open(path: &str) -> Result<Self> {
        let file = File::open(path)?;
        let mut archive = ZipArchive::new(file)?;

        let (sheet_order, rid_to_name) = parse_workbook(&mut archive)?;
        let rid_to_path = parse_workbook_rels(&mut archive)?;

        let sheet_paths = rid_to_name
            .into_iter()
            .filter_map(|(rid, name)| rid_to_path.get(&rid).map(|p| (name, p.clone())))
            .collect();

        let shared_strings = parse_shared_strings(&mut archive)?;

        Ok(WorkbookReader {
            path: path.to_string(),
            sheet_paths,
            sheet_order,
            shared_strings,
        })
    }

    /// Sheet names in workbook order.
    pub fn sheet_names(&self) -> &[String] {
        &self.sheet_order
    }

    /// Snapshot every cell value of a sheet. Sparse rows and skipped
    /// columns come back as empty strings so positions stay aligned with
    /// the original grid; shared strings are resolved and booleans read
    /// as TRUE/FALSE.
    pub fn read_range(&self, sheet_name: &str) -> Result<RangeSnapshot> {
        let zip_path = self
            .sheet_paths
            .get(sheet_name)
            .ok_or_else(|| HexSheetError::NotFound(format!("sheet '{sheet_name}'")))?;

        let file = File::open(&self.path)?;
        let mut archive = ZipArchive::new(file)?;
        let xml = slurp_entry(&mut archive, zip_path)?;

        self.scan_sheet(&xml)
    }

    fn scan_sheet(&self, xml: &[u8]) -> Result<RangeSnapshot> {
        let mut reader = XmlReader::from_reader(xml);
        reader.config_mut().trim_text(true);

        let mut rows: Vec<Vec<String>> = Vec::new();
        let mut row: Vec<String> = Vec::new();
        let mut kind = CellKind::Plain;
        let mut in_value = false;
        let mut value_buf = String::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(ref e) | Event::Empty(ref e) if e.name().as_ref() == b"row" => {
                    // sheets omit all-blank rows; pad so indices line up
                    let declared = row_number(e)
                        .and_then(|r| r.checked_sub(1))
                        .unwrap_or(rows.len());
                    while rows.len() < declared {
                        rows.push(Vec::new());
                    }
                    row.clear();
                }

                Event::Empty(ref e) if e.name().as_ref() == b"c" => {
                    let (col, _) = cell_meta(e);
                    let col = col.unwrap_or(row.len());
                    while row.len() < col {
                        row.push(String::new());
                    }
                    row.push(String::new());
                }

                Event::Start(ref e) if e.name().as_ref() == b"c" => {
                    let (col, cell_kind) = cell_meta(e);
                    let col = col.unwrap_or(row.len());
                    while row.len() < col {
                        row.push(String::new());
                    }
                    kind = cell_kind;
                    value_buf.clear();
                    in_value = false;
                }

                Event::Start(ref e) => match e.name().as_ref() {
                    b"v" | b"t" => in_value = true,
                    _ => {}
                },

                Event::Text(ref e) => {
                    if in_value {
                        value_buf.push_str(&event_text(e));
                    }
                }

                Event::End(ref e) => match e.name().as_ref() {
                    b"v" | b"t" => in_value = false,
                    b"c" => {
                        let raw = value_buf.trim().to_string();
                        let value = match kind {
                            CellKind::Shared => raw
                                .parse::<usize>()
                                .ok()
                                .and_then(|i| self.shared_strings.get(i).cloned())
                                .unwrap_or_default(),
                            CellKind::Bool => {
                                if raw == "1" {
                                    "TRUE".into()
                                } else {
                                    "FALSE".into()
                                }
                            }
                            CellKind::Plain | CellKind::Inline => raw,
                        };
                        row.push(value);
                    }
                    b"row" => {
                        rows.push(std::mem::take(&mut row));
                    }
                    b"sheetData" => break,
                    _ => {}
                },

                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(RangeSnapshot::new(rows))
    }
}

fn row_number(e: &BytesStart) -> Option<usize> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == b"r" {
            return attr_text(&attr).parse().ok();
        }
    }
    None
}

fn cell_meta(e: &BytesStart) -> (Option<usize>, CellKind) {
    let mut col = None;
    let mut kind = CellKind::Plain;
    for attr in e.attributes().flatten() {
        match attr.key.as_ref() {
            b"r" => col = Some(col_ref_to_index(&attr_text(&attr))),
            b"t" => {
                kind = match attr_text(&attr).as_str() {
                    "s" => CellKind::Shared,
                    "inlineStr" => CellKind::Inline,
                    "b" => CellKind::Bool,
                    _ => CellKind::Plain,
                }
            }
            _ => {}
        }
    }
    (col, kind)
}

fn parse_workbook(
    archive: &mut ZipArchive<File>,
) -> Result<(Vec<String>, HashMap<String, String>)> {
    let bytes = slurp_entry(archive, "xl/workbook.xml")?;
    let mut xml = XmlReader::from_reader(bytes.as_slice());
    xml.config_mut().trim_text(true);

    let mut order = Vec::new();
    let mut rid_map = HashMap::new();
    let mut buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Empty(ref e) | Event::Start(ref e) if e.name().as_ref() == b"sheet" => {
                let (mut name, mut rid) = (String::new(), String::new());
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"name" => name = attr_text(&attr),
                        b"r:id" | b"id" => rid = attr_text(&attr),
                        _ => {}
                    }
                }
                if !name.is_empty() && !rid.is_empty() {
                    order.push(name.clone());
                    rid_map.insert(rid, name);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok((order, rid_map))
}

fn parse_workbook_rels(archive: &mut ZipArchive<File>) -> Result<HashMap<String, String>> {
    let bytes = slurp_entry(archive, "xl/_rels/workbook.xml.rels")?;
    let mut xml = XmlReader::from_reader(bytes.as_slice());
    xml.config_mut().trim_text(true);

    let mut map = HashMap::new();
    let mut buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Empty(ref e) | Event::Start(ref e) if e.name().as_ref() == b"Relationship" => {
                let (mut id, mut target, mut is_sheet) = (String::new(), String::new(), false);
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"Id" => id = attr_text(&attr),
                        b"Target" => target = attr_text(&attr),
                        b"Type" => is_sheet = attr_text(&attr).contains("worksheet"),
                        _ => {}
                    }
                }
                if is_sheet && !id.is_empty() {
                    map.insert(id, normalize_path(&target));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(map)
}

fn parse_shared_strings(archive: &mut ZipArchive<File>) -> Result<Vec<String>> {
    if archive.by_name("xl/sharedStrings.xml").is_err() {
        return Ok(Vec::new());
    }
    let bytes = slurp_entry(archive, "xl/sharedStrings.xml")?;
    let mut xml = XmlReader::from_reader(bytes.as_slice());
    xml.config_mut().trim_text(false);

    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_t = false;
    let mut buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Start(ref e) => match e.name().as_ref() {
                b"si" => current.clear(),
                b"t" => in_t = true,
                _ => {}
            },
            Event::End(ref e) => match e.name().as_ref() {
                b"si" => strings.push(current.clone()),
                b"t" => in_t = false,
                _ => {}
            },
            Event::Text(ref e) if in_t => current.push_str(&event_text(e)),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(strings)
}

fn slurp_entry(archive: &mut ZipArchive<File>, path: &str) -> Result<Vec<u8>> {
    let mut entry = archive
        .by_name(path)
        .map_err(|e| HexSheetError::NotFound(format!("'{path}': {e}")))?;
    let mut buf = Vec::with_capacity(entry.size() as usize);
    io::copy(&mut entry, &mut buf)?;
    Ok(buf)
}

fn normalize_path(target: &str) -> String {
    let t = target.trim_start_matches('/');
    if t.starts_with("xl/") {
        t.to_string()
    } else {
        format!("xl/{t}")
    }
}

fn col_ref_to_index(cell_ref: &str) -> usize {
    let letters = cell_ref.trim_end_matches(|c: char| c.is_ascii_digit());
    if letters.is_empty() {
        return 0;
    }
    letters
        .bytes()
        .fold(0usize, |acc, b| acc * 26 + (b - b'A') as usize + 1)
        - 1
}
