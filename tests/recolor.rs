use std::io::Read;

use hexsheet::error::HexSheetError;
use hexsheet::preview::PreviewRule;
use hexsheet::recolor::recolor_workbook;
use hexsheet::workbook::Workbook;
use hexsheet::workbook::cell::CellValue;
use hexsheet::workbook::reader::WorkbookReader;

fn write_fixture(path: &str) {
    let mut wb = Workbook::create(path);
    wb.add_sheet("Colours")
        .unwrap()
        .write_row(&[CellValue::text("#336699"), CellValue::text("hello")])
        .unwrap();
    wb.get_sheet("Colours")
        .unwrap()
        .write_row(&[
            CellValue::num(12.0),
            CellValue::text("#abc"),
            CellValue::bool(true),
        ])
        .unwrap();
    wb.finish().unwrap();
}

#[test]
fn recolors_hex_cells_across_a_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.xlsx").to_str().unwrap().to_string();
    let output = dir.path().join("output.xlsx").to_str().unwrap().to_string();
    write_fixture(&input);

    let summary = recolor_workbook(&input, &output, &PreviewRule::new()).unwrap();
    assert_eq!(summary.sheets, vec![("Colours".to_string(), 2)]);
    assert_eq!(summary.total_recolored(), 2);

    let reader = WorkbookReader::open(&output).unwrap();
    assert_eq!(reader.sheet_names(), ["Colours"]);
    let range = reader.read_range("Colours").unwrap();
    assert_eq!(range.value(0, 0), Some("#336699"));
    assert_eq!(range.value(0, 1), Some("hello"));
    assert_eq!(range.value(1, 0), Some("12"));
    assert_eq!(range.value(1, 1), Some("#abc"));
    assert_eq!(range.value(1, 2), Some("TRUE"));
}

#[test]
fn styled_copy_carries_fills_and_font_colours() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.xlsx").to_str().unwrap().to_string();
    let output = dir.path().join("output.xlsx").to_str().unwrap().to_string();
    write_fixture(&input);

    recolor_workbook(&input, &output, &PreviewRule::new()).unwrap();

    let file = std::fs::File::open(&output).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();

    let mut styles = String::new();
    archive
        .by_name("xl/styles.xml")
        .unwrap()
        .read_to_string(&mut styles)
        .unwrap();
    // background keeps the literal colour, foreground is darkened by 20
    assert!(styles.contains("FF336699"));
    assert!(styles.contains("FF1F5285"));
    // shorthand expands before styling
    assert!(styles.contains("FFAABBCC"));

    let mut sheet = String::new();
    archive
        .by_name("xl/worksheets/sheet1.xml")
        .unwrap()
        .read_to_string(&mut sheet)
        .unwrap();
    assert!(sheet.contains(" s=\""));
    assert!(sheet.contains("#336699"));
    assert!(sheet.contains("hello"));
}

#[test]
fn inverted_rule_complements_the_foreground() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.xlsx").to_str().unwrap().to_string();
    let output = dir.path().join("output.xlsx").to_str().unwrap().to_string();
    write_fixture(&input);

    recolor_workbook(&input, &output, &PreviewRule::new().inverted()).unwrap();

    let file = std::fs::File::open(&output).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let mut styles = String::new();
    archive
        .by_name("xl/styles.xml")
        .unwrap()
        .read_to_string(&mut styles)
        .unwrap();
    // 0x336699 ^ 0xFFFFFF
    assert!(styles.contains("FFCC9966"));
}

#[test]
fn workbook_without_matches_round_trips_unstyled() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.xlsx").to_str().unwrap().to_string();
    let output = dir.path().join("output.xlsx").to_str().unwrap().to_string();

    let mut wb = Workbook::create(&input);
    let sheet = wb.add_sheet("Plain").unwrap();
    sheet
        .write_row(&[CellValue::text("alpha"), CellValue::num(1.0)])
        .unwrap();
    wb.finish().unwrap();

    let summary = recolor_workbook(&input, &output, &PreviewRule::new()).unwrap();
    assert_eq!(summary.total_recolored(), 0);

    let range = WorkbookReader::open(&output)
        .unwrap()
        .read_range("Plain")
        .unwrap();
    assert_eq!(range.value(0, 0), Some("alpha"));
    assert_eq!(range.value(0, 1), Some("1"));
}

#[test]
fn duplicate_sheet_names_are_rejected() {
    let mut wb = Workbook::create("unused.xlsx");
    wb.add_sheet("S").unwrap();
    assert!(matches!(
        wb.add_sheet("S"),
        Err(HexSheetError::AlreadyExists(_))
    ));
}
