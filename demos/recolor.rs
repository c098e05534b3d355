use hexsheet::error::HexSheetError;
use hexsheet::preview::PreviewRule;
use hexsheet::recolor::recolor_workbook;

fn main() -> Result<(), HexSheetError> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let input = args.next().unwrap_or_else(|| "example.xlsx".to_string());
    let output = args.next().unwrap_or_else(|| "recolored.xlsx".to_string());

    let summary = recolor_workbook(&input, &output, &PreviewRule::new())?;
    println!(
        "{input} -> {output}: {} cells recoloured",
        summary.total_recolored()
    );
    Ok(())
}
