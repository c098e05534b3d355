
pub mod color;
pub mod error;
pub mod preview;
pub mod recolor;
pub mod workbook;

pub(crate) type Result<T> = std::result::Result<T, error::HexSheetError>;
