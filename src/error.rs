use zip::result::ZipError;

#[derive(Debug)]
pub enum HexSheetError {
    AlreadyExists(String),
    NotFound(String),
    Io(String),
    Zip(String),
    Xml(String),
}

impl From<std::io::Error> for HexSheetError {
    fn from(e: std::io::Error) -> HexSheetError {
        HexSheetError::Io(e.to_string())
    }
}

impl From<ZipError> for HexSheetError {
    fn from(e: ZipError) -> HexSheetError {
        HexSheetError::Zip(e.to_string())
    }
}

impl From<quick_xml::Error> for HexSheetError {
    fn from(e: quick_xml::Error) -> HexSheetError {
        HexSheetError::Xml(e.to_string())
    }
}
