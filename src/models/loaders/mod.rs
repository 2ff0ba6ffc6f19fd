pub mod csv_loader;
pub mod xlsx_loader;

use crate::error::InputError;
use std::path::Path;

/// 输入表格格式，按扩展名判断
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    /// Excel / OpenDocument 工作簿
    Workbook,
}

impl TableFormat {
    pub fn from_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("xlsx" | "xlsm" | "xlsb" | "xls" | "ods") => TableFormat::Workbook,
            _ => TableFormat::Csv,
        }
    }
}

/// 读取表格的列名
pub async fn list_columns(path: &Path) -> Result<Vec<String>, InputError> {
    match TableFormat::from_path(path) {
        TableFormat::Csv => csv_loader::list_columns(path).await,
        TableFormat::Workbook => xlsx_loader::list_columns(path).await,
    }
}

/// 读取表格中指定列的所有单元格
pub async fn load_address_column(path: &Path, column: &str) -> Result<Vec<String>, InputError> {
    match TableFormat::from_path(path) {
        TableFormat::Csv => csv_loader::load_address_column(path, column).await,
        TableFormat::Workbook => xlsx_loader::load_address_column(path, column).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(TableFormat::from_path(Path::new("visitors.xlsx")), TableFormat::Workbook);
        assert_eq!(TableFormat::from_path(Path::new("VISITORS.XLS")), TableFormat::Workbook);
        assert_eq!(TableFormat::from_path(Path::new("visitors.ods")), TableFormat::Workbook);
        assert_eq!(TableFormat::from_path(Path::new("visitors.csv")), TableFormat::Csv);
        assert_eq!(TableFormat::from_path(Path::new("visitors")), TableFormat::Csv);
    }
}
