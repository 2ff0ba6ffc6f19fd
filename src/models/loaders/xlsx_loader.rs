use crate::error::InputError;
use calamine::{open_workbook_auto, Data, Range, Reader};
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;

/// 读取工作簿第一个工作表的列名（首行）
pub async fn list_columns(workbook_path: &Path) -> Result<Vec<String>, InputError> {
    let range = read_first_sheet(workbook_path).await?;

    let columns: Vec<String> = header_row(&range)
        .into_iter()
        .filter(|h| !h.is_empty())
        .collect();

    if columns.is_empty() {
        return Err(InputError::NoColumns {
            path: workbook_path.display().to_string(),
        });
    }

    Ok(columns)
}

/// 从工作簿第一个工作表中读取指定列的所有单元格
pub async fn load_address_column(
    workbook_path: &Path,
    column: &str,
) -> Result<Vec<String>, InputError> {
    let range = read_first_sheet(workbook_path).await?;
    let cells = read_address_column(&range, column, workbook_path)?;

    tracing::info!(
        "成功从 {} 读取 {} 行地址 (列: {})",
        workbook_path.file_name().unwrap_or_default().to_string_lossy(),
        cells.len(),
        column
    );

    Ok(cells)
}

/// 从已读取的工作表区域中取出指定列，首行为表头
pub fn read_address_column(
    range: &Range<Data>,
    column: &str,
    source_path: &Path,
) -> Result<Vec<String>, InputError> {
    let headers = header_row(range);

    if headers.iter().all(|h| h.is_empty()) {
        return Err(InputError::NoColumns {
            path: source_path.display().to_string(),
        });
    }

    let column_index = headers
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| InputError::ColumnNotFound {
            column: column.to_string(),
            available: headers.clone(),
        })?;

    Ok(range
        .rows()
        .skip(1)
        .map(|row| row.get(column_index).map(cell_text).unwrap_or_default())
        .collect())
}

fn header_row(range: &Range<Data>) -> Vec<String> {
    range
        .rows()
        .next()
        .map(|row| row.iter().map(|cell| cell_text(cell).trim().to_string()).collect())
        .unwrap_or_default()
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(text) => text.clone(),
        other => other.to_string(),
    }
}

async fn read_first_sheet(path: &Path) -> Result<Range<Data>, InputError> {
    if let Err(source) = fs::metadata(path).await {
        return Err(match source.kind() {
            ErrorKind::NotFound => InputError::FileNotFound {
                path: path.display().to_string(),
            },
            _ => InputError::ReadFailed {
                path: path.display().to_string(),
                source,
            },
        });
    }

    // calamine 是同步读取
    let owned = path.to_path_buf();
    tokio::task::spawn_blocking(move || open_first_sheet(&owned))
        .await
        .map_err(|e| InputError::ReadFailed {
            path: path.display().to_string(),
            source: std::io::Error::other(e),
        })?
}

fn open_first_sheet(path: &Path) -> Result<Range<Data>, InputError> {
    let mut workbook =
        open_workbook_auto(path).map_err(|source| workbook_error(path, source))?;

    match workbook.worksheet_range_at(0) {
        Some(range) => range.map_err(|source| workbook_error(path, source)),
        None => Err(InputError::NoColumns {
            path: path.display().to_string(),
        }),
    }
}

fn workbook_error(path: &Path, source: calamine::Error) -> InputError {
    InputError::WorkbookParseFailed {
        path: path.display().to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(rows: &[&[Data]]) -> Range<Data> {
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(1) as u32;
        let mut range = Range::new((0, 0), (rows.len() as u32 - 1, width - 1));
        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                range.set_value((r as u32, c as u32), cell.clone());
            }
        }
        range
    }

    fn text(value: &str) -> Data {
        Data::String(value.to_string())
    }

    #[test]
    fn test_reads_selected_column() {
        let range = sheet(&[
            &[text("name"), text(" Address ")],
            &[text("Ada"), text("Paris, France")],
            &[text("Bob"), Data::Empty],
            &[text("Cy"), Data::Float(75001.0)],
        ]);

        let cells = read_address_column(&range, "Address", Path::new("visitors.xlsx")).unwrap();
        assert_eq!(cells, vec!["Paris, France", "", "75001"]);
    }

    #[test]
    fn test_missing_column_lists_available() {
        let range = sheet(&[&[text("name"), text("city")], &[text("Ada"), text("Paris")]]);

        let err = read_address_column(&range, "address", Path::new("visitors.xlsx")).unwrap_err();
        match err {
            InputError::ColumnNotFound { available, .. } => {
                assert_eq!(available, vec!["name", "city"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_blank_header_row_has_no_columns() {
        let range = sheet(&[&[Data::Empty, Data::Empty]]);
        assert!(matches!(
            read_address_column(&range, "address", Path::new("empty.xlsx")),
            Err(InputError::NoColumns { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_workbook() {
        let result = load_address_column(Path::new("no/such/visitors.xlsx"), "address").await;
        assert!(matches!(result, Err(InputError::FileNotFound { .. })));
    }

    #[tokio::test]
    async fn test_corrupt_workbook_is_parse_error() {
        let path = std::env::temp_dir().join(format!("visitor_map_corrupt_{}.xlsx", std::process::id()));
        std::fs::write(&path, "name,address\nAda,Paris\n").unwrap();

        let result = list_columns(&path).await;
        assert!(matches!(result, Err(InputError::WorkbookParseFailed { .. })));

        let _ = std::fs::remove_file(&path);
    }
}
