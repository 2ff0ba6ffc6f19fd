use crate::error::InputError;
use std::io::{ErrorKind, Read};
use std::path::Path;
use tokio::fs;
use tracing::warn;

/// 读取 CSV 文件的列名
pub async fn list_columns(csv_file_path: &Path) -> Result<Vec<String>, InputError> {
    let content = read_file(csv_file_path).await?;
    read_columns(content.as_slice(), csv_file_path)
}

/// 从 CSV 文件中读取指定列的所有单元格
///
/// 空白单元格原样保留，由聚合引擎决定如何处理
pub async fn load_address_column(
    csv_file_path: &Path,
    column: &str,
) -> Result<Vec<String>, InputError> {
    let content = read_file(csv_file_path).await?;
    let cells = read_address_column(content.as_slice(), column, csv_file_path)?;

    tracing::info!(
        "成功从 {} 读取 {} 行地址 (列: {})",
        csv_file_path.file_name().unwrap_or_default().to_string_lossy(),
        cells.len(),
        column
    );

    Ok(cells)
}

/// 从任意输入流读取指定列
///
/// 非 UTF-8 的单元格按有损方式解码并记录警告，不影响其余行
pub fn read_address_column<R: Read>(
    reader: R,
    column: &str,
    source_path: &Path,
) -> Result<Vec<String>, InputError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = decode_headers(&mut csv_reader, source_path)?;

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

    let mut cells = Vec::new();
    for (row, record) in csv_reader.byte_records().enumerate() {
        let record = record.map_err(|source| csv_error(source_path, source))?;
        // 短行视为空白单元格
        let raw = record.get(column_index).unwrap_or_default();
        let cell = match std::str::from_utf8(raw) {
            Ok(text) => text.to_string(),
            Err(_) => {
                let lossy = String::from_utf8_lossy(raw).into_owned();
                warn!(
                    "⚠️ 第 {} 行的地址不是有效的 UTF-8，已按有损方式解码: {}",
                    row + 2,
                    lossy
                );
                lossy
            }
        };
        cells.push(cell);
    }

    Ok(cells)
}

fn read_columns<R: Read>(reader: R, source_path: &Path) -> Result<Vec<String>, InputError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let columns: Vec<String> = decode_headers(&mut csv_reader, source_path)?
        .into_iter()
        .filter(|h| !h.is_empty())
        .collect();

    if columns.is_empty() {
        return Err(InputError::NoColumns {
            path: source_path.display().to_string(),
        });
    }

    Ok(columns)
}

fn decode_headers<R: Read>(
    csv_reader: &mut csv::Reader<R>,
    source_path: &Path,
) -> Result<Vec<String>, InputError> {
    let headers = csv_reader
        .byte_headers()
        .map_err(|source| csv_error(source_path, source))?;

    Ok(headers
        .iter()
        .map(|h| String::from_utf8_lossy(h).into_owned())
        .collect())
}

async fn read_file(path: &Path) -> Result<Vec<u8>, InputError> {
    fs::read(path).await.map_err(|source| match source.kind() {
        ErrorKind::NotFound => InputError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => InputError::ReadFailed {
            path: path.display().to_string(),
            source,
        },
    })
}

fn csv_error(path: &Path, source: csv::Error) -> InputError {
    InputError::CsvParseFailed {
        path: path.display().to_string(),
        source,
    }
}
