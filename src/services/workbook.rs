// src/services/workbook.rs

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, DataType, Range, Reader};

use crate::common::error::AppError;

/// Uma aba decodificada: nome + grade de textos já normalizados.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedSheet {
    pub name: String,
    pub grid: Vec<Vec<String>>,
}

/// `\r\n` / `\r` viram `\n` e o texto é aparado.
pub fn normalize_cell(value: &str) -> String {
    value.replace("\r\n", "\n").replace('\r', "\n").trim().to_string()
}

/// Lê os bytes de uma planilha (xlsx, xls, xlsb, ods) e devolve todas as abas,
/// na ordem do arquivo. Bytes ilegíveis viram `AppError::WorkbookDecode`.
pub fn decode_workbook(bytes: Vec<u8>) -> Result<Vec<DecodedSheet>, AppError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| AppError::WorkbookDecode(e.to_string()))?;

    let sheet_names = workbook.sheet_names().to_vec();
    let mut sheets = Vec::with_capacity(sheet_names.len());

    for name in sheet_names {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| AppError::WorkbookDecode(format!("{name}: {e}")))?;
        sheets.push(DecodedSheet {
            grid: range_to_grid(&range),
            name,
        });
    }

    Ok(sheets)
}

// O Range do calamine começa na primeira célula usada; preenchemos as
// linhas/colunas anteriores para que os índices batam com os da aba.
fn range_to_grid(range: &Range<Data>) -> Vec<Vec<String>> {
    let Some((start_row, start_col)) = range.start() else {
        return Vec::new();
    };

    let lead_cols = start_col as usize;
    let mut grid: Vec<Vec<String>> = vec![Vec::new(); start_row as usize];

    for row in range.rows() {
        let mut cells = vec![String::new(); lead_cols];
        cells.extend(row.iter().map(cell_to_string));
        grid.push(cells);
    }

    grid
}

fn cell_to_string(cell: &Data) -> String {
    let text = match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Bool(b) => if *b { "TRUE".into() } else { "FALSE".into() },
        Data::Int(i) => i.to_string(),
        Data::Float(f) => f.to_string(), // 100.0 -> "100"
        Data::DateTime(_) => match cell.as_datetime() {
            Some(dt) if dt.time() == chrono::NaiveTime::MIN => dt.date().format("%Y-%m-%d").to_string(),
            Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => cell.to_string(),
        },
        _ => cell.to_string(),
    };
    normalize_cell(&text)
}
