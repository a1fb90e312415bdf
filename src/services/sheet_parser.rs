// src/services/sheet_parser.rs

use std::collections::{HashMap, HashSet};

use crate::models::source_import::RowFields;
use crate::services::workbook::{normalize_cell, DecodedSheet};

/// Palavras que denunciam a linha de cabeçalho.
pub const HEADER_HINTS: &[&str] = &[
    "樓層", "商戶", "租戶", "客戶名稱", "公司名稱", "戶號", "戶別", "室號", "聯絡", "電話", "mail", "信箱",
];

/// Quantas linhas do topo entram na disputa pelo cabeçalho.
const HEADER_SCAN_ROWS: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRow {
    pub row_index: usize, // 1-based, posição na grade original
    pub row_values: Vec<String>,
    pub row_fields: RowFields,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSheet {
    pub name: String,
    pub sheet_order: usize,
    pub columns: Vec<String>,
    pub header_row_index: usize, // 1-based
    pub rows: Vec<ParsedRow>,
}

fn score_header_row(row: &[String]) -> usize {
    row.iter()
        .map(|cell| normalize_cell(cell))
        .filter(|cell| !cell.is_empty())
        .filter(|cell| HEADER_HINTS.iter().any(|hint| cell.contains(hint)))
        .count()
}

fn row_has_content(row: &[String]) -> bool {
    row.iter().any(|cell| !normalize_cell(cell).is_empty())
}

/// Índice (0-based) da linha mais provável de ser o cabeçalho.
///
/// Empate fica com a primeira linha. Sem nenhuma pista nas 20 primeiras
/// linhas, vale a primeira linha com conteúdo da grade inteira; grade vazia -> 0.
pub fn detect_header_row_index(grid: &[Vec<String>]) -> usize {
    let mut best: Option<(usize, usize)> = None;

    for (idx, row) in grid.iter().take(HEADER_SCAN_ROWS).enumerate() {
        let score = score_header_row(row);
        if best.is_none_or(|(_, best_score)| score > best_score) {
            best = Some((idx, score));
        }
    }

    match best {
        Some((idx, score)) if score > 0 => idx,
        _ => grid.iter().position(|row| row_has_content(row)).unwrap_or(0),
    }
}

/// Nomes de coluna únicos, do tamanho da linha mais larga.
///
/// Célula vazia (ou posição além do cabeçalho) vira `欄位{n}`; repetidos ganham
/// sufixo ` (2)`, ` (3)`... com um contador por nome. O contador pula sufixos
/// que já saíram como nome de outra coluna (ex: um cabeçalho literal `分機 (2)`).
pub fn normalize_columns(header_row: &[String], widest_row_length: usize) -> Vec<String> {
    let mut counters: HashMap<String, usize> = HashMap::new();
    let mut emitted: HashSet<String> = HashSet::new();

    (0..widest_row_length)
        .map(|idx| {
            let base = match header_row.get(idx).map(|c| normalize_cell(c)) {
                Some(name) if !name.is_empty() => name,
                _ => format!("欄位{}", idx + 1),
            };
            let count = counters.entry(base.clone()).or_insert(0);
            *count += 1;

            let mut name = if *count == 1 { base.clone() } else { format!("{base} ({count})") };
            while emitted.contains(&name) {
                *count += 1;
                name = format!("{base} ({count})");
            }

            emitted.insert(name.clone());
            name
        })
        .collect()
}

/// Uma `ParsedRow` por linha não vazia abaixo do cabeçalho.
pub fn materialize_rows(grid: &[Vec<String>], header_index: usize, columns: &[String]) -> Vec<ParsedRow> {
    grid.iter()
        .enumerate()
        .skip(header_index + 1)
        .filter_map(|(grid_index, row)| {
            let values: Vec<String> = (0..columns.len())
                .map(|idx| row.get(idx).map(|c| normalize_cell(c)).unwrap_or_default())
                .collect();

            if values.iter().all(|v| v.is_empty()) {
                return None;
            }

            Some(ParsedRow {
                row_index: grid_index + 1,
                row_fields: RowFields::zip(columns, &values),
                row_values: values,
            })
        })
        .collect()
}

pub fn parse_sheet(sheet: &DecodedSheet, sheet_order: usize) -> ParsedSheet {
    let grid = &sheet.grid;
    let header_index = detect_header_row_index(grid);
    let header_row: &[String] = grid.get(header_index).map(Vec::as_slice).unwrap_or(&[]);
    let widest_row_length = grid
        .iter()
        .map(Vec::len)
        .max()
        .unwrap_or(0)
        .max(header_row.len());

    let columns = normalize_columns(header_row, widest_row_length);
    let rows = materialize_rows(grid, header_index, &columns);

    ParsedSheet {
        name: sheet.name.clone(),
        sheet_order,
        columns,
        header_row_index: header_index + 1,
        rows,
    }
}

pub fn parse_workbook(sheets: &[DecodedSheet]) -> Vec<ParsedSheet> {
    sheets
        .iter()
        .enumerate()
        .map(|(order, sheet)| parse_sheet(sheet, order))
        .collect()
}
