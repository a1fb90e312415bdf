pub mod workbook;
pub mod sheet_parser;
pub mod extraction;
pub mod floor_layout;
pub mod reconciliation;

pub mod building_service;
pub mod export_service;
pub mod import_service;

#[cfg(test)]
pub mod test_support;
