pub mod buildings;
pub mod export;
pub mod source_import;
