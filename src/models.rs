pub mod building;
pub mod source_import;
