pub mod building_repo;
pub use building_repo::BuildingRepository;
pub mod source_import_repo;
pub use source_import_repo::SourceImportRepository;
pub mod import_writer;
pub use import_writer::PgImportWriter;
