// src/config.rs

use std::{env, path::PathBuf, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::{BuildingRepository, SourceImportRepository},
    services::{building_service::BuildingService, import_service::ImportService},
};

const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Variáveis de ambiente (com `.env` carregado antes).
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub server_addr: String,
    pub database_max_connections: u32,
    pub import_root: PathBuf, // base para caminhos relativos de planilha
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let server_addr = env::var("SERVER_ADDR").unwrap_or_else(|_| DEFAULT_SERVER_ADDR.to_string());

        let database_max_connections = match env::var("DATABASE_MAX_CONNECTIONS") {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("DATABASE_MAX_CONNECTIONS inválido: {raw}"))?,
            Err(_) => DEFAULT_MAX_CONNECTIONS,
        };

        let import_root = match env::var("IMPORT_ROOT") {
            Ok(raw) if !raw.trim().is_empty() => PathBuf::from(raw.trim()),
            _ => env::current_dir().context("Diretório de trabalho inacessível")?,
        };

        Ok(Self {
            database_url,
            server_addr,
            database_max_connections,
            import_root,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub settings: Settings,
    pub i18n_store: I18nStore,
    pub building_service: BuildingService,
    pub import_service: ImportService,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let settings = Settings::from_env()?;

        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(settings.database_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&settings.database_url)
            .await
            .context("Falha ao conectar no banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let building_repo = BuildingRepository::new(db_pool.clone());
        let source_repo = SourceImportRepository::new(db_pool.clone());

        let building_service = BuildingService::new(db_pool.clone(), building_repo.clone());
        let import_service = ImportService::new(
            db_pool.clone(),
            building_repo,
            source_repo,
            settings.import_root.clone(),
        );

        tracing::info!("📂 Planilhas relativas serão lidas de {}", settings.import_root.display());

        Ok(Self {
            db_pool,
            settings,
            i18n_store: I18nStore::default(),
            building_service,
            import_service,
        })
    }
}
