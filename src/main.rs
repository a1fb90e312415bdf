//src/main.rs

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod common;
mod config;
mod db;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::AppState;

#[tokio::main]
async fn main() {
    // Logger: RUST_LOG manda; sem ele, "info".
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let app_state = AppState::new()
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Tudo que pertence a um prédio
    let building_routes = Router::new()
        .route("/", post(handlers::buildings::create_building))
        .route("/{id}", get(handlers::buildings::get_building))
        .route(
            "/{id}/floors",
            get(handlers::buildings::list_floors),
        )
        .route(
            "/{id}/floors/generate",
            post(handlers::buildings::generate_floors),
        )
        .route(
            "/{id}/import/source-xlsx",
            post(handlers::source_import::import_source_xlsx)
                .get(handlers::source_import::preview_source_xlsx),
        )
        .route("/{id}/export/csv", get(handlers::export::export_csv));

    let addr = app_state.settings.server_addr.clone();

    // Combina tudo no router principal
    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/buildings", building_routes)
        .with_state(app_state);

    // Inicia o servidor
    let listener = TcpListener::bind(&addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", addr);
    axum::serve(listener, app)
        .await
        .expect("Erro no servidor Axum");
}
