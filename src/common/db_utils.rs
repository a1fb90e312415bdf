// src/common/db_utils.rs

use sqlx::PgConnection;
use uuid::Uuid;

use crate::common::error::AppError;

// ---
// Helper de Serialização: A "Tranca" do Prédio
// ---
/// Toma um advisory lock de transação para o prédio. Duas importações do mesmo
/// prédio nunca rodam em paralelo; o lock é liberado no commit/rollback.
pub(crate) async fn lock_building_for_import(
    conn: &mut PgConnection,
    building_id: Uuid,
) -> Result<(), AppError> {
    // O operador '?' converte automaticamente sqlx::Error -> AppError::DatabaseError
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(building_id.to_string())
        .execute(&mut *conn)
        .await?;

    Ok(())
}
