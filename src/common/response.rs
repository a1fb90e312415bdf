// src/common/response.rs

use axum::Json;
use serde::Serialize;

/// Envelope de sucesso: `{ "ok": true, "data": ... }`.
/// O de erro é montado em `ApiError::into_response`.
#[derive(Debug, Serialize)]
pub struct ApiSuccess<T: Serialize> {
    pub ok: bool,
    pub data: T,
}

pub fn envelope<T: Serialize>(data: T) -> Json<ApiSuccess<T>> {
    Json(ApiSuccess { ok: true, data })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_data_in_ok_envelope() {
        let Json(body) = envelope(vec!["1F", "2F"]);
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({ "ok": true, "data": ["1F", "2F"] })
        );
    }
}
