// src/handlers/health.rs

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::config::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct Health {
    #[schema(example = "ok")]
    pub status: String,
    pub database: bool,
}

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    responses((status = 200, description = "Serviço no ar", body = Health))
)]
pub async fn health(State(app_state): State<AppState>) -> Json<Health> {
    let database = sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&app_state.db_pool)
        .await
        .is_ok();

    if !database {
        tracing::warn!("Health check sem acesso ao banco de dados");
    }

    Json(Health { status: "ok".into(), database })
}
