// src/handlers/skus.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{CatalogEditors, RequireRole},
    },
    models::catalog::{AddBomComponentPayload, BomComponent},
};

#[utoipa::path(
    get,
    path = "/api/skus/{sku_id}/bom",
    tag = "Catalog",
    params(("sku_id" = i64, Path, description = "ID do SKU")),
    responses(
        (status = 200, description = "Componentes diretos do BOM", body = [BomComponent]),
        (status = 404, description = "SKU não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_sku_bom(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(sku_id): Path<i64>,
) -> Result<Json<Vec<BomComponent>>, AppError> {
    let mut tx = app_state.db_pool.begin().await?;
    let bom = app_state.catalog_service.get_sku_bom(&mut tx, sku_id).await?;
    tx.commit().await?;

    Ok(Json(bom))
}

#[utoipa::path(
    post,
    path = "/api/skus/{sku_id}/bom",
    tag = "Catalog",
    request_body = AddBomComponentPayload,
    params(("sku_id" = i64, Path, description = "ID do SKU pai")),
    responses(
        (status = 201, description = "BOM atualizado", body = [BomComponent]),
        (status = 400, description = "Auto-referência ou ciclo no BOM"),
        (status = 404, description = "SKU não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_bom_component(
    State(app_state): State<AppState>,
    _guard: RequireRole<CatalogEditors>,
    Path(sku_id): Path<i64>,
    Json(payload): Json<AddBomComponentPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let mut tx = app_state.db_pool.begin().await?;
    let bom = app_state
        .catalog_service
        .add_bom_component(&mut tx, sku_id, &payload)
        .await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(bom)))
}
