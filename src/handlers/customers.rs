// src/handlers/customers.rs

use axum::{extract::State, Json};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::customers::{Customer, CustomerInput},
};

#[utoipa::path(
    post,
    path = "/api/customers/upsert_by_phone",
    tag = "Customers",
    request_body = CustomerInput,
    responses(
        (status = 200, description = "Cliente criado ou atualizado pelo telefone", body = Customer),
        (status = 400, description = "Telefone ou nome inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn upsert_by_phone(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Json(payload): Json<CustomerInput>,
) -> Result<Json<Customer>, AppError> {
    payload.validate()?;

    let mut tx = app_state.db_pool.begin().await?;
    let customer = app_state.customer_service.upsert_customer(&mut tx, &payload).await?;
    tx.commit().await?;

    Ok(Json(customer))
}
