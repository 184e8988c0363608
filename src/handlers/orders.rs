// src/handlers/orders.rs

use axum::{
    extract::{Path, Query, State},
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
        rbac::{Cashiers, Managers, OrderCreators, RequireRole},
    },
    models::orders::{
        Assignment, AssignmentCreate, CreateOrderPayload, OrderDetail, OrderList, OrderListQuery,
        OrderStatusUpdate, Payment, PaymentCreate,
    },
};

// ---
// Handler: create_order
// ---
#[utoipa::path(
    post,
    path = "/api/orders",
    tag = "Orders",
    request_body = CreateOrderPayload,
    responses(
        (status = 201, description = "Pedido criado", body = OrderDetail),
        (status = 400, description = "Item, sinal ou dados inválidos"),
        (status = 404, description = "SKU não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_order(
    State(app_state): State<AppState>,
    guard: RequireRole<OrderCreators>,
    Json(payload): Json<CreateOrderPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let mut tx = app_state.db_pool.begin().await?;
    let detail = app_state
        .order_service
        .create_order(&mut tx, &payload, Some(guard.user.id))
        .await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(detail)))
}

// ---
// Handler: list_orders
// ---
#[utoipa::path(
    get,
    path = "/api/orders",
    tag = "Orders",
    params(OrderListQuery),
    responses(
        (status = 200, description = "Página de pedidos, mais recentes primeiro", body = OrderList)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_orders(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<OrderList>, AppError> {
    query.validate()?;

    let mut tx = app_state.db_pool.begin().await?;
    let page = app_state.order_service.list_orders(&mut tx, &query).await?;
    tx.commit().await?;

    Ok(Json(page))
}

// ---
// Handler: get_order
// ---
#[utoipa::path(
    get,
    path = "/api/orders/{order_id}",
    tag = "Orders",
    params(("order_id" = i64, Path, description = "ID do Pedido")),
    responses(
        (status = 200, description = "Pedido completo", body = OrderDetail),
        (status = 404, description = "Pedido não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_order(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(order_id): Path<i64>,
) -> Result<Json<OrderDetail>, AppError> {
    let mut tx = app_state.db_pool.begin().await?;
    let detail = app_state.order_service.get_order(&mut tx, order_id).await?;
    tx.commit().await?;

    Ok(Json(detail))
}

// ---
// Handler: update_status
// ---
#[utoipa::path(
    post,
    path = "/api/orders/{order_id}/status",
    tag = "Orders",
    request_body = OrderStatusUpdate,
    params(("order_id" = i64, Path, description = "ID do Pedido")),
    responses(
        (status = 200, description = "Status aplicado (ou já era o atual)", body = OrderDetail),
        (status = 400, description = "Transição não permitida"),
        (status = 404, description = "Pedido não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_status(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(order_id): Path<i64>,
    Json(payload): Json<OrderStatusUpdate>,
) -> Result<Json<OrderDetail>, AppError> {
    let mut tx = app_state.db_pool.begin().await?;
    let detail = app_state
        .order_service
        .transition_status(&mut tx, order_id, payload.status)
        .await?;
    tx.commit().await?;

    tracing::debug!(order_id, user_id = user.id, "Status atualizado via API");
    Ok(Json(detail))
}

// ---
// Handler: add_payment
// ---
#[utoipa::path(
    post,
    path = "/api/orders/{order_id}/payments",
    tag = "Orders",
    request_body = PaymentCreate,
    params(("order_id" = i64, Path, description = "ID do Pedido")),
    responses(
        (status = 201, description = "Pagamento registrado e saldo recalculado", body = Payment),
        (status = 404, description = "Pedido não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_payment(
    State(app_state): State<AppState>,
    guard: RequireRole<Cashiers>,
    Path(order_id): Path<i64>,
    Json(payload): Json<PaymentCreate>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let mut tx = app_state.db_pool.begin().await?;
    let payment = app_state
        .order_service
        .record_payment(&mut tx, order_id, &payload, Some(guard.user.id))
        .await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(payment)))
}

// ---
// Handler: assign_worker
// ---
#[utoipa::path(
    post,
    path = "/api/orders/{order_id}/assign",
    tag = "Orders",
    request_body = AssignmentCreate,
    params(("order_id" = i64, Path, description = "ID do Pedido")),
    responses(
        (status = 201, description = "Florista designado", body = Assignment),
        (status = 400, description = "O responsável não é um florista"),
        (status = 404, description = "Pedido não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn assign_worker(
    State(app_state): State<AppState>,
    _guard: RequireRole<Managers>,
    Path(order_id): Path<i64>,
    Json(payload): Json<AssignmentCreate>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = app_state.db_pool.begin().await?;
    let assignment = app_state
        .order_service
        .assign_worker(&mut tx, order_id, payload.assignee_id)
        .await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(assignment)))
}
