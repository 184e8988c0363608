// src/services/fixtures.rs
// Dados mínimos para os testes que rodam contra o Postgres.

use sqlx::PgPool;

use crate::models::auth::UserRole;

pub async fn sku(pool: &PgPool, code: &str, name: &str, is_template: bool) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO skus (code, name, is_template, base_price) VALUES ($1, $2, $3, 0) RETURNING id",
    )
    .bind(code)
    .bind(name)
    .bind(is_template)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn bom_entry(pool: &PgPool, parent: i64, component: i64, qty: &str) {
    sqlx::query("INSERT INTO sku_bom (parent_sku_id, component_sku_id, qty) VALUES ($1, $2, $3::numeric)")
        .bind(parent)
        .bind(component)
        .bind(qty)
        .execute(pool)
        .await
        .unwrap();
}

pub async fn user(pool: &PgPool, name: &str, role: UserRole) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO users (name, role, hashed_password) VALUES ($1, $2, 'x') RETURNING id",
    )
    .bind(name)
    .bind(role)
    .fetch_one(pool)
    .await
    .unwrap()
}
