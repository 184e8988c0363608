//src/main.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::{AppState, Settings};
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let settings = Settings::from_env()?;
    let app_state = AppState::new(settings).await?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!().run(&app_state.db_pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let app = router(app_state.clone());

    let listener = TcpListener::bind(&app_state.settings.bind_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(app_state: AppState) -> Router {
    let order_routes = Router::new()
        .route("/"
               ,post(handlers::orders::create_order)
               .get(handlers::orders::list_orders)
        )
        .route("/{order_id}", get(handlers::orders::get_order))
        .route("/{order_id}/status", post(handlers::orders::update_status))
        .route("/{order_id}/payments", post(handlers::orders::add_payment))
        .route("/{order_id}/assign", post(handlers::orders::assign_worker));

    let customer_routes = Router::new()
        .route("/upsert_by_phone", post(handlers::customers::upsert_by_phone));

    let sku_routes = Router::new()
        .route("/{sku_id}/bom"
               ,get(handlers::skus::get_sku_bom)
               .post(handlers::skus::add_bom_component)
        );

    // Tudo abaixo exige Bearer válido de usuário ativo
    let protected = Router::new()
        .nest("/orders", order_routes)
        .nest("/customers", customer_routes)
        .nest("/skus", sku_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/health", get(handlers::health::health))
        .nest("/api", protected)
        .with_state(app_state)
}
