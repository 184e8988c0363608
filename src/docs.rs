// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Health ---
        handlers::health::health,

        // --- Orders ---
        handlers::orders::create_order,
        handlers::orders::list_orders,
        handlers::orders::get_order,
        handlers::orders::update_status,
        handlers::orders::add_payment,
        handlers::orders::assign_worker,

        // --- Customers ---
        handlers::customers::upsert_by_phone,

        // --- Catalog ---
        handlers::skus::get_sku_bom,
        handlers::skus::add_bom_component,
    ),
    components(
        schemas(
            handlers::health::Health,

            // --- Orders ---
            models::orders::OrderStatus,
            models::orders::OrderSource,
            models::orders::ReceiveMethod,
            models::orders::PaymentType,
            models::orders::PaymentMethod,
            models::orders::AssignmentStatus,
            models::orders::AssignmentRole,
            models::orders::Order,
            models::orders::OrderItem,
            models::orders::Payment,
            models::orders::Assignment,
            models::orders::OrderDetail,
            models::orders::OrderList,

            // --- Payloads ---
            models::orders::CreateOrderPayload,
            models::orders::ReceiverInput,
            models::orders::DeliveryInput,
            models::orders::OrderItemInput,
            models::orders::OrderStatusUpdate,
            models::orders::PaymentCreate,
            models::orders::AssignmentCreate,

            // --- Customers ---
            models::customers::Customer,
            models::customers::CustomerInput,

            // --- Catalog ---
            models::catalog::Sku,
            models::catalog::BomComponent,
            models::catalog::BomSnapshotEntry,
            models::catalog::AddBomComponentPayload,

            // --- Auth ---
            models::auth::UserRole,
            models::auth::User,
        )
    ),
    tags(
        (name = "Orders", description = "Pedidos, pagamentos e designação de floristas"),
        (name = "Customers", description = "Clientes identificados pelo telefone"),
        (name = "Catalog", description = "SKUs e BOM (composição dos arranjos)"),
        (name = "Health", description = "Verificação do serviço")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
