// src/models/orders.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{types::Json, FromRow};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::models::{
    catalog::BomSnapshotEntry,
    customers::{Customer, CustomerInput, PHONE_REGEX},
};

// --- Enums (mapeiam os CREATE TYPE da migração) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "order_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    New,
    Confirming,
    Assigned,
    InProgress,
    Ready,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 7] = [
        OrderStatus::New,
        OrderStatus::Confirming,
        OrderStatus::Assigned,
        OrderStatus::InProgress,
        OrderStatus::Ready,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "order_source", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderSource {
    Form,
    Zalo, // Pedido chegou pelo app de mensagens
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "receive_method", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReceiveMethod {
    Delivery,
    Pickup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentType {
    Deposit,
    Remaining,
    Refund,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_method", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Bank,
    Momo,
    ZaloPay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "assignment_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentStatus {
    Pending,
    Accepted,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "assignment_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentRole {
    Florist,
}

// --- Entidades ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Order {
    pub id: i64,
    #[schema(example = "A1B2C3")]
    pub code: String,
    pub customer_id: i64,
    pub receiver_name: String,
    pub receiver_phone: Option<String>,
    pub receive_at: Option<DateTime<Utc>>,
    pub receive_method: Option<ReceiveMethod>,
    pub address: Option<String>,
    pub card_message: Option<String>,
    pub status: OrderStatus,
    pub source: OrderSource,
    // Valores em unidades mínimas da moeda
    #[schema(example = 400000)]
    pub total_amount: i64,
    #[schema(example = 100000)]
    pub deposit_amount: i64,
    #[schema(example = 300000)]
    pub remaining_amount: i64,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub sku_id: i64,
    pub sku_name_snapshot: String,
    #[schema(value_type = f64, example = 2)]
    pub qty: Decimal,
    #[schema(example = 200000)]
    pub unit_price: i64,
    #[schema(example = 400000)]
    pub line_total: i64,
    pub notes: Option<String>,
    #[schema(value_type = Object)]
    pub options_json: Value,
    #[schema(value_type = Vec<BomSnapshotEntry>)]
    pub bom_snapshot: Json<Vec<BomSnapshotEntry>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Payment {
    pub id: i64,
    pub order_id: i64,
    #[serde(rename = "type")]
    pub payment_type: PaymentType,
    pub method: PaymentMethod,
    #[schema(example = 100000)]
    pub amount: i64,
    pub paid_at: DateTime<Utc>,
    pub recorded_by: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Assignment {
    pub id: i64,
    pub order_id: i64,
    pub assignee_id: i64,
    pub role: AssignmentRole,
    pub status: AssignmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// O agregado completo devolvido pela API.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub header: Order,
    pub customer: Customer,
    pub items: Vec<OrderItem>,
    pub payments: Vec<Payment>,
    pub assignments: Vec<Assignment>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub total: i64,
    pub skip: i64,
    pub limit: i64,
    pub items: Vec<OrderDetail>,
}

// --- Payloads ---

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ReceiverInput {
    #[validate(length(min = 1, max = 255, message = "O nome do destinatário é obrigatório"))]
    pub name: String,

    #[validate(regex(path = *PHONE_REGEX, message = "Formato de telefone inválido"))]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct DeliveryInput {
    pub method: ReceiveMethod,

    #[validate(custom(function = "validate_future"))]
    pub receive_at_iso: DateTime<Utc>,

    #[validate(length(max = 1024))]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct OrderItemInput {
    pub sku_id: i64,
    #[schema(value_type = f64, example = 2)]
    pub qty: Decimal,
    #[schema(example = 200000)]
    pub unit_price: i64,
    #[schema(value_type = Object)]
    pub options: Option<Value>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateOrderPayload {
    pub source: OrderSource,

    #[validate(nested)]
    pub customer: CustomerInput,

    #[validate(nested)]
    pub receiver: ReceiverInput,

    #[validate(nested)]
    pub delivery: Option<DeliveryInput>,

    pub card_message: Option<String>,

    // `None` e lista vazia significam "pedido ainda em negociação"
    pub items: Option<Vec<OrderItemInput>>,

    #[serde(default)]
    #[validate(range(min = 0, message = "O sinal não pode ser negativo"))]
    pub deposit_amount: i64,

    // Forma do sinal pago na criação; sem valor, dinheiro
    #[serde(default)]
    pub deposit_method: Option<PaymentMethod>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct OrderStatusUpdate {
    pub status: OrderStatus,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct PaymentCreate {
    #[serde(rename = "type")]
    pub payment_type: PaymentType,
    pub method: PaymentMethod,
    #[validate(range(min = 1, message = "O valor do pagamento deve ser positivo"))]
    #[schema(example = 100000)]
    pub amount: i64,
    pub paid_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AssignmentCreate {
    pub assignee_id: i64,
}

#[derive(Debug, Clone, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrderListQuery {
    pub status: Option<OrderStatus>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    /// Parte do telefone do cliente
    pub phone: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub skip: i64,
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100))]
    pub limit: i64,
}

fn default_limit() -> i64 {
    50
}

fn validate_future(value: &DateTime<Utc>) -> Result<(), ValidationError> {
    if *value <= Utc::now() {
        let mut err = ValidationError::new("future");
        err.message = Some("A data de entrega deve estar no futuro".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn payload(receive_at: DateTime<Utc>) -> serde_json::Value {
        json!({
            "source": "MANUAL",
            "customer": {"name": "Bob", "phone": "0987654321"},
            "receiver": {"name": "Receiver", "phone": "0977777777"},
            "delivery": {
                "method": "DELIVERY",
                "receive_at_iso": receive_at.to_rfc3339(),
                "address": "123 Flower Street"
            },
            "card_message": "Happy Birthday!",
            "items": [{"sku_id": 1, "qty": 2, "unit_price": 200000, "options": {"color": "red"}}]
        })
    }

    #[test]
    fn statuses_use_screaming_snake_case_on_the_wire() {
        assert_eq!(serde_json::to_value(OrderStatus::InProgress).unwrap(), json!("IN_PROGRESS"));
        assert_eq!(serde_json::to_value(PaymentMethod::ZaloPay).unwrap(), json!("ZALO_PAY"));
    }

    #[test]
    fn create_payload_accepts_a_future_delivery() {
        let parsed: CreateOrderPayload =
            serde_json::from_value(payload(Utc::now() + Duration::hours(2))).unwrap();
        assert!(parsed.validate().is_ok());
        assert_eq!(parsed.deposit_amount, 0);
        assert_eq!(parsed.items.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn create_payload_rejects_past_delivery_and_bad_phone() {
        let mut raw = payload(Utc::now() - Duration::hours(1));
        raw["customer"]["phone"] = json!("abc");
        let parsed: CreateOrderPayload = serde_json::from_value(raw).unwrap();
        assert!(parsed.validate().is_err());
    }

    #[test]
    fn payment_amount_must_be_positive() {
        let payment: PaymentCreate = serde_json::from_value(json!({
            "type": "DEPOSIT",
            "method": "CASH",
            "amount": 0,
            "paid_at": Utc::now().to_rfc3339()
        }))
        .unwrap();
        assert!(payment.validate().is_err());
    }
}
