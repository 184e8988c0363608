// src/db/order_repo.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::{types::Json, Executor, PgConnection, Postgres, QueryBuilder};

use crate::{
    common::error::AppError,
    models::{
        catalog::BomSnapshotEntry,
        orders::{
            Assignment, AssignmentRole, AssignmentStatus, Order, OrderItem, OrderListQuery,
            OrderSource, OrderStatus, Payment, PaymentMethod, PaymentType, ReceiveMethod,
        },
    },
};

const ORDER_CODE_CONSTRAINT: &str = "orders_code_key";

/// Cabeçalho de um pedido novo, já com totais e status calculados.
/// O código entra à parte porque pode mudar a cada tentativa.
#[derive(Debug)]
pub struct NewOrderRow<'a> {
    pub customer_id: i64,
    pub receiver_name: &'a str,
    pub receiver_phone: Option<&'a str>,
    pub receive_method: Option<ReceiveMethod>,
    pub receive_at: Option<DateTime<Utc>>,
    pub address: Option<&'a str>,
    pub card_message: Option<&'a str>,
    pub status: OrderStatus,
    pub source: OrderSource,
    pub total_amount: i64,
    pub deposit_amount: i64,
    pub remaining_amount: i64,
    pub created_by: Option<i64>,
}

#[derive(Debug)]
pub struct NewOrderItemRow<'a> {
    pub order_id: i64,
    pub sku_id: i64,
    pub sku_name_snapshot: &'a str,
    pub qty: Decimal,
    pub unit_price: i64,
    pub line_total: i64,
    pub notes: Option<&'a str>,
    pub options_json: &'a Value,
    pub bom_snapshot: &'a [BomSnapshotEntry],
}

#[derive(Clone, Default)]
pub struct OrderRepository;

impl OrderRepository {
    // =========================================================================
    //  PEDIDOS
    // =========================================================================

    pub async fn code_exists<'e, E>(&self, executor: E, code: &str) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM orders WHERE code = $1)")
                .bind(code)
                .fetch_one(executor)
                .await?;

        Ok(exists)
    }

    pub async fn insert_order<'e, E>(
        &self,
        executor: E,
        code: &str,
        row: &NewOrderRow<'_>,
    ) -> Result<Order, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Order>(
            r#"
            INSERT INTO orders (
                code, customer_id, receiver_name, receiver_phone,
                receive_method, receive_at, address, card_message,
                status, source, total_amount, deposit_amount, remaining_amount,
                created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING *
            "#,
        )
        .bind(code)
        .bind(row.customer_id)
        .bind(row.receiver_name)
        .bind(row.receiver_phone)
        .bind(row.receive_method)
        .bind(row.receive_at)
        .bind(row.address)
        .bind(row.card_message)
        .bind(row.status)
        .bind(row.source)
        .bind(row.total_amount)
        .bind(row.deposit_amount)
        .bind(row.remaining_amount)
        .bind(row.created_by)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            // Outra requisição gravou o mesmo código entre o SELECT e o INSERT
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() && db_err.constraint() == Some(ORDER_CODE_CONSTRAINT) {
                    return AppError::OrderCodeConflict;
                }
            }
            e.into()
        })
    }

    pub async fn find_order<'e, E>(&self, executor: E, order_id: i64) -> Result<Option<Order>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
            .bind(order_id)
            .fetch_optional(executor)
            .await?;

        Ok(order)
    }

    /// Lê o pedido travando a linha até o fim da transação.
    /// Serializa pagamentos/transições concorrentes sobre o mesmo pedido.
    pub async fn lock_order<'e, E>(&self, executor: E, order_id: i64) -> Result<Option<Order>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1 FOR UPDATE")
            .bind(order_id)
            .fetch_optional(executor)
            .await?;

        Ok(order)
    }

    pub async fn update_status<'e, E>(
        &self,
        executor: E,
        order_id: i64,
        status: OrderStatus,
    ) -> Result<Order, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, Order>(
            r#"
            UPDATE orders
            SET status = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING *
            "#,
        )
        .bind(status)
        .bind(order_id)
        .fetch_one(executor)
        .await?;

        Ok(order)
    }

    // total_amount não é tocado aqui: é fixo desde a criação.
    pub async fn update_financials<'e, E>(
        &self,
        executor: E,
        order_id: i64,
        deposit_amount: i64,
        remaining_amount: i64,
    ) -> Result<Order, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, Order>(
            r#"
            UPDATE orders
            SET deposit_amount = $1, remaining_amount = $2, updated_at = NOW()
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(deposit_amount)
        .bind(remaining_amount)
        .bind(order_id)
        .fetch_one(executor)
        .await?;

        Ok(order)
    }

    /// Página de pedidos (mais recentes primeiro) e o total para os filtros.
    pub async fn search(
        &self,
        conn: &mut PgConnection,
        filter: &OrderListQuery,
    ) -> Result<(i64, Vec<Order>), AppError> {
        let mut count = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM orders o JOIN customers c ON c.id = o.customer_id WHERE TRUE",
        );
        push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar::<i64>().fetch_one(&mut *conn).await?;

        let mut page = QueryBuilder::<Postgres>::new(
            "SELECT o.* FROM orders o JOIN customers c ON c.id = o.customer_id WHERE TRUE",
        );
        push_filters(&mut page, filter);
        page.push(" ORDER BY o.created_at DESC, o.id DESC LIMIT ")
            .push_bind(filter.limit)
            .push(" OFFSET ")
            .push_bind(filter.skip);
        let orders = page.build_query_as::<Order>().fetch_all(&mut *conn).await?;

        Ok((total, orders))
    }

    // =========================================================================
    //  ITENS
    // =========================================================================

    pub async fn insert_item<'e, E>(
        &self,
        executor: E,
        row: &NewOrderItemRow<'_>,
    ) -> Result<OrderItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, OrderItem>(
            r#"
            INSERT INTO order_items (
                order_id, sku_id, sku_name_snapshot, qty, unit_price,
                line_total, notes, options_json, bom_snapshot
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(row.order_id)
        .bind(row.sku_id)
        .bind(row.sku_name_snapshot)
        .bind(row.qty)
        .bind(row.unit_price)
        .bind(row.line_total)
        .bind(row.notes)
        .bind(row.options_json)
        .bind(Json(row.bom_snapshot))
        .fetch_one(executor)
        .await?;

        Ok(item)
    }

    pub async fn list_items_for<'e, E>(
        &self,
        executor: E,
        order_ids: &[i64],
    ) -> Result<Vec<OrderItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, OrderItem>(
            "SELECT * FROM order_items WHERE order_id = ANY($1) ORDER BY id ASC",
        )
        .bind(order_ids)
        .fetch_all(executor)
        .await?;

        Ok(items)
    }

    // =========================================================================
    //  PAGAMENTOS
    // =========================================================================

    pub async fn insert_payment<'e, E>(
        &self,
        executor: E,
        order_id: i64,
        payment_type: PaymentType,
        method: PaymentMethod,
        amount: i64,
        paid_at: DateTime<Utc>,
        recorded_by: Option<i64>,
    ) -> Result<Payment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (order_id, payment_type, method, amount, paid_at, recorded_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(order_id)
        .bind(payment_type)
        .bind(method)
        .bind(amount)
        .bind(paid_at)
        .bind(recorded_by)
        .fetch_one(executor)
        .await?;

        Ok(payment)
    }

    pub async fn list_payments_for<'e, E>(
        &self,
        executor: E,
        order_ids: &[i64],
    ) -> Result<Vec<Payment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let payments = sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments WHERE order_id = ANY($1) ORDER BY paid_at ASC, id ASC",
        )
        .bind(order_ids)
        .fetch_all(executor)
        .await?;

        Ok(payments)
    }

    // =========================================================================
    //  DESIGNAÇÕES
    // =========================================================================

    pub async fn insert_assignment<'e, E>(
        &self,
        executor: E,
        order_id: i64,
        assignee_id: i64,
    ) -> Result<Assignment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let assignment = sqlx::query_as::<_, Assignment>(
            r#"
            INSERT INTO assignments (order_id, assignee_id, role, status)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(order_id)
        .bind(assignee_id)
        .bind(AssignmentRole::Florist)
        .bind(AssignmentStatus::Pending)
        .fetch_one(executor)
        .await?;

        Ok(assignment)
    }

    pub async fn list_assignments_for<'e, E>(
        &self,
        executor: E,
        order_ids: &[i64],
    ) -> Result<Vec<Assignment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let assignments = sqlx::query_as::<_, Assignment>(
            "SELECT * FROM assignments WHERE order_id = ANY($1) ORDER BY id ASC",
        )
        .bind(order_ids)
        .fetch_all(executor)
        .await?;

        Ok(assignments)
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &OrderListQuery) {
    if let Some(status) = filter.status {
        builder.push(" AND o.status = ").push_bind(status);
    }
    if let Some(date_from) = filter.date_from {
        builder.push(" AND o.created_at >= ").push_bind(date_from);
    }
    if let Some(date_to) = filter.date_to {
        builder.push(" AND o.created_at <= ").push_bind(date_to);
    }
    if let Some(phone) = filter.phone.as_deref().filter(|p| !p.is_empty()) {
        builder
            .push(" AND c.phone LIKE ")
            .push_bind(format!("%{}%", phone.replace('%', "").replace('_', "")));
    }
}
