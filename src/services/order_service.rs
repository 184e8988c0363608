// src/services/order_service.rs

use std::collections::HashMap;

use anyhow::anyhow;
use serde_json::Value;
use sqlx::{Acquire, Postgres, Transaction};

use crate::{
    common::error::AppError,
    db::{
        order_repo::{NewOrderItemRow, NewOrderRow},
        OrderRepository, UserRepository,
    },
    models::{
        auth::UserRole,
        catalog::Sku,
        orders::{
            Assignment, CreateOrderPayload, Order, OrderDetail, OrderItemInput, OrderList,
            OrderListQuery, OrderStatus, Payment, PaymentCreate, PaymentMethod, PaymentType,
        },
    },
    services::{
        catalog_service::CatalogService,
        customer_service::CustomerService,
        lifecycle,
        order_code::OrderCodeGenerator,
        pricing::PricingConfig,
        reconciliation,
    },
};

// Item já validado, com o SKU resolvido e o valor da linha calculado.
struct PricedLine<'a> {
    input: &'a OrderItemInput,
    sku: Sku,
    line_total: i64,
}

#[derive(Clone, Default)]
pub struct OrderService {
    order_repo: OrderRepository,
    user_repo: UserRepository,
    customers: CustomerService,
    catalog: CatalogService,
    codes: OrderCodeGenerator,
    pricing: PricingConfig,
}

impl OrderService {
    pub fn new(
        order_repo: OrderRepository,
        user_repo: UserRepository,
        customers: CustomerService,
        catalog: CatalogService,
        codes: OrderCodeGenerator,
        pricing: PricingConfig,
    ) -> Self {
        Self { order_repo, user_repo, customers, catalog, codes, pricing }
    }

    // =========================================================================
    //  CRIAÇÃO
    // =========================================================================

    /// Monta e grava o pedido completo: cliente (upsert), cabeçalho com
    /// código único, itens com snapshot do BOM e o sinal como pagamento
    /// DEPOSIT. Tudo na transação recebida.
    pub async fn create_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        payload: &CreateOrderPayload,
        created_by: Option<i64>,
    ) -> Result<OrderDetail, AppError> {
        if payload.deposit_amount < 0 {
            return Err(AppError::InvalidInput("O sinal não pode ser negativo".into()));
        }
        let inputs = payload.items.as_deref().unwrap_or_default();

        // 1. Entrada (antes de qualquer leitura do catálogo)
        for item in inputs {
            self.pricing.validate_line(item.qty, item.unit_price)?;
        }

        // 2. Resolve SKUs e calcula as linhas
        let mut lines = Vec::with_capacity(inputs.len());
        for item in inputs {
            let sku = self.catalog.require_sku(tx, item.sku_id).await?;
            if !sku.is_template {
                return Err(AppError::InvalidItem(format!(
                    "O SKU {} ({}) não pode ser vendido diretamente",
                    sku.id, sku.code
                )));
            }
            let line_total = self.pricing.line_total(item.qty, item.unit_price)?;
            lines.push(PricedLine { input: item, sku, line_total });
        }

        // 3. Totais e status inicial
        let line_totals: Vec<i64> = lines.iter().map(|l| l.line_total).collect();
        let totals = self
            .pricing
            .order_totals(Some(line_totals.as_slice()), payload.deposit_amount)?;

        // 4. Persistência
        let customer = self.customers.upsert_customer(tx, &payload.customer).await?;

        let delivery = payload.delivery.as_ref();
        let row = NewOrderRow {
            customer_id: customer.id,
            receiver_name: payload.receiver.name.trim(),
            receiver_phone: payload.receiver.phone.as_deref(),
            receive_method: delivery.map(|d| d.method),
            receive_at: delivery.map(|d| d.receive_at_iso),
            address: delivery.and_then(|d| d.address.as_deref()),
            card_message: payload.card_message.as_deref(),
            status: totals.status,
            source: payload.source,
            total_amount: totals.total_amount,
            deposit_amount: totals.deposit_amount,
            remaining_amount: totals.remaining_amount,
            created_by,
        };
        let order = self.insert_with_unique_code(tx, &row).await?;

        let mut items = Vec::with_capacity(lines.len());
        for line in &lines {
            let bom_snapshot = self.catalog.snapshot_bom(tx, line.sku.id).await?;
            let options = line
                .input
                .options
                .clone()
                .unwrap_or_else(|| Value::Object(Default::default()));

            let item = self
                .order_repo
                .insert_item(
                    &mut **tx,
                    &NewOrderItemRow {
                        order_id: order.id,
                        sku_id: line.sku.id,
                        sku_name_snapshot: &line.sku.name,
                        qty: line.input.qty,
                        unit_price: line.input.unit_price,
                        line_total: line.line_total,
                        notes: line.input.notes.as_deref(),
                        options_json: &options,
                        bom_snapshot: &bom_snapshot,
                    },
                )
                .await?;
            items.push(item);
        }

        // O sinal entra no histórico para sobreviver à reconciliação
        let mut payments = Vec::new();
        if totals.deposit_amount > 0 {
            let deposit = self
                .order_repo
                .insert_payment(
                    &mut **tx,
                    order.id,
                    PaymentType::Deposit,
                    payload.deposit_method.unwrap_or(PaymentMethod::Cash),
                    totals.deposit_amount,
                    order.created_at,
                    created_by,
                )
                .await?;
            payments.push(deposit);
        }

        tracing::info!(
            order_id = order.id,
            code = %order.code,
            status = ?order.status,
            total = order.total_amount,
            deposit = order.deposit_amount,
            "📦 Pedido criado"
        );

        Ok(OrderDetail {
            header: order,
            customer,
            items,
            payments,
            assignments: Vec::new(),
        })
    }

    // Cada candidato consome uma tentativa, seja por já existir na tabela,
    // seja por perder a corrida no índice único. O INSERT roda num savepoint
    // para que a violação não aborte a transação externa.
    async fn insert_with_unique_code(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        row: &NewOrderRow<'_>,
    ) -> Result<Order, AppError> {
        for code in self.codes.attempts() {
            if self.order_repo.code_exists(&mut **tx, &code).await? {
                tracing::debug!(code = %code, "Código de pedido já existe, gerando outro");
                continue;
            }

            let mut savepoint = (&mut **tx).begin().await?;
            match self.order_repo.insert_order(&mut *savepoint, &code, row).await {
                Ok(order) => {
                    savepoint.commit().await?;
                    return Ok(order);
                }
                Err(AppError::OrderCodeConflict) => {
                    savepoint.rollback().await?;
                    tracing::warn!(code = %code, "Conflito no código do pedido, nova tentativa");
                }
                Err(e) => return Err(e),
            }
        }

        Err(self.codes.exhausted())
    }

    // =========================================================================
    //  STATUS
    // =========================================================================

    pub async fn transition_status(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order_id: i64,
        new_status: OrderStatus,
    ) -> Result<OrderDetail, AppError> {
        let order = self.lock_existing(tx, order_id).await?;

        let order = if lifecycle::check_transition(order.status, new_status)? {
            let updated = self.order_repo.update_status(&mut **tx, order_id, new_status).await?;
            tracing::info!(
                order_id,
                from = ?order.status,
                to = ?new_status,
                terminal = lifecycle::is_terminal(new_status),
                "🔄 Status do pedido alterado"
            );
            updated
        } else {
            order
        };

        self.hydrate_one(tx, order).await
    }

    // =========================================================================
    //  PAGAMENTOS
    // =========================================================================

    /// Grava o pagamento e recalcula sinal e saldo a partir de todo o
    /// histórico, com a linha do pedido travada.
    pub async fn record_payment(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order_id: i64,
        payment: &PaymentCreate,
        recorded_by: Option<i64>,
    ) -> Result<Payment, AppError> {
        if payment.amount <= 0 {
            return Err(AppError::InvalidInput(
                "O valor do pagamento deve ser positivo".into(),
            ));
        }

        let order = self.lock_existing(tx, order_id).await?;

        let created = self
            .order_repo
            .insert_payment(
                &mut **tx,
                order_id,
                payment.payment_type,
                payment.method,
                payment.amount,
                payment.paid_at,
                recorded_by,
            )
            .await?;

        let history = self.order_repo.list_payments_for(&mut **tx, &[order_id]).await?;
        let balances = reconciliation::reconcile(
            order.total_amount,
            history.iter().map(|p| (p.payment_type, p.amount)),
        )?;

        self.order_repo
            .update_financials(&mut **tx, order_id, balances.deposit_amount, balances.remaining_amount)
            .await?;

        tracing::info!(
            order_id,
            payment_id = created.id,
            kind = ?created.payment_type,
            amount = created.amount,
            deposit = balances.deposit_amount,
            remaining = balances.remaining_amount,
            "💰 Pagamento registrado"
        );

        Ok(created)
    }

    // =========================================================================
    //  DESIGNAÇÃO
    // =========================================================================

    pub async fn assign_worker(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order_id: i64,
        assignee_id: i64,
    ) -> Result<Assignment, AppError> {
        let order = self.lock_existing(tx, order_id).await?;

        let worker = self.user_repo.find_by_id(&mut **tx, assignee_id).await?;
        match worker {
            Some(user) if user.role == UserRole::Florist && user.is_active => {}
            _ => return Err(AppError::InvalidAssignee),
        }

        let assignment = self
            .order_repo
            .insert_assignment(&mut **tx, order_id, assignee_id)
            .await?;

        // Efeito colateral fora da tabela de transições
        let next = lifecycle::status_after_assignment(order.status);
        if next != order.status {
            self.order_repo.update_status(&mut **tx, order_id, next).await?;
        }

        tracing::info!(
            order_id,
            assignee_id,
            status = ?next,
            "🌸 Florista designado ao pedido"
        );

        Ok(assignment)
    }

    // =========================================================================
    //  LEITURA
    // =========================================================================

    pub async fn get_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order_id: i64,
    ) -> Result<OrderDetail, AppError> {
        let order = self
            .order_repo
            .find_order(&mut **tx, order_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Pedido {order_id}")))?;

        self.hydrate_one(tx, order).await
    }

    pub async fn list_orders(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        query: &OrderListQuery,
    ) -> Result<OrderList, AppError> {
        let (total, orders) = self.order_repo.search(&mut **tx, query).await?;
        let items = self.hydrate(tx, orders).await?;

        Ok(OrderList { total, skip: query.skip, limit: query.limit, items })
    }

    async fn lock_existing(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order_id: i64,
    ) -> Result<Order, AppError> {
        self.order_repo
            .lock_order(&mut **tx, order_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Pedido {order_id}")))
    }

    async fn hydrate_one(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: Order,
    ) -> Result<OrderDetail, AppError> {
        self.hydrate(tx, vec![order])
            .await?
            .pop()
            .ok_or_else(|| AppError::InternalServerError(anyhow!("pedido sumiu ao montar o agregado")))
    }

    // Carrega cliente, itens, pagamentos e designações de vários pedidos
    // com uma query por tabela.
    async fn hydrate(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        orders: Vec<Order>,
    ) -> Result<Vec<OrderDetail>, AppError> {
        if orders.is_empty() {
            return Ok(Vec::new());
        }

        let order_ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
        let customer_ids: Vec<i64> = orders.iter().map(|o| o.customer_id).collect();

        let customers: HashMap<i64, _> = self
            .customers
            .find_many(tx, &customer_ids)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        let mut items = group_by_order(
            self.order_repo.list_items_for(&mut **tx, &order_ids).await?,
            |i| i.order_id,
        );
        let mut payments = group_by_order(
            self.order_repo.list_payments_for(&mut **tx, &order_ids).await?,
            |p| p.order_id,
        );
        let mut assignments = group_by_order(
            self.order_repo.list_assignments_for(&mut **tx, &order_ids).await?,
            |a| a.order_id,
        );

        orders
            .into_iter()
            .map(|order| {
                // Vários pedidos podem ser do mesmo cliente
                let customer = customers
                    .get(&order.customer_id)
                    .cloned()
                    .ok_or_else(|| anyhow!("cliente {} do pedido {} não existe", order.customer_id, order.id))?;
                Ok(OrderDetail {
                    items: items.remove(&order.id).unwrap_or_default(),
                    payments: payments.remove(&order.id).unwrap_or_default(),
                    assignments: assignments.remove(&order.id).unwrap_or_default(),
                    customer,
                    header: order,
                })
            })
            .collect::<Result<Vec<_>, anyhow::Error>>()
            .map_err(AppError::from)
    }
}

fn group_by_order<T>(rows: Vec<T>, key: impl Fn(&T) -> i64) -> HashMap<i64, Vec<T>> {
    let mut grouped: HashMap<i64, Vec<T>> = HashMap::new();
    for row in rows {
        grouped.entry(key(&row)).or_default().push(row);
    }
    grouped
}
