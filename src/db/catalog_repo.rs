// src/db/catalog_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};

use crate::{
    common::error::AppError,
    models::catalog::{BomComponent, Sku},
};

#[derive(Clone, Default)]
pub struct CatalogRepository;

impl CatalogRepository {
    pub async fn find_sku<'e, E>(&self, executor: E, sku_id: i64) -> Result<Option<Sku>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sku = sqlx::query_as::<_, Sku>(
            r#"
            SELECT id, code, name, is_template, unit, track_stock, base_price,
                   options_json, is_active, created_at
            FROM skus
            WHERE id = $1
            "#,
        )
        .bind(sku_id)
        .fetch_optional(executor)
        .await?;

        Ok(sku)
    }

    /// Componentes diretos do BOM (um nível só), já com código e nome.
    pub async fn list_bom_components<'e, E>(
        &self,
        executor: E,
        parent_sku_id: i64,
    ) -> Result<Vec<BomComponent>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, BomComponent>(
            r#"
            SELECT b.id,
                   b.component_sku_id,
                   c.code AS component_code,
                   c.name AS component_name,
                   b.qty,
                   b.uom
            FROM sku_bom b
            JOIN skus c ON c.id = b.component_sku_id
            WHERE b.parent_sku_id = $1
            ORDER BY b.id ASC
            "#,
        )
        .bind(parent_sku_id)
        .fetch_all(executor)
        .await?;

        Ok(rows)
    }

    /// `true` se `target` já aparece em algum nível do BOM de `from`.
    /// `UNION` (sem ALL) descarta repetidos, então a recursão termina mesmo
    /// com ciclos antigos no banco.
    pub async fn bom_reaches<'e, E>(
        &self,
        executor: E,
        from_sku_id: i64,
        target_sku_id: i64,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let reaches: bool = sqlx::query_scalar(
            r#"
            WITH RECURSIVE descendants(sku_id) AS (
                SELECT component_sku_id FROM sku_bom WHERE parent_sku_id = $1
                UNION
                SELECT b.component_sku_id
                FROM sku_bom b
                JOIN descendants d ON b.parent_sku_id = d.sku_id
            )
            SELECT EXISTS (SELECT 1 FROM descendants WHERE sku_id = $2)
            "#,
        )
        .bind(from_sku_id)
        .bind(target_sku_id)
        .fetch_one(executor)
        .await?;

        Ok(reaches)
    }

    pub async fn insert_bom_entry<'e, E>(
        &self,
        executor: E,
        parent_sku_id: i64,
        component_sku_id: i64,
        qty: Decimal,
        uom: Option<&str>,
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO sku_bom (parent_sku_id, component_sku_id, qty, uom)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(parent_sku_id)
        .bind(component_sku_id)
        .bind(qty)
        .bind(uom)
        .fetch_one(executor)
        .await?;

        Ok(id)
    }
}
