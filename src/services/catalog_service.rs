// src/services/catalog_service.rs

use rust_decimal::Decimal;
use sqlx::{Postgres, Transaction};

use crate::{
    common::error::AppError,
    db::CatalogRepository,
    models::catalog::{AddBomComponentPayload, BomComponent, BomSnapshotEntry, Sku},
};

#[derive(Clone, Default)]
pub struct CatalogService {
    catalog_repo: CatalogRepository,
}

impl CatalogService {
    pub fn new(catalog_repo: CatalogRepository) -> Self {
        Self { catalog_repo }
    }

    pub async fn require_sku(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        sku_id: i64,
    ) -> Result<Sku, AppError> {
        self.catalog_repo
            .find_sku(&mut **tx, sku_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("SKU {sku_id}")))
    }

    /// Copia o BOM atual do SKU para gravar no item do pedido.
    /// SKU sem BOM devolve lista vazia.
    pub async fn snapshot_bom(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        sku_id: i64,
    ) -> Result<Vec<BomSnapshotEntry>, AppError> {
        let rows = self.catalog_repo.list_bom_components(&mut **tx, sku_id).await?;
        Ok(rows.iter().map(BomSnapshotEntry::from).collect())
    }

    // --- GET BOM (leitura ao vivo) ---
    pub async fn get_sku_bom(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        sku_id: i64,
    ) -> Result<Vec<BomComponent>, AppError> {
        self.require_sku(tx, sku_id).await?;
        self.catalog_repo.list_bom_components(&mut **tx, sku_id).await
    }

    // --- ADD BOM COMPONENT ---
    // Recusa auto-referência e qualquer entrada que feche um ciclo.
    pub async fn add_bom_component(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        parent_sku_id: i64,
        payload: &AddBomComponentPayload,
    ) -> Result<Vec<BomComponent>, AppError> {
        if payload.qty <= Decimal::ZERO {
            return Err(AppError::InvalidInput(
                "A quantidade do componente deve ser maior que zero".into(),
            ));
        }

        self.require_sku(tx, parent_sku_id).await?;
        self.require_sku(tx, payload.component_sku_id).await?;

        if payload.component_sku_id == parent_sku_id {
            return Err(AppError::InvalidItem(
                "Um SKU não pode ser componente de si mesmo".into(),
            ));
        }

        let closes_cycle = self
            .catalog_repo
            .bom_reaches(&mut **tx, payload.component_sku_id, parent_sku_id)
            .await?;
        if closes_cycle {
            return Err(AppError::InvalidItem(format!(
                "O SKU {} já contém o SKU {} no seu BOM",
                payload.component_sku_id, parent_sku_id
            )));
        }

        let entry_id = self
            .catalog_repo
            .insert_bom_entry(
                &mut **tx,
                parent_sku_id,
                payload.component_sku_id,
                payload.qty,
                payload.uom.as_deref(),
            )
            .await?;

        tracing::info!(
            parent_sku_id,
            component_sku_id = payload.component_sku_id,
            entry_id,
            "Componente adicionado ao BOM"
        );

        self.catalog_repo.list_bom_components(&mut **tx, parent_sku_id).await
    }
}
