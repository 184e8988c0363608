// src/models/catalog.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

// --- SKU ---
// Só SKUs com `is_template` podem ser vendidos diretamente; os demais
// são componentes usados no BOM dos templates.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Sku {
    pub id: i64,
    #[schema(example = "BQT")]
    pub code: String,
    #[schema(example = "Bouquet")]
    pub name: String,
    pub is_template: bool,
    #[schema(example = "bunch")]
    pub unit: Option<String>,
    pub track_stock: bool,
    #[schema(example = 150000)]
    pub base_price: i64,
    #[schema(value_type = Object)]
    pub options_json: Value,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

// --- BOM (leitura "ao vivo") ---
// Linha do BOM já unida ao SKU componente.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BomComponent {
    pub id: i64,
    pub component_sku_id: i64,
    #[schema(example = "STEM")]
    pub component_code: String,
    #[schema(example = "Flower Stem")]
    pub component_name: String,
    #[serde(with = "rust_decimal::serde::str")]
    #[schema(value_type = String, example = "3.000")]
    pub qty: Decimal,
    #[schema(example = "stem")]
    pub uom: Option<String>,
}

/// Cópia imutável de um componente do BOM, gravada no item do pedido.
///
/// Não guarda referência viva ao catálogo: renomear o componente ou editar o
/// BOM depois não altera pedidos já criados. `qty` é serializada como string
/// para não perder precisão no JSONB.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BomSnapshotEntry {
    pub component_sku_id: i64,
    pub component_code: String,
    pub component_name: String,
    #[serde(with = "rust_decimal::serde::str")]
    #[schema(value_type = String, example = "3")]
    pub qty: Decimal,
    pub uom: Option<String>,
}

impl From<&BomComponent> for BomSnapshotEntry {
    fn from(row: &BomComponent) -> Self {
        Self {
            component_sku_id: row.component_sku_id,
            component_code: row.component_code.clone(),
            component_name: row.component_name.clone(),
            qty: row.qty,
            uom: row.uom.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddBomComponentPayload {
    pub component_sku_id: i64,

    #[schema(value_type = f64, example = 3)]
    pub qty: Decimal,

    #[validate(length(max = 64))]
    #[schema(example = "stem")]
    pub uom: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn snapshot_serializes_qty_as_exact_string() {
        let entry = BomSnapshotEntry {
            component_sku_id: 7,
            component_code: "STEM".into(),
            component_name: "Flower Stem".into(),
            qty: dec!(2.125),
            uom: Some("stem".into()),
        };

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["qty"], json!("2.125"));

        let back: BomSnapshotEntry = serde_json::from_value(value).unwrap();
        assert_eq!(back, entry);
    }
}
