// src/models/customers.rs

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

// Telefones locais (0 + 8..10 dígitos) ou internacionais (+ 9..15 dígitos).
pub static PHONE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\+?\d{9,15}|0\d{8,10})$").expect("regex de telefone válida")
});

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Customer {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "Bob")]
    pub name: String,
    #[schema(example = "0987654321")]
    pub phone: String,
    pub social_link: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Identidade do cliente: o telefone é a chave do upsert.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CustomerInput {
    #[validate(length(min = 1, max = 255, message = "O nome é obrigatório"))]
    #[schema(example = "Bob")]
    pub name: String,

    #[validate(regex(path = *PHONE_REGEX, message = "Formato de telefone inválido"))]
    #[schema(example = "0987654321")]
    pub phone: String,

    #[validate(length(max = 1024))]
    pub social_link: Option<String>,
}
