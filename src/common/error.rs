use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::models::orders::OrderStatus;

// Erro único da aplicação. Os serviços devolvem `Result<T, AppError>` e o
// handler só precisa propagar com `?`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // Validação feita no núcleo (qty <= 0, valor de pagamento <= 0...)
    #[error("Entrada inválida: {0}")]
    InvalidInput(String),

    #[error("{0} não encontrado")]
    NotFound(String),

    #[error("Item inválido: {0}")]
    InvalidItem(String),

    #[error("Pedido inválido: {0}")]
    InvalidOrder(String),

    #[error("Transição de status inválida: {from:?} -> {to:?}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("O responsável precisa ser um florista")]
    InvalidAssignee,

    // Conflito no índice único de orders.code; tratado com nova tentativa.
    #[error("Código de pedido já utilizado")]
    OrderCodeConflict,

    #[error("Não foi possível gerar um código de pedido após {attempts} tentativas")]
    CodeGenerationExhausted { attempts: usize },

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário inativo")]
    InactiveUser,

    #[error("Permissão insuficiente")]
    Forbidden,

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::InvalidInput(_)
            | AppError::InvalidItem(_)
            | AppError::InvalidOrder(_)
            | AppError::InvalidTransition { .. }
            | AppError::InvalidAssignee
            | AppError::InactiveUser => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidToken | AppError::JwtError(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::OrderCodeConflict
            | AppError::CodeGenerationExhausted { .. }
            | AppError::DatabaseError(_)
            | AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if let AppError::ValidationError(errors) = &self {
            let mut details = std::collections::HashMap::new();
            for (field, field_errors) in errors.field_errors() {
                let messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                details.insert(field.to_string(), messages);
            }
            let body = Json(json!({
                "error": "Um ou mais campos são inválidos.",
                "details": details,
            }));
            return (status, body).into_response();
        }

        // 5xx: o cliente recebe uma mensagem genérica, o detalhe fica no log.
        let message = if status.is_server_error() {
            tracing::error!("Erro Interno do Servidor: {:?}", self);
            "Ocorreu um erro inesperado.".to_string()
        } else {
            self.to_string()
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_rule_violations_are_client_errors() {
        assert_eq!(AppError::InvalidItem("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::InvalidOrder("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::InvalidAssignee.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::InvalidTransition {
                from: OrderStatus::New,
                to: OrderStatus::Ready
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::NotFound("Pedido".into()).status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn code_exhaustion_is_a_server_error() {
        let err = AppError::CodeGenerationExhausted { attempts: 10 };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
