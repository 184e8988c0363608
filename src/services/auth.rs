// src/services/auth.rs

use jsonwebtoken::{decode, DecodingKey, Validation};
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{Claims, User},
};

// Só valida tokens: a emissão (login/senha) fica no serviço de identidade.
#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    jwt_secret: String,
    pool: PgPool,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, jwt_secret: String, pool: PgPool) -> Self {
        Self { user_repo, jwt_secret, pool }
    }

    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let claims = decode_claims(token, &self.jwt_secret)?;
        let user_id: i64 = claims.sub.parse().map_err(|_| AppError::InvalidToken)?;

        let user = self
            .user_repo
            .find_by_id(&self.pool, user_id)
            .await?
            .ok_or(AppError::InvalidToken)?;

        if !user.is_active {
            tracing::warn!(user_id, "Token de usuário inativo recusado");
            return Err(AppError::InactiveUser);
        }

        Ok(user)
    }
}

fn decode_claims(token: &str, secret: &str) -> Result<Claims, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map_err(|_| AppError::InvalidToken)?;

    Ok(token_data.claims)
}
