use sqlx::{Executor, Postgres};

use crate::{common::error::AppError, models::auth::User};

// O repositório de usuários: só leitura, o cadastro é do serviço de autenticação
#[derive(Clone, Default)]
pub struct UserRepository;

impl UserRepository {
    // Busca um usuário pelo seu ID
    pub async fn find_by_id<'e, E>(&self, executor: E, id: i64) -> Result<Option<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, phone, role, is_active, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(user)
    }
}
