// src/db/customer_repo.rs

use sqlx::{Executor, Postgres};

use crate::{common::error::AppError, models::customers::Customer};

// Sem pool próprio: quem chama decide a conexão/transação.
#[derive(Clone, Default)]
pub struct CustomerRepository;

impl CustomerRepository {

    /// Upsert pelo telefone numa única query: telefone existente atualiza
    /// nome e link social, senão cria o cliente. O índice único em `phone`
    /// resolve a corrida entre duas requisições com o mesmo telefone.
    pub async fn upsert_by_phone<'e, E>(
        &self,
        executor: E,
        name: &str,
        phone: &str,
        social_link: Option<&str>,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (name, phone, social_link)
            VALUES ($1, $2, $3)
            ON CONFLICT (phone) DO UPDATE
            SET name = EXCLUDED.name,
                social_link = EXCLUDED.social_link,
                updated_at = NOW()
            RETURNING id, name, phone, social_link, notes, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(phone)
        .bind(social_link)
        .fetch_one(executor)
        .await?;

        Ok(customer)
    }

    pub async fn find_by_ids<'e, E>(
        &self,
        executor: E,
        ids: &[i64],
    ) -> Result<Vec<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, name, phone, social_link, notes, created_at, updated_at
            FROM customers
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(executor)
        .await?;

        Ok(customers)
    }
}
