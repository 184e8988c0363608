// src/services/customer_service.rs

use sqlx::{Postgres, Transaction};

use crate::{
    common::error::AppError,
    db::CustomerRepository,
    models::customers::{Customer, CustomerInput},
};

#[derive(Clone, Default)]
pub struct CustomerService {
    customer_repo: CustomerRepository,
}

impl CustomerService {
    pub fn new(customer_repo: CustomerRepository) -> Self {
        Self { customer_repo }
    }

    /// Telefone já cadastrado: atualiza nome e link social e devolve o
    /// mesmo cliente. Senão, cria um novo.
    pub async fn upsert_customer(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        input: &CustomerInput,
    ) -> Result<Customer, AppError> {
        let phone = input.phone.trim();
        if phone.is_empty() {
            return Err(AppError::InvalidInput("O telefone do cliente é obrigatório".into()));
        }

        let customer = self
            .customer_repo
            .upsert_by_phone(&mut **tx, input.name.trim(), phone, input.social_link.as_deref())
            .await?;

        tracing::debug!(customer_id = customer.id, "Cliente sincronizado pelo telefone");
        Ok(customer)
    }

    pub async fn find_many(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        ids: &[i64],
    ) -> Result<Vec<Customer>, AppError> {
        self.customer_repo.find_by_ids(&mut **tx, ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;

    fn input(name: &str, phone: &str) -> CustomerInput {
        CustomerInput { name: name.into(), phone: phone.into(), social_link: None }
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires Postgres (DATABASE_URL)"]
    async fn same_phone_updates_the_existing_customer(pool: PgPool) {
        let service = CustomerService::default();
        let mut tx = pool.begin().await.unwrap();

        let first = service.upsert_customer(&mut tx, &input("Bob", "0987654321")).await.unwrap();
        let mut renamed = input("Robert", "0987654321");
        renamed.social_link = Some("https://zalo.me/bob".into());
        let second = service.upsert_customer(&mut tx, &renamed).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.name, "Robert");
        assert_eq!(second.social_link.as_deref(), Some("https://zalo.me/bob"));

        let other = service.upsert_customer(&mut tx, &input("Ann", "0911111111")).await.unwrap();
        assert_ne!(other.id, first.id);
    }
}
