// src/config.rs

use crate::{
    db::{CatalogRepository, CustomerRepository, OrderRepository, UserRepository},
    services::{
        auth::AuthService,
        catalog_service::CatalogService,
        customer_service::CustomerService,
        order_code::OrderCodeGenerator,
        order_service::OrderService,
        pricing::{PricingConfig, RoundingMode},
    },
};
use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, time::Duration};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

// Configuração lida do ambiente (.env é carregado antes)
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub rounding: RoundingMode,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = lookup("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let db_max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("DB_MAX_CONNECTIONS inválido: {raw}"))?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let rounding = match lookup("ROUNDING_MODE") {
            Some(raw) => raw.parse::<RoundingMode>()?,
            None => RoundingMode::default(),
        };

        Ok(Self { database_url, jwt_secret, bind_addr, db_max_connections, rounding })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub settings: Settings,
    pub auth_service: AuthService,
    pub order_service: OrderService,
    pub customer_service: CustomerService,
    pub catalog_service: CatalogService,
}

impl AppState {
    pub async fn new(settings: Settings) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(settings.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&settings.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let customer_service = CustomerService::new(CustomerRepository);
        let catalog_service = CatalogService::new(CatalogRepository);
        let order_service = OrderService::new(
            OrderRepository,
            UserRepository,
            customer_service.clone(),
            catalog_service.clone(),
            OrderCodeGenerator::default(),
            PricingConfig::new(settings.rounding),
        );
        let auth_service =
            AuthService::new(UserRepository, settings.jwt_secret.clone(), db_pool.clone());

        Ok(Self {
            db_pool,
            settings,
            auth_service,
            order_service,
            customer_service,
            catalog_service,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_optional_vars_are_missing() {
        let settings = Settings::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/flores"),
            ("JWT_SECRET", "segredo"),
        ]))
        .unwrap();

        assert_eq!(settings.bind_addr, "0.0.0.0:3000");
        assert_eq!(settings.db_max_connections, 5);
        assert_eq!(settings.rounding, RoundingMode::HalfUp);
    }

    #[test]
    fn overrides_and_missing_required_vars() {
        let settings = Settings::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/flores"),
            ("JWT_SECRET", "segredo"),
            ("DB_MAX_CONNECTIONS", "12"),
            ("ROUNDING_MODE", "half_even"),
        ]))
        .unwrap();
        assert_eq!(settings.db_max_connections, 12);
        assert_eq!(settings.rounding, RoundingMode::HalfEven);

        assert!(Settings::from_lookup(lookup(&[("JWT_SECRET", "x")])).is_err());
        assert!(Settings::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/flores"),
            ("JWT_SECRET", "x"),
            ("ROUNDING_MODE", "bankers"),
        ]))
        .is_err());
    }
}
