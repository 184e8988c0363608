// src/middleware/rbac.rs

use axum::{extract::FromRequestParts, http::request::Parts};
use std::marker::PhantomData;

use crate::{
    common::error::AppError,
    middleware::auth::AuthenticatedUser,
    models::auth::{User, UserRole},
};

/// 1. O Trait que define quem pode executar uma ação
pub trait RoleSet: Send + Sync + 'static {
    fn roles() -> &'static [UserRole];

    fn allows(role: UserRole) -> bool {
        Self::roles().contains(&role)
    }
}

/// 2. O Extractor (Guardião). Entrega o usuário já autorizado ao handler.
pub struct RequireRole<T> {
    pub user: User,
    _roles: PhantomData<T>,
}

// 3. Implementação do FromRequestParts
impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleSet,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(user) = AuthenticatedUser::from_request_parts(parts, state).await?;

        if !T::allows(user.role) {
            tracing::warn!(user_id = user.id, role = ?user.role, "Acesso negado pelo papel");
            return Err(AppError::Forbidden);
        }

        Ok(RequireRole { user, _roles: PhantomData })
    }
}

// ---
// DEFINIÇÃO DOS GRUPOS (TIPOS)
// ---

pub struct OrderCreators;
impl RoleSet for OrderCreators {
    fn roles() -> &'static [UserRole] {
        &[UserRole::Sale, UserRole::Boss, UserRole::Admin, UserRole::Florist]
    }
}

pub struct Managers;
impl RoleSet for Managers {
    fn roles() -> &'static [UserRole] {
        &[UserRole::Boss, UserRole::Admin]
    }
}

pub struct Cashiers;
impl RoleSet for Cashiers {
    fn roles() -> &'static [UserRole] {
        &[UserRole::Sale, UserRole::Boss, UserRole::Admin]
    }
}

pub struct CatalogEditors;
impl RoleSet for CatalogEditors {
    fn roles() -> &'static [UserRole] {
        &[UserRole::Admin, UserRole::Boss]
    }
}
