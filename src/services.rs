pub mod auth;
pub mod catalog_service;
pub mod customer_service;
pub mod lifecycle;
pub mod order_code;
pub mod order_service;
pub mod pricing;
pub mod reconciliation;

#[cfg(test)]
mod fixtures;
