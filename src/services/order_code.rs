// src/services/order_code.rs

use rand::RngCore;

use crate::common::error::AppError;

pub const MAX_CODE_ATTEMPTS: usize = 10;

/// Gera o código curto do pedido (6 hex maiúsculos, ex: "A1B2C3").
///
/// A unicidade é verificada pelo serviço contra a tabela `orders`; o índice
/// único é a garantia final. Todas as tentativas (código já existente ou
/// conflito no INSERT) consomem o mesmo limite.
#[derive(Debug, Clone)]
pub struct OrderCodeGenerator {
    max_attempts: usize,
}

impl Default for OrderCodeGenerator {
    fn default() -> Self {
        Self::new(MAX_CODE_ATTEMPTS)
    }
}

impl OrderCodeGenerator {
    pub fn new(max_attempts: usize) -> Self {
        Self { max_attempts }
    }

    pub fn candidate(&self) -> String {
        let mut bytes = [0u8; 3];
        rand::thread_rng().fill_bytes(&mut bytes);
        bytes.iter().map(|b| format!("{b:02X}")).collect()
    }

    /// Uma sequência finita de candidatos, um por tentativa.
    pub fn attempts(&self) -> impl Iterator<Item = String> + '_ {
        (0..self.max_attempts).map(|_| self.candidate())
    }

    /// Esgotou as tentativas: é falha do sistema, não do cliente.
    pub fn exhausted(&self) -> AppError {
        tracing::error!(
            attempts = self.max_attempts,
            "🔥 Não foi possível gerar um código de pedido único"
        );
        AppError::CodeGenerationExhausted {
            attempts: self.max_attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn codes_are_six_upper_hex_chars() {
        let generator = OrderCodeGenerator::default();
        for _ in 0..200 {
            let code = generator.candidate();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
        }
    }

    #[test]
    fn attempts_are_bounded() {
        assert_eq!(OrderCodeGenerator::default().attempts().count(), MAX_CODE_ATTEMPTS);
        assert_eq!(OrderCodeGenerator::new(3).attempts().count(), 3);
    }

    #[test]
    fn exhaustion_is_reported_as_a_server_side_failure() {
        let err = OrderCodeGenerator::default().exhausted();
        assert!(matches!(err, AppError::CodeGenerationExhausted { attempts: 10 }));
        assert!(err.status_code().is_server_error());
    }

    #[test]
    fn candidates_rarely_collide() {
        let generator = OrderCodeGenerator::default();
        let distinct: HashSet<String> = (0..50).map(|_| generator.candidate()).collect();
        assert!(distinct.len() >= 45);
    }
}
