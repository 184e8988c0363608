// src/services/pricing.rs

use rust_decimal::{prelude::ToPrimitive, Decimal, RoundingStrategy};
use serde::Deserialize;

use crate::{common::error::AppError, models::orders::OrderStatus};

/// Como arredondar `qty * unit_price` para a unidade mínima da moeda.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingMode {
    /// Padrão de PDV: 0,5 sobe (valores de linha nunca são negativos).
    #[default]
    HalfUp,
    HalfEven,
}

impl RoundingMode {
    fn strategy(self) -> RoundingStrategy {
        match self {
            RoundingMode::HalfUp => RoundingStrategy::MidpointAwayFromZero,
            RoundingMode::HalfEven => RoundingStrategy::MidpointNearestEven,
        }
    }
}

impl std::str::FromStr for RoundingMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "half_up" => Ok(RoundingMode::HalfUp),
            "half_even" => Ok(RoundingMode::HalfEven),
            other => Err(AppError::InvalidInput(format!("ROUNDING_MODE desconhecido: {other}"))),
        }
    }
}

// Limites de `order_items.qty NUMERIC(12, 3)`: a quantidade precificada é
// exatamente a que fica gravada.
const QTY_SCALE: u32 = 3;
const QTY_LIMIT: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// Configuração de preço passada explicitamente ao montador de pedidos.
#[derive(Debug, Clone, Copy, Default)]
pub struct PricingConfig {
    pub rounding: RoundingMode,
}

/// Totais calculados na criação do pedido.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTotals {
    pub total_amount: i64,
    pub deposit_amount: i64,
    pub remaining_amount: i64,
    pub status: OrderStatus,
}

impl PricingConfig {
    pub fn new(rounding: RoundingMode) -> Self {
        Self { rounding }
    }

    /// Regras de entrada do item: quantidade positiva, com no máximo 3 casas
    /// e abaixo de 10^9, preço não negativo.
    pub fn validate_line(&self, qty: Decimal, unit_price: i64) -> Result<(), AppError> {
        if qty <= Decimal::ZERO {
            return Err(AppError::InvalidInput(
                "A quantidade do item deve ser maior que zero".into(),
            ));
        }
        if qty.normalize().scale() > QTY_SCALE {
            return Err(AppError::InvalidInput(format!(
                "A quantidade do item aceita no máximo {QTY_SCALE} casas decimais"
            )));
        }
        if qty >= QTY_LIMIT {
            return Err(AppError::InvalidInput(
                "A quantidade do item está fora do limite".into(),
            ));
        }
        if unit_price < 0 {
            return Err(AppError::InvalidInput(
                "O preço unitário não pode ser negativo".into(),
            ));
        }
        Ok(())
    }

    pub fn line_total(&self, qty: Decimal, unit_price: i64) -> Result<i64, AppError> {
        self.validate_line(qty, unit_price)?;

        let overflow = || AppError::InvalidItem("Valor da linha fora do limite".into());
        let raw = qty
            .checked_mul(Decimal::from(unit_price))
            .ok_or_else(overflow)?;

        raw.round_dp_with_strategy(0, self.rounding.strategy())
            .to_i64()
            .ok_or_else(overflow)
    }

    /// Soma as linhas e decide sinal, saldo e status inicial.
    ///
    /// `line_totals == None` (ou vazio) é um pedido ainda em negociação:
    /// tudo zerado e status `CONFIRMING`.
    pub fn order_totals(
        &self,
        line_totals: Option<&[i64]>,
        requested_deposit: i64,
    ) -> Result<OrderTotals, AppError> {
        if requested_deposit < 0 {
            return Err(AppError::InvalidInput("O sinal não pode ser negativo".into()));
        }

        let lines = line_totals.filter(|lines| !lines.is_empty());

        let Some(lines) = lines else {
            if requested_deposit > 0 {
                return Err(AppError::InvalidOrder(
                    "O sinal não pode exceder o total do pedido".into(),
                ));
            }
            return Ok(OrderTotals {
                total_amount: 0,
                deposit_amount: 0,
                remaining_amount: 0,
                status: OrderStatus::Confirming,
            });
        };

        let total_amount = lines
            .iter()
            .try_fold(0i64, |acc, line| acc.checked_add(*line))
            .ok_or_else(|| AppError::InvalidOrder("Total do pedido fora do limite".into()))?;

        if total_amount <= 0 {
            return Err(AppError::InvalidOrder(
                "O total do pedido deve ser positivo quando há itens".into(),
            ));
        }
        if requested_deposit > total_amount {
            return Err(AppError::InvalidOrder(
                "O sinal não pode exceder o total do pedido".into(),
            ));
        }

        Ok(OrderTotals {
            total_amount,
            deposit_amount: requested_deposit,
            remaining_amount: (total_amount - requested_deposit).max(0),
            status: OrderStatus::New,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn pricing() -> PricingConfig {
        PricingConfig::default()
    }

    #[test]
    fn two_bouquets_at_200k() {
        let p = pricing();
        let line = p.line_total(dec!(2), 200_000).unwrap();
        let totals = p.order_totals(Some(&[line][..]), 0).unwrap();

        assert_eq!(line, 400_000);
        assert_eq!(totals.total_amount, 400_000);
        assert_eq!(totals.remaining_amount, 400_000);
        assert_eq!(totals.deposit_amount, 0);
        assert_eq!(totals.status, OrderStatus::New);
    }

    #[test]
    fn half_up_rounds_midpoint_up() {
        let p = pricing();
        assert_eq!(p.line_total(dec!(0.5), 3).unwrap(), 2);
        assert_eq!(p.line_total(dec!(1.5), 1).unwrap(), 2);
        assert_eq!(p.line_total(dec!(2.5), 1).unwrap(), 3);
        assert_eq!(p.line_total(dec!(0.333), 10).unwrap(), 3);
    }

    #[test]
    fn half_even_is_configurable() {
        let p = PricingConfig::new(RoundingMode::HalfEven);
        assert_eq!(p.line_total(dec!(2.5), 1).unwrap(), 2);
        assert_eq!(p.line_total(dec!(3.5), 1).unwrap(), 4);
    }

    #[test]
    fn rejects_non_positive_qty_and_negative_price() {
        let p = pricing();
        assert!(matches!(p.line_total(dec!(0), 100), Err(AppError::InvalidInput(_))));
        assert!(matches!(p.line_total(dec!(-1), 100), Err(AppError::InvalidInput(_))));
        assert!(matches!(p.line_total(dec!(1), -1), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn qty_must_fit_the_stored_precision() {
        let p = pricing();
        assert!(matches!(p.line_total(dec!(1.0004), 10_000), Err(AppError::InvalidInput(_))));
        // Zeros à direita não contam como casas extras
        assert_eq!(p.line_total(dec!(1.25000), 10_000).unwrap(), 12_500);
        assert_eq!(p.line_total(dec!(0.001), 10_000).unwrap(), 10);
    }

    #[test]
    fn qty_above_the_column_range_is_a_client_error() {
        let p = pricing();
        let err = p.line_total(dec!(5000000000), 1).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert!(err.status_code().is_client_error());
        assert!(p.line_total(dec!(1000000000), 1).is_err());
        assert_eq!(p.line_total(dec!(999999999.999), 1).unwrap(), 1_000_000_000);
    }

    #[test]
    fn no_items_means_confirming_and_zero_totals() {
        let p = pricing();
        for lines in [None, Some(&[][..])] {
            let totals = p.order_totals(lines, 0).unwrap();
            assert_eq!(totals.status, OrderStatus::Confirming);
            assert_eq!(
                (totals.total_amount, totals.deposit_amount, totals.remaining_amount),
                (0, 0, 0)
            );
        }
    }

    #[test]
    fn zero_valued_items_are_rejected() {
        let p = pricing();
        let line = p.line_total(dec!(3), 0).unwrap();
        assert!(matches!(p.order_totals(Some(&[line][..]), 0), Err(AppError::InvalidOrder(_))));
    }

    #[test]
    fn deposit_cannot_exceed_total() {
        let p = pricing();
        assert!(matches!(p.order_totals(Some(&[1000][..]), 1001), Err(AppError::InvalidOrder(_))));
        assert!(matches!(p.order_totals(None, 1), Err(AppError::InvalidOrder(_))));

        let totals = p.order_totals(Some(&[1000][..]), 1000).unwrap();
        assert_eq!(totals.remaining_amount, 0);
    }

    #[test]
    fn rounding_mode_parses_from_env_value() {
        assert_eq!("half_up".parse::<RoundingMode>().unwrap(), RoundingMode::HalfUp);
        assert_eq!(" HALF_EVEN ".parse::<RoundingMode>().unwrap(), RoundingMode::HalfEven);
        assert!("bankers".parse::<RoundingMode>().is_err());
    }

    proptest! {
        #[test]
        fn total_is_sum_of_rounded_lines(
            lines in prop::collection::vec((1i64..100_000, 1i64..1_000_000), 1..8)
        ) {
            let p = pricing();
            let mut expected = 0i64;
            let mut totals = Vec::new();
            for (qty_milli, price) in &lines {
                let qty = Decimal::new(*qty_milli, 3);
                let line = p.line_total(qty, *price).unwrap();
                let exact = qty * Decimal::from(*price);
                prop_assert!((Decimal::from(line) - exact).abs() <= dec!(0.5));
                expected += line;
                totals.push(line);
            }

            if expected > 0 {
                let result = p.order_totals(Some(totals.as_slice()), 0).unwrap();
                prop_assert_eq!(result.total_amount, expected);
                prop_assert_eq!(result.status, OrderStatus::New);
            }
        }

        #[test]
        fn deposit_never_exceeds_total(total in 1i64..10_000_000, deposit in 0i64..20_000_000) {
            let p = pricing();
            match p.order_totals(Some(&[total][..]), deposit) {
                Ok(t) => {
                    prop_assert!(t.deposit_amount <= t.total_amount);
                    prop_assert_eq!(t.remaining_amount, t.total_amount - t.deposit_amount);
                }
                Err(AppError::InvalidOrder(_)) => prop_assert!(deposit > total),
                Err(other) => prop_assert!(false, "erro inesperado: {other}"),
            }
        }
    }
}
