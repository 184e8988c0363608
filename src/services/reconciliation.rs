// src/services/reconciliation.rs

use crate::{common::error::AppError, models::orders::PaymentType};

/// Saldos derivados do histórico completo de pagamentos de um pedido.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Balances {
    pub deposit_amount: i64,
    pub effective_paid: i64,
    pub remaining_amount: i64,
}

/// Recalcula sinal e saldo a partir de TODOS os pagamentos do pedido.
///
/// Estornos entram como valores positivos do tipo REFUND e reduzem o total
/// pago. Pagamento a mais não vira crédito: o saldo fica travado em zero.
/// Somas que estouram `i64` são recusadas em vez de gravadas.
pub fn reconcile<I>(total_amount: i64, payments: I) -> Result<Balances, AppError>
where
    I: IntoIterator<Item = (PaymentType, i64)>,
{
    let overflow = || AppError::InvalidInput("Soma dos pagamentos fora do limite".into());

    let mut deposit_amount = 0i64;
    let mut effective_paid = 0i64;

    for (payment_type, amount) in payments {
        match payment_type {
            PaymentType::Deposit => {
                deposit_amount = deposit_amount.checked_add(amount).ok_or_else(overflow)?;
                effective_paid = effective_paid.checked_add(amount).ok_or_else(overflow)?;
            }
            PaymentType::Remaining => {
                effective_paid = effective_paid.checked_add(amount).ok_or_else(overflow)?;
            }
            PaymentType::Refund => {
                effective_paid = effective_paid.checked_sub(amount).ok_or_else(overflow)?;
            }
        }
    }

    let due = total_amount.checked_sub(effective_paid).ok_or_else(overflow)?;

    Ok(Balances { deposit_amount, effective_paid, remaining_amount: due.max(0) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use crate::models::orders::PaymentType::*;

    #[test]
    fn deposit_then_refund() {
        let after_deposit = reconcile(400_000, [(Deposit, 100_000)]).unwrap();
        assert_eq!(after_deposit.deposit_amount, 100_000);
        assert_eq!(after_deposit.remaining_amount, 300_000);

        let after_refund = reconcile(400_000, [(Deposit, 100_000), (Refund, 50_000)]).unwrap();
        assert_eq!(after_refund.deposit_amount, 100_000);
        assert_eq!(after_refund.remaining_amount, 350_000);
    }

    #[test]
    fn remaining_payment_settles_the_order() {
        let balances = reconcile(400_000, [(Deposit, 100_000), (Remaining, 300_000)]).unwrap();
        assert_eq!(balances.remaining_amount, 0);
        assert_eq!(balances.effective_paid, 400_000);
    }

    #[test]
    fn overpayment_is_clamped_to_zero() {
        let balances = reconcile(100_000, [(Remaining, 250_000)]).unwrap();
        assert_eq!(balances.remaining_amount, 0);
        assert_eq!(balances.effective_paid, 250_000);
    }

    #[test]
    fn refund_larger_than_payments_leaves_full_total_due() {
        let balances = reconcile(100_000, [(Deposit, 10_000), (Refund, 30_000)]).unwrap();
        assert_eq!(balances.effective_paid, -20_000);
        assert_eq!(balances.remaining_amount, 120_000);
    }

    #[test]
    fn empty_history() {
        assert_eq!(
            reconcile(500, []).unwrap(),
            Balances { deposit_amount: 0, effective_paid: 0, remaining_amount: 500 }
        );
    }

    #[test]
    fn sums_past_i64_are_rejected() {
        let err = reconcile(400_000, [(Remaining, i64::MAX), (Deposit, 1)]).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));

        let err = reconcile(0, [(Refund, i64::MAX), (Refund, 2)]).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));

        // total - pago estoura mesmo com a soma dentro do limite
        assert!(reconcile(i64::MAX, [(Refund, 1)]).is_err());

        let full = reconcile(i64::MAX, [(Remaining, i64::MAX)]).unwrap();
        assert_eq!(full.remaining_amount, 0);
    }

    fn payment() -> impl Strategy<Value = (PaymentType, i64)> {
        (prop_oneof![Just(Deposit), Just(Remaining), Just(Refund)], 1i64..1_000_000)
    }

    fn huge_payment() -> impl Strategy<Value = (PaymentType, i64)> {
        (
            prop_oneof![Just(Deposit), Just(Remaining), Just(Refund)],
            (i64::MAX - 1_000)..=i64::MAX,
        )
    }

    proptest! {
        #[test]
        fn remaining_matches_formula_and_is_never_negative(
            total in 0i64..10_000_000,
            history in prop::collection::vec(payment(), 0..20)
        ) {
            let balances = reconcile(total, history.iter().copied()).unwrap();

            let sum = |kind: PaymentType| -> i64 {
                history.iter().filter(|(t, _)| *t == kind).map(|(_, a)| a).sum()
            };
            let effective = sum(Deposit) + sum(Remaining) - sum(Refund);

            prop_assert_eq!(balances.deposit_amount, sum(Deposit));
            prop_assert_eq!(balances.remaining_amount, (total - effective).max(0));
            prop_assert!(balances.remaining_amount >= 0);
        }

        #[test]
        fn amounts_near_i64_max_never_panic(
            total in 0i64..=i64::MAX,
            history in prop::collection::vec(huge_payment(), 0..4)
        ) {
            // Valor exato em i128 para comparar quando o resultado cabe
            let mut deposit = 0i128;
            let mut effective = 0i128;
            for (kind, amount) in &history {
                let amount = i128::from(*amount);
                match kind {
                    Deposit => {
                        deposit += amount;
                        effective += amount;
                    }
                    Remaining => effective += amount,
                    Refund => effective -= amount,
                }
            }

            match reconcile(total, history.iter().copied()) {
                Ok(balances) => {
                    prop_assert_eq!(i128::from(balances.deposit_amount), deposit);
                    prop_assert_eq!(i128::from(balances.effective_paid), effective);
                    prop_assert_eq!(
                        i128::from(balances.remaining_amount),
                        (i128::from(total) - effective).max(0)
                    );
                }
                Err(AppError::InvalidInput(_)) => {}
                Err(other) => prop_assert!(false, "erro inesperado: {other}"),
            }
        }
    }
}
