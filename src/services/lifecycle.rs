// src/services/lifecycle.rs

use crate::{common::error::AppError, models::orders::OrderStatus};

/// Tabela de transições permitidas a partir de cada status.
///
/// Cancelar só é possível antes do trabalho começar; depois de ASSIGNED o
/// pedido só anda para frente.
pub fn allowed_transitions(from: OrderStatus) -> &'static [OrderStatus] {
    use crate::models::orders::OrderStatus::*;
    match from {
        New | Confirming => &[Assigned, Cancelled],
        Assigned => &[InProgress],
        InProgress => &[Ready],
        Ready => &[Completed],
        Completed | Cancelled => &[],
    }
}

pub fn is_terminal(status: OrderStatus) -> bool {
    allowed_transitions(status).is_empty()
}

/// Valida uma transição pedida pelo usuário.
///
/// `Ok(false)` quando o pedido já está no status pedido (nada a gravar),
/// `Ok(true)` quando a transição é válida e precisa ser persistida.
pub fn check_transition(from: OrderStatus, to: OrderStatus) -> Result<bool, AppError> {
    if from == to {
        return Ok(false);
    }
    if allowed_transitions(from).contains(&to) {
        Ok(true)
    } else {
        Err(AppError::InvalidTransition { from, to })
    }
}

/// Efeito colateral da designação de um florista. Não passa pela tabela acima.
pub fn status_after_assignment(current: OrderStatus) -> OrderStatus {
    match current {
        OrderStatus::New | OrderStatus::Confirming => OrderStatus::Assigned,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::orders::OrderStatus::*;

    #[test]
    fn happy_path_to_completed() {
        let path = [New, Assigned, InProgress, Ready, Completed];
        for pair in path.windows(2) {
            assert_eq!(check_transition(pair[0], pair[1]).unwrap(), true);
        }
        assert!(is_terminal(Completed));
        assert!(is_terminal(Cancelled));
    }

    #[test]
    fn every_pair_matches_the_table() {
        for from in OrderStatus::ALL {
            for to in OrderStatus::ALL {
                let result = check_transition(from, to);
                if from == to {
                    assert!(matches!(result, Ok(false)), "{from:?} -> {to:?}");
                } else if allowed_transitions(from).contains(&to) {
                    assert!(matches!(result, Ok(true)), "{from:?} -> {to:?}");
                } else {
                    assert!(
                        matches!(result, Err(AppError::InvalidTransition { .. })),
                        "{from:?} -> {to:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn cannot_cancel_once_work_started() {
        for from in [InProgress, Ready, Completed] {
            assert!(check_transition(from, Cancelled).is_err());
        }
        assert!(check_transition(New, Cancelled).unwrap());
        assert!(check_transition(Confirming, Cancelled).unwrap());
    }

    #[test]
    fn skipping_steps_is_rejected() {
        assert!(check_transition(New, Ready).is_err());
        assert!(check_transition(Assigned, Completed).is_err());
        assert!(check_transition(Cancelled, New).is_err());
    }

    #[test]
    fn assignment_only_advances_open_orders() {
        assert_eq!(status_after_assignment(New), Assigned);
        assert_eq!(status_after_assignment(Confirming), Assigned);
        assert_eq!(status_after_assignment(InProgress), InProgress);
        assert_eq!(status_after_assignment(Assigned), Assigned);
        assert_eq!(status_after_assignment(Cancelled), Cancelled);
    }
}
