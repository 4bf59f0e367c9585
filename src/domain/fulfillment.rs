// src/domain/fulfillment.rs
//
// Shared arithmetic for partially fulfilled lines: a purchase line's
// ordered/received pair and a loan line's lent/returned pair follow the
// same rule, so both workflows go through `advance`.

use crate::error::AppError;

pub fn remaining(total_qty: i32, fulfilled_qty: i32) -> i32 {
    total_qty - fulfilled_qty
}

/// Computes the new fulfilled quantity after receiving/returning `qty`
/// units. Fulfilled quantities only ever increase.
pub fn advance(total_qty: i32, fulfilled_qty: i32, qty: i32) -> Result<i32, AppError> {
    if qty <= 0 {
        return Err(AppError::validation("Quantity must be greater than 0"));
    }

    let outstanding = remaining(total_qty, fulfilled_qty);
    if qty > outstanding {
        return Err(AppError::ExceedsRemaining {
            remaining: outstanding,
            requested: qty,
        });
    }

    Ok(fulfilled_qty + qty)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_fulfillment_advances() {
        assert_eq!(advance(5, 0, 3).unwrap(), 3);
        assert_eq!(advance(5, 3, 2).unwrap(), 5);
    }

    #[test]
    fn exceeding_the_outstanding_amount_is_rejected() {
        // ordered 5, received 3: only 2 remain
        match advance(5, 3, 3) {
            Err(AppError::ExceedsRemaining { remaining, requested }) => {
                assert_eq!(remaining, 2);
                assert_eq!(requested, 3);
            }
            other => panic!("expected ExceedsRemaining, got {:?}", other),
        }
    }

    #[test]
    fn fully_fulfilled_line_accepts_nothing() {
        assert!(matches!(
            advance(4, 4, 1),
            Err(AppError::ExceedsRemaining { remaining: 0, .. })
        ));
    }

    #[test]
    fn zero_and_negative_quantities_are_rejected() {
        assert!(matches!(advance(5, 0, 0), Err(AppError::ValidationError(_))));
        assert!(matches!(advance(5, 0, -2), Err(AppError::ValidationError(_))));
    }
}
