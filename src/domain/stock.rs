// src/domain/stock.rs
use std::collections::HashMap;

use sqlx::PgConnection;

use crate::error::AppError;

/// The single mutation path for a product's quantity on hand.
///
/// Applies a signed delta with a conditional update so the `stock >= 0`
/// invariant holds even when the caller skipped a pre-check. Must be called
/// on the transaction that carries the line-level change that triggered it.
pub async fn adjust(
    conn: &mut PgConnection,
    product_id: &str,
    delta: i32,
) -> Result<i32, AppError> {
    let updated = sqlx::query_scalar::<_, i32>(
        "UPDATE products SET stock = stock + $2
         WHERE id = $1 AND stock + $2 >= 0
         RETURNING stock",
    )
    .bind(product_id)
    .bind(delta)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(stock) = updated {
        return Ok(stock);
    }

    // No row matched: either the product is gone or the debit was too large.
    let current = sqlx::query_scalar::<_, i32>("SELECT stock FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_optional(&mut *conn)
        .await?;

    match current {
        Some(available) => Err(AppError::OutOfStock {
            product_id: product_id.to_string(),
            available,
            requested: -delta,
        }),
        None => Err(AppError::not_found(format!("Product {} not found", product_id))),
    }
}

/// Stock levels read in one query, used to validate every line of a
/// multi-line debit before any delta is applied.
pub struct StockSnapshot {
    levels: HashMap<String, i32>,
}

impl StockSnapshot {
    pub fn new(levels: impl IntoIterator<Item = (String, i32)>) -> Self {
        Self {
            levels: levels.into_iter().collect(),
        }
    }

    /// Reads and row-locks the products so concurrent debits serialize on
    /// the same transaction isolation the adjust path relies on.
    pub async fn lock_and_read(
        conn: &mut PgConnection,
        product_ids: &[String],
    ) -> Result<Self, AppError> {
        let rows = sqlx::query_as::<_, (String, i32)>(
            "SELECT id, stock FROM products WHERE id = ANY($1) FOR UPDATE",
        )
        .bind(product_ids.to_vec())
        .fetch_all(&mut *conn)
        .await?;

        Ok(Self::new(rows))
    }

    pub fn available(&self, product_id: &str) -> Option<i32> {
        self.levels.get(product_id).copied()
    }

    /// Validates one demand against the snapshot.
    pub fn ensure_available(&self, product_id: &str, qty: i32) -> Result<(), AppError> {
        let available = self
            .available(product_id)
            .ok_or_else(|| AppError::not_found(format!("Product {} not found", product_id)))?;

        if qty > available {
            return Err(AppError::OutOfStock {
                product_id: product_id.to_string(),
                available,
                requested: qty,
            });
        }
        Ok(())
    }

    /// All-or-nothing check: the first failing line aborts the whole
    /// operation before any stock delta is written.
    pub fn ensure_all_available<'a>(
        &self,
        demands: impl IntoIterator<Item = (&'a str, i32)>,
    ) -> Result<(), AppError> {
        for (product_id, qty) in demands {
            self.ensure_available(product_id, qty)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> StockSnapshot {
        StockSnapshot::new([("milk".to_string(), 10), ("bread".to_string(), 0)])
    }

    #[test]
    fn demand_within_stock_passes() {
        assert!(snapshot().ensure_available("milk", 10).is_ok());
    }

    #[test]
    fn demand_beyond_stock_is_out_of_stock() {
        match snapshot().ensure_available("milk", 11) {
            Err(AppError::OutOfStock { available, requested, .. }) => {
                assert_eq!(available, 10);
                assert_eq!(requested, 11);
            }
            other => panic!("expected OutOfStock, got {:?}", other),
        }
    }

    #[test]
    fn demand_on_empty_stock_is_out_of_stock() {
        assert!(matches!(
            snapshot().ensure_available("bread", 1),
            Err(AppError::OutOfStock { .. })
        ));
    }

    #[test]
    fn unknown_product_is_not_found() {
        assert!(matches!(
            snapshot().ensure_available("eggs", 1),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn multi_line_check_fails_as_a_whole() {
        let demands = [("milk", 5), ("bread", 1)];
        assert!(matches!(
            snapshot().ensure_all_available(demands),
            Err(AppError::OutOfStock { .. })
        ));
    }

    #[test]
    fn multi_line_check_passes_when_every_line_fits() {
        let demands = [("milk", 5), ("milk", 5)];
        // Lines are validated against the same snapshot, not a running total.
        assert!(snapshot().ensure_all_available(demands).is_ok());
    }
}
