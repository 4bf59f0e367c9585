// src/domain/installments.rs
use chrono::{Months, NaiveDate};

use crate::error::AppError;

pub const MIN_COUNT: i32 = 1;
pub const MAX_COUNT: i32 = 12;

pub const PENDING: &str = "PENDING";
pub const PAID: &str = "PAID";

#[derive(Debug, Clone, PartialEq)]
pub struct InstallmentDraft {
    pub due_date: NaiveDate,
    pub value: f64,
}

/// Splits a sale total into `count` monthly obligations starting at
/// `first_due_date`. The value is a plain equal split (`total / count`)
/// with no remainder reconciliation on the last installment, and due dates
/// follow chrono's native month add (a Jan 31 start clamps to the end of
/// shorter months).
pub fn build_schedule(
    total: f64,
    count: i32,
    first_due_date: NaiveDate,
) -> Result<Vec<InstallmentDraft>, AppError> {
    if !(MIN_COUNT..=MAX_COUNT).contains(&count) {
        return Err(AppError::validation(format!(
            "Installment count must be between {} and {}",
            MIN_COUNT, MAX_COUNT
        )));
    }

    let value = total / count as f64;

    (0..count as u32)
        .map(|i| {
            let due_date = first_due_date
                .checked_add_months(Months::new(i))
                .ok_or_else(|| AppError::validation("First due date is out of range"))?;
            Ok(InstallmentDraft { due_date, value })
        })
        .collect()
}

/// An installment is paid exactly once; there is no unmark. Returns the
/// status to persist, or rejects an already paid installment.
pub fn mark_paid(current: &str) -> Result<&'static str, AppError> {
    if current == PAID {
        return Err(AppError::AlreadyPaid);
    }
    Ok(PAID)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn splits_total_into_monthly_installments() {
        let schedule = build_schedule(120.0, 3, date(2024, 1, 1)).unwrap();

        assert_eq!(schedule.len(), 3);
        assert_eq!(schedule[0].due_date, date(2024, 1, 1));
        assert_eq!(schedule[1].due_date, date(2024, 2, 1));
        assert_eq!(schedule[2].due_date, date(2024, 3, 1));
        assert!(schedule.iter().all(|i| i.value == 40.0));
    }

    #[test]
    fn single_installment_carries_the_whole_total() {
        let schedule = build_schedule(99.9, 1, date(2024, 6, 15)).unwrap();
        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule[0].value, 99.9);
        assert_eq!(schedule[0].due_date, date(2024, 6, 15));
    }

    #[test]
    fn uneven_totals_are_split_without_reconciliation() {
        let schedule = build_schedule(100.0, 3, date(2024, 1, 10)).unwrap();
        for installment in &schedule {
            assert_eq!(installment.value, 100.0 / 3.0);
        }
    }

    #[test]
    fn month_end_start_clamps_in_shorter_months() {
        let schedule = build_schedule(30.0, 3, date(2024, 1, 31)).unwrap();
        assert_eq!(schedule[0].due_date, date(2024, 1, 31));
        assert_eq!(schedule[1].due_date, date(2024, 2, 29));
        assert_eq!(schedule[2].due_date, date(2024, 3, 31));
    }

    #[test]
    fn pending_installment_can_be_paid() {
        assert_eq!(mark_paid(PENDING).unwrap(), PAID);
    }

    #[test]
    fn paying_an_installment_twice_is_rejected() {
        assert!(matches!(mark_paid(PAID), Err(AppError::AlreadyPaid)));
    }

    #[test]
    fn count_outside_bounds_is_rejected() {
        assert!(matches!(
            build_schedule(10.0, 0, date(2024, 1, 1)),
            Err(AppError::ValidationError(_))
        ));
        assert!(matches!(
            build_schedule(10.0, 13, date(2024, 1, 1)),
            Err(AppError::ValidationError(_))
        ));
    }
}
