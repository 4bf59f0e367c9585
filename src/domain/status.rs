// src/domain/status.rs
//
// Read-side status projection. Statuses are derived from the underlying
// quantities on every query and are never stored, so they cannot drift.

use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PurchaseStatus {
    Pending,
    Delivered,
}

impl PurchaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseStatus::Pending => "PENDING",
            PurchaseStatus::Delivered => "DELIVERED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LoanStatus {
    Pending,
    Late,
    Done,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Pending => "PENDING",
            LoanStatus::Late => "LATE",
            LoanStatus::Done => "DONE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SaleStatus {
    Pending,
    Late,
    Paid,
}

impl SaleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Pending => "PENDING",
            SaleStatus::Late => "LATE",
            SaleStatus::Paid => "PAID",
        }
    }
}

/// A purchase is delivered once every line is fully received.
pub fn purchase_status(open_line_count: i64) -> PurchaseStatus {
    if open_line_count == 0 {
        PurchaseStatus::Delivered
    } else {
        PurchaseStatus::Pending
    }
}

/// A loan is done once a sale was created from it or every line is fully
/// returned; an open loan past its due date is late.
pub fn loan_status(
    has_sale: bool,
    open_line_count: i64,
    due_date: NaiveDate,
    today: NaiveDate,
) -> LoanStatus {
    if has_sale || open_line_count == 0 {
        LoanStatus::Done
    } else if due_date < today {
        LoanStatus::Late
    } else {
        LoanStatus::Pending
    }
}

/// `late_count` counts pending installments whose due date has passed.
pub fn sale_status(pending_count: i64, late_count: i64) -> SaleStatus {
    if pending_count == 0 {
        SaleStatus::Paid
    } else if late_count > 0 {
        SaleStatus::Late
    } else {
        SaleStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn purchase_is_delivered_only_when_no_line_is_open() {
        assert_eq!(purchase_status(0), PurchaseStatus::Delivered);
        assert_eq!(purchase_status(1), PurchaseStatus::Pending);
    }

    #[test]
    fn loan_with_sale_is_done_regardless_of_lines_and_dates() {
        let status = loan_status(true, 2, date(2020, 1, 1), date(2024, 1, 1));
        assert_eq!(status, LoanStatus::Done);
    }

    #[test]
    fn fully_returned_loan_is_done() {
        let status = loan_status(false, 0, date(2020, 1, 1), date(2024, 1, 1));
        assert_eq!(status, LoanStatus::Done);
    }

    #[test]
    fn open_loan_past_due_is_late() {
        let status = loan_status(false, 1, date(2024, 1, 1), date(2024, 1, 2));
        assert_eq!(status, LoanStatus::Late);
    }

    #[test]
    fn open_loan_due_today_is_still_pending() {
        let status = loan_status(false, 1, date(2024, 1, 2), date(2024, 1, 2));
        assert_eq!(status, LoanStatus::Pending);
    }

    #[test]
    fn sale_status_follows_its_installments() {
        assert_eq!(sale_status(0, 0), SaleStatus::Paid);
        assert_eq!(sale_status(3, 0), SaleStatus::Pending);
        assert_eq!(sale_status(3, 1), SaleStatus::Late);
    }
}
