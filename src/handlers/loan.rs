// src/handlers/loan.rs
use std::collections::{HashMap, HashSet};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use sqlx::PgPool;

use crate::domain::{fulfillment, status, stock};
use crate::dtos::loan::{
    CreateLoanRequest, LoanItemResponse, LoanListItem, LoanResponse, ReturnItemRequest,
    UpdateLoanRequest,
};
use crate::error::AppError;
use crate::models::loan::LoanItem;
use crate::state::AppState;

// ==================== Create Loan ====================

pub async fn create_loan(
    State(AppState { db_pool }): State<AppState>,
    Json(req): Json<CreateLoanRequest>,
) -> Result<(StatusCode, Json<LoanResponse>), AppError> {
    if req.items.is_empty() {
        return Err(AppError::validation("Loan must contain at least one item"));
    }

    let mut seen = HashSet::new();
    for item in &req.items {
        if !seen.insert(item.product_id.as_str()) {
            return Err(AppError::validation("Duplicate product in loan items"));
        }
        if item.quantity <= 0 {
            return Err(AppError::validation("Quantity must be greater than 0"));
        }
        if item.unit_price < 0.0 {
            return Err(AppError::validation("Unit price cannot be negative"));
        }
    }

    let mut tx = db_pool.begin().await?;

    sqlx::query_as::<_, (String,)>("SELECT id FROM customers WHERE id = $1")
        .bind(&req.customer_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found("Customer not found"))?;

    // All-or-nothing: lock and snapshot every product, validate every line
    // against the snapshot, and only then debit. The first failing line
    // aborts with nothing written.
    let product_ids: Vec<String> = req.items.iter().map(|i| i.product_id.clone()).collect();
    let snapshot = stock::StockSnapshot::lock_and_read(&mut *tx, &product_ids).await?;
    snapshot.ensure_all_available(
        req.items.iter().map(|i| (i.product_id.as_str(), i.quantity)),
    )?;

    let (loan_id,) = sqlx::query_as::<_, (String,)>(
        "INSERT INTO loans (customer_id, due_date) VALUES ($1, $2) RETURNING id",
    )
    .bind(&req.customer_id)
    .bind(req.due_date)
    .fetch_one(&mut *tx)
    .await?;

    for item in &req.items {
        sqlx::query(
            "INSERT INTO loan_items (loan_id, product_id, lent_qty, unit_price)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(&loan_id)
        .bind(&item.product_id)
        .bind(item.quantity)
        .bind(item.unit_price)
        .execute(&mut *tx)
        .await?;

        stock::adjust(&mut *tx, &item.product_id, -item.quantity).await?;
    }

    tx.commit().await?;

    let loan = fetch_loan_by_id(&db_pool, &loan_id).await?;
    Ok((StatusCode::CREATED, Json(loan)))
}

// ==================== List Loans ====================

pub async fn list_loans(
    State(AppState { db_pool }): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<LoanListItem>>, AppError> {
    let customer_id = params.get("customer_id");
    let status_filter = params.get("status").map(|s| s.to_uppercase());
    let today = Utc::now().date_naive();

    let mut query_str = String::from(
        "SELECT l.id, c.name, l.due_date, l.created_at, s.id AS sale_id,
            (SELECT COUNT(*) FROM loan_items li
             WHERE li.loan_id = l.id AND li.returned_qty < li.lent_qty) AS open_lines
         FROM loans l
         JOIN customers c ON l.customer_id = c.id
         LEFT JOIN sales s ON s.loan_id = l.id",
    );
    if customer_id.is_some() {
        query_str.push_str(" WHERE l.customer_id = $1");
    }
    query_str.push_str(" ORDER BY l.created_at DESC");

    type Row = (
        String,
        String,
        chrono::NaiveDate,
        chrono::DateTime<chrono::Utc>,
        Option<String>,
        i64,
    );
    let mut query = sqlx::query_as::<_, Row>(&query_str);
    if let Some(cid) = customer_id {
        query = query.bind(cid);
    }

    let rows = query.fetch_all(&db_pool).await?;

    let loans = rows
        .into_iter()
        .map(|(id, customer_name, due_date, created_at, sale_id, open_lines)| LoanListItem {
            id,
            customer_name,
            due_date,
            status: status::loan_status(sale_id.is_some(), open_lines, due_date, today),
            created_at,
        })
        .filter(|l| match &status_filter {
            Some(want) => l.status.as_str() == want,
            None => true,
        })
        .collect();

    Ok(Json(loans))
}

// ==================== Get Loan ====================

pub async fn get_loan(
    State(AppState { db_pool }): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LoanResponse>, AppError> {
    fetch_loan_by_id(&db_pool, &id).await.map(Json)
}

// ==================== Update Loan ====================

// Header-level edit. The due date feeds the LATE projection; lines are
// managed through the return endpoints.
pub async fn update_loan(
    State(AppState { db_pool }): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateLoanRequest>,
) -> Result<Json<LoanResponse>, AppError> {
    let mut tx = db_pool.begin().await?;

    // Header edits are allowed even after conversion; the sale link and the
    // lines are untouched.
    let _ = lock_loan(&mut tx, &id).await?;

    sqlx::query_as::<_, (String,)>("SELECT id FROM customers WHERE id = $1")
        .bind(&req.customer_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found("Customer not found"))?;

    sqlx::query("UPDATE loans SET customer_id = $2, due_date = $3 WHERE id = $1")
        .bind(&id)
        .bind(&req.customer_id)
        .bind(req.due_date)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    fetch_loan_by_id(&db_pool, &id).await.map(Json)
}

// ==================== Return Item ====================

pub async fn return_item(
    State(AppState { db_pool }): State<AppState>,
    Path((loan_id, product_id)): Path<(String, String)>,
    Json(req): Json<ReturnItemRequest>,
) -> Result<Json<LoanItemResponse>, AppError> {
    let mut tx = db_pool.begin().await?;

    let sale_id = lock_loan(&mut tx, &loan_id).await?;
    if sale_id.is_some() {
        return Err(AppError::ConvertedToSale);
    }

    let (product_name, lent_qty, returned_qty, unit_price) =
        sqlx::query_as::<_, (String, i32, i32, f64)>(
            "SELECT p.name, li.lent_qty, li.returned_qty, li.unit_price
             FROM loan_items li
             JOIN products p ON li.product_id = p.id
             WHERE li.loan_id = $1 AND li.product_id = $2
             FOR UPDATE OF li",
        )
        .bind(&loan_id)
        .bind(&product_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found("Loan item not found"))?;

    let new_returned = fulfillment::advance(lent_qty, returned_qty, req.quantity)?;

    sqlx::query(
        "UPDATE loan_items SET returned_qty = $3
         WHERE loan_id = $1 AND product_id = $2",
    )
    .bind(&loan_id)
    .bind(&product_id)
    .bind(new_returned)
    .execute(&mut *tx)
    .await?;

    // Returned goods go back on hand in the same transaction.
    stock::adjust(&mut *tx, &product_id, req.quantity).await?;

    tx.commit().await?;

    Ok(Json(LoanItemResponse {
        product_id,
        product_name,
        lent_qty,
        returned_qty: new_returned,
        remaining_qty: fulfillment::remaining(lent_qty, new_returned),
        unit_price,
    }))
}

// ==================== Return All ====================

// Bulk confirmation that every outstanding item came back. Credits the
// remainder per line, not the full lent quantity, so lines already partly
// returned are not double-credited.
pub async fn return_all(
    State(AppState { db_pool }): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LoanResponse>, AppError> {
    let mut tx = db_pool.begin().await?;

    let sale_id = lock_loan(&mut tx, &id).await?;
    if sale_id.is_some() {
        return Err(AppError::ConvertedToSale);
    }

    let items = sqlx::query_as::<_, (String, i32, i32)>(
        "SELECT product_id, lent_qty, returned_qty FROM loan_items
         WHERE loan_id = $1
         FOR UPDATE",
    )
    .bind(&id)
    .fetch_all(&mut *tx)
    .await?;

    let outstanding: Vec<(String, i32)> = items
        .into_iter()
        .filter_map(|(product_id, lent, returned)| {
            let remaining = fulfillment::remaining(lent, returned);
            (remaining > 0).then_some((product_id, remaining))
        })
        .collect();

    if outstanding.is_empty() {
        return Err(AppError::validation("Loan is already fully returned"));
    }

    for (product_id, remaining) in &outstanding {
        sqlx::query(
            "UPDATE loan_items SET returned_qty = lent_qty
             WHERE loan_id = $1 AND product_id = $2",
        )
        .bind(&id)
        .bind(product_id)
        .execute(&mut *tx)
        .await?;

        stock::adjust(&mut *tx, product_id, *remaining).await?;
    }

    tx.commit().await?;

    fetch_loan_by_id(&db_pool, &id).await.map(Json)
}

// ==================== Delete Loan ====================

pub async fn delete_loan(
    State(AppState { db_pool }): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let mut tx = db_pool.begin().await?;

    let sale_id = lock_loan(&mut tx, &id).await?;
    if sale_id.is_some() {
        return Err(AppError::ConvertedToSale);
    }

    let returned_lines = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM loan_items WHERE loan_id = $1 AND returned_qty > 0",
    )
    .bind(&id)
    .fetch_one(&mut *tx)
    .await?;

    if returned_lines > 0 {
        return Err(AppError::HasReturnedItems);
    }

    // Reverse the debit made at creation, then drop the loan.
    let items = sqlx::query_as::<_, (String, i32)>(
        "SELECT product_id, lent_qty FROM loan_items WHERE loan_id = $1",
    )
    .bind(&id)
    .fetch_all(&mut *tx)
    .await?;

    for (product_id, lent_qty) in &items {
        stock::adjust(&mut *tx, product_id, *lent_qty).await?;
    }

    sqlx::query("DELETE FROM loans WHERE id = $1")
        .bind(&id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

// Locks the loan row and resolves its linked sale id, if any.
pub(crate) async fn lock_loan(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    loan_id: &str,
) -> Result<Option<String>, AppError> {
    sqlx::query_as::<_, (String,)>("SELECT id FROM loans WHERE id = $1 FOR UPDATE")
        .bind(loan_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::not_found("Loan not found"))?;

    let sale_id = sqlx::query_scalar::<_, String>("SELECT id FROM sales WHERE loan_id = $1")
        .bind(loan_id)
        .fetch_optional(&mut **tx)
        .await?;

    Ok(sale_id)
}

// Helper to build the full loan detail response
async fn fetch_loan_by_id(db_pool: &PgPool, id: &str) -> Result<LoanResponse, AppError> {
    type Header = (
        String,
        String,
        String,
        chrono::NaiveDate,
        chrono::DateTime<chrono::Utc>,
        Option<String>,
    );
    let (loan_id, customer_id, customer_name, due_date, created_at, sale_id) =
        sqlx::query_as::<_, Header>(
            "SELECT l.id, l.customer_id, c.name, l.due_date, l.created_at, s.id AS sale_id
             FROM loans l
             JOIN customers c ON l.customer_id = c.id
             LEFT JOIN sales s ON s.loan_id = l.id
             WHERE l.id = $1",
        )
        .bind(id)
        .fetch_optional(db_pool)
        .await?
        .ok_or_else(|| AppError::not_found("Loan not found"))?;

    let items = sqlx::query_as::<_, LoanItem>(
        "SELECT li.product_id, p.name AS product_name, li.lent_qty, li.returned_qty,
                li.unit_price
         FROM loan_items li
         JOIN products p ON li.product_id = p.id
         WHERE li.loan_id = $1
         ORDER BY p.name",
    )
    .bind(id)
    .fetch_all(db_pool)
    .await?;

    let open_lines = items
        .iter()
        .filter(|i| i.returned_qty < i.lent_qty)
        .count() as i64;
    let today = Utc::now().date_naive();

    Ok(LoanResponse {
        id: loan_id,
        customer_id,
        customer_name,
        due_date,
        status: status::loan_status(sale_id.is_some(), open_lines, due_date, today),
        sale_id,
        created_at,
        items: items
            .into_iter()
            .map(|i| LoanItemResponse {
                remaining_qty: fulfillment::remaining(i.lent_qty, i.returned_qty),
                product_id: i.product_id,
                product_name: i.product_name,
                lent_qty: i.lent_qty,
                returned_qty: i.returned_qty,
                unit_price: i.unit_price,
            })
            .collect(),
    })
}
