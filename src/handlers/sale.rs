// src/handlers/sale.rs
use std::collections::{HashMap, HashSet};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};

use crate::domain::{fulfillment, installments, status, stock};
use crate::dtos::sale::{
    CreateSaleFromLoanRequest, CreateSaleRequest, InstallmentResponse, PayInstallmentRequest,
    SaleItemResponse, SaleListItem, SaleResponse, UpdateSaleRequest,
};
use crate::error::AppError;
use crate::handlers::loan::lock_loan;
use crate::models::sale::{Installment, SaleItem};
use crate::state::AppState;

// ==================== Create Direct Sale ====================

pub async fn create_sale(
    State(AppState { db_pool }): State<AppState>,
    Json(req): Json<CreateSaleRequest>,
) -> Result<(StatusCode, Json<SaleResponse>), AppError> {
    if req.items.is_empty() {
        return Err(AppError::validation("Sale must contain at least one item"));
    }

    let mut seen = HashSet::new();
    for item in &req.items {
        if !seen.insert(item.product_id.as_str()) {
            return Err(AppError::validation("Duplicate product in sale items"));
        }
        if item.quantity <= 0 {
            return Err(AppError::validation("Quantity must be greater than 0"));
        }
        if item.unit_price < 0.0 {
            return Err(AppError::validation("Unit price cannot be negative"));
        }
    }

    let total: f64 = req
        .items
        .iter()
        .map(|i| i.quantity as f64 * i.unit_price)
        .sum();
    // Validate the plan before anything is written.
    let schedule = installments::build_schedule(total, req.installment_count, req.first_due_date)?;

    let mut tx = db_pool.begin().await?;

    sqlx::query_as::<_, (String,)>("SELECT id FROM customers WHERE id = $1")
        .bind(&req.customer_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found("Customer not found"))?;

    // Same all-or-nothing rule as loan creation.
    let product_ids: Vec<String> = req.items.iter().map(|i| i.product_id.clone()).collect();
    let snapshot = stock::StockSnapshot::lock_and_read(&mut *tx, &product_ids).await?;
    snapshot.ensure_all_available(
        req.items.iter().map(|i| (i.product_id.as_str(), i.quantity)),
    )?;

    let (sale_id,) = sqlx::query_as::<_, (String,)>(
        "INSERT INTO sales (customer_id) VALUES ($1) RETURNING id",
    )
    .bind(&req.customer_id)
    .fetch_one(&mut *tx)
    .await?;

    for item in &req.items {
        sqlx::query(
            "INSERT INTO sale_items (sale_id, product_id, qty, unit_price)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(&sale_id)
        .bind(&item.product_id)
        .bind(item.quantity)
        .bind(item.unit_price)
        .execute(&mut *tx)
        .await?;

        stock::adjust(&mut *tx, &item.product_id, -item.quantity).await?;
    }

    insert_schedule(&mut tx, &sale_id, &schedule).await?;

    tx.commit().await?;

    let sale = fetch_sale_by_id(&db_pool, &sale_id).await?;
    Ok((StatusCode::CREATED, Json(sale)))
}

// ==================== Create Sale From Loan ====================

// The unreturned remainder of each loan line becomes a sale line at the
// caller's price. Stock is untouched: the goods already left inventory
// when the loan was created.
pub async fn create_sale_from_loan(
    State(AppState { db_pool }): State<AppState>,
    Path(loan_id): Path<String>,
    Json(req): Json<CreateSaleFromLoanRequest>,
) -> Result<(StatusCode, Json<SaleResponse>), AppError> {
    let mut tx = db_pool.begin().await?;

    let existing_sale = lock_loan(&mut tx, &loan_id).await?;
    if existing_sale.is_some() {
        return Err(AppError::ConvertedToSale);
    }

    let (customer_id,) =
        sqlx::query_as::<_, (String,)>("SELECT customer_id FROM loans WHERE id = $1")
            .bind(&loan_id)
            .fetch_one(&mut *tx)
            .await?;

    let lines = sqlx::query_as::<_, (String, i32, i32)>(
        "SELECT product_id, lent_qty, returned_qty FROM loan_items
         WHERE loan_id = $1 AND returned_qty < lent_qty
         FOR UPDATE",
    )
    .bind(&loan_id)
    .fetch_all(&mut *tx)
    .await?;

    if lines.is_empty() {
        return Err(AppError::validation("Loan has no outstanding items to sell"));
    }

    let price_map: HashMap<&str, f64> = req
        .unit_prices
        .iter()
        .map(|p| (p.product_id.as_str(), p.unit_price))
        .collect();

    let mut sale_lines = Vec::with_capacity(lines.len());
    for (product_id, lent_qty, returned_qty) in &lines {
        let unit_price = *price_map.get(product_id.as_str()).ok_or_else(|| {
            AppError::validation(format!("Missing unit price for product {}", product_id))
        })?;
        if unit_price < 0.0 {
            return Err(AppError::validation("Unit price cannot be negative"));
        }
        let quantity = fulfillment::remaining(*lent_qty, *returned_qty);
        sale_lines.push((product_id.clone(), quantity, unit_price));
    }

    let total: f64 = sale_lines
        .iter()
        .map(|(_, qty, price)| *qty as f64 * price)
        .sum();
    let schedule = installments::build_schedule(total, req.installment_count, req.first_due_date)?;

    let (sale_id,) = sqlx::query_as::<_, (String,)>(
        "INSERT INTO sales (customer_id, loan_id) VALUES ($1, $2) RETURNING id",
    )
    .bind(&customer_id)
    .bind(&loan_id)
    .fetch_one(&mut *tx)
    .await?;

    for (product_id, quantity, unit_price) in &sale_lines {
        sqlx::query(
            "INSERT INTO sale_items (sale_id, product_id, qty, unit_price)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(&sale_id)
        .bind(product_id)
        .bind(quantity)
        .bind(unit_price)
        .execute(&mut *tx)
        .await?;
    }

    insert_schedule(&mut tx, &sale_id, &schedule).await?;

    tx.commit().await?;

    let sale = fetch_sale_by_id(&db_pool, &sale_id).await?;
    Ok((StatusCode::CREATED, Json(sale)))
}

// ==================== List Sales ====================

pub async fn list_sales(
    State(AppState { db_pool }): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<SaleListItem>>, AppError> {
    let customer_id = params.get("customer_id");
    let status_filter = params.get("status").map(|s| s.to_uppercase());
    let today = Utc::now().date_naive();

    let mut query_str = String::from(
        "SELECT s.id, c.name, s.created_at,
            (SELECT COUNT(*) FROM installments i
             WHERE i.sale_id = s.id AND i.status = 'PENDING') AS pending,
            (SELECT COUNT(*) FROM installments i
             WHERE i.sale_id = s.id AND i.status = 'PENDING' AND i.due_date < $1) AS late
         FROM sales s
         JOIN customers c ON s.customer_id = c.id",
    );
    if customer_id.is_some() {
        query_str.push_str(" WHERE s.customer_id = $2");
    }
    query_str.push_str(" ORDER BY s.created_at DESC");

    type Row = (String, String, chrono::DateTime<chrono::Utc>, i64, i64);
    let mut query = sqlx::query_as::<_, Row>(&query_str).bind(today);
    if let Some(cid) = customer_id {
        query = query.bind(cid);
    }

    let rows = query.fetch_all(&db_pool).await?;

    let sales = rows
        .into_iter()
        .map(|(id, customer_name, created_at, pending, late)| SaleListItem {
            id,
            customer_name,
            status: status::sale_status(pending, late),
            pending_installments: pending,
            late_installments: late,
            created_at,
        })
        .filter(|s| match &status_filter {
            Some(want) => s.status.as_str() == want,
            None => true,
        })
        .collect();

    Ok(Json(sales))
}

// ==================== Get Sale ====================

pub async fn get_sale(
    State(AppState { db_pool }): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SaleResponse>, AppError> {
    fetch_sale_by_id(&db_pool, &id).await.map(Json)
}

// ==================== Update Sale ====================

// Header-level edit. Lines and the installment schedule are fixed at
// creation; only the customer can change.
pub async fn update_sale(
    State(AppState { db_pool }): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateSaleRequest>,
) -> Result<Json<SaleResponse>, AppError> {
    let mut tx = db_pool.begin().await?;

    sqlx::query_as::<_, (String,)>("SELECT id FROM sales WHERE id = $1 FOR UPDATE")
        .bind(&id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found("Sale not found"))?;

    sqlx::query_as::<_, (String,)>("SELECT id FROM customers WHERE id = $1")
        .bind(&req.customer_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found("Customer not found"))?;

    sqlx::query("UPDATE sales SET customer_id = $2 WHERE id = $1")
        .bind(&id)
        .bind(&req.customer_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    fetch_sale_by_id(&db_pool, &id).await.map(Json)
}

// ==================== Delete Sale ====================

pub async fn delete_sale(
    State(AppState { db_pool }): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let mut tx = db_pool.begin().await?;

    let (_, loan_id) = sqlx::query_as::<_, (String, Option<String>)>(
        "SELECT id, loan_id FROM sales WHERE id = $1 FOR UPDATE",
    )
    .bind(&id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::not_found("Sale not found"))?;

    let paid_count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM installments WHERE sale_id = $1 AND status = 'PAID'",
    )
    .bind(&id)
    .fetch_one(&mut *tx)
    .await?;

    if paid_count > 0 {
        return Err(AppError::HasPaidInstallments);
    }

    // Only a direct sale debited stock at creation, so only a direct sale
    // re-credits it. A loan-originated sale leaves stock debited against
    // the loan, which re-opens once this row (and its loan link) is gone.
    if loan_id.is_none() {
        let items = sqlx::query_as::<_, (String, i32)>(
            "SELECT product_id, qty FROM sale_items WHERE sale_id = $1",
        )
        .bind(&id)
        .fetch_all(&mut *tx)
        .await?;

        for (product_id, qty) in &items {
            stock::adjust(&mut *tx, product_id, *qty).await?;
        }
    }

    sqlx::query("DELETE FROM sales WHERE id = $1")
        .bind(&id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

// ==================== Pay Installment ====================

pub async fn pay_installment(
    State(AppState { db_pool }): State<AppState>,
    Path((sale_id, installment_id)): Path<(String, String)>,
    Json(req): Json<PayInstallmentRequest>,
) -> Result<Json<InstallmentResponse>, AppError> {
    let mut tx = db_pool.begin().await?;

    // Lock the sale first so a payment orders against delete_sale's
    // paid-installment guard instead of slipping past it.
    sqlx::query_as::<_, (String,)>("SELECT id FROM sales WHERE id = $1 FOR UPDATE")
        .bind(&sale_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found("Sale not found"))?;

    let installment = sqlx::query_as::<_, Installment>(
        "SELECT id, due_date, value, status, payment_date FROM installments
         WHERE id = $1 AND sale_id = $2
         FOR UPDATE",
    )
    .bind(&installment_id)
    .bind(&sale_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::not_found("Installment not found"))?;

    let new_status = installments::mark_paid(&installment.status)?;

    sqlx::query("UPDATE installments SET status = $2, payment_date = $3 WHERE id = $1")
        .bind(&installment_id)
        .bind(new_status)
        .bind(req.payment_date)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(Json(InstallmentResponse {
        id: installment.id,
        due_date: installment.due_date,
        value: installment.value,
        status: new_status.to_string(),
        payment_date: Some(req.payment_date),
    }))
}

// Inserts the generated schedule rows for a new sale.
async fn insert_schedule(
    tx: &mut Transaction<'_, Postgres>,
    sale_id: &str,
    schedule: &[installments::InstallmentDraft],
) -> Result<(), AppError> {
    for draft in schedule {
        sqlx::query("INSERT INTO installments (sale_id, due_date, value) VALUES ($1, $2, $3)")
            .bind(sale_id)
            .bind(draft.due_date)
            .bind(draft.value)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

// Helper to build the full sale detail response
async fn fetch_sale_by_id(db_pool: &PgPool, id: &str) -> Result<SaleResponse, AppError> {
    type Header = (String, String, Option<String>, chrono::DateTime<chrono::Utc>);
    let (sale_id, customer_name, loan_id, created_at) = sqlx::query_as::<_, Header>(
        "SELECT s.id, c.name, s.loan_id, s.created_at
         FROM sales s
         JOIN customers c ON s.customer_id = c.id
         WHERE s.id = $1",
    )
    .bind(id)
    .fetch_optional(db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Sale not found"))?;

    let items = sqlx::query_as::<_, SaleItem>(
        "SELECT si.product_id, p.name AS product_name, si.qty, si.unit_price
         FROM sale_items si
         JOIN products p ON si.product_id = p.id
         WHERE si.sale_id = $1
         ORDER BY p.name",
    )
    .bind(id)
    .fetch_all(db_pool)
    .await?;

    let installment_rows = sqlx::query_as::<_, Installment>(
        "SELECT id, due_date, value, status, payment_date FROM installments
         WHERE sale_id = $1
         ORDER BY due_date, id",
    )
    .bind(id)
    .fetch_all(db_pool)
    .await?;

    let today = Utc::now().date_naive();
    let pending = installment_rows.iter().filter(|i| !i.is_paid()).count() as i64;
    let late = installment_rows
        .iter()
        .filter(|i| !i.is_paid() && i.due_date < today)
        .count() as i64;

    let total: f64 = items.iter().map(|i| i.qty as f64 * i.unit_price).sum();

    Ok(SaleResponse {
        id: sale_id,
        customer_name,
        loan_id,
        status: status::sale_status(pending, late),
        total,
        created_at,
        items: items
            .into_iter()
            .map(|i| SaleItemResponse {
                line_total: i.qty as f64 * i.unit_price,
                product_id: i.product_id,
                product_name: i.product_name,
                quantity: i.qty,
                unit_price: i.unit_price,
            })
            .collect(),
        installments: installment_rows
            .into_iter()
            .map(InstallmentResponse::from)
            .collect(),
    })
}
