// src/handlers/purchase.rs
use std::collections::{HashMap, HashSet};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sqlx::{PgPool, Postgres, Transaction};

use crate::domain::{fulfillment, status, stock};
use crate::dtos::purchase::{
    CreatePurchaseRequest, PurchaseItemResponse, PurchaseListItem, PurchaseResponse,
    ReceiveItemRequest, UpdatePurchaseRequest,
};
use crate::error::AppError;
use crate::models::purchase::PurchaseItem;
use crate::state::AppState;

// ==================== Create Purchase ====================

pub async fn create_purchase(
    State(AppState { db_pool }): State<AppState>,
    Json(req): Json<CreatePurchaseRequest>,
) -> Result<(StatusCode, Json<PurchaseResponse>), AppError> {
    if req.items.is_empty() {
        return Err(AppError::validation("Purchase must contain at least one item"));
    }

    let mut seen = HashSet::new();
    for item in &req.items {
        if !seen.insert(item.product_id.as_str()) {
            return Err(AppError::validation("Duplicate product in purchase items"));
        }
        if item.quantity <= 0 {
            return Err(AppError::validation("Quantity must be greater than 0"));
        }
        if item.unit_price < 0.0 {
            return Err(AppError::validation("Unit price cannot be negative"));
        }
    }

    let mut tx = db_pool.begin().await?;

    sqlx::query_as::<_, (String,)>("SELECT id FROM suppliers WHERE id = $1")
        .bind(&req.supplier_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found("Supplier not found"))?;

    // All referenced products must exist before any line is written.
    let product_ids: Vec<String> = req.items.iter().map(|i| i.product_id.clone()).collect();
    let found: HashSet<String> = sqlx::query_as::<_, (String,)>(
        "SELECT id FROM products WHERE id = ANY($1)",
    )
    .bind(product_ids.clone())
    .fetch_all(&mut *tx)
    .await?
    .into_iter()
    .map(|(id,)| id)
    .collect();

    for id in &product_ids {
        if !found.contains(id) {
            return Err(AppError::not_found(format!("Product {} not found", id)));
        }
    }

    let (purchase_id,) = sqlx::query_as::<_, (String,)>(
        "INSERT INTO purchases (supplier_id) VALUES ($1) RETURNING id",
    )
    .bind(&req.supplier_id)
    .fetch_one(&mut *tx)
    .await?;

    for item in &req.items {
        sqlx::query(
            "INSERT INTO purchase_items (purchase_id, product_id, ordered_qty, unit_price)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(&purchase_id)
        .bind(&item.product_id)
        .bind(item.quantity)
        .bind(item.unit_price)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    let purchase = fetch_purchase_by_id(&db_pool, &purchase_id).await?;
    Ok((StatusCode::CREATED, Json(purchase)))
}

// ==================== List Purchases ====================

pub async fn list_purchases(
    State(AppState { db_pool }): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<PurchaseListItem>>, AppError> {
    let supplier_id = params.get("supplier_id");
    let status_filter = params.get("status").map(|s| s.to_uppercase());

    let mut query_str = String::from(
        "SELECT p.id, s.name, p.created_at,
            (SELECT COUNT(*) FROM purchase_items pi
             WHERE pi.purchase_id = p.id AND pi.received_qty < pi.ordered_qty) AS open_lines
         FROM purchases p
         JOIN suppliers s ON p.supplier_id = s.id",
    );
    if supplier_id.is_some() {
        query_str.push_str(" WHERE p.supplier_id = $1");
    }
    query_str.push_str(" ORDER BY p.created_at DESC");

    let mut query = sqlx::query_as::<_, (String, String, chrono::DateTime<chrono::Utc>, i64)>(
        &query_str,
    );
    if let Some(sid) = supplier_id {
        query = query.bind(sid);
    }

    let rows = query.fetch_all(&db_pool).await?;

    let purchases = rows
        .into_iter()
        .map(|(id, supplier_name, created_at, open_lines)| PurchaseListItem {
            id,
            supplier_name,
            status: status::purchase_status(open_lines),
            created_at,
        })
        .filter(|p| match &status_filter {
            Some(want) => p.status.as_str() == want,
            None => true,
        })
        .collect();

    Ok(Json(purchases))
}

// ==================== Get Purchase ====================

pub async fn get_purchase(
    State(AppState { db_pool }): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PurchaseResponse>, AppError> {
    fetch_purchase_by_id(&db_pool, &id).await.map(Json)
}

// ==================== Update Purchase ====================

// Header-level edit. Lines are managed through their own endpoints.
pub async fn update_purchase(
    State(AppState { db_pool }): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdatePurchaseRequest>,
) -> Result<Json<PurchaseResponse>, AppError> {
    let mut tx = db_pool.begin().await?;

    lock_purchase(&mut tx, &id).await?;

    sqlx::query_as::<_, (String,)>("SELECT id FROM suppliers WHERE id = $1")
        .bind(&req.supplier_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found("Supplier not found"))?;

    sqlx::query("UPDATE purchases SET supplier_id = $2 WHERE id = $1")
        .bind(&id)
        .bind(&req.supplier_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    fetch_purchase_by_id(&db_pool, &id).await.map(Json)
}

// ==================== Receive Item ====================

pub async fn receive_item(
    State(AppState { db_pool }): State<AppState>,
    Path((purchase_id, product_id)): Path<(String, String)>,
    Json(req): Json<ReceiveItemRequest>,
) -> Result<Json<PurchaseItemResponse>, AppError> {
    let mut tx = db_pool.begin().await?;

    // Taking the purchase lock first orders a receive against
    // delete_purchase's received-line guard.
    lock_purchase(&mut tx, &purchase_id).await?;

    let (product_name, ordered_qty, received_qty, unit_price) =
        sqlx::query_as::<_, (String, i32, i32, f64)>(
            "SELECT p.name, pi.ordered_qty, pi.received_qty, pi.unit_price
             FROM purchase_items pi
             JOIN products p ON pi.product_id = p.id
             WHERE pi.purchase_id = $1 AND pi.product_id = $2
             FOR UPDATE OF pi",
        )
        .bind(&purchase_id)
        .bind(&product_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found("Purchase item not found"))?;

    let new_received = fulfillment::advance(ordered_qty, received_qty, req.quantity)?;

    sqlx::query(
        "UPDATE purchase_items SET received_qty = $3
         WHERE purchase_id = $1 AND product_id = $2",
    )
    .bind(&purchase_id)
    .bind(&product_id)
    .bind(new_received)
    .execute(&mut *tx)
    .await?;

    // Receiving credits stock in the same transaction as the line update.
    stock::adjust(&mut *tx, &product_id, req.quantity).await?;

    tx.commit().await?;

    Ok(Json(PurchaseItemResponse {
        product_id,
        product_name,
        ordered_qty,
        received_qty: new_received,
        remaining_qty: fulfillment::remaining(ordered_qty, new_received),
        unit_price,
    }))
}

// ==================== Delete Item ====================

pub async fn delete_item(
    State(AppState { db_pool }): State<AppState>,
    Path((purchase_id, product_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let mut tx = db_pool.begin().await?;

    lock_purchase(&mut tx, &purchase_id).await?;

    let (received_qty,) = sqlx::query_as::<_, (i32,)>(
        "SELECT received_qty FROM purchase_items
         WHERE purchase_id = $1 AND product_id = $2
         FOR UPDATE",
    )
    .bind(&purchase_id)
    .bind(&product_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::not_found("Purchase item not found"))?;

    if received_qty > 0 {
        return Err(AppError::HasReceivedItems);
    }

    sqlx::query("DELETE FROM purchase_items WHERE purchase_id = $1 AND product_id = $2")
        .bind(&purchase_id)
        .bind(&product_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

// ==================== Delete Purchase ====================

pub async fn delete_purchase(
    State(AppState { db_pool }): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let mut tx = db_pool.begin().await?;

    lock_purchase(&mut tx, &id).await?;

    // Guard runs inside the delete transaction; every line mutation takes
    // the same purchase lock, so the count cannot race a receive.
    let received_lines = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM purchase_items
         WHERE purchase_id = $1 AND received_qty > 0",
    )
    .bind(&id)
    .fetch_one(&mut *tx)
    .await?;

    if received_lines > 0 {
        return Err(AppError::HasReceivedItems);
    }

    // Nothing was credited to stock yet, so nothing to reverse.
    sqlx::query("DELETE FROM purchases WHERE id = $1")
        .bind(&id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

// Locks the purchase row so line mutations and deletion serialize on it.
async fn lock_purchase(
    tx: &mut Transaction<'_, Postgres>,
    purchase_id: &str,
) -> Result<(), AppError> {
    sqlx::query_as::<_, (String,)>("SELECT id FROM purchases WHERE id = $1 FOR UPDATE")
        .bind(purchase_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::not_found("Purchase not found"))?;

    Ok(())
}

// Helper to build the full purchase detail response
async fn fetch_purchase_by_id(db_pool: &PgPool, id: &str) -> Result<PurchaseResponse, AppError> {
    let (purchase_id, supplier_id, supplier_name, created_at) =
        sqlx::query_as::<_, (String, String, String, chrono::DateTime<chrono::Utc>)>(
            "SELECT p.id, p.supplier_id, s.name, p.created_at
             FROM purchases p
             JOIN suppliers s ON p.supplier_id = s.id
             WHERE p.id = $1",
        )
        .bind(id)
        .fetch_optional(db_pool)
        .await?
        .ok_or_else(|| AppError::not_found("Purchase not found"))?;

    let items = sqlx::query_as::<_, PurchaseItem>(
        "SELECT pi.product_id, p.name AS product_name, pi.ordered_qty, pi.received_qty,
                pi.unit_price
         FROM purchase_items pi
         JOIN products p ON pi.product_id = p.id
         WHERE pi.purchase_id = $1
         ORDER BY p.name",
    )
    .bind(id)
    .fetch_all(db_pool)
    .await?;

    let open_lines = items
        .iter()
        .filter(|i| i.received_qty < i.ordered_qty)
        .count() as i64;

    Ok(PurchaseResponse {
        id: purchase_id,
        supplier_id,
        supplier_name,
        status: status::purchase_status(open_lines),
        created_at,
        items: items
            .into_iter()
            .map(|i| PurchaseItemResponse {
                remaining_qty: fulfillment::remaining(i.ordered_qty, i.received_qty),
                product_id: i.product_id,
                product_name: i.product_name,
                ordered_qty: i.ordered_qty,
                received_qty: i.received_qty,
                unit_price: i.unit_price,
            })
            .collect(),
    })
}
