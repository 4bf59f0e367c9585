// src/models/party.rs
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Row shape shared by customers and suppliers. Document numbers and
/// addresses are handled by external collaborators and never reach this
/// backend.
#[derive(Debug, FromRow)]
pub struct Party {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}
