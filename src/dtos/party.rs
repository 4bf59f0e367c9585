// src/dtos/party.rs
//
// Customers and suppliers share the same request/response shapes.

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CreatePartyRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePartyRequest {
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PartyResponse {
    pub id: String,
    pub name: String,
    pub created_at: String,
}

impl From<crate::models::party::Party> for PartyResponse {
    fn from(party: crate::models::party::Party) -> Self {
        Self {
            id: party.id,
            name: party.name,
            created_at: party.created_at.to_rfc3339(),
        }
    }
}
