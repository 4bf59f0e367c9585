// src/domain/mod.rs
//
// Decision logic for the inventory and order-lifecycle rules. Everything
// here is synchronous and database-free except `stock::adjust`, which runs
// inside the caller's transaction so a line update and its stock effect
// commit together or not at all.

pub mod fulfillment;
pub mod installments;
pub mod status;
pub mod stock;
