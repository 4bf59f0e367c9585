// src/dtos/mod.rs
pub mod loan;
pub mod party;
pub mod product;
pub mod purchase;
pub mod sale;
