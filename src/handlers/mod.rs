// src/handlers/mod.rs
pub mod customer;
pub mod loan;
pub mod product;
pub mod purchase;
pub mod sale;
pub mod supplier;
