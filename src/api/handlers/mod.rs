//! # HTTP Handlers
//!
//! Thin adapters: pull data out of the request with extractors, call one
//! service method, wrap the result in [`ApiResponse`](crate::models::ApiResponse).

pub mod auth;
pub mod catalog;
pub mod customers;
pub mod health;
pub mod i18n;
pub mod orders;
pub mod partnerships;
pub mod price_types;
pub mod stats;
