//! Pointbook - Loyalty-point ledger service
//!
//! Users upload order numbers, an external accrual oracle decides their
//! value, and the resulting points can be spent against other orders or
//! earned from time-boxed promo codes. The flow is simple:
//!
//! ```text
//! ┌──────────┐    ┌──────────┐    ┌──────────┐    ┌──────────┐
//! │ Gateway  │───▶│ Services │───▶│   Repo   │───▶│ Postgres │
//! │  (HTTP)  │    │ (rules)  │    │ (ledger) │    │ (truth)  │
//! └──────────┘    └──────────┘    └──────────┘    └──────────┘
//!                       ▲
//!                 ┌──────────┐
//!                 │ Pollers  │  accrual oracle + withdrawal finalizer
//!                 └──────────┘
//! ```

pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod gateway;
pub mod logging;
pub mod luhn;
pub mod models;
pub mod poller;
pub mod repo;
pub mod service;
