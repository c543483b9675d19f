//! Backend for a service-reselling panel.
//!
//! Users hold a balance, place orders against a service catalog, and an
//! operator reviews and fulfills the orders. The core is the balance-and-
//! order ledger in [`services::LedgerService`]; everything else is the read
//! side and HTTP plumbing around it.

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod store;
