//! # Repository Module
//!
//! Database access for Dapur POS.
//!
//! ## Two Shapes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Pool-backed repositories (read path)                                  │
//! │    db.catalog().resolve(&ids)      CatalogRepository                   │
//! │    db.orders().get(outlet, id)     OrderRepository                     │
//! │                                                                         │
//! │  Connection functions (write path, composed inside one transaction)    │
//! │    counter::next_order_seq                                             │
//! │    order::{lock_order, fetch_detail, insert_order, insert_item, ...}   │
//! │    payment::{insert_payment, fetch_payments, completed_total}          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`CatalogRepository`](catalog::CatalogRepository) - Outlets and menu snapshots
//! - [`OrderRepository`](order::OrderRepository) - Order detail and listing

pub mod catalog;
pub mod counter;
pub mod order;
pub mod payment;
