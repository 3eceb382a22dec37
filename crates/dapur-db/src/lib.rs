//! # dapur-db: Database Layer for Dapur POS
//!
//! This crate provides database access for the Dapur POS order engine.
//! It uses SQLite with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Dapur POS Data Flow                              │
//! │                                                                         │
//! │  Order service (create / edit / pay / status)                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     dapur-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ catalog       │    │              │  │   │
//! │  │   │ SqlitePool    │    │ order         │    │ 001_init.sql │  │   │
//! │  │   │ Transactions  │◄───│ payment       │    │              │  │   │
//! │  │   │               │    │ counter       │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   ~/.local/share/dapur/dapur.db  (or configured path)           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Catalog, order, payment and counter access
//! - [`seed`] - Demo outlets and menu
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dapur_db::{Database, DbConfig};
//! use dapur_db::repository::order;
//!
//! let db = Database::new(DbConfig::new("dapur.db")).await?;
//!
//! let mut tx = db.begin().await?;
//! order::lock_order(&mut tx, outlet_id, order_id).await?;
//! let detail = order::require_detail(&mut tx, outlet_id, order_id).await?;
//! tx.commit().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod seed;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::catalog::CatalogRepository;
pub use repository::order::OrderRepository;
