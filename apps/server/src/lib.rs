//! # Dapur Server
//!
//! HTTP + WebSocket front of the order engine.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Dapur Server                                    │
//! │                                                                         │
//! │  Cashier / kitchen ──HTTP──► routes ──► OrderService ──► dapur-db       │
//! │                                              │                          │
//! │                                              │ publish after commit     │
//! │                                              ▼                          │
//! │  Kitchen display ◄──WS /ws────────────── EventHub (dapur-hub)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//! - [`config`] - TOML + environment configuration
//! - [`error`] - Service and API errors
//! - [`scope`] - Outlet / actor extraction from trusted headers
//! - [`services`] - Order operations
//! - [`state`] - Shared handler state
//! - [`routes`] - Router and handlers

pub mod config;
pub mod error;
pub mod routes;
pub mod scope;
pub mod services;
pub mod state;

pub use config::{ConfigError, ServerConfig};
pub use error::{ApiError, ErrorCode, ServiceError, ServiceResult};
pub use routes::build_router;
pub use scope::RequestScope;
pub use services::{OrderService, OrderSettings};
pub use state::AppState;
