//! # Kedai engine public API
//!
//! The `engine_api` module exposes the programmatic API for the Kedai order and payment engine.
//! The API is modular, so that clients of the API can pick and choose the functionality they want.
//!
//! * [`order_flow_api`] places orders, moves them through their lifecycle, and answers order queries.
//! * [`payment_api`] issues QR payments, reports their status, and handles confirmations and staff overrides.
//! * [`report_api`] aggregates completed sales into daily, monthly or yearly revenue reports.
//!
//! Every call takes the authenticated [`Principal`](crate::db_types::Principal) making the request. Permission checks
//! and input validation happen here, before the backend is touched.
//!
//! # API usage
//!
//! The pattern for using all the APIs is the same. An API instance is created by supplying a database backend that
//! implements the specific backend traits required by the API.
//!
//! ```rust,ignore
//! use kedai_engine::{OrderFlowApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/kedai.db", 25).await?;
//! db.run_migrations().await?;
//! let api = OrderFlowApi::new(db);
//! let detail = api.fetch_order(42, &principal).await?;
//! ```

pub mod order_flow_api;
pub mod order_objects;
pub mod payment_api;
pub mod payment_objects;
pub mod report_api;
pub mod report_objects;
