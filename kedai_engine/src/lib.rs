//! Kedai Order & Payment Engine
//!
//! The transaction engine behind a food outlet's ordering platform. Customers place orders, staff move them through
//! preparation, and payments are settled by scanning a locally generated QR transfer code.
//!
//! The library is divided into the following sections:
//! 1. Storage ([`SqliteDatabase`]). Every multi-row change runs in a single database transaction. You should never
//!    need to access the database directly. Instead, use the public API provided by the engine. The exception is the
//!    data types used in the database. These are defined in the [`db_types`] module and are public.
//! 2. The engine public API ([`OrderFlowApi`], [`PaymentApi`] and [`ReportApi`]). These validate input and check
//!    permissions against the [`acl`] table before handing off to a backend. Backends need to implement the traits
//!    in the [`traits`] module in order to drive the APIs.
//! 3. Supporting pieces: environment-driven [`config`], and the queue id, payment id and QR payload builders in
//!    [`helpers`].
pub mod acl;
pub mod config;
pub mod db_types;
pub mod helpers;
pub mod traits;

mod engine_api;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use engine_api::{
    order_flow_api::OrderFlowApi,
    order_objects,
    payment_api::PaymentApi,
    payment_objects,
    report_api::ReportApi,
    report_objects,
};
pub use traits::{AccountManagement, EngineError, OrderManagement, PaymentManagement, SalesReporting};
