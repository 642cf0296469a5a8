//! # Backend contracts
//!
//! This module defines the interfaces that a storage backend must implement in order to drive the Kedai engine. The
//! public APIs ([`crate::OrderFlowApi`], [`crate::PaymentApi`] and [`crate::ReportApi`]) are generic over these
//! traits, so that the validation and permission logic is independent of the database in use.
//!
//! * [`OrderManagement`] creates orders atomically with their line items and history, and moves them through their
//!   lifecycle.
//! * [`PaymentManagement`] owns the payment lifecycle: issuing QR payments, lazy expiry, confirmation and staff
//!   overrides, each of which may touch the owning order in the same transaction.
//! * [`AccountManagement`] gives read access to the identity service's account records.
//! * [`SalesReporting`] exposes read-only views used for revenue reports.
//!
//! Every backend method that writes more than one row must do so in a single transaction.
mod account_management;
mod errors;
mod order_management;
mod payment_management;
mod sales_reporting;

pub use account_management::AccountManagement;
pub use errors::EngineError;
pub use order_management::OrderManagement;
pub use payment_management::PaymentManagement;
pub use sales_reporting::SalesReporting;
