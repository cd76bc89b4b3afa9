//! Pizzeria pricing crate - resolves order items against the menu.
//!
//! Pricing never fails: unknown items, unknown sizes, and missing names
//! price at zero so a partially understood order still produces a total.
//! Callers that want to reject such orders run [`validate`] first.

pub mod engine;

pub use engine::{compute_total, price_lookup, round_cents, validate, OrderSummary};
