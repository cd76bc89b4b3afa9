//! Pizzeria storage crate - menu file and order log persistence.
//!
//! The menu lives in a JSON document that is synthesized with a default menu
//! on first use. Priced orders are appended to a CSV log, one row per line
//! item.

pub mod menu;
pub mod orders;

pub use menu::{default_menu, render_as_text, MenuStore};
pub use orders::{OrderLog, OrderLogEntry, OrderStats};
