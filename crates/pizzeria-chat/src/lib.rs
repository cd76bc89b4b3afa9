//! Conversational ordering for the pizzeria.
//!
//! Relays chat history to a locally hosted language model, recovers the
//! structured order the model produces at checkout, and prices it.

pub mod conversation;
pub mod error;
pub mod extractor;
pub mod orchestrator;
pub mod prompt;
pub mod relay;

pub use conversation::Conversation;
pub use error::RelayError;
pub use extractor::{extract, extract_with_strategy, parse_order, Strategy};
pub use orchestrator::{Checkout, OrderOrchestrator};
pub use relay::{extract_reply, is_error_reply, ChatRelay, ChatTransport};
