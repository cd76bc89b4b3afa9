//! Order orchestrator: wires the relay, extractor, pricing, and order log.
//!
//! Each step takes the caller's [`Conversation`] and hands it back; the
//! orchestrator itself only holds the menu, the model choice, and the
//! transport.

use chrono::Utc;
use tracing::{debug, info, warn};

use pizzeria_core::error::{PizzeriaError, Result};
use pizzeria_core::types::{ChatMessage, LineItem, Menu, Order};
use pizzeria_pricing::{compute_total, validate};
use pizzeria_storage::{render_as_text, OrderLog};

use crate::conversation::Conversation;
use crate::extractor::parse_order;
use crate::prompt::{self, EMPTY_REPLY_APOLOGY, ORDER_SUMMARY_INSTRUCTION};
use crate::relay::{is_error_reply, ChatTransport};

/// Outcome of a successful checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct Checkout {
    pub order: Order,
    pub total: f64,
    pub line_items: Vec<LineItem>,
    /// Seconds since the Unix epoch, shared by every logged row.
    pub timestamp: i64,
    /// Rows appended to the order log.
    pub rows_saved: usize,
    /// Set when the order was priced but could not be logged.
    pub save_error: Option<String>,
    /// Items that priced at zero because they are unknown or lack a name
    /// or an offered size.
    pub issues: Option<String>,
}

impl Checkout {
    pub fn is_empty(&self) -> bool {
        self.line_items.is_empty()
    }
}

/// Drives chat turns and checkouts over a [`ChatTransport`].
pub struct OrderOrchestrator<T: ChatTransport> {
    transport: T,
    model: String,
    restaurant: String,
    menu: Menu,
    menu_text: String,
    system: ChatMessage,
    log: OrderLog,
}

impl<T: ChatTransport> OrderOrchestrator<T> {
    pub fn new(
        transport: T,
        model: impl Into<String>,
        restaurant: impl Into<String>,
        menu: Menu,
        log: OrderLog,
    ) -> Self {
        let restaurant = restaurant.into();
        let menu_text = render_as_text(&menu);
        let system = prompt::system_message(&restaurant, &menu_text);
        Self {
            transport,
            model: model.into(),
            restaurant,
            menu,
            menu_text,
            system,
            log,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn set_model(&mut self, model: impl Into<String>) {
        self.model = model.into();
        info!(model = %self.model, "Model selected");
    }

    pub fn menu(&self) -> &Menu {
        &self.menu
    }

    /// The menu as shown to users and embedded in the system prompt.
    pub fn menu_text(&self) -> &str {
        &self.menu_text
    }

    pub fn order_log(&self) -> &OrderLog {
        &self.log
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// A new session with the welcome greeting.
    pub fn start(&self) -> Conversation {
        Conversation::new(&self.restaurant, &self.menu_text)
    }

    /// Discard the current order and start over.
    pub fn reset(&self) -> Conversation {
        let conversation = Conversation::next_order(&self.restaurant, &self.menu_text);
        info!(conversation_id = %conversation.id, "New order started");
        conversation
    }

    /// Add `text` as a user turn, ask the model, and record its reply.
    ///
    /// Relay failures come back as the reply text (starting with `ERROR`);
    /// an empty reply is replaced by an apology.
    pub fn chat_turn(&self, mut conversation: Conversation, text: &str) -> (Conversation, String) {
        conversation.push(ChatMessage::user(text));
        let messages = conversation.for_model(&self.system);

        let mut reply = self.transport.send(&self.model, &messages);
        if reply.trim().is_empty() {
            warn!(conversation_id = %conversation.id, "Model returned an empty reply");
            reply = EMPTY_REPLY_APOLOGY.to_string();
        } else if is_error_reply(&reply) {
            warn!(conversation_id = %conversation.id, reply = %reply, "Chat turn failed");
        }
        debug!(
            conversation_id = %conversation.id,
            turns = conversation.user_turns(),
            chars = reply.len(),
            "Chat turn complete"
        );

        conversation.push(ChatMessage::assistant(reply.clone()));
        (conversation, reply)
    }

    /// Ask the model for the order as JSON, price it, and log it.
    ///
    /// The conversation is not modified. Fails with
    /// [`PizzeriaError::Connectivity`] when the model cannot be reached or
    /// answers with nothing, and with [`PizzeriaError::Parse`] (carrying the
    /// raw reply) when no order can be found in its answer. An order that
    /// prices but cannot be logged still succeeds, with `save_error` set.
    pub fn checkout(&self, conversation: &Conversation) -> Result<Checkout> {
        let mut messages = conversation.for_model(&self.system);
        messages.push(ChatMessage::user(ORDER_SUMMARY_INSTRUCTION));

        let raw = self.transport.try_send(&self.model, &messages)?;
        if is_error_reply(&raw) {
            return Err(PizzeriaError::Connectivity(raw));
        }
        if raw.trim().is_empty() {
            return Err(PizzeriaError::Connectivity(
                "Could not process order: the model returned an empty reply".to_string(),
            ));
        }

        let order = parse_order(&raw).inspect_err(|_| {
            warn!(conversation_id = %conversation.id, "Could not extract an order from the model reply");
        })?;

        let issues = validate(&order, &self.menu).err().map(|e| {
            warn!(conversation_id = %conversation.id, error = %e, "Order has unpriced items");
            e.to_string()
        });

        let summary = compute_total(&order, &self.menu);
        let timestamp = Utc::now().timestamp();

        let (rows_saved, save_error) = if summary.is_empty() {
            (0, None)
        } else {
            match self.log.append(timestamp, &order, &summary.line_items) {
                Ok(rows) => (rows, None),
                Err(e) => {
                    warn!(path = %self.log.path().display(), error = %e, "Order not saved");
                    (0, Some(e.to_string()))
                }
            }
        };

        info!(
            conversation_id = %conversation.id,
            lines = summary.line_items.len(),
            total = summary.total,
            rows_saved,
            "Checkout complete"
        );

        Ok(Checkout {
            order,
            total: summary.total,
            line_items: summary.line_items,
            timestamp,
            rows_saved,
            save_error,
            issues,
        })
    }
}
