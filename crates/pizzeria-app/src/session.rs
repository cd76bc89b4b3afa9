//! Interactive ordering session and terminal rendering.
//!
//! Lines starting with `/` are commands; anything else is sent to the model
//! as a chat turn.

use std::io::{self, BufRead, Write};

use chrono::DateTime;
use tracing::debug;

use pizzeria_chat::{Checkout, ChatTransport, OrderOrchestrator};
use pizzeria_core::error::PizzeriaError;
use pizzeria_core::types::Role;
use pizzeria_storage::OrderLog;

const HELP: &str = "Commands: /total (price and save the order), /new (start over), \
                    /orders (recent orders), /menu, /help, /quit";

/// A slash command typed at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    Total,
    New,
    Orders,
    Menu,
    Help,
    Quit,
    Unknown(String),
}

impl SlashCommand {
    /// `None` when `input` is a chat message rather than a command.
    pub fn parse(input: &str) -> Option<Self> {
        let word = input.strip_prefix('/')?.split_whitespace().next().unwrap_or("");
        Some(match word.to_lowercase().as_str() {
            "total" | "checkout" => SlashCommand::Total,
            "new" | "reset" => SlashCommand::New,
            "orders" => SlashCommand::Orders,
            "menu" => SlashCommand::Menu,
            "help" | "?" => SlashCommand::Help,
            "quit" | "exit" | "q" => SlashCommand::Quit,
            other => SlashCommand::Unknown(other.to_string()),
        })
    }
}

/// Run the prompt loop until `/quit` or end of input.
///
/// Returns the number of orders checked out.
pub fn run<T, R, W>(
    orch: &OrderOrchestrator<T>,
    recent_limit: usize,
    mut input: R,
    out: &mut W,
) -> io::Result<usize>
where
    T: ChatTransport,
    R: BufRead,
    W: Write,
{
    let mut conversation = orch.start();
    let mut orders = 0;

    writeln!(out, "📖 Today's Menu\n\n{}\n", orch.menu_text())?;
    write_greeting(out, &conversation)?;
    writeln!(out, "{}", HELP)?;

    loop {
        write!(out, "\n> ")?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            break;
        }
        let text = line.trim();
        if text.is_empty() {
            continue;
        }

        match SlashCommand::parse(text) {
            None => {
                let (next, reply) = orch.chat_turn(conversation, text);
                conversation = next;
                writeln!(out, "🤖 {}", reply)?;
            }
            Some(SlashCommand::Quit) => break,
            Some(SlashCommand::Help) => writeln!(out, "{}", HELP)?,
            Some(SlashCommand::Menu) => writeln!(out, "{}", orch.menu_text())?,
            Some(SlashCommand::New) => {
                conversation = orch.reset();
                write_greeting(out, &conversation)?;
            }
            Some(SlashCommand::Orders) => write_orders(out, orch.order_log(), recent_limit)?,
            Some(SlashCommand::Total) => {
                writeln!(out, "📋 Preparing your order summary...")?;
                match orch.checkout(&conversation) {
                    Ok(checkout) => {
                        write_checkout(out, &checkout)?;
                        if checkout.rows_saved > 0 {
                            orders += 1;
                        }
                    }
                    Err(PizzeriaError::Parse(detail)) => {
                        debug!(detail = %detail, "Checkout reply had no order");
                        writeln!(out, "❌ Could not generate order summary. Please try again.")?;
                    }
                    Err(e) => {
                        writeln!(out, "❌ Could not process order. Please check connection.")?;
                        writeln!(out, "   {}", e)?;
                    }
                }
            }
            Some(SlashCommand::Unknown(cmd)) => {
                writeln!(out, "Unknown command '/{}'. {}", cmd, HELP)?;
            }
        }
    }

    Ok(orders)
}

fn write_greeting<W: Write>(out: &mut W, conversation: &pizzeria_chat::Conversation) -> io::Result<()> {
    if let Some(greeting) = conversation.visible().find(|m| m.role == Role::Assistant) {
        writeln!(out, "🤖 {}", greeting.content)?;
    }
    Ok(())
}

/// Print the priced order.
pub fn write_checkout<W: Write>(out: &mut W, checkout: &Checkout) -> io::Result<()> {
    writeln!(out, "🧾 Order Summary - Total: ${:.2}", checkout.total)?;
    for line in &checkout.line_items {
        writeln!(
            out,
            "   {} | {} | {} | x{} | ${:.2} | ${:.2}",
            line.label(),
            line.name,
            line.size,
            line.qty,
            line.unit_price,
            line.subtotal
        )?;
    }

    let order = &checkout.order;
    match (order.delivery_method.as_deref(), order.address.as_deref()) {
        (Some(method), Some(address)) => writeln!(out, "   🚚 {} to {}", method, address)?,
        (Some(method), None) => writeln!(out, "   🚚 {}", method)?,
        _ => {}
    }
    if let Some(ref notes) = order.notes {
        writeln!(out, "   📝 {}", notes)?;
    }
    if let Some(ref issues) = checkout.issues {
        writeln!(out, "⚠️ Some items could not be priced: {}", issues)?;
    }

    if let Some(ref err) = checkout.save_error {
        writeln!(out, "⚠️ Order not saved: {}", err)?;
    } else if checkout.rows_saved > 0 {
        writeln!(out, "✅ Order saved successfully!")?;
    }
    Ok(())
}

/// Print the last `limit` log rows followed by totals over the whole log.
pub fn write_orders<W: Write>(out: &mut W, log: &OrderLog, limit: usize) -> io::Result<()> {
    let found = log
        .recent(limit)
        .and_then(|recent| log.stats().map(|stats| (recent, stats)));
    let (recent, stats) = match found {
        Ok(found) => found,
        Err(e) => return writeln!(out, "⚠️ Could not read orders: {}", e),
    };
    if recent.is_empty() {
        return writeln!(out, "No orders yet.");
    }

    writeln!(out, "📋 Recent Orders")?;
    for entry in &recent {
        let when = DateTime::from_timestamp(entry.timestamp, 0)
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| entry.timestamp.to_string());
        writeln!(
            out,
            "   {} | {} | {} | {} | x{} | ${}",
            when,
            entry.delivery_method.as_deref().unwrap_or("-"),
            entry.kind,
            entry.name,
            entry.qty,
            entry.total
        )?;
    }
    writeln!(
        out,
        "📊 Total Orders: {} | Revenue: ${:.2}",
        stats.order_count, stats.revenue
    )
}
