//! End-to-end tests of the ordering pipeline.
//!
//! Menu file and order log live in a temp directory. The model is either a
//! scripted transport or a loopback HTTP stub speaking the Ollama chat API.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use serde_json::{json, Value};

use pizzeria_chat::{ChatRelay, ChatTransport, OrderOrchestrator};
use pizzeria_core::error::{PizzeriaError, Result};
use pizzeria_core::types::ChatMessage;
use pizzeria_storage::{MenuStore, OrderLog};

// =============================================================================
// Helpers
// =============================================================================

struct ScriptedModel {
    replies: RefCell<VecDeque<String>>,
}

impl ScriptedModel {
    fn new(replies: &[&str]) -> Self {
        Self {
            replies: RefCell::new(replies.iter().map(|r| r.to_string()).collect()),
        }
    }
}

impl ChatTransport for ScriptedModel {
    fn try_send(&self, _model: &str, _messages: &[ChatMessage]) -> Result<String> {
        Ok(self.replies.borrow_mut().pop_front().unwrap_or_default())
    }
}

fn build<T: ChatTransport>(transport: T, dir: &tempfile::TempDir) -> OrderOrchestrator<T> {
    let menu = MenuStore::new(dir.path().join("menu.json")).load();
    OrderOrchestrator::new(
        transport,
        "gemma:2b",
        "Sajid's Pizzeria",
        menu,
        OrderLog::new(dir.path().join("orders.csv")),
    )
}

/// Serve `bodies` in order, one per connection, then stop.
fn serve_sequence(bodies: Vec<String>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        for body in bodies {
            let (mut stream, _) = listener.accept().unwrap();
            drain_request(&mut stream);
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).unwrap();
        }
    });
    format!("http://{}", addr)
}

fn drain_request(stream: &mut TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = stream.read(&mut chunk).unwrap();
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
            let body_len = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + body_len {
                return;
            }
        }
    }
}

fn ollama_reply(content: &str) -> String {
    json!({
        "model": "gemma:2b",
        "message": {"role": "assistant", "content": content},
        "done": true
    })
    .to_string()
}

// =============================================================================
// Scripted model
// =============================================================================

#[test]
fn test_first_run_creates_menu_and_orders() {
    let dir = tempfile::tempdir().unwrap();
    let orch = build(
        ScriptedModel::new(&[
            "Great! What size pepperoni would you like?",
            "Two mediums it is. Pickup or delivery?",
            "Here's your order:\n```json\n{\"pizzas\":[{\"name\":\"pepperoni\",\"size\":\"M\",\"qty\":2}],\
             \"toppings\":[{\"name\":\"mushrooms\",\"qty\":3,\"applies_to\":\"all\"}],\
             \"drinks\":[{\"name\":\"root beer\",\"size\":\"M\",\"qty\":1}],\
             \"delivery_method\":\"delivery\",\"address\":\"12 Main St, Springfield\",\"notes\":null}\n```",
        ]),
        &dir,
    );

    assert!(dir.path().join("menu.json").exists());
    assert_eq!(orch.menu().item_count(), 18);
    assert!(orch.menu_text().starts_with("🍕 PIZZAS:"));

    let conv = orch.start();
    let (conv, _) = orch.chat_turn(conv, "I'd like pepperoni");
    let (conv, reply) = orch.chat_turn(conv, "Two medium, with extra mushrooms");
    assert_eq!(reply, "Two mediums it is. Pickup or delivery?");
    assert_eq!(conv.user_turns(), 2);

    let checkout = orch.checkout(&conv).unwrap();
    let totals: Vec<(f64, f64)> = checkout
        .line_items
        .iter()
        .map(|l| (l.unit_price, l.subtotal))
        .collect();
    assert_eq!(totals, vec![(18.99, 37.98), (2.0, 6.0), (0.0, 0.0)]);
    assert_eq!(checkout.total, 43.98);
    assert_eq!(checkout.rows_saved, 3);
    assert!(checkout.issues.as_deref().unwrap().contains("root beer"));

    let log = orch.order_log();
    let rows = log.entries().unwrap();
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|r| r.timestamp == checkout.timestamp));
    assert!(rows
        .iter()
        .all(|r| r.address.as_deref() == Some("12 Main St, Springfield")));
    let kinds: Vec<&str> = rows.iter().map(|r| r.kind.as_str()).collect();
    assert_eq!(kinds, vec!["🍕 Pizza", "🥓 Topping", "🥤 Drink"]);

    let stats = log.stats().unwrap();
    assert_eq!(stats.order_count, 1);
    assert!((stats.revenue - 43.98).abs() < 1e-9);
}

#[test]
fn test_prose_only_checkout_can_be_retried() {
    let dir = tempfile::tempdir().unwrap();
    let orch = build(
        ScriptedModel::new(&[
            "I'm not sure what you ordered yet, could you tell me?",
            "{\"sides\":[{\"name\":\"fries\",\"size\":\"L\",\"qty\":2}]}",
        ]),
        &dir,
    );
    let conv = orch.start();

    let err = orch.checkout(&conv).unwrap_err();
    assert!(matches!(err, PizzeriaError::Parse(_)));
    assert!(err.is_retryable());

    let checkout = orch.checkout(&conv).unwrap();
    assert_eq!(checkout.total, 11.98);
}

#[test]
fn test_orders_accumulate_across_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let orch = build(
        ScriptedModel::new(&[
            "{\"drinks\":[{\"name\":\"water\"}]}",
            "{\"sides\":[{\"name\":\"caesar salad\"}]}",
        ]),
        &dir,
    );

    let first = orch.checkout(&orch.start()).unwrap();
    let second = orch.checkout(&orch.reset()).unwrap();
    assert_eq!(first.total + second.total, 1.99 + 7.99);

    let stats = orch.order_log().stats().unwrap();
    assert_eq!(stats.line_count, 2);
    assert!((stats.revenue - 9.98).abs() < 1e-9);
}

// =============================================================================
// HTTP relay
// =============================================================================

#[test]
fn test_chat_and_checkout_over_http() {
    let dir = tempfile::tempdir().unwrap();
    let endpoint = serve_sequence(vec![
        ollama_reply("Sure thing! One large supreme coming up."),
        ollama_reply("Sure! ```json\n{\"pizzas\":[{\"name\":\"Supreme\",\"size\":\"l\",\"qty\":1}],\"delivery_method\":\"pickup\"}\n```"),
    ]);
    let relay = ChatRelay::new(&endpoint, Duration::from_secs(5), Duration::from_secs(1)).unwrap();
    let orch = build(relay, &dir);

    let (conv, reply) = orch.chat_turn(orch.start(), "One large supreme");
    assert_eq!(reply, "Sure thing! One large supreme coming up.");

    let checkout = orch.checkout(&conv).unwrap();
    assert_eq!(checkout.line_items[0].name, "Supreme");
    assert_eq!(checkout.line_items[0].size, "l");
    assert_eq!(checkout.total, 25.99);
}

#[test]
fn test_unreachable_model_reply_and_checkout() {
    let dir = tempfile::tempdir().unwrap();
    let closed = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        format!("http://{}", listener.local_addr().unwrap())
    };
    let relay = ChatRelay::new(&closed, Duration::from_secs(2), Duration::from_secs(1)).unwrap();
    assert!(!relay.health_check());
    let orch = build(relay, &dir);

    let (conv, reply) = orch.chat_turn(orch.start(), "hello");
    assert!(reply.starts_with("ERROR"));

    let err = orch.checkout(&conv).unwrap_err();
    assert!(matches!(err, PizzeriaError::Connectivity(_)));
    assert!(!dir.path().join("orders.csv").exists());
}

#[test]
fn test_request_body_shape() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let endpoint = format!("http://{}", listener.local_addr().unwrap());
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut raw = Vec::new();
        let mut chunk = [0u8; 4096];
        let body: Value = loop {
            let n = stream.read(&mut chunk).unwrap();
            raw.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&raw).to_string();
            if let Some((_, body)) = text.split_once("\r\n\r\n") {
                if let Ok(value) = serde_json::from_str(body) {
                    break value;
                }
            }
        };
        let reply = ollama_reply("ok");
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            reply.len(),
            reply
        );
        stream.write_all(response.as_bytes()).unwrap();
        body
    });

    let relay = ChatRelay::new(&endpoint, Duration::from_secs(5), Duration::from_secs(1)).unwrap();
    let reply = relay.send(
        "mistral",
        &[ChatMessage::system("menu"), ChatMessage::user("hi")],
    );
    assert_eq!(reply, "ok");

    let body = handle.join().unwrap();
    assert_eq!(
        body,
        json!({
            "model": "mistral",
            "messages": [
                {"role": "system", "content": "menu"},
                {"role": "user", "content": "hi"}
            ],
            "stream": false
        })
    );
}
