use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// Menu
// =============================================================================

/// Menu category. Declaration order is the pricing order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Pizzas,
    Toppings,
    Drinks,
    Sides,
}

impl Category {
    /// Order in which line items are produced and totals accumulated.
    pub const PRICING_ORDER: [Category; 4] = [
        Category::Pizzas,
        Category::Toppings,
        Category::Drinks,
        Category::Sides,
    ];

    /// Order in which the menu is rendered as text.
    pub const DISPLAY_ORDER: [Category; 4] = [
        Category::Pizzas,
        Category::Toppings,
        Category::Sides,
        Category::Drinks,
    ];

    /// Key used in the menu file and in order JSON.
    pub fn key(&self) -> &'static str {
        match self {
            Category::Pizzas => "pizzas",
            Category::Toppings => "toppings",
            Category::Drinks => "drinks",
            Category::Sides => "sides",
        }
    }

    /// Label used on line items and in the order log.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Pizzas => "🍕 Pizza",
            Category::Toppings => "🥓 Topping",
            Category::Drinks => "🥤 Drink",
            Category::Sides => "🍟 Side",
        }
    }

    /// Section heading used when rendering the menu.
    pub fn heading(&self) -> &'static str {
        match self {
            Category::Pizzas => "🍕 PIZZAS:",
            Category::Toppings => "🥓 TOPPINGS:",
            Category::Drinks => "🥤 DRINKS:",
            Category::Sides => "🍟 SIDES:",
        }
    }

    /// Whether a requested size takes part in the price lookup.
    ///
    /// Toppings are always priced by name alone.
    pub fn uses_size(&self) -> bool {
        !matches!(self, Category::Toppings)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// A single stored price.
///
/// Menu files are hand-edited, so a price may arrive as a string, or as
/// `null` or some other JSON value. Such values are kept verbatim: they price
/// if they parse as a number and otherwise render as raw text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriceValue {
    Amount(f64),
    Text(String),
    Other(Value),
}

impl PriceValue {
    /// Numeric value of this price, if it has one.
    pub fn amount(&self) -> Option<f64> {
        match self {
            PriceValue::Amount(v) if v.is_finite() => Some(*v),
            PriceValue::Amount(_) => None,
            PriceValue::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            PriceValue::Other(_) => None,
        }
    }

    /// `$12.99` for numeric values, the raw value otherwise.
    pub fn display(&self) -> String {
        match (self.amount(), self) {
            (Some(v), _) => format!("${:.2}", v),
            (None, PriceValue::Text(s)) => s.clone(),
            (None, PriceValue::Amount(v)) => v.to_string(),
            (None, PriceValue::Other(v)) => v.to_string(),
        }
    }
}

impl From<f64> for PriceValue {
    fn from(v: f64) -> Self {
        PriceValue::Amount(v)
    }
}

/// Price of one menu item: a single flat price or one price per size label.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriceEntry {
    // Sized first: any JSON value is a flat price.
    Sized(IndexMap<String, PriceValue>),
    Flat(PriceValue),
}

impl PriceEntry {
    /// Build a sized entry from `(label, price)` pairs, keeping their order.
    pub fn sized(sizes: &[(&str, f64)]) -> Self {
        PriceEntry::Sized(
            sizes
                .iter()
                .map(|(label, price)| (label.to_string(), PriceValue::Amount(*price)))
                .collect(),
        )
    }

    /// Build a flat entry.
    pub fn flat(price: f64) -> Self {
        PriceEntry::Flat(PriceValue::Amount(price))
    }

    fn values(&self) -> Box<dyn Iterator<Item = &PriceValue> + '_> {
        match self {
            PriceEntry::Flat(v) => Box::new(std::iter::once(v)),
            PriceEntry::Sized(sizes) => Box::new(sizes.values()),
        }
    }
}

/// Items of one category keyed by lower-case name, in file order.
pub type PriceTable = IndexMap<String, PriceEntry>;

/// The restaurant menu.
///
/// Unknown top-level keys in the menu file are ignored; missing categories
/// are empty.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Menu {
    #[serde(default)]
    pub pizzas: PriceTable,
    #[serde(default)]
    pub toppings: PriceTable,
    #[serde(default)]
    pub drinks: PriceTable,
    #[serde(default)]
    pub sides: PriceTable,
}

impl Menu {
    /// Price table for a category.
    pub fn table(&self, category: Category) -> &PriceTable {
        match category {
            Category::Pizzas => &self.pizzas,
            Category::Toppings => &self.toppings,
            Category::Drinks => &self.drinks,
            Category::Sides => &self.sides,
        }
    }

    fn table_mut(&mut self, category: Category) -> &mut PriceTable {
        match category {
            Category::Pizzas => &mut self.pizzas,
            Category::Toppings => &mut self.toppings,
            Category::Drinks => &mut self.drinks,
            Category::Sides => &mut self.sides,
        }
    }

    /// True when no category has any item.
    pub fn is_empty(&self) -> bool {
        Category::PRICING_ORDER
            .iter()
            .all(|c| self.table(*c).is_empty())
    }

    /// Total number of items across all categories.
    pub fn item_count(&self) -> usize {
        Category::PRICING_ORDER
            .iter()
            .map(|c| self.table(*c).len())
            .sum()
    }

    /// Insert or replace an item, normalizing its name.
    pub fn insert(&mut self, category: Category, name: &str, entry: PriceEntry) {
        self.table_mut(category).insert(normalize_name(name), entry);
    }

    /// Rewrite every item key to its trimmed lower-case form.
    ///
    /// When two keys collapse to the same name the later one wins, keeping
    /// the position of the first.
    pub fn normalized(self) -> Menu {
        let mut out = Menu::default();
        for category in Category::PRICING_ORDER {
            for (name, entry) in self.table(category) {
                out.insert(category, name, entry.clone());
            }
        }
        out
    }

    /// Check that every numeric price is non-negative.
    ///
    /// Returns a description of every offending price.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut problems = Vec::new();
        for category in Category::PRICING_ORDER {
            for (name, entry) in self.table(category) {
                if entry.values().filter_map(PriceValue::amount).any(|v| v < 0.0) {
                    problems.push(format!("{}/{} has a negative price", category, name));
                }
            }
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }
}

/// Lower-case, trimmed form of an item name used as a lookup key.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Title-case a name for display: `"extra cheese"` becomes `"Extra Cheese"`.
///
/// A letter is capitalized when it does not follow another letter, so
/// `"coca-cola"` becomes `"Coca-Cola"`.
pub fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_alpha = false;
    for c in name.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

// =============================================================================
// Order
// =============================================================================

/// One requested item as the model described it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OrderItem {
    /// Item name; `None` when the model left it out.
    pub name: Option<String>,
    /// Requested size label.
    pub size: Option<String>,
    /// Quantity, at least 1.
    pub qty: u32,
    /// Which pizza a topping goes on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applies_to: Option<String>,
}

impl Default for OrderItem {
    fn default() -> Self {
        Self {
            name: None,
            size: None,
            qty: 1,
            applies_to: None,
        }
    }
}

impl OrderItem {
    /// An item with the given name, no size, and quantity 1.
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Self::default()
        }
    }

    /// Builder-style size setter.
    pub fn with_size(mut self, size: &str) -> Self {
        self.size = Some(size.to_string());
        self
    }

    /// Builder-style quantity setter. Quantities below 1 become 1.
    pub fn with_qty(mut self, qty: u32) -> Self {
        self.qty = qty.max(1);
        self
    }

    /// Decode an item leniently from model output.
    ///
    /// A bare string is taken as the item name. Missing or malformed fields
    /// fall back to defaults: no name, no size, quantity 1.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(name) => Self {
                name: non_blank(name),
                ..Self::default()
            },
            Value::Object(fields) => Self {
                name: fields.get("name").and_then(text_field),
                size: fields.get("size").and_then(text_field),
                qty: fields
                    .get("qty")
                    .or_else(|| fields.get("quantity"))
                    .map(quantity_field)
                    .unwrap_or(1),
                applies_to: fields.get("applies_to").and_then(text_field),
            },
            _ => Self::default(),
        }
    }
}

/// Structured order produced from a model reply.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Order {
    pub pizzas: Vec<OrderItem>,
    pub toppings: Vec<OrderItem>,
    pub drinks: Vec<OrderItem>,
    pub sides: Vec<OrderItem>,
    pub delivery_method: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

impl Order {
    /// Items requested in a category.
    pub fn items(&self, category: Category) -> &[OrderItem] {
        match category {
            Category::Pizzas => &self.pizzas,
            Category::Toppings => &self.toppings,
            Category::Drinks => &self.drinks,
            Category::Sides => &self.sides,
        }
    }

    /// True when no category has any item.
    pub fn is_empty(&self) -> bool {
        Category::PRICING_ORDER
            .iter()
            .all(|c| self.items(*c).is_empty())
    }

    /// Decode an order leniently from a parsed JSON value.
    ///
    /// Non-object input yields an empty order. A category that is not an
    /// array is treated as empty.
    pub fn from_value(value: &Value) -> Self {
        let Value::Object(fields) = value else {
            return Self::default();
        };
        let items = |key: &str| -> Vec<OrderItem> {
            match fields.get(key) {
                Some(Value::Array(entries)) => entries.iter().map(OrderItem::from_value).collect(),
                _ => Vec::new(),
            }
        };
        Self {
            pizzas: items(Category::Pizzas.key()),
            toppings: items(Category::Toppings.key()),
            drinks: items(Category::Drinks.key()),
            sides: items(Category::Sides.key()),
            delivery_method: fields.get("delivery_method").and_then(text_field),
            address: fields.get("address").and_then(text_field),
            notes: fields.get("notes").and_then(text_field),
        }
    }
}

impl<'de> Deserialize<'de> for Order {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Order::from_value(&value))
    }
}

fn non_blank(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn text_field(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => non_blank(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn quantity_field(value: &Value) -> u32 {
    let raw = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match raw {
        Some(q) if q.is_finite() && q >= 1.0 => q.trunc().min(f64::from(u32::MAX)) as u32,
        _ => 1,
    }
}

// =============================================================================
// Line items
// =============================================================================

/// Placeholder shown for items without a size.
pub const NO_SIZE: &str = "-";

/// One resolved, priced entry of an order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub category: Category,
    /// Title-cased display name; empty when the order omitted it.
    pub name: String,
    /// Requested size or [`NO_SIZE`].
    pub size: String,
    pub qty: u32,
    pub unit_price: f64,
    /// `unit_price * qty`, rounded to cents.
    pub subtotal: f64,
}

impl LineItem {
    /// Category label, e.g. `🍕 Pizza`.
    pub fn label(&self) -> &'static str {
        self.category.label()
    }
}

// =============================================================================
// Chat
// =============================================================================

/// Author of a chat message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A role-tagged message exchanged with the language model.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}
