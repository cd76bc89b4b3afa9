//! Price lookup and order totals.

use tracing::{debug, warn};

use pizzeria_core::error::{PizzeriaError, Result};
use pizzeria_core::types::{
    normalize_name, title_case, Category, LineItem, Menu, Order, OrderItem, PriceEntry,
    PriceTable, PriceValue, NO_SIZE,
};

/// Size label preferred when an item has sizes but none was requested.
pub const DEFAULT_SIZE: &str = "REG";

/// Result of pricing an order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OrderSummary {
    /// Sum of line subtotals, rounded to cents.
    pub total: f64,
    /// Priced lines: pizzas, toppings, drinks, sides, each in request order.
    pub line_items: Vec<LineItem>,
}

impl OrderSummary {
    pub fn is_empty(&self) -> bool {
        self.line_items.is_empty()
    }
}

/// Round to two decimal places.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Unit price of `name` in `table`, or 0 when it cannot be resolved.
///
/// Names match case-insensitively. A flat entry ignores `size`. For a sized
/// entry the requested size is matched on its trimmed upper-case form; with
/// no size the `REG` price is used, else the first numeric price. A
/// requested size the item does not offer prices at 0.
pub fn price_lookup(table: &PriceTable, name: Option<&str>, size: Option<&str>) -> f64 {
    let Some(key) = name.map(normalize_name).filter(|k| !k.is_empty()) else {
        return 0.0;
    };
    let Some(entry) = table.get(&key) else {
        return 0.0;
    };

    match entry {
        PriceEntry::Flat(price) => price.amount().unwrap_or(0.0),
        PriceEntry::Sized(sizes) => match requested_size(size) {
            Some(wanted) => sizes
                .iter()
                .find(|(label, _)| size_key(label) == wanted)
                .and_then(|(_, price)| price.amount())
                .unwrap_or(0.0),
            None => sizes
                .get(DEFAULT_SIZE)
                .and_then(PriceValue::amount)
                .or_else(|| sizes.values().find_map(PriceValue::amount))
                .unwrap_or(0.0),
        },
    }
}

/// Price every item of `order` against `menu`.
///
/// Never fails. A missing quantity counts as 1 and a missing name produces
/// an empty-named line priced at 0. Each line subtotal is rounded to cents
/// before it is added to the total.
pub fn compute_total(order: &Order, menu: &Menu) -> OrderSummary {
    let mut total = 0.0;
    let mut line_items = Vec::new();

    for category in Category::PRICING_ORDER {
        let table = menu.table(category);
        for item in order.items(category) {
            let line = price_item(category, table, item);
            total += line.subtotal;
            line_items.push(line);
        }
    }

    let summary = OrderSummary {
        total: round_cents(total),
        line_items,
    };
    debug!(
        lines = summary.line_items.len(),
        total = summary.total,
        "Order priced"
    );
    summary
}

fn price_item(category: Category, table: &PriceTable, item: &OrderItem) -> LineItem {
    let size = effective_size(category, item);
    let unit_price = price_lookup(table, item.name.as_deref(), size);
    let qty = item.qty.max(1);

    if unit_price == 0.0 {
        warn!(
            category = %category,
            name = item.name.as_deref().unwrap_or(""),
            size = size.unwrap_or(NO_SIZE),
            "Item priced at zero"
        );
    }

    LineItem {
        category,
        name: item.name.as_deref().map(title_case).unwrap_or_default(),
        size: size
            .map(str::to_string)
            .unwrap_or_else(|| NO_SIZE.to_string()),
        qty,
        unit_price,
        subtotal: round_cents(unit_price * f64::from(qty)),
    }
}

/// Check that every item names something on the menu in an offered size.
///
/// Returns a [`PizzeriaError::Pricing`] listing every problem found.
pub fn validate(order: &Order, menu: &Menu) -> Result<()> {
    let mut problems = Vec::new();

    for category in Category::PRICING_ORDER {
        let table = menu.table(category);
        for (idx, item) in order.items(category).iter().enumerate() {
            let Some(name) = item.name.as_deref() else {
                problems.push(format!("{} #{} has no name", category, idx + 1));
                continue;
            };
            let Some(entry) = table.get(&normalize_name(name)) else {
                problems.push(format!("{} '{}' is not on the menu", category, name));
                continue;
            };
            if let (PriceEntry::Sized(sizes), Some(size)) = (entry, effective_size(category, item))
            {
                let wanted = size_key(size);
                if !wanted.is_empty() && !sizes.keys().any(|label| size_key(label) == wanted) {
                    let offered: Vec<&str> = sizes.keys().map(String::as_str).collect();
                    problems.push(format!(
                        "{} '{}' has no size '{}' (offered: {})",
                        category,
                        name,
                        size,
                        offered.join(", ")
                    ));
                }
            }
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(PizzeriaError::Pricing(problems.join("; ")))
    }
}

fn effective_size(category: Category, item: &OrderItem) -> Option<&str> {
    if category.uses_size() {
        item.size.as_deref()
    } else {
        None
    }
}

fn requested_size(size: Option<&str>) -> Option<String> {
    size.map(size_key).filter(|s| !s.is_empty())
}

fn size_key(label: &str) -> String {
    label.trim().to_uppercase()
}
