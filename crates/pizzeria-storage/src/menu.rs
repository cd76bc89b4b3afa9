//! Menu store: loads the menu file, creating it from the default menu when
//! missing, and renders the menu as text for display and for the model's
//! system prompt.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use pizzeria_core::error::{PizzeriaError, Result};
use pizzeria_core::types::{title_case, Category, Menu, PriceEntry};

/// Returned by [`render_as_text`] for a menu with no items.
pub const EMPTY_MENU_TEXT: &str = "No menu available.";

/// File-backed menu.
#[derive(Debug, Clone)]
pub struct MenuStore {
    path: PathBuf,
}

impl MenuStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the menu file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the menu, failing on a corrupt or invalid file.
    ///
    /// A missing file is not an error: the default menu is returned and
    /// written to disk. Failure to write it is logged and otherwise ignored.
    pub fn try_load(&self) -> Result<Menu> {
        if !self.path.exists() {
            let menu = default_menu();
            match self.save(&menu) {
                Ok(()) => info!(
                    path = %self.path.display(),
                    "Created sample menu file. You can customize it!"
                ),
                Err(e) => warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Could not create sample menu"
                ),
            }
            return Ok(menu);
        }

        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            PizzeriaError::Storage(format!("Failed to read {}: {}", self.path.display(), e))
        })?;
        let menu: Menu = serde_json::from_str(&content).map_err(|e| {
            PizzeriaError::Storage(format!("Failed to parse {}: {}", self.path.display(), e))
        })?;
        let menu = menu.normalized();
        menu.validate().map_err(|problems| {
            PizzeriaError::Storage(format!(
                "Invalid menu in {}: {}",
                self.path.display(),
                problems.join("; ")
            ))
        })?;

        info!(
            path = %self.path.display(),
            items = menu.item_count(),
            "Menu loaded"
        );
        Ok(menu)
    }

    /// Load the menu, returning an empty menu if the file cannot be used.
    pub fn load(&self) -> Menu {
        match self.try_load() {
            Ok(menu) => menu,
            Err(e) => {
                warn!("{}. Using an empty menu.", e);
                Menu::default()
            }
        }
    }

    /// Write the menu as pretty-printed JSON, creating parent directories.
    pub fn save(&self, menu: &Menu) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(menu)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

/// The menu written on first start.
pub fn default_menu() -> Menu {
    let mut menu = Menu::default();

    menu.insert(
        Category::Pizzas,
        "margherita",
        PriceEntry::sized(&[("S", 12.99), ("M", 16.99), ("L", 20.99)]),
    );
    menu.insert(
        Category::Pizzas,
        "pepperoni",
        PriceEntry::sized(&[("S", 14.99), ("M", 18.99), ("L", 22.99)]),
    );
    menu.insert(
        Category::Pizzas,
        "supreme",
        PriceEntry::sized(&[("S", 17.99), ("M", 21.99), ("L", 25.99)]),
    );
    menu.insert(
        Category::Pizzas,
        "vegetarian",
        PriceEntry::sized(&[("S", 15.99), ("M", 19.99), ("L", 23.99)]),
    );

    menu.insert(Category::Toppings, "extra cheese", PriceEntry::flat(2.50));
    menu.insert(Category::Toppings, "mushrooms", PriceEntry::flat(2.00));
    menu.insert(Category::Toppings, "pepperoni", PriceEntry::flat(3.00));
    menu.insert(Category::Toppings, "sausage", PriceEntry::flat(3.00));
    menu.insert(Category::Toppings, "olives", PriceEntry::flat(2.00));
    menu.insert(Category::Toppings, "bell peppers", PriceEntry::flat(2.00));

    menu.insert(
        Category::Drinks,
        "coca cola",
        PriceEntry::sized(&[("S", 2.99), ("M", 3.99), ("L", 4.99)]),
    );
    menu.insert(
        Category::Drinks,
        "sprite",
        PriceEntry::sized(&[("S", 2.99), ("M", 3.99), ("L", 4.99)]),
    );
    menu.insert(Category::Drinks, "water", PriceEntry::flat(1.99));
    menu.insert(
        Category::Drinks,
        "juice",
        PriceEntry::sized(&[("S", 3.99), ("M", 4.99)]),
    );

    menu.insert(Category::Sides, "garlic bread", PriceEntry::flat(5.99));
    menu.insert(
        Category::Sides,
        "chicken wings",
        PriceEntry::sized(&[("6pc", 8.99), ("12pc", 15.99)]),
    );
    menu.insert(Category::Sides, "caesar salad", PriceEntry::flat(7.99));
    menu.insert(
        Category::Sides,
        "fries",
        PriceEntry::sized(&[("S", 3.99), ("L", 5.99)]),
    );

    menu
}

/// Render the menu as an emoji-grouped listing.
///
/// Sections appear as pizzas, toppings, sides, drinks; empty sections are
/// skipped. The same text is embedded in the model's system prompt.
pub fn render_as_text(menu: &Menu) -> String {
    if menu.is_empty() {
        return EMPTY_MENU_TEXT.to_string();
    }

    let mut lines: Vec<String> = Vec::new();
    for category in Category::DISPLAY_ORDER {
        let table = menu.table(category);
        if table.is_empty() {
            continue;
        }
        lines.push(category.heading().to_string());
        for (name, entry) in table {
            lines.push(format!("   • {}", render_entry(name, entry)));
        }
        lines.push(String::new());
    }

    lines.join("\n").trim_end().to_string()
}

fn render_entry(name: &str, entry: &PriceEntry) -> String {
    match entry {
        PriceEntry::Flat(price) => format!("{}: {}", title_case(name), price.display()),
        PriceEntry::Sized(sizes) => {
            let sizes_text = sizes
                .iter()
                .map(|(size, price)| format!("{}: {}", size, price.display()))
                .collect::<Vec<_>>()
                .join(", ");
            format!("{} ({})", title_case(name), sizes_text)
        }
    }
}
