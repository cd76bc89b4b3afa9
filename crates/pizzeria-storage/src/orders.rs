//! Append-only CSV order log.
//!
//! Each priced line item becomes one row carrying the shared order
//! timestamp and delivery metadata. Monetary columns are plain decimal
//! strings without a currency symbol.
//!
//! Appends take no lock. Two processes writing at the same time can
//! interleave rows; the log is meant for a single front end.

use std::collections::HashSet;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use pizzeria_core::error::{PizzeriaError, Result};
use pizzeria_core::types::{LineItem, Order};

/// One row of the order log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLogEntry {
    /// Seconds since the Unix epoch, shared by every row of one order.
    pub timestamp: i64,
    pub delivery_method: Option<String>,
    pub address: Option<String>,
    /// Category label, e.g. `🍕 Pizza`.
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub size: String,
    pub qty: u32,
    pub unit_price: String,
    pub total: String,
}

impl OrderLogEntry {
    /// Build the row for one line item of `order`.
    pub fn from_line(timestamp: i64, order: &Order, line: &LineItem) -> Self {
        Self {
            timestamp,
            delivery_method: order.delivery_method.clone(),
            address: order.address.clone(),
            kind: line.label().to_string(),
            name: line.name.clone(),
            size: line.size.clone(),
            qty: line.qty,
            unit_price: format!("{:.2}", line.unit_price),
            total: format!("{:.2}", line.subtotal),
        }
    }

    /// Numeric value of the `total` column. Tolerates a leading `$`.
    pub fn total_amount(&self) -> Option<f64> {
        self.total.trim().trim_start_matches('$').parse().ok()
    }
}

/// Aggregate figures over the whole log.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OrderStats {
    /// Number of distinct orders (distinct timestamps).
    pub order_count: usize,
    /// Number of rows.
    pub line_count: usize,
    /// Sum of the `total` column, rounded to cents.
    pub revenue: f64,
}

/// File-backed order log.
#[derive(Debug, Clone)]
pub struct OrderLog {
    path: PathBuf,
}

impl OrderLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one row per line item. Returns the number of rows written.
    ///
    /// The header row is written only when the file is new or empty.
    pub fn append(&self, timestamp: i64, order: &Order, lines: &[LineItem]) -> Result<usize> {
        if lines.is_empty() {
            debug!("No line items to log");
            return Ok(0);
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let needs_header = std::fs::metadata(&self.path)
            .map(|m| m.len() == 0)
            .unwrap_or(true);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);

        for line in lines {
            writer
                .serialize(OrderLogEntry::from_line(timestamp, order, line))
                .map_err(|e| PizzeriaError::Storage(format!("Failed to write order row: {}", e)))?;
        }
        writer.flush()?;

        info!(
            path = %self.path.display(),
            timestamp,
            rows = lines.len(),
            "Order saved"
        );
        Ok(lines.len())
    }

    /// Read every row. A missing log reads as empty.
    pub fn entries(&self) -> Result<Vec<OrderLogEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&self.path).map_err(|e| {
            PizzeriaError::Storage(format!("Failed to open {}: {}", self.path.display(), e))
        })?;
        reader
            .deserialize()
            .collect::<std::result::Result<Vec<OrderLogEntry>, csv::Error>>()
            .map_err(|e| {
                PizzeriaError::Storage(format!("Failed to read {}: {}", self.path.display(), e))
            })
    }

    /// The last `limit` rows, oldest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<OrderLogEntry>> {
        let mut entries = self.entries()?;
        let skip = entries.len().saturating_sub(limit);
        Ok(entries.split_off(skip))
    }

    /// Order count and revenue over the whole log.
    pub fn stats(&self) -> Result<OrderStats> {
        let entries = self.entries()?;
        let orders: HashSet<i64> = entries.iter().map(|e| e.timestamp).collect();
        let revenue: f64 = entries.iter().filter_map(OrderLogEntry::total_amount).sum();
        Ok(OrderStats {
            order_count: orders.len(),
            line_count: entries.len(),
            revenue: (revenue * 100.0).round() / 100.0,
        })
    }
}
