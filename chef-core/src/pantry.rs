//! # Pantry
//!
//! The user's tracked food inventory. Keys are normalized item names
//! (trimmed, lowercased); every mutation is infallible.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Quantity recorded when the caller does not give one
pub const DEFAULT_QUANTITY: &str = "1";

/// A single pantry entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PantryItem {
    pub quantity: String,
    pub added_at: DateTime<Local>,
}

/// Result of a pantry mutation, rendered for the user via `Display`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PantryOutcome {
    Added(Vec<String>),
    Removed(Vec<String>),
    NotFound,
}

impl fmt::Display for PantryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added(items) => write!(
                f,
                "✅ Added {} items to pantry: {}",
                items.len(),
                items.join(", ")
            ),
            Self::Removed(items) => write!(f, "✅ Removed from pantry: {}", items.join(", ")),
            Self::NotFound => write!(f, "⚠️ No matching items found in pantry"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pantry {
    items: BTreeMap<String, PantryItem>,
}

impl Pantry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize an item name into a pantry key
    pub fn normalize(name: &str) -> String {
        name.trim().to_lowercase()
    }

    /// Add or overwrite items. `quantities` pairs up by position; items
    /// without a quantity get [`DEFAULT_QUANTITY`]. Blank names are skipped.
    pub fn add_items<S: AsRef<str>>(&mut self, items: &[S], quantities: Option<&[S]>) -> PantryOutcome {
        let now = Local::now();
        let mut added = Vec::new();

        for (i, item) in items.iter().enumerate() {
            let key = Self::normalize(item.as_ref());
            if key.is_empty() {
                continue;
            }
            let quantity = quantities
                .and_then(|q| q.get(i))
                .map(|q| q.as_ref().trim())
                .filter(|q| !q.is_empty())
                .unwrap_or(DEFAULT_QUANTITY)
                .to_string();

            self.items.insert(key, PantryItem { quantity, added_at: now });
            added.push(item.as_ref().trim().to_string());
        }

        PantryOutcome::Added(added)
    }

    /// Remove items that are present; absent names are ignored.
    pub fn remove_items<S: AsRef<str>>(&mut self, items: &[S]) -> PantryOutcome {
        let removed: Vec<String> = items
            .iter()
            .filter(|item| self.items.remove(&Self::normalize(item.as_ref())).is_some())
            .map(|item| item.as_ref().trim().to_string())
            .collect();

        if removed.is_empty() {
            PantryOutcome::NotFound
        } else {
            PantryOutcome::Removed(removed)
        }
    }

    /// Formatted listing shown to the user and injected into prompts
    pub fn list_items(&self) -> String {
        if self.items.is_empty() {
            return "🔍 Your pantry is empty".to_string();
        }

        let lines: Vec<String> = self
            .items
            .iter()
            .map(|(name, item)| format!("  • {}: {}", name, item.quantity))
            .collect();
        format!("📦 Your Pantry ({} items):\n{}", self.items.len(), lines.join("\n"))
    }

    /// Names of available ingredients
    pub fn ingredients(&self) -> Vec<&str> {
        self.items.keys().map(String::as_str).collect()
    }

    pub fn get(&self, name: &str) -> Option<&PantryItem> {
        self.items.get(&Self::normalize(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.items.contains_key(&Self::normalize(name))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
