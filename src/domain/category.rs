use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type CategoryId = Uuid;

/// Fallback display color for new categories.
pub const DEFAULT_COLOR: &str = "#3B82F6";

/// Direction of money flow. Used both as a transaction's type and as a
/// category's kind; the two always agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "income" => Some(TransactionType::Income),
            "expense" | "expenses" => Some(TransactionType::Expense),
            _ => None,
        }
    }

    /// Capitalized label for tables.
    pub fn display_name(&self) -> &'static str {
        match self {
            TransactionType::Income => "Income",
            TransactionType::Expense => "Expense",
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransactionType::from_str(s).ok_or_else(|| format!("expected income or expense, got '{}'", s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    /// Hex display hint, e.g. "#10b981"
    pub color: String,
    pub kind: TransactionType,
    pub created_at: DateTime<Utc>,
}

impl Category {
    pub fn new(name: impl Into<String>, kind: TransactionType) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            color: DEFAULT_COLOR.to_string(),
            kind,
            created_at: Utc::now(),
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }
}

/// Returns true for `#RRGGBB` hex colors.
pub fn is_valid_color(color: &str) -> bool {
    color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Category metadata keyed by id. Passed explicitly into every aggregation
/// so the engine never resolves references on its own.
pub type CategoryLookup = HashMap<CategoryId, Category>;

pub fn index_categories(categories: &[Category]) -> CategoryLookup {
    categories.iter().map(|c| (c.id, c.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_type_roundtrip() {
        for t in [TransactionType::Income, TransactionType::Expense] {
            assert_eq!(TransactionType::from_str(t.as_str()), Some(t));
        }
        assert_eq!(TransactionType::from_str("EXPENSES"), Some(TransactionType::Expense));
        assert_eq!(TransactionType::from_str("transfer"), None);
    }

    #[test]
    fn test_new_category_defaults() {
        let cat = Category::new("Groceries", TransactionType::Expense);
        assert_eq!(cat.color, DEFAULT_COLOR);
        assert_eq!(cat.kind, TransactionType::Expense);

        let cat = cat.with_color("#9a3412");
        assert_eq!(cat.color, "#9a3412");
    }

    #[test]
    fn test_color_validation() {
        assert!(is_valid_color("#3B82F6"));
        assert!(is_valid_color("#9a3412"));
        assert!(!is_valid_color("3B82F6"));
        assert!(!is_valid_color("#3B82F"));
        assert!(!is_valid_color("#GGGGGG"));
    }

    #[test]
    fn test_index_categories() {
        let a = Category::new("Salary", TransactionType::Income);
        let b = Category::new("Rent", TransactionType::Expense);
        let lookup = index_categories(&[a.clone(), b.clone()]);
        assert_eq!(lookup.len(), 2);
        assert_eq!(lookup[&a.id].name, "Salary");
        assert_eq!(lookup[&b.id].kind, TransactionType::Expense);
    }
}
