use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{CategoryId, Cents, YearMonth};

pub type BudgetId = Uuid;

/// Planned spending for one expense category in one calendar month.
/// At most one budget exists per (category, period).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: BudgetId,
    pub category_id: CategoryId,
    pub period: YearMonth,
    #[serde(with = "super::as_decimal")]
    pub planned_amount: Cents,
    pub created_at: DateTime<Utc>,
}

impl Budget {
    pub fn new(category_id: CategoryId, period: YearMonth, planned_amount: Cents) -> Self {
        Self {
            id: Uuid::new_v4(),
            category_id,
            period,
            planned_amount,
            created_at: Utc::now(),
        }
    }
}

/// Outcome of comparing actual spending against a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStatus {
    WithinBudget,
    OverBudget,
}

impl BudgetStatus {
    /// Over only when actual strictly exceeds planned.
    pub fn classify(planned: Cents, actual: Cents) -> Self {
        if actual > planned {
            BudgetStatus::OverBudget
        } else {
            BudgetStatus::WithinBudget
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetStatus::WithinBudget => "within_budget",
            BudgetStatus::OverBudget => "over_budget",
        }
    }
}

impl std::fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_boundary() {
        assert_eq!(BudgetStatus::classify(50000, 50000), BudgetStatus::WithinBudget);
        assert_eq!(BudgetStatus::classify(50000, 50001), BudgetStatus::OverBudget);
        assert_eq!(BudgetStatus::classify(50000, 0), BudgetStatus::WithinBudget);
        assert_eq!(BudgetStatus::classify(0, 1), BudgetStatus::OverBudget);
    }

    #[test]
    fn test_budget_serialization() {
        let period: YearMonth = "2024-03".parse().unwrap();
        let budget = Budget::new(Uuid::new_v4(), period, 20000);
        let value = serde_json::to_value(&budget).unwrap();

        assert_eq!(value["period"], "2024-03");
        assert_eq!(value["planned_amount"], "200.00");
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&BudgetStatus::OverBudget).unwrap();
        assert_eq!(json, "\"over_budget\"");
    }
}
