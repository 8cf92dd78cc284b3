use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{
    BudgetComparison, BudgetStatus, Category, CategoryBreakdown, Cents, MonthlyTrendPoint,
    TransactionType, YearMonth,
};

/// Per-category usage across the whole ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryStats {
    pub category: Category,
    pub transaction_count: i64,
    #[serde(with = "crate::domain::as_decimal")]
    pub total_amount: Cents,
}

/// Category breakdown for an explicit date range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakdownReport {
    pub transaction_type: TransactionType,
    pub from: NaiveDate,
    pub to: NaiveDate,
    #[serde(with = "crate::domain::as_decimal")]
    pub total: Cents,
    pub categories: Vec<CategoryBreakdown>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendReport {
    pub reference_date: NaiveDate,
    pub points: Vec<MonthlyTrendPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetReport {
    pub period: YearMonth,
    #[serde(with = "crate::domain::as_decimal")]
    pub total_planned: Cents,
    #[serde(with = "crate::domain::as_decimal")]
    pub total_actual: Cents,
    pub comparisons: Vec<BudgetComparison>,
}

impl BudgetReport {
    pub fn new(period: YearMonth, comparisons: Vec<BudgetComparison>) -> Self {
        Self {
            period,
            total_planned: comparisons.iter().map(|c| c.planned_amount).sum(),
            total_actual: comparisons.iter().map(|c| c.actual_amount).sum(),
            comparisons,
        }
    }

    pub fn over_budget_count(&self) -> usize {
        self.comparisons
            .iter()
            .filter(|c| c.status == BudgetStatus::OverBudget)
            .count()
    }
}
