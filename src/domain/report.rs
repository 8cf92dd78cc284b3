use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{
    BudgetStatus, CategoryId, Cents, SummaryWindow, TransactionId, TransactionType, YearMonth,
};

/// One slice of the income or expense pie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    pub category_id: CategoryId,
    pub category_name: String,
    pub color: String,
    #[serde(with = "super::as_decimal")]
    pub amount: Cents,
    /// Share of the type's total, one decimal place
    pub percentage: f64,
    pub transaction_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyTrendPoint {
    pub month: YearMonth,
    #[serde(with = "super::as_decimal")]
    pub income: Cents,
    #[serde(with = "super::as_decimal")]
    pub expenses: Cents,
    #[serde(with = "super::as_decimal")]
    pub net: Cents,
}

impl MonthlyTrendPoint {
    pub fn new(month: YearMonth, income: Cents, expenses: Cents) -> Self {
        Self {
            month,
            income,
            expenses,
            net: income - expenses,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetComparison {
    pub category_id: CategoryId,
    pub category_name: String,
    pub color: String,
    pub period: YearMonth,
    #[serde(with = "super::as_decimal")]
    pub planned_amount: Cents,
    #[serde(with = "super::as_decimal")]
    pub actual_amount: Cents,
    /// actual - planned; positive means overspend
    #[serde(with = "super::as_decimal")]
    pub variance: Cents,
    /// planned - actual
    #[serde(with = "super::as_decimal")]
    pub remaining: Cents,
    /// actual / planned * 100, one decimal place; 0 for a zero plan
    pub percentage_used: f64,
    pub status: BudgetStatus,
}

/// A transaction as shown in the "recent activity" list, with its category
/// metadata attached when known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentTransaction {
    pub id: TransactionId,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    #[serde(with = "super::as_decimal")]
    pub amount: Cents,
    pub description: String,
    pub category_id: CategoryId,
    pub category_name: Option<String>,
    pub category_color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialSummary {
    pub window: SummaryWindow,
    #[serde(with = "super::as_decimal")]
    pub total_income: Cents,
    #[serde(with = "super::as_decimal")]
    pub total_expenses: Cents,
    #[serde(with = "super::as_decimal")]
    pub net_balance: Cents,
    pub income_by_category: Vec<CategoryBreakdown>,
    pub expenses_by_category: Vec<CategoryBreakdown>,
    pub monthly_trend: Vec<MonthlyTrendPoint>,
    pub budget_comparison: Vec<BudgetComparison>,
    pub recent_transactions: Vec<RecentTransaction>,
}
