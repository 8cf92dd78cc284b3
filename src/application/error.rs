use thiserror::Error;

use crate::domain::{AggregationError, TransactionType, YearMonth};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Category not found: {0}")]
    CategoryNotFound(String),

    #[error("Invalid category name: {0}")]
    InvalidName(String),

    #[error("Category already exists: {name} ({kind})")]
    CategoryAlreadyExists { name: String, kind: TransactionType },

    #[error("Category '{0}' exists as both income and expense; specify the type")]
    AmbiguousCategory(String),

    #[error("Invalid color '{0}', expected #RRGGBB")]
    InvalidColor(String),

    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    #[error("Budget not found: {category} for {period}")]
    BudgetNotFound { category: String, period: YearMonth },

    #[error("Budgets apply to expense categories only; '{0}' is an income category")]
    BudgetOnIncomeCategory(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error(transparent)]
    InvalidArgument(#[from] AggregationError),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}
