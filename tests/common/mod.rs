// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use budgetlens::application::FinanceService;
use budgetlens::domain::{TransactionType, YearMonth};
use chrono::NaiveDate;
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(FinanceService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = FinanceService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Helper to parse a YYYY-MM-DD string
pub fn parse_date(date_str: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
}

/// Helper to parse a YYYY-MM string
pub fn month(month_str: &str) -> YearMonth {
    month_str.parse().unwrap()
}

/// Test fixture: standard category setup
pub struct StandardCategories;

impl StandardCategories {
    /// Salary and Freelance income, Groceries, Rent and Dining expenses
    pub async fn create(service: &FinanceService) -> Result<()> {
        service
            .create_category("Salary", TransactionType::Income, Some("#10b981"))
            .await?;
        service
            .create_category("Freelance", TransactionType::Income, None)
            .await?;
        service
            .create_category("Groceries", TransactionType::Expense, Some("#9a3412"))
            .await?;
        service
            .create_category("Rent", TransactionType::Expense, Some("#7c2d12"))
            .await?;
        service
            .create_category("Dining", TransactionType::Expense, None)
            .await?;
        Ok(())
    }
}

/// Record a transaction in a category, amount in cents
pub async fn record(
    service: &FinanceService,
    category: &str,
    amount: i64,
    date: &str,
    description: &str,
) -> Result<()> {
    service
        .record_transaction(
            category,
            None,
            amount,
            parse_date(date),
            Some(description.to_string()),
        )
        .await?;
    Ok(())
}
