mod common;

use anyhow::Result;
use budgetlens::application::AppError;
use budgetlens::domain::{BudgetStatus, SummaryWindow, TransactionType};
use common::{StandardCategories, month, parse_date, record, test_service};

#[tokio::test]
async fn test_summary_end_to_end() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardCategories::create(&service).await?;

    record(&service, "Groceries", 10000, "2024-06-10", "weekly shop").await?;
    record(&service, "Salary", 200000, "2024-06-01", "June salary").await?;

    let window = SummaryWindow::trailing_year(parse_date("2024-06-15"));
    let summary = service.get_summary(&window).await?;

    assert_eq!(summary.total_income, 200000);
    assert_eq!(summary.total_expenses, 10000);
    assert_eq!(summary.net_balance, 190000);

    assert_eq!(summary.expenses_by_category.len(), 1);
    let groceries = &summary.expenses_by_category[0];
    assert_eq!(groceries.category_name, "Groceries");
    assert_eq!(groceries.amount, 10000);
    assert_eq!(groceries.percentage, 100.0);
    assert_eq!(groceries.color, "#9a3412");
    assert_eq!(groceries.transaction_count, 1);

    assert_eq!(summary.income_by_category.len(), 1);
    assert_eq!(summary.income_by_category[0].category_name, "Salary");

    assert_eq!(summary.monthly_trend.len(), 12);
    assert_eq!(summary.monthly_trend[0].month, month("2023-07"));
    let june = summary.monthly_trend.last().unwrap();
    assert_eq!(june.month, month("2024-06"));
    assert_eq!(june.income, 200000);
    assert_eq!(june.expenses, 10000);
    assert_eq!(june.net, 190000);

    assert!(summary.budget_comparison.is_empty());

    assert_eq!(summary.recent_transactions.len(), 2);
    assert_eq!(summary.recent_transactions[0].description, "weekly shop");
    assert_eq!(
        summary.recent_transactions[0].category_name.as_deref(),
        Some("Groceries")
    );
    assert_eq!(
        summary.recent_transactions[1].transaction_type,
        TransactionType::Income
    );

    Ok(())
}

#[tokio::test]
async fn test_summary_of_empty_ledger() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let window = SummaryWindow::trailing_year(parse_date("2024-06-15"));
    let summary = service.get_summary(&window).await?;

    assert_eq!(summary.total_income, 0);
    assert_eq!(summary.total_expenses, 0);
    assert_eq!(summary.net_balance, 0);
    assert!(summary.income_by_category.is_empty());
    assert!(summary.expenses_by_category.is_empty());
    assert!(summary.budget_comparison.is_empty());
    assert!(summary.recent_transactions.is_empty());

    let months: Vec<String> = summary
        .monthly_trend
        .iter()
        .map(|p| p.month.to_string())
        .collect();
    assert_eq!(months.len(), 12);
    assert_eq!(months.first().map(String::as_str), Some("2023-07"));
    assert_eq!(months.last().map(String::as_str), Some("2024-06"));
    assert!(
        summary
            .monthly_trend
            .iter()
            .all(|p| p.income == 0 && p.expenses == 0 && p.net == 0)
    );

    Ok(())
}

#[tokio::test]
async fn test_summary_excludes_transactions_outside_window() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardCategories::create(&service).await?;

    record(&service, "Rent", 90000, "2024-03-01", "March rent").await?;
    record(&service, "Rent", 90000, "2024-04-01", "April rent").await?;
    record(&service, "Rent", 90000, "2024-05-01", "May rent").await?;

    let window = SummaryWindow::new(
        parse_date("2024-04-01"),
        parse_date("2024-04-30"),
        parse_date("2024-04-30"),
    )
    .with_trend_months(3);
    let summary = service.get_summary(&window).await?;

    assert_eq!(summary.total_expenses, 90000);
    assert_eq!(summary.recent_transactions.len(), 1);
    assert_eq!(summary.recent_transactions[0].description, "April rent");

    // February through April; March rent is outside the window
    let expenses: Vec<i64> = summary.monthly_trend.iter().map(|p| p.expenses).collect();
    assert_eq!(expenses, vec![0, 0, 90000]);

    Ok(())
}

#[tokio::test]
async fn test_summary_budget_comparison_over_budget() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardCategories::create(&service).await?;

    service.set_budget("Dining", month("2024-06"), 20000).await?;
    service.set_budget("Rent", month("2024-06"), 90000).await?;
    record(&service, "Dining", 15000, "2024-06-03", "dinner").await?;
    record(&service, "Dining", 10000, "2024-06-12", "lunch").await?;
    // Previous month spending does not count against June
    record(&service, "Dining", 50000, "2024-05-20", "party").await?;

    let window = SummaryWindow::trailing_year(parse_date("2024-06-15"));
    let summary = service.get_summary(&window).await?;

    assert_eq!(summary.budget_comparison.len(), 2);

    let dining = &summary.budget_comparison[0];
    assert_eq!(dining.category_name, "Dining");
    assert_eq!(dining.planned_amount, 20000);
    assert_eq!(dining.actual_amount, 25000);
    assert_eq!(dining.variance, 5000);
    assert_eq!(dining.remaining, -5000);
    assert_eq!(dining.status, BudgetStatus::OverBudget);

    let rent = &summary.budget_comparison[1];
    assert_eq!(rent.category_name, "Rent");
    assert_eq!(rent.actual_amount, 0);
    assert_eq!(rent.status, BudgetStatus::WithinBudget);

    Ok(())
}

#[tokio::test]
async fn test_summary_recent_transactions_limit() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardCategories::create(&service).await?;

    for day in 1..=7 {
        let date = format!("2024-06-{:02}", day);
        record(&service, "Groceries", 1000 * day, &date, &format!("shop {}", day)).await?;
    }

    let window = SummaryWindow::trailing_year(parse_date("2024-06-30"));
    let summary = service.get_summary(&window).await?;

    let descriptions: Vec<&str> = summary
        .recent_transactions
        .iter()
        .map(|t| t.description.as_str())
        .collect();
    assert_eq!(
        descriptions,
        vec!["shop 7", "shop 6", "shop 5", "shop 4", "shop 3"]
    );

    let window = window.with_recent_limit(2);
    let summary = service.get_summary(&window).await?;
    assert_eq!(summary.recent_transactions.len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_summary_rejects_invalid_window() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let inverted = SummaryWindow::new(
        parse_date("2024-06-30"),
        parse_date("2024-06-01"),
        parse_date("2024-06-30"),
    );
    let err = service.get_summary(&inverted).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidArgument(_)));

    let no_months = SummaryWindow::trailing_year(parse_date("2024-06-30")).with_trend_months(0);
    assert!(matches!(
        service.get_summary(&no_months).await,
        Err(AppError::InvalidArgument(_))
    ));

    let no_recent = SummaryWindow::trailing_year(parse_date("2024-06-30")).with_recent_limit(0);
    assert!(matches!(
        service.get_summary(&no_recent).await,
        Err(AppError::InvalidArgument(_))
    ));

    Ok(())
}

#[tokio::test]
async fn test_summary_is_deterministic() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardCategories::create(&service).await?;

    record(&service, "Groceries", 3333, "2024-06-01", "a").await?;
    record(&service, "Dining", 3333, "2024-06-01", "b").await?;
    record(&service, "Rent", 3334, "2024-06-01", "c").await?;

    let window = SummaryWindow::trailing_year(parse_date("2024-06-15"));
    let first = serde_json::to_string(&service.get_summary(&window).await?)?;
    let second = serde_json::to_string(&service.get_summary(&window).await?)?;
    assert_eq!(first, second);

    let summary = service.get_summary(&window).await?;
    let total: f64 = summary
        .expenses_by_category
        .iter()
        .map(|b| b.percentage)
        .sum();
    assert!((total - 100.0).abs() < 1e-9);

    Ok(())
}

#[tokio::test]
async fn test_summary_json_uses_decimal_strings() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardCategories::create(&service).await?;

    record(&service, "Salary", 200000, "2024-06-01", "salary").await?;
    record(&service, "Groceries", 10000, "2024-06-02", "shop").await?;

    let window = SummaryWindow::trailing_year(parse_date("2024-06-15"));
    let summary = service.get_summary(&window).await?;
    let json = serde_json::to_value(&summary)?;

    assert_eq!(json["total_income"], "2000.00");
    assert_eq!(json["total_expenses"], "100.00");
    assert_eq!(json["net_balance"], "1900.00");
    assert_eq!(json["monthly_trend"][11]["month"], "2024-06");
    assert_eq!(json["recent_transactions"][0]["type"], "expense");

    Ok(())
}
