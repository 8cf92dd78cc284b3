mod common;

use anyhow::Result;
use budgetlens::application::AppError;
use budgetlens::domain::BudgetStatus;
use common::{StandardCategories, month, record, test_service};

#[tokio::test]
async fn test_budget_set_and_list() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardCategories::create(&service).await?;

    let (budget, category) = service.set_budget("Groceries", month("2024-06"), 40000).await?;
    assert_eq!(category.name, "Groceries");
    assert_eq!(budget.planned_amount, 40000);
    assert_eq!(budget.period, month("2024-06"));

    service.set_budget("Rent", month("2024-06"), 90000).await?;
    service.set_budget("Rent", month("2024-07"), 90000).await?;

    assert_eq!(service.list_budgets(None).await?.len(), 3);
    assert_eq!(service.list_budgets(Some(month("2024-06"))).await?.len(), 2);
    assert_eq!(service.list_budgets(Some(month("2024-08"))).await?.len(), 0);

    Ok(())
}

#[tokio::test]
async fn test_budget_set_replaces_existing_amount() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardCategories::create(&service).await?;

    let (first, _) = service.set_budget("Groceries", month("2024-06"), 40000).await?;
    let (second, _) = service.set_budget("Groceries", month("2024-06"), 35000).await?;

    assert_eq!(first.id, second.id);
    assert_eq!(second.planned_amount, 35000);

    let budgets = service.list_budgets(Some(month("2024-06"))).await?;
    assert_eq!(budgets.len(), 1);
    assert_eq!(budgets[0].planned_amount, 35000);

    Ok(())
}

#[tokio::test]
async fn test_budget_validation() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardCategories::create(&service).await?;

    let result = service.set_budget("Groceries", month("2024-06"), -100).await;
    assert!(matches!(result, Err(AppError::InvalidAmount(_))));

    let result = service.set_budget("Salary", month("2024-06"), 10000).await;
    assert!(matches!(result, Err(AppError::BudgetOnIncomeCategory(_))));

    let result = service.set_budget("Nope", month("2024-06"), 10000).await;
    assert!(matches!(result, Err(AppError::CategoryNotFound(_))));

    // Zero is a valid plan
    let (budget, _) = service.set_budget("Dining", month("2024-06"), 0).await?;
    assert_eq!(budget.planned_amount, 0);

    Ok(())
}

#[tokio::test]
async fn test_budget_delete() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardCategories::create(&service).await?;

    service.set_budget("Groceries", month("2024-06"), 40000).await?;
    let deleted = service.delete_budget("Groceries", month("2024-06")).await?;
    assert_eq!(deleted.planned_amount, 40000);
    assert!(service.list_budgets(None).await?.is_empty());

    let result = service.delete_budget("Groceries", month("2024-06")).await;
    assert!(matches!(result, Err(AppError::BudgetNotFound { .. })));

    Ok(())
}

#[tokio::test]
async fn test_budget_comparison_boundary() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardCategories::create(&service).await?;

    service.set_budget("Groceries", month("2024-06"), 50000).await?;
    service.set_budget("Dining", month("2024-06"), 50000).await?;
    record(&service, "Groceries", 50000, "2024-06-10", "exactly on plan").await?;
    record(&service, "Dining", 50001, "2024-06-11", "one cent over").await?;

    let report = service.get_budget_comparison(month("2024-06")).await?;
    assert_eq!(report.comparisons.len(), 2);

    let dining = &report.comparisons[0];
    assert_eq!(dining.category_name, "Dining");
    assert_eq!(dining.variance, 1);
    assert_eq!(dining.status, BudgetStatus::OverBudget);

    let groceries = &report.comparisons[1];
    assert_eq!(groceries.category_name, "Groceries");
    assert_eq!(groceries.variance, 0);
    assert_eq!(groceries.remaining, 0);
    assert_eq!(groceries.percentage_used, 100.0);
    assert_eq!(groceries.status, BudgetStatus::WithinBudget);

    assert_eq!(report.total_planned, 100000);
    assert_eq!(report.total_actual, 100001);
    assert_eq!(report.over_budget_count(), 1);

    Ok(())
}

#[tokio::test]
async fn test_budget_comparison_ignores_unbudgeted_and_other_months() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardCategories::create(&service).await?;

    service.set_budget("Groceries", month("2024-06"), 20000).await?;
    record(&service, "Groceries", 5000, "2024-06-30", "in month").await?;
    record(&service, "Groceries", 9000, "2024-07-01", "next month").await?;
    record(&service, "Groceries", 9000, "2024-05-31", "previous month").await?;
    record(&service, "Rent", 90000, "2024-06-01", "no budget").await?;

    let report = service.get_budget_comparison(month("2024-06")).await?;
    assert_eq!(report.comparisons.len(), 1);
    assert_eq!(report.comparisons[0].actual_amount, 5000);
    assert_eq!(report.comparisons[0].percentage_used, 25.0);

    Ok(())
}

#[tokio::test]
async fn test_deleting_category_removes_its_budgets() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardCategories::create(&service).await?;

    service.set_budget("Dining", month("2024-06"), 20000).await?;
    record(&service, "Dining", 1500, "2024-06-02", "coffee").await?;

    service.delete_category("Dining", None).await?;

    assert!(service.list_budgets(None).await?.is_empty());
    assert!(service.list_all_transactions().await?.is_empty());

    Ok(())
}
