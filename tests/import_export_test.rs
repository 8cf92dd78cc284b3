mod common;

use anyhow::Result;
use budgetlens::domain::{SummaryWindow, TransactionType};
use budgetlens::io::{DatabaseSnapshot, Exporter, ImportOptions, Importer};
use common::{StandardCategories, month, parse_date, record, test_service};

#[tokio::test]
async fn test_export_transactions_csv() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardCategories::create(&service).await?;

    record(&service, "Groceries", 4550, "2024-06-01", "market, organic").await?;
    record(&service, "Salary", 300000, "2024-06-02", "pay").await?;

    let mut buffer = Vec::new();
    let count = Exporter::new(&service)
        .export_transactions_csv(&mut buffer)
        .await?;
    assert_eq!(count, 2);

    let csv = String::from_utf8(buffer)?;
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "id,date,type,category,amount,description");
    assert!(lines[1].ends_with(",2024-06-01,expense,Groceries,45.50,\"market, organic\""));
    assert!(lines[2].ends_with(",2024-06-02,income,Salary,3000.00,pay"));

    Ok(())
}

#[tokio::test]
async fn test_export_categories_and_budgets_csv() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardCategories::create(&service).await?;
    service.set_budget("Groceries", month("2024-06"), 40000).await?;
    record(&service, "Groceries", 1234, "2024-06-01", "").await?;

    let exporter = Exporter::new(&service);

    let mut buffer = Vec::new();
    assert_eq!(exporter.export_categories_csv(&mut buffer).await?, 5);
    let csv = String::from_utf8(buffer)?;
    assert!(csv.starts_with("name,kind,color,transaction_count,total_amount\n"));
    assert!(csv.contains("Groceries,expense,#9a3412,1,12.34"));

    let mut buffer = Vec::new();
    assert_eq!(exporter.export_budgets_csv(&mut buffer).await?, 1);
    let csv = String::from_utf8(buffer)?;
    assert_eq!(csv, "category,period,planned_amount\nGroceries,2024-06,400.00\n");

    Ok(())
}

#[tokio::test]
async fn test_export_full_json_snapshot() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardCategories::create(&service).await?;
    service.set_budget("Rent", month("2024-06"), 90000).await?;
    record(&service, "Rent", 90000, "2024-06-01", "rent").await?;

    let mut buffer = Vec::new();
    let snapshot = Exporter::new(&service).export_full_json(&mut buffer).await?;
    assert_eq!(snapshot.categories.len(), 5);
    assert_eq!(snapshot.transactions.len(), 1);
    assert_eq!(snapshot.budgets.len(), 1);

    let parsed: DatabaseSnapshot = serde_json::from_slice(&buffer)?;
    assert_eq!(parsed.transactions[0].amount, 90000);
    assert_eq!(parsed.budgets[0].period, month("2024-06"));

    Ok(())
}

#[tokio::test]
async fn test_export_summary_json() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardCategories::create(&service).await?;
    record(&service, "Salary", 200000, "2024-06-01", "pay").await?;

    let window = SummaryWindow::trailing_year(parse_date("2024-06-15"));
    let summary = service.get_summary(&window).await?;

    let mut buffer = Vec::new();
    Exporter::new(&service).export_summary_json(&summary, &mut buffer)?;
    let json: serde_json::Value = serde_json::from_slice(&buffer)?;
    assert_eq!(json["total_income"], "2000.00");
    assert_eq!(json["income_by_category"][0]["percentage"], 100.0);

    Ok(())
}

#[tokio::test]
async fn test_import_transactions_csv() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardCategories::create(&service).await?;

    let csv = "\
date,category,amount,description
2024-06-01,Groceries,45.50,market
2024-06-02,Salary,3000,pay
2024-06-03,Groceries,abc,broken amount
2024-13-01,Groceries,10,broken date
2024-06-04,Unknown,10,no category
";

    let result = Importer::new(&service)
        .import_transactions_csv(csv.as_bytes(), ImportOptions::default())
        .await?;

    assert_eq!(result.imported, 2);
    assert_eq!(result.created_categories, 0);
    assert_eq!(result.errors.len(), 3);
    assert_eq!(result.errors[0].line, 4);
    assert_eq!(result.errors[0].field.as_deref(), Some("amount"));
    assert_eq!(result.errors[1].line, 5);
    assert_eq!(result.errors[1].field.as_deref(), Some("date"));
    assert_eq!(result.errors[2].field.as_deref(), Some("category"));

    let transactions = service.list_all_transactions().await?;
    assert_eq!(transactions.len(), 2);
    assert_eq!(transactions[0].amount, 4550);
    assert_eq!(transactions[1].transaction_type, TransactionType::Income);

    Ok(())
}

#[tokio::test]
async fn test_import_dry_run_writes_nothing() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardCategories::create(&service).await?;

    let csv = "date,category,amount,description\n2024-06-01,Groceries,45.50,market\n";
    let result = Importer::new(&service)
        .import_transactions_csv(
            csv.as_bytes(),
            ImportOptions {
                dry_run: true,
                create_categories: false,
            },
        )
        .await?;

    assert_eq!(result.imported, 1);
    assert!(result.errors.is_empty());
    assert!(service.list_all_transactions().await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_import_creates_categories_with_type_column() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let csv = "\
date,type,category,amount,description
2024-06-01,expense,Pets,30.00,food
2024-06-02,expense,Pets,12.00,toy
2024-06-03,,Hobbies,5.00,no type
";

    let result = Importer::new(&service)
        .import_transactions_csv(
            csv.as_bytes(),
            ImportOptions {
                dry_run: false,
                create_categories: true,
            },
        )
        .await?;

    assert_eq!(result.imported, 2);
    assert_eq!(result.created_categories, 1);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].field.as_deref(), Some("type"));

    let pets = service.get_category("Pets", None).await?;
    assert_eq!(pets.kind, TransactionType::Expense);

    Ok(())
}

#[tokio::test]
async fn test_export_then_import_into_fresh_ledger() -> Result<()> {
    let (source, _temp_a) = test_service().await?;
    StandardCategories::create(&source).await?;
    record(&source, "Groceries", 4550, "2024-06-01", "market").await?;
    record(&source, "Salary", 300000, "2024-06-02", "pay").await?;

    let mut buffer = Vec::new();
    Exporter::new(&source)
        .export_transactions_csv(&mut buffer)
        .await?;

    let (target, _temp_b) = test_service().await?;
    let result = Importer::new(&target)
        .import_transactions_csv(
            buffer.as_slice(),
            ImportOptions {
                dry_run: false,
                create_categories: true,
            },
        )
        .await?;

    assert_eq!(result.imported, 2);
    assert_eq!(result.created_categories, 2);

    let window = SummaryWindow::trailing_year(parse_date("2024-06-30"));
    let summary = target.get_summary(&window).await?;
    assert_eq!(summary.total_income, 300000);
    assert_eq!(summary.total_expenses, 4550);

    Ok(())
}
