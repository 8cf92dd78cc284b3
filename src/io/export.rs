use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::application::FinanceService;
use crate::domain::{format_cents, Budget, Category, FinancialSummary, Transaction};

/// Database snapshot for full export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub categories: Vec<Category>,
    pub transactions: Vec<Transaction>,
    pub budgets: Vec<Budget>,
}

/// Exporter for converting ledger data to various formats
pub struct Exporter<'a> {
    service: &'a FinanceService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a FinanceService) -> Self {
        Self { service }
    }

    /// Export transactions to CSV, in the column layout the importer reads.
    pub async fn export_transactions_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let transactions = self.service.list_all_transactions().await?;
        let categories = self.service.category_lookup().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["id", "date", "type", "category", "amount", "description"])?;

        for transaction in &transactions {
            let category_name = categories
                .get(&transaction.category_id)
                .map(|c| c.name.clone())
                .unwrap_or_default();

            csv_writer.write_record([
                transaction.id.to_string(),
                transaction.date.format("%Y-%m-%d").to_string(),
                transaction.transaction_type.to_string(),
                category_name,
                format_cents(transaction.amount),
                transaction.description.clone(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(transactions.len())
    }

    /// Export categories with their usage to CSV
    pub async fn export_categories_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let stats = self.service.category_stats().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["name", "kind", "color", "transaction_count", "total_amount"])?;

        for entry in &stats {
            csv_writer.write_record([
                entry.category.name.clone(),
                entry.category.kind.to_string(),
                entry.category.color.clone(),
                entry.transaction_count.to_string(),
                format_cents(entry.total_amount),
            ])?;
        }

        csv_writer.flush()?;
        Ok(stats.len())
    }

    /// Export budgets to CSV
    pub async fn export_budgets_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let budgets = self.service.list_budgets(None).await?;
        let categories = self.service.category_lookup().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["category", "period", "planned_amount"])?;

        for budget in &budgets {
            let category_name = categories
                .get(&budget.category_id)
                .map(|c| c.name.clone())
                .unwrap_or_default();
            csv_writer.write_record([
                category_name,
                budget.period.to_string(),
                format_cents(budget.planned_amount),
            ])?;
        }

        csv_writer.flush()?;
        Ok(budgets.len())
    }

    /// Write a computed summary as pretty JSON.
    pub fn export_summary_json<W: Write>(
        &self,
        summary: &FinancialSummary,
        mut writer: W,
    ) -> Result<()> {
        serde_json::to_writer_pretty(&mut writer, summary)?;
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Export full database as JSON snapshot
    pub async fn export_full_json<W: Write>(&self, mut writer: W) -> Result<DatabaseSnapshot> {
        let snapshot = DatabaseSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            categories: self.service.list_categories(None).await?,
            transactions: self.service.list_all_transactions().await?,
            budgets: self.service.list_budgets(None).await?,
        };

        let json = serde_json::to_string_pretty(&snapshot)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(snapshot)
    }
}
