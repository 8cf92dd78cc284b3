use anyhow::Result;
use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use std::io::Read;

use crate::application::{AppError, FinanceService};
use crate::domain::{parse_cents, Category, TransactionType};

/// Result of an import operation
#[derive(Debug, Clone, Default)]
pub struct ImportResult {
    pub imported: usize,
    pub created_categories: usize,
    pub errors: Vec<ImportError>,
}

/// Error that occurred during import
#[derive(Debug, Clone)]
pub struct ImportError {
    pub line: usize,
    pub field: Option<String>,
    pub error: String,
}

/// Options for import operations
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Validate every row without writing anything
    pub dry_run: bool,
    /// Create categories that don't exist (needs a `type` column)
    pub create_categories: bool,
}

/// One CSV row. Extra columns such as `id` are ignored, so exported files
/// can be imported again.
#[derive(Debug, Deserialize)]
struct TransactionRow {
    date: String,
    category: String,
    amount: String,
    #[serde(default)]
    description: String,
    #[serde(default, rename = "type")]
    transaction_type: Option<String>,
}

/// Importer for loading data into the ledger
pub struct Importer<'a> {
    service: &'a FinanceService,
}

impl<'a> Importer<'a> {
    pub fn new(service: &'a FinanceService) -> Self {
        Self { service }
    }

    /// Import transactions from CSV with a header row.
    pub async fn import_transactions_csv<R: Read>(
        &self,
        reader: R,
        options: ImportOptions,
    ) -> Result<ImportResult> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut result = ImportResult::default();

        for (line_num, record) in csv_reader.deserialize::<TransactionRow>().enumerate() {
            let line = line_num + 2; // +2 for header and 0-indexing

            let row = match record {
                Ok(r) => r,
                Err(e) => {
                    result.errors.push(ImportError {
                        line,
                        field: None,
                        error: format!("CSV parse error: {}", e),
                    });
                    continue;
                }
            };

            match self.import_row(&row, &options, &mut result).await {
                Ok(()) => result.imported += 1,
                Err((field, error)) => result.errors.push(ImportError {
                    line,
                    field: field.map(str::to_string),
                    error,
                }),
            }
        }

        log::info!(
            "import finished: {} imported, {} categories created, {} errors",
            result.imported,
            result.created_categories,
            result.errors.len()
        );

        Ok(result)
    }

    async fn import_row(
        &self,
        row: &TransactionRow,
        options: &ImportOptions,
        result: &mut ImportResult,
    ) -> Result<(), (Option<&'static str>, String)> {
        let amount = parse_cents(&row.amount)
            .map_err(|e| (Some("amount"), format!("Invalid amount: {}", e)))?;
        if amount <= 0 {
            return Err((Some("amount"), "Amount must be at least 0.01".to_string()));
        }

        let date = parse_date(&row.date)
            .ok_or_else(|| (Some("date"), format!("Invalid date: {}", row.date)))?;

        let kind = match row.transaction_type.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(s) => Some(
                TransactionType::from_str(s)
                    .ok_or_else(|| (Some("type"), format!("Invalid type: {}", s)))?,
            ),
        };

        let category = match self.service.get_category(&row.category, kind).await {
            Ok(category) => Some(category),
            Err(AppError::CategoryNotFound(_)) if options.create_categories => {
                kind.ok_or_else(|| missing_type(&row.category))?;
                None
            }
            Err(e) => return Err((Some("category"), e.to_string())),
        };

        if options.dry_run {
            return Ok(());
        }

        let category: Category = match category {
            Some(category) => category,
            None => {
                let kind = kind.ok_or_else(|| missing_type(&row.category))?;
                let created = self
                    .service
                    .create_category(&row.category, kind, None)
                    .await
                    .map_err(|e| (Some("category"), e.to_string()))?;
                result.created_categories += 1;
                created
            }
        };

        let description = if row.description.is_empty() {
            None
        } else {
            Some(row.description.clone())
        };

        self.service
            .record_transaction(&category.name, Some(category.kind), amount, date, description)
            .await
            .map_err(|e| (None, format!("Transaction creation failed: {}", e)))?;

        Ok(())
    }
}

fn missing_type(category: &str) -> (Option<&'static str>, String) {
    (
        Some("type"),
        format!("Category '{}' not found and no type given to create it", category),
    )
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp.
fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}
