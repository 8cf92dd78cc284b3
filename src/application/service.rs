use chrono::NaiveDate;

use crate::domain::{
    compute_budget_comparison, compute_category_breakdown, compute_monthly_trend,
    compute_summary, find_invalid_budgets, find_orphaned_transactions, index_categories,
    is_valid_color, Budget, Category, CategoryLookup, Cents, FinancialSummary, SummaryWindow,
    Transaction, TransactionId, TransactionType, YearMonth, DEFAULT_COLOR,
};
use crate::storage::{Repository, TransactionQuery};

use super::{AppError, BreakdownReport, BudgetReport, CategoryStats, TrendReport};

/// Application service providing high-level operations over the ledger.
/// This is the primary interface for any client (CLI, importer, exporter).
pub struct FinanceService {
    repo: Repository,
}

/// Result of recording a transaction
pub struct RecordedTransaction {
    pub transaction: Transaction,
    pub category: Category,
}

/// Filter for listing transactions by names rather than ids
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub transaction_type: Option<TransactionType>,
    pub category: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub search: Option<String>,
    pub limit: Option<usize>,
}

/// Fields to change on an existing transaction. `None` keeps the stored
/// value. `transaction_type` only disambiguates `category`.
#[derive(Debug, Clone, Default)]
pub struct TransactionUpdate {
    pub amount: Option<Cents>,
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub transaction_type: Option<TransactionType>,
}

impl FinanceService {
    /// Create a new finance service with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        log::debug!("initialized database at {}", database_path);
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    // ========================
    // Category operations
    // ========================

    /// Create a new category. Names are unique per kind.
    pub async fn create_category(
        &self,
        name: &str,
        kind: TransactionType,
        color: Option<&str>,
    ) -> Result<Category, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::InvalidName("name must not be empty".to_string()));
        }

        let color = color.unwrap_or(DEFAULT_COLOR);
        if !is_valid_color(color) {
            return Err(AppError::InvalidColor(color.to_string()));
        }

        let existing = self.repo.find_categories_by_name(name).await?;
        if existing.iter().any(|c| c.kind == kind) {
            return Err(AppError::CategoryAlreadyExists {
                name: name.to_string(),
                kind,
            });
        }

        let category = Category::new(name, kind).with_color(color);
        self.repo.save_category(&category).await?;
        log::debug!("created {} category '{}'", kind, category.name);
        Ok(category)
    }

    /// Resolve a category by name. `kind` is only needed when the same name
    /// exists for both income and expense.
    pub async fn get_category(
        &self,
        name: &str,
        kind: Option<TransactionType>,
    ) -> Result<Category, AppError> {
        let mut matches: Vec<Category> = self
            .repo
            .find_categories_by_name(name.trim())
            .await?
            .into_iter()
            .filter(|c| kind.is_none_or(|k| c.kind == k))
            .collect();

        match matches.len() {
            0 => Err(AppError::CategoryNotFound(name.to_string())),
            1 => Ok(matches.remove(0)),
            _ => Err(AppError::AmbiguousCategory(name.to_string())),
        }
    }

    pub async fn list_categories(
        &self,
        kind: Option<TransactionType>,
    ) -> Result<Vec<Category>, AppError> {
        Ok(self.repo.list_categories(kind).await?)
    }

    /// Rename and/or recolor a category, keeping its kind.
    pub async fn update_category(
        &self,
        name: &str,
        kind: Option<TransactionType>,
        new_name: Option<&str>,
        new_color: Option<&str>,
    ) -> Result<Category, AppError> {
        let mut category = self.get_category(name, kind).await?;

        if let Some(new_name) = new_name {
            let new_name = new_name.trim();
            if new_name.is_empty() {
                return Err(AppError::InvalidName("name must not be empty".to_string()));
            }
            let taken = self
                .repo
                .find_categories_by_name(new_name)
                .await?
                .iter()
                .any(|c| c.kind == category.kind && c.id != category.id);
            if taken {
                return Err(AppError::CategoryAlreadyExists {
                    name: new_name.to_string(),
                    kind: category.kind,
                });
            }
            category.name = new_name.to_string();
        }

        if let Some(color) = new_color {
            if !is_valid_color(color) {
                return Err(AppError::InvalidColor(color.to_string()));
            }
            category.color = color.to_string();
        }

        self.repo.update_category(&category).await?;
        log::debug!("updated {} category '{}'", category.kind, category.name);
        Ok(category)
    }

    /// Delete a category along with its transactions and budgets.
    pub async fn delete_category(
        &self,
        name: &str,
        kind: Option<TransactionType>,
    ) -> Result<Category, AppError> {
        let category = self.get_category(name, kind).await?;
        self.repo.delete_category(category.id).await?;
        Ok(category)
    }

    pub async fn category_stats(&self) -> Result<Vec<CategoryStats>, AppError> {
        Ok(self.repo.category_stats().await?)
    }

    /// Every category keyed by id, as the aggregation engine expects it.
    pub async fn category_lookup(&self) -> Result<CategoryLookup, AppError> {
        let categories = self.repo.list_categories(None).await?;
        Ok(index_categories(&categories))
    }

    // ========================
    // Transaction operations
    // ========================

    /// Record a transaction. Its type is taken from the category.
    pub async fn record_transaction(
        &self,
        category_name: &str,
        kind: Option<TransactionType>,
        amount: Cents,
        date: NaiveDate,
        description: Option<String>,
    ) -> Result<RecordedTransaction, AppError> {
        if amount <= 0 {
            return Err(AppError::InvalidAmount(
                "Amount must be at least 0.01".to_string(),
            ));
        }

        let category = self.get_category(category_name, kind).await?;

        let mut transaction = Transaction::new(category.id, category.kind, amount, date);
        if let Some(desc) = description {
            transaction = transaction.with_description(desc);
        }

        self.repo.save_transaction(&transaction).await?;

        Ok(RecordedTransaction {
            transaction,
            category,
        })
    }

    pub async fn get_transaction(&self, id: TransactionId) -> Result<Transaction, AppError> {
        self.repo
            .get_transaction(id)
            .await?
            .ok_or_else(|| AppError::TransactionNotFound(id.to_string()))
    }

    /// List transactions with filters, newest first.
    pub async fn list_transactions(
        &self,
        filter: TransactionFilter,
    ) -> Result<Vec<Transaction>, AppError> {
        // Resolve category name to ID if provided
        let category_id = match &filter.category {
            Some(name) => Some(self.get_category(name, filter.transaction_type).await?.id),
            None => None,
        };

        let query = TransactionQuery {
            transaction_type: filter.transaction_type,
            category_id,
            from: filter.from,
            to: filter.to,
            search: filter.search,
            limit: filter.limit,
        };

        Ok(self.repo.list_transactions_filtered(&query).await?)
    }

    /// Every transaction, oldest first.
    pub async fn list_all_transactions(&self) -> Result<Vec<Transaction>, AppError> {
        Ok(self.repo.list_transactions().await?)
    }

    /// Edit a stored transaction. Moving it to another category also takes
    /// that category's type.
    pub async fn update_transaction(
        &self,
        id: TransactionId,
        update: TransactionUpdate,
    ) -> Result<RecordedTransaction, AppError> {
        let mut transaction = self.get_transaction(id).await?;

        if let Some(amount) = update.amount {
            if amount <= 0 {
                return Err(AppError::InvalidAmount(
                    "Amount must be at least 0.01".to_string(),
                ));
            }
            transaction.amount = amount;
        }
        if let Some(date) = update.date {
            transaction.date = date;
        }
        if let Some(description) = update.description {
            transaction.description = description;
        }

        let category = match &update.category {
            Some(name) => self.get_category(name, update.transaction_type).await?,
            None => self
                .repo
                .get_category(transaction.category_id)
                .await?
                .ok_or_else(|| AppError::CategoryNotFound(transaction.category_id.to_string()))?,
        };
        transaction.category_id = category.id;
        transaction.transaction_type = category.kind;

        self.repo.update_transaction(&transaction).await?;

        Ok(RecordedTransaction {
            transaction,
            category,
        })
    }

    /// Whether `category` already holds a transaction with this date, amount
    /// and description.
    pub async fn transaction_exists(
        &self,
        category: &Category,
        date: NaiveDate,
        amount: Cents,
        description: &str,
    ) -> Result<bool, AppError> {
        Ok(self
            .repo
            .transaction_exists(category.id, date, amount, description)
            .await?)
    }

    pub async fn delete_transaction(&self, id: TransactionId) -> Result<Transaction, AppError> {
        let transaction = self.get_transaction(id).await?;
        self.repo.delete_transaction(id).await?;
        Ok(transaction)
    }

    // ========================
    // Budget operations
    // ========================

    /// Set the planned amount for an expense category in one month,
    /// replacing any existing budget for that month.
    pub async fn set_budget(
        &self,
        category_name: &str,
        period: YearMonth,
        planned_amount: Cents,
    ) -> Result<(Budget, Category), AppError> {
        if planned_amount < 0 {
            return Err(AppError::InvalidAmount(
                "Budget amount cannot be negative".to_string(),
            ));
        }

        let category = match self.get_category(category_name, Some(TransactionType::Expense)).await {
            Ok(category) => category,
            Err(AppError::CategoryNotFound(_)) => {
                // Distinguish "no such category" from "wrong kind"
                let income = self.get_category(category_name, None).await?;
                return Err(AppError::BudgetOnIncomeCategory(income.name));
            }
            Err(e) => return Err(e),
        };

        let budget = self
            .repo
            .upsert_budget(&Budget::new(category.id, period, planned_amount))
            .await?;
        Ok((budget, category))
    }

    /// The budget of an expense category for one month, if set.
    pub async fn get_budget(
        &self,
        category_name: &str,
        period: YearMonth,
    ) -> Result<Option<Budget>, AppError> {
        let category = self
            .get_category(category_name, Some(TransactionType::Expense))
            .await?;
        Ok(self.repo.get_budget(category.id, period).await?)
    }

    pub async fn list_budgets(&self, period: Option<YearMonth>) -> Result<Vec<Budget>, AppError> {
        Ok(self.repo.list_budgets(period).await?)
    }

    pub async fn delete_budget(
        &self,
        category_name: &str,
        period: YearMonth,
    ) -> Result<Budget, AppError> {
        let category = self
            .get_category(category_name, Some(TransactionType::Expense))
            .await?;
        let budget = self
            .repo
            .get_budget(category.id, period)
            .await?
            .ok_or_else(|| AppError::BudgetNotFound {
                category: category.name.clone(),
                period,
            })?;
        self.repo.delete_budget(category.id, period).await?;
        Ok(budget)
    }

    // ========================
    // Reports
    // ========================

    /// Full dashboard summary for a window.
    pub async fn get_summary(&self, window: &SummaryWindow) -> Result<FinancialSummary, AppError> {
        window.validate()?;

        // The budget month may reach outside the window
        let period = window.budget_period();
        let from = window.start.min(period.first_day());
        let to = window.end.max(period.last_day());

        let categories = self.category_lookup().await?;
        let transactions = self.repo.list_transactions_between(from, to).await?;
        let budgets = self.repo.list_budgets(Some(period)).await?;
        log::debug!(
            "summary {}..{}: {} transactions, {} budgets, {} categories",
            window.start,
            window.end,
            transactions.len(),
            budgets.len(),
            categories.len()
        );

        log_degraded_input(&transactions, &budgets, &categories);

        Ok(compute_summary(&transactions, &budgets, &categories, window)?)
    }

    /// Category breakdown of one transaction type between two dates
    /// (inclusive).
    pub async fn get_category_breakdown(
        &self,
        transaction_type: TransactionType,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<BreakdownReport, AppError> {
        SummaryWindow::new(from, to, to).validate()?;

        let categories = self.category_lookup().await?;
        let transactions = self.repo.list_transactions_between(from, to).await?;
        log_degraded_input(&transactions, &[], &categories);

        let rows = compute_category_breakdown(&transactions, &categories, transaction_type);
        Ok(BreakdownReport {
            transaction_type,
            from,
            to,
            total: rows.iter().map(|r| r.amount).sum(),
            categories: rows,
        })
    }

    /// Monthly income/expense series ending with the month of `reference_date`.
    pub async fn get_monthly_trend(
        &self,
        months: u32,
        reference_date: NaiveDate,
    ) -> Result<TrendReport, AppError> {
        // Validate before computing the load range from `months`
        let skeleton = compute_monthly_trend(&[], months, reference_date)?;
        let from = skeleton
            .first()
            .map(|p| p.month.first_day())
            .unwrap_or(reference_date);
        let to = YearMonth::of(reference_date).last_day();

        let transactions = self.repo.list_transactions_between(from, to).await?;
        let points = compute_monthly_trend(&transactions, months, reference_date)?;

        Ok(TrendReport {
            reference_date,
            points,
        })
    }

    /// Planned versus actual spending for one month.
    pub async fn get_budget_comparison(&self, period: YearMonth) -> Result<BudgetReport, AppError> {
        let categories = self.category_lookup().await?;
        let budgets = self.repo.list_budgets(Some(period)).await?;
        let transactions = self
            .repo
            .list_transactions_between(period.first_day(), period.last_day())
            .await?;

        log_degraded_input(&transactions, &budgets, &categories);

        let comparisons = compute_budget_comparison(&budgets, &transactions, &categories, period);
        Ok(BudgetReport::new(period, comparisons))
    }
}

/// Aggregations tolerate dangling references by leaving them out; surface
/// that here so a degraded report never goes unnoticed.
fn log_degraded_input(
    transactions: &[Transaction],
    budgets: &[Budget],
    categories: &CategoryLookup,
) {
    let orphaned = find_orphaned_transactions(transactions, categories);
    if !orphaned.is_empty() {
        log::warn!(
            "{} transaction(s) reference unknown categories and are excluded from breakdowns: {:?}",
            orphaned.len(),
            orphaned
        );
    }

    let invalid = find_invalid_budgets(budgets, categories);
    if !invalid.is_empty() {
        log::warn!(
            "{} budget(s) point at missing or income categories and are skipped: {:?}",
            invalid.len(),
            invalid
        );
    }
}
