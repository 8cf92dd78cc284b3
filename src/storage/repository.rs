use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::application::CategoryStats;
use crate::domain::{
    Budget, Category, CategoryId, Cents, Transaction, TransactionId, TransactionType, YearMonth,
};

use super::MIGRATION_001_INITIAL;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Query parameters for listing transactions. All filters are optional and
/// combine with AND.
#[derive(Debug, Clone, Default)]
pub struct TransactionQuery {
    pub transaction_type: Option<TransactionType>,
    pub category_id: Option<CategoryId>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// Case-insensitive substring match on description or category name
    pub search: Option<String>,
    pub limit: Option<usize>,
}

/// Repository for persisting and querying categories, transactions and budgets.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::raw_sql(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    // ========================
    // Category operations
    // ========================

    pub async fn save_category(&self, category: &Category) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO categories (id, name, kind, color, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(category.id.to_string())
        .bind(&category.name)
        .bind(category.kind.as_str())
        .bind(&category.color)
        .bind(category.created_at.to_rfc3339_opts(SecondsFormat::Micros, true))
        .execute(&self.pool)
        .await
        .context("Failed to save category")?;
        Ok(())
    }

    pub async fn get_category(&self, id: CategoryId) -> Result<Option<Category>> {
        let row = sqlx::query(
            "SELECT id, name, kind, color, created_at FROM categories WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch category")?;

        row.as_ref().map(Self::row_to_category).transpose()
    }

    /// Categories with the given name. Names are unique per kind, so this
    /// returns at most one income and one expense category.
    pub async fn find_categories_by_name(&self, name: &str) -> Result<Vec<Category>> {
        let rows = sqlx::query(
            "SELECT id, name, kind, color, created_at FROM categories WHERE name = ? ORDER BY kind",
        )
        .bind(name)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch categories by name")?;

        rows.iter().map(Self::row_to_category).collect()
    }

    /// List categories ordered by kind then name.
    pub async fn list_categories(&self, kind: Option<TransactionType>) -> Result<Vec<Category>> {
        let rows = match kind {
            Some(kind) => {
                sqlx::query(
                    "SELECT id, name, kind, color, created_at FROM categories WHERE kind = ? ORDER BY name",
                )
                .bind(kind.as_str())
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    "SELECT id, name, kind, color, created_at FROM categories ORDER BY kind, name",
                )
                .fetch_all(&self.pool)
                .await
            }
        }
        .context("Failed to list categories")?;

        rows.iter().map(Self::row_to_category).collect()
    }

    /// Delete a category. Its transactions and budgets go with it.
    pub async fn delete_category(&self, id: CategoryId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to delete category")?;
        Ok(result.rows_affected() > 0)
    }

    /// Rename or recolor a category. Its kind never changes.
    pub async fn update_category(&self, category: &Category) -> Result<bool> {
        let result = sqlx::query("UPDATE categories SET name = ?, color = ? WHERE id = ?")
            .bind(&category.name)
            .bind(&category.color)
            .bind(category.id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to update category")?;
        Ok(result.rows_affected() > 0)
    }

    /// Transaction count and total per category, including unused ones.
    pub async fn category_stats(&self) -> Result<Vec<CategoryStats>> {
        let rows = sqlx::query(
            r#"
            SELECT c.id, c.name, c.kind, c.color, c.created_at,
                   COUNT(t.id) AS transaction_count,
                   COALESCE(SUM(t.amount_cents), 0) AS total_cents
            FROM categories c
            LEFT JOIN transactions t ON t.category_id = c.id
            GROUP BY c.id
            ORDER BY c.kind, c.name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to compute category stats")?;

        rows.iter()
            .map(|row| {
                Ok(CategoryStats {
                    category: Self::row_to_category(row)?,
                    transaction_count: row.get("transaction_count"),
                    total_amount: row.get("total_cents"),
                })
            })
            .collect()
    }

    fn row_to_category(row: &sqlx::sqlite::SqliteRow) -> Result<Category> {
        let id_str: String = row.get("id");
        let kind_str: String = row.get("kind");
        let created_at_str: String = row.get("created_at");

        Ok(Category {
            id: Uuid::parse_str(&id_str).context("Invalid category ID")?,
            name: row.get("name"),
            color: row.get("color"),
            kind: TransactionType::from_str(&kind_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid category kind: {}", kind_str))?,
            created_at: parse_instant(&created_at_str).context("Invalid created_at timestamp")?,
        })
    }

    // ========================
    // Transaction operations
    // ========================

    pub async fn save_transaction(&self, transaction: &Transaction) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO transactions (id, category_id, amount_cents, type, date, description, recorded_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(transaction.id.to_string())
        .bind(transaction.category_id.to_string())
        .bind(transaction.amount)
        .bind(transaction.transaction_type.as_str())
        .bind(transaction.date.format(DATE_FORMAT).to_string())
        .bind(&transaction.description)
        .bind(transaction.recorded_at.to_rfc3339_opts(SecondsFormat::Micros, true))
        .execute(&self.pool)
        .await
        .context("Failed to save transaction")?;
        Ok(())
    }

    pub async fn get_transaction(&self, id: TransactionId) -> Result<Option<Transaction>> {
        let row = sqlx::query(
            r#"
            SELECT id, category_id, amount_cents, type, date, description, recorded_at
            FROM transactions
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch transaction")?;

        row.as_ref().map(Self::row_to_transaction).transpose()
    }

    /// Transactions dated within `[from, to]`, oldest first.
    pub async fn list_transactions_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Transaction>> {
        let rows = sqlx::query(
            r#"
            SELECT id, category_id, amount_cents, type, date, description, recorded_at
            FROM transactions
            WHERE date >= ? AND date <= ?
            ORDER BY date, recorded_at
            "#,
        )
        .bind(from.format(DATE_FORMAT).to_string())
        .bind(to.format(DATE_FORMAT).to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list transactions in range")?;

        rows.iter().map(Self::row_to_transaction).collect()
    }

    /// Every transaction, oldest first.
    pub async fn list_transactions(&self) -> Result<Vec<Transaction>> {
        let rows = sqlx::query(
            r#"
            SELECT id, category_id, amount_cents, type, date, description, recorded_at
            FROM transactions
            ORDER BY date, recorded_at
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list transactions")?;

        rows.iter().map(Self::row_to_transaction).collect()
    }

    /// Filtered listing, newest first.
    pub async fn list_transactions_filtered(
        &self,
        query: &TransactionQuery,
    ) -> Result<Vec<Transaction>> {
        let mut sql = String::from(
            r#"SELECT t.id, t.category_id, t.amount_cents, t.type, t.date, t.description, t.recorded_at
            FROM transactions t
            JOIN categories c ON c.id = t.category_id
            WHERE 1=1"#,
        );

        if query.transaction_type.is_some() {
            sql.push_str(" AND t.type = ?");
        }
        if query.category_id.is_some() {
            sql.push_str(" AND t.category_id = ?");
        }
        if query.from.is_some() {
            sql.push_str(" AND t.date >= ?");
        }
        if query.to.is_some() {
            sql.push_str(" AND t.date <= ?");
        }
        if query.search.is_some() {
            sql.push_str(r" AND (t.description LIKE ? ESCAPE '\' OR c.name LIKE ? ESCAPE '\')");
        }

        sql.push_str(" ORDER BY t.date DESC, t.recorded_at DESC");

        if let Some(limit) = query.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        let mut q = sqlx::query(&sql);

        if let Some(kind) = query.transaction_type {
            q = q.bind(kind.as_str());
        }
        if let Some(category_id) = query.category_id {
            q = q.bind(category_id.to_string());
        }
        if let Some(from) = query.from {
            q = q.bind(from.format(DATE_FORMAT).to_string());
        }
        if let Some(to) = query.to {
            q = q.bind(to.format(DATE_FORMAT).to_string());
        }
        if let Some(search) = &query.search {
            let pattern = contains_pattern(search);
            q = q.bind(pattern.clone()).bind(pattern);
        }

        let rows = q
            .fetch_all(&self.pool)
            .await
            .context("Failed to list filtered transactions")?;

        rows.iter().map(Self::row_to_transaction).collect()
    }

    pub async fn update_transaction(&self, transaction: &Transaction) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE transactions
            SET category_id = ?, amount_cents = ?, type = ?, date = ?, description = ?
            WHERE id = ?
            "#,
        )
        .bind(transaction.category_id.to_string())
        .bind(transaction.amount)
        .bind(transaction.transaction_type.as_str())
        .bind(transaction.date.format(DATE_FORMAT).to_string())
        .bind(&transaction.description)
        .bind(transaction.id.to_string())
        .execute(&self.pool)
        .await
        .context("Failed to update transaction")?;
        Ok(result.rows_affected() > 0)
    }

    /// Whether a transaction with exactly these fields is already stored.
    pub async fn transaction_exists(
        &self,
        category_id: CategoryId,
        date: NaiveDate,
        amount: Cents,
        description: &str,
    ) -> Result<bool> {
        let row = sqlx::query(
            r#"
            SELECT 1 FROM transactions
            WHERE category_id = ? AND date = ? AND amount_cents = ? AND description = ?
            LIMIT 1
            "#,
        )
        .bind(category_id.to_string())
        .bind(date.format(DATE_FORMAT).to_string())
        .bind(amount)
        .bind(description)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to look up transaction")?;
        Ok(row.is_some())
    }

    pub async fn delete_transaction(&self, id: TransactionId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM transactions WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to delete transaction")?;
        Ok(result.rows_affected() > 0)
    }

    fn row_to_transaction(row: &sqlx::sqlite::SqliteRow) -> Result<Transaction> {
        let id_str: String = row.get("id");
        let category_id_str: String = row.get("category_id");
        let type_str: String = row.get("type");
        let date_str: String = row.get("date");
        let recorded_at_str: String = row.get("recorded_at");

        Ok(Transaction {
            id: Uuid::parse_str(&id_str).context("Invalid transaction ID")?,
            category_id: Uuid::parse_str(&category_id_str).context("Invalid category ID")?,
            amount: row.get("amount_cents"),
            transaction_type: TransactionType::from_str(&type_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid transaction type: {}", type_str))?,
            date: NaiveDate::parse_from_str(&date_str, DATE_FORMAT)
                .context("Invalid transaction date")?,
            description: row.get("description"),
            recorded_at: parse_instant(&recorded_at_str)
                .context("Invalid recorded_at timestamp")?,
        })
    }

    // ========================
    // Budget operations
    // ========================

    /// Insert a budget, or replace the planned amount of the existing budget
    /// for the same category and period. Returns the stored row.
    pub async fn upsert_budget(&self, budget: &Budget) -> Result<Budget> {
        sqlx::query(
            r#"
            INSERT INTO budgets (id, category_id, period, planned_cents, created_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (category_id, period) DO UPDATE SET planned_cents = excluded.planned_cents
            "#,
        )
        .bind(budget.id.to_string())
        .bind(budget.category_id.to_string())
        .bind(budget.period.to_string())
        .bind(budget.planned_amount)
        .bind(budget.created_at.to_rfc3339_opts(SecondsFormat::Micros, true))
        .execute(&self.pool)
        .await
        .context("Failed to save budget")?;

        self.get_budget(budget.category_id, budget.period)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Budget vanished after save"))
    }

    pub async fn get_budget(
        &self,
        category_id: CategoryId,
        period: YearMonth,
    ) -> Result<Option<Budget>> {
        let row = sqlx::query(
            r#"
            SELECT id, category_id, period, planned_cents, created_at
            FROM budgets
            WHERE category_id = ? AND period = ?
            "#,
        )
        .bind(category_id.to_string())
        .bind(period.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch budget")?;

        row.as_ref().map(Self::row_to_budget).transpose()
    }

    /// List budgets, newest period first.
    pub async fn list_budgets(&self, period: Option<YearMonth>) -> Result<Vec<Budget>> {
        let rows = match period {
            Some(period) => {
                sqlx::query(
                    r#"
                    SELECT id, category_id, period, planned_cents, created_at
                    FROM budgets
                    WHERE period = ?
                    ORDER BY created_at
                    "#,
                )
                .bind(period.to_string())
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT id, category_id, period, planned_cents, created_at
                    FROM budgets
                    ORDER BY period DESC, created_at
                    "#,
                )
                .fetch_all(&self.pool)
                .await
            }
        }
        .context("Failed to list budgets")?;

        rows.iter().map(Self::row_to_budget).collect()
    }

    pub async fn delete_budget(&self, category_id: CategoryId, period: YearMonth) -> Result<bool> {
        let result = sqlx::query("DELETE FROM budgets WHERE category_id = ? AND period = ?")
            .bind(category_id.to_string())
            .bind(period.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to delete budget")?;
        Ok(result.rows_affected() > 0)
    }

    fn row_to_budget(row: &sqlx::sqlite::SqliteRow) -> Result<Budget> {
        let id_str: String = row.get("id");
        let category_id_str: String = row.get("category_id");
        let period_str: String = row.get("period");
        let created_at_str: String = row.get("created_at");

        Ok(Budget {
            id: Uuid::parse_str(&id_str).context("Invalid budget ID")?,
            category_id: Uuid::parse_str(&category_id_str).context("Invalid category ID")?,
            period: period_str.parse().context("Invalid budget period")?,
            planned_amount: row.get("planned_cents"),
            created_at: parse_instant(&created_at_str).context("Invalid created_at timestamp")?,
        })
    }
}

/// `LIKE` pattern matching `search` literally anywhere in the column.
fn contains_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn parse_instant(s: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc))
}
