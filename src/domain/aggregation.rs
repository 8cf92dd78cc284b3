//! Pure aggregation over an in-memory ledger.
//!
//! Every function here takes already-loaded records and returns fresh report
//! values. Nothing reads a clock, touches storage or keeps state between
//! calls, so identical input always yields identical output.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;

use super::window::validate_month_count;
use super::{
    Budget, BudgetComparison, BudgetId, BudgetStatus, CategoryBreakdown, CategoryId,
    CategoryLookup, Cents, FinancialSummary, MonthlyTrendPoint, RecentTransaction,
    SummaryWindow, Transaction, TransactionId, TransactionType, YearMonth,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AggregationError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Sum of all transactions of one type.
pub fn sum_by_type(transactions: &[Transaction], transaction_type: TransactionType) -> Cents {
    transactions
        .iter()
        .filter(|t| t.transaction_type == transaction_type)
        .map(|t| t.amount)
        .sum()
}

/// Group transactions of one type by category and attach each group's share
/// of the total.
///
/// Transactions whose category is missing from `categories` are left out.
/// Rows come back largest first, ties by category name.
pub fn compute_category_breakdown(
    transactions: &[Transaction],
    categories: &CategoryLookup,
    transaction_type: TransactionType,
) -> Vec<CategoryBreakdown> {
    let mut groups: HashMap<CategoryId, (Cents, usize)> = HashMap::new();

    for transaction in transactions
        .iter()
        .filter(|t| t.transaction_type == transaction_type)
    {
        if !categories.contains_key(&transaction.category_id) {
            continue;
        }
        let group = groups.entry(transaction.category_id).or_insert((0, 0));
        group.0 += transaction.amount;
        group.1 += 1;
    }

    let total: Cents = groups.values().map(|(amount, _)| amount).sum();
    if total <= 0 {
        return Vec::new();
    }

    let mut rows: Vec<CategoryBreakdown> = groups
        .into_iter()
        .filter_map(|(category_id, (amount, transaction_count))| {
            let category = categories.get(&category_id)?;
            Some(CategoryBreakdown {
                category_id,
                category_name: category.name.clone(),
                color: category.color.clone(),
                amount,
                percentage: 0.0,
                transaction_count,
            })
        })
        .collect();

    rows.sort_by(breakdown_order);

    let amounts: Vec<Cents> = rows.iter().map(|r| r.amount).collect();
    for (row, tenths) in rows.iter_mut().zip(apportion_tenths(&amounts, total)) {
        row.percentage = tenths as f64 / 10.0;
    }

    rows
}

fn breakdown_order(a: &CategoryBreakdown, b: &CategoryBreakdown) -> Ordering {
    b.amount
        .cmp(&a.amount)
        .then_with(|| a.category_name.cmp(&b.category_name))
        .then_with(|| a.category_id.cmp(&b.category_id))
}

/// Split 1000 tenths of a percent across `amounts` in proportion, using the
/// largest-remainder method so the parts always add up to exactly 100.0.
/// Equal remainders are resolved in slice order.
fn apportion_tenths(amounts: &[Cents], total: Cents) -> Vec<i64> {
    let total = total as i128;
    let mut shares = Vec::with_capacity(amounts.len());
    let mut remainders = Vec::with_capacity(amounts.len());

    for (index, &amount) in amounts.iter().enumerate() {
        let scaled = amount as i128 * 1000;
        shares.push((scaled / total) as i64);
        remainders.push((scaled % total, index));
    }

    let assigned: i64 = shares.iter().sum();
    let leftover = usize::try_from(1000 - assigned).unwrap_or(0);

    remainders.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    for &(_, index) in remainders.iter().take(leftover) {
        shares[index] += 1;
    }

    shares
}

/// `numerator / denominator * 100` rounded half-up to one decimal place.
/// Zero when the denominator is zero.
fn percent_one_decimal(numerator: Cents, denominator: Cents) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    let n = numerator as i128 * 1000;
    let d = denominator as i128;
    let tenths = (2 * n + d).div_euclid(2 * d);
    tenths as f64 / 10.0
}

/// Income and expense totals for the `month_count` calendar months ending
/// with the month of `reference_date`, oldest first, with empty months
/// present as zero points.
pub fn compute_monthly_trend(
    transactions: &[Transaction],
    month_count: u32,
    reference_date: NaiveDate,
) -> Result<Vec<MonthlyTrendPoint>, AggregationError> {
    validate_month_count(month_count)?;

    let last = YearMonth::of(reference_date);
    let first = last.offset(-(i64::from(month_count) - 1)).ok_or_else(|| {
        AggregationError::InvalidArgument(format!(
            "{} months before {} is outside the supported date range",
            month_count, last
        ))
    })?;

    let mut buckets: BTreeMap<YearMonth, (Cents, Cents)> = BTreeMap::new();
    for offset in 0..i64::from(month_count) {
        let month = first.offset(offset).ok_or_else(|| {
            AggregationError::InvalidArgument(format!("month {} + {} out of range", first, offset))
        })?;
        buckets.insert(month, (0, 0));
    }

    for transaction in transactions {
        let Some(bucket) = buckets.get_mut(&YearMonth::of(transaction.date)) else {
            continue;
        };
        match transaction.transaction_type {
            TransactionType::Income => bucket.0 += transaction.amount,
            TransactionType::Expense => bucket.1 += transaction.amount,
        }
    }

    Ok(buckets
        .into_iter()
        .map(|(month, (income, expenses))| MonthlyTrendPoint::new(month, income, expenses))
        .collect())
}

/// Planned versus actual spending for every budget of `period`.
///
/// Budgets whose category is unknown or not an expense category are
/// skipped. Categories with spending but no budget do not appear.
pub fn compute_budget_comparison(
    budgets: &[Budget],
    transactions: &[Transaction],
    categories: &CategoryLookup,
    period: YearMonth,
) -> Vec<BudgetComparison> {
    let mut spent: HashMap<CategoryId, Cents> = HashMap::new();
    for transaction in transactions
        .iter()
        .filter(|t| t.is_expense() && period.contains(t.date))
    {
        *spent.entry(transaction.category_id).or_insert(0) += transaction.amount;
    }

    let mut rows: Vec<BudgetComparison> = budgets
        .iter()
        .filter(|b| b.period == period)
        .filter_map(|budget| {
            let category = categories.get(&budget.category_id)?;
            if category.kind != TransactionType::Expense {
                return None;
            }
            let actual = spent.get(&budget.category_id).copied().unwrap_or(0);
            Some(BudgetComparison {
                category_id: budget.category_id,
                category_name: category.name.clone(),
                color: category.color.clone(),
                period,
                planned_amount: budget.planned_amount,
                actual_amount: actual,
                variance: actual - budget.planned_amount,
                remaining: budget.planned_amount - actual,
                percentage_used: percent_one_decimal(actual, budget.planned_amount),
                status: BudgetStatus::classify(budget.planned_amount, actual),
            })
        })
        .collect();

    rows.sort_by(|a, b| {
        a.category_name
            .cmp(&b.category_name)
            .then_with(|| a.category_id.cmp(&b.category_id))
    });

    rows
}

/// Most recent first: date, then recording time, then id.
pub fn recent_transactions(
    transactions: &[Transaction],
    categories: &CategoryLookup,
    limit: usize,
) -> Vec<RecentTransaction> {
    let mut sorted: Vec<&Transaction> = transactions.iter().collect();
    sorted.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| b.recorded_at.cmp(&a.recorded_at))
            .then_with(|| a.id.cmp(&b.id))
    });

    sorted
        .into_iter()
        .take(limit)
        .map(|t| {
            let category = categories.get(&t.category_id);
            RecentTransaction {
                id: t.id,
                date: t.date,
                transaction_type: t.transaction_type,
                amount: t.amount,
                description: t.description.clone(),
                category_id: t.category_id,
                category_name: category.map(|c| c.name.clone()),
                category_color: category.map(|c| c.color.clone()),
            }
        })
        .collect()
}

/// Assemble totals, breakdowns, trend, budget comparison and recent activity
/// for one window.
///
/// Totals, breakdowns and the trend see every transaction inside the window;
/// only the recent list is truncated. The budget comparison covers the month
/// of the window's reference date.
pub fn compute_summary(
    transactions: &[Transaction],
    budgets: &[Budget],
    categories: &CategoryLookup,
    window: &SummaryWindow,
) -> Result<FinancialSummary, AggregationError> {
    window.validate()?;

    let in_window: Vec<Transaction> = transactions
        .iter()
        .filter(|t| window.contains(t.date))
        .cloned()
        .collect();

    let total_income = sum_by_type(&in_window, TransactionType::Income);
    let total_expenses = sum_by_type(&in_window, TransactionType::Expense);

    let monthly_trend =
        compute_monthly_trend(&in_window, window.trend_months, window.reference_date)?;

    Ok(FinancialSummary {
        window: window.clone(),
        total_income,
        total_expenses,
        net_balance: total_income - total_expenses,
        income_by_category: compute_category_breakdown(
            &in_window,
            categories,
            TransactionType::Income,
        ),
        expenses_by_category: compute_category_breakdown(
            &in_window,
            categories,
            TransactionType::Expense,
        ),
        monthly_trend,
        budget_comparison: compute_budget_comparison(
            budgets,
            transactions,
            categories,
            window.budget_period(),
        ),
        recent_transactions: recent_transactions(&in_window, categories, window.recent_limit),
    })
}

/// Transactions that reference a category absent from `categories`.
pub fn find_orphaned_transactions(
    transactions: &[Transaction],
    categories: &CategoryLookup,
) -> Vec<TransactionId> {
    transactions
        .iter()
        .filter(|t| !categories.contains_key(&t.category_id))
        .map(|t| t.id)
        .collect()
}

/// Budgets that can never be compared: unknown category or income category.
pub fn find_invalid_budgets(budgets: &[Budget], categories: &CategoryLookup) -> Vec<BudgetId> {
    budgets
        .iter()
        .filter(|b| {
            categories
                .get(&b.category_id)
                .is_none_or(|c| c.kind != TransactionType::Expense)
        })
        .map(|b| b.id)
        .collect()
}
