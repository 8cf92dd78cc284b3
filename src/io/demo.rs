use std::collections::HashMap;

use anyhow::Result;
use chrono::NaiveDate;

use crate::application::{AppError, FinanceService};
use crate::domain::{Category, TransactionType, YearMonth};

const INCOME_CATEGORIES: &[(&str, &str)] = &[
    ("Salary", "#10b981"),
    ("Freelance", "#059669"),
    ("Investment", "#047857"),
    ("Other Income", "#065f46"),
];

const EXPENSE_CATEGORIES: &[(&str, &str)] = &[
    ("Food & Dining", "#ef4444"),
    ("Transportation", "#dc2626"),
    ("Shopping", "#b91c1c"),
    ("Entertainment", "#991b1b"),
    ("Bills & Utilities", "#7f1d1d"),
    ("Healthcare", "#f97316"),
    ("Education", "#ea580c"),
    ("Travel", "#c2410c"),
    ("Groceries", "#9a3412"),
    ("Rent", "#7c2d12"),
];

/// (description, base amount in whole units, category)
const INCOME_TEMPLATES: &[(&str, i64, &str)] = &[
    ("Monthly Salary", 4500, "Salary"),
    ("Freelance Project", 800, "Freelance"),
    ("Stock Dividend", 150, "Investment"),
    ("Side Hustle", 300, "Other Income"),
];

const EXPENSE_TEMPLATES: &[(&str, i64, &str)] = &[
    ("Grocery Shopping", 120, "Groceries"),
    ("Restaurant Dinner", 45, "Food & Dining"),
    ("Gas Station", 60, "Transportation"),
    ("Netflix Subscription", 15, "Entertainment"),
    ("Electric Bill", 85, "Bills & Utilities"),
    ("Rent Payment", 1200, "Rent"),
    ("Online Shopping", 75, "Shopping"),
    ("Doctor Visit", 150, "Healthcare"),
    ("Coffee Shop", 12, "Food & Dining"),
    ("Movie Tickets", 25, "Entertainment"),
    ("Uber Ride", 18, "Transportation"),
    ("Phone Bill", 55, "Bills & Utilities"),
    ("Gym Membership", 40, "Healthcare"),
    ("Book Purchase", 30, "Education"),
    ("Weekend Trip", 200, "Travel"),
];

const BUDGETS: &[(&str, i64)] = &[
    ("Food & Dining", 300),
    ("Transportation", 200),
    ("Shopping", 150),
    ("Entertainment", 100),
    ("Bills & Utilities", 250),
    ("Healthcare", 100),
    ("Groceries", 400),
    ("Travel", 200),
];

#[derive(Debug, Clone, Default)]
pub struct SeedResult {
    pub categories: usize,
    pub transactions: usize,
    pub budgets: usize,
}

/// Populate the ledger with a year of sample activity ending at
/// `reference_date`, plus budgets for the reference month.
///
/// Amounts and days are derived from the month and template position, so
/// the same reference date always produces the same ledger. Running it again
/// only adds what is missing: existing categories and identical transactions
/// are reused, and a budget that is already set keeps its amount.
pub async fn seed_demo_data(
    service: &FinanceService,
    reference_date: NaiveDate,
) -> Result<SeedResult> {
    let mut result = SeedResult::default();
    let mut categories: HashMap<&str, Category> = HashMap::new();

    for (kind, list) in [
        (TransactionType::Income, INCOME_CATEGORIES),
        (TransactionType::Expense, EXPENSE_CATEGORIES),
    ] {
        for &(name, color) in list {
            let (category, created) = ensure_category(service, name, kind, color).await?;
            if created {
                result.categories += 1;
            }
            categories.insert(name, category);
        }
    }

    let last = YearMonth::of(reference_date);
    for back in (0..12).rev() {
        let Some(month) = last.offset(-back) else {
            continue;
        };
        let m = (11 - back) as usize;

        // One salary every month, one extra income source in rotation
        let incomes = [
            &INCOME_TEMPLATES[0],
            &INCOME_TEMPLATES[1 + m % (INCOME_TEMPLATES.len() - 1)],
        ];

        for (i, &(description, base, category)) in incomes.into_iter().enumerate() {
            let variation = ((m * 37 + i * 11) % 300) as i64 - 100;
            let entry = SampleEntry {
                amount: (base + variation) * 100,
                day: (1 + i * 14) as u32,
                description: format!("{} - {}", description, month),
            };
            if record(service, &categories[category], month, reference_date, entry).await? {
                result.transactions += 1;
            }
        }

        for (i, &(description, base, category)) in EXPENSE_TEMPLATES.iter().enumerate() {
            // Rent every month, the rest on a rotating subset
            if category != "Rent" && (i + m) % 3 == 0 {
                continue;
            }
            let variation = ((m * 13 + i * 7) % 70) as i64 - 20;
            let entry = SampleEntry {
                amount: (base + variation).max(1) * 100 + ((i * 17 + m) % 100) as i64,
                day: ((i * 7 + m * 3) % 28 + 1) as u32,
                description: description.to_string(),
            };
            if record(service, &categories[category], month, reference_date, entry).await? {
                result.transactions += 1;
            }
        }
    }

    for &(category, amount) in BUDGETS {
        if service.get_budget(category, last).await?.is_some() {
            continue;
        }
        service.set_budget(category, last, amount * 100).await?;
        result.budgets += 1;
    }

    log::info!(
        "seeded {} categories, {} transactions, {} budgets",
        result.categories,
        result.transactions,
        result.budgets
    );

    Ok(result)
}

/// Returns the category and whether it had to be created.
async fn ensure_category(
    service: &FinanceService,
    name: &str,
    kind: TransactionType,
    color: &str,
) -> Result<(Category, bool)> {
    match service.get_category(name, Some(kind)).await {
        Ok(category) => Ok((category, false)),
        Err(AppError::CategoryNotFound(_)) => {
            let category = service.create_category(name, kind, Some(color)).await?;
            Ok((category, true))
        }
        Err(e) => Err(e.into()),
    }
}

struct SampleEntry {
    amount: i64,
    day: u32,
    description: String,
}

/// Record one sample transaction unless it lies after the reference date or
/// is already stored. Returns true when something was written.
async fn record(
    service: &FinanceService,
    category: &Category,
    month: YearMonth,
    reference_date: NaiveDate,
    entry: SampleEntry,
) -> Result<bool> {
    let Some(date) = NaiveDate::from_ymd_opt(month.year(), month.month(), entry.day) else {
        return Ok(false);
    };
    if date > reference_date {
        return Ok(false);
    }
    if service
        .transaction_exists(category, date, entry.amount, &entry.description)
        .await?
    {
        return Ok(false);
    }
    service
        .record_transaction(
            &category.name,
            Some(category.kind),
            entry.amount,
            date,
            Some(entry.description),
        )
        .await?;
    Ok(true)
}
