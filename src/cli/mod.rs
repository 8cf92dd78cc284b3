use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::application::{FinanceService, TransactionFilter, TransactionUpdate};
use crate::config::{default_config_path, Config};
use crate::domain::{
    format_cents, parse_cents, parse_reference_date, CategoryBreakdown, FinancialSummary,
    SummaryWindow, TransactionType, YearMonth,
};

/// BudgetLens - personal finance summaries
#[derive(Parser)]
#[command(name = "budgetlens")]
#[command(about = "Category breakdowns, monthly trends and budget tracking over a local ledger")]
#[command(version)]
pub struct Cli {
    /// Database file path (overrides the config file)
    #[arg(long, global = true)]
    pub database: Option<String>,

    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Category management commands
    #[command(subcommand)]
    Category(CategoryCommands),

    /// Record a transaction
    Add {
        /// Amount (e.g., "50.00" or "50")
        amount: String,

        /// Category name
        #[arg(short, long)]
        category: String,

        /// Transaction type, only needed when the name exists for both kinds
        #[arg(short = 't', long = "type")]
        transaction_type: Option<String>,

        /// Date of the transaction (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Description
        #[arg(short, long)]
        description: Option<String>,
    },

    /// List transactions, newest first
    List {
        /// Filter by type: income, expense
        #[arg(short = 't', long = "type")]
        transaction_type: Option<String>,

        /// Filter by category name
        #[arg(long)]
        category: Option<String>,

        /// Filter from date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Filter to date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,

        /// Search description and category name
        #[arg(short, long)]
        search: Option<String>,

        /// Maximum number of transactions to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Edit a transaction; only the given fields change
    Edit {
        /// Transaction ID
        id: String,

        /// New amount (e.g., "50.00")
        #[arg(long)]
        amount: Option<String>,

        /// New date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,

        /// New description
        #[arg(short, long)]
        description: Option<String>,

        /// Move to this category; the transaction takes its type
        #[arg(short, long)]
        category: Option<String>,

        /// Type of the target category, only needed when the name exists for both kinds
        #[arg(short = 't', long = "type")]
        transaction_type: Option<String>,
    },

    /// Delete a transaction
    Delete {
        /// Transaction ID
        id: String,
    },

    /// Budget management commands
    #[command(subcommand)]
    Budget(BudgetCommands),

    /// Generate reports
    #[command(subcommand)]
    Report(ReportCommands),

    /// Export data to CSV or JSON
    Export {
        /// What to export: transactions, categories, budgets, summary, full
        export_type: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Import transactions from CSV
    Import {
        /// Input file (stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,

        /// Validate without importing
        #[arg(long)]
        dry_run: bool,

        /// Create categories that don't exist (needs a type column)
        #[arg(long)]
        create_categories: bool,
    },

    /// Fill the database with a year of sample data
    Seed {
        /// Last day of sample data (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        reference: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum CategoryCommands {
    /// Create a new category
    Add {
        /// Category name (unique per type)
        name: String,

        /// Category type: income, expense
        #[arg(short = 't', long = "type")]
        category_type: String,

        /// Display color (#RRGGBB)
        #[arg(long)]
        color: Option<String>,
    },

    /// List categories
    List {
        /// Filter by type: income, expense
        #[arg(short = 't', long = "type")]
        category_type: Option<String>,
    },

    /// Rename or recolor a category
    Edit {
        /// Current category name
        name: String,

        #[arg(short = 't', long = "type")]
        category_type: Option<String>,

        /// New name
        #[arg(long = "rename")]
        new_name: Option<String>,

        /// New display color (#RRGGBB)
        #[arg(long)]
        color: Option<String>,
    },

    /// Delete a category with its transactions and budgets
    Delete {
        name: String,

        #[arg(short = 't', long = "type")]
        category_type: Option<String>,
    },

    /// Transaction count and total per category
    Stats,
}

#[derive(Subcommand)]
pub enum BudgetCommands {
    /// Set the planned amount for an expense category
    Set {
        /// Expense category name
        category: String,

        /// Planned amount (e.g., "400.00")
        amount: String,

        /// Budget month (YYYY-MM, defaults to the current month)
        #[arg(short, long)]
        month: Option<String>,
    },

    /// List budgets
    List {
        /// Only budgets for this month (YYYY-MM)
        #[arg(short, long)]
        month: Option<String>,
    },

    /// Delete a budget
    Delete {
        category: String,

        #[arg(short, long)]
        month: Option<String>,
    },

    /// Planned versus actual spending
    Status {
        #[arg(short, long)]
        month: Option<String>,

        /// Output format: table, json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Totals, breakdowns, trend, budgets and recent activity
    Summary {
        /// Window start (YYYY-MM-DD, defaults to a year before the reference date)
        #[arg(long)]
        from: Option<String>,

        /// Window end (YYYY-MM-DD, defaults to the reference date)
        #[arg(long)]
        to: Option<String>,

        /// Reference date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        reference: Option<String>,

        /// Number of months in the trend
        #[arg(long)]
        months: Option<u32>,

        /// Number of recent transactions
        #[arg(long)]
        recent: Option<usize>,

        /// Output format: table, json, csv (totals plus one row per category)
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Amount and share per category
    Breakdown {
        /// Transaction type: income, expense
        #[arg(short = 't', long = "type", default_value = "expense")]
        transaction_type: String,

        /// Filter from date (YYYY-MM-DD, defaults to start of current month)
        #[arg(long)]
        from: Option<String>,

        /// Filter to date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        to: Option<String>,

        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Income and expenses per month
    Trend {
        #[arg(long)]
        months: Option<u32>,

        #[arg(long)]
        reference: Option<String>,

        #[arg(long, default_value = "table")]
        format: String,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config_path = self.config.clone().unwrap_or_else(default_config_path);
        let config = Config::load(&config_path)?;
        let database = self.database.clone().unwrap_or_else(|| config.database.clone());
        log::debug!("using database {}", database);

        match self.command {
            Commands::Init => {
                FinanceService::init(&database).await?;
                println!("Database initialized: {}", database);
            }

            Commands::Category(cmd) => {
                let service = FinanceService::connect(&database).await?;
                run_category_command(&service, &config, cmd).await?;
            }

            Commands::Add {
                amount,
                category,
                transaction_type,
                date,
                description,
            } => {
                let service = FinanceService::connect(&database).await?;
                let amount_cents =
                    parse_cents(&amount).context("Invalid amount format. Use '50.00' or '50'")?;
                let kind = parse_type_opt(transaction_type.as_deref())?;
                let date = match date {
                    Some(date_str) => parse_date(&date_str)?,
                    None => today(),
                };

                let result = service
                    .record_transaction(&category, kind, amount_cents, date, description)
                    .await?;

                println!(
                    "Recorded {}: {} {} on {} ({})",
                    result.transaction.transaction_type,
                    format_cents(result.transaction.amount),
                    result.category.name,
                    result.transaction.date,
                    result.transaction.id
                );
            }

            Commands::List {
                transaction_type,
                category,
                from,
                to,
                search,
                limit,
            } => {
                let service = FinanceService::connect(&database).await?;
                let filter = TransactionFilter {
                    transaction_type: parse_type_opt(transaction_type.as_deref())?,
                    category,
                    from: parse_date_opt(from.as_deref()).context("Invalid --from")?,
                    to: parse_date_opt(to.as_deref()).context("Invalid --to")?,
                    search,
                    limit,
                };
                run_list_command(&service, filter).await?;
            }

            Commands::Edit {
                id,
                amount,
                date,
                description,
                category,
                transaction_type,
            } => {
                let service = FinanceService::connect(&database).await?;
                let transaction_id =
                    Uuid::parse_str(&id).context("Invalid transaction ID format (expected UUID)")?;
                let amount = amount
                    .as_deref()
                    .map(parse_cents)
                    .transpose()
                    .context("Invalid amount format. Use '50.00' or '50'")?;
                let update = TransactionUpdate {
                    amount,
                    date: parse_date_opt(date.as_deref()).context("Invalid --date")?,
                    description,
                    category,
                    transaction_type: parse_type_opt(transaction_type.as_deref())?,
                };

                let result = service.update_transaction(transaction_id, update).await?;
                println!(
                    "Updated {}: {} {} on {} ({})",
                    result.transaction.transaction_type,
                    format_cents(result.transaction.amount),
                    result.category.name,
                    result.transaction.date,
                    result.transaction.id
                );
            }

            Commands::Delete { id } => {
                let service = FinanceService::connect(&database).await?;
                let transaction_id =
                    Uuid::parse_str(&id).context("Invalid transaction ID format (expected UUID)")?;
                let deleted = service.delete_transaction(transaction_id).await?;
                println!(
                    "Deleted {} of {} on {}",
                    deleted.transaction_type,
                    format_cents(deleted.amount),
                    deleted.date
                );
            }

            Commands::Budget(cmd) => {
                let service = FinanceService::connect(&database).await?;
                run_budget_command(&service, cmd).await?;
            }

            Commands::Report(cmd) => {
                let service = FinanceService::connect(&database).await?;
                run_report_command(&service, &config, cmd).await?;
            }

            Commands::Export {
                export_type,
                output,
            } => {
                let service = FinanceService::connect(&database).await?;
                run_export_command(&service, &config, &export_type, output.as_deref()).await?;
            }

            Commands::Import {
                input,
                dry_run,
                create_categories,
            } => {
                let service = FinanceService::connect(&database).await?;
                run_import_command(&service, input.as_deref(), dry_run, create_categories).await?;
            }

            Commands::Seed { reference } => {
                let service = FinanceService::connect(&database).await?;
                let reference_date = parse_reference_opt(reference.as_deref())?;
                let result = crate::io::seed_demo_data(&service, reference_date).await?;
                println!(
                    "Seeded {} categories, {} transactions and {} budgets up to {}",
                    result.categories, result.transactions, result.budgets, reference_date
                );
            }
        }

        Ok(())
    }
}

async fn run_category_command(
    service: &FinanceService,
    config: &Config,
    cmd: CategoryCommands,
) -> Result<()> {
    match cmd {
        CategoryCommands::Add {
            name,
            category_type,
            color,
        } => {
            let kind = parse_type(&category_type)?;
            let color = color.as_deref().unwrap_or(&config.default_color);
            let category = service.create_category(&name, kind, Some(color)).await?;
            println!(
                "Created {} category: {} ({})",
                category.kind, category.name, category.color
            );
        }

        CategoryCommands::List { category_type } => {
            let kind = parse_type_opt(category_type.as_deref())?;
            let categories = service.list_categories(kind).await?;
            if categories.is_empty() {
                println!("No categories found.");
            } else {
                println!("{:<24} {:<8} {:<8}", "NAME", "TYPE", "COLOR");
                println!("{}", "-".repeat(42));
                for category in categories {
                    println!(
                        "{:<24} {:<8} {:<8}",
                        truncate(&category.name, 24),
                        category.kind,
                        category.color
                    );
                }
            }
        }

        CategoryCommands::Edit {
            name,
            category_type,
            new_name,
            color,
        } => {
            let kind = parse_type_opt(category_type.as_deref())?;
            let category = service
                .update_category(&name, kind, new_name.as_deref(), color.as_deref())
                .await?;
            println!(
                "Updated {} category: {} ({})",
                category.kind, category.name, category.color
            );
        }

        CategoryCommands::Delete {
            name,
            category_type,
        } => {
            let kind = parse_type_opt(category_type.as_deref())?;
            let deleted = service.delete_category(&name, kind).await?;
            println!("Deleted {} category: {}", deleted.kind, deleted.name);
        }

        CategoryCommands::Stats => {
            let stats = service.category_stats().await?;
            if stats.is_empty() {
                println!("No categories found.");
            } else {
                println!("{:<24} {:<8} {:>8} {:>14}", "CATEGORY", "TYPE", "COUNT", "TOTAL");
                println!("{}", "-".repeat(57));
                for entry in stats {
                    println!(
                        "{:<24} {:<8} {:>8} {:>14}",
                        truncate(&entry.category.name, 24),
                        entry.category.kind,
                        entry.transaction_count,
                        format_cents(entry.total_amount)
                    );
                }
            }
        }
    }
    Ok(())
}

async fn run_list_command(service: &FinanceService, filter: TransactionFilter) -> Result<()> {
    let transactions = service.list_transactions(filter).await?;
    if transactions.is_empty() {
        println!("No transactions found.");
        return Ok(());
    }

    let categories = service.category_lookup().await?;

    println!(
        "{:<36} {:<10} {:<8} {:<20} {:>12}  DESCRIPTION",
        "ID", "DATE", "TYPE", "CATEGORY", "AMOUNT"
    );
    println!("{}", "-".repeat(110));
    for transaction in &transactions {
        let category = categories
            .get(&transaction.category_id)
            .map(|c| c.name.as_str())
            .unwrap_or("?");
        println!(
            "{:<36} {:<10} {:<8} {:<20} {:>12}  {}",
            transaction.id,
            transaction.date,
            transaction.transaction_type,
            truncate(category, 20),
            format_cents(transaction.amount),
            transaction.description
        );
    }
    println!("\n{} transaction(s)", transactions.len());
    Ok(())
}

async fn run_budget_command(service: &FinanceService, cmd: BudgetCommands) -> Result<()> {
    match cmd {
        BudgetCommands::Set {
            category,
            amount,
            month,
        } => {
            let amount_cents =
                parse_cents(&amount).context("Invalid amount format. Use '400.00' or '400'")?;
            let period = parse_month_opt(month.as_deref())?;
            let (budget, category) = service.set_budget(&category, period, amount_cents).await?;
            println!(
                "Budget set: {} {} for {}",
                category.name,
                format_cents(budget.planned_amount),
                budget.period
            );
        }

        BudgetCommands::List { month } => {
            let period = month
                .as_deref()
                .map(parse_month)
                .transpose()?;
            let budgets = service.list_budgets(period).await?;
            if budgets.is_empty() {
                println!("No budgets found.");
            } else {
                let categories = service.category_lookup().await?;
                println!("{:<8} {:<24} {:>12}", "MONTH", "CATEGORY", "PLANNED");
                println!("{}", "-".repeat(46));
                for budget in budgets {
                    let name = categories
                        .get(&budget.category_id)
                        .map(|c| c.name.as_str())
                        .unwrap_or("?");
                    println!(
                        "{:<8} {:<24} {:>12}",
                        budget.period,
                        truncate(name, 24),
                        format_cents(budget.planned_amount)
                    );
                }
            }
        }

        BudgetCommands::Delete { category, month } => {
            let period = parse_month_opt(month.as_deref())?;
            service.delete_budget(&category, period).await?;
            println!("Deleted budget: {} for {}", category, period);
        }

        BudgetCommands::Status { month, format } => {
            let period = parse_month_opt(month.as_deref())?;
            let report = service.get_budget_comparison(period).await?;

            match format.as_str() {
                "json" => {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                }
                "csv" => {
                    println!("category,planned,actual,variance,remaining,percentage_used,status");
                    for c in &report.comparisons {
                        println!(
                            "{},{},{},{},{},{:.1},{}",
                            csv_field(&c.category_name),
                            format_cents(c.planned_amount),
                            format_cents(c.actual_amount),
                            format_cents(c.variance),
                            format_cents(c.remaining),
                            c.percentage_used,
                            c.status
                        );
                    }
                }
                _ => {
                    println!("Budget Status: {}", report.period);
                    println!();
                    if report.comparisons.is_empty() {
                        println!("No budgets for this month.");
                        return Ok(());
                    }
                    println!(
                        "{:<20} {:>12} {:>12} {:>12} {:>7}  {}",
                        "CATEGORY", "PLANNED", "ACTUAL", "REMAINING", "USED", "STATUS"
                    );
                    println!("{}", "-".repeat(82));
                    for c in &report.comparisons {
                        println!(
                            "{:<20} {:>12} {:>12} {:>12} {:>6.1}%  {}",
                            truncate(&c.category_name, 20),
                            format_cents(c.planned_amount),
                            format_cents(c.actual_amount),
                            format_cents(c.remaining),
                            c.percentage_used,
                            c.status
                        );
                    }
                    println!("{}", "-".repeat(82));
                    println!(
                        "{:<20} {:>12} {:>12}",
                        "TOTAL",
                        format_cents(report.total_planned),
                        format_cents(report.total_actual)
                    );
                    let over = report.over_budget_count();
                    if over > 0 {
                        println!("\n{} budget(s) over limit", over);
                    }
                }
            }
        }
    }

    Ok(())
}

async fn run_report_command(
    service: &FinanceService,
    config: &Config,
    cmd: ReportCommands,
) -> Result<()> {
    match cmd {
        ReportCommands::Summary {
            from,
            to,
            reference,
            months,
            recent,
            format,
        } => {
            let reference_date = parse_reference_opt(reference.as_deref())?;
            let default_window = SummaryWindow::trailing_year(reference_date);
            let start = parse_date_opt(from.as_deref())
                .context("Invalid --from")?
                .unwrap_or(default_window.start);
            let end = parse_date_opt(to.as_deref())
                .context("Invalid --to")?
                .unwrap_or(default_window.end);
            let window = SummaryWindow::new(start, end, reference_date)
                .with_trend_months(months.unwrap_or(config.trend_months))
                .with_recent_limit(recent.unwrap_or(config.recent_limit));

            let summary = service.get_summary(&window).await?;

            match format.as_str() {
                "json" => {
                    println!("{}", serde_json::to_string_pretty(&summary)?);
                }
                "csv" => {
                    for line in summary_csv_lines(&summary) {
                        println!("{}", line);
                    }
                }
                _ => print_summary(&summary),
            }
        }

        ReportCommands::Breakdown {
            transaction_type,
            from,
            to,
            format,
        } => {
            let kind = parse_type(&transaction_type)?;
            let today = today();
            let from = parse_date_opt(from.as_deref())
                .context("Invalid --from")?
                .unwrap_or_else(|| YearMonth::of(today).first_day());
            let to = parse_date_opt(to.as_deref())
                .context("Invalid --to")?
                .unwrap_or(today);

            let report = service.get_category_breakdown(kind, from, to).await?;

            match format.as_str() {
                "json" => {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                }
                "csv" => {
                    println!("category,amount,count,percentage");
                    for row in &report.categories {
                        println!(
                            "{},{},{},{:.1}",
                            csv_field(&row.category_name),
                            format_cents(row.amount),
                            row.transaction_count,
                            row.percentage
                        );
                    }
                }
                _ => {
                    println!("{} by Category", kind.display_name());
                    println!("Period: {} to {}", report.from, report.to);
                    println!();
                    print_breakdown_table(&report.categories);
                    println!("{:<20} {:>12}", "TOTAL", format_cents(report.total));
                }
            }
        }

        ReportCommands::Trend {
            months,
            reference,
            format,
        } => {
            let reference_date = parse_reference_opt(reference.as_deref())?;
            let report = service
                .get_monthly_trend(months.unwrap_or(config.trend_months), reference_date)
                .await?;

            match format.as_str() {
                "json" => {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                }
                "csv" => {
                    println!("month,income,expenses,net");
                    for point in &report.points {
                        println!(
                            "{},{},{},{}",
                            point.month,
                            format_cents(point.income),
                            format_cents(point.expenses),
                            format_cents(point.net)
                        );
                    }
                }
                _ => {
                    println!("Monthly Trend");
                    println!();
                    print_trend_table(&report.points);
                }
            }
        }
    }

    Ok(())
}

fn print_summary(summary: &FinancialSummary) {
    println!("Financial Summary");
    println!(
        "Period: {} to {} (reference {})",
        summary.window.start, summary.window.end, summary.window.reference_date
    );
    println!();
    println!("Total Income:   {:>15}", format_cents(summary.total_income));
    println!("Total Expenses: {:>15}", format_cents(summary.total_expenses));
    println!("{}", "-".repeat(32));
    println!("Net Balance:    {:>15}", format_cents(summary.net_balance));

    if !summary.income_by_category.is_empty() {
        println!("\nIncome by Category:");
        print_breakdown_table(&summary.income_by_category);
    }
    if !summary.expenses_by_category.is_empty() {
        println!("\nExpenses by Category:");
        print_breakdown_table(&summary.expenses_by_category);
    }

    println!("\nMonthly Trend:");
    print_trend_table(&summary.monthly_trend);

    if !summary.budget_comparison.is_empty() {
        println!("\nBudgets ({}):", summary.window.budget_period());
        for c in &summary.budget_comparison {
            println!(
                "  {:<20} {:>12} of {:>12} ({:.1}%) {}",
                truncate(&c.category_name, 20),
                format_cents(c.actual_amount),
                format_cents(c.planned_amount),
                c.percentage_used,
                c.status
            );
        }
    }

    if !summary.recent_transactions.is_empty() {
        println!("\nRecent Transactions:");
        for t in &summary.recent_transactions {
            println!(
                "  {} {:<8} {:<20} {:>12}  {}",
                t.date,
                t.transaction_type,
                truncate(t.category_name.as_deref().unwrap_or("?"), 20),
                format_cents(t.amount),
                t.description
            );
        }
    }
}

fn print_breakdown_table(rows: &[CategoryBreakdown]) {
    println!(
        "{:<20} {:>12} {:>8} {:>8}",
        "CATEGORY", "AMOUNT", "COUNT", "PERCENT"
    );
    println!("{}", "-".repeat(51));
    for row in rows {
        println!(
            "{:<20} {:>12} {:>8} {:>7.1}%",
            truncate(&row.category_name, 20),
            format_cents(row.amount),
            row.transaction_count,
            row.percentage
        );
    }
    println!("{}", "-".repeat(51));
}

fn print_trend_table(points: &[crate::domain::MonthlyTrendPoint]) {
    println!("{:<8} {:>12} {:>12} {:>12}", "MONTH", "INCOME", "EXPENSES", "NET");
    println!("{}", "-".repeat(47));
    for point in points {
        println!(
            "{:<8} {:>12} {:>12} {:>12}",
            point.month,
            format_cents(point.income),
            format_cents(point.expenses),
            format_cents(point.net)
        );
    }
}

async fn run_export_command(
    service: &FinanceService,
    config: &Config,
    export_type: &str,
    output: Option<&str>,
) -> Result<()> {
    use crate::io::Exporter;
    use std::fs::File;
    use std::io::{stdout, Write};

    let exporter = Exporter::new(service);

    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    match export_type {
        "transactions" => {
            let count = exporter.export_transactions_csv(writer).await?;
            if output.is_some() {
                eprintln!("Exported {} transactions", count);
            }
        }
        "categories" => {
            let count = exporter.export_categories_csv(writer).await?;
            if output.is_some() {
                eprintln!("Exported {} categories", count);
            }
        }
        "budgets" => {
            let count = exporter.export_budgets_csv(writer).await?;
            if output.is_some() {
                eprintln!("Exported {} budgets", count);
            }
        }
        "summary" => {
            let window = SummaryWindow::trailing_year(today())
                .with_trend_months(config.trend_months)
                .with_recent_limit(config.recent_limit);
            let summary = service.get_summary(&window).await?;
            exporter.export_summary_json(&summary, writer)?;
            if output.is_some() {
                eprintln!("Exported summary {} to {}", window.start, window.end);
            }
        }
        "full" => {
            let snapshot = exporter.export_full_json(writer).await?;
            if output.is_some() {
                eprintln!(
                    "Exported full database: {} categories, {} transactions, {} budgets",
                    snapshot.categories.len(),
                    snapshot.transactions.len(),
                    snapshot.budgets.len()
                );
            }
        }
        _ => {
            anyhow::bail!(
                "Invalid export type '{}'. Valid types: transactions, categories, budgets, summary, full",
                export_type
            );
        }
    }

    Ok(())
}

async fn run_import_command(
    service: &FinanceService,
    input: Option<&str>,
    dry_run: bool,
    create_categories: bool,
) -> Result<()> {
    use crate::io::{ImportOptions, Importer};
    use std::fs::File;
    use std::io::{stdin, Read};

    let importer = Importer::new(service);

    let reader: Box<dyn Read> = match input {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("Failed to open input file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdin()),
    };

    let options = ImportOptions {
        dry_run,
        create_categories,
    };

    let result = importer.import_transactions_csv(reader, options).await?;

    if dry_run {
        println!("Validation finished");
        println!("  Valid:    {}", result.imported);
    } else {
        println!("Import complete");
        println!("  Imported: {}", result.imported);
        println!("  New categories: {}", result.created_categories);
    }
    println!("  Errors:   {}", result.errors.len());

    if !result.errors.is_empty() {
        println!("\nErrors:");
        for error in result.errors.iter().take(10) {
            println!(
                "  Line {}: {}",
                error.line,
                error
                    .field
                    .as_ref()
                    .map(|f| format!("{}: ", f))
                    .unwrap_or_default()
                    + &error.error
            );
        }
        if result.errors.len() > 10 {
            println!("  ... and {} more errors", result.errors.len() - 10);
        }
    }

    Ok(())
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

/// Totals followed by one row per income and expense category.
fn summary_csv_lines(summary: &FinancialSummary) -> Vec<String> {
    let mut lines = vec![
        "section,name,amount,count,percentage".to_string(),
        format!("total,income,{},,", format_cents(summary.total_income)),
        format!("total,expenses,{},,", format_cents(summary.total_expenses)),
        format!("total,net_balance,{},,", format_cents(summary.net_balance)),
    ];
    for (section, rows) in [
        ("income", &summary.income_by_category),
        ("expense", &summary.expenses_by_category),
    ] {
        for row in rows {
            lines.push(format!(
                "{},{},{},{},{:.1}",
                section,
                csv_field(&row.category_name),
                format_cents(row.amount),
                row.transaction_count,
                row.percentage
            ));
        }
    }
    lines
}

fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn parse_date(date_str: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date format '{}'. Use YYYY-MM-DD", date_str))
}

fn parse_date_opt(date_str: Option<&str>) -> Result<Option<NaiveDate>> {
    date_str.map(parse_date).transpose()
}

fn parse_reference_opt(date_str: Option<&str>) -> Result<NaiveDate> {
    match date_str {
        Some(s) => Ok(parse_reference_date(s)?),
        None => Ok(today()),
    }
}

fn parse_month(month_str: &str) -> Result<YearMonth> {
    Ok(month_str.parse::<YearMonth>()?)
}

fn parse_month_opt(month_str: Option<&str>) -> Result<YearMonth> {
    match month_str {
        Some(s) => parse_month(s),
        None => Ok(YearMonth::of(today())),
    }
}

fn parse_type(type_str: &str) -> Result<TransactionType> {
    TransactionType::from_str(type_str.trim())
        .ok_or_else(|| anyhow::anyhow!("Invalid type '{}'. Valid types: income, expense", type_str))
}

fn parse_type_opt(type_str: Option<&str>) -> Result<Option<TransactionType>> {
    type_str.map(parse_type).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_summary_flags() {
        let cli = Cli::try_parse_from([
            "budgetlens",
            "--database",
            "test.db",
            "report",
            "summary",
            "--reference",
            "2024-06-15",
            "--months",
            "6",
            "--format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.database.as_deref(), Some("test.db"));
        match cli.command {
            Commands::Report(ReportCommands::Summary {
                reference,
                months,
                format,
                ..
            }) => {
                assert_eq!(reference.as_deref(), Some("2024-06-15"));
                assert_eq!(months, Some(6));
                assert_eq!(format, "json");
            }
            _ => panic!("expected report summary"),
        }
    }

    #[test]
    fn test_cli_requires_category_type() {
        assert!(Cli::try_parse_from(["budgetlens", "category", "add", "Food"]).is_err());
        assert!(
            Cli::try_parse_from(["budgetlens", "category", "add", "Food", "--type", "expense"])
                .is_ok()
        );
    }

    #[test]
    fn test_parse_helpers() {
        assert_eq!(
            parse_date("2024-02-29").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert!(parse_date("29/02/2024").is_err());
        assert_eq!(parse_month("2024-11").unwrap().to_string(), "2024-11");
        assert!(parse_month("2024-13").is_err());
        assert_eq!(parse_type("income").unwrap(), TransactionType::Income);
        assert!(parse_type("transfer").is_err());
        assert_eq!(parse_type_opt(None).unwrap(), None);
    }

    #[test]
    fn test_cli_parses_edit_commands() {
        let cli = Cli::try_parse_from([
            "budgetlens",
            "edit",
            "6f1c2b7e-0000-4000-8000-000000000001",
            "--amount",
            "12.50",
            "-c",
            "Freelance",
        ])
        .unwrap();
        match cli.command {
            Commands::Edit {
                amount,
                category,
                date,
                ..
            } => {
                assert_eq!(amount.as_deref(), Some("12.50"));
                assert_eq!(category.as_deref(), Some("Freelance"));
                assert_eq!(date, None);
            }
            _ => panic!("expected edit"),
        }

        let cli = Cli::try_parse_from([
            "budgetlens",
            "category",
            "edit",
            "Dining",
            "--rename",
            "Eating Out",
            "--color",
            "#123456",
        ])
        .unwrap();
        match cli.command {
            Commands::Category(CategoryCommands::Edit {
                name,
                new_name,
                color,
                category_type,
            }) => {
                assert_eq!(name, "Dining");
                assert_eq!(new_name.as_deref(), Some("Eating Out"));
                assert_eq!(color.as_deref(), Some("#123456"));
                assert_eq!(category_type, None);
            }
            _ => panic!("expected category edit"),
        }
    }

    #[test]
    fn test_summary_csv_includes_breakdown_rows() {
        let row = |name: &str, amount, percentage, count| CategoryBreakdown {
            category_id: Uuid::new_v4(),
            category_name: name.to_string(),
            color: "#6b7280".to_string(),
            amount,
            percentage,
            transaction_count: count,
        };
        let summary = FinancialSummary {
            window: SummaryWindow::trailing_year(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()),
            total_income: 300000,
            total_expenses: 100000,
            net_balance: 200000,
            income_by_category: vec![row("Salary", 300000, 100.0, 1)],
            expenses_by_category: vec![
                row("Rent, flat", 90000, 90.0, 1),
                row("Groceries", 10000, 10.0, 2),
            ],
            monthly_trend: Vec::new(),
            budget_comparison: Vec::new(),
            recent_transactions: Vec::new(),
        };

        let lines = summary_csv_lines(&summary);
        assert_eq!(
            lines,
            vec![
                "section,name,amount,count,percentage",
                "total,income,3000.00,,",
                "total,expenses,1000.00,,",
                "total,net_balance,2000.00,,",
                "income,Salary,3000.00,1,100.0",
                "expense,\"Rent, flat\",900.00,1,90.0",
                "expense,Groceries,100.00,2,10.0",
            ]
        );
    }

    #[test]
    fn test_truncate_and_csv_field() {
        assert_eq!(truncate("Groceries", 20), "Groceries");
        assert_eq!(truncate("Bills & Utilities and more", 10), "Bills &...");
        assert_eq!(csv_field("Food & Dining"), "Food & Dining");
        assert_eq!(csv_field("Rent, flat"), "\"Rent, flat\"");
    }
}
