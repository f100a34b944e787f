//! Plain-text reports written to stdout.

use pesalens_core::CategorizedTransaction;
use pesalens_finance::{CategoryAnalysis, CategoryBucket, CategoryDefinition, group_by_type};
use pesalens_ingest::StatementSummary;

pub fn print_summary(summary: &StatementSummary) {
    println!("Transactions: {}", summary.transactions);
    if let (Some(first), Some(last)) = (summary.first, summary.last) {
        println!(
            "Period:       {} -> {}",
            first.format("%b %d, %Y"),
            last.format("%b %d, %Y")
        );
    }
    println!("Paid in:      {:>12.2}", summary.total_paid_in);
    println!("Withdrawn:    {:>12.2}", summary.total_withdrawn);
}

pub fn print_analyses(analyses: &[CategoryAnalysis], top_n: usize) {
    for (category_type, names) in group_by_type(analyses) {
        println!("\n== {category_type} ==");
        for name in names {
            let Some(a) = analyses.iter().find(|a| a.name == name) else {
                continue;
            };
            let r = &a.result;
            println!(
                "\n{} [{}] total={:.2} charges={:.2} count={}",
                a.name,
                r.direction.amount_column(),
                r.total_amount,
                r.total_charges,
                r.transaction_count
            );
            for e in r.top(top_n) {
                let accounts = if e.accounts.is_empty() {
                    String::new()
                } else {
                    format!(" ({})", e.accounts.join(", "))
                };
                println!(
                    "  {:<40} {:>4}x {:>12.2}{}",
                    e.processed_entity, e.count, e.amount, accounts
                );
            }
            if r.by_entity.len() > top_n {
                println!("  ... {} more", r.by_entity.len() - top_n);
            }
        }
    }
}

pub fn print_categories(definitions: &[CategoryDefinition]) {
    for d in definitions {
        println!(
            "{:<28} {:<16} {:<9} {:<16} {}",
            d.name,
            d.category_type,
            d.direction().amount_column(),
            format!("{:?}", d.entity_strategy()),
            d.description
        );
    }
    println!("\n{} categories", definitions.len());
}

pub fn print_uncategorized(bucket: Option<&CategoryBucket>) {
    let rows: &[CategorizedTransaction] = bucket.map(|b| b.transactions.as_slice()).unwrap_or(&[]);
    if rows.is_empty() {
        println!("All transactions categorized.");
        return;
    }
    for t in rows {
        let txn = &t.transaction;
        println!(
            "{}  {}  {:>10.2} {:>10.2}  {}",
            txn.completion_time.format("%Y-%m-%d"),
            txn.receipt_no,
            txn.paid_in,
            txn.withdrawn,
            txn.details
        );
    }
    println!("\n{} uncategorized transactions", rows.len());
}
